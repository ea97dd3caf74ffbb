//! Integration tests for structsync

mod cli_commands;
mod commit_paths;
mod config_loading;
mod sync_failures;
mod sync_payload;
mod test_utils;
