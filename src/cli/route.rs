//! CLI route: single route table and run context. Dispatches to the session and sync
//! services and to presentation.

use crate::backend::{HttpBackend, PlanningBackend};
use crate::cli::command_name;
use crate::cli::parse::Commands;
use crate::cli::presentation::{
    format_commit_report, format_models, format_sync_outcome, format_sync_preview,
    format_tree_json, format_tree_text,
};
use crate::config::{ConfigLoader, StructsyncConfig};
use crate::error::ApiError;
use crate::overrides::StagedValue;
use crate::session::{EditScript, EditSession};
use crate::sync::{Confirmation, SyncCoordinator};
use crate::types::{Attribute, Level, NodeId, NodeKey, ProjectId};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::runtime::Runtime;
use tracing::{info, info_span};

/// Runtime context for CLI execution: backend client, selected project and the async
/// runtime the blocking CLI drives it with.
pub struct RunContext {
    backend: Arc<dyn PlanningBackend>,
    project_id: ProjectId,
    coordinator: SyncCoordinator,
    runtime: Runtime,
}

/// Command-line overrides applied on top of the loaded configuration.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub project: Option<ProjectId>,
    pub base_url: Option<String>,
}

fn build_runtime() -> Result<Runtime, ApiError> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| ApiError::ConfigError(format!("Failed to start async runtime: {}", e)))
}

impl RunContext {
    /// Create run context from workspace root and optional config path. Uses ConfigLoader only.
    pub fn new(
        workspace_root: PathBuf,
        config_path: Option<PathBuf>,
        overrides: ConfigOverrides,
    ) -> Result<Self, ApiError> {
        let mut config = if let Some(ref cfg_path) = config_path {
            ConfigLoader::load_from_file(cfg_path)?
        } else {
            ConfigLoader::load(&workspace_root)?
        };
        apply_overrides(&mut config, overrides);
        config.ensure_valid()?;

        let project_id = config.backend.project_id.ok_or_else(|| {
            ApiError::ConfigError(
                "No project selected: pass --project or set backend.project_id".to_string(),
            )
        })?;
        let backend = HttpBackend::new(&config.backend)?;
        info!(base_url = %backend.base_url(), project_id, "Using HTTP backend");
        Self::with_backend(Arc::new(backend), project_id)
    }

    /// Run context over an already-built backend.
    pub fn with_backend(
        backend: Arc<dyn PlanningBackend>,
        project_id: ProjectId,
    ) -> Result<Self, ApiError> {
        Ok(Self {
            backend,
            project_id,
            coordinator: SyncCoordinator::new(),
            runtime: build_runtime()?,
        })
    }

    pub fn coordinator(&self) -> &SyncCoordinator {
        &self.coordinator
    }

    /// Execute a CLI command via the single route table.
    pub fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        let span = info_span!("command", name = command_name(command), project_id = self.project_id);
        let _guard = span.enter();
        match command {
            Commands::Tree { edits, format } => {
                let session = self.open_session(edits.as_deref())?;
                if format == "json" {
                    format_tree_json(&session)
                } else {
                    Ok(format_tree_text(&session))
                }
            }
            Commands::Models { format } => {
                let session = self.open_session(None)?;
                format_models(&session, format)
            }
            Commands::SetModel { level, id, model } => {
                self.handle_set_model(*level, *id, model.as_deref().unwrap_or(""))
            }
            Commands::CommitDate { level, id, date } => {
                self.handle_commit_date(*level, *id, date.as_deref().unwrap_or(""))
            }
            Commands::Sync {
                edits,
                units,
                yes,
                dry_run,
                format,
            } => self.handle_sync(edits.as_deref(), units, *yes, *dry_run, format),
        }
    }

    fn open_session(&self, edits: Option<&Path>) -> Result<EditSession, ApiError> {
        let mut session = self
            .runtime
            .block_on(EditSession::open(self.backend.as_ref(), self.project_id))?;
        if let Some(path) = edits {
            let written = EditScript::load(path)?.apply(&mut session)?;
            info!(script = %path.display(), written, "Applied edit script");
        }
        Ok(session)
    }

    fn handle_set_model(&self, level: Level, id: NodeId, text: &str) -> Result<String, ApiError> {
        let key = NodeKey::new(level, id);
        let value = match StagedValue::parse(Attribute::ProcessModel, text)? {
            StagedValue::ProcessModel(value) => value,
            StagedValue::StartDate(_) => {
                return Err(ApiError::InvalidInput(format!("'{}' is not a process model", text)))
            }
        };
        let mut session = self.open_session(None)?;
        let report = self.runtime.block_on(session.set_process_model(
            self.backend.as_ref(),
            key,
            value,
        ))?;
        Ok(format_commit_report(key, Attribute::ProcessModel, &report))
    }

    fn handle_commit_date(&self, level: Level, id: NodeId, text: &str) -> Result<String, ApiError> {
        let key = NodeKey::new(level, id);
        let mut session = self.open_session(None)?;
        session.stage_raw(key, Attribute::StartDate, text)?;
        let report = self.runtime.block_on(session.commit_node(
            self.backend.as_ref(),
            key,
            Attribute::StartDate,
        ))?;
        Ok(format_commit_report(key, Attribute::StartDate, &report))
    }

    fn handle_sync(
        &self,
        edits: Option<&Path>,
        units: &[NodeId],
        yes: bool,
        dry_run: bool,
        format: &str,
    ) -> Result<String, ApiError> {
        let mut session = self.open_session(edits)?;
        let visible: Vec<NodeId> = if units.is_empty() {
            session.tree().units().map(|key| key.id).collect()
        } else {
            units.to_vec()
        };

        let pending = self.coordinator.prepare(&session, &visible)?;
        let preview = format_sync_preview(&pending, format)?;
        if dry_run {
            self.runtime.block_on(self.coordinator.commit(
                &mut session,
                self.backend.as_ref(),
                pending,
                Confirmation::Declined,
            ))?;
            return Ok(preview);
        }

        let confirmation = if yes {
            Confirmation::Confirmed
        } else {
            confirm_sync(&preview)?
        };
        let outcome = self.runtime.block_on(self.coordinator.commit(
            &mut session,
            self.backend.as_ref(),
            pending,
            confirmation,
        ))?;
        Ok(format!("{}\n{}", preview, format_sync_outcome(&outcome)))
    }
}

fn apply_overrides(config: &mut StructsyncConfig, overrides: ConfigOverrides) {
    if let Some(project) = overrides.project {
        config.backend.project_id = Some(project);
    }
    if let Some(base_url) = overrides.base_url {
        config.backend.base_url = base_url;
    }
}

fn confirm_sync(preview: &str) -> Result<Confirmation, ApiError> {
    use dialoguer::Confirm;
    eprintln!("{}", preview);
    let confirmed = Confirm::new()
        .with_prompt("Regenerate the schedule for these units?")
        .default(false)
        .interact()
        .map_err(|e| ApiError::InvalidInput(format!("Failed to get user input: {}", e)))?;
    Ok(if confirmed {
        Confirmation::Confirmed
    } else {
        Confirmation::Declined
    })
}
