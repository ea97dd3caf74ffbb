//! Sync and commit presentation.

use crate::error::ApiError;
use crate::session::CommitReport;
use crate::sync::{PendingSync, SyncOutcome};
use crate::types::{Attribute, NodeKey};
use serde_json::json;

fn id_list(ids: &[u64]) -> String {
    if ids.is_empty() {
        "-".to_string()
    } else {
        ids.iter().map(|id| id.to_string()).collect::<Vec<_>>().join(", ")
    }
}

pub fn format_sync_preview(pending: &PendingSync, format: &str) -> Result<String, ApiError> {
    let request = &pending.request;
    if format == "json" {
        let out = json!({
            "process_model_writes": pending.process_model_writes.writes.len(),
            "body": request.to_body(),
        });
        return serde_json::to_string_pretty(&out)
            .map_err(|e| ApiError::InvalidInput(e.to_string()));
    }
    let mut out = format!(
        "Sync preview:\n  Units in scope: {}\n  Process-model writes: {}\n  Scheduled units: {}\n",
        request.visible_unit_ids.len(),
        pending.process_model_writes.writes.len(),
        request.start_map.len(),
    );
    for (unit, start) in &request.start_map {
        out.push_str(&format!("    unit:{} -> {}\n", unit, start));
    }
    out.push_str(&format!(
        "  Purged units: {}\n",
        id_list(&request.purge_unit_ids)
    ));
    Ok(out)
}

pub fn format_sync_outcome(outcome: &SyncOutcome) -> String {
    match outcome {
        SyncOutcome::Cancelled => "Sync cancelled".to_string(),
        SyncOutcome::Applied(summary) => {
            let mut out = format!(
                "Sync applied:\n  Process-model writes: {}\n  Scheduled units: {}\n  Purged units: {}\n  Tasks reported: {}",
                summary.process_model_writes,
                summary.scheduled_units,
                summary.purged_units,
                summary.tasks_reported
            );
            for conflict in &summary.conflicts {
                out.push_str(&format!("\n  Warning: {}", conflict));
            }
            out
        }
    }
}

pub fn format_commit_report(key: NodeKey, attribute: Attribute, report: &CommitReport) -> String {
    let mut out = format!(
        "Committed {} on {}: {} node write(s), {} unchanged",
        attribute, key, report.written, report.settled
    );
    if report.scheduled_units + report.purged_units > 0 {
        out.push_str(&format!(
            "\nSynced subtree: {} unit(s) scheduled, {} purged",
            report.scheduled_units, report.purged_units
        ));
    }
    for conflict in &report.conflicts {
        out.push_str(&format!("\nWarning: {}", conflict));
    }
    out
}
