//! Tree and catalog presentation.

use super::format_section_heading;
use crate::error::ApiError;
use crate::resolve::{Resolved, ValueSource};
use crate::session::EditSession;
use crate::types::{Level, NodeId, NodeKey, ProcessModelId};
use chrono::NaiveDate;
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;
use serde::Serialize;
use serde_json::json;

/// One node with both effective values, for JSON output.
#[derive(Debug, Clone, Serialize)]
pub struct TreeRow {
    pub level: Level,
    pub id: NodeId,
    pub name: String,
    pub process_model_id: Option<ProcessModelId>,
    pub process_model: Option<String>,
    pub process_model_source: ValueSource,
    pub start_date: Option<NaiveDate>,
    pub start_date_source: ValueSource,
    /// Process model that produced the unit's generated tasks.
    pub task_process_model: Option<String>,
}

fn task_process_model(session: &EditSession, key: NodeKey) -> Option<&str> {
    if !key.is_unit() {
        return None;
    }
    session.derived().first_process_model_name(key.id)
}

fn rows(session: &EditSession) -> Vec<TreeRow> {
    let resolver = session.resolver();
    session
        .tree()
        .preorder()
        .filter_map(|key| {
            let node = session.tree().get(&key)?;
            let pm = resolver.explain_process_model(key);
            let start = resolver.explain_start_date(key);
            Some(TreeRow {
                level: key.level,
                id: key.id,
                name: node.name.clone(),
                process_model_id: pm.value,
                process_model: pm
                    .value
                    .and_then(|id| session.process_model_name(id))
                    .map(str::to_string),
                process_model_source: pm.source,
                start_date: start.value,
                start_date_source: start.source,
                task_process_model: task_process_model(session, key).map(str::to_string),
            })
        })
        .collect()
}

fn source_label(source: ValueSource) -> String {
    match source {
        ValueSource::Staged => format!("{}", "staged".yellow()),
        ValueSource::Cleared => format!("{}", "cleared".red()),
        ValueSource::AncestorStaged(from) => format!("{}", format!("from {}", from).cyan()),
        ValueSource::Persisted => "saved".to_string(),
        ValueSource::Derived => format!("{}", "derived".dimmed()),
        ValueSource::Unset => String::new(),
    }
}

fn indent(key: NodeKey) -> usize {
    match key.level {
        Level::Component => 0,
        Level::Riser => 2,
        Level::Floor => 4,
        Level::Unit => 6,
    }
}

fn display_value<T: std::fmt::Display>(resolved: &Resolved<T>) -> String {
    resolved
        .value
        .as_ref()
        .map(|v| v.to_string())
        .unwrap_or_else(|| "-".to_string())
}

pub fn format_tree_text(session: &EditSession) -> String {
    if session.tree().is_empty() {
        return "Project has no structure.".to_string();
    }
    let resolver = session.resolver();
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Node", "Name", "Process model", "", "Start", "", "Tasks from"]);
    for key in session.tree().preorder() {
        let Some(node) = session.tree().get(&key) else {
            continue;
        };
        let pm = resolver.explain_process_model(key);
        let start = resolver.explain_start_date(key);
        let pm_text = match pm.value {
            Some(id) => match session.process_model_name(id) {
                Some(name) => format!("{} ({})", name, id),
                None => id.to_string(),
            },
            None => "-".to_string(),
        };
        table.add_row(vec![
            format!("{}{}", " ".repeat(indent(key)), key),
            node.name.clone(),
            pm_text,
            source_label(pm.source),
            display_value(&start),
            source_label(start.source),
            task_process_model(session, key).unwrap_or_default().to_string(),
        ]);
    }

    let mut out = format!(
        "{}\n\n{}\n",
        format_section_heading(&format!("Project {}", session.project_id())),
        table
    );
    let staged = session.overrides().len();
    if staged > 0 {
        out.push_str(&format!("\n{} staged edit(s), not yet written\n", staged));
    }
    out
}

pub fn format_tree_json(session: &EditSession) -> Result<String, ApiError> {
    let out = json!({
        "project_id": session.project_id(),
        "nodes": rows(session),
        "staged": session.overrides().len(),
    });
    serde_json::to_string_pretty(&out).map_err(|e| ApiError::InvalidInput(e.to_string()))
}

pub fn format_models(session: &EditSession, format: &str) -> Result<String, ApiError> {
    if format == "json" {
        let models: Vec<_> = session
            .catalog()
            .iter()
            .map(|(id, name)| json!({ "id": id, "name": name }))
            .collect();
        return serde_json::to_string_pretty(&json!({ "process_models": models }))
            .map_err(|e| ApiError::InvalidInput(e.to_string()));
    }
    if session.catalog().is_empty() {
        return Ok("No process models defined.".to_string());
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Id", "Name"]);
    for (id, name) in session.catalog() {
        table.add_row(vec![id.to_string(), name.clone()]);
    }
    Ok(format!("{}\n\nTotal: {} process model(s)", table, session.catalog().len()))
}
