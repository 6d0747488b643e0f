//! Steering document tools

use super::{failure_or_fault, Tool, ToolContext, ToolOutput};
use crate::error::WorkflowError;
use crate::models::{SteeringDocument, SteeringFileType};
use crate::workflow::init_default_steering;
use crate::Result;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SteeringInitRequest {
    #[schemars(description = "Path to the project (defaults to the detected project root)")]
    #[serde(default)]
    pub project_path: Option<String>,
    #[schemars(description = "Template language code, e.g. 'en' or 'ja'")]
    #[serde(default)]
    pub language: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SteeringStatusRequest {
    #[schemars(description = "Path to the project (defaults to the detected project root)")]
    #[serde(default)]
    pub project_path: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SteeringReadRequest {
    #[schemars(description = "Document to read: product, tech, structure or custom. Omit to read all")]
    #[serde(default)]
    pub file_name: Option<String>,
    #[schemars(description = "Path to the project (defaults to the detected project root)")]
    #[serde(default)]
    pub project_path: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SteeringUpdateRequest {
    #[schemars(description = "Document to write: product, tech, structure or custom")]
    pub file_name: String,
    #[schemars(description = "New Markdown content")]
    pub content: String,
    #[schemars(description = "Path to the project (defaults to the detected project root)")]
    #[serde(default)]
    pub project_path: Option<String>,
}

pub fn tools() -> Vec<Tool> {
    vec![
        Tool::new(
            "steering_init",
            "Create the default product, tech and structure steering documents",
            steering_init,
        ),
        Tool::new(
            "steering_status",
            "Report which steering documents exist and which defaults are missing",
            steering_status,
        ),
        Tool::new(
            "steering_read",
            "Read one steering document, or all of them",
            steering_read,
        ),
        Tool::new(
            "steering_update",
            "Replace the content of a steering document",
            steering_update,
        ),
    ]
}

fn document_json(doc: &SteeringDocument) -> Value {
    json!({
        "file_type": doc.file_type,
        "file_path": doc.file_path,
        "content": doc.content,
        "last_modified": doc.last_modified,
    })
}

fn error_payload(e: &WorkflowError) -> Value {
    json!({ "status": "error", "message": e.to_string() })
}

fn parse_file_type(name: &str) -> std::result::Result<SteeringFileType, WorkflowError> {
    name.parse().map_err(WorkflowError::InvalidInput)
}

fn steering_init(req: SteeringInitRequest, ctx: &ToolContext) -> Result<ToolOutput> {
    let paths = ctx.paths(req.project_path.as_deref());
    let language = req
        .language
        .clone()
        .unwrap_or_else(|| ctx.config.default_language.clone());
    let store = ctx.store(req.project_path.as_deref());
    let resolver = ctx.templates(&paths, Some(&language));

    match init_default_steering(&store, &resolver, &language) {
        Ok(result) => Ok(ToolOutput::Structured(json!({
            "status": "success",
            "message": format!(
                "Initialized {} steering documents ({} already present)",
                result.files_created.len(),
                result.files_skipped.len()
            ),
            "files_created": result.files_created,
            "files_skipped": result.files_skipped,
            "steering_dir": paths.steering_dir(),
            "language": language,
        }))),
        Err(e) => failure_or_fault(e, error_payload),
    }
}

fn steering_status(req: SteeringStatusRequest, ctx: &ToolContext) -> Result<ToolOutput> {
    let status = ctx.store(req.project_path.as_deref()).steering_status()?;
    Ok(ToolOutput::Structured(json!({
        "exists": status.exists,
        "steering_dir": status.steering_dir,
        "documents": status.documents.iter().map(|d| json!({
            "file_type": d.file_type,
            "file_path": d.file_path,
            "size": d.content.len(),
            "last_modified": d.last_modified,
        })).collect::<Vec<_>>(),
        "missing_defaults": status.missing_defaults,
        "last_updated": status.last_updated,
    })))
}

fn steering_read(req: SteeringReadRequest, ctx: &ToolContext) -> Result<ToolOutput> {
    let store = ctx.store(req.project_path.as_deref());

    let Some(file_name) = req.file_name.as_deref().filter(|n| !n.trim().is_empty()) else {
        let documents = store.list_steering()?;
        return Ok(ToolOutput::Structured(json!({
            "status": "success",
            "count": documents.len(),
            "documents": documents.iter().map(document_json).collect::<Vec<_>>(),
        })));
    };

    let file_type = match parse_file_type(file_name) {
        Ok(t) => t,
        Err(e) => return failure_or_fault(e, error_payload),
    };
    match store.read_steering(file_type)? {
        Some(doc) => {
            let mut value = document_json(&doc);
            value["status"] = json!("success");
            Ok(ToolOutput::Structured(value))
        }
        None => Ok(ToolOutput::Structured(json!({
            "status": "error",
            "message": format!("Steering document '{}' not found", file_name),
        }))),
    }
}

fn steering_update(req: SteeringUpdateRequest, ctx: &ToolContext) -> Result<ToolOutput> {
    let store = ctx.store(req.project_path.as_deref());
    let written = parse_file_type(&req.file_name)
        .and_then(|file_type| store.write_steering(file_type, &req.content));

    match written {
        Ok(doc) => Ok(ToolOutput::Structured(json!({
            "status": "success",
            "message": format!("Updated {}", doc.file_type.file_name()),
            "file_path": doc.file_path,
            "last_modified": doc.last_modified,
        }))),
        Err(e) => failure_or_fault(e, error_payload),
    }
}
