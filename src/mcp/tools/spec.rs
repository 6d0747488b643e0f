//! Specification lifecycle tools

use super::{failure_or_fault, Tool, ToolContext, ToolOutput};
use crate::models::SpecPhase;
use crate::workflow::GenerationOutcome;
use crate::Result;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SpecInitRequest {
    #[schemars(description = "Feature name; normalized to lowercase with hyphens")]
    pub feature_name: String,
    #[schemars(description = "Short description of the feature")]
    pub description: String,
    #[schemars(description = "Project directory (defaults to the detected project root)")]
    #[serde(default)]
    pub project_dir: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GenerateRequest {
    #[schemars(description = "Feature name given to spec_init")]
    pub feature_name: String,
    #[schemars(description = "Project directory (defaults to the detected project root)")]
    #[serde(default)]
    pub project_dir: Option<String>,
    #[schemars(description = "Bypass the approval gate for this call and mark the generated phase approved")]
    #[serde(default)]
    pub auto_approve: bool,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SpecStatusRequest {
    #[schemars(description = "Feature name given to spec_init")]
    pub feature_name: String,
    #[schemars(description = "Project directory (defaults to the detected project root)")]
    #[serde(default)]
    pub project_dir: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SpecListRequest {
    #[schemars(description = "Project directory (defaults to the detected project root)")]
    #[serde(default)]
    pub project_dir: Option<String>,
}

pub fn tools() -> Vec<Tool> {
    vec![
        Tool::new(
            "spec_init",
            "Initialize a new feature specification in .kiro/specs",
            spec_init,
        ),
        Tool::new(
            "spec_requirements",
            "Generate requirements.md for an initialized specification",
            spec_requirements,
        ),
        Tool::new(
            "spec_design",
            "Generate design.md once requirements are approved (or with auto_approve)",
            spec_design,
        ),
        Tool::new(
            "spec_tasks",
            "Generate tasks.md once design is approved (or with auto_approve)",
            spec_tasks,
        ),
        Tool::new(
            "spec_status",
            "Show phase, approvals and generated files for a specification",
            spec_status,
        ),
        Tool::new("spec_list", "List all specifications in the project", spec_list),
    ]
}

fn spec_init(req: SpecInitRequest, ctx: &ToolContext) -> Result<ToolOutput> {
    let workflow = ctx.workflow(req.project_dir.as_deref());
    match workflow.init(&req.feature_name, &req.description) {
        Ok(outcome) => {
            let message = if outcome.created {
                format!("Specification '{}' initialized", outcome.metadata.feature_name)
            } else {
                format!("Specification '{}' already exists", outcome.metadata.feature_name)
            };
            Ok(ToolOutput::Structured(json!({
                "success": true,
                "feature_name": outcome.metadata.feature_name,
                "spec_dir": outcome.spec_dir,
                "current_phase": outcome.metadata.current_phase,
                "created": outcome.created,
                "steering_created": outcome.steering_created,
                "message": message,
            })))
        }
        Err(e) => failure_or_fault(e, |e| {
            json!({
                "success": false,
                "error": e.to_string(),
                "error_kind": e.kind(),
                "feature_name": req.feature_name,
            })
        }),
    }
}

fn spec_requirements(req: GenerateRequest, ctx: &ToolContext) -> Result<ToolOutput> {
    generate(SpecPhase::Requirements, req, ctx)
}

fn spec_design(req: GenerateRequest, ctx: &ToolContext) -> Result<ToolOutput> {
    generate(SpecPhase::Design, req, ctx)
}

fn spec_tasks(req: GenerateRequest, ctx: &ToolContext) -> Result<ToolOutput> {
    generate(SpecPhase::Tasks, req, ctx)
}

fn generate(phase: SpecPhase, req: GenerateRequest, ctx: &ToolContext) -> Result<ToolOutput> {
    let workflow = ctx.workflow(req.project_dir.as_deref());
    let outcome = workflow.generate(phase, &req.feature_name, req.auto_approve)?;

    let value = match outcome {
        GenerationOutcome::Generated(artifact) => {
            let mut value = json!({
                "success": true,
                "feature_name": artifact.feature_name,
                "current_phase": artifact.current_phase,
                "auto_approved": artifact.auto_approved,
                "template_source": artifact.template_source,
                "message": format!("{} generated successfully", capitalize(phase.as_str())),
            });
            value[format!("{}_file", phase)] = json!(artifact.file);
            value
        }
        GenerationOutcome::Blocked {
            error,
            current_phase,
        } => json!({
            "success": false,
            "error": error.to_string(),
            "error_kind": error.kind(),
            "current_phase": current_phase,
        }),
    };
    Ok(ToolOutput::Structured(value))
}

fn spec_status(req: SpecStatusRequest, ctx: &ToolContext) -> Result<ToolOutput> {
    let workflow = ctx.workflow(req.project_dir.as_deref());
    match workflow.get_status(&req.feature_name) {
        Ok(status) => ToolOutput::structured(&status),
        Err(e) => failure_or_fault(e, |e| {
            json!({
                "error": e.to_string(),
                "feature_name": req.feature_name,
            })
        }),
    }
}

fn spec_list(req: SpecListRequest, ctx: &ToolContext) -> Result<ToolOutput> {
    let specs = ctx.workflow(req.project_dir.as_deref()).list_specs()?;
    Ok(ToolOutput::Structured(json!({
        "success": true,
        "count": specs.len(),
        "specs": specs,
    })))
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
