//! Validation tools

use super::{failure_or_fault, Tool, ToolContext, ToolOutput};
use crate::error::WorkflowResult;
use crate::models::ValidationReport;
use crate::validator::SpecValidator;
use crate::Result;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ValidateRequest {
    #[schemars(description = "Feature name given to spec_init")]
    pub feature_name: String,
    #[schemars(description = "Project directory (defaults to the detected project root)")]
    #[serde(default)]
    pub project_dir: Option<String>,
}

pub fn tools() -> Vec<Tool> {
    vec![
        Tool::new(
            "validate_gap",
            "Check the project for gaps between requirements and existing code layout",
            validate_gap,
        ),
        Tool::new(
            "validate_design",
            "Check design.md for architecture, components, data models, API and security coverage",
            validate_design,
        ),
        Tool::new(
            "validate_impl",
            "Check implementation progress against tasks.md",
            validate_impl,
        ),
    ]
}

fn run(
    req: ValidateRequest,
    ctx: &ToolContext,
    check: impl FnOnce(&SpecValidator, &str) -> WorkflowResult<ValidationReport>,
) -> Result<ToolOutput> {
    let store = ctx.store(req.project_dir.as_deref());
    let validator = SpecValidator::new(&store);
    match check(&validator, &req.feature_name) {
        Ok(report) => ToolOutput::structured(&report),
        Err(e) => failure_or_fault(e, |e| {
            json!({
                "success": false,
                "error": e.to_string(),
                "feature_name": req.feature_name,
            })
        }),
    }
}

fn validate_gap(req: ValidateRequest, ctx: &ToolContext) -> Result<ToolOutput> {
    run(req, ctx, |v, name| v.validate_gap(name))
}

fn validate_design(req: ValidateRequest, ctx: &ToolContext) -> Result<ToolOutput> {
    run(req, ctx, |v, name| v.validate_design(name))
}

fn validate_impl(req: ValidateRequest, ctx: &ToolContext) -> Result<ToolOutput> {
    run(req, ctx, |v, name| v.validate_implementation(name))
}
