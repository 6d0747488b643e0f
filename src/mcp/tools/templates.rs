//! Template tools

use super::{failure_or_fault, Tool, ToolContext, ToolOutput};
use crate::error::WorkflowError;
use crate::templates::{self, TemplateCategory};
use crate::Result;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{json, Map, Value};

#[derive(Debug, Deserialize, JsonSchema)]
pub struct TemplateListRequest {
    #[schemars(description = "Project directory (defaults to the detected project root)")]
    #[serde(default)]
    pub project_dir: Option<String>,
    #[schemars(description = "Optional category filter: 'steering' or 'specs'")]
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct TemplateGetRequest {
    #[schemars(description = "Name of the template, e.g. 'product', 'tech', 'structure'")]
    pub template_name: String,
    #[schemars(description = "Type of template: 'steering', 'requirements', 'design', 'tasks' or 'specs'")]
    #[serde(default = "default_template_type")]
    pub template_type: String,
    #[schemars(description = "Project directory (defaults to the detected project root)")]
    #[serde(default)]
    pub project_dir: Option<String>,
}

fn default_template_type() -> String {
    "steering".to_string()
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct TemplateRenderRequest {
    #[schemars(description = "Template text (Jinja syntax), or a file path when use_file is true")]
    pub template_content: String,
    #[schemars(description = "Variables available to the template")]
    #[serde(default)]
    pub context: Map<String, Value>,
    #[schemars(description = "Treat template_content as a path relative to the project or template directories")]
    #[serde(default)]
    pub use_file: bool,
    #[schemars(description = "Project directory (defaults to the detected project root)")]
    #[serde(default)]
    pub project_dir: Option<String>,
}

pub fn tools() -> Vec<Tool> {
    vec![
        Tool::new(
            "template_list",
            "List available templates with their paths, categories and languages",
            template_list,
        ),
        Tool::new("template_get", "Get the raw content of a template", template_get),
        Tool::new(
            "template_render",
            "Render a template with the provided context variables",
            template_render,
        ),
    ]
}

fn failure(e: &WorkflowError) -> Value {
    json!({ "success": false, "error": e.to_string() })
}

fn template_list(req: TemplateListRequest, ctx: &ToolContext) -> Result<ToolOutput> {
    let category = match req.category.as_deref().map(str::parse::<TemplateCategory>) {
        None => None,
        Some(Ok(c)) => Some(c),
        Some(Err(msg)) => return failure_or_fault(WorkflowError::InvalidInput(msg), failure),
    };

    let paths = ctx.paths(req.project_dir.as_deref());
    let templates = ctx.templates(&paths, None).list(category);
    Ok(ToolOutput::Structured(json!({
        "success": true,
        "count": templates.len(),
        "templates": templates,
        "category_filter": req.category,
    })))
}

/// Map `template_type` onto a category and the name to look up
fn lookup_target(template_type: &str, template_name: &str) -> Option<(TemplateCategory, String)> {
    match template_type.trim().to_lowercase().as_str() {
        "steering" => Some((TemplateCategory::Steering, template_name.to_string())),
        "requirements" | "design" | "tasks" => {
            Some((TemplateCategory::Specs, template_type.trim().to_lowercase()))
        }
        "spec" | "specs" => Some((TemplateCategory::Specs, template_name.to_string())),
        _ => None,
    }
}

fn template_get(req: TemplateGetRequest, ctx: &ToolContext) -> Result<ToolOutput> {
    let Some((category, name)) = lookup_target(&req.template_type, &req.template_name) else {
        return failure_or_fault(
            WorkflowError::InvalidInput(format!(
                "Unknown template_type '{}'. Valid: steering, requirements, design, tasks, specs",
                req.template_type
            )),
            failure,
        );
    };

    let paths = ctx.paths(req.project_dir.as_deref());
    match ctx.templates(&paths, None).resolve_default(category, &name)? {
        Some(template) => Ok(ToolOutput::Structured(json!({
            "success": true,
            "template_name": req.template_name,
            "template_type": req.template_type,
            "source": template.source,
            "path": template.path,
            "content": template.content,
        }))),
        None => Ok(ToolOutput::Structured(json!({
            "success": false,
            "error": format!(
                "Template '{}' not found for type '{}'",
                req.template_name, req.template_type
            ),
        }))),
    }
}

fn template_render(req: TemplateRenderRequest, ctx: &ToolContext) -> Result<ToolOutput> {
    let rendered = if req.use_file {
        let paths = ctx.paths(req.project_dir.as_deref());
        ctx.templates(&paths, None)
            .render_file(&req.template_content, &req.context)
    } else {
        templates::render(&req.template_content, &req.context).map_err(WorkflowError::from)
    };

    match rendered {
        Ok(content) => Ok(ToolOutput::Structured(json!({
            "success": true,
            "rendered_content": content,
            "context_used": req.context,
        }))),
        Err(e) => {
            tracing::warn!("Template rendering failed: {}", e);
            failure_or_fault(e, failure)
        }
    }
}
