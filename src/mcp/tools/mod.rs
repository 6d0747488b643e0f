//! MCP tool registry
//!
//! Every tool takes a typed request struct. Its input schema is generated
//! from that struct, and arguments are deserialized once here before the
//! handler runs.
//!
//! ## Tools
//! - `spec_*` - specification lifecycle (init, requirements, design, tasks, status, list)
//! - `steering_*` - project steering documents
//! - `template_*` - template lookup and rendering
//! - `validate_*` - validation heuristics

pub mod spec;
pub mod steering;
pub mod templates;
pub mod validation;

use crate::config::ServerConfig;
use crate::error::WorkflowError;
use crate::paths::{resolve_project_root, ProjectPaths};
use crate::store::ArtifactStore;
use crate::templates::{TemplateCache, TemplateResolver};
use crate::workflow::{SpecWorkflow, WorkflowOptions};
use crate::Result;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

/// Tool definition for MCP protocol
#[derive(Debug, Clone)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// Result of a tool invocation
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutput {
    Text(String),
    Structured(Value),
}

impl ToolOutput {
    pub fn structured<T: Serialize>(value: &T) -> Result<Self> {
        Ok(ToolOutput::Structured(serde_json::to_value(value)?))
    }

    /// Text sent back in the MCP `content` block
    pub fn to_text(&self) -> String {
        match self {
            ToolOutput::Text(s) => s.clone(),
            ToolOutput::Structured(v) => {
                serde_json::to_string_pretty(v).unwrap_or_else(|_| v.to_string())
            }
        }
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            ToolOutput::Structured(v) => Some(v),
            ToolOutput::Text(_) => None,
        }
    }
}

/// Shared state handed to every tool call
#[derive(Debug, Clone)]
pub struct ToolContext {
    pub config: Arc<ServerConfig>,
    /// Directory used for project-root discovery
    pub cwd: PathBuf,
    /// Shared across calls when `template_cache_enabled` is set
    template_cache: Option<TemplateCache>,
}

impl ToolContext {
    pub fn new(config: Arc<ServerConfig>, cwd: impl Into<PathBuf>) -> Self {
        let template_cache = config.template_cache_enabled.then(TemplateCache::default);
        Self {
            config,
            cwd: cwd.into(),
            template_cache,
        }
    }

    pub fn paths(&self, project_dir: Option<&str>) -> ProjectPaths {
        let root = resolve_project_root(project_dir, self.config.project_dir.as_deref(), &self.cwd);
        ProjectPaths::new(root, self.config.kiro_dir.clone())
    }

    pub fn store(&self, project_dir: Option<&str>) -> ArtifactStore {
        ArtifactStore::new(self.paths(project_dir))
    }

    pub fn templates(&self, paths: &ProjectPaths, language: Option<&str>) -> TemplateResolver {
        let language = language.unwrap_or(&self.config.default_language);
        let resolver =
            TemplateResolver::new(paths, language).with_bundled_dir(self.config.templates_dir.clone());
        match &self.template_cache {
            Some(cache) => resolver.with_shared_cache(Arc::clone(cache)),
            None => resolver,
        }
    }

    pub fn workflow(&self, project_dir: Option<&str>) -> SpecWorkflow {
        let paths = self.paths(project_dir);
        SpecWorkflow::new(
            ArtifactStore::new(paths.clone()),
            self.templates(&paths, None),
            WorkflowOptions::from_config(&self.config),
        )
    }
}

type Handler = Box<dyn Fn(&Value, &ToolContext) -> Result<ToolOutput> + Send + Sync>;

pub struct Tool {
    pub definition: ToolDefinition,
    handler: Handler,
}

impl Tool {
    /// Wrap a typed handler; the schema comes from `R`
    pub fn new<R>(name: &str, description: &str, handler: fn(R, &ToolContext) -> Result<ToolOutput>) -> Self
    where
        R: DeserializeOwned + JsonSchema + 'static,
    {
        Self {
            definition: ToolDefinition {
                name: name.to_string(),
                description: description.to_string(),
                input_schema: input_schema::<R>(),
            },
            handler: Box::new(move |args: &Value, ctx: &ToolContext| {
                let request: R = parse_args(args)?;
                handler(request, ctx)
            }),
        }
    }
}

/// Registry of available MCP tools
pub struct ToolRegistry {
    tools: Vec<Tool>,
}

impl ToolRegistry {
    /// Register every tool module; duplicate names are an error
    pub fn new() -> Result<Self> {
        let tools: Vec<Tool> = [spec::tools(), steering::tools(), templates::tools(), validation::tools()]
            .into_iter()
            .flatten()
            .collect();

        let mut seen = HashSet::new();
        for tool in &tools {
            if !seen.insert(tool.definition.name.clone()) {
                anyhow::bail!("Duplicate tool name: {}", tool.definition.name);
            }
        }

        tracing::debug!("Registered {} tools", tools.len());
        Ok(Self { tools })
    }

    pub fn definitions(&self) -> impl Iterator<Item = &ToolDefinition> {
        self.tools.iter().map(|t| &t.definition)
    }

    pub fn get(&self, name: &str) -> Option<&ToolDefinition> {
        self.definitions().find(|d| d.name == name)
    }

    /// List all available tools in MCP format
    pub fn list_tools(&self) -> Vec<Value> {
        self.definitions()
            .map(|t| {
                json!({
                    "name": t.name,
                    "description": t.description,
                    "inputSchema": t.input_schema
                })
            })
            .collect()
    }

    /// Call a tool by name with the given arguments
    pub fn call_tool(&self, name: &str, arguments: &Value, ctx: &ToolContext) -> Result<ToolOutput> {
        let tool = self
            .tools
            .iter()
            .find(|t| t.definition.name == name)
            .ok_or_else(|| anyhow::anyhow!("Unknown tool: {}", name))?;
        (tool.handler)(arguments, ctx)
    }
}

fn input_schema<R: JsonSchema>() -> Value {
    let mut value = serde_json::to_value(schemars::schema_for!(R))
        .unwrap_or_else(|_| json!({ "type": "object" }));
    if let Some(obj) = value.as_object_mut() {
        obj.remove("$schema");
    }
    value
}

/// Deserialize tool arguments, treating a missing object as `{}`
pub fn parse_args<R: DeserializeOwned>(args: &Value) -> Result<R> {
    let args = if args.is_null() { json!({}) } else { args.clone() };
    serde_json::from_value(args)
        .map_err(|e| WorkflowError::InvalidInput(e.to_string()).into())
}

/// Turn a domain error into the tool's failure payload; faults keep propagating
pub fn failure_or_fault(
    error: WorkflowError,
    payload: impl FnOnce(&WorkflowError) -> Value,
) -> Result<ToolOutput> {
    if error.is_domain() {
        Ok(ToolOutput::Structured(payload(&error)))
    } else {
        tracing::error!("Tool fault: {}", error);
        Err(error.into())
    }
}
