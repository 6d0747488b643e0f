//! Tool inspection commands: list-tools, inspect-tool, test-tool

use crate::config::ServerConfig;
use crate::mcp::{ToolContext, ToolOutput, ToolRegistry};
use crate::Result;
use anyhow::{anyhow, Context};
use colored::Colorize;
use serde_json::{json, Value};
use std::sync::Arc;

const GROUPS: &[(&str, &str)] = &[
    ("steering_", "Steering"),
    ("spec_", "Specification"),
    ("template_", "Template"),
    ("validate_", "Validation"),
];

/// Display group for a tool name
pub fn group_of(name: &str) -> &'static str {
    GROUPS
        .iter()
        .find(|(prefix, _)| name.starts_with(prefix))
        .map(|(_, group)| *group)
        .unwrap_or("Other")
}

/// One entry of a tool's input schema
#[derive(Debug, Clone, PartialEq)]
pub struct ParamInfo {
    pub name: String,
    pub type_name: String,
    pub required: bool,
    pub description: String,
}

/// Flatten the top-level properties of an input schema
pub fn parameters(schema: &Value) -> Vec<ParamInfo> {
    let required: Vec<&str> = schema["required"]
        .as_array()
        .map(|a| a.iter().filter_map(|v| v.as_str()).collect())
        .unwrap_or_default();

    let Some(properties) = schema["properties"].as_object() else {
        return Vec::new();
    };

    properties
        .iter()
        .map(|(name, prop)| ParamInfo {
            name: name.clone(),
            type_name: type_name(prop),
            required: required.contains(&name.as_str()),
            description: prop["description"].as_str().unwrap_or_default().to_string(),
        })
        .collect()
}

fn type_name(prop: &Value) -> String {
    match &prop["type"] {
        Value::String(s) => s.clone(),
        Value::Array(types) => types
            .iter()
            .filter_map(|t| t.as_str())
            .filter(|t| *t != "null")
            .collect::<Vec<_>>()
            .join("|"),
        _ => "any".to_string(),
    }
}

pub fn list(json_output: bool) -> Result<()> {
    let registry = ToolRegistry::new()?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&registry.list_tools())?);
        return Ok(());
    }

    println!("{}", "Available MCP tools".cyan().bold());
    for (_, group) in GROUPS {
        let members: Vec<_> = registry
            .definitions()
            .filter(|d| group_of(&d.name) == *group)
            .collect();
        if members.is_empty() {
            continue;
        }
        println!("\n{}", format!("{} ({})", group, members.len()).green().bold());
        for def in members {
            println!("   • {:<18} {}", def.name.bold(), def.description.dimmed());
        }
    }
    Ok(())
}

pub fn inspect(name: &str, json_output: bool) -> Result<()> {
    let registry = ToolRegistry::new()?;
    let def = registry
        .get(name)
        .ok_or_else(|| anyhow!("Unknown tool: {}. Run 'sdd-mcp list-tools' to see available tools", name))?;

    if json_output {
        let value = json!({
            "name": def.name,
            "description": def.description,
            "inputSchema": def.input_schema,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("{}", def.name.cyan().bold());
    println!("   {}", def.description);
    println!("   Group: {}", group_of(&def.name));

    let params = parameters(&def.input_schema);
    if params.is_empty() {
        println!("\n   {}", "No parameters".dimmed());
        return Ok(());
    }

    println!("\n{}", "Parameters:".green().bold());
    for p in params {
        let marker = if p.required {
            "required".red().to_string()
        } else {
            "optional".dimmed().to_string()
        };
        println!("   • {} ({}, {})", p.name.bold(), p.type_name, marker);
        if !p.description.is_empty() {
            println!("       {}", p.description);
        }
    }
    Ok(())
}

/// Parse `--args`; anything but a JSON object is rejected before the tool runs
pub fn parse_tool_args(raw: Option<&str>) -> Result<Value> {
    let Some(raw) = raw.filter(|s| !s.trim().is_empty()) else {
        return Ok(json!({}));
    };
    let value: Value =
        serde_json::from_str(raw).with_context(|| format!("Invalid JSON for --args: {}", raw))?;
    if !value.is_object() {
        anyhow::bail!("--args must be a JSON object, got: {}", raw);
    }
    Ok(value)
}

pub fn test(config: ServerConfig, name: &str, raw_args: Option<&str>) -> Result<()> {
    let arguments = parse_tool_args(raw_args)?;
    let registry = ToolRegistry::new()?;
    if registry.get(name).is_none() {
        anyhow::bail!("Unknown tool: {}", name);
    }

    let cwd = std::env::current_dir()?;
    let ctx = ToolContext::new(Arc::new(config), cwd);

    println!("{}", format!("Calling {} with {}", name, arguments).cyan());
    let output = registry.call_tool(name, &arguments, &ctx)?;

    let failed = match &output {
        ToolOutput::Structured(v) => {
            v["success"] == json!(false) || v["status"] == json!("error")
        }
        ToolOutput::Text(_) => false,
    };
    if failed {
        println!("{}", "Tool reported a failure:".yellow().bold());
    } else {
        println!("{}", "Result:".green().bold());
    }
    println!("{}", output.to_text());
    Ok(())
}
