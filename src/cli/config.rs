//! validate-config CLI subcommand

use crate::config::ServerConfig;
use crate::Result;
use colored::Colorize;
use std::path::Path;

pub fn run(config: &ServerConfig, save_to: Option<&Path>, json_output: bool) -> Result<()> {
    if let Err(e) = config.validate() {
        println!("{}", format!("✗ Configuration is invalid: {}", e).red());
        return Err(e);
    }

    if json_output {
        println!("{}", serde_json::to_string_pretty(config)?);
    } else {
        println!("{}", "✓ Configuration is valid".green().bold());
        println!();
        print_field("server_name", &config.server_name);
        print_field("server_version", &config.server_version);
        print_field("log_level", &config.log_level);
        print_field("project_dir", &display_opt(config.project_dir.as_deref()));
        print_field("kiro_dir", &config.kiro_dir);
        print_field("default_language", &config.default_language);
        print_field("templates_dir", &display_opt(config.templates_dir.as_deref()));
        print_field("template_cache", &config.template_cache_enabled.to_string());
        print_field("auto_create_steering", &config.auto_create_steering.to_string());
        print_field("strict_phase_gates", &config.strict_phase_gates.to_string());
    }

    if let Some(path) = save_to {
        config.save(path)?;
        println!("{}", format!("Saved to {}", path.display()).cyan());
    }
    Ok(())
}

fn print_field(name: &str, value: &str) {
    println!("   {:<22} {}", format!("{}:", name), value);
}

fn display_opt(path: Option<&Path>) -> String {
    path.map(|p| p.display().to_string())
        .unwrap_or_else(|| "(auto)".to_string())
}
