use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use colored::Colorize;
use sdd_mcp::config::ServerConfig;
use sdd_mcp::Result;
use std::io;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sdd-mcp")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "MCP server for phase-gated spec-driven development", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to a JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the MCP server over stdio (default)
    Start {
        /// Override the configured log level (DEBUG, INFO, WARNING, ERROR)
        #[arg(long)]
        log_level: Option<String>,
    },

    /// List available tools grouped by area
    #[command(name = "list-tools")]
    ListTools {
        /// Output the MCP tool definitions as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show a tool's description and parameters
    #[command(name = "inspect-tool")]
    InspectTool {
        /// Tool name
        name: String,

        /// Output the definition as JSON
        #[arg(long)]
        json: bool,
    },

    /// Invoke a tool once and print its result
    #[command(name = "test-tool")]
    TestTool {
        /// Tool name
        name: String,

        /// Tool arguments as a JSON object
        #[arg(long)]
        args: Option<String>,
    },

    /// Load and validate the configuration, then print the effective settings
    #[command(name = "validate-config")]
    ValidateConfig {
        /// Write the effective configuration to this path
        #[arg(long)]
        save: Option<PathBuf>,

        /// Print the configuration as JSON
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell type (bash, zsh, fish, powershell)
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Print version information
    Version,
}

fn main() {
    let cli = Cli::parse();

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("{}", format!("Error: failed to create tokio runtime: {}", e).red());
            std::process::exit(1);
        }
    };

    if let Err(e) = runtime.block_on(run_async(cli)) {
        eprintln!("{}", format!("Error: {:#}", e).red());
        std::process::exit(1);
    }
}

async fn run_async(cli: Cli) -> Result<()> {
    let command = cli.command.unwrap_or(Commands::Start { log_level: None });

    match command {
        Commands::Completions { shell } => {
            generate(shell, &mut Cli::command(), "sdd-mcp", &mut io::stdout());
            return Ok(());
        }
        Commands::Version => {
            println!("sdd-mcp {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        _ => {}
    }

    let mut config = ServerConfig::load(cli.config.as_deref())?;

    match command {
        Commands::Start { log_level } => {
            if let Some(level) = log_level {
                config.log_level = level;
            }
            sdd_mcp::logging::init(&config.log_level);
            sdd_mcp::cli::server::run(config).await?;
        }

        Commands::ListTools { json } => {
            sdd_mcp::logging::init(&config.log_level);
            sdd_mcp::cli::tools::list(json)?;
        }

        Commands::InspectTool { name, json } => {
            sdd_mcp::logging::init(&config.log_level);
            sdd_mcp::cli::tools::inspect(&name, json)?;
        }

        Commands::TestTool { name, args } => {
            sdd_mcp::logging::init(&config.log_level);
            sdd_mcp::cli::tools::test(config, &name, args.as_deref())?;
        }

        Commands::ValidateConfig { save, json } => {
            sdd_mcp::cli::config::run(&config, save.as_deref(), json)?;
        }

        Commands::Completions { .. } | Commands::Version => {}
    }

    Ok(())
}
