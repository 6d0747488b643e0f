// sdd-mcp - phase-gated spec-driven development over MCP
// Steering documents, requirements, design and tasks managed through a stdio JSON-RPC server

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod mcp;
pub mod models;
pub mod paths;
pub mod store;
pub mod templates;
pub mod validator;
pub mod workflow;

pub use anyhow::{Context, Result};

// Re-export commonly used types
pub use config::ServerConfig;
pub use error::{TemplateError, WorkflowError, WorkflowResult};
pub use models::{SpecPhase, SpecificationMetadata, SteeringFileType, ValidationReport};
pub use store::ArtifactStore;
pub use workflow::{GenerationOutcome, SpecWorkflow, WorkflowOptions};
