//! MCP (Model Context Protocol) server for the spec workflow
//!
//! Exposes steering, specification, template and validation operations as
//! tools over JSON-RPC 2.0 on stdio.

pub mod server;
pub mod tools;

pub use server::McpServer;
pub use tools::{ToolContext, ToolOutput, ToolRegistry};
