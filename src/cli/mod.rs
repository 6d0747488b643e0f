//! Command-line entry points
//!
//! `main.rs` parses arguments with clap and dispatches here.

pub mod config;
pub mod server;
pub mod tools;
