//! Command implementations for the CLI
//!
//! - start: Start the HTTP server
//! - test: Validate configuration and print a summary
//! - config: Display the effective configuration
//! - secret: Resolve a single secret through the configured vault

pub mod config;
pub mod secret;
pub mod start;
