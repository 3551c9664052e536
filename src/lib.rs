//! Persistent knowledge base for AI agents, served over MCP.
//!
//! Entries (category, title, content, tags, metadata) live in SQLite and are
//! reached through nine MCP tools. Entries can be grouped into named contexts,
//! each readable as a `context://<name>` resource.
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from TOML files and environment variables
//! - [`db`]: SQLite database initialization, schema, and migrations
//! - [`knowledge`]: Entry store, query engine, aggregations, and contexts
//! - [`tools`]: Tool dispatcher and the MCP handler
//! - [`http`]: Optional authenticated HTTP front door
//! - [`server`]: Transport wiring for stdio and streamable HTTP

pub mod config;
pub mod db;
pub mod http;
pub mod knowledge;
pub mod server;
pub mod tools;
