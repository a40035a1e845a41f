//! # Research Harvester
//!
//! Agent-facing tools for academic research: search a dozen paper APIs at
//! once, fetch a paper by URL or DOI, and mine a paper's reference list.
//!
//! ## Architecture
//!
//! - [`models`]: Paper and citation records
//! - [`sources`]: Search adapters behind the [`Source`] trait, plus the DOI lookups
//! - [`fetch`]: Redirect-following document fetcher, PDF detection and HTML helpers
//! - [`citations`]: Reference-section location, citation parsing and enrichment
//! - [`tools`]: The three workflows, each returning a [`ToolResult`]
//! - [`mcp`]: MCP server exposing the tools
//! - [`fs`]: Host and workspace-sandboxed file access
//! - [`utils`]: HTTP client, PDF text recovery and validation
//! - [`config`]: Configuration management

pub mod citations;
pub mod config;
pub mod fetch;
pub mod fs;
pub mod mcp;
pub mod models;
pub mod sources;
pub mod tools;
pub mod utils;

// Re-export commonly used types
pub use models::{CitationRef, PaperResult};
pub use sources::{Source, SourceRegistry};
pub use tools::{ToolResult, Toolbox};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
