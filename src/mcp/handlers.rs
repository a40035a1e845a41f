//! Adapters from JSON tool arguments to the typed tools.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use super::tools::ToolHandler;
use crate::tools::{ExtractCitationsTool, FetchPaperTool, SearchTool, ToolResult};

fn parse_args<T: DeserializeOwned>(args: Value) -> Result<T, String> {
    // clients may send no arguments at all
    let args = if args.is_null() {
        Value::Object(Default::default())
    } else {
        args
    };
    serde_json::from_value(args).map_err(|e| format!("Invalid arguments: {}", e))
}

fn envelope(result: ToolResult) -> Result<Value, String> {
    serde_json::to_value(result).map_err(|e| e.to_string())
}

/// Handler for `academic_search`
#[derive(Debug)]
pub struct SearchHandler {
    tool: SearchTool,
}

impl SearchHandler {
    pub fn new(tool: SearchTool) -> Self {
        Self { tool }
    }
}

#[async_trait::async_trait]
impl ToolHandler for SearchHandler {
    async fn execute(&self, args: Value, cancel: &CancellationToken) -> Result<Value, String> {
        let args = parse_args(args)?;
        envelope(self.tool.execute(args, cancel).await)
    }
}

/// Handler for `academic_fetch_paper`
#[derive(Debug)]
pub struct FetchPaperHandler {
    tool: FetchPaperTool,
}

impl FetchPaperHandler {
    pub fn new(tool: FetchPaperTool) -> Self {
        Self { tool }
    }
}

#[async_trait::async_trait]
impl ToolHandler for FetchPaperHandler {
    async fn execute(&self, args: Value, cancel: &CancellationToken) -> Result<Value, String> {
        let args = parse_args(args)?;
        envelope(self.tool.execute(args, cancel).await)
    }
}

/// Handler for `academic_extract_citations`
#[derive(Debug)]
pub struct ExtractCitationsHandler {
    tool: ExtractCitationsTool,
}

impl ExtractCitationsHandler {
    pub fn new(tool: ExtractCitationsTool) -> Self {
        Self { tool }
    }
}

#[async_trait::async_trait]
impl ToolHandler for ExtractCitationsHandler {
    async fn execute(&self, args: Value, cancel: &CancellationToken) -> Result<Value, String> {
        let args = parse_args(args)?;
        envelope(self.tool.execute(args, cancel).await)
    }
}
