//! Tool registry for MCP tools.

use std::sync::Arc;

use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;

use super::handlers::{ExtractCitationsHandler, FetchPaperHandler, SearchHandler};
use crate::models::{DEFAULT_MAX_RESULTS, MAX_RESULTS_LIMIT};
use crate::tools::{Toolbox, DEFAULT_MAX_CITATIONS, MAX_CITATIONS_LIMIT};

/// An MCP tool that can be called by the client
#[derive(Clone)]
pub struct Tool {
    /// Tool name (e.g., "academic_search")
    pub name: String,

    /// Human-readable description
    pub description: String,

    /// JSON Schema for input parameters
    pub input_schema: Value,

    /// Handler function to execute the tool
    pub handler: Arc<dyn ToolHandler>,
}

impl std::fmt::Debug for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tool")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("input_schema", &self.input_schema)
            .finish()
    }
}

/// Handler for executing a tool
#[async_trait::async_trait]
pub trait ToolHandler: Send + Sync + std::fmt::Debug {
    /// Execute the tool; `Err` only for arguments that do not deserialize
    async fn execute(&self, args: Value, cancel: &CancellationToken) -> Result<Value, String>;
}

/// Registry for all MCP tools, in registration order
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<Tool>,
}

impl ToolRegistry {
    /// Register the three academic tools backed by `toolbox`
    pub fn from_toolbox(toolbox: Toolbox) -> Self {
        let mut registry = Self::default();
        let source_ids: Vec<String> = toolbox
            .search
            .registry()
            .ids()
            .map(str::to_string)
            .collect();

        registry.register(Tool {
            name: "academic_search".to_string(),
            description: format!(
                "Search academic papers across {} sources ({}) and merge the results. \
                 Sources that fail are reported alongside the results.",
                source_ids.len(),
                source_ids.join(", ")
            ),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Search query"
                    },
                    "sources": {
                        "type": "array",
                        "items": { "type": "string", "enum": source_ids },
                        "description": "Source ids to search; all configured sources when omitted"
                    },
                    "max_results": {
                        "type": "integer",
                        "minimum": 1,
                        "maximum": MAX_RESULTS_LIMIT,
                        "default": DEFAULT_MAX_RESULTS,
                        "description": "Maximum results per source"
                    },
                    "save_to": {
                        "type": "string",
                        "description": "Save the full results to this file and return a summary"
                    }
                },
                "required": ["query"]
            }),
            handler: Arc::new(SearchHandler::new(toolbox.search)),
        });

        registry.register(Tool {
            name: "academic_fetch_paper".to_string(),
            description: "Fetch a paper by URL or DOI and save it. PDFs are saved as-is; \
                          HTML pages are followed to their PDF when one is linked, \
                          otherwise saved as extracted text. DOIs are resolved through \
                          Unpaywall and need a configured contact email."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "url": {
                        "type": "string",
                        "description": "http(s) URL of the paper or its landing page"
                    },
                    "doi": {
                        "type": "string",
                        "description": "DOI of the paper (used when url is absent)"
                    },
                    "save_to": {
                        "type": "string",
                        "description": "File path to save the paper to"
                    }
                },
                "required": ["save_to"]
            }),
            handler: Arc::new(FetchPaperHandler::new(toolbox.fetch_paper)),
        });

        registry.register(Tool {
            name: "academic_extract_citations".to_string(),
            description: "Extract the reference list of a saved paper (PDF or text), \
                          enrich each citation through Crossref, check open access \
                          through Unpaywall and optionally download open copies."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "file_path": {
                        "type": "string",
                        "description": "Path of the saved paper"
                    },
                    "max_citations": {
                        "type": "integer",
                        "minimum": 1,
                        "maximum": MAX_CITATIONS_LIMIT,
                        "default": DEFAULT_MAX_CITATIONS,
                        "description": "Maximum citations to process"
                    },
                    "download_available": {
                        "type": "boolean",
                        "default": false,
                        "description": "Download open access PDFs of the citations"
                    },
                    "save_dir": {
                        "type": "string",
                        "description": "Directory for downloaded PDFs (required with download_available)"
                    },
                    "save_report_to": {
                        "type": "string",
                        "description": "Save the full report to this file and return a summary"
                    }
                },
                "required": ["file_path"]
            }),
            handler: Arc::new(ExtractCitationsHandler::new(toolbox.extract_citations)),
        });

        registry
    }

    /// Register a tool, replacing any tool with the same name
    pub fn register(&mut self, tool: Tool) {
        match self.tools.iter_mut().find(|t| t.name == tool.name) {
            Some(existing) => *existing = tool,
            None => self.tools.push(tool),
        }
    }

    /// Get all tools
    pub fn all(&self) -> impl Iterator<Item = &Tool> {
        self.tools.iter()
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<&Tool> {
        self.tools.iter().find(|t| t.name == name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Execute a tool by name
    pub async fn execute(
        &self,
        name: &str,
        args: Value,
        cancel: &CancellationToken,
    ) -> Result<Value, String> {
        let tool = self
            .get(name)
            .ok_or_else(|| format!("Tool '{}' not found", name))?;

        tool.handler.execute(args, cancel).await
    }
}
