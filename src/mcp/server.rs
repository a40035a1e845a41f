//! MCP server implementation using pmcp (Pragmatic AI's rust-mcp-sdk).
//!
//! Serves the academic tools over stdio or streamable HTTP.

use crate::mcp::tools::{ToolHandler as AcademicToolHandler, ToolRegistry};
use crate::tools::Toolbox;
use async_trait::async_trait;
use pmcp::{
    server::streamable_http_server::StreamableHttpServer, Error, RequestHandlerExtra, Server,
    ServerCapabilities, ToolHandler, ToolInfo,
};
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Name reported to MCP clients
pub const SERVER_NAME: &str = "research-harvester";

/// The MCP server exposing search, fetch and citation extraction
#[derive(Debug)]
pub struct McpServer {
    server: Arc<Mutex<Server>>,
    shutdown: CancellationToken,
}

impl McpServer {
    /// Create a new MCP server around the given tools
    pub fn new(toolbox: Toolbox) -> Result<Self, pmcp::Error> {
        let shutdown = CancellationToken::new();
        let tools = ToolRegistry::from_toolbox(toolbox);
        let server = Self::build_server_impl(tools, &shutdown)?;
        Ok(Self {
            server: Arc::new(Mutex::new(server)),
            shutdown,
        })
    }

    /// Token cancelled by [`McpServer::shutdown`]; in-flight tool calls observe it
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Cancel every in-flight tool call
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    fn build_server_impl(
        tools: ToolRegistry,
        shutdown: &CancellationToken,
    ) -> Result<Server, pmcp::Error> {
        let mut builder = Server::builder()
            .name(SERVER_NAME)
            .version(env!("CARGO_PKG_VERSION"))
            .capabilities(ServerCapabilities::default());

        for tool in tools.all() {
            let tool_handler = ToolWrapper {
                name: tool.name.clone(),
                description: Some(tool.description.clone()),
                input_schema: tool.input_schema.clone(),
                handler: tool.handler.clone(),
                shutdown: shutdown.clone(),
            };
            builder = builder.tool(tool_handler.name.clone(), tool_handler);
        }

        builder.build()
    }

    /// Run the server in stdio mode
    pub async fn run(self) -> Result<(), pmcp::Error> {
        tracing::info!("Starting MCP server in stdio mode");
        self.into_server()?.run_stdio().await
    }

    // run_stdio() takes ownership of the Server, so the HTTP transport must not hold a clone
    fn into_server(self) -> Result<Server, pmcp::Error> {
        Arc::try_unwrap(self.server)
            .map(Mutex::into_inner)
            .map_err(|_| Error::internal("MCP server is already shared with another transport"))
    }

    /// Run the server over streamable HTTP, returning the bound address
    pub async fn run_http(&self, addr: &str) -> Result<(SocketAddr, JoinHandle<()>), pmcp::Error> {
        tracing::info!("Starting MCP server in HTTP mode on {}", addr);

        let socket_addr: SocketAddr = addr
            .parse()
            .map_err(|e| Error::invalid_params(format!("Invalid address: {}", e)))?;

        StreamableHttpServer::new(socket_addr, self.server.clone())
            .start()
            .await
    }
}

/// Adapts an academic tool to pmcp's ToolHandler
#[derive(Clone)]
struct ToolWrapper {
    name: String,
    description: Option<String>,
    input_schema: Value,
    handler: Arc<dyn AcademicToolHandler>,
    shutdown: CancellationToken,
}

#[async_trait]
impl ToolHandler for ToolWrapper {
    async fn handle(&self, args: Value, _extra: RequestHandlerExtra) -> Result<Value, Error> {
        tracing::debug!(tool = %self.name, "tool call");
        let cancel = self.shutdown.child_token();
        self.handler
            .execute(args, &cancel)
            .await
            .map_err(Error::invalid_params)
    }

    fn metadata(&self) -> Option<ToolInfo> {
        Some(ToolInfo::new(
            self.name.clone(),
            self.description.clone(),
            self.input_schema.clone(),
        ))
    }
}
