use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use research_harvester::config::{find_config_file, get_config, load_config, Config};
use research_harvester::mcp::McpServer;
use research_harvester::sources::SourceCapabilities;
use research_harvester::tools::{
    ExtractCitationsArgs, FetchPaperArgs, SearchArgs, ToolResult, Toolbox,
};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Research Harvester - search academic papers, fetch them and mine their citations
#[derive(Parser, Debug)]
#[command(name = "research-harvester")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Search academic papers, fetch them PDF-first and mine their citations", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (can be used multiple times for more verbosity: -v, -vv)
    #[arg(long, short, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Log output format
    #[arg(long, value_enum, global = true, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Show all environment variables
    #[arg(long, global = true)]
    env: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Format of the log lines written to stderr
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum LogFormat {
    /// Human-readable text
    Text,
    /// One JSON object per line
    Json,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Search for papers across sources
    #[command(alias = "s")]
    Search {
        /// Search query string
        query: String,

        /// Source id to search; repeat for several (default: all)
        #[arg(long, short)]
        source: Vec<String>,

        /// Maximum number of results per source (1-20)
        #[arg(long, short)]
        max_results: Option<i64>,

        /// Save the full results to this file
        #[arg(long)]
        save_to: Option<String>,
    },

    /// Fetch a paper by URL or DOI and save it
    #[command(alias = "f")]
    Fetch {
        /// URL of the paper or its landing page
        #[arg(long, short, conflicts_with = "doi")]
        url: Option<String>,

        /// DOI of the paper, resolved through Unpaywall
        #[arg(long, short)]
        doi: Option<String>,

        /// Where to save the paper
        #[arg(long, short = 'o')]
        save_to: String,
    },

    /// Extract and enrich the citations of a saved paper
    #[command(alias = "c")]
    Citations {
        /// Path of the saved paper (PDF or text)
        file_path: String,

        /// Maximum citations to process (1-50)
        #[arg(long, short)]
        max_citations: Option<i64>,

        /// Download open access PDFs of the citations
        #[arg(long, requires = "save_dir")]
        download: bool,

        /// Directory for downloaded PDFs
        #[arg(long)]
        save_dir: Option<String>,

        /// Save the full report to this file
        #[arg(long)]
        report: Option<String>,
    },

    /// List available sources
    #[command(alias = "ls")]
    Sources {
        /// Show capabilities and key requirements
        #[arg(long, short)]
        detailed: bool,

        /// Filter sources by capability
        #[arg(long, value_enum)]
        with_capability: Option<CapabilityFilter>,
    },

    /// Print the effective configuration as TOML
    Config,

    /// Run the MCP server
    Serve {
        /// Run in stdio mode
        #[arg(long, default_value_t = true)]
        stdio: bool,

        /// Run in streamable HTTP mode (overrides --stdio)
        #[arg(long)]
        http: bool,

        /// Port for HTTP mode
        #[arg(long, short, default_value_t = 3000)]
        port: u16,

        /// Host to bind to for HTTP mode
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },
}

/// Capability filter for listing sources
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum CapabilityFilter {
    Search,
    DoiLookup,
    OpenAccess,
}

impl From<CapabilityFilter> for SourceCapabilities {
    fn from(filter: CapabilityFilter) -> Self {
        match filter {
            CapabilityFilter::Search => SourceCapabilities::SEARCH,
            CapabilityFilter::DoiLookup => SourceCapabilities::DOI_LOOKUP,
            CapabilityFilter::OpenAccess => SourceCapabilities::OPEN_ACCESS,
        }
    }
}

/// Print all recognised environment variables
fn print_env_vars() {
    println!("Research Harvester - Environment Variables");
    println!();
    println!("Contact:");
    println!("  RESEARCH_HARVESTER_EMAIL    Contact email for Unpaywall, Crossref and OpenAlex");
    println!("  UNPAYWALL_EMAIL             Fallback for RESEARCH_HARVESTER_EMAIL");
    println!();
    println!("API Keys:");
    println!("  SEMANTIC_SCHOLAR_API_KEY    Semantic Scholar (optional, higher rate limits)");
    println!("  SPRINGER_API_KEY            Springer Nature open access API");
    println!("  IEEE_API_KEY                IEEE Xplore");
    println!("  ELSEVIER_API_KEY            Elsevier ScienceDirect");
    println!("  LENS_API_KEY                Lens.org scholarly API");
    println!("  PUBMED_API_KEY              NCBI E-utilities (optional)");
    println!();
    println!("Overrides:");
    println!("  RESEARCH_HARVESTER__<SECTION>__<KEY>  Any config value, e.g.");
    println!("                                        RESEARCH_HARVESTER__FETCH__MAX_REDIRECTS=3");
    println!();
    println!("Other Settings:");
    println!("  RUST_LOG                    Rust logging level (e.g., debug, info, warn, error)");
}

fn init_tracing(verbose: u8, quiet: bool, format: LogFormat) {
    let log_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let level = if quiet { "error" } else { log_level };

    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| format!("research_harvester={}", level)),
    );

    // stdout carries results and the stdio MCP transport
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init(),
    }
}

fn resolve_config(path: Option<&PathBuf>) -> Result<Config> {
    if let Some(config_path) = path {
        return Ok(load_config(config_path)?);
    }
    match find_config_file() {
        Some(config_path) => {
            tracing::info!("Using config file: {}", config_path.display());
            Ok(load_config(&config_path)?)
        }
        None => Ok(get_config()),
    }
}

/// Cancel `token` on Ctrl-C
fn cancel_on_ctrl_c(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted, cancelling");
            token.cancel();
        }
    });
}

/// Print a tool result; errors go to stderr and fail the process
fn report(result: ToolResult, quiet: bool) -> Result<()> {
    if result.is_error {
        anyhow::bail!(result.for_llm);
    }
    if !quiet {
        println!("{}", result.for_user);
        if result.for_llm != result.for_user {
            eprintln!("{}", result.for_llm);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.env {
        print_env_vars();
        return Ok(());
    }

    init_tracing(cli.verbose, cli.quiet, cli.log_format);

    let config = resolve_config(cli.config.as_ref())?;

    let Some(command) = cli.command else {
        anyhow::bail!("no command given; run with --help for usage");
    };

    if let Commands::Config = command {
        print!("{}", config.to_toml_string()?);
        return Ok(());
    }

    let toolbox = Toolbox::from_config(&config)?;
    let cancel = CancellationToken::new();

    match command {
        Commands::Search {
            query,
            source,
            max_results,
            save_to,
        } => {
            cancel_on_ctrl_c(cancel.clone());
            let args = SearchArgs {
                query,
                sources: Some(source),
                max_results,
                save_to,
            };
            report(toolbox.search.execute(args, &cancel).await, cli.quiet)?;
        }

        Commands::Fetch { url, doi, save_to } => {
            cancel_on_ctrl_c(cancel.clone());
            let args = FetchPaperArgs {
                url,
                doi,
                save_to: Some(save_to),
            };
            report(toolbox.fetch_paper.execute(args, &cancel).await, cli.quiet)?;
        }

        Commands::Citations {
            file_path,
            max_citations,
            download,
            save_dir,
            report: save_report_to,
        } => {
            cancel_on_ctrl_c(cancel.clone());
            let args = ExtractCitationsArgs {
                file_path: Some(file_path),
                max_citations,
                download_available: download,
                save_dir,
                save_report_to,
            };
            report(
                toolbox.extract_citations.execute(args, &cancel).await,
                cli.quiet,
            )?;
        }

        Commands::Sources {
            detailed,
            with_capability,
        } => {
            let registry = toolbox.search.registry();
            let sources: Vec<_> = match with_capability {
                Some(filter) => registry.with_capability(filter.into()),
                None => registry.all().collect(),
            };

            for src in sources {
                if detailed {
                    println!("{} ({})", src.name(), src.id());
                    println!("  Capabilities: {}", src.capabilities().describe());
                    if src.requires_api_key() {
                        println!("  Requires an API key");
                    }
                } else {
                    println!("{} - {}", src.id(), src.name());
                }
            }
        }

        Commands::Serve {
            stdio,
            http,
            port,
            host,
        } => {
            let server = McpServer::new(toolbox)?;

            // Use HTTP mode if --http flag is provided, otherwise use --stdio flag
            let use_http = http || !stdio;

            if use_http {
                let addr = format!("{}:{}", host, port);
                let (bound_addr, handle) = server.run_http(&addr).await?;
                tracing::info!("MCP server listening on {}", bound_addr);

                tokio::select! {
                    joined = handle => {
                        joined.map_err(|e| anyhow::anyhow!("Server task failed: {}", e))?;
                    }
                    _ = tokio::signal::ctrl_c() => {
                        tracing::info!("shutting down");
                        server.shutdown();
                    }
                }
            } else {
                server.run().await?;
            }
        }

        Commands::Config => {}
    }

    Ok(())
}
