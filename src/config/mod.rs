//! Configuration management.
//!
//! Settings come from three layers, later ones winning:
//!
//! 1. Built-in defaults, some of which read well-known environment variables
//!    (`SEMANTIC_SCHOLAR_API_KEY`, `RESEARCH_HARVESTER_EMAIL`, ...)
//! 2. A TOML file (`./research-harvester.toml` or the platform config dir)
//! 3. `RESEARCH_HARVESTER__SECTION__KEY` environment variables

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// File name searched for in the working directory
pub const CONFIG_FILE_NAME: &str = "research-harvester.toml";

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Contact details sent to polite-pool APIs
    #[serde(default)]
    pub contact: ContactConfig,

    /// API keys for keyed search sources
    #[serde(default)]
    pub api_keys: ApiKeys,

    /// Document fetching and DOI lookup settings
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Search fan-out settings
    #[serde(default)]
    pub search: SearchConfig,

    /// Where tools may read and write files
    #[serde(default)]
    pub workspace: WorkspaceConfig,
}

impl Config {
    /// Contact email, if one is configured and non-blank
    pub fn contact_email(&self) -> Option<&str> {
        self.contact
            .email
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
    }

    /// Render the effective configuration as TOML
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

/// Contact configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactConfig {
    /// Email passed to Unpaywall (required for DOI lookups) and Crossref/OpenAlex
    #[serde(default)]
    pub email: Option<String>,
}

impl Default for ContactConfig {
    fn default() -> Self {
        Self {
            email: env_non_empty("RESEARCH_HARVESTER_EMAIL")
                .or_else(|| env_non_empty("UNPAYWALL_EMAIL")),
        }
    }
}

/// API keys for external services
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiKeys {
    /// Semantic Scholar API key (optional, for higher rate limits)
    #[serde(default)]
    pub semantic_scholar: Option<String>,

    /// Springer Nature open access API key
    #[serde(default)]
    pub springer: Option<String>,

    /// IEEE Xplore API key
    #[serde(default)]
    pub ieee: Option<String>,

    /// Elsevier API key
    #[serde(default)]
    pub elsevier: Option<String>,

    /// Lens.org scholarly API token
    #[serde(default)]
    pub lens: Option<String>,

    /// NCBI E-utilities key (optional)
    #[serde(default)]
    pub pubmed: Option<String>,
}

impl Default for ApiKeys {
    fn default() -> Self {
        Self {
            semantic_scholar: env_non_empty("SEMANTIC_SCHOLAR_API_KEY"),
            springer: env_non_empty("SPRINGER_API_KEY"),
            ieee: env_non_empty("IEEE_API_KEY"),
            elsevier: env_non_empty("ELSEVIER_API_KEY"),
            lens: env_non_empty("LENS_API_KEY"),
            pubmed: env_non_empty("PUBMED_API_KEY"),
        }
    }
}

/// What fetch-paper does when Unpaywall says a DOI has no open-access copy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnDoiNotOpenAccess {
    /// Fetch the DOI resolver landing page instead
    #[default]
    FallbackToLandingPage,
    /// Fail the fetch
    Fail,
}

/// Fetch configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Timeout for fetching a paper or citation PDF
    #[serde(default = "default_document_timeout")]
    pub document_timeout_secs: u64,

    /// Timeout for Crossref / Unpaywall lookups by DOI
    #[serde(default = "default_lookup_timeout")]
    pub lookup_timeout_secs: u64,

    /// Timeout for one search request to one source
    #[serde(default = "default_search_timeout")]
    pub search_timeout_secs: u64,

    /// Redirect hops followed before giving up
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,

    /// Policy when a DOI has no open-access copy
    #[serde(default)]
    pub on_doi_not_open_access: OnDoiNotOpenAccess,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            document_timeout_secs: default_document_timeout(),
            lookup_timeout_secs: default_lookup_timeout(),
            search_timeout_secs: default_search_timeout(),
            max_redirects: default_max_redirects(),
            on_doi_not_open_access: OnDoiNotOpenAccess::default(),
        }
    }
}

impl FetchConfig {
    pub fn document_timeout(&self) -> Duration {
        Duration::from_secs(self.document_timeout_secs)
    }

    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_secs(self.lookup_timeout_secs)
    }

    pub fn search_timeout(&self) -> Duration {
        Duration::from_secs(self.search_timeout_secs)
    }
}

fn default_document_timeout() -> u64 {
    120
}

fn default_lookup_timeout() -> u64 {
    10
}

fn default_search_timeout() -> u64 {
    15
}

fn default_max_redirects() -> usize {
    5
}

/// Search fan-out configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Results requested from each source when the caller gives no limit
    #[serde(default = "default_max_results")]
    pub max_results_per_source: usize,

    /// Sources queried at the same time
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_sources: usize,

    /// Sources searched when the caller names none; empty means all
    #[serde(default)]
    pub default_sources: Vec<String>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_results_per_source: default_max_results(),
            max_concurrent_sources: default_max_concurrent(),
            default_sources: Vec::new(),
        }
    }
}

fn default_max_results() -> usize {
    5
}

fn default_max_concurrent() -> usize {
    4
}

/// Workspace configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    /// Root directory relative paths resolve against (defaults to the working directory)
    #[serde(default)]
    pub root: Option<PathBuf>,

    /// Reject paths that resolve outside `root`
    #[serde(default)]
    pub restrict_to_workspace: bool,
}

fn env_non_empty(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Load configuration from a file, then apply `RESEARCH_HARVESTER__*` overrides
pub fn load_config(path: &Path) -> Result<Config, config::ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::from(path))
        .add_source(
            config::Environment::with_prefix("RESEARCH_HARVESTER")
                .prefix_separator("__")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize()
}

/// Look for a config file in the working directory, then the platform config dir
pub fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.is_file() {
        return Some(local);
    }

    let global = dirs::config_dir()?.join("research-harvester").join("config.toml");
    global.is_file().then_some(global)
}

/// Get the default configuration (from env vars or defaults)
pub fn get_config() -> Config {
    Config::default()
}
