//! The uniform envelope every tool returns, and the errors that feed it.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::fetch::FetchError;
use crate::fs::FsError;
use crate::sources::SourceError;
use crate::utils::ValidationError;

/// Outcome of one tool call
///
/// `for_llm` is what an agent should read; `for_user` is the full
/// human-facing text. They differ when a long result was saved to a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResult {
    pub is_error: bool,
    pub for_llm: String,
    pub for_user: String,
}

impl ToolResult {
    pub fn success(for_llm: impl Into<String>, for_user: impl Into<String>) -> Self {
        Self {
            is_error: false,
            for_llm: for_llm.into(),
            for_user: for_user.into(),
        }
    }

    /// Success with the same text for both audiences
    pub fn text(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::success(message.clone(), message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            is_error: true,
            for_llm: message.clone(),
            for_user: message,
        }
    }
}

impl From<ToolError> for ToolResult {
    fn from(err: ToolError) -> Self {
        ToolResult::error(err.to_string())
    }
}

/// Why a tool call failed
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("{0} is required")]
    MissingArgument(&'static str),

    #[error("either url or doi must be provided")]
    MissingUrlOrDoi,

    #[error(
        "a contact email must be configured (contact.email or RESEARCH_HARVESTER_EMAIL) to look up DOIs via Unpaywall"
    )]
    MissingContactEmail,

    #[error("only http/https URLs are supported")]
    UnsupportedScheme(String),

    #[error(transparent)]
    InvalidDoi(ValidationError),

    #[error("save_dir is required when download_available=true")]
    MissingSaveDir,

    #[error("no open access copy of DOI {0} is known")]
    NotOpenAccess(String),

    #[error("Unpaywall lookup failed for DOI {doi}: {source}")]
    OpenAccessLookup {
        doi: String,
        #[source]
        source: SourceError,
    },

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("failed to read file: {0}")]
    Read(#[source] FsError),

    #[error("{context}: {source}")]
    Write {
        context: &'static str,
        #[source]
        source: FsError,
    },

    #[error("no text content could be extracted from the file")]
    NoText,

    #[error("all searches failed: {}", .0.join("; "))]
    AllSourcesFailed(Vec<String>),

    #[error("{0} was cancelled")]
    Cancelled(&'static str),

    #[error("failed to set up tools: {0}")]
    Setup(String),
}
