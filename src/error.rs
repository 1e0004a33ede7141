//! Error taxonomy for recipe resolution.
//!
//! Every failure aborts the current resolution and carries enough context
//! (stack, tool, constraint, url or path) to diagnose it without re-running.

use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    // ── Detection ──
    #[error("no supported stack detected in {}", path.display())]
    NoSupportedStack { path: PathBuf },

    #[error("failed to parse {file}: {reason}")]
    ManifestParse { file: String, reason: String },

    // ── Tools ──
    #[error("{tool} tool not found")]
    ToolNotFound { tool: String },

    #[error("failed to resolve tool {tool}")]
    ToolResolution {
        tool: String,
        #[source]
        source: Box<Error>,
    },

    // ── Versions ──
    #[error("unknown {stack} version {constraint}")]
    UnknownVersion { stack: String, constraint: String },

    #[error("invalid {stack} version constraint {constraint:?}: {reason}")]
    InvalidConstraint {
        stack: String,
        constraint: String,
        reason: String,
    },

    // ── Transport ──
    #[error("failed to build HTTP client")]
    Client {
        #[source]
        source: reqwest::Error,
    },

    #[error("request to {url} failed with HTTP {status}")]
    Http { url: String, status: u16 },

    #[error("request to {url} failed")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("unexpected response body from {url}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to read {}", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("response cache failure at {}", path.display())]
    Cache {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub(crate) fn manifest(file: impl Into<String>, reason: impl ToString) -> Self {
        Error::ManifestParse {
            file: file.into(),
            reason: reason.to_string(),
        }
    }

    /// Attaches the tool name to any failure raised while resolving it.
    pub(crate) fn for_tool(self, tool: &str) -> Self {
        match self {
            Error::ToolNotFound { .. } | Error::ToolResolution { .. } => self,
            other => Error::ToolResolution {
                tool: tool.to_string(),
                source: Box::new(other),
            },
        }
    }
}
