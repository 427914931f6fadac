//! Error types for bid-analyser.
//!
//! Each layer has its own `thiserror` enum; [`Error`] unifies them for the
//! command layer. Every rendered error begins with the [`ERROR_MARKER`] so
//! text consumers (history entries, exported summaries) can still tell a
//! failure apart from a successful answer.

use std::time::Duration;

use thiserror::Error;

/// Leading marker carried by every rendered error message.
pub const ERROR_MARKER: &str = "Error";

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type.
#[derive(Debug, Error)]
pub enum Error {
    /// LLM or orchestration failure.
    #[error(transparent)]
    Agent(#[from] AgentError),

    /// Invalid chunking parameters.
    #[error(transparent)]
    Chunking(#[from] ChunkingError),

    /// Document ingestion failure.
    #[error(transparent)]
    Io(#[from] IoError),

    /// Command execution failure.
    #[error(transparent)]
    Command(#[from] CommandError),
}

/// Errors raised by the LLM client and the orchestrators.
///
/// The variants mirror the failure kinds the retry policy distinguishes:
/// rate limits and transport failures are retried, authentication failures
/// are not, and map-phase failures are recovered by the orchestrators.
#[derive(Debug, Error)]
pub enum AgentError {
    /// No API key in the explicit configuration or the environment.
    #[error("Error: API key missing (set GROQ_API_KEY or BID_API_KEY)")]
    ApiKeyMissing,

    /// Network failure, timeout or unreadable response body.
    #[error("Error: transport failure: {message}")]
    Transport {
        /// Underlying failure description.
        message: String,
    },

    /// HTTP 429 from the provider.
    #[error("Error: rate limited by provider: {message}")]
    RateLimited {
        /// Server-supplied `Retry-After` delay, when present.
        retry_after: Option<Duration>,
        /// Provider error message.
        message: String,
    },

    /// HTTP 401 from the provider. Never retried.
    #[error("Error: authentication failed (invalid API key): {message}")]
    Authentication {
        /// Provider error message.
        message: String,
    },

    /// Any other non-success HTTP status.
    #[error("Error: API request failed{}: {message}", status_suffix(.status))]
    ApiRequest {
        /// Provider error message.
        message: String,
        /// HTTP status code, if one was received.
        status: Option<u16>,
    },

    /// The response parsed but carried no completion choices.
    #[error("Error: provider returned no completion choices")]
    EmptyResponse,

    /// Every attempt failed; wraps the last failure.
    #[error("Error: request failed after {attempts} attempt(s): {source}")]
    RetriesExhausted {
        /// Attempts made.
        attempts: u32,
        /// Last failure observed.
        source: Box<AgentError>,
    },

    /// Map phase finished without a single usable chunk result.
    #[error("Error: unable to summarize document ({attempted} chunk(s) attempted, none succeeded)")]
    NoUsableChunks {
        /// Number of chunks that were sent.
        attempted: usize,
    },

    /// The document produced no chunks to work on.
    #[error("Error: document has no content to analyse")]
    NoChunks,

    /// The question was blank.
    #[error("Error: question cannot be empty")]
    EmptyQuestion,

    /// The run was cancelled between chunks.
    #[error("Error: operation cancelled after {completed} of {total} chunk(s)")]
    Cancelled {
        /// Chunks finished before cancellation.
        completed: usize,
        /// Chunks in the run.
        total: usize,
    },

    /// Unknown provider name in the configuration.
    #[error("Error: unsupported provider: {name}")]
    UnsupportedProvider {
        /// Provider name that was requested.
        name: String,
    },

    /// Any other orchestration failure.
    #[error("Error: {message}")]
    Orchestration {
        /// Failure description.
        message: String,
    },
}

impl AgentError {
    /// Returns `true` when the retry policy may try the request again.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Transport { .. }
                | Self::RateLimited { .. }
                | Self::ApiRequest { .. }
                | Self::EmptyResponse
        )
    }

    /// Server-requested delay for rate-limit errors.
    #[must_use]
    pub const fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

/// Errors from the chunker.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChunkingError {
    /// Chunk size of zero.
    #[error("Error: chunk size must be greater than zero")]
    InvalidChunkSize,

    /// Overlap not smaller than the chunk size.
    #[error("Error: overlap ({overlap}) must be smaller than chunk size ({size})")]
    InvalidOverlap {
        /// Requested chunk size.
        size: usize,
        /// Requested overlap.
        overlap: usize,
    },
}

/// Errors reading input documents.
#[derive(Debug, Error)]
pub enum IoError {
    /// File could not be read.
    #[error("Error: failed to read {path}: {reason}")]
    ReadFailed {
        /// File path.
        path: String,
        /// Failure reason.
        reason: String,
    },

    /// PDF text extraction failed.
    #[error("Error: failed to extract text from PDF {path}: {reason}")]
    PdfExtraction {
        /// File path.
        path: String,
        /// Failure reason.
        reason: String,
    },

    /// PDF support was compiled out.
    #[error("Error: PDF support is disabled (rebuild with the `pdf` feature): {path}")]
    PdfUnsupported {
        /// File path.
        path: String,
    },
}

/// Errors from CLI command execution.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The user supplied unusable input (e.g. a document with no text).
    #[error("Error: {0}")]
    InvalidInput(String),

    /// Command failed while executing.
    #[error("Error: {0}")]
    ExecutionFailed(String),

    /// Output could not be rendered.
    #[error("Error: output formatting failed: {0}")]
    OutputFormat(String),
}

#[allow(clippy::ref_option)]
fn status_suffix(status: &Option<u16>) -> String {
    status.map_or_else(String::new, |s| format!(" (status {s})"))
}

/// Returns `true` if `text` is a rendered error rather than a result.
#[must_use]
pub fn is_error_text(text: &str) -> bool {
    text.trim_start().starts_with(ERROR_MARKER)
}
