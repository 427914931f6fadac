//! bid-analyser: tender and bid document analysis over chat-completion LLMs.
//!
//! A document is cleaned and split into overlapping character windows. Each
//! window is sent to the model separately (map), and the per-window results
//! are merged into one answer (reduce). On top of that pipeline the crate
//! provides:
//!
//! - key-information extraction as a labelled outline or a fixed JSON
//!   object, with recovery of malformed JSON and field backfill;
//! - question answering with relevance filtering of per-chunk replies;
//! - paragraph-preserving translation of results;
//! - a [`Session`](crate::core::Session) that owns everything derived from one
//!   loaded document.
//!
//! # Example
//!
//! ```no_run
//! use bid_analyser::agent::{AgentConfig, Orchestrator};
//! use bid_analyser::io::load_document;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run() -> bid_analyser::Result<()> {
//! let config = AgentConfig::from_env()?;
//! let document = load_document("nit.pdf".as_ref(), config.chunk_size, config.overlap)?;
//! let orchestrator = Orchestrator::from_config(config)?;
//! let report = orchestrator
//!     .summarize(&document.chunks, &CancellationToken::new())
//!     .await?;
//! # let _ = report;
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod chunking;
pub mod cli;
pub mod core;
pub mod error;
pub mod io;

pub use chunking::{Chunk, split};
pub use crate::core::{Document, Session};
pub use error::{AgentError, Error, Result};
