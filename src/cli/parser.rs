//! Command-line argument parsing.
//!
//! Defines the CLI structure using clap derive macros.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::agent::schema::ExtractionSchema;
use crate::chunking::{DEFAULT_CHUNK_SIZE, DEFAULT_OVERLAP};

/// bid-analyser: tender and bid document analyser.
///
/// Extracts key tender information, answers questions and translates
/// results using a chat-completion LLM. Requires `GROQ_API_KEY` (or
/// `BID_API_KEY`) for every command except `chunks` and `init-prompts`.
#[derive(Parser, Debug)]
#[command(name = "bid-analyser")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose (debug) logging on stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json).
    #[arg(long, default_value = "text", global = true)]
    pub format: String,

    /// Directory containing prompt template overrides.
    ///
    /// Defaults to `~/.config/bid-analyser/prompts` when present.
    #[arg(long, env = "BID_PROMPT_DIR", global = true)]
    pub prompt_dir: Option<PathBuf>,

    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show how a document is cleaned and split into chunks.
    ///
    /// Works offline; no API key is needed.
    #[command(after_help = r"Examples:
  bid-analyser chunks nit.pdf
  bid-analyser chunks nit.txt --chunk-size 1500 --overlap 150
  bid-analyser --format json chunks nit.pdf | jq '.chunks | length'
")]
    Chunks {
        /// Document to split (PDF or plain text).
        file: PathBuf,

        /// Chunk window length in characters.
        #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
        chunk_size: usize,

        /// Characters shared by consecutive chunks.
        #[arg(long, default_value_t = DEFAULT_OVERLAP)]
        overlap: usize,
    },

    /// Extract key tender information from a document.
    #[command(after_help = r"Examples:
  bid-analyser summarize nit.pdf
  bid-analyser summarize nit.pdf --schema outline
  bid-analyser summarize nit.pdf --translate Hindi
  bid-analyser --format json summarize nit.pdf | jq '.report.merged.value.timeline'
")]
    Summarize {
        /// Document to analyse (PDF or plain text).
        file: PathBuf,

        /// Output contract for the extraction.
        #[arg(long, value_enum, default_value_t = ExtractionSchema::Json)]
        schema: ExtractionSchema,

        /// Also translate the summary into this language.
        #[arg(long, value_name = "LANGUAGE")]
        translate: Option<String>,
    },

    /// Answer a question about a document.
    #[command(after_help = r#"Examples:
  bid-analyser ask nit.pdf "What is the EMD amount?"
  bid-analyser ask nit.pdf "When is the bid submission deadline?"
"#)]
    Ask {
        /// Document to question (PDF or plain text).
        file: PathBuf,

        /// The question.
        question: String,
    },

    /// Summarize a document and translate the summary.
    #[command(after_help = r"Examples:
  bid-analyser translate nit.pdf --to Hindi
  bid-analyser translate nit.pdf --to Tamil --schema outline
")]
    Translate {
        /// Document to analyse (PDF or plain text).
        file: PathBuf,

        /// Target language.
        #[arg(long, value_name = "LANGUAGE")]
        to: String,

        /// Output contract for the extraction that gets translated.
        #[arg(long, value_enum, default_value_t = ExtractionSchema::Json)]
        schema: ExtractionSchema,
    },

    /// Start an interactive session over a document.
    ///
    /// Plain lines are questions. Commands: `:summary`, `:translate <lang>`,
    /// `:history`, `:reset`, `:load <file>`, `:help`, `:quit`.
    #[command(after_help = r"Examples:
  bid-analyser session nit.pdf
  bid-analyser session nit.pdf --schema outline
")]
    Session {
        /// Document to load first (PDF or plain text).
        file: PathBuf,

        /// Output contract for `:summary`.
        #[arg(long, value_enum, default_value_t = ExtractionSchema::Json)]
        schema: ExtractionSchema,
    },

    /// Write the default prompt templates for customization.
    ///
    /// Existing files are never overwritten.
    #[command(after_help = r"Examples:
  bid-analyser init-prompts
  bid-analyser init-prompts --dir ./prompts
")]
    InitPrompts {
        /// Target directory (default: ~/.config/bid-analyser/prompts).
        #[arg(long)]
        dir: Option<PathBuf>,
    },
}
