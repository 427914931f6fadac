//! Core domain types: documents, answer relevance and sessions.

pub mod document;
pub mod relevance;
pub mod session;

pub use document::{Document, clean_text};
pub use relevance::{AnswerRelevance, MIN_ANSWER_LEN, classify_answer};
pub use session::{QaEntry, Session, Translation};
