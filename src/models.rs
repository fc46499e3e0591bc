//! Core data models that flow through the askdocs pipeline.
//!
//! Documents are produced by the loader and consumed once by the index
//! builder. Chunks and their vectors live in a vector store. Turns make up
//! the conversation history owned by a session.

use chrono::{DateTime, Utc};
use std::path::PathBuf;

/// A loaded document: extracted text plus where it came from.
#[derive(Debug, Clone)]
pub struct Document {
    pub id: String,
    /// Path relative to the document directory (e.g. `guides/setup.md`).
    pub source: String,
    pub path: PathBuf,
    pub title: String,
    pub content_type: String,
    pub modified_at: DateTime<Utc>,
    pub body: String,
}

/// A chunk of a document's body text.
#[derive(Debug, Clone)]
pub struct Chunk {
    pub id: String,
    pub document_id: String,
    pub chunk_index: i64,
    pub text: String,
    /// SHA-256 of `text`, hex encoded.
    pub hash: String,
}

/// A chunk returned by a similarity search, best match first.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredChunk {
    pub chunk_id: String,
    pub document_id: String,
    /// Source path of the owning document.
    pub source: String,
    pub text: String,
    /// Cosine similarity to the query vector.
    pub score: f32,
}

/// One exchange of the conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub question: String,
    pub answer: String,
}

impl Turn {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }
}
