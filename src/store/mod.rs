//! Vector store abstraction.
//!
//! The [`VectorStore`] trait is the search contract the retrieval chain
//! depends on: chunks go in with their vectors, `search(vector, k)` returns
//! the `k` most similar chunks, best first. Two backends implement it:
//!
//! | Backend | Lifetime |
//! |---------|----------|
//! | [`memory::InMemoryStore`] | one run (ephemeral mode) |
//! | [`sqlite::SqliteStore`] | persisted under the index directory |
//!
//! Both rank by cosine similarity over every stored vector. Ties keep
//! insertion order, so repeated searches over an unchanged index return
//! identical results.

pub mod memory;
pub mod sqlite;

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::models::{Chunk, Document, ScoredChunk};

#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Store a document's chunks with one vector per chunk.
    async fn add(&self, document: &Document, chunks: &[Chunk], vectors: &[Vec<f32>])
        -> Result<()>;

    /// Return up to `k` chunks ranked by similarity to `query_vec`.
    async fn search(&self, query_vec: &[f32], k: usize) -> Result<Vec<ScoredChunk>>;

    /// Number of stored chunks.
    async fn len(&self) -> Result<usize>;
}

fn check_vector_count(chunks: &[Chunk], vectors: &[Vec<f32>]) -> Result<()> {
    if chunks.len() != vectors.len() {
        return Err(Error::Index(format!(
            "{} chunks but {} vectors",
            chunks.len(),
            vectors.len()
        )));
    }
    Ok(())
}

/// Sort hits best-first, keeping insertion order among equal scores, and
/// keep the top `k`.
fn rank(mut hits: Vec<ScoredChunk>, k: usize) -> Vec<ScoredChunk> {
    hits.sort_by(|a, b| b.score.total_cmp(&a.score));
    hits.truncate(k);
    hits
}
