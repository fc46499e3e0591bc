//! In-memory [`VectorStore`] used in ephemeral mode and in tests.
//!
//! Entries live in a `Vec` behind `std::sync::RwLock`. Search is
//! brute-force cosine similarity over every stored vector.

use std::sync::RwLock;

use async_trait::async_trait;

use crate::embedding::cosine_similarity;
use crate::error::{Error, Result};
use crate::models::{Chunk, Document, ScoredChunk};

use super::{check_vector_count, rank, VectorStore};

struct Entry {
    chunk: Chunk,
    source: String,
    vector: Vec<f32>,
}

#[derive(Default)]
pub struct InMemoryStore {
    entries: RwLock<Vec<Entry>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> Error {
    Error::Index("in-memory index lock poisoned".into())
}

#[async_trait]
impl VectorStore for InMemoryStore {
    async fn add(
        &self,
        document: &Document,
        chunks: &[Chunk],
        vectors: &[Vec<f32>],
    ) -> Result<()> {
        check_vector_count(chunks, vectors)?;
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        for (chunk, vector) in chunks.iter().zip(vectors) {
            entries.push(Entry {
                chunk: chunk.clone(),
                source: document.source.clone(),
                vector: vector.clone(),
            });
        }
        Ok(())
    }

    async fn search(&self, query_vec: &[f32], k: usize) -> Result<Vec<ScoredChunk>> {
        let entries = self.entries.read().map_err(|_| poisoned())?;
        let hits = entries
            .iter()
            .map(|e| ScoredChunk {
                chunk_id: e.chunk.id.clone(),
                document_id: e.chunk.document_id.clone(),
                source: e.source.clone(),
                text: e.chunk.text.clone(),
                score: cosine_similarity(query_vec, &e.vector),
            })
            .collect();
        Ok(rank(hits, k))
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.entries.read().map_err(|_| poisoned())?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::path::PathBuf;

    fn doc(source: &str) -> Document {
        Document {
            id: format!("doc-{}", source),
            source: source.to_string(),
            path: PathBuf::from(source),
            title: source.to_string(),
            content_type: "text/plain".to_string(),
            modified_at: Utc::now(),
            body: String::new(),
        }
    }

    fn chunk(doc: &Document, index: i64, text: &str) -> Chunk {
        Chunk {
            id: format!("{}-{}", doc.id, index),
            document_id: doc.id.clone(),
            chunk_index: index,
            text: text.to_string(),
            hash: String::new(),
        }
    }

    #[tokio::test]
    async fn test_search_returns_nearest() {
        let store = InMemoryStore::new();
        let d = doc("a.md");
        let chunks = vec![chunk(&d, 0, "east"), chunk(&d, 1, "north")];
        store
            .add(&d, &chunks, &[vec![1.0, 0.0], vec![0.0, 1.0]])
            .await
            .unwrap();

        let hits = store.search(&[0.1, 0.9], 1).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].text, "north");
        assert_eq!(hits[0].source, "a.md");
        assert_eq!(store.len().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_vector_count_mismatch_rejected() {
        let store = InMemoryStore::new();
        let d = doc("a.md");
        let chunks = vec![chunk(&d, 0, "x")];
        let result = store.add(&d, &chunks, &[]).await;
        assert!(matches!(result, Err(Error::Index(_))));
        assert_eq!(store.len().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_empty_store_returns_nothing() {
        let store = InMemoryStore::new();
        assert!(store.search(&[1.0], 1).await.unwrap().is_empty());
    }
}
