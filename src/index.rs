//! Index acquisition.
//!
//! The configured [`IndexMode`] is resolved once at startup into an
//! [`IndexStrategy`], which then produces the vector store the chain
//! searches:
//!
//! ```text
//! Ephemeral            ──▶ Rebuild          ──▶ load → chunk → embed → InMemoryStore
//! Persistent, no file  ──▶ BuildAndPersist  ──▶ load → chunk → embed → SqliteStore
//! Persistent, file     ──▶ ReusePersisted   ──▶ open SqliteStore (no loading, no embedding)
//! ```
//!
//! There is no incremental update: to pick up changed documents in
//! persistent mode, delete the persist directory.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::chunk::chunk_text;
use crate::config::{ChunkingConfig, Config, IndexMode};
use crate::embedding::Embedder;
use crate::error::{Error, Result};
use crate::loader::load_documents;
use crate::models::Document;
use crate::store::memory::InMemoryStore;
use crate::store::sqlite::SqliteStore;
use crate::store::VectorStore;

/// Concrete way of obtaining the index for this run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexStrategy {
    /// Build in memory from the document directory.
    Rebuild,
    /// Open the index persisted in this directory.
    ReusePersisted(PathBuf),
    /// Build from the document directory and persist into this directory.
    BuildAndPersist(PathBuf),
}

/// Counts from an index build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildStats {
    pub documents: usize,
    pub chunks: usize,
}

impl IndexStrategy {
    /// Pick a strategy for `mode`, checking the disk for a persisted index.
    pub fn resolve(mode: &IndexMode) -> Self {
        match mode {
            IndexMode::Ephemeral => IndexStrategy::Rebuild,
            IndexMode::Persistent { path } => {
                if SqliteStore::index_file(path).exists() {
                    IndexStrategy::ReusePersisted(path.clone())
                } else {
                    IndexStrategy::BuildAndPersist(path.clone())
                }
            }
        }
    }

    /// Produce the vector store for this run.
    pub async fn acquire(
        self,
        config: &Config,
        embedder: &dyn Embedder,
    ) -> Result<Box<dyn VectorStore>> {
        match self {
            IndexStrategy::Rebuild => {
                let documents = load_documents(&config.documents)?;
                let store = InMemoryStore::new();
                build_index(&store, &documents, &config.chunking, embedder).await?;
                Ok(Box::new(store))
            }
            IndexStrategy::ReusePersisted(dir) => {
                let store = SqliteStore::open(&dir).await?;
                if !store.is_complete().await? {
                    warn!(dir = %dir.display(), "persisted index is incomplete; rebuilding");
                    store.close().await;
                    return build_persisted(&dir, config, embedder).await;
                }

                if let Some(model) = store.embedding_model().await? {
                    if model != embedder.model_name() {
                        return Err(Error::Config(format!(
                            "persisted index in {} was built with embedding model '{}' but '{}' is configured; delete the directory to rebuild",
                            dir.display(),
                            model,
                            embedder.model_name()
                        )));
                    }
                }

                let chunks = store.len().await?;
                eprintln!("Reusing index...");
                debug!(dir = %dir.display(), chunks, "reusing persisted index");
                Ok(Box::new(store))
            }
            IndexStrategy::BuildAndPersist(dir) => build_persisted(&dir, config, embedder).await,
        }
    }
}

async fn build_persisted(
    dir: &Path,
    config: &Config,
    embedder: &dyn Embedder,
) -> Result<Box<dyn VectorStore>> {
    let documents = load_documents(&config.documents)?;
    let store = SqliteStore::create(dir).await?;
    build_index(&store, &documents, &config.chunking, embedder).await?;
    store.mark_complete(embedder.model_name()).await?;
    info!(dir = %dir.display(), "index persisted");
    Ok(Box::new(store))
}

/// Chunk and embed `documents` into `store`.
pub async fn build_index(
    store: &dyn VectorStore,
    documents: &[Document],
    chunking: &ChunkingConfig,
    embedder: &dyn Embedder,
) -> Result<BuildStats> {
    info!(documents = documents.len(), "Building index");
    let mut stats = BuildStats::default();

    for document in documents {
        let chunks = chunk_text(&document.id, &document.body, chunking);
        if chunks.is_empty() {
            continue;
        }
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = embedder.embed(&texts).await?;
        store.add(document, &chunks, &vectors).await?;

        stats.documents += 1;
        stats.chunks += chunks.len();
    }

    info!(
        documents = stats.documents,
        chunks = stats.chunks,
        "index built"
    );
    Ok(stats)
}
