//! SQLite-backed [`VectorStore`] for the persisted index.
//!
//! The index lives in a single database file inside the persist directory.
//! Documents and chunks are stored alongside their vectors (little-endian
//! `f32` BLOBs); search loads every vector and ranks by cosine similarity
//! in Rust. An `index_meta` table records the embedding model and whether
//! the build ran to completion, so an interrupted build is never reused.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::Row;

use crate::embedding::{blob_to_vec, cosine_similarity, vec_to_blob};
use crate::error::Result;
use crate::models::{Chunk, Document, ScoredChunk};

use super::{check_vector_count, rank, VectorStore};

/// Database file name inside the persist directory.
pub const INDEX_FILE: &str = "index.sqlite";

const META_MODEL: &str = "embedding_model";
const META_COMPLETED_AT: &str = "completed_at";

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Path of the index database for a persist directory.
    pub fn index_file(dir: &Path) -> PathBuf {
        dir.join(INDEX_FILE)
    }

    /// Create a fresh, empty index in `dir`, replacing any existing one.
    pub async fn create(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)?;
        let file = Self::index_file(dir);
        for stale in [
            file.clone(),
            file.with_extension("sqlite-wal"),
            file.with_extension("sqlite-shm"),
        ] {
            if stale.exists() {
                std::fs::remove_file(&stale)?;
            }
        }

        let store = Self {
            pool: connect(&file, true).await?,
        };
        store.migrate().await?;
        Ok(store)
    }

    /// Open an existing index in `dir`.
    pub async fn open(dir: &Path) -> Result<Self> {
        let store = Self {
            pool: connect(&Self::index_file(dir), false).await?,
        };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                id TEXT PRIMARY KEY,
                source TEXT NOT NULL UNIQUE,
                path TEXT NOT NULL,
                title TEXT NOT NULL,
                content_type TEXT NOT NULL DEFAULT 'text/plain',
                modified_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS chunks (
                id TEXT PRIMARY KEY,
                document_id TEXT NOT NULL,
                chunk_index INTEGER NOT NULL,
                text TEXT NOT NULL,
                hash TEXT NOT NULL,
                embedding BLOB NOT NULL,
                UNIQUE(document_id, chunk_index),
                FOREIGN KEY (document_id) REFERENCES documents(id)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS index_meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Embedding model the index was built with, if recorded.
    pub async fn embedding_model(&self) -> Result<Option<String>> {
        self.meta(META_MODEL).await
    }

    pub async fn is_complete(&self) -> Result<bool> {
        Ok(self.meta(META_COMPLETED_AT).await?.is_some())
    }

    /// Record the embedding model and mark the build as finished.
    pub async fn mark_complete(&self, model: &str) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for (key, value) in [
            (META_MODEL, model.to_string()),
            (META_COMPLETED_AT, Utc::now().to_rfc3339()),
        ] {
            sqlx::query(
                "INSERT INTO index_meta (key, value) VALUES (?, ?)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            )
            .bind(key)
            .bind(value)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn meta(&self, key: &str) -> Result<Option<String>> {
        let value = sqlx::query_scalar("SELECT value FROM index_meta WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(value)
    }
}

async fn connect(file: &Path, create: bool) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::new()
        .filename(file)
        .create_if_missing(create)
        .journal_mode(SqliteJournalMode::Wal);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;

    Ok(pool)
}

#[async_trait]
impl VectorStore for SqliteStore {
    async fn add(
        &self,
        document: &Document,
        chunks: &[Chunk],
        vectors: &[Vec<f32>],
    ) -> Result<()> {
        check_vector_count(chunks, vectors)?;
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO documents (id, source, path, title, content_type, modified_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&document.id)
        .bind(&document.source)
        .bind(document.path.to_string_lossy().to_string())
        .bind(&document.title)
        .bind(&document.content_type)
        .bind(document.modified_at.timestamp())
        .execute(&mut *tx)
        .await?;

        for (chunk, vector) in chunks.iter().zip(vectors) {
            sqlx::query(
                r#"
                INSERT INTO chunks (id, document_id, chunk_index, text, hash, embedding)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&chunk.id)
            .bind(&chunk.document_id)
            .bind(chunk.chunk_index)
            .bind(&chunk.text)
            .bind(&chunk.hash)
            .bind(vec_to_blob(vector))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn search(&self, query_vec: &[f32], k: usize) -> Result<Vec<ScoredChunk>> {
        let rows = sqlx::query(
            r#"
            SELECT c.id, c.document_id, c.text, c.embedding, d.source
            FROM chunks c
            JOIN documents d ON d.id = c.document_id
            ORDER BY c.rowid
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut hits = Vec::with_capacity(rows.len());
        for row in &rows {
            let blob: Vec<u8> = row.try_get("embedding")?;
            hits.push(ScoredChunk {
                chunk_id: row.try_get("id")?,
                document_id: row.try_get("document_id")?,
                source: row.try_get("source")?,
                text: row.try_get("text")?,
                score: cosine_similarity(query_vec, &blob_to_vec(&blob)),
            });
        }

        Ok(rank(hits, k))
    }

    async fn len(&self) -> Result<usize> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chunks")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as usize)
    }
}
