//! # askdocs
//!
//! Conversational question answering over a local folder of documents.
//!
//! askdocs loads every document in a directory, splits it into chunks,
//! embeds the chunks, and answers questions by retrieving the nearest
//! chunk(s) and handing them, with the conversation so far, to a hosted
//! chat model.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌─────────────┐   ┌──────────────┐
//! │  data/   │──▶│ Load+Chunk  │──▶│ VectorStore  │
//! │ txt/pdf… │   │   +Embed    │   │ memory/SQLite│
//! └──────────┘   └─────────────┘   └──────┬───────┘
//!                                         │ top-k
//!                ┌─────────────┐   ┌──────▼───────┐
//!   stdin ──────▶│   Session   │──▶│RetrievalChain│──▶ chat model
//!   stdout ◀─────│  (history)  │◀──│              │
//!                └─────────────┘   └──────────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration and API key resolution |
//! | [`error`] | Error type |
//! | [`models`] | Core data types |
//! | [`loader`] | Document directory loader |
//! | [`extract`] | PDF/DOCX/PPTX text extraction |
//! | [`chunk`] | Recursive character text splitting |
//! | [`embedding`] | Embedder trait, OpenAI embeddings, vector helpers |
//! | [`store`] | Vector store trait with in-memory and SQLite backends |
//! | [`index`] | Index acquisition strategy (rebuild / reuse / persist) |
//! | [`chat`] | Chat model trait and OpenAI chat completions |
//! | [`openai`] | Shared HTTP client for OpenAI-compatible APIs |
//! | [`chain`] | Conversational retrieval chain |
//! | [`session`] | Conversation loop |

pub mod chain;
pub mod chat;
pub mod chunk;
pub mod config;
pub mod embedding;
pub mod error;
pub mod extract;
pub mod index;
pub mod loader;
pub mod models;
pub mod openai;
pub mod session;
pub mod store;

pub use error::{Error, Result};
