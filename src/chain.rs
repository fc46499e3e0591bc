//! Conversational retrieval chain.
//!
//! Binds a vector store's top-k retriever to a chat model. For each
//! question:
//!
//! 1. With prior turns and condensing enabled, the chat model rewrites the
//!    follow-up into a standalone question using the history.
//! 2. The (standalone) question is embedded and the `k` nearest chunks are
//!    retrieved.
//! 3. The chunks go into a system message, followed by the question (and,
//!    without condensing, the history as alternating messages); the chat
//!    model's reply is the answer.

use std::sync::Arc;

use tracing::debug;

use crate::chat::{ChatMessage, ChatModel};
use crate::config::{ChatConfig, RetrievalConfig};
use crate::embedding::{embed_query, Embedder};
use crate::error::Result;
use crate::models::{ScoredChunk, Turn};
use crate::store::VectorStore;

const CONDENSE_PROMPT: &str = "Given the following conversation and a follow up question, \
rephrase the follow up question to be a standalone question, in its original language.";

const ANSWER_PROMPT: &str = "Use the following pieces of context to answer the user's question. \
If you don't know the answer, just say that you don't know, don't try to make up an answer.";

/// An answer plus the chunks it was grounded on.
#[derive(Debug, Clone)]
pub struct Answer {
    pub text: String,
    pub sources: Vec<ScoredChunk>,
}

pub struct RetrievalChain {
    store: Box<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    chat: Box<dyn ChatModel>,
    k: usize,
    condense_question: bool,
}

impl RetrievalChain {
    pub fn new(
        store: Box<dyn VectorStore>,
        embedder: Arc<dyn Embedder>,
        chat: Box<dyn ChatModel>,
        retrieval: &RetrievalConfig,
        chat_config: &ChatConfig,
    ) -> Self {
        Self {
            store,
            embedder,
            chat,
            k: retrieval.k.max(1),
            condense_question: chat_config.condense_question,
        }
    }

    /// Answer `question` given the prior turns, oldest first.
    pub async fn ask(&self, question: &str, history: &[Turn]) -> Result<Answer> {
        let condense = self.condense_question && !history.is_empty();

        let question = if condense {
            let standalone = self
                .chat
                .complete(&[ChatMessage::user(condense_prompt(question, history))])
                .await?;
            debug!(standalone = %standalone, "condensed question");
            standalone
        } else {
            question.to_string()
        };

        let query_vec = embed_query(self.embedder.as_ref(), &question).await?;
        let sources = self.store.search(&query_vec, self.k).await?;
        for hit in &sources {
            debug!(source = %hit.source, score = hit.score, "retrieved chunk");
        }

        let prior: &[Turn] = if condense { &[] } else { history };
        let messages = answer_messages(&question, &sources, prior);
        let text = self.chat.complete(&messages).await?;

        Ok(Answer { text, sources })
    }
}

fn condense_prompt(question: &str, history: &[Turn]) -> String {
    let mut transcript = String::new();
    for turn in history {
        transcript.push_str("\nHuman: ");
        transcript.push_str(&turn.question);
        transcript.push_str("\nAssistant: ");
        transcript.push_str(&turn.answer);
    }
    format!(
        "{}\n\nChat History:\n{}\nFollow Up Input: {}\nStandalone question:",
        CONDENSE_PROMPT, transcript, question
    )
}

fn answer_messages(question: &str, sources: &[ScoredChunk], history: &[Turn]) -> Vec<ChatMessage> {
    let context = sources
        .iter()
        .map(|s| s.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");

    let mut messages = Vec::with_capacity(history.len() * 2 + 2);
    messages.push(ChatMessage::system(format!(
        "{}\n----------------\n{}",
        ANSWER_PROMPT, context
    )));
    for turn in history {
        messages.push(ChatMessage::user(turn.question.clone()));
        messages.push(ChatMessage::assistant(turn.answer.clone()));
    }
    messages.push(ChatMessage::user(question));
    messages
}
