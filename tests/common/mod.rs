//! Deterministic stand-ins for the hosted services, shared by the
//! integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use askdocs::chat::{ChatMessage, ChatModel, Role};
use askdocs::embedding::Embedder;
use askdocs::session::Input;
use askdocs::Result;

const DIMS: usize = 64;

/// Bag-of-words embedder: each lowercase word bumps one hashed dimension.
#[derive(Clone)]
pub struct FakeEmbedder {
    model: String,
    texts: Arc<AtomicUsize>,
}

impl FakeEmbedder {
    pub fn new(model: &str) -> Self {
        Self {
            model: model.to_string(),
            texts: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Total number of texts embedded so far.
    pub fn texts_embedded(&self) -> usize {
        self.texts.load(Ordering::SeqCst)
    }
}

fn word_slot(word: &str) -> usize {
    let mut h: u64 = 0xcbf29ce484222325;
    for b in word.bytes() {
        h ^= b as u64;
        h = h.wrapping_mul(0x100000001b3);
    }
    (h % DIMS as u64) as usize
}

pub fn bag_of_words(text: &str) -> Vec<f32> {
    let mut v = vec![0.0f32; DIMS];
    for word in text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        v[word_slot(&word.to_lowercase())] += 1.0;
    }
    v
}

#[async_trait]
impl Embedder for FakeEmbedder {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.texts.fetch_add(texts.len(), Ordering::SeqCst);
        Ok(texts.iter().map(|t| bag_of_words(t)).collect())
    }
}

/// Chat model that records every request.
///
/// Condense requests are answered with the follow-up question unchanged;
/// answer requests with `"<question> => <context>"`.
#[derive(Clone, Default)]
pub struct FakeChat {
    requests: Arc<Mutex<Vec<Vec<ChatMessage>>>>,
}

impl FakeChat {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requests(&self) -> Vec<Vec<ChatMessage>> {
        self.requests.lock().unwrap().clone()
    }

    /// Requests that produced an answer, skipping condense requests.
    pub fn answer_requests(&self) -> Vec<Vec<ChatMessage>> {
        self.requests()
            .into_iter()
            .filter(|r| r.first().map(|m| m.role) == Some(Role::System))
            .collect()
    }
}

#[async_trait]
impl ChatModel for FakeChat {
    fn model_name(&self) -> &str {
        "fake-chat"
    }

    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        self.requests.lock().unwrap().push(messages.to_vec());

        let last = messages.last().map(|m| m.content.as_str()).unwrap_or("");
        if let Some(rest) = last.split("Follow Up Input: ").nth(1) {
            let question = rest.trim_end_matches("\nStandalone question:");
            return Ok(question.to_string());
        }

        let context = messages
            .first()
            .and_then(|m| m.content.split("----------------\n").nth(1))
            .unwrap_or("");
        Ok(format!("{} => {}", last, context))
    }
}

/// Feeds canned lines and counts how often it was prompted.
pub struct ScriptedInput {
    lines: VecDeque<String>,
    pub prompts: usize,
}

impl ScriptedInput {
    pub fn new(lines: &[&str]) -> Self {
        Self {
            lines: lines.iter().map(|l| l.to_string()).collect(),
            prompts: 0,
        }
    }
}

impl Input for ScriptedInput {
    fn read_line(&mut self, _prompt: &str) -> Result<Option<String>> {
        self.prompts += 1;
        Ok(self.lines.pop_front())
    }
}

/// Write a small document corpus into `dir`.
pub fn write_corpus(dir: &Path) {
    std::fs::create_dir_all(dir).unwrap();
    std::fs::write(
        dir.join("rust.md"),
        "Cargo is the Rust package manager. Crates are published to crates.io.",
    )
    .unwrap();
    std::fs::write(
        dir.join("python.txt"),
        "Pip installs Python packages from PyPI. Virtualenv isolates them.",
    )
    .unwrap();
    std::fs::write(
        dir.join("deploy.md"),
        "Kubernetes schedules Docker containers across the cluster nodes.",
    )
    .unwrap();
}
