//! The conversation loop.
//!
//! A [`Session`] owns the retrieval chain and the chat history. It answers
//! an optional initial question without prompting, then keeps prompting
//! for input until a sentinel (`quit`, `q`, `exit`) or end of input. Every
//! answered question is printed and appended to the history, which is
//! never trimmed; the [`HistoryPolicy`] only decides how much of it each
//! question is sent with.

use std::io::{BufRead, Write};

use crate::chain::RetrievalChain;
use crate::config::HistoryPolicy;
use crate::error::Result;
use crate::models::Turn;

/// Inputs that end the session.
pub const SENTINELS: [&str; 3] = ["quit", "q", "exit"];

/// Shown before every interactive question.
pub const PROMPT: &str = "How can I assist you?: ";

/// A source of questions.
pub trait Input {
    /// Show `prompt` and read one line without its line terminator.
    /// Returns `None` at end of input.
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>>;
}

/// Reads questions from a buffered reader, writing prompts to `prompt_out`.
pub struct LineInput<R, W> {
    reader: R,
    prompt_out: W,
}

impl<R: BufRead, W: Write> LineInput<R, W> {
    pub fn new(reader: R, prompt_out: W) -> Self {
        Self { reader, prompt_out }
    }
}

impl<R: BufRead, W: Write> Input for LineInput<R, W> {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        self.prompt_out.write_all(prompt.as_bytes())?;
        self.prompt_out.flush()?;

        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        if line.ends_with('\n') {
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
        }
        Ok(Some(line))
    }
}

/// Why the loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    Sentinel,
    EndOfInput,
}

pub fn is_sentinel(input: &str) -> bool {
    SENTINELS.contains(&input)
}

pub struct Session {
    chain: RetrievalChain,
    history: Vec<Turn>,
    policy: HistoryPolicy,
}

impl Session {
    pub fn new(chain: RetrievalChain, policy: HistoryPolicy) -> Self {
        Self {
            chain,
            history: Vec::new(),
            policy,
        }
    }

    /// Every turn so far, oldest first.
    pub fn history(&self) -> &[Turn] {
        &self.history
    }

    /// Answer one question, print the answer, and record the turn.
    pub async fn turn(&mut self, question: String, out: &mut dyn Write) -> Result<()> {
        let context = self.policy.select(&self.history);
        let answer = self.chain.ask(&question, context).await?;
        writeln!(out, "{}", answer.text)?;
        out.flush()?;
        self.history.push(Turn {
            question,
            answer: answer.text,
        });
        Ok(())
    }

    /// Run the loop until a sentinel or end of input.
    ///
    /// `initial` is used as the first question without prompting; an empty
    /// string counts as absent.
    pub async fn run(
        &mut self,
        initial: Option<String>,
        input: &mut dyn Input,
        out: &mut dyn Write,
    ) -> Result<Exit> {
        let mut pending = initial.filter(|q| !q.is_empty());

        loop {
            let question = match pending.take() {
                Some(q) => q,
                None => match input.read_line(PROMPT)? {
                    Some(line) => line,
                    None => return Ok(Exit::EndOfInput),
                },
            };

            if is_sentinel(&question) {
                return Ok(Exit::Sentinel);
            }

            self.turn(question, out).await?;
        }
    }
}
