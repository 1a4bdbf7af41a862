//! Answer synthesis from retrieved passages and conversation history.
//!
//! The synthesizer composes a prompt that tags each passage `[S1]`, `[S2]`,
//! ... and instructs the model to close with a `Sources:` line naming the
//! tags it used. Tags are parsed back out of the response and mapped to
//! citations; a tag that does not name a passage retrieved for this call is
//! dropped, so citations are never fabricated.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::document::{Answer, Citation, RetrievalResult, Role, Turn};
use crate::error::Result;
use crate::llm::{GenerateOptions, LanguageModel};
use crate::retry::{with_backoff, with_timeout};
use crate::session::SessionStore;

/// Composes prompts, invokes the language model, and attributes citations.
///
/// A session-bound call moves `retrieve → synthesize → append`: any failure
/// before the append leaves the session history unchanged, and the
/// question/answer pair is appended as one unit.
pub struct AnswerSynthesizer {
    model: Arc<dyn LanguageModel>,
    sessions: Arc<SessionStore>,
    max_history_turns: usize,
    similarity_threshold: f32,
    max_output_tokens: u32,
    timeout: Duration,
    max_retries: u32,
}

impl AnswerSynthesizer {
    /// Create a synthesizer over the given model and session store.
    pub fn new(
        model: Arc<dyn LanguageModel>,
        sessions: Arc<SessionStore>,
        config: &EngineConfig,
    ) -> Self {
        Self {
            model,
            sessions,
            max_history_turns: config.max_history_turns,
            similarity_threshold: config.similarity_threshold,
            max_output_tokens: config.max_output_tokens,
            timeout: config.request_timeout,
            max_retries: config.max_retries,
        }
    }

    /// Identifier of the underlying model.
    pub fn model_id(&self) -> &str {
        self.model.model_id()
    }

    /// Synthesize an answer from the retrieved passages.
    ///
    /// Passages below the similarity threshold are discarded; when none
    /// remain the answer is produced without context and flagged
    /// `context_found = false` with no citations, a recoverable state
    /// rather than an error. With a `session_id`, the question and answer are
    /// appended to the session after (and only after) generation succeeds.
    ///
    /// # Errors
    ///
    /// - [`FixragError::SessionNotFound`](crate::FixragError::SessionNotFound)
    ///   for an unknown session identifier, surfaced before any model call.
    /// - [`FixragError::GenerationFailed`](crate::FixragError::GenerationFailed)
    ///   when the model call errors after bounded retries.
    /// - [`FixragError::Timeout`](crate::FixragError::Timeout) when the
    ///   configured timeout expires.
    pub async fn answer(
        &self,
        question: &str,
        session_id: Option<&str>,
        passages: Vec<RetrievalResult>,
    ) -> Result<Answer> {
        let started = Instant::now();

        let passages: Vec<RetrievalResult> = passages
            .into_iter()
            .filter(|p| p.score >= self.similarity_threshold)
            .collect();
        let context_found = !passages.is_empty();
        if !context_found {
            debug!(question, "no passage cleared the similarity threshold");
        }

        // Fails on an unknown session before any model call, leaving
        // nothing to roll back.
        let history = match session_id {
            Some(id) => self.sessions.get_history(id, Some(self.max_history_turns)).await?,
            None => Vec::new(),
        };

        let prompt = build_prompt(question, &passages, &history);
        debug!(
            prompt_len = prompt.len(),
            passage_count = passages.len(),
            history_turns = history.len(),
            "composed prompt"
        );

        let options = GenerateOptions {
            max_tokens: Some(self.max_output_tokens),
            stop: Vec::new(),
            temperature: None,
        };
        let raw = with_timeout(
            self.timeout,
            "generation",
            with_backoff("generation", self.max_retries, || self.model.generate(&prompt, &options)),
        )
        .await?;

        let (text, tags) = parse_response(&raw);
        let citations = attribute_citations(&tags, &passages);

        let answer = Answer {
            text,
            citations,
            model_id: self.model.model_id().to_string(),
            context_found,
            latency: started.elapsed(),
        };

        if let Some(id) = session_id {
            self.sessions.append_exchange(id, question, &answer.text).await?;
        }

        info!(
            context_found,
            citation_count = answer.citations.len(),
            latency_ms = answer.latency.as_millis() as u64,
            "synthesized answer"
        );
        Ok(answer)
    }
}

/// Compose the prompt from tagged passages and bounded history.
fn build_prompt(question: &str, passages: &[RetrievalResult], history: &[Turn]) -> String {
    let mut prompt = String::new();
    prompt.push_str(
        "You are a repair assistant. Answer the question using only the numbered source passages below.\n",
    );

    if passages.is_empty() {
        prompt.push_str(
            "No relevant passages were found. Say so, then give your best general guidance.\n\n",
        );
    } else {
        prompt.push_str(
            "Finish with a line starting with \"Sources:\" listing the tags of the passages you used, for example \"Sources: [S1] [S3]\".\n\nPassages:\n",
        );
        for (i, passage) in passages.iter().enumerate() {
            prompt.push_str(&format!(
                "[S{}] (from {})\n{}\n\n",
                i + 1,
                passage.chunk.document_id,
                passage.chunk.text
            ));
        }
    }

    if !history.is_empty() {
        prompt.push_str("Conversation so far:\n");
        for turn in history {
            let role = match turn.role {
                Role::User => "user",
                Role::Assistant => "assistant",
            };
            prompt.push_str(&format!("{role}: {}\n", turn.text));
        }
        prompt.push('\n');
    }

    prompt.push_str(&format!("Question: {question}\nAnswer:"));
    prompt
}

/// Extract `[Sn]` tags from the response and strip the `Sources:` line
/// from the visible answer text.
fn parse_response(raw: &str) -> (String, Vec<usize>) {
    let mut tags = Vec::new();
    let mut rest = raw;
    while let Some(pos) = rest.find("[S") {
        let after = &rest[pos + 2..];
        let digits: &str = &after[..after
            .char_indices()
            .find(|(_, c)| !c.is_ascii_digit())
            .map_or(after.len(), |(i, _)| i)];
        if !digits.is_empty() && after[digits.len()..].starts_with(']') {
            if let Ok(n) = digits.parse::<usize>() {
                if !tags.contains(&n) {
                    tags.push(n);
                }
            }
            rest = &after[digits.len() + 1..];
        } else {
            rest = after;
        }
    }

    let text = raw
        .lines()
        .filter(|line| !line.trim_start().starts_with("Sources:"))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string();

    (text, tags)
}

/// Map 1-based passage tags to citations, dropping unknown tags.
fn attribute_citations(tags: &[usize], passages: &[RetrievalResult]) -> Vec<Citation> {
    let mut dropped = 0usize;
    let citations: Vec<Citation> = tags
        .iter()
        .filter_map(|&tag| {
            let passage = tag.checked_sub(1).and_then(|i| passages.get(i));
            if passage.is_none() {
                dropped += 1;
            }
            passage
        })
        .map(|p| Citation {
            chunk_id: p.chunk.id.clone(),
            document_id: p.chunk.document_id.clone(),
            source_uri: p.chunk.metadata.get("source_uri").cloned(),
        })
        .collect();
    if dropped > 0 {
        warn!(dropped, "model cited unknown passage tags");
    }
    citations
}
