// Copyright (c) 2026 Trellis Platform
// SPDX-License-Identifier: AGPL-3.0
//! Chat collaborator port.
//!
//! Anti-corruption interface over the AI chat transport. The correction loop
//! only needs question-in, answer-out; everything else about the transport
//! stays behind this trait.

use async_trait::async_trait;

/// Upper bound on a single question, matching the remote service's limit.
pub const MAX_QUESTION_BYTES: usize = 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("network error: {0}")]
    Network(String),

    #[error("chat endpoint rejected request (HTTP {status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("chat answer is missing the message field")]
    MalformedAnswer,

    #[error("question exceeds the {MAX_QUESTION_BYTES} byte limit")]
    QuestionTooLarge,
}

/// Obtains a fresh answer from the chat collaborator.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    async fn ask(&self, token: &str, chat_id: &str, question: &str) -> Result<String, ChatError>;
}
