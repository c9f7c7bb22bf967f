// Copyright (c) 2026 Trellis Platform
// SPDX-License-Identifier: AGPL-3.0
//! HTTP chat adapter.
//!
//! Implements the [`ChatProvider`] port against the assistant service's chat
//! endpoint. Question text over the service's 1 MiB limit is rejected before
//! any transport happens.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::domain::chat::{ChatError, ChatProvider, MAX_QUESTION_BYTES};

pub struct HttpChatProvider {
    client: Client,
    base_url: String,
    /// API segment in front of `/chat`, e.g. `api/v1/workflows`.
    endpoint: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    chat_id: &'a str,
    question: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: Option<String>,
}

impl HttpChatProvider {
    pub fn new(base_url: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl ChatProvider for HttpChatProvider {
    async fn ask(&self, token: &str, chat_id: &str, question: &str) -> Result<String, ChatError> {
        if question.len() > MAX_QUESTION_BYTES {
            return Err(ChatError::QuestionTooLarge);
        }

        let url = format!("{}/{}/chat", self.base_url, self.endpoint);
        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .json(&ChatRequest { chat_id, question })
            .send()
            .await
            .map_err(|e| ChatError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ChatError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|_| ChatError::MalformedAnswer)?;
        body.message.ok_or(ChatError::MalformedAnswer)
    }
}
