// Copyright (c) 2026 Trellis Platform
// SPDX-License-Identifier: AGPL-3.0
//! JSON self-correction loop.
//!
//! Validates assistant-produced text as JSON against a schema, asking the
//! chat collaborator for a corrected answer on each validation failure,
//! bounded by a retry budget:
//!
//! ```text
//! PARSE -> VALIDATE -> SUCCESS
//!             |
//!             v
//!       RETRY_PROMPT -> PARSE (while budget remains)
//!             |
//!             v
//!          FAILURE
//! ```
//!
//! A parse failure is immediately fatal and spends no retry budget; only
//! validation failures trigger the corrective round trip. The attempt
//! counter increments exactly once per loop iteration, including the final
//! non-retried failure, so `max_retries = N` yields exactly `N + 1`
//! validation attempts before [`CorrectionError::Exhausted`].

use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::domain::chat::{ChatError, ChatProvider};

#[derive(Debug, thiserror::Error)]
pub enum CorrectionError {
    /// Raw or retried text was not JSON at all. Distinct from a schema
    /// validation failure; never retried.
    #[error("invalid JSON provided: {0}")]
    Parse(#[source] serde_json::Error),

    /// The supplied schema itself could not be compiled.
    #[error("invalid schema: {0}")]
    Schema(String),

    /// The chat collaborator failed while producing a corrected answer.
    #[error(transparent)]
    Chat(#[from] ChatError),

    /// Every allowed attempt produced well-formed but non-conforming JSON.
    #[error("JSON validation failed after {attempts} attempts")]
    Exhausted { attempts: u32 },
}

pub struct JsonCorrector {
    chat: Arc<dyn ChatProvider>,
    max_retries: u32,
}

impl JsonCorrector {
    pub fn new(chat: Arc<dyn ChatProvider>, max_retries: u32) -> Self {
        Self { chat, max_retries }
    }

    /// Parses `raw` and validates it against `schema`, correcting through
    /// the chat collaborator until the value conforms or the retry budget is
    /// spent.
    pub async fn validate_and_parse(
        &self,
        token: &str,
        chat_id: &str,
        raw: &str,
        schema: &Value,
    ) -> Result<Value, CorrectionError> {
        let validator = jsonschema::validator_for(schema)
            .map_err(|e| CorrectionError::Schema(e.to_string()))?;

        let mut candidate = parse_json(raw)?;
        let mut attempts: u32 = 0;

        loop {
            attempts += 1;
            let failure = match validator.validate(&candidate) {
                Ok(()) => None,
                Err(e) => Some(e.to_string()),
            };

            let Some(message) = failure else {
                info!(attempts, "JSON validation successful");
                return Ok(candidate);
            };
            warn!(attempt = attempts, error = %message, "JSON validation failed");

            if attempts > self.max_retries {
                error!(attempts, "retry budget exhausted, validation failed");
                return Err(CorrectionError::Exhausted { attempts });
            }

            let question = format!(
                "Retry the last step. JSON validation failed with error: {message}. \
                 Using this json schema: {schema}. Return only the DTO JSON."
            );
            let answer = self.chat.ask(token, chat_id, &question).await?;
            candidate = parse_json(&answer)?;
        }
    }
}

fn parse_json(raw: &str) -> Result<Value, CorrectionError> {
    serde_json::from_str(raw.trim()).map_err(CorrectionError::Parse)
}
