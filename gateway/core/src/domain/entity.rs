// Copyright (c) 2026 Trellis Platform
// SPDX-License-Identifier: AGPL-3.0
//! Wire-tree helpers.
//!
//! Entities are arbitrary JSON trees (`serde_json::Value`), so "any shape"
//! stays representable while the boundary remains type-safe. The helpers
//! here cover the two conventions every backend shares: the remote-assigned
//! `technicalId` key and the `errorMessage` failure signal.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Key under which the remote-assigned primary key is injected into an
/// entity tree after persistence. Once assigned it is never regenerated
/// locally.
pub const TECHNICAL_ID_KEY: &str = "technicalId";

/// Key whose presence in a response body marks a domain-level failure even
/// when the transport succeeded.
pub const ERROR_MESSAGE_KEY: &str = "errorMessage";

/// Injects `technicalId` into an object tree. Non-object trees are returned
/// untouched; only objects can carry the key.
pub fn attach_technical_id(mut tree: Value, technical_id: &str) -> Value {
    if let Some(map) = tree.as_object_mut() {
        map.insert(
            TECHNICAL_ID_KEY.to_string(),
            Value::String(technical_id.to_string()),
        );
    }
    tree
}

/// Returns the `errorMessage` text when `value` is an error-shaped payload.
pub fn error_message(value: &Value) -> Option<&str> {
    value.get(ERROR_MESSAGE_KEY).and_then(Value::as_str)
}

/// Single-field equality check used by the in-memory criteria scan.
pub fn field_equals(entity: &Value, key: &str, expected: &Value) -> bool {
    entity.get(key) == Some(expected)
}

/// Caller-configurable result-page coordinates for snapshot fetches.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PageRequest {
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default = "default_page_number")]
    pub page_number: u32,
}

fn default_page_size() -> u32 {
    100
}

fn default_page_number() -> u32 {
    1
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            page_number: default_page_number(),
        }
    }
}
