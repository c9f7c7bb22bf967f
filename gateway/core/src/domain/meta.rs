// Copyright (c) 2026 Trellis Platform
// SPDX-License-Identifier: AGPL-3.0
//! Per-call metadata consumed by every repository operation.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Ephemeral per-call context: bearer token, entity model coordinates, and
/// the optional update transition and search condition.
///
/// A `CallMeta` is rebuilt for every invocation by the backend's
/// [`meta`](crate::domain::repository::EntityRepository::meta) operation and
/// is never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallMeta {
    /// Bearer token attached to every remote call. Acquired by an external
    /// collaborator; the gateway never refreshes or caches it.
    pub token: String,

    /// Entity model name, e.g. `"order"`.
    pub entity_model: String,

    /// Entity model version, e.g. `"1000"`.
    pub entity_version: String,

    /// Remote-assigned primary key, present only on update/transition paths.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub technical_id: Option<String>,

    /// Named edge in the remote entity's state machine. Updates must name
    /// one to take effect.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_transition: Option<String>,

    /// Opaque search predicate used by key-based lookups.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<Value>,
}

impl CallMeta {
    pub fn new(
        token: impl Into<String>,
        entity_model: impl Into<String>,
        entity_version: impl Into<String>,
    ) -> Self {
        Self {
            token: token.into(),
            entity_model: entity_model.into(),
            entity_version: entity_version.into(),
            technical_id: None,
            update_transition: None,
            condition: None,
        }
    }

    pub fn with_transition(mut self, transition: impl Into<String>) -> Self {
        self.update_transition = Some(transition.into());
        self
    }

    pub fn with_technical_id(mut self, technical_id: impl Into<String>) -> Self {
        self.technical_id = Some(technical_id.into());
        self
    }

    pub fn with_condition(mut self, condition: Value) -> Self {
        self.condition = Some(condition);
        self
    }
}
