// Copyright (c) 2026 Trellis Platform
// SPDX-License-Identifier: AGPL-3.0
//! Entity service facade.
//!
//! Simplified get/add/update/delete surface over whichever backend is
//! injected at startup. Read paths are lenient: an error-shaped payload
//! (`{"errorMessage": ...}`) is normalized to an empty result and logged.
//! Write paths are strict: backend errors propagate to the caller. The one
//! strict read, [`get_single_item_by_condition`](EntityService::get_single_item_by_condition),
//! surfaces error-shaped payloads as [`ServiceError::ErrorPayload`] so
//! callers can tell a remote rejection apart from "no match".

use serde_json::Value;
use std::any::Any;
use std::sync::Arc;
use tracing::warn;

use crate::domain::codec::WireCodec;
use crate::domain::entity::error_message;
use crate::domain::repository::{EntityRepository, RepositoryError};

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// The backend answered with a domain-level failure body even though the
    /// transport succeeded.
    #[error("remote reported a domain failure: {0}")]
    ErrorPayload(String),
}

/// Facade over one backend instance, chosen once at startup and injected
/// explicitly. Construct it in composition code and share it behind `Arc`;
/// there is no hidden singleton to race against.
pub struct EntityService {
    repository: Arc<dyn EntityRepository>,
    codec: WireCodec,
}

impl EntityService {
    pub fn new(repository: Arc<dyn EntityRepository>) -> Self {
        Self {
            repository,
            codec: WireCodec::new(),
        }
    }

    pub fn with_codec(repository: Arc<dyn EntityRepository>, codec: WireCodec) -> Self {
        Self { repository, codec }
    }

    /// Encoder table for caller types; register domain structs here during
    /// startup so `add_item`/`update_item` can accept them.
    pub fn codec_mut(&mut self) -> &mut WireCodec {
        &mut self.codec
    }

    pub async fn get_item(
        &self,
        token: &str,
        entity_model: &str,
        entity_version: &str,
        technical_id: &str,
    ) -> Result<Option<Value>, ServiceError> {
        let meta = self.repository.meta(token, entity_model, entity_version).await;
        let item = self.repository.find_by_id(&meta, technical_id).await?;
        Ok(item.and_then(|value| match error_message(&value) {
            Some(message) => {
                warn!(technical_id, message, "read returned an error payload");
                None
            }
            None => Some(value),
        }))
    }

    pub async fn get_items(
        &self,
        token: &str,
        entity_model: &str,
        entity_version: &str,
    ) -> Result<Vec<Value>, ServiceError> {
        let meta = self.repository.meta(token, entity_model, entity_version).await;
        let items = self.repository.find_all(&meta).await?;
        Ok(self.normalize_items(items))
    }

    /// First entity matching the condition. Unlike the other reads this path
    /// is strict about error-shaped payloads.
    pub async fn get_single_item_by_condition(
        &self,
        token: &str,
        entity_model: &str,
        entity_version: &str,
        condition: &Value,
    ) -> Result<Option<Value>, ServiceError> {
        let items = self
            .find_by_criteria(token, entity_model, entity_version, condition)
            .await?;
        if let Some(message) = items.first().and_then(error_message) {
            return Err(ServiceError::ErrorPayload(message.to_string()));
        }
        Ok(items.into_iter().next())
    }

    pub async fn get_items_by_condition(
        &self,
        token: &str,
        entity_model: &str,
        entity_version: &str,
        condition: &Value,
    ) -> Result<Vec<Value>, ServiceError> {
        let items = self
            .find_by_criteria(token, entity_model, entity_version, condition)
            .await?;
        Ok(self.normalize_items(items))
    }

    /// Persists one entity; backend failures propagate.
    pub async fn add_item<T: Any>(
        &self,
        token: &str,
        entity_model: &str,
        entity_version: &str,
        entity: &T,
    ) -> Result<String, ServiceError> {
        let tree = self.codec.encode(entity)?;
        let meta = self.repository.meta(token, entity_model, entity_version).await;
        Ok(self.repository.save(&meta, &tree).await?)
    }

    /// Persists a batch; returns only the first generated id (see
    /// [`EntityRepository::save_all`]).
    pub async fn add_items<T: Any>(
        &self,
        token: &str,
        entity_model: &str,
        entity_version: &str,
        entities: &[T],
    ) -> Result<String, ServiceError> {
        let trees = entities
            .iter()
            .map(|entity| self.codec.encode(entity))
            .collect::<Result<Vec<_>, _>>()?;
        let meta = self.repository.meta(token, entity_model, entity_version).await;
        Ok(self.repository.save_all(&meta, &trees).await?)
    }

    /// Updates an entity, optionally overriding the transition baked into
    /// the backend meta. `entity = None` launches a bare transition.
    pub async fn update_item<T: Any>(
        &self,
        token: &str,
        entity_model: &str,
        entity_version: &str,
        technical_id: &str,
        entity: Option<&T>,
        transition: Option<&str>,
    ) -> Result<Value, ServiceError> {
        let mut meta = self.repository.meta(token, entity_model, entity_version).await;
        meta.technical_id = Some(technical_id.to_string());
        if let Some(transition) = transition {
            meta.update_transition = Some(transition.to_string());
        }
        let tree = entity
            .map(|entity| self.codec.encode(entity))
            .transpose()?;
        Ok(self
            .repository
            .update(&meta, technical_id, tree.as_ref())
            .await?)
    }

    /// Deletes an entity; strict, so an unsupported backend surfaces as an
    /// error instead of a silent no-op.
    pub async fn delete_item(
        &self,
        token: &str,
        entity_model: &str,
        entity_version: &str,
        technical_id: &str,
    ) -> Result<(), ServiceError> {
        let meta = self.repository.meta(token, entity_model, entity_version).await;
        Ok(self.repository.delete_by_id(&meta, technical_id).await?)
    }

    async fn find_by_criteria(
        &self,
        token: &str,
        entity_model: &str,
        entity_version: &str,
        condition: &Value,
    ) -> Result<Vec<Value>, ServiceError> {
        let meta = self.repository.meta(token, entity_model, entity_version).await;
        Ok(self
            .repository
            .find_all_by_criteria(&meta, condition)
            .await?)
    }

    fn normalize_items(&self, items: Vec<Value>) -> Vec<Value> {
        if let Some(message) = items.first().and_then(error_message) {
            warn!(message, "read returned an error payload, degrading to empty");
            return Vec::new();
        }
        items
    }
}
