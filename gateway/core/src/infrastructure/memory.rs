// Copyright (c) 2026 Trellis Platform
// SPDX-License-Identifier: AGPL-3.0
//! In-memory backend.
//!
//! A mutex-guarded keyed map satisfying the same contract as the remote
//! gateway, intended for tests and single-writer development use. Criteria
//! search is a linear scan over one `{key, value}` equality pair, not a
//! general predicate engine.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::domain::entity::{attach_technical_id, field_equals};
use crate::domain::meta::CallMeta;
use crate::domain::repository::{EntityRepository, RepositoryError};

#[derive(Clone, Default)]
pub struct InMemoryEntityStore {
    items: Arc<Mutex<HashMap<String, Value>>>,
}

impl InMemoryEntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Value>>, RepositoryError> {
        self.items
            .lock()
            .map_err(|_| RepositoryError::Protocol("store mutex poisoned".into()))
    }

    fn criteria_parts(condition: &Value) -> Result<(&str, &Value), RepositoryError> {
        let key = condition.get("key").and_then(Value::as_str);
        let value = condition.get("value");
        match (key, value) {
            (Some(key), Some(value)) => Ok((key, value)),
            _ => Err(RepositoryError::Protocol(
                "in-memory criteria requires a {key, value} pair".into(),
            )),
        }
    }
}

#[async_trait]
impl EntityRepository for InMemoryEntityStore {
    async fn meta(&self, token: &str, entity_model: &str, entity_version: &str) -> CallMeta {
        CallMeta::new(token, entity_model, entity_version)
    }

    async fn find_by_id(
        &self,
        _meta: &CallMeta,
        technical_id: &str,
    ) -> Result<Option<Value>, RepositoryError> {
        let items = self.lock()?;
        Ok(items
            .get(technical_id)
            .cloned()
            .map(|tree| attach_technical_id(tree, technical_id)))
    }

    async fn find_by_key(
        &self,
        meta: &CallMeta,
        _key: &str,
    ) -> Result<Option<Value>, RepositoryError> {
        let condition = meta.condition.clone().ok_or_else(|| {
            RepositoryError::Protocol("find_by_key requires meta.condition".into())
        })?;
        let mut hits = self.find_all_by_criteria(meta, &condition).await?;
        if hits.is_empty() {
            Ok(None)
        } else {
            Ok(Some(hits.remove(0)))
        }
    }

    async fn find_all(&self, _meta: &CallMeta) -> Result<Vec<Value>, RepositoryError> {
        let items = self.lock()?;
        Ok(items
            .iter()
            .map(|(id, tree)| attach_technical_id(tree.clone(), id))
            .collect())
    }

    async fn find_all_by_criteria(
        &self,
        _meta: &CallMeta,
        condition: &Value,
    ) -> Result<Vec<Value>, RepositoryError> {
        let (key, expected) = Self::criteria_parts(condition)?;
        let items = self.lock()?;
        Ok(items
            .iter()
            .filter(|(_, tree)| field_equals(tree, key, expected))
            .map(|(id, tree)| attach_technical_id(tree.clone(), id))
            .collect())
    }

    async fn save(&self, _meta: &CallMeta, entity: &Value) -> Result<String, RepositoryError> {
        let technical_id = Uuid::new_v4().to_string();
        let mut items = self.lock()?;
        items.insert(technical_id.clone(), entity.clone());
        Ok(technical_id)
    }

    /// Stores every entity; returns only the first generated id, matching
    /// the contract's batch-save shape.
    async fn save_all(
        &self,
        meta: &CallMeta,
        entities: &[Value],
    ) -> Result<String, RepositoryError> {
        let mut first_id = None;
        for entity in entities {
            let id = self.save(meta, entity).await?;
            first_id.get_or_insert(id);
        }
        first_id.ok_or_else(|| {
            RepositoryError::Protocol("save_all requires at least one entity".into())
        })
    }

    async fn update(
        &self,
        meta: &CallMeta,
        technical_id: &str,
        entity: Option<&Value>,
    ) -> Result<Value, RepositoryError> {
        if meta.update_transition.is_none() && entity.is_none() {
            return Err(RepositoryError::MissingTransition);
        }
        let payload = entity.ok_or(RepositoryError::Unsupported(
            "bare transitions are not supported by the in-memory store",
        ))?;
        let mut items = self.lock()?;
        items.insert(technical_id.to_string(), payload.clone());
        Ok(Value::String(technical_id.to_string()))
    }

    async fn delete_by_id(
        &self,
        _meta: &CallMeta,
        technical_id: &str,
    ) -> Result<(), RepositoryError> {
        let mut items = self.lock()?;
        items.remove(technical_id);
        Ok(())
    }

    async fn delete_all(&self, _meta: &CallMeta) -> Result<(), RepositoryError> {
        let mut items = self.lock()?;
        items.clear();
        Ok(())
    }

    async fn exists_by_key(&self, meta: &CallMeta, key: &str) -> Result<bool, RepositoryError> {
        Ok(self.find_by_key(meta, key).await?.is_some())
    }
}
