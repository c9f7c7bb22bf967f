// Copyright (c) 2026 Trellis Platform
// SPDX-License-Identifier: AGPL-3.0
//! # Entity Repository Contract
//!
//! Polymorphic CRUD contract satisfied by both backends, following the
//! Repository pattern: interface in the domain layer, implementations in
//! `crate::infrastructure`.
//!
//! | Trait | Implementations |
//! |-------|-----------------|
//! | `EntityRepository` | `RemoteEntityGateway`, `InMemoryEntityStore` |
//!
//! Callers depend only on this trait, never on a concrete backend, so tests
//! can substitute the in-memory store transparently. Absence on read paths
//! is `Ok(None)` / `Ok(vec![])`, never an error.

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

use crate::domain::meta::CallMeta;

/// Failure taxonomy for repository operations.
///
/// `NotFound` is deliberately absent: empty read results are expressed in the
/// success type.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// Poll budget elapsed while the snapshot status remained `RUNNING`.
    #[error("snapshot search still RUNNING after {elapsed:?}")]
    SearchTimeout { elapsed: Duration },

    /// Snapshot reached a terminal status other than `SUCCESSFUL`.
    #[error("snapshot search ended in terminal status {status:?}")]
    SearchFailed { status: String },

    /// Network or HTTP-level failure on any call.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Remote returned a non-2xx status.
    #[error("remote rejected request (HTTP {status}): {body}")]
    Remote { status: u16, body: String },

    /// Response violated the wire protocol (missing snapshot id, malformed
    /// page, absent `entityIds`, ...). Never retried.
    #[error("protocol violation: {0}")]
    Protocol(String),

    /// Entity contains a value the wire-format mapping cannot encode, or the
    /// caller's type has no registered encoder.
    #[error("serialization failure: {0}")]
    Serialization(String),

    /// `update` was invoked with neither a payload entity nor a transition.
    #[error("update requires an entity payload or an update transition")]
    MissingTransition,

    /// Operation present for contract completeness but not implemented by
    /// this backend. Never pretends the operation succeeded.
    #[error("operation not supported by this backend: {0}")]
    Unsupported(&'static str),

    /// Snapshot poll aborted through the cancellation token.
    #[error("snapshot search cancelled")]
    Cancelled,
}

/// CRUD contract over a keyed document store.
///
/// All operations are asynchronous and take a [`CallMeta`] built by
/// [`meta`](Self::meta). Implementations hold no caller-visible mutable
/// state; instances are shared behind `Arc`.
#[async_trait]
pub trait EntityRepository: Send + Sync {
    /// Builds the per-call context for the given model coordinates.
    async fn meta(&self, token: &str, entity_model: &str, entity_version: &str) -> CallMeta;

    /// Looks up one entity by its technical id. Absence is `Ok(None)`.
    async fn find_by_id(
        &self,
        meta: &CallMeta,
        technical_id: &str,
    ) -> Result<Option<Value>, RepositoryError>;

    /// Lenient keyed lookup driven by `meta.condition`: returns the first
    /// match, and degrades to `Ok(None)` (logged) on read errors. Callers
    /// that must distinguish "no match" from "read failed" should use
    /// [`find_all_by_criteria`](Self::find_all_by_criteria) instead.
    async fn find_by_key(
        &self,
        meta: &CallMeta,
        key: &str,
    ) -> Result<Option<Value>, RepositoryError>;

    /// Returns every entity of the model.
    async fn find_all(&self, meta: &CallMeta) -> Result<Vec<Value>, RepositoryError>;

    /// Searches by an opaque condition. Zero matches is `Ok(vec![])`, not an
    /// error; protocol failures (timeout, terminal failure) propagate as
    /// distinct [`RepositoryError`] variants.
    async fn find_all_by_criteria(
        &self,
        meta: &CallMeta,
        condition: &Value,
    ) -> Result<Vec<Value>, RepositoryError>;

    /// Persists one entity and returns its remote-assigned technical id.
    async fn save(&self, meta: &CallMeta, entity: &Value) -> Result<String, RepositoryError>;

    /// Persists a batch and returns the **first** generated id only. This
    /// mirrors the remote creation envelope; callers needing every id must
    /// save entities individually.
    async fn save_all(
        &self,
        meta: &CallMeta,
        entities: &[Value],
    ) -> Result<String, RepositoryError>;

    /// Updates an entity. With `Some(entity)` the payload is written through
    /// the id+transition endpoint; with `None` only the named transition is
    /// launched, advancing state without changing data. The two modes are
    /// distinct wire calls and are never conflated.
    async fn update(
        &self,
        meta: &CallMeta,
        technical_id: &str,
        entity: Option<&Value>,
    ) -> Result<Value, RepositoryError>;

    /// Deletes one entity by technical id. Backends that do not implement
    /// deletion return [`RepositoryError::Unsupported`].
    async fn delete_by_id(
        &self,
        meta: &CallMeta,
        technical_id: &str,
    ) -> Result<(), RepositoryError>;

    /// Deletes every entity of the model. Same support caveat as
    /// [`delete_by_id`](Self::delete_by_id).
    async fn delete_all(&self, meta: &CallMeta) -> Result<(), RepositoryError>;

    /// Whether any entity matches the keyed lookup for `key`.
    async fn exists_by_key(&self, meta: &CallMeta, key: &str) -> Result<bool, RepositoryError>;
}
