// Copyright (c) 2026 Trellis Platform
// SPDX-License-Identifier: AGPL-3.0
//! Remote entity gateway.
//!
//! Implements the CRUD contract against the remote document store over HTTP:
//! the asynchronous snapshot-search protocol (submit, poll, fetch a page),
//! the batch creation protocol, and the two-mode update protocol (payload
//! write vs. bare transition launch). The gateway holds no local mutable
//! state; every consistency guarantee is delegated to the remote service.
//!
//! # Usage
//!
//! ```ignore
//! let gateway = RemoteEntityGateway::new(&GatewayConfig::new("https://host/api"));
//! let meta = gateway.meta(&token, "order", "1000").await;
//! let hits = gateway
//!     .find_all_by_criteria(&meta, &json!({"key": "status", "value": "active"}))
//!     .await?;
//! ```

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::GatewayConfig;
use crate::domain::entity::{attach_technical_id, PageRequest};
use crate::domain::meta::CallMeta;
use crate::domain::repository::{EntityRepository, RepositoryError};
use crate::infrastructure::poll::{PollError, PollPolicy, PollTimer};

const STATUS_RUNNING: &str = "RUNNING";
const STATUS_SUCCESSFUL: &str = "SUCCESSFUL";

/// Transition name pre-filled into remote metas; callers override it per
/// update when their state machine names the edge differently.
const DEFAULT_UPDATE_TRANSITION: &str = "update";

pub struct RemoteEntityGateway {
    client: Client,
    base_url: String,
    entity_class: String,
    poll: PollPolicy,
    page: PageRequest,
    cancel: CancellationToken,
}

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct SnapshotStatusBody {
    #[serde(rename = "snapshotStatus")]
    snapshot_status: String,
}

#[derive(Deserialize)]
struct ResultPageBody {
    #[serde(rename = "_embedded", default)]
    embedded: Option<EmbeddedNodes>,
    page: PageInfo,
}

#[derive(Deserialize, Default)]
struct EmbeddedNodes {
    #[serde(rename = "objectNodes", default)]
    object_nodes: Vec<ObjectNode>,
}

#[derive(Deserialize)]
struct ObjectNode {
    id: String,
    tree: Value,
}

#[derive(Deserialize)]
struct PageInfo {
    #[serde(rename = "totalElements")]
    total_elements: u64,
}

#[derive(Deserialize)]
struct EntityIdsEnvelope {
    #[serde(rename = "entityIds", default)]
    entity_ids: Vec<String>,
}

impl RemoteEntityGateway {
    pub fn new(config: &GatewayConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.api_url.trim_end_matches('/').to_string(),
            entity_class: config.entity_class.clone(),
            poll: config.poll,
            page: config.page,
            cancel: CancellationToken::new(),
        }
    }

    /// Token that aborts in-flight snapshot polls when cancelled. The
    /// original protocol offered no way to stop a poll from outside; this
    /// hook closes that gap.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Whether the model/version schema exists remotely. Only the HTTP
    /// status carries the signal: 200 means "exists", every other status
    /// means "does not exist" rather than an error.
    pub async fn model_exists(&self, meta: &CallMeta) -> Result<bool, RepositoryError> {
        let path = format!(
            "model/export/SIMPLE_VIEW/{}/{}",
            meta.entity_model, meta.entity_version
        );
        let response = self
            .request(Method::GET, &path, &meta.token)
            .send()
            .await?;
        Ok(response.status() == StatusCode::OK)
    }

    // -- HTTP plumbing ------------------------------------------------------

    fn request(&self, method: Method, path: &str, token: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}/{}", self.base_url, path))
            .bearer_auth(token)
    }

    /// Sends a request, turning non-2xx statuses into
    /// [`RepositoryError::Remote`] with the body preserved for context.
    async fn send(
        &self,
        request: RequestBuilder,
        context: &'static str,
    ) -> Result<Response, RepositoryError> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(context, %status, body, "remote call rejected");
            return Err(RepositoryError::Remote {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn decode<T: serde::de::DeserializeOwned>(
        response: Response,
        context: &'static str,
    ) -> Result<T, RepositoryError> {
        response
            .json::<T>()
            .await
            .map_err(|e| RepositoryError::Protocol(format!("malformed {context} response: {e}")))
    }

    // -- Snapshot search protocol ------------------------------------------

    /// Submits the condition; a missing or empty snapshot id is fatal, with
    /// no retry.
    async fn submit_search(
        &self,
        meta: &CallMeta,
        condition: &Value,
    ) -> Result<String, RepositoryError> {
        let path = format!(
            "search/snapshot/{}/{}",
            meta.entity_model, meta.entity_version
        );
        let response = self
            .send(
                self.request(Method::POST, &path, &meta.token).json(condition),
                "submit search",
            )
            .await?;
        let body = response.text().await?;
        let snapshot_id = body.trim().trim_matches('"').to_string();
        if snapshot_id.is_empty() {
            error!(model = %meta.entity_model, "snapshot id missing from search response");
            return Err(RepositoryError::Protocol(
                "snapshot id missing from search response".into(),
            ));
        }
        Ok(snapshot_id)
    }

    /// Polls the snapshot status until `SUCCESSFUL`. Any other terminal
    /// status fails immediately without waiting out the budget; a budget
    /// spent while `RUNNING` is a distinct timeout error.
    async fn wait_for_search(
        &self,
        meta: &CallMeta,
        snapshot_id: &str,
    ) -> Result<(), RepositoryError> {
        let path = format!("search/snapshot/{snapshot_id}/status");
        let timer = PollTimer::start(self.poll, self.cancel.clone());
        loop {
            let response = self
                .send(
                    self.request(Method::GET, &path, &meta.token),
                    "poll status",
                )
                .await?;
            let status: SnapshotStatusBody = Self::decode(response, "snapshot status").await?;
            match status.snapshot_status.as_str() {
                STATUS_SUCCESSFUL => return Ok(()),
                STATUS_RUNNING => timer.tick().await.map_err(|e| match e {
                    PollError::TimedOut { elapsed } => {
                        warn!(snapshot_id, ?elapsed, "snapshot search timed out");
                        RepositoryError::SearchTimeout { elapsed }
                    }
                    PollError::Cancelled => RepositoryError::Cancelled,
                })?,
                terminal => {
                    error!(snapshot_id, status = terminal, "snapshot search failed");
                    return Err(RepositoryError::SearchFailed {
                        status: terminal.to_string(),
                    });
                }
            }
        }
    }

    /// Fetches one result page and unwraps each `{id, tree}` node into an
    /// entity carrying its technical id. `totalElements == 0` short-circuits
    /// to an empty sequence without touching the nodes.
    async fn fetch_search_page(
        &self,
        meta: &CallMeta,
        snapshot_id: &str,
    ) -> Result<Vec<Value>, RepositoryError> {
        let path = format!("search/snapshot/{snapshot_id}");
        let request = self
            .request(Method::GET, &path, &meta.token)
            .query(&[
                ("pageSize", self.page.page_size.to_string()),
                ("pageNumber", self.page.page_number.to_string()),
            ]);
        let response = self.send(request, "fetch page").await?;
        let page: ResultPageBody = Self::decode(response, "result page").await?;

        if page.page.total_elements == 0 {
            return Ok(Vec::new());
        }
        Ok(page
            .embedded
            .unwrap_or_default()
            .object_nodes
            .into_iter()
            .map(|node| attach_technical_id(node.tree, &node.id))
            .collect())
    }

    async fn search_entities(
        &self,
        meta: &CallMeta,
        condition: &Value,
    ) -> Result<Vec<Value>, RepositoryError> {
        let snapshot_id = self.submit_search(meta, condition).await?;
        self.wait_for_search(meta, &snapshot_id).await?;
        self.fetch_search_page(meta, &snapshot_id).await
    }

    // -- Creation protocol --------------------------------------------------

    async fn save_batch(
        &self,
        meta: &CallMeta,
        entities: &[Value],
    ) -> Result<String, RepositoryError> {
        let path = format!("entity/JSON/{}/{}", meta.entity_model, meta.entity_version);
        info!(model = %meta.entity_model, count = entities.len(), "saving new entities");
        let response = self
            .send(
                self.request(Method::POST, &path, &meta.token).json(&entities),
                "create entity",
            )
            .await
            .map_err(|e| {
                error!(model = %meta.entity_model, error = %e, "entity save failed");
                e
            })?;
        let envelopes: Vec<EntityIdsEnvelope> = Self::decode(response, "create entity").await?;
        envelopes
            .first()
            .and_then(|envelope| envelope.entity_ids.first())
            .cloned()
            .ok_or_else(|| {
                RepositoryError::Protocol("entityIds missing from create response".into())
            })
    }
}

#[async_trait]
impl EntityRepository for RemoteEntityGateway {
    async fn meta(&self, token: &str, entity_model: &str, entity_version: &str) -> CallMeta {
        CallMeta::new(token, entity_model, entity_version)
            .with_transition(DEFAULT_UPDATE_TRANSITION)
    }

    async fn find_by_id(
        &self,
        meta: &CallMeta,
        technical_id: &str,
    ) -> Result<Option<Value>, RepositoryError> {
        let path = format!("entity/{technical_id}");
        let result = self
            .send(self.request(Method::GET, &path, &meta.token), "read by id")
            .await;
        let response = match result {
            Ok(response) => response,
            Err(RepositoryError::Remote { status: 404, .. }) => return Ok(None),
            Err(e) => return Err(e),
        };
        let body: Value = Self::decode(response, "read by id").await?;
        let tree = body
            .get("tree")
            .cloned()
            .ok_or_else(|| RepositoryError::Protocol("tree missing from entity response".into()))?;
        Ok(Some(attach_technical_id(tree, technical_id)))
    }

    async fn find_by_key(
        &self,
        meta: &CallMeta,
        key: &str,
    ) -> Result<Option<Value>, RepositoryError> {
        let condition = meta.condition.clone().ok_or_else(|| {
            RepositoryError::Protocol("find_by_key requires meta.condition".into())
        })?;
        match self.search_entities(meta, &condition).await {
            Ok(mut hits) => {
                if hits.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(hits.remove(0)))
                }
            }
            Err(e) => {
                // Lenient read path: degrade to absence, but keep the cause
                // in the log so operators can tell it apart from "no match".
                warn!(key, error = %e, "keyed read degraded to none");
                Ok(None)
            }
        }
    }

    async fn find_all(&self, meta: &CallMeta) -> Result<Vec<Value>, RepositoryError> {
        let path = format!("entity/{}/{}", meta.entity_model, meta.entity_version);
        let response = self
            .send(self.request(Method::GET, &path, &meta.token), "read all")
            .await?;
        let body: Value = Self::decode(response, "read all").await?;
        let nodes = body
            .as_array()
            .cloned()
            .ok_or_else(|| RepositoryError::Protocol("read all response is not a list".into()))?;
        Ok(nodes.into_iter().map(unwrap_node).collect())
    }

    async fn find_all_by_criteria(
        &self,
        meta: &CallMeta,
        condition: &Value,
    ) -> Result<Vec<Value>, RepositoryError> {
        self.search_entities(meta, condition).await
    }

    async fn save(&self, meta: &CallMeta, entity: &Value) -> Result<String, RepositoryError> {
        self.save_batch(meta, std::slice::from_ref(entity)).await
    }

    async fn save_all(
        &self,
        meta: &CallMeta,
        entities: &[Value],
    ) -> Result<String, RepositoryError> {
        if entities.is_empty() {
            return Err(RepositoryError::Protocol(
                "save_all requires at least one entity".into(),
            ));
        }
        self.save_batch(meta, entities).await
    }

    async fn update(
        &self,
        meta: &CallMeta,
        technical_id: &str,
        entity: Option<&Value>,
    ) -> Result<Value, RepositoryError> {
        let transition = meta
            .update_transition
            .as_deref()
            .ok_or(RepositoryError::MissingTransition)?;

        match entity {
            // Payload update: write the serialized entity through the
            // id+transition endpoint and hand back the updated id.
            Some(payload) => {
                let path = format!("entity/JSON/{technical_id}/{transition}");
                let response = self
                    .send(
                        self.request(Method::PUT, &path, &meta.token).json(payload),
                        "payload update",
                    )
                    .await
                    .map_err(|e| {
                        error!(technical_id, transition, error = %e, "entity update failed");
                        e
                    })?;
                let envelope: EntityIdsEnvelope =
                    Self::decode(response, "payload update").await?;
                let id = envelope.entity_ids.into_iter().next().ok_or_else(|| {
                    RepositoryError::Protocol("entityIds missing from update response".into())
                })?;
                Ok(Value::String(id))
            }
            // Bare transition: advance the state machine without touching
            // data. A distinct endpoint; never merged with the payload path.
            None => {
                info!(technical_id, transition, "launching bare transition");
                let request = self
                    .request(Method::PUT, "platform-api/entity/transition", &meta.token)
                    .query(&[
                        ("entityId", technical_id),
                        ("entityClass", self.entity_class.as_str()),
                        ("transitionName", transition),
                    ]);
                let response = self.send(request, "bare transition").await.map_err(|e| {
                    error!(technical_id, transition, error = %e, "bare transition failed");
                    e
                })?;
                let body = response.text().await?;
                if body.trim().is_empty() {
                    return Ok(Value::Null);
                }
                serde_json::from_str(&body).map_err(|e| {
                    RepositoryError::Protocol(format!("malformed transition response: {e}"))
                })
            }
        }
    }

    async fn delete_by_id(
        &self,
        _meta: &CallMeta,
        _technical_id: &str,
    ) -> Result<(), RepositoryError> {
        // The remote service exposes no per-entity deletion; refusing loudly
        // beats pretending the entity is gone.
        Err(RepositoryError::Unsupported(
            "delete_by_id is not implemented by the remote gateway",
        ))
    }

    async fn delete_all(&self, meta: &CallMeta) -> Result<(), RepositoryError> {
        let path = format!("entity/{}/{}", meta.entity_model, meta.entity_version);
        self.send(
            self.request(Method::DELETE, &path, &meta.token),
            "delete all",
        )
        .await?;
        Ok(())
    }

    async fn exists_by_key(&self, meta: &CallMeta, key: &str) -> Result<bool, RepositoryError> {
        Ok(self.find_by_key(meta, key).await?.is_some())
    }
}

/// Unwraps a `{id, tree}` node into its entity; anything else passes
/// through unchanged.
fn unwrap_node(node: Value) -> Value {
    match (node.get("id").and_then(Value::as_str), node.get("tree")) {
        (Some(id), Some(tree)) => {
            let id = id.to_string();
            attach_technical_id(tree.clone(), &id)
        }
        _ => node,
    }
}
