// Copyright (c) 2026 Trellis Platform
// SPDX-License-Identifier: AGPL-3.0
//! Bearer-token producer.
//!
//! Thin login client; the gateway itself never refreshes or caches tokens,
//! it only attaches whatever token the caller puts into the meta.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("authentication rejected (HTTP {status})")]
    Rejected { status: u16 },

    #[error("login response is missing the token field")]
    MalformedResponse,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    token: Option<String>,
}

pub struct AuthClient {
    client: Client,
    base_url: String,
}

impl AuthClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Exchanges credentials for a bearer token.
    pub async fn login(&self, username: &str, password: &str) -> Result<String, AuthError> {
        info!("authenticating against the entity API");
        let response = self
            .client
            .post(format!("{}/auth/login", self.base_url))
            .header("X-Requested-With", "XMLHttpRequest")
            .json(&LoginRequest { username, password })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            error!(%status, "authentication failed");
            return Err(AuthError::Rejected {
                status: status.as_u16(),
            });
        }

        let body: LoginResponse = response
            .json()
            .await
            .map_err(|_| AuthError::MalformedResponse)?;
        body.token.ok_or(AuthError::MalformedResponse)
    }
}
