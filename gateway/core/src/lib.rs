// Copyright (c) 2026 Trellis Platform
// SPDX-License-Identifier: AGPL-3.0
//! Trellis Gateway Core
//!
//! Entity persistence gateway for the Trellis document platform. Application
//! code sees a synchronous-feeling CRUD surface; internally the gateway
//! mediates the remote snapshot-search protocol, the transition-based update
//! protocol, and a bounded-retry JSON self-correction loop for AI-produced
//! payloads.
//!
//! # Architecture
//!
//! - **Layer:** Core System
//! - **`domain`** — contracts and types shared by every backend
//! - **`application`** — entity service facade and the JSON correction loop
//! - **`infrastructure`** — remote HTTP gateway, in-memory store, adapters

pub mod config;
pub mod domain;
pub mod application;
pub mod infrastructure;

pub use domain::*;
