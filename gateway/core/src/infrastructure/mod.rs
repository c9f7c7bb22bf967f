// Copyright (c) 2026 Trellis Platform
// SPDX-License-Identifier: AGPL-3.0

pub mod poll;
pub mod remote_gateway;
pub mod memory;
pub mod auth_client;
pub mod chat_client;

pub use memory::InMemoryEntityStore;
pub use remote_gateway::RemoteEntityGateway;
