// Copyright (c) 2026 Trellis Platform
// SPDX-License-Identifier: AGPL-3.0
//! Domain layer: backend-independent contracts and wire-tree types.

pub mod meta;
pub mod entity;
pub mod repository;
pub mod codec;
pub mod chat;
