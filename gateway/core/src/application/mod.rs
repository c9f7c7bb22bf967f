// Copyright (c) 2026 Trellis Platform
// SPDX-License-Identifier: AGPL-3.0

pub mod entity_service;
pub mod json_repair;

pub use entity_service::{EntityService, ServiceError};
pub use json_repair::{CorrectionError, JsonCorrector};
