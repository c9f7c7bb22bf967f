// Copyright (c) 2026 Trellis Platform
// SPDX-License-Identifier: AGPL-3.0
//! Wire codec: explicit per-type encode capability table.
//!
//! Typed caller values cross the gateway boundary only through encoders
//! registered here. An unregistered type fails loudly with
//! [`RepositoryError::Serialization`] instead of falling back to reflection
//! and silently dropping fields. `serde_json::Value` is pre-registered as a
//! passthrough since it already is wire shape.

use serde::Serialize;
use serde_json::Value;
use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;

use crate::domain::repository::RepositoryError;

type EncodeFn = fn(&dyn Any) -> Result<Value, RepositoryError>;

pub struct WireCodec {
    encoders: HashMap<TypeId, EncodeFn>,
}

impl WireCodec {
    pub fn new() -> Self {
        let mut codec = Self {
            encoders: HashMap::new(),
        };
        codec.register::<Value>();
        codec
    }

    /// Registers the serde encoder for `T`. Idempotent.
    pub fn register<T: Serialize + Any>(&mut self) {
        self.encoders.insert(TypeId::of::<T>(), encode_erased::<T>);
    }

    pub fn supports<T: Any>(&self) -> bool {
        self.encoders.contains_key(&TypeId::of::<T>())
    }

    /// Encodes a caller value into the wire tree, failing when no encoder
    /// has been registered for its type.
    pub fn encode<T: Any>(&self, value: &T) -> Result<Value, RepositoryError> {
        match self.encoders.get(&TypeId::of::<T>()) {
            Some(encode) => encode(value),
            None => Err(RepositoryError::Serialization(format!(
                "no wire encoder registered for type {}",
                type_name::<T>()
            ))),
        }
    }
}

impl Default for WireCodec {
    fn default() -> Self {
        Self::new()
    }
}

fn encode_erased<T: Serialize + Any>(value: &dyn Any) -> Result<Value, RepositoryError> {
    let concrete = value.downcast_ref::<T>().ok_or_else(|| {
        RepositoryError::Serialization(format!(
            "encoder registered for {} received a different type",
            type_name::<T>()
        ))
    })?;
    serde_json::to_value(concrete).map_err(|e| RepositoryError::Serialization(e.to_string()))
}
