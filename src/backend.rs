// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Shuffle execution backends
//!
//! A backend is selected by logical name, fixed by configuration. The
//! factory maps each name to one of two constructor shapes: the preferred
//! role-aware shape `(config, is_coordinator)` or the config-only shape
//! `(config)`, which drops the coordinator flag.

use std::any::Any;
use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use log::{info, warn};

use crate::config::ShuffleConfig;
use crate::error::{Result, ShuffleError};
use crate::writer::{
    ColumnarShuffleWriter, ReferenceShuffleWriter, ShuffleWriter, WriterBinding,
};

/// Logical name of the fast columnar-capable backend.
pub const COLUMNAR_BACKEND: &str = "columnar";
/// Logical name of the reference/fallback backend.
pub const REFERENCE_BACKEND: &str = "reference";

/// A constructed shuffle execution backend.
///
/// At most one instance per logical name exists for the lifetime of the
/// owning registry.
pub trait ShuffleBackend: Send + Sync + Debug {
    /// Returns the backend as [`Any`] so it can be downcast to its
    /// concrete type.
    fn as_any(&self) -> &dyn Any;

    /// The logical name this backend was constructed under.
    fn name(&self) -> &str;

    /// Produces a shuffle writer bound to one write request.
    fn create_writer(&self, binding: WriterBinding) -> Result<Box<dyn ShuffleWriter>>;
}

/// The two constructor shapes a backend may expose.
pub enum BackendConstructor {
    /// Preferred shape, receiving the coordinator-role flag.
    WithRole(
        Box<
            dyn Fn(Arc<ShuffleConfig>, bool) -> Result<Arc<dyn ShuffleBackend>>
                + Send
                + Sync,
        >,
    ),
    /// Config-only shape; constructing through it drops the coordinator flag.
    ConfigOnly(
        Box<dyn Fn(Arc<ShuffleConfig>) -> Result<Arc<dyn ShuffleBackend>> + Send + Sync>,
    ),
}

/// Factory resolving logical backend names to constructed backends.
pub struct BackendFactory {
    constructors: HashMap<String, BackendConstructor>,
}

impl Debug for BackendFactory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&str> =
            self.constructors.keys().map(|k| k.as_str()).collect();
        names.sort_unstable();
        f.debug_struct("BackendFactory")
            .field("backends", &names)
            .finish()
    }
}

impl Default for BackendFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl BackendFactory {
    /// Creates a factory with the built-in backends registered.
    pub fn new() -> Self {
        let mut factory = Self {
            constructors: HashMap::new(),
        };
        factory.register(
            COLUMNAR_BACKEND,
            BackendConstructor::WithRole(Box::new(ColumnarExecBackend::try_new)),
        );
        factory.register(
            REFERENCE_BACKEND,
            BackendConstructor::ConfigOnly(Box::new(ReferenceShuffleBackend::try_new)),
        );
        factory
    }

    /// Registers a backend constructor under a logical name, replacing any
    /// previous registration for that name.
    pub fn register(&mut self, name: impl Into<String>, constructor: BackendConstructor) {
        self.constructors.insert(name.into(), constructor);
    }

    /// Constructs the backend registered under `name`.
    ///
    /// A name with no registration, or a constructor that fails, is a
    /// deployment error and surfaces as
    /// [`ShuffleError::BackendInitialization`]; there is no further fallback.
    pub fn construct(
        &self,
        name: &str,
        config: Arc<ShuffleConfig>,
        is_coordinator: bool,
    ) -> Result<Arc<dyn ShuffleBackend>> {
        let constructor = self.constructors.get(name).ok_or_else(|| {
            ShuffleError::BackendInitialization(format!(
                "no shuffle backend registered under '{name}'"
            ))
        })?;
        let backend = match constructor {
            BackendConstructor::WithRole(f) => f(config, is_coordinator),
            BackendConstructor::ConfigOnly(f) => {
                // contract to verify at deployment: nothing guarantees a
                // backend constructed without the flag behaves correctly in
                // the coordinator role
                warn!(
                    "shuffle backend '{name}' takes no coordinator flag, \
                     constructing without it (is_coordinator={is_coordinator})"
                );
                f(config)
            }
        }
        .map_err(|e| {
            ShuffleError::BackendInitialization(format!(
                "failed to construct shuffle backend '{name}': {e}"
            ))
        })?;
        info!("constructed shuffle backend '{}'", backend.name());
        Ok(backend)
    }
}

/// The fast columnar-capable backend.
#[derive(Debug)]
pub struct ColumnarExecBackend {
    chunk_size: usize,
    is_coordinator: bool,
}

impl ColumnarExecBackend {
    /// Role-aware constructor.
    pub fn try_new(
        config: Arc<ShuffleConfig>,
        is_coordinator: bool,
    ) -> Result<Arc<dyn ShuffleBackend>> {
        Ok(Arc::new(Self {
            chunk_size: config.writer_buffer_size(),
            is_coordinator,
        }))
    }

    /// Whether this backend was constructed for the coordinator role.
    pub fn is_coordinator(&self) -> bool {
        self.is_coordinator
    }
}

impl ShuffleBackend for ColumnarExecBackend {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn name(&self) -> &str {
        COLUMNAR_BACKEND
    }

    fn create_writer(&self, binding: WriterBinding) -> Result<Box<dyn ShuffleWriter>> {
        Ok(Box::new(ColumnarShuffleWriter::new(
            binding,
            self.chunk_size,
        )))
    }
}

/// The reference/fallback backend. Exposes only the config-only constructor
/// shape.
#[derive(Debug)]
pub struct ReferenceShuffleBackend {}

impl ReferenceShuffleBackend {
    /// Config-only constructor.
    pub fn try_new(_config: Arc<ShuffleConfig>) -> Result<Arc<dyn ShuffleBackend>> {
        Ok(Arc::new(Self {}))
    }
}

impl ShuffleBackend for ReferenceShuffleBackend {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn name(&self) -> &str {
        REFERENCE_BACKEND
    }

    fn create_writer(&self, binding: WriterBinding) -> Result<Box<dyn ShuffleWriter>> {
        Ok(Box::new(ReferenceShuffleWriter::new(binding)))
    }
}
