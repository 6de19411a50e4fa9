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

//! Lazy backend registry
//!
//! Holds at most one instance of each backend slot, constructed on first
//! demand. Reads after warm-up take the read lock only; construction takes
//! the write lock, re-checks the slot, then stores. A failed construction
//! stores nothing, so a later caller retries.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::backend::{BackendFactory, ShuffleBackend, COLUMNAR_BACKEND, REFERENCE_BACKEND};
use crate::config::ShuffleConfig;
use crate::error::Result;

/// The two backend slots the registry manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendSlot {
    /// The fast columnar-capable backend.
    Columnar,
    /// The reference/fallback backend.
    Fallback,
}

impl BackendSlot {
    /// The logical backend name this slot resolves through the factory.
    pub fn backend_name(&self) -> &'static str {
        match self {
            BackendSlot::Columnar => COLUMNAR_BACKEND,
            BackendSlot::Fallback => REFERENCE_BACKEND,
        }
    }
}

type Slot = RwLock<Option<Arc<dyn ShuffleBackend>>>;

/// Construct-once registry of the two backend instances.
#[derive(Debug)]
pub struct LazyBackendRegistry {
    factory: BackendFactory,
    config: Arc<ShuffleConfig>,
    is_coordinator: bool,
    columnar: Slot,
    fallback: Slot,
}

impl LazyBackendRegistry {
    /// Creates an empty registry; no backend is constructed until first
    /// demanded.
    pub fn new(
        factory: BackendFactory,
        config: Arc<ShuffleConfig>,
        is_coordinator: bool,
    ) -> Self {
        Self {
            factory,
            config,
            is_coordinator,
            columnar: RwLock::new(None),
            fallback: RwLock::new(None),
        }
    }

    /// Returns the backend for `slot`, constructing it on first access.
    ///
    /// Exactly one construction is performed per slot across the lifetime of
    /// the registry, even under concurrent first access; every caller
    /// observes the same instance.
    pub fn get_backend(&self, slot: BackendSlot) -> Result<Arc<dyn ShuffleBackend>> {
        let cell = self.slot(slot);
        {
            let guard = cell.read();
            if let Some(backend) = guard.as_ref() {
                return Ok(Arc::clone(backend));
            }
        }
        let mut guard = cell.write();
        // another thread may have finished construction while we waited
        if let Some(backend) = guard.as_ref() {
            return Ok(Arc::clone(backend));
        }
        let backend = self.factory.construct(
            slot.backend_name(),
            Arc::clone(&self.config),
            self.is_coordinator,
        )?;
        *guard = Some(Arc::clone(&backend));
        Ok(backend)
    }

    fn slot(&self, slot: BackendSlot) -> &Slot {
        match slot {
            BackendSlot::Columnar => &self.columnar,
            BackendSlot::Fallback => &self.fallback,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BackendConstructor;
    use crate::backend::ColumnarExecBackend;
    use crate::error::ShuffleError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    fn counting_factory(constructed: Arc<AtomicUsize>) -> BackendFactory {
        let mut factory = BackendFactory::new();
        factory.register(
            COLUMNAR_BACKEND,
            BackendConstructor::WithRole(Box::new(move |config, is_coordinator| {
                constructed.fetch_add(1, Ordering::SeqCst);
                ColumnarExecBackend::try_new(config, is_coordinator)
            })),
        );
        factory
    }

    #[test]
    fn constructs_each_slot_once() -> Result<()> {
        let constructed = Arc::new(AtomicUsize::new(0));
        let registry = LazyBackendRegistry::new(
            counting_factory(Arc::clone(&constructed)),
            Arc::new(ShuffleConfig::default()),
            false,
        );
        let first = registry.get_backend(BackendSlot::Columnar)?;
        let second = registry.get_backend(BackendSlot::Columnar)?;
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(1, constructed.load(Ordering::SeqCst));
        Ok(())
    }

    #[test]
    fn concurrent_first_access_constructs_once() {
        let constructed = Arc::new(AtomicUsize::new(0));
        let registry = Arc::new(LazyBackendRegistry::new(
            counting_factory(Arc::clone(&constructed)),
            Arc::new(ShuffleConfig::default()),
            false,
        ));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || {
                    registry.get_backend(BackendSlot::Columnar).unwrap()
                })
            })
            .collect();
        let backends: Vec<_> =
            handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(1, constructed.load(Ordering::SeqCst));
        for backend in &backends[1..] {
            assert!(Arc::ptr_eq(&backends[0], backend));
        }
    }

    #[test]
    fn slots_are_independent() -> Result<()> {
        let registry = LazyBackendRegistry::new(
            BackendFactory::new(),
            Arc::new(ShuffleConfig::default()),
            false,
        );
        let columnar = registry.get_backend(BackendSlot::Columnar)?;
        let fallback = registry.get_backend(BackendSlot::Fallback)?;
        assert_eq!(COLUMNAR_BACKEND, columnar.name());
        assert_eq!(REFERENCE_BACKEND, fallback.name());
        Ok(())
    }

    #[test]
    fn failed_construction_leaves_slot_empty_for_retry() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let mut factory = BackendFactory::new();
        let counter = Arc::clone(&attempts);
        factory.register(
            COLUMNAR_BACKEND,
            BackendConstructor::WithRole(Box::new(move |config, is_coordinator| {
                if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(ShuffleError::Internal(
                        "first attempt fails".to_string(),
                    ))
                } else {
                    ColumnarExecBackend::try_new(config, is_coordinator)
                }
            })),
        );
        let registry = LazyBackendRegistry::new(
            factory,
            Arc::new(ShuffleConfig::default()),
            false,
        );

        let err = registry.get_backend(BackendSlot::Columnar).unwrap_err();
        assert!(matches!(err, ShuffleError::BackendInitialization(_)));

        // the slot was not poisoned; the next caller constructs successfully
        let backend = registry.get_backend(BackendSlot::Columnar).unwrap();
        assert_eq!(COLUMNAR_BACKEND, backend.name());
        assert_eq!(2, attempts.load(Ordering::SeqCst));
    }
}
