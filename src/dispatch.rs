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

//! Shuffle write dispatch
//!
//! One `WriteDispatcher` lives in each executor process. Worker threads call
//! [`WriteDispatcher::get_writer`] concurrently, one call per task attempt;
//! columnar dependencies are routed to a writer produced by the columnar
//! backend, everything else is delegated to the engine's default write path.

use std::fmt::Debug;
use std::sync::Arc;

use dashmap::DashMap;
use log::{debug, warn};

use crate::client::ShuffleWriteClient;
use crate::config::{ShuffleConfig, RSS_ROW_BASED};
use crate::error::{Result, ShuffleError};
use crate::handle::{RssShuffleHandle, ShuffleDependency, ShuffleHandle};
use crate::metrics::{ShuffleWriteMetrics, ShuffleWriteMetricsReporter, WriteMetrics};
use crate::registry::{BackendSlot, LazyBackendRegistry};
use crate::task::TaskContext;
use crate::writer::{MarkTaskFailed, ShuffleWriter, WriterBinding};

/// The engine's default write path, which the dispatcher delegates to for
/// anything that is not columnar.
pub trait ShuffleWriterProvider: Send + Sync + Debug {
    /// Forwards shuffle registration to the default path.
    fn register_shuffle(
        &self,
        shuffle_id: usize,
        handle: Arc<dyn ShuffleHandle>,
    ) -> Result<()>;

    /// Produces a writer through the default path.
    fn get_writer(
        &self,
        handle: Arc<dyn ShuffleHandle>,
        map_id: u64,
        context: &TaskContext,
        reporter: Option<Arc<dyn ShuffleWriteMetricsReporter>>,
    ) -> Result<Box<dyn ShuffleWriter>>;
}

type PusherAppIds = Arc<DashMap<usize, String>>;
type FailedWrites = Arc<DashMap<usize, String>>;

/// Routes shuffle write requests to the matching writer.
///
/// Cheap to clone; all state is shared.
#[derive(Clone, Debug)]
pub struct WriteDispatcher {
    config: Arc<ShuffleConfig>,
    registry: Arc<LazyBackendRegistry>,
    write_client: Arc<dyn ShuffleWriteClient>,
    default_provider: Arc<dyn ShuffleWriterProvider>,
    pusher_app_ids: PusherAppIds,
    failed_writes: FailedWrites,
}

impl WriteDispatcher {
    /// Creates a dispatcher over the given collaborators.
    pub fn new(
        config: Arc<ShuffleConfig>,
        registry: Arc<LazyBackendRegistry>,
        write_client: Arc<dyn ShuffleWriteClient>,
        default_provider: Arc<dyn ShuffleWriterProvider>,
    ) -> Self {
        Self {
            config,
            registry,
            write_client,
            default_provider,
            pusher_app_ids: Default::default(),
            failed_writes: Default::default(),
        }
    }

    /// Forwards shuffle registration to the default path unchanged.
    pub fn register_shuffle(
        &self,
        shuffle_id: usize,
        handle: Arc<dyn ShuffleHandle>,
    ) -> Result<()> {
        self.default_provider.register_shuffle(shuffle_id, handle)
    }

    /// Returns a shuffle writer for one task attempt.
    ///
    /// The handle must be an [`RssShuffleHandle`]; anything else fails with
    /// [`ShuffleError::UnexpectedHandle`] before any side effect. Columnar
    /// dependencies get a writer from the columnar backend; row-based
    /// dependencies are delegated wholesale to the default provider and the
    /// returned writer is passed through unmodified.
    pub fn get_writer(
        &self,
        handle: Arc<dyn ShuffleHandle>,
        map_id: u64,
        context: &TaskContext,
        reporter: Option<Arc<dyn ShuffleWriteMetricsReporter>>,
    ) -> Result<Box<dyn ShuffleWriter>> {
        let Some(rss_handle) = handle.as_any().downcast_ref::<RssShuffleHandle>()
        else {
            return Err(ShuffleError::UnexpectedHandle(format!("{handle:?}")));
        };
        self.config.set_if_missing(RSS_ROW_BASED, "false")?;

        match rss_handle.dependency() {
            ShuffleDependency::Columnar(_) => {
                self.register_pusher_app_id(rss_handle);
                let task_id = format!(
                    "{}_{}",
                    context.task_attempt_id(),
                    context.attempt_number()
                );
                let metrics: Arc<dyn ShuffleWriteMetrics> = match reporter {
                    Some(reporter) => Arc::new(WriteMetrics::new(reporter)),
                    None => context.task_metrics().shuffle_write_metrics(),
                };
                debug!(
                    "creating columnar shuffle writer for shuffle {} task {task_id}",
                    rss_handle.shuffle_id()
                );
                let backend = self.registry.get_backend(BackendSlot::Columnar)?;
                let mark_task_failed: MarkTaskFailed = {
                    let dispatcher = self.clone();
                    Arc::new(move |handle, error| {
                        dispatcher.mark_task_failed(handle, error)
                    })
                };
                backend.create_writer(WriterBinding {
                    app_id: rss_handle.app_id().to_owned(),
                    shuffle_id: rss_handle.shuffle_id(),
                    task_id,
                    task_attempt_id: context.task_attempt_id(),
                    metrics,
                    dispatcher: self.clone(),
                    config: Arc::clone(&self.config),
                    client: Arc::clone(&self.write_client),
                    handle: Arc::clone(&handle),
                    mark_task_failed,
                    context: context.clone(),
                })
            }
            ShuffleDependency::RowBased(_) => {
                debug!(
                    "delegating shuffle {} to the default write path",
                    rss_handle.shuffle_id()
                );
                self.default_provider
                    .get_writer(handle, map_id, context, reporter)
            }
        }
    }

    /// Records a failed task attempt for the shuffle the handle refers to.
    pub fn mark_task_failed(&self, handle: &dyn ShuffleHandle, error: &ShuffleError) {
        warn!(
            "marking shuffle write failed for shuffle {}: {error}",
            handle.shuffle_id()
        );
        self.failed_writes
            .insert(handle.shuffle_id(), error.to_string());
    }

    /// The recorded write failure for a shuffle, if any.
    pub fn write_failure(&self, shuffle_id: usize) -> Option<String> {
        self.failed_writes.get(&shuffle_id).map(|e| e.clone())
    }

    /// The pusher application identity registered for a shuffle, if any.
    pub fn pusher_app_id(&self, shuffle_id: usize) -> Option<String> {
        self.pusher_app_ids.get(&shuffle_id).map(|v| v.clone())
    }

    // Idempotent: re-registering the same shuffle keeps the first identity.
    fn register_pusher_app_id(&self, handle: &RssShuffleHandle) {
        self.pusher_app_ids
            .entry(handle.shuffle_id())
            .or_insert_with(|| handle.app_id().to_owned());
    }
}
