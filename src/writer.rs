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

//! Shuffle writers
//!
//! The writer capability produced by shuffle backends, and the concrete
//! writers the built-in backends hand out. Everything a writer is bound to
//! is collected in [`WriterBinding`] at dispatch time.

use std::any::Any;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;
use std::time::Instant;

use log::debug;

use crate::client::ShuffleWriteClient;
use crate::config::ShuffleConfig;
use crate::dispatch::WriteDispatcher;
use crate::error::{Result, ShuffleError};
use crate::handle::ShuffleHandle;
use crate::metrics::ShuffleWriteMetrics;
use crate::task::TaskContext;

/// Writer for the shuffle output of one task attempt.
pub trait ShuffleWriter: Debug + Send {
    /// Returns the writer as [`Any`] so it can be downcast to its
    /// concrete type.
    fn as_any(&self) -> &dyn Any;

    /// Writes one serialized block for the given reduce partition.
    fn write_block(&mut self, partition_id: usize, data: &[u8]) -> Result<()>;

    /// Finishes the write, reporting whether the task succeeded.
    fn stop(&mut self, success: bool) -> Result<()>;
}

/// Callback used by writers to report a failed task attempt back to the
/// dispatch layer, carrying the handle of the affected shuffle.
pub type MarkTaskFailed = Arc<dyn Fn(&dyn ShuffleHandle, &ShuffleError) + Send + Sync>;

/// Everything a shuffle writer is bound to when the dispatcher creates it.
pub struct WriterBinding {
    /// The application the shuffle belongs to.
    pub app_id: String,
    /// Id of the shuffle stage being written.
    pub shuffle_id: usize,
    /// Composite task identity, `"<attemptId>_<attemptNumber>"`.
    pub task_id: String,
    /// Globally unique id of the task attempt.
    pub task_attempt_id: u64,
    /// Metrics selected for this write request.
    pub metrics: Arc<dyn ShuffleWriteMetrics>,
    /// The dispatcher that created the writer, for failure callbacks.
    pub dispatcher: WriteDispatcher,
    /// Active shuffle layer configuration.
    pub config: Arc<ShuffleConfig>,
    /// Client for the remote shuffle service.
    pub client: Arc<dyn ShuffleWriteClient>,
    /// The handle the write request was made with.
    pub handle: Arc<dyn ShuffleHandle>,
    /// Marks the task attempt failed in the dispatch layer.
    pub mark_task_failed: MarkTaskFailed,
    /// The executing task attempt.
    pub context: TaskContext,
}

impl Debug for WriterBinding {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WriterBinding")
            .field("app_id", &self.app_id)
            .field("shuffle_id", &self.shuffle_id)
            .field("task_id", &self.task_id)
            .field("task_attempt_id", &self.task_attempt_id)
            .finish_non_exhaustive()
    }
}

/// Writer that streams columnar shuffle blocks to the remote shuffle
/// service, chunking pushes to the configured buffer size.
pub struct ColumnarShuffleWriter {
    binding: WriterBinding,
    chunk_size: usize,
    stopped: bool,
}

impl ColumnarShuffleWriter {
    /// Creates a writer over the given binding.
    pub fn new(binding: WriterBinding, chunk_size: usize) -> Self {
        Self {
            binding,
            chunk_size,
            stopped: false,
        }
    }

    /// The application the shuffle belongs to.
    pub fn app_id(&self) -> &str {
        &self.binding.app_id
    }

    /// Id of the shuffle stage being written.
    pub fn shuffle_id(&self) -> usize {
        self.binding.shuffle_id
    }

    /// Composite task identity, `"<attemptId>_<attemptNumber>"`.
    pub fn task_id(&self) -> &str {
        &self.binding.task_id
    }

    /// Globally unique id of the task attempt.
    pub fn task_attempt_id(&self) -> u64 {
        self.binding.task_attempt_id
    }
}

impl Debug for ColumnarShuffleWriter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ColumnarShuffleWriter")
            .field("binding", &self.binding)
            .field("chunk_size", &self.chunk_size)
            .field("stopped", &self.stopped)
            .finish()
    }
}

impl ShuffleWriter for ColumnarShuffleWriter {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn write_block(&mut self, partition_id: usize, data: &[u8]) -> Result<()> {
        let start = Instant::now();
        for chunk in data.chunks(self.chunk_size.max(1)) {
            if let Err(e) = self.binding.client.push_block(
                &self.binding.app_id,
                self.binding.shuffle_id,
                &self.binding.task_id,
                partition_id,
                chunk,
            ) {
                (self.binding.mark_task_failed)(self.binding.handle.as_ref(), &e);
                return Err(e);
            }
        }
        self.binding.metrics.inc_bytes_written(data.len() as u64);
        self.binding.metrics.inc_records_written(1);
        self.binding.metrics.inc_write_time(start.elapsed());
        Ok(())
    }

    fn stop(&mut self, success: bool) -> Result<()> {
        if self.stopped {
            return Ok(());
        }
        self.stopped = true;
        if success {
            self.binding.client.finalize_task(
                &self.binding.app_id,
                self.binding.shuffle_id,
                &self.binding.task_id,
            )
        } else {
            debug!(
                "columnar shuffle write for task {} did not succeed, skipping finalize",
                self.binding.task_id
            );
            self.binding.dispatcher.mark_task_failed(
                self.binding.handle.as_ref(),
                &ShuffleError::General(format!(
                    "task {} stopped without success",
                    self.binding.task_id
                )),
            );
            Ok(())
        }
    }
}

/// Unbuffered writer produced by the reference backend.
///
/// Pushes every block as a single request; exists as the known-good baseline
/// to compare the columnar path against.
#[derive(Debug)]
pub struct ReferenceShuffleWriter {
    app_id: String,
    shuffle_id: usize,
    task_id: String,
    metrics: Arc<dyn ShuffleWriteMetrics>,
    client: Arc<dyn ShuffleWriteClient>,
}

impl ReferenceShuffleWriter {
    /// Creates a writer over the subset of the binding the reference path
    /// needs.
    pub fn new(binding: WriterBinding) -> Self {
        Self {
            app_id: binding.app_id,
            shuffle_id: binding.shuffle_id,
            task_id: binding.task_id,
            metrics: binding.metrics,
            client: binding.client,
        }
    }
}

impl ShuffleWriter for ReferenceShuffleWriter {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn write_block(&mut self, partition_id: usize, data: &[u8]) -> Result<()> {
        let start = Instant::now();
        self.client.push_block(
            &self.app_id,
            self.shuffle_id,
            &self.task_id,
            partition_id,
            data,
        )?;
        self.metrics.inc_bytes_written(data.len() as u64);
        self.metrics.inc_records_written(1);
        self.metrics.inc_write_time(start.elapsed());
        Ok(())
    }

    fn stop(&mut self, success: bool) -> Result<()> {
        if success {
            self.client
                .finalize_task(&self.app_id, self.shuffle_id, &self.task_id)
        } else {
            Ok(())
        }
    }
}
