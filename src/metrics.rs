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

//! Shuffle write metrics
//!
//! Writers record against the [`ShuffleWriteMetrics`] contract. The metrics
//! object behind it is chosen per write request: either an adapter over an
//! externally supplied [`ShuffleWriteMetricsReporter`], or the task's own
//! [`TaskWriteMetrics`] when no reporter was supplied.

use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Write metrics contract recorded against by shuffle writers.
pub trait ShuffleWriteMetrics: Send + Sync + Debug {
    /// Adds to the number of shuffle bytes written.
    fn inc_bytes_written(&self, v: u64);
    /// Adds to the number of shuffle records written.
    fn inc_records_written(&self, v: u64);
    /// Adds time spent writing shuffle data.
    fn inc_write_time(&self, d: Duration);
}

/// Externally supplied metrics reporter, owned by the surrounding engine.
pub trait ShuffleWriteMetricsReporter: Send + Sync + Debug {
    /// Reports shuffle bytes written.
    fn record_bytes_written(&self, v: u64);
    /// Reports shuffle records written.
    fn record_records_written(&self, v: u64);
    /// Reports time spent writing shuffle data.
    fn record_write_time(&self, d: Duration);
}

/// Task-owned write metrics backed by atomic counters.
#[derive(Debug, Default)]
pub struct TaskWriteMetrics {
    bytes_written: AtomicU64,
    records_written: AtomicU64,
    write_time_nanos: AtomicU64,
}

impl TaskWriteMetrics {
    /// Total shuffle bytes written by the task.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written.load(Ordering::Relaxed)
    }

    /// Total shuffle records written by the task.
    pub fn records_written(&self) -> u64 {
        self.records_written.load(Ordering::Relaxed)
    }

    /// Total time the task spent writing shuffle data.
    pub fn write_time(&self) -> Duration {
        Duration::from_nanos(self.write_time_nanos.load(Ordering::Relaxed))
    }
}

impl ShuffleWriteMetrics for TaskWriteMetrics {
    fn inc_bytes_written(&self, v: u64) {
        self.bytes_written.fetch_add(v, Ordering::Relaxed);
    }

    fn inc_records_written(&self, v: u64) {
        self.records_written.fetch_add(v, Ordering::Relaxed);
    }

    fn inc_write_time(&self, d: Duration) {
        self.write_time_nanos
            .fetch_add(d.as_nanos() as u64, Ordering::Relaxed);
    }
}

/// Adapter exposing the write-metrics contract over an external reporter.
#[derive(Debug)]
pub struct WriteMetrics {
    reporter: Arc<dyn ShuffleWriteMetricsReporter>,
}

impl WriteMetrics {
    /// Wraps an externally supplied reporter.
    pub fn new(reporter: Arc<dyn ShuffleWriteMetricsReporter>) -> Self {
        Self { reporter }
    }
}

impl ShuffleWriteMetrics for WriteMetrics {
    fn inc_bytes_written(&self, v: u64) {
        self.reporter.record_bytes_written(v);
    }

    fn inc_records_written(&self, v: u64) {
        self.reporter.record_records_written(v);
    }

    fn inc_write_time(&self, d: Duration) {
        self.reporter.record_write_time(d);
    }
}
