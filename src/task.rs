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

//! Task execution context
//!
//! Owned by the surrounding execution engine and consumed read-only by the
//! dispatch layer to derive the composite task identity and the default
//! write metrics.

use std::sync::Arc;

use crate::metrics::TaskWriteMetrics;

/// Metrics owned by a single task attempt.
#[derive(Debug, Default)]
pub struct TaskMetrics {
    shuffle_write: Arc<TaskWriteMetrics>,
}

impl TaskMetrics {
    /// The task's shuffle write metrics.
    pub fn shuffle_write_metrics(&self) -> Arc<TaskWriteMetrics> {
        Arc::clone(&self.shuffle_write)
    }
}

/// Identity and metrics of the executing task attempt.
#[derive(Debug, Clone)]
pub struct TaskContext {
    task_attempt_id: u64,
    attempt_number: u32,
    metrics: Arc<TaskMetrics>,
}

impl TaskContext {
    /// Creates a context for the given task attempt with fresh metrics.
    pub fn new(task_attempt_id: u64, attempt_number: u32) -> Self {
        Self {
            task_attempt_id,
            attempt_number,
            metrics: Arc::new(TaskMetrics::default()),
        }
    }

    /// Globally unique id of this task attempt.
    pub fn task_attempt_id(&self) -> u64 {
        self.task_attempt_id
    }

    /// How many times this task has been attempted, starting at 0.
    pub fn attempt_number(&self) -> u32 {
        self.attempt_number
    }

    /// Metrics owned by this task attempt.
    pub fn task_metrics(&self) -> &TaskMetrics {
        &self.metrics
    }
}
