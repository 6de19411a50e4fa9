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

//! Shuffle handles
//!
//! A shuffle handle is the opaque token produced by shuffle registration.
//! The dispatch layer only recognizes [`RssShuffleHandle`]; it reaches the
//! concrete type through [`ShuffleHandle::as_any`], the same way a physical
//! plan node is recovered from an `ExecutionPlan` trait object.

use std::any::Any;
use std::fmt::Debug;

/// Opaque token identifying a registered shuffle stage.
pub trait ShuffleHandle: Debug + Send + Sync {
    /// Returns the handle as [`Any`] so it can be downcast to its
    /// concrete type.
    fn as_any(&self) -> &dyn Any;

    /// Id of the shuffle stage this handle refers to.
    fn shuffle_id(&self) -> usize;
}

/// How the records of a shuffle dependency are encoded.
#[derive(Debug, Clone)]
pub enum ShuffleDependency {
    /// Records are encoded as vectorized columnar batches.
    Columnar(ColumnarDependency),
    /// Records are encoded row by row.
    RowBased(RowDependency),
}

/// A shuffle dependency whose records are columnar batches.
#[derive(Debug, Clone)]
pub struct ColumnarDependency {
    /// Number of reduce partitions of the shuffle.
    pub num_partitions: usize,
}

/// A shuffle dependency whose records are individual rows.
#[derive(Debug, Clone)]
pub struct RowDependency {
    /// Number of reduce partitions of the shuffle.
    pub num_partitions: usize,
}

/// Handle for a shuffle registered with the remote shuffle service.
///
/// Owned by the registration subsystem; the dispatch layer reads it and
/// never mutates it.
#[derive(Debug)]
pub struct RssShuffleHandle {
    app_id: String,
    shuffle_id: usize,
    dependency: ShuffleDependency,
}

impl RssShuffleHandle {
    /// Creates a handle for the given application and shuffle stage.
    pub fn new(
        app_id: impl Into<String>,
        shuffle_id: usize,
        dependency: ShuffleDependency,
    ) -> Self {
        Self {
            app_id: app_id.into(),
            shuffle_id,
            dependency,
        }
    }

    /// The application this shuffle belongs to.
    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    /// The dependency carried by this handle.
    pub fn dependency(&self) -> &ShuffleDependency {
        &self.dependency
    }
}

impl ShuffleHandle for RssShuffleHandle {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn shuffle_id(&self) -> usize {
        self.shuffle_id
    }
}
