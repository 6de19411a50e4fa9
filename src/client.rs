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

//! Remote shuffle service write client
//!
//! The wire protocol is owned by the client implementation; the dispatch
//! layer only consumes this contract.

use std::fmt::Debug;

use crate::error::Result;

/// Client surface for streaming shuffle data to the remote shuffle service.
pub trait ShuffleWriteClient: Send + Sync + Debug {
    /// Pushes one serialized block of shuffle data for a reduce partition.
    fn push_block(
        &self,
        app_id: &str,
        shuffle_id: usize,
        task_id: &str,
        partition_id: usize,
        data: &[u8],
    ) -> Result<()>;

    /// Reports that the task has finished writing all of its blocks.
    fn finalize_task(&self, app_id: &str, shuffle_id: usize, task_id: &str)
        -> Result<()>;
}
