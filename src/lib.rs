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

#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

/// The current version of the crate, derived from the Cargo package version.
pub const RSS_SHUFFLE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Shuffle execution backends and the name-keyed factory that constructs them.
pub mod backend;
/// Client surface for pushing shuffle data to the remote shuffle service.
pub mod client;
/// Configuration options and settings for the shuffle layer.
pub mod config;
/// Per-request routing of shuffle write requests to a backend writer.
pub mod dispatch;
/// Error types and result definitions for shuffle dispatch operations.
pub mod error;
/// Shuffle handles and the dependency variants they carry.
pub mod handle;
/// Shuffle write metrics contract and implementations.
pub mod metrics;
/// Lazy, construct-once registry of backend instances.
pub mod registry;
/// Task execution context consumed by the dispatch layer.
pub mod task;
/// Shuffle writer capability and the writers produced by the built-in backends.
pub mod writer;
