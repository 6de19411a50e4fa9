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

//! Shuffle dispatch error types

use std::{
    error::Error,
    fmt::{Display, Formatter},
    result,
};

/// Result type alias for shuffle dispatch operations.
pub type Result<T> = result::Result<T, ShuffleError>;

/// Error types for the shuffle write dispatch layer.
#[derive(Debug)]
pub enum ShuffleError {
    /// A shuffle backend could not be constructed. Backend identity is fixed
    /// by configuration, so this indicates a deployment error rather than a
    /// transient condition; the caller's task attempt fails.
    BackendInitialization(String),
    /// The shuffle handle passed to the dispatcher is not a recognized
    /// variant. Indicates a caller/integration bug.
    UnexpectedHandle(String),
    /// Configuration error with invalid settings.
    Configuration(String),
    /// General error with a descriptive message.
    General(String),
    /// Internal error indicating a bug or unexpected state.
    Internal(String),
}

/// Creates a general shuffle error from a string message.
pub fn shuffle_error(message: &str) -> ShuffleError {
    ShuffleError::General(message.to_owned())
}

impl From<String> for ShuffleError {
    fn from(e: String) -> Self {
        ShuffleError::General(e)
    }
}

impl Display for ShuffleError {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            ShuffleError::BackendInitialization(desc) => {
                write!(f, "Backend initialization error: {desc}")
            }
            ShuffleError::UnexpectedHandle(desc) => {
                write!(f, "Unexpected shuffle handle: {desc}")
            }
            ShuffleError::Configuration(desc) => {
                write!(f, "Configuration error: {desc}")
            }
            ShuffleError::General(desc) => write!(f, "General error: {desc}"),
            ShuffleError::Internal(desc) => {
                write!(f, "Internal shuffle error: {desc}")
            }
        }
    }
}

impl Error for ShuffleError {}
