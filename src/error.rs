// Copyright 2025 coScene
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

// Error types shared by every exporter backend

use crate::report::LogType;
use std::fmt;
use thiserror::Error;

/// Errors produced while configuring or running an exporter
#[derive(Error, Debug)]
pub enum ExportError {
    /// Missing credential, unreadable certificate, unsupported mechanism.
    /// Fatal at construction time.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Network, authentication or remote service failure during a transmit call
    #[error("transport error: {0}")]
    Transport(String),

    /// Payload is not valid JSON for its declared log type
    #[error("failed to parse {log_type} payload: {source}")]
    Parse {
        log_type: LogType,
        #[source]
        source: serde_json::Error,
    },

    #[error("unsupported log type: {0}")]
    UnsupportedLogType(String),

    /// The caller cancelled the export before the transport answered
    #[error("export cancelled")]
    Cancelled,

    /// The backend has been closed and can no longer transmit
    #[error("exporter {0} is closed")]
    Closed(String),

    #[error(transparent)]
    Aggregate(#[from] AggregateError),
}

impl ExportError {
    pub fn is_configuration(&self) -> bool {
        matches!(self, ExportError::Configuration(_))
    }

    /// Failing backend names when this is an aggregate, empty otherwise
    pub fn failed_backends(&self) -> Vec<&str> {
        match self {
            ExportError::Aggregate(aggregate) => aggregate.failed_backends(),
            _ => Vec::new(),
        }
    }
}

/// One backend's failure inside a fan-out call
#[derive(Debug)]
pub struct BackendFailure {
    pub backend: String,
    pub error: ExportError,
}

impl fmt::Display for BackendFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "exporter {}: {}", self.backend, self.error)
    }
}

/// Every failure collected from a call that reached several backends
#[derive(Error, Debug)]
#[error("{operation} errors: [{}]", join_failures(.failures))]
pub struct AggregateError {
    pub operation: &'static str,
    pub failures: Vec<BackendFailure>,
}

impl AggregateError {
    pub fn new(operation: &'static str, failures: Vec<BackendFailure>) -> Self {
        Self {
            operation,
            failures,
        }
    }

    pub fn failed_backends(&self) -> Vec<&str> {
        self.failures.iter().map(|f| f.backend.as_str()).collect()
    }

    /// `Ok(())` when nothing failed, otherwise the aggregate as an error
    pub fn into_result(operation: &'static str, failures: Vec<BackendFailure>) -> Result<()> {
        if failures.is_empty() {
            Ok(())
        } else {
            Err(ExportError::Aggregate(Self::new(operation, failures)))
        }
    }
}

fn join_failures(failures: &[BackendFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

pub type Result<T> = std::result::Result<T, ExportError>;
