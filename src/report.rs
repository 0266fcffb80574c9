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

// Agent report model

use crate::error::ExportError;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of agent report, which decides how its payload is parsed and routed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogType {
    /// Periodic health/status log, delivered as a JSON array
    Status,
    /// Scheduled query output, delivered as a JSON array
    Result,
    /// On-demand query output, delivered as one JSON object
    Query,
}

impl LogType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogType::Status => "status",
            LogType::Result => "result",
            LogType::Query => "query",
        }
    }
}

impl fmt::Display for LogType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogType {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "status" => Ok(LogType::Status),
            "result" => Ok(LogType::Result),
            "query" => Ok(LogType::Query),
            other => Err(ExportError::UnsupportedLogType(other.to_string())),
        }
    }
}

/// A single agent report as handed over by the ingestion front door.
///
/// Immutable once built: environment and uuid travel untouched to every
/// backend. `query` is only set for [`LogType::Query`] reports.
#[derive(Debug, Clone)]
pub struct Report {
    log_type: LogType,
    environment: String,
    uuid: String,
    data: Bytes,
    query: Option<QueryInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryInfo {
    pub name: String,
    pub status: i32,
}

impl Report {
    /// Build a status or result report. Query reports go through [`Report::query`].
    pub fn new(
        log_type: LogType,
        environment: impl Into<String>,
        uuid: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Result<Self, ExportError> {
        if log_type == LogType::Query {
            return Err(ExportError::UnsupportedLogType(
                "query reports need a query name and status".to_string(),
            ));
        }
        Ok(Self {
            log_type,
            environment: environment.into(),
            uuid: uuid.into(),
            data: data.into(),
            query: None,
        })
    }

    pub fn query(
        environment: impl Into<String>,
        uuid: impl Into<String>,
        name: impl Into<String>,
        status: i32,
        data: impl Into<Bytes>,
    ) -> Self {
        Self {
            log_type: LogType::Query,
            environment: environment.into(),
            uuid: uuid.into(),
            data: data.into(),
            query: Some(QueryInfo {
                name: name.into(),
                status,
            }),
        }
    }

    pub fn log_type(&self) -> LogType {
        self.log_type
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn uuid(&self) -> &str {
        &self.uuid
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn query_info(&self) -> Option<&QueryInfo> {
        self.query.as_ref()
    }
}
