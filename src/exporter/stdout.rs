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

// Console exporter writing one JSON line per record

use super::backend::{Exporter, ExporterState};
use crate::error::{ExportError, Result};
use crate::report::LogType;
use crate::settings::SettingsProvider;
use async_trait::async_trait;
use serde::Serialize;
use std::io::Write;
use std::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Structured console entry
#[derive(Debug, Serialize)]
struct ConsoleEntry<'a> {
    #[serde(rename = "type")]
    log_type: &'a str,
    environment: &'a str,
    uuid: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<i32>,
    size: usize,
    message: String,
    data: String,
}

pub struct StdoutExporter {
    state: ExporterState,
    writer: Mutex<Box<dyn Write + Send>>,
}

impl StdoutExporter {
    pub fn new() -> Self {
        Self::with_writer(Box::new(std::io::stdout()))
    }

    /// Write entries somewhere other than stdout
    pub fn with_writer(writer: Box<dyn Write + Send>) -> Self {
        Self {
            state: ExporterState::new("stdout"),
            writer: Mutex::new(writer),
        }
    }

    fn write_entry(&self, entry: &ConsoleEntry<'_>) -> Result<()> {
        info!(
            log_type = entry.log_type,
            environment = entry.environment,
            uuid = entry.uuid,
            size = entry.size,
            "{}",
            entry.message
        );

        let mut line = serde_json::to_vec(entry)
            .map_err(|e| ExportError::Transport(format!("failed to encode console entry: {}", e)))?;
        line.push(b'\n');

        let mut writer = self
            .writer
            .lock()
            .map_err(|_| ExportError::Transport("console writer poisoned".to_string()))?;
        writer
            .write_all(&line)
            .and_then(|_| writer.flush())
            .map_err(|e| ExportError::Transport(format!("failed to write to console: {}", e)))
    }
}

impl Default for StdoutExporter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Exporter for StdoutExporter {
    async fn export(
        &self,
        _ctx: &CancellationToken,
        log_type: LogType,
        data: &[u8],
        environment: &str,
        uuid: &str,
    ) -> Result<()> {
        if !self.is_enabled() {
            return Ok(());
        }

        let label = match log_type {
            LogType::Status => "Status",
            LogType::Result => "Result",
            LogType::Query => {
                return Err(ExportError::UnsupportedLogType(log_type.to_string()));
            }
        };

        self.write_entry(&ConsoleEntry {
            log_type: log_type.as_str(),
            environment,
            uuid,
            name: None,
            status: None,
            size: data.len(),
            message: format!("{}: {}:{} - {} bytes", label, environment, uuid, data.len()),
            data: String::from_utf8_lossy(data).into_owned(),
        })
    }

    async fn export_query(
        &self,
        _ctx: &CancellationToken,
        data: &[u8],
        environment: &str,
        uuid: &str,
        name: &str,
        status: i32,
    ) -> Result<()> {
        if !self.is_enabled() {
            return Ok(());
        }

        self.write_entry(&ConsoleEntry {
            log_type: LogType::Query.as_str(),
            environment,
            uuid,
            name: Some(name),
            status: Some(status),
            size: data.len(),
            message: format!(
                "Query: {}:{} - {}:{} - {} bytes",
                name,
                status,
                environment,
                uuid,
                data.len()
            ),
            data: String::from_utf8_lossy(data).into_owned(),
        })
    }

    async fn configure(&self, settings: &dyn SettingsProvider) -> Result<()> {
        info!("No configuration needed for stdout exporter");
        self.state.apply_settings(settings);
        Ok(())
    }

    fn is_enabled(&self) -> bool {
        self.state.is_enabled()
    }

    fn set_enabled(&self, enabled: bool) {
        self.state.set_enabled(enabled);
    }

    fn name(&self) -> &str {
        self.state.name()
    }
}
