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

// Fan-out exporter: one call reaches every enabled member concurrently

use super::backend::{Exporter, ExporterState};
use crate::error::{AggregateError, BackendFailure, Result};
use crate::report::LogType;
use crate::settings::SettingsProvider;
use async_trait::async_trait;
use futures::future::join_all;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

/// Sends every call to all enabled member exporters.
///
/// Members are invoked concurrently and never short-circuited: a failing
/// member does not stop its siblings. Failures come back as one
/// [`AggregateError`] naming each failing member.
pub struct MultiExporter {
    state: ExporterState,
    exporters: RwLock<Vec<Arc<dyn Exporter>>>,
}

impl MultiExporter {
    pub fn new(exporters: Vec<Arc<dyn Exporter>>) -> Self {
        Self {
            state: ExporterState::new("multi"),
            exporters: RwLock::new(exporters),
        }
    }

    /// Append a member. Calls already in flight keep their own snapshot.
    pub async fn add_exporter(&self, exporter: Arc<dyn Exporter>) {
        debug!("Adding exporter {} to fan-out", exporter.name());
        self.exporters.write().await.push(exporter);
    }

    /// Snapshot of the current members, in insertion order
    pub async fn exporters(&self) -> Vec<Arc<dyn Exporter>> {
        self.exporters.read().await.clone()
    }

    async fn enabled_members(&self) -> Vec<Arc<dyn Exporter>> {
        self.exporters
            .read()
            .await
            .iter()
            .filter(|e| e.is_enabled())
            .cloned()
            .collect()
    }
}

/// Pair each member's name with its outcome and keep the failures
fn collect_failures(
    members: &[Arc<dyn Exporter>],
    results: Vec<Result<()>>,
    operation: &str,
) -> Vec<BackendFailure> {
    members
        .iter()
        .zip(results)
        .filter_map(|(member, result)| {
            result.err().map(|err| {
                error!(exporter = member.name(), error = %err, "{} failed", operation);
                BackendFailure {
                    backend: member.name().to_string(),
                    error: err,
                }
            })
        })
        .collect()
}

#[async_trait]
impl Exporter for MultiExporter {
    async fn export(
        &self,
        ctx: &CancellationToken,
        log_type: LogType,
        data: &[u8],
        environment: &str,
        uuid: &str,
    ) -> Result<()> {
        if !self.is_enabled() {
            return Ok(());
        }

        let members = self.enabled_members().await;
        let results = join_all(
            members
                .iter()
                .map(|member| member.export(ctx, log_type, data, environment, uuid)),
        )
        .await;

        AggregateError::into_result("export", collect_failures(&members, results, "Export"))
    }

    async fn export_query(
        &self,
        ctx: &CancellationToken,
        data: &[u8],
        environment: &str,
        uuid: &str,
        name: &str,
        status: i32,
    ) -> Result<()> {
        if !self.is_enabled() {
            return Ok(());
        }

        let members = self.enabled_members().await;
        let results = join_all(
            members
                .iter()
                .map(|member| member.export_query(ctx, data, environment, uuid, name, status)),
        )
        .await;

        AggregateError::into_result(
            "export query",
            collect_failures(&members, results, "Export query"),
        )
    }

    /// Configure every member, including disabled ones
    async fn configure(&self, settings: &dyn SettingsProvider) -> Result<()> {
        self.state.apply_settings(settings);

        let members = self.exporters().await;
        let results = join_all(members.iter().map(|member| member.configure(settings))).await;

        AggregateError::into_result(
            "configuration",
            collect_failures(&members, results, "Configure"),
        )
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

    async fn close(&self) -> Result<()> {
        let members = self.exporters().await;
        let results = join_all(members.iter().map(|member| member.close())).await;

        AggregateError::into_result("close", collect_failures(&members, results, "Close"))
    }
}
