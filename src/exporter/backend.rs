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

// Exporter trait shared by every log destination

use crate::error::Result;
use crate::report::LogType;
use crate::settings::SettingsProvider;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio_util::sync::CancellationToken;

/// Generic exporter trait for agent logs
///
/// Every destination (console, object storage, broker, fan-out) implements
/// this trait so the ingestion path can ship reports without knowing where
/// they end up. A disabled exporter must return `Ok(())` from `export` and
/// `export_query` without touching its transport.
#[async_trait]
pub trait Exporter: Send + Sync {
    /// Ship one status or result payload
    ///
    /// # Arguments
    /// * `ctx` - Cancellation for this call
    /// * `log_type` - Report type of the payload
    /// * `data` - Raw payload as received from the agent
    /// * `environment` - Environment the agent enrolled in
    /// * `uuid` - Agent identifier
    async fn export(
        &self,
        ctx: &CancellationToken,
        log_type: LogType,
        data: &[u8],
        environment: &str,
        uuid: &str,
    ) -> Result<()>;

    /// Ship one on-demand query result
    async fn export_query(
        &self,
        ctx: &CancellationToken,
        data: &[u8],
        environment: &str,
        uuid: &str,
        name: &str,
        status: i32,
    ) -> Result<()>;

    /// One-time setup from live settings, before first use
    async fn configure(&self, settings: &dyn SettingsProvider) -> Result<()>;

    fn is_enabled(&self) -> bool;

    fn set_enabled(&self, enabled: bool);

    /// Stable identifier used in logs and error attribution
    fn name(&self) -> &str;

    /// Release held resources. Exporters without any keep the default.
    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// Name and runtime flags embedded by every concrete exporter
#[derive(Debug)]
pub struct ExporterState {
    name: String,
    enabled: AtomicBool,
    debug: AtomicBool,
}

impl ExporterState {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enabled: AtomicBool::new(true),
            debug: AtomicBool::new(false),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Release);
    }

    pub fn debug(&self) -> bool {
        self.debug.load(Ordering::Relaxed)
    }

    pub fn set_debug(&self, debug: bool) {
        self.debug.store(debug, Ordering::Relaxed);
    }

    /// Pull this exporter's enabled and debug flags from the settings
    pub fn apply_settings(&self, settings: &dyn SettingsProvider) {
        self.set_enabled(settings.exporter_enabled(&self.name));
        self.set_debug(settings.debug_enabled(&self.name));
    }
}
