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

// Top-level exporter handed to the ingestion front door

use super::backend::Exporter;
use crate::error::{AggregateError, BackendFailure, Result};
use crate::report::{LogType, Report};
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

/// Primary exporter plus an optional always-store copy.
///
/// Status reports and query results also go to the always-store backend,
/// whatever happens on the primary. Result reports only reach the primary.
pub struct TlsExporter {
    primary: Arc<dyn Exporter>,
    always_store: Option<Arc<dyn Exporter>>,
}

impl TlsExporter {
    pub fn new(primary: Arc<dyn Exporter>, always_store: Option<Arc<dyn Exporter>>) -> Self {
        Self {
            primary,
            always_store,
        }
    }

    pub fn primary(&self) -> &Arc<dyn Exporter> {
        &self.primary
    }

    pub fn always_store(&self) -> Option<&Arc<dyn Exporter>> {
        self.always_store.as_ref()
    }

    pub async fn export(
        &self,
        ctx: &CancellationToken,
        log_type: LogType,
        data: &[u8],
        environment: &str,
        uuid: &str,
    ) -> Result<()> {
        let secondary = match log_type {
            LogType::Status => self.always_store.as_ref(),
            _ => None,
        };

        let (primary, secondary) = tokio::join!(
            invoke(&self.primary, |e| e.export(ctx, log_type, data, environment, uuid)),
            invoke_optional(secondary, |e| e.export(ctx, log_type, data, environment, uuid)),
        );

        self.finish("export", primary, secondary)
    }

    pub async fn export_query(
        &self,
        ctx: &CancellationToken,
        data: &[u8],
        environment: &str,
        uuid: &str,
        name: &str,
        status: i32,
    ) -> Result<()> {
        let (primary, secondary) = tokio::join!(
            invoke(&self.primary, |e| {
                e.export_query(ctx, data, environment, uuid, name, status)
            }),
            invoke_optional(self.always_store.as_ref(), |e| {
                e.export_query(ctx, data, environment, uuid, name, status)
            }),
        );

        self.finish("export query", primary, secondary)
    }

    /// Route a prebuilt report by its type
    pub async fn export_report(&self, ctx: &CancellationToken, report: &Report) -> Result<()> {
        match report.query_info() {
            Some(query) => {
                self.export_query(
                    ctx,
                    report.data(),
                    report.environment(),
                    report.uuid(),
                    &query.name,
                    query.status,
                )
                .await
            }
            None => {
                self.export(
                    ctx,
                    report.log_type(),
                    report.data(),
                    report.environment(),
                    report.uuid(),
                )
                .await
            }
        }
    }

    /// Close the primary and the always-store backend, enabled or not
    pub async fn close(&self) -> Result<()> {
        let secondary = async {
            match &self.always_store {
                Some(store) => Some(store.close().await),
                None => None,
            }
        };
        let (primary, secondary) = tokio::join!(self.primary.close(), secondary);
        self.finish("close", Some(primary), secondary)
    }

    fn finish(
        &self,
        operation: &'static str,
        primary: Option<Result<()>>,
        secondary: Option<Result<()>>,
    ) -> Result<()> {
        let mut failures = Vec::new();
        if let Some(Err(err)) = primary {
            error!(exporter = self.primary.name(), error = %err, "Primary {} failed", operation);
            failures.push(BackendFailure {
                backend: self.primary.name().to_string(),
                error: err,
            });
        }
        if let (Some(Err(err)), Some(store)) = (secondary, self.always_store.as_ref()) {
            error!(exporter = store.name(), error = %err, "Always-store {} failed", operation);
            failures.push(BackendFailure {
                backend: store.name().to_string(),
                error: err,
            });
        }
        AggregateError::into_result(operation, failures)
    }
}

/// Run `call` against an enabled exporter; `None` when it was skipped
async fn invoke<'a, F, Fut>(exporter: &'a Arc<dyn Exporter>, call: F) -> Option<Result<()>>
where
    F: FnOnce(&'a Arc<dyn Exporter>) -> Fut,
    Fut: Future<Output = Result<()>>,
{
    if !exporter.is_enabled() {
        debug!("Skipping disabled exporter {}", exporter.name());
        return None;
    }
    Some(call(exporter).await)
}

async fn invoke_optional<'a, F, Fut>(
    exporter: Option<&'a Arc<dyn Exporter>>,
    call: F,
) -> Option<Result<()>>
where
    F: FnOnce(&'a Arc<dyn Exporter>) -> Fut,
    Fut: Future<Output = Result<()>>,
{
    match exporter {
        Some(exporter) => invoke(exporter, call).await,
        None => None,
    }
}
