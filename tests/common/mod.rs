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

// Test doubles shared by the integration suites

#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use fleet_export::error::{ExportError, Result};
use fleet_export::exporter::{Exporter, ExporterState, ObjectUploader};
use fleet_export::kafka::{BrokerRecord, DeliveryReport, RecordProducer};
use fleet_export::report::LogType;
use fleet_export::settings::SettingsProvider;
use std::io::Write;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Exporter that counts its calls and can be told to fail
pub struct MockExporter {
    state: ExporterState,
    fail: AtomicBool,
    delay: Option<Duration>,
    pub exports: AtomicUsize,
    pub queries: AtomicUsize,
    pub configures: AtomicUsize,
    pub closes: AtomicUsize,
}

impl MockExporter {
    pub fn new(name: &str) -> Arc<Self> {
        Arc::new(Self::build(name, false, None))
    }

    pub fn failing(name: &str) -> Arc<Self> {
        Arc::new(Self::build(name, true, None))
    }

    /// Takes `delay` to answer each export
    pub fn slow(name: &str, delay: Duration) -> Arc<Self> {
        Arc::new(Self::build(name, false, Some(delay)))
    }

    fn build(name: &str, fail: bool, delay: Option<Duration>) -> Self {
        Self {
            state: ExporterState::new(name),
            fail: AtomicBool::new(fail),
            delay,
            exports: AtomicUsize::new(0),
            queries: AtomicUsize::new(0),
            configures: AtomicUsize::new(0),
            closes: AtomicUsize::new(0),
        }
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn export_count(&self) -> usize {
        self.exports.load(Ordering::SeqCst)
    }

    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    async fn outcome(&self) -> Result<()> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail.load(Ordering::SeqCst) {
            Err(ExportError::Transport(format!("{} unavailable", self.state.name())))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Exporter for MockExporter {
    async fn export(
        &self,
        _ctx: &CancellationToken,
        _log_type: LogType,
        _data: &[u8],
        _environment: &str,
        _uuid: &str,
    ) -> Result<()> {
        if !self.is_enabled() {
            return Ok(());
        }
        self.exports.fetch_add(1, Ordering::SeqCst);
        self.outcome().await
    }

    async fn export_query(
        &self,
        _ctx: &CancellationToken,
        _data: &[u8],
        _environment: &str,
        _uuid: &str,
        _name: &str,
        _status: i32,
    ) -> Result<()> {
        if !self.is_enabled() {
            return Ok(());
        }
        self.queries.fetch_add(1, Ordering::SeqCst);
        self.outcome().await
    }

    async fn configure(&self, settings: &dyn SettingsProvider) -> Result<()> {
        self.configures.fetch_add(1, Ordering::SeqCst);
        self.state.apply_settings(settings);
        if self.fail.load(Ordering::SeqCst) {
            return Err(ExportError::Configuration("bad settings".to_string()));
        }
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

    async fn close(&self) -> Result<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Upcast mocks for the combinators
pub fn as_exporters(mocks: &[Arc<MockExporter>]) -> Vec<Arc<dyn Exporter>> {
    mocks
        .iter()
        .map(|mock| mock.clone() as Arc<dyn Exporter>)
        .collect()
}

/// Producer that records everything it is asked to send
#[derive(Default)]
pub struct MockProducer {
    records: Mutex<Vec<BrokerRecord>>,
    fail: AtomicBool,
    /// Never acknowledge, so only cancellation ends a call
    hang: AtomicBool,
    pub flushes: AtomicUsize,
}

impl MockProducer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing() -> Arc<Self> {
        let producer = Self::default();
        producer.fail.store(true, Ordering::SeqCst);
        Arc::new(producer)
    }

    pub fn hanging() -> Arc<Self> {
        let producer = Self::default();
        producer.hang.store(true, Ordering::SeqCst);
        Arc::new(producer)
    }

    pub fn records(&self) -> Vec<BrokerRecord> {
        self.records.lock().unwrap().clone()
    }

    pub fn flush_count(&self) -> usize {
        self.flushes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RecordProducer for MockProducer {
    async fn produce(&self, record: BrokerRecord) -> Result<DeliveryReport> {
        if self.hang.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(ExportError::Transport("broker unreachable".to_string()));
        }
        let mut records = self.records.lock().unwrap();
        records.push(record);
        Ok(DeliveryReport {
            partition: 0,
            offset: records.len() as i64 - 1,
        })
    }

    fn flush(&self, _timeout: Duration) -> Result<()> {
        self.flushes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// One object handed to [`MockUploader`]
#[derive(Debug, Clone)]
pub struct UploadedObject {
    pub bucket: String,
    pub key: String,
    pub body: Bytes,
    pub content_type: String,
}

#[derive(Default)]
pub struct MockUploader {
    objects: Mutex<Vec<UploadedObject>>,
    fail: AtomicBool,
}

impl MockUploader {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing() -> Arc<Self> {
        let uploader = Self::default();
        uploader.fail.store(true, Ordering::SeqCst);
        Arc::new(uploader)
    }

    pub fn objects(&self) -> Vec<UploadedObject> {
        self.objects.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectUploader for MockUploader {
    async fn upload(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        content_type: &str,
    ) -> Result<String> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(ExportError::Transport("AccessDenied".to_string()));
        }
        self.objects.lock().unwrap().push(UploadedObject {
            bucket: bucket.to_string(),
            key: key.to_string(),
            body,
            content_type: content_type.to_string(),
        });
        Ok(format!("s3://{}/{}", bucket, key))
    }
}

/// Cloneable in-memory writer for capturing console output
#[derive(Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<serde_json::Value> {
        let content = self.0.lock().unwrap().clone();
        String::from_utf8(content)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
