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

// Fleet telemetry exporter
//
// Forwards agent reports (status logs, scheduled query results and
// on-demand query results) to one or more sinks:
// - Console, S3 and Kafka backends behind a single exporter trait
// - Concurrent fan-out with per-backend error aggregation
// - A top-level exporter with an optional always-store copy
// - A batching Kafka logger that splits payloads into one record per entry

pub mod config;
pub mod error;
pub mod exporter;
pub mod kafka;
pub mod report;
pub mod settings;

// Re-export main types
pub use config::{load_config, load_config_with_env, ExportConfig};
pub use error::{AggregateError, BackendFailure, ExportError, Result};
pub use exporter::{
    Exporter, ExporterFactory, KafkaExporter, MultiExporter, S3Exporter, StdoutExporter,
    TlsExporter,
};
pub use kafka::KafkaLogger;
pub use report::{LogType, Report};
pub use settings::{SettingsProvider, StaticSettings};
