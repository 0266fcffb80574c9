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

// Exporter abstraction layer
//
// Console, S3 and Kafka backends behind one trait, plus the fan-out and
// top-level combinators built on top of it.

pub mod backend;
pub mod content_type;
pub mod factory;
pub mod kafka;
pub mod multi;
pub mod s3;
pub mod stdout;
pub mod tls;

pub use backend::{Exporter, ExporterState};
pub use content_type::detect_content_type;
pub use factory::ExporterFactory;
pub use kafka::KafkaExporter;
pub use multi::MultiExporter;
pub use s3::{object_key, query_object_key, AwsS3Uploader, ObjectUploader, S3Exporter};
pub use stdout::StdoutExporter;
pub use tls::TlsExporter;
