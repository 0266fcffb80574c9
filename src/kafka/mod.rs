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

// Kafka plumbing shared by the exporter backend and the batching logger
//
// - `client`: ClientConfig construction with SASL/TLS checks
// - `producer`: record model and the producer trait (rdkafka implementation)
// - `logger`: payload splitting and batch submission for the ingestion path

pub mod client;
pub mod logger;
pub mod producer;

pub use client::{build_client_config, SaslMechanism};
pub use logger::KafkaLogger;
pub use producer::{
    BrokerRecord, DeliveryReport, ProduceResults, RdKafkaProducer, RecordProducer,
    HEADER_ENVIRONMENT, HEADER_LOG_TYPE, HEADER_QUERY_NAME, HEADER_STATUS,
};
