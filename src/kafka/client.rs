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

// Kafka client configuration with SASL and TLS validation

use crate::config::KafkaConfig;
use crate::error::{ExportError, Result};
use rdkafka::ClientConfig;
use std::str::FromStr;

/// Supported SASL challenge-response mechanisms
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaslMechanism {
    ScramSha256,
    ScramSha512,
}

impl SaslMechanism {
    /// Convert to the string value expected by librdkafka
    pub fn to_kafka_value(&self) -> &'static str {
        match self {
            SaslMechanism::ScramSha256 => "SCRAM-SHA-256",
            SaslMechanism::ScramSha512 => "SCRAM-SHA-512",
        }
    }
}

impl FromStr for SaslMechanism {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "SCRAM-SHA-256" => Ok(SaslMechanism::ScramSha256),
            "SCRAM-SHA-512" => Ok(SaslMechanism::ScramSha512),
            other => Err(ExportError::Configuration(format!(
                "unknown SASL mechanism '{}'",
                other
            ))),
        }
    }
}

/// Build an rdkafka `ClientConfig`, rejecting incomplete credentials and
/// unreadable CA files before any client is created.
pub fn build_client_config(config: &KafkaConfig) -> Result<ClientConfig> {
    let mut client = ClientConfig::new();

    client
        .set("bootstrap.servers", &config.bootstrap_server)
        .set("client.id", &config.client_id)
        .set("message.timeout.ms", config.message_timeout_ms.to_string());

    if config.connection_timeout_ms > 0 {
        client.set(
            "socket.connection.setup.timeout.ms",
            config.connection_timeout_ms.to_string(),
        );
    }

    let sasl = &config.sasl;
    let use_sasl = !sasl.mechanism.is_empty();
    if use_sasl {
        if sasl.username.is_empty() {
            return Err(ExportError::Configuration(
                "SASL mechanism requires a username".to_string(),
            ));
        }
        if sasl.password.is_empty() {
            return Err(ExportError::Configuration(
                "SASL mechanism requires a password".to_string(),
            ));
        }

        let mechanism: SaslMechanism = sasl.mechanism.parse()?;
        client
            .set("sasl.mechanism", mechanism.to_kafka_value())
            .set("sasl.username", &sasl.username)
            .set("sasl.password", &sasl.password);
    }

    let use_tls = !config.ssl_ca_location.is_empty();
    if use_tls {
        std::fs::read(&config.ssl_ca_location).map_err(|e| {
            ExportError::Configuration(format!(
                "failed to read CA Cert from '{}': {}",
                config.ssl_ca_location, e
            ))
        })?;
        client.set("ssl.ca.location", &config.ssl_ca_location);
    }

    let protocol = match (use_sasl, use_tls) {
        (true, true) => "sasl_ssl",
        (true, false) => "sasl_plaintext",
        (false, true) => "ssl",
        (false, false) => "plaintext",
    };
    client.set("security.protocol", protocol);

    Ok(client)
}
