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

// S3 exporter: one object per record

use super::backend::{Exporter, ExporterState};
use super::content_type::detect_content_type;
use crate::config::{ConfigLoader, S3Config, LOGGER_S3};
use crate::error::{ExportError, Result};
use crate::report::LogType;
use crate::settings::SettingsProvider;
use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Object key for a status or result record:
/// `{environment}/{log_type}/{uuid}:{unix_millis}.json`
pub fn object_key(environment: &str, log_type: LogType, uuid: &str, unix_millis: i64) -> String {
    format!("{}/{}/{}:{}.json", environment, log_type, uuid, unix_millis)
}

/// Object key for a query result:
/// `{environment}/query/{name}:{uuid}:{status}:{unix_millis}.json`
pub fn query_object_key(
    environment: &str,
    name: &str,
    uuid: &str,
    status: i32,
    unix_millis: i64,
) -> String {
    format!(
        "{}/query/{}:{}:{}:{}.json",
        environment, name, uuid, status, unix_millis
    )
}

/// Single-object upload, returning the stored location
#[async_trait]
pub trait ObjectUploader: Send + Sync {
    async fn upload(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        content_type: &str,
    ) -> Result<String>;
}

/// Uploader backed by the AWS SDK
pub struct AwsS3Uploader {
    client: aws_sdk_s3::Client,
}

impl AwsS3Uploader {
    pub async fn new(config: &S3Config) -> Self {
        let mut loader =
            aws_config::defaults(BehaviorVersion::latest()).region(Region::new(config.region.clone()));

        // Static keys when configured, the default provider chain otherwise
        if !config.access_key.is_empty() {
            loader = loader.credentials_provider(Credentials::new(
                config.access_key.clone(),
                config.secret_access_key.clone(),
                None,
                None,
                "fleet-export",
            ));
        }
        let sdk_config = loader.load().await;

        let mut builder = aws_sdk_s3::config::Builder::from(&sdk_config);
        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        Self {
            client: aws_sdk_s3::Client::from_conf(builder.build()),
        }
    }
}

#[async_trait]
impl ObjectUploader for AwsS3Uploader {
    async fn upload(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        content_type: &str,
    ) -> Result<String> {
        let content_length = body.len() as i64;
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(body))
            .content_length(content_length)
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| ExportError::Transport(DisplayErrorContext(&e).to_string()))?;

        Ok(format!("s3://{}/{}", bucket, key))
    }
}

pub struct S3Exporter {
    state: ExporterState,
    bucket: String,
    uploader: Arc<dyn ObjectUploader>,
}

impl S3Exporter {
    pub async fn new(config: S3Config) -> Result<Self> {
        if config.bucket.is_empty() {
            return Err(ExportError::Configuration(
                "S3 exporter requires a bucket".to_string(),
            ));
        }
        let uploader = AwsS3Uploader::new(&config).await;
        Ok(Self::with_uploader(config.bucket, Arc::new(uploader)))
    }

    /// Read the `s3` section of an external logger file
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        info!("Loading S3 config from {}", path.as_ref().display());
        let config: S3Config = ConfigLoader::load_backend_section(path, LOGGER_S3)
            .map_err(|e| ExportError::Configuration(format!("{:#}", e)))?;
        Self::new(config).await
    }

    pub fn with_uploader(bucket: impl Into<String>, uploader: Arc<dyn ObjectUploader>) -> Self {
        Self {
            state: ExporterState::new(LOGGER_S3),
            bucket: bucket.into(),
            uploader,
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn set_debug(&self, debug: bool) {
        self.state.set_debug(debug);
    }

    async fn put(&self, ctx: &CancellationToken, key: &str, data: &[u8]) -> Result<String> {
        let content_type = detect_content_type(data);
        let body = Bytes::copy_from_slice(data);

        tokio::select! {
            biased;
            _ = ctx.cancelled() => Err(ExportError::Cancelled),
            result = self.uploader.upload(&self.bucket, key, body, &content_type) => result,
        }
    }
}

fn upload_error(what: &str, err: ExportError) -> ExportError {
    match err {
        ExportError::Transport(msg) => {
            ExportError::Transport(format!("failed to upload {} to S3: {}", what, msg))
        }
        other => other,
    }
}

#[async_trait]
impl Exporter for S3Exporter {
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

        if self.state.debug() {
            debug!(
                log_type = %log_type,
                environment,
                uuid,
                size = data.len(),
                "Sending data to S3"
            );
        }

        let key = object_key(
            environment,
            log_type,
            uuid,
            chrono::Utc::now().timestamp_millis(),
        );
        let location = self
            .put(ctx, &key, data)
            .await
            .map_err(|e| upload_error("data", e))?;

        if self.state.debug() {
            debug!(location = %location, key = %key, "Successfully uploaded to S3");
        }
        Ok(())
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

        if self.state.debug() {
            debug!(
                environment,
                uuid,
                name,
                status,
                size = data.len(),
                "Sending query result to S3"
            );
        }

        let key = query_object_key(
            environment,
            name,
            uuid,
            status,
            chrono::Utc::now().timestamp_millis(),
        );
        let location = self
            .put(ctx, &key, data)
            .await
            .map_err(|e| upload_error("query result", e))?;

        if self.state.debug() {
            debug!(location = %location, key = %key, "Successfully uploaded query result to S3");
        }
        Ok(())
    }

    async fn configure(&self, settings: &dyn SettingsProvider) -> Result<()> {
        info!("Configuring S3 exporter");
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
