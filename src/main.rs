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

use anyhow::{bail, Context, Result};
use clap::Parser;
use fleet_export::config::{ExportConfig, LoggingConfig};
use fleet_export::{
    load_config_with_env, ExporterFactory, KafkaLogger, LogType, Report, SettingsProvider,
    StaticSettings,
};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Fleet Export - Ship agent reports to the configured log sinks
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/default.yaml")]
    config: PathBuf,

    /// Report type: status, result or query
    #[arg(short = 't', long)]
    log_type: LogType,

    /// Environment the agent enrolled in
    #[arg(short, long)]
    environment: String,

    /// Agent identifier
    #[arg(short, long)]
    uuid: String,

    /// Payload file, as received from the agent
    #[arg(short, long)]
    file: PathBuf,

    /// Query name, required for query reports
    #[arg(long)]
    query_name: Option<String>,

    /// Query status code
    #[arg(long, default_value_t = 0)]
    status: i32,

    /// Logger selector (overrides config file)
    #[arg(short, long)]
    logger: Option<String>,

    /// Send through the batching Kafka logger, one record per log entry
    #[arg(long)]
    batch: bool,
}

fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .context("Invalid log level")?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let result = match logging.format.as_str() {
        "json" => builder.json().try_init(),
        _ => builder.try_init(),
    };
    result.map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))
}

fn build_report(args: &Args, data: Vec<u8>) -> Result<Report> {
    match args.log_type {
        LogType::Query => {
            let Some(name) = &args.query_name else {
                bail!("--query-name is required for query reports");
            };
            Ok(Report::query(
                &args.environment,
                &args.uuid,
                name,
                args.status,
                data,
            ))
        }
        log_type => Ok(Report::new(log_type, &args.environment, &args.uuid, data)?),
    }
}

async fn send_batch(config: &ExportConfig, settings: &StaticSettings, report: &Report) -> Result<()> {
    let Some(kafka) = config.kafka.clone() else {
        bail!("--batch needs a kafka section in the configuration");
    };

    let logger = KafkaLogger::new(kafka).context("Failed to create Kafka logger")?;
    logger.settings(settings);

    let sent = logger
        .send(
            report.log_type(),
            report.data(),
            report.environment(),
            report.uuid(),
            settings.debug_enabled("kafka"),
        )
        .await;
    logger.close()?;

    let count = sent?;
    info!("Sent {} records to Kafka topic {}", count, logger.topic());
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Load configuration from file
    let mut config = load_config_with_env(&args.config)?;

    // Apply CLI overrides
    if let Some(logger) = &args.logger {
        config.exporter.logger = logger.clone();
    }

    init_tracing(&config.logging)?;

    info!("Starting Fleet Export");
    info!("Loaded configuration from: {:?}", args.config);
    info!("Logger: {}", config.exporter.logger);

    let data = std::fs::read(&args.file)
        .with_context(|| format!("Failed to read payload from {:?}", args.file))?;
    let report = build_report(&args, data)?;
    let settings = StaticSettings::from_config(&config.settings);

    if args.batch {
        return send_batch(&config, &settings, &report).await;
    }

    let exporter = ExporterFactory::create_tls_exporter(&config, &settings)
        .await
        .context("Failed to create exporter")?;

    // Cancel on Ctrl+C or once the export deadline passes
    let ctx = CancellationToken::new();
    let canceller = ctx.clone();
    let timeout = config.exporter.export_timeout();
    tokio::spawn(async move {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => warn!("Received Ctrl+C, cancelling export"),
            _ = tokio::time::sleep(timeout) => warn!("Export deadline of {:?} reached", timeout),
        }
        canceller.cancel();
    });

    let exported = exporter.export_report(&ctx, &report).await;
    ctx.cancel();

    if let Err(e) = exporter.close().await {
        warn!("Failed to close exporter: {}", e);
    }

    exported.context("Export failed")?;
    info!(
        "Exported {} report for {}:{}",
        report.log_type(),
        report.environment(),
        report.uuid()
    );
    Ok(())
}
