//! Choropleth layer service.
//!
//! Builds the configured land-value layers and prints them as JSON.

use anyhow::{bail, Context, Result};
use choropleth_common::LayerId;
use clap::{Parser, Subcommand};
use layer_service::{FeatureReport, LayerFactory, LayerReport, ServiceConfig};
use std::path::PathBuf;
use std::sync::Arc;
use storage::GeoJsonProvider;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "layer-service")]
#[command(about = "Build and inspect choropleth map layers")]
struct Args {
    /// Layer configuration file
    #[arg(short, long, env = "LAYER_CONFIG", default_value = "config/layers.yaml")]
    config: PathBuf,

    /// Log level
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    /// Number of tokio worker threads (default: number of CPU cores)
    #[arg(long)]
    worker_threads: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List configured layers
    List,

    /// Build a layer and print its color stops
    Render {
        /// Layer id (snake_case or legacy name)
        layer: LayerId,

        /// Also print an evenly sampled legend with this many steps
        #[arg(long, default_value_t = 0)]
        legend_steps: usize,
    },

    /// Print the value and color of one feature
    Inspect {
        layer: LayerId,

        /// Zero-based feature index
        record: usize,
    },

    /// Build every configured layer
    Warm,
}

fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let args = Args::parse();
    init_tracing(&args)?;

    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();

    if let Some(threads) = args.worker_threads {
        info!("Configuring tokio runtime with {} worker threads", threads);
        runtime_builder.worker_threads(threads);
    }

    let runtime = runtime_builder.build()?;
    runtime.block_on(async_main(args))
}

fn init_tracing(args: &Args) -> Result<()> {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // stdout carries the JSON output of the commands
    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr);

    if args.json_logs {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }
    Ok(())
}

async fn async_main(args: Args) -> Result<()> {
    let config = ServiceConfig::load(&args.config)?;

    let provider = match &config.data_dir {
        Some(dir) => GeoJsonProvider::with_base_dir(dir),
        None => GeoJsonProvider::new(),
    };
    let factory = LayerFactory::new(config, Arc::new(provider))
        .context("Failed to register layers")?;

    match args.command {
        Command::List => print_json(&factory.list())?,

        Command::Render {
            layer,
            legend_steps,
        } => {
            let built = factory.request_layer(layer).await?;
            let report = LayerReport::new(
                &built,
                factory.number_format(),
                factory.gradient(layer),
                legend_steps,
            );
            print_json(&report)?;
        }

        Command::Inspect { layer, record } => {
            let built = factory.request_layer(layer).await?;
            let Some(report) = FeatureReport::new(&built, record, factory.number_format()) else {
                bail!(
                    "Layer {} has {} features; record {} does not exist",
                    layer,
                    built.feature_count(),
                    record
                );
            };
            print_json(&report)?;
        }

        Command::Warm => {
            let summary = factory.warm_all().await;
            print_json(&factory.list())?;
            if !summary.is_success() {
                let failed: Vec<String> = summary
                    .failed
                    .iter()
                    .map(|(id, err)| format!("{}: {}", id, err))
                    .collect();
                bail!("{} layer(s) failed to build: {}", failed.len(), failed.join("; "));
            }
        }
    }

    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
