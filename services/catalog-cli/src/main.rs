//! Operator CLI for the raster asset catalog engine.
//!
//! Runs the engine in-process for local operation and debugging:
//! - `inspect` / `sample` poke a raster directly through the access layer
//! - `script` drives a full catalog session (publish, search, fetch,
//!   pixel-pick) from a JSONL op file and prints each response

mod script;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use raster_access::RasterAccess;
use stac_service::{CatalogService, ServiceConfig};

#[derive(Parser, Debug)]
#[command(name = "catalog-cli")]
#[command(about = "Raster asset catalog engine, in-process")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Decode a raster and print its shape, extent, and statistics
    Inspect {
        /// Raster URI (file://, http(s)://, or s3://)
        #[arg(long)]
        uri: String,
    },

    /// Sample a single pixel at a geographic coordinate
    Sample {
        #[arg(long)]
        uri: String,
        #[arg(long)]
        lng: f64,
        #[arg(long)]
        lat: f64,
    },

    /// Run a JSONL op script against a fresh in-memory catalog
    Script {
        /// Path to the script; one JSON operation per line
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = ServiceConfig::from_env();

    match args.command {
        Command::Inspect { uri } => inspect(&config, &uri).await,
        Command::Sample { uri, lng, lat } => sample(&config, &uri, lng, lat).await,
        Command::Script { path } => {
            let service = CatalogService::new(config);
            script::run(&service, &path).await
        }
    }
}

async fn inspect(config: &ServiceConfig, uri: &str) -> Result<()> {
    let access = RasterAccess::new(config.s3.clone());

    let raster = access
        .open(uri)
        .await
        .with_context(|| format!("opening {}", uri))?;
    let stats = access.statistics(uri).await?;

    info!(uri, "Raster decoded");
    println!("dimensions: {}x{} ({} band(s))", raster.width, raster.height, raster.bands);
    println!("extent:     {:?}", raster.bbox().to_array());
    println!("nodata:     {:?}", raster.nodata);
    println!(
        "statistics: min={} max={} mean={} stdev={}",
        stats.min, stats.max, stats.mean, stats.stdev
    );

    let cache = access.cache_stats().await;
    println!(
        "cache:      {} hit(s), {} miss(es) ({:.1}% hit rate)",
        cache.hits,
        cache.misses,
        cache.hit_rate()
    );

    Ok(())
}

async fn sample(config: &ServiceConfig, uri: &str, lng: f64, lat: f64) -> Result<()> {
    let access = RasterAccess::new(config.s3.clone());
    let sample = access.sample(uri, lng, lat).await?;

    println!(
        "value at ({}, {}): {}{}",
        lng,
        lat,
        sample.value,
        if sample.is_nodata { " (nodata)" } else { "" }
    );

    Ok(())
}
