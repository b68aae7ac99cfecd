//! Resource inspector entry point.
//!
//! Loads every location given on the command line through a
//! `ResourceLoader` and prints one JSON snapshot per location to stdout.
//! Logging goes to stderr.

use std::sync::Arc;

use anyhow::{Result, bail};
use tracing::{Level, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use resource_access::core::Config;
use resource_access::domains::resources::{ResourceLoader, offload};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration from environment
    let config = Config::from_env();

    // Initialize logging
    init_logging(&config.logging.level, config.logging.with_timestamps);

    let locations: Vec<String> = std::env::args().skip(1).collect();
    if locations.is_empty() {
        bail!("usage: {} <location>...", env!("CARGO_PKG_NAME"));
    }

    info!("Starting {} v{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    let loader = Arc::new(ResourceLoader::try_new(&config)?);
    let mut failures = 0usize;

    for location in locations {
        match inspect_location(loader.clone(), location.clone()).await {
            Ok(json) => println!("{}", json),
            Err(e) => {
                warn!("Cannot load {}: {}", location, e);
                failures += 1;
            }
        }
    }

    // Scheme handlers may own blocking clients; release them off the runtime
    offload::run_blocking(move || {
        drop(loader);
        Ok(())
    })
    .await?;

    if failures > 0 {
        bail!("{} location(s) could not be loaded", failures);
    }

    Ok(())
}

/// Load `location` and render its snapshot as JSON.
async fn inspect_location(loader: Arc<ResourceLoader>, location: String) -> resource_access::Result<String> {
    let snapshot = offload::load_and_inspect(loader, location).await?;
    snapshot.to_json()
}

/// Initialize the logging subsystem.
///
/// Configures tracing with the specified log level and format.
fn init_logging(level: &str, with_timestamps: bool) {
    let level = match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    let builder = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr);

    if with_timestamps {
        builder.init();
    } else {
        builder.without_time().init();
    }
}
