//! # Shape Route
//!
//! Client for a route generation service that lays running routes over the
//! street network in the outline of a chosen shape.
//!
//! ## Architecture
//!
//! The workspace is split into crates:
//!
//! 1. **shaperoute-core** - Data model, errors, event bus
//! 2. **shaperoute-communication** - Route backend and geocoder HTTP clients
//! 3. **shaperoute-settings** - Configuration loading and validation
//! 4. **shaperoute-ui** - Orchestrator, map and panel view models, console
//! 5. **shaperoute** - Main binary that wires them together

pub use shaperoute_communication::{ApiClient, Geocoder, NominatimGeocoder, RouteBackend};
pub use shaperoute_core::{
    AppEvent, ClientError, EventBus, Position, RouteRequest, RouteResult, SaveError, Shape,
};
pub use shaperoute_settings::Config;
pub use shaperoute_ui::{
    DialogTrackSink, DirectoryTrackSink, Orchestrator, Runtime, Services, TrackSink,
};

use std::sync::Arc;
use std::time::Duration;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging with the default configuration
///
/// Sets up structured logging with:
/// - Pretty console output on stderr, leaving stdout to the front-end
/// - RUST_LOG environment variable support
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(tracing::Level::INFO.to_string()));

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_line_number(true)
        .pretty();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}

/// Wire the real backend, geocoder, and track sink described by `config`
pub fn build_runtime(config: &Config) -> anyhow::Result<Runtime> {
    let backend = ApiClient::with_connect_timeout(
        config.api.base_url.clone(),
        Duration::from_millis(config.api.connect_timeout_ms),
    )?;
    tracing::info!("Route backend at {}", backend.base_url());

    let sink: Arc<dyn TrackSink> = if config.download.use_dialog {
        Arc::new(DialogTrackSink::new(config.download.directory.clone()))
    } else {
        Arc::new(DirectoryTrackSink::new(config.download.directory.clone()))
    };

    let orchestrator = Orchestrator::new(config, Arc::new(EventBus::new()));
    Ok(Runtime::new(
        orchestrator,
        Services {
            backend: Arc::new(backend),
            geocoder: Arc::new(NominatimGeocoder::new()),
            sink,
        },
    ))
}
