//! # WiFi Scope
//!
//! Overlay geo-referenced WiFi quality markers onto a live camera scene.
//!
//! This binary assembles the core with its default collaborators and drives
//! the two cadences: the render loop and the measurement/connectivity
//! timers spawned by the core itself.

use anyhow::Result;
use tokio::time::{interval, Duration};
use tracing::{debug, info};
use tracing_subscriber;

use wifi_scope::app::WifiScope;
use wifi_scope::config::Config;

/// Render loop rate in frames per second.
const FRAME_RATE_HZ: u32 = 30;

/// Number of frames between status log messages
const LOG_INTERVAL_FRAMES: u64 = 300;

/// Main entry point for WiFi Scope
///
/// # Control Flow
///
/// 1. **Initialization**
///    - Set up logging with tracing subscriber
///    - Load configuration (default path `config/default.toml`, falling back
///      to built-in defaults when absent)
///    - Assemble the core and run the startup connectivity check
///
/// 2. **Main Loop**
///    - Render a frame at 30Hz; the core's own timers sample measurements
///      and re-check connectivity in the background
///    - Log status every 300 frames (~10 seconds)
///    - Handle Ctrl+C for graceful shutdown
///
/// 3. **Graceful Shutdown**
///    - Tear the core down (stop timers, clear markers, release resources)
///    - Log total frame and measurement counts
///
/// # Errors
///
/// Returns error if the configuration file is malformed or the startup
/// connectivity check fails.
#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("WiFi Scope v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = match Config::load("config/default.toml") {
        Ok(config) => config,
        Err(e) => {
            debug!("no config file loaded ({}), using defaults", e);
            Config::default()
        }
    };

    let scope = WifiScope::with_defaults(config);
    if let Err(e) = scope.initialize().await {
        scope.cleanup();
        return Err(e.into());
    }

    let period_ms = 1000 / FRAME_RATE_HZ;
    let mut frame_interval = interval(Duration::from_millis(period_ms as u64));

    info!("Starting render loop at {}Hz", FRAME_RATE_HZ);
    info!("Press Ctrl+C to exit");

    let mut frame_count: u64 = 0;
    let mut last_log_count: u64 = 0;

    // Main render loop
    loop {
        tokio::select! {
            // Render a frame at regular interval
            _ = frame_interval.tick() => {
                scope.render();
                frame_count += 1;

                // Log status every LOG_INTERVAL_FRAMES (~10 seconds at 30Hz)
                if frame_count - last_log_count >= LOG_INTERVAL_FRAMES {
                    info!(
                        "Rendered {} frames, {} measurements in history, {} markers live",
                        frame_count,
                        scope.history().len(),
                        scope.markers().len()
                    );
                    last_log_count = frame_count;
                }
            }

            // Handle Ctrl+C for graceful shutdown
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down...");
                info!(
                    "Total frames rendered: {}, measurements sampled: {}",
                    frame_count,
                    scope.history().len()
                );
                break;
            }
        }
    }

    scope.cleanup();
    Ok(())
}
