// telemetry.rs - Logging setup
// Purpose: install the process-wide tracing subscriber once

use std::str::FromStr;
use tracing::Level;

/// Installs a fmt subscriber at `level` ("trace" .. "error").
///
/// Unknown levels fall back to `info`. A second call is a no-op.
pub fn init(level: &str) {
    let level = Level::from_str(level).unwrap_or(Level::INFO);
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .try_init();
}
