//! Tracing bootstrap: compact output for local work, JSON lines in
//! production so request and correlation ids stay machine-searchable.

use crate::config::AppConfig;
use anyhow::Result;
use tracing_subscriber::{EnvFilter, fmt};

// Used when `log_level` does not parse as a filter directive.
const FALLBACK_FILTER: &str = "info,jansetu_api=debug,jansetu_domain=debug";

pub fn init_tracing(config: &AppConfig) -> Result<()> {
    let filter = EnvFilter::try_new(config.log_level.clone())
        .unwrap_or_else(|_| EnvFilter::new(FALLBACK_FILTER));

    if config.is_production() {
        fmt()
            .with_env_filter(filter)
            .json()
            .with_target(false)
            .init();
    } else {
        fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }

    Ok(())
}
