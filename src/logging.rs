//! Tracing subscriber setup

use anyhow::{Result, anyhow};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::Directive;

use crate::config::LoggingConfig;

/// Directive added by `--debug` so intermediate lookups are traced
pub const DEBUG_DIRECTIVE: &str = "skiscout=debug";

/// Layer the `--debug` override on top of a base filter. Results are unaffected.
pub fn apply_debug(filter: EnvFilter, debug: bool) -> Result<EnvFilter> {
    if !debug {
        return Ok(filter);
    }
    let directive: Directive = DEBUG_DIRECTIVE.parse()?;
    Ok(filter.add_directive(directive))
}

/// `RUST_LOG` when set, otherwise the configured level, plus the debug override
pub fn build_filter(config: &LoggingConfig, debug: bool) -> Result<EnvFilter> {
    let base = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&config.level))?;
    apply_debug(base, debug)
}

/// Install the global subscriber, pretty or json per config
pub fn init(config: &LoggingConfig, debug: bool) -> Result<()> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(build_filter(config, debug)?)
        .with_target(debug);

    let installed = if config.format == "json" {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| anyhow!("Failed to install log subscriber: {e}"))
}
