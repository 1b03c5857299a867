//! Logging for the cli. The libraries only emit `tracing` events. This module installs the subscriber that prints them to stderr.

use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Map the number of `-v` flags to a level. Without any flags, only warnings are printed.
pub fn level_for_verbosity(verbosity: u8) -> Level {
	match verbosity {
		0 => Level::WARN,
		1 => Level::INFO,
		2 => Level::DEBUG,
		_ => Level::TRACE,
	}
}

/// Install the global subscriber. `RUST_LOG` takes precedence over `verbosity`.
pub fn init_logging(verbosity: u8) {
	let filter = build_env_filter(level_for_verbosity(verbosity));
	let layer = fmt::layer()
		.with_writer(std::io::stderr)
		.with_target(false)
		.without_time();
	tracing_subscriber::registry()
		.with(filter)
		.with(layer)
		.init();
}

fn build_env_filter(level: Level) -> EnvFilter {
	let level = level.as_str().to_lowercase();
	EnvFilter::try_from_default_env().unwrap_or_else(|_| {
		EnvFilter::new(format!(
			"warn,pricecast_cli={level},pricecast_core={level},pricecast_dataset={level},pricecast_features={level},pricecast_linear={level}",
			level = level
		))
	})
}

#[test]
fn test_level_for_verbosity() {
	assert_eq!(level_for_verbosity(0), Level::WARN);
	assert_eq!(level_for_verbosity(1), Level::INFO);
	assert_eq!(level_for_verbosity(2), Level::DEBUG);
	assert_eq!(level_for_verbosity(3), Level::TRACE);
	assert_eq!(level_for_verbosity(9), Level::TRACE);
}
