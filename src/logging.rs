//! Logging prelude module for convenient access to tracing macros.
//!
//! This module provides convenient re-exports of common tracing macros
//! to reduce verbosity and maintain consistency across the codebase.
//!
//! # Usage
//!
//! ```ignore
//! use crate::logging::*;
//!
//! info!("This is an info message");
//! warn!("This is a warning");
//! error!("An error occurred");
//! debug!("Debug information");
//! ```

pub use tracing::{debug, error, info, trace, warn};

/// Initialize the tracing subscriber with environment filter support.
///
/// By default, logs at INFO level and above are displayed. Control the log
/// level with the `RUST_LOG` environment variable:
///
/// ```bash
/// RUST_LOG=debug outline-sync
/// RUST_LOG=outline_sync=trace outline-sync
/// RUST_LOG=outline_sync::push_engine=debug outline-sync
/// ```
///
/// `extra_verbosity` raises the default floor by one step per `-v` flag
/// when the caller has not set `RUST_LOG` explicitly (info -> debug ->
/// trace); it has no effect once `RUST_LOG` is set.
pub fn init_tracing(extra_verbosity: u8) {
	let default_level = match extra_verbosity {
		0 => "info",
		1 => "debug",
		_ => "trace",
	};

	tracing_subscriber::fmt()
		.with_env_filter(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
		)
		.with_writer(std::io::stderr)
		.init();
}

// vim: ts=4
