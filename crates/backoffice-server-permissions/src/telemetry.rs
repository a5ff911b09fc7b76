// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use backoffice_server_config::LoggingConfig;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` overrides the configured level. Returns false if a subscriber
/// was already installed, in which case nothing changes.
pub fn init_tracing(config: &LoggingConfig) -> bool {
	let filter = tracing_subscriber::EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| config.level.clone().into());

	let registry = tracing_subscriber::registry().with(filter);
	let result = if config.json {
		registry
			.with(tracing_subscriber::fmt::layer().json())
			.try_init()
	} else {
		registry.with(tracing_subscriber::fmt::layer()).try_init()
	};

	result.is_ok()
}
