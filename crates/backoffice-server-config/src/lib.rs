// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Centralized configuration for the back-office permission service.
//!
//! This crate provides:
//! - Layered configuration from multiple sources (defaults, TOML file, environment)
//! - Type-safe configuration with validation
//! - Consistent environment variable naming (`BACKOFFICE_*`)
//! - Role catalog loading ([`load_role_catalog`])
//!
//! # Usage
//!
//! ```ignore
//! use backoffice_server_config::{load_config, load_role_catalog};
//!
//! let config = load_config()?;
//! let catalog = load_role_catalog(&config.permissions)?;
//! ```

pub mod catalog;
pub mod error;
pub mod layer;
pub mod sections;
pub mod sources;

pub use catalog::load_role_catalog;
pub use error::ConfigError;
pub use layer::BackofficeConfigLayer;
pub use sections::*;
pub use sources::{ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource};

use tracing::{debug, info};

/// Fully resolved back-office configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackofficeConfig {
	pub database: DatabaseConfig,
	pub logging: LoggingConfig,
	pub permissions: PermissionsConfig,
}

/// Load configuration from all sources with standard precedence.
///
/// Precedence (highest to lowest):
/// 1. Environment variables (`BACKOFFICE_*`)
/// 2. Config file (`/etc/backoffice/permissions.toml`)
/// 3. Built-in defaults
pub fn load_config() -> Result<BackofficeConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::system()),
		Box::new(EnvSource),
	])
}

/// Load configuration from environment only (for testing or simple deployments).
pub fn load_config_from_env() -> Result<BackofficeConfig, ConfigError> {
	let mut merged = BackofficeConfigLayer::default();
	merged.merge(EnvSource.load()?);
	finalize(merged)
}

/// Load configuration with a custom config file path.
pub fn load_config_with_file(
	config_path: impl Into<std::path::PathBuf>,
) -> Result<BackofficeConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(config_path)),
		Box::new(EnvSource),
	])
}

/// Merge the given sources in precedence order and finalize the result.
pub fn load_from_sources(
	mut sources: Vec<Box<dyn ConfigSource>>,
) -> Result<BackofficeConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = BackofficeConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		let layer = source.load()?;
		merged.merge(layer);
	}

	finalize(merged)
}

/// Finalize configuration layer into resolved config.
fn finalize(layer: BackofficeConfigLayer) -> Result<BackofficeConfig, ConfigError> {
	let database = layer.database.unwrap_or_default().finalize();
	let logging = layer.logging.unwrap_or_default().finalize();
	let permissions = layer.permissions.unwrap_or_default().finalize();

	validate_config(&permissions)?;

	info!(
		database = %database.url,
		log_level = %logging.level,
		roles_file = ?permissions.roles_file,
		fetch_timeout_ms = permissions.fetch_timeout_ms,
		"Back-office configuration loaded"
	);

	Ok(BackofficeConfig {
		database,
		logging,
		permissions,
	})
}

/// Validate cross-field configuration rules.
fn validate_config(permissions: &PermissionsConfig) -> Result<(), ConfigError> {
	if permissions.fetch_timeout_ms == 0 {
		return Err(ConfigError::Validation(
			"BACKOFFICE_PERMISSIONS_FETCH_TIMEOUT_MS must be greater than zero; \
			 a zero timeout would deny every remote check."
				.to_string(),
		));
	}

	Ok(())
}
