// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: built-in defaults, TOML file and environment variables.

use std::path::PathBuf;

use tracing::{debug, trace};

use crate::error::ConfigError;
use crate::layer::BackofficeConfigLayer;
use crate::sections::{DatabaseConfigLayer, LoggingConfigLayer, PermissionsConfigLayer};

/// Default location of the configuration file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/backoffice/permissions.toml";

/// Source precedence levels (higher = overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	ConfigFile = 20,
	Environment = 50,
}

/// Trait for configuration sources.
pub trait ConfigSource: Send + Sync {
	fn name(&self) -> &'static str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<BackofficeConfigLayer, ConfigError>;
}

/// Built-in defaults source.
pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<BackofficeConfigLayer, ConfigError> {
		debug!("loading defaults");
		Ok(BackofficeConfigLayer::default())
	}
}

/// TOML file configuration source. A missing file yields an empty layer.
pub struct TomlSource {
	path: PathBuf,
}

impl TomlSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn system() -> Self {
		Self::new(SYSTEM_CONFIG_PATH)
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"toml-config"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<BackofficeConfigLayer, ConfigError> {
		if !self.path.exists() {
			debug!(path = %self.path.display(), "config file not found, skipping");
			return Ok(BackofficeConfigLayer::default());
		}

		debug!(path = %self.path.display(), "loading config file");
		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::FileRead {
			path: self.path.clone(),
			source: e,
		})?;

		let layer: BackofficeConfigLayer =
			toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
				path: self.path.clone(),
				source: e,
			})?;

		trace!("parsed config layer from TOML");
		Ok(layer)
	}
}

/// Environment variable source.
///
/// Convention: BACKOFFICE_<SECTION>_<FIELD>
pub struct EnvSource;

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<BackofficeConfigLayer, ConfigError> {
		debug!("loading environment variables");
		load_from_env(&|name| std::env::var(name).ok())
	}
}

type Lookup<'a> = &'a dyn Fn(&str) -> Option<String>;

fn load_from_env(lookup: Lookup<'_>) -> Result<BackofficeConfigLayer, ConfigError> {
	Ok(BackofficeConfigLayer {
		database: Some(load_database_from_env(lookup)),
		logging: Some(load_logging_from_env(lookup)),
		permissions: Some(load_permissions_from_env(lookup)?),
	})
}

fn env_var(lookup: Lookup<'_>, name: &str) -> Option<String> {
	lookup(name).filter(|s| !s.is_empty())
}

fn env_bool(lookup: Lookup<'_>, name: &str) -> Option<bool> {
	env_var(lookup, name).map(|v| v.eq_ignore_ascii_case("true") || v == "1")
}

fn env_u64(lookup: Lookup<'_>, name: &str) -> Result<Option<u64>, ConfigError> {
	match env_var(lookup, name) {
		Some(v) => v.parse().map(Some).map_err(|_| ConfigError::InvalidValue {
			key: name.to_string(),
			message: format!("invalid u64 value '{v}'"),
		}),
		None => Ok(None),
	}
}

fn load_database_from_env(lookup: Lookup<'_>) -> DatabaseConfigLayer {
	DatabaseConfigLayer {
		url: env_var(lookup, "BACKOFFICE_DATABASE_URL"),
	}
}

fn load_logging_from_env(lookup: Lookup<'_>) -> LoggingConfigLayer {
	LoggingConfigLayer {
		level: env_var(lookup, "BACKOFFICE_LOG_LEVEL"),
		json: env_bool(lookup, "BACKOFFICE_LOG_JSON"),
	}
}

fn load_permissions_from_env(lookup: Lookup<'_>) -> Result<PermissionsConfigLayer, ConfigError> {
	Ok(PermissionsConfigLayer {
		roles_file: env_var(lookup, "BACKOFFICE_PERMISSIONS_ROLES_FILE").map(PathBuf::from),
		fetch_timeout_ms: env_u64(lookup, "BACKOFFICE_PERMISSIONS_FETCH_TIMEOUT_MS")?,
	})
}
