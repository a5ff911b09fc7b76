// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Role catalog loading.
//!
//! The catalog file is TOML keyed by role ID:
//!
//! ```toml
//! [roles.support_manager]
//! name = "Support Manager"
//!
//! [roles.support_manager.grants]
//! support = "all"
//! customers = ["view"]
//! users = { view = true }
//! ```

use backoffice_permissions_core::RoleCatalog;
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::ConfigError;
use crate::sections::PermissionsConfig;

#[derive(Debug, Deserialize)]
struct RoleCatalogFile {
	#[serde(default)]
	roles: RoleCatalog,
}

/// Loads the role catalog named by `config.roles_file`, or the built-in
/// catalog when none is configured.
pub fn load_role_catalog(config: &PermissionsConfig) -> Result<RoleCatalog, ConfigError> {
	let Some(path) = &config.roles_file else {
		debug!("no roles file configured, using built-in catalog");
		return Ok(RoleCatalog::builtin());
	};

	let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
		path: path.clone(),
		source: e,
	})?;
	let file: RoleCatalogFile = toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
		path: path.clone(),
		source: e,
	})?;

	file.roles.validate().map_err(|e| {
		ConfigError::Validation(format!("{}: {e}", path.display()))
	})?;

	info!(path = %path.display(), roles = file.roles.len(), "role catalog loaded");
	Ok(file.roles)
}
