// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Permission engine configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Default time allowed for an identity-store fetch before it counts as a deny.
pub const DEFAULT_FETCH_TIMEOUT_MS: u64 = 5_000;

/// Permission configuration (runtime, fully resolved).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionsConfig {
	/// TOML role catalog. `None` uses the built-in catalog.
	pub roles_file: Option<PathBuf>,
	pub fetch_timeout_ms: u64,
}

impl PermissionsConfig {
	pub fn fetch_timeout(&self) -> Duration {
		Duration::from_millis(self.fetch_timeout_ms)
	}
}

impl Default for PermissionsConfig {
	fn default() -> Self {
		Self {
			roles_file: None,
			fetch_timeout_ms: DEFAULT_FETCH_TIMEOUT_MS,
		}
	}
}

/// Permission configuration layer (partial, for merging).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PermissionsConfigLayer {
	#[serde(default)]
	pub roles_file: Option<PathBuf>,
	#[serde(default)]
	pub fetch_timeout_ms: Option<u64>,
}

impl PermissionsConfigLayer {
	pub fn merge(&mut self, other: PermissionsConfigLayer) {
		if other.roles_file.is_some() {
			self.roles_file = other.roles_file;
		}
		if other.fetch_timeout_ms.is_some() {
			self.fetch_timeout_ms = other.fetch_timeout_ms;
		}
	}

	pub fn finalize(self) -> PermissionsConfig {
		PermissionsConfig {
			roles_file: self.roles_file,
			fetch_timeout_ms: self.fetch_timeout_ms.unwrap_or(DEFAULT_FETCH_TIMEOUT_MS),
		}
	}
}
