// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Partial configuration merged from every source.

use serde::Deserialize;

use crate::sections::{DatabaseConfigLayer, LoggingConfigLayer, PermissionsConfigLayer};

/// One source's view of the configuration. Unset sections are `None`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BackofficeConfigLayer {
	#[serde(default)]
	pub database: Option<DatabaseConfigLayer>,
	#[serde(default)]
	pub logging: Option<LoggingConfigLayer>,
	#[serde(default)]
	pub permissions: Option<PermissionsConfigLayer>,
}

impl BackofficeConfigLayer {
	/// Merges a higher-precedence layer into this one.
	pub fn merge(&mut self, other: BackofficeConfigLayer) {
		merge_section(&mut self.database, other.database, DatabaseConfigLayer::merge);
		merge_section(&mut self.logging, other.logging, LoggingConfigLayer::merge);
		merge_section(
			&mut self.permissions,
			other.permissions,
			PermissionsConfigLayer::merge,
		);
	}
}

fn merge_section<T>(base: &mut Option<T>, other: Option<T>, merge: impl FnOnce(&mut T, T)) {
	match (base.as_mut(), other) {
		(Some(base), Some(other)) => merge(base, other),
		(None, Some(other)) => *base = Some(other),
		(_, None) => {}
	}
}
