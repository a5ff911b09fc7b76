// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use crate::catalog::RoleId;
use thiserror::Error;

/// Errors raised while loading catalogs or parsing editor input.
///
/// Permission evaluation itself never fails; these only surface from
/// configuration and form handling.
#[derive(Debug, Error)]
pub enum PermissionsError {
	#[error("invalid role catalog: {0}")]
	InvalidCatalog(#[source] serde_json::Error),

	#[error("role '{role}' grants unknown {kind} '{key}'")]
	UnknownGrantKey {
		role: RoleId,
		kind: &'static str,
		key: String,
	},

	#[error("role '{0}' cannot carry per-action overrides")]
	RoleIgnoresOverrides(RoleId),

	#[error("invalid permission form value '{0}': expected 'section:action'")]
	InvalidFormValue(String),

	#[error("permission form submitted without a role")]
	MissingRole,
}

pub type Result<T> = std::result::Result<T, PermissionsError>;
