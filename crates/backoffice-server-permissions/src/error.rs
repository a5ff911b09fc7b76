// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use backoffice_permissions_core::{ActorId, PermissionsError};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
	#[error("Database error: {0}")]
	Sqlx(#[from] sqlx::Error),

	#[error("Serialization error: {0}")]
	Serialization(#[from] serde_json::Error),

	#[error("Actor not found: {0}")]
	NotFound(ActorId),

	#[error("Identity store unavailable: {0}")]
	Unavailable(String),

	#[error("Invalid submission: {0}")]
	InvalidSubmission(#[from] PermissionsError),

	#[error("Internal: {0}")]
	Internal(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;
