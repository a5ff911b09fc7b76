// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sections. Each section has a partial `*Layer` used for
//! merging sources and a resolved config produced by `finalize`.

mod database;
mod logging;
mod permissions;

pub use database::{DatabaseConfig, DatabaseConfigLayer};
pub use logging::{LoggingConfig, LoggingConfigLayer};
pub use permissions::{PermissionsConfig, PermissionsConfigLayer, DEFAULT_FETCH_TIMEOUT_MS};
