// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Identity-store backed permission service for the back-office.
//!
//! This crate wires [`backoffice_permissions_core::PermissionEngine`] to an
//! [`ActorStore`]:
//! - [`PermissionService::evaluate_remote`] fetches an actor and evaluates, failing closed
//! - [`PermissionService::apply_visibility`] resolves a menu catalog into a [`VisibilitySink`]
//! - [`PermissionService::build_editor_view`] and [`PermissionService::save_editor`]
//!   drive the permission editor
//!
//! # Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use backoffice_server_config::load_config;
//! use backoffice_server_permissions::{create_pool, init_tracing, run_migrations, PermissionService, SqliteActorStore};
//!
//! let config = load_config()?;
//! init_tracing(&config.logging);
//! let pool = create_pool(&config.database.url).await?;
//! run_migrations(&pool).await?;
//! let service = PermissionService::from_config(&config, Arc::new(SqliteActorStore::new(pool)))?;
//! ```

pub mod error;
pub mod service;
pub mod sqlite;
pub mod store;
pub mod telemetry;
pub mod visibility;

pub use error::{Result, StoreError};
pub use service::PermissionService;
pub use sqlite::{create_pool, run_migrations, SqliteActorStore};
pub use store::{ActorStore, InMemoryActorStore};
pub use telemetry::init_tracing;
pub use visibility::{RecordingSink, VisibilitySink};
