// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! SQLite-backed actor store.
//!
//! Permission maps are stored as JSON text. Decoding is lenient: a column
//! that is not a JSON object reads back as absent.

use std::str::FromStr;

use async_trait::async_trait;
use backoffice_permissions_core::actor::decode;
use backoffice_permissions_core::{Actor, ActorId, ActorPatch, RoleId};
use chrono::{SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqliteSynchronous};
use tracing::instrument;

use crate::error::{Result, StoreError};
use crate::store::ActorStore;

/// Opens the identity-store database named by `database.url`
/// (`BACKOFFICE_DATABASE_URL`, default `sqlite:./backoffice.db`).
///
/// The file is created if missing and runs in WAL mode, so permission
/// checks keep reading while the editor writes.
#[instrument(skip(database_url))]
pub async fn create_pool(database_url: &str) -> Result<SqlitePool> {
	let options = SqliteConnectOptions::from_str(database_url)
		.map_err(|e| StoreError::Internal(format!("Invalid database URL: {e}")))?
		.journal_mode(SqliteJournalMode::Wal)
		.synchronous(SqliteSynchronous::Normal)
		.create_if_missing(true);

	let pool = SqlitePool::connect_with(options).await?;

	tracing::debug!("database pool created");
	Ok(pool)
}

/// Creates the `actors` table if it does not exist.
#[instrument(skip(pool))]
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
	sqlx::query(
		r#"
		CREATE TABLE IF NOT EXISTS actors (
			id TEXT PRIMARY KEY,
			role TEXT,
			page_permissions TEXT,
			custom_permissions TEXT,
			updated_at TEXT NOT NULL
		)
		"#,
	)
	.execute(pool)
	.await?;

	tracing::debug!("actor migrations applied");
	Ok(())
}

#[derive(Clone)]
pub struct SqliteActorStore {
	pool: SqlitePool,
}

impl SqliteActorStore {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	pub fn pool(&self) -> &SqlitePool {
		&self.pool
	}

	/// Inserts or replaces a full actor record.
	#[instrument(skip(self, actor), fields(actor_id = %actor.id))]
	pub async fn insert_actor(&self, actor: &Actor) -> Result<()> {
		let row = ActorRow::try_from(actor)?;
		sqlx::query(
			r#"
			INSERT INTO actors (id, role, page_permissions, custom_permissions, updated_at)
			VALUES (?, ?, ?, ?, ?)
			ON CONFLICT(id) DO UPDATE SET
				role = excluded.role,
				page_permissions = excluded.page_permissions,
				custom_permissions = excluded.custom_permissions,
				updated_at = excluded.updated_at
			"#,
		)
		.bind(&row.id)
		.bind(&row.role)
		.bind(&row.page_permissions)
		.bind(&row.custom_permissions)
		.bind(now())
		.execute(&self.pool)
		.await?;

		Ok(())
	}
}

#[async_trait]
impl ActorStore for SqliteActorStore {
	#[instrument(skip(self), fields(actor_id = %id))]
	async fn get_actor(&self, id: &ActorId) -> Result<Option<Actor>> {
		let row = sqlx::query_as::<_, ActorRow>(
			r#"
			SELECT id, role, page_permissions, custom_permissions
			FROM actors
			WHERE id = ?
			"#,
		)
		.bind(id.as_str())
		.fetch_optional(&self.pool)
		.await?;

		Ok(row.map(Actor::from))
	}

	#[instrument(skip(self, patch), fields(actor_id = %id))]
	async fn update_actor(&self, id: &ActorId, patch: &ActorPatch) -> Result<()> {
		let mut tx = self.pool.begin().await?;

		let row = sqlx::query_as::<_, ActorRow>(
			r#"
			SELECT id, role, page_permissions, custom_permissions
			FROM actors
			WHERE id = ?
			"#,
		)
		.bind(id.as_str())
		.fetch_optional(&mut *tx)
		.await?
		.ok_or_else(|| StoreError::NotFound(id.clone()))?;

		let mut actor = Actor::from(row);
		patch.apply(&mut actor);
		let row = ActorRow::try_from(&actor)?;

		sqlx::query(
			r#"
			UPDATE actors
			SET role = ?, page_permissions = ?, custom_permissions = ?, updated_at = ?
			WHERE id = ?
			"#,
		)
		.bind(&row.role)
		.bind(&row.page_permissions)
		.bind(&row.custom_permissions)
		.bind(now())
		.bind(&row.id)
		.execute(&mut *tx)
		.await?;

		tx.commit().await?;
		Ok(())
	}
}

fn now() -> String {
	Utc::now().to_rfc3339_opts(SecondsFormat::Nanos, true)
}

#[derive(sqlx::FromRow)]
struct ActorRow {
	id: String,
	role: Option<String>,
	page_permissions: Option<String>,
	custom_permissions: Option<String>,
}

impl From<ActorRow> for Actor {
	fn from(row: ActorRow) -> Self {
		Actor {
			id: ActorId::new(row.id),
			role: row.role.filter(|r| !r.is_empty()).map(RoleId::from),
			page_permissions: row
				.page_permissions
				.as_deref()
				.and_then(decode::page_permissions_text),
			custom_permissions: row
				.custom_permissions
				.as_deref()
				.and_then(decode::custom_permissions_text),
		}
	}
}

impl TryFrom<&Actor> for ActorRow {
	type Error = StoreError;

	fn try_from(actor: &Actor) -> Result<Self> {
		Ok(ActorRow {
			id: actor.id.as_str().to_string(),
			role: actor.role.as_ref().map(|r| r.as_str().to_string()),
			page_permissions: actor
				.page_permissions
				.as_ref()
				.map(serde_json::to_string)
				.transpose()?,
			custom_permissions: actor
				.custom_permissions
				.as_ref()
				.map(serde_json::to_string)
				.transpose()?,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use backoffice_permissions_core::{Action, Section};

	async fn create_test_store() -> SqliteActorStore {
		let pool = SqlitePool::connect(":memory:").await.unwrap();
		run_migrations(&pool).await.unwrap();
		SqliteActorStore::new(pool)
	}

	#[tokio::test]
	async fn insert_then_get() {
		let store = create_test_store().await;
		let actor = Actor::new("u1")
			.with_role(RoleId::OrdersManager)
			.with_page_permission(Section::Settings, false)
			.with_custom_permission(Section::Orders, Action::Delete, false);
		store.insert_actor(&actor).await.unwrap();

		let fetched = store.get_actor(&ActorId::new("u1")).await.unwrap();
		assert_eq!(fetched, Some(actor));
	}

	#[tokio::test]
	async fn create_pool_creates_database_file() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("identity.db");

		let pool = create_pool(&format!("sqlite:{}", path.display())).await.unwrap();
		run_migrations(&pool).await.unwrap();
		let store = SqliteActorStore::new(pool);
		store
			.insert_actor(&Actor::new("u1").with_role(RoleId::Admin))
			.await
			.unwrap();

		assert!(path.exists());
		assert!(store.get_actor(&ActorId::new("u1")).await.unwrap().is_some());
	}

	#[tokio::test]
	async fn get_missing_is_none() {
		let store = create_test_store().await;
		assert!(store.get_actor(&ActorId::new("missing")).await.unwrap().is_none());
	}

	#[tokio::test]
	async fn malformed_columns_read_as_absent() {
		let store = create_test_store().await;
		sqlx::query(
			"INSERT INTO actors (id, role, page_permissions, custom_permissions, updated_at) \
			 VALUES ('u2', 'support_manager', '\"oops\"', '{\"faq\": {\"delete\": \"yes\", \"add\": true}}', '')",
		)
		.execute(store.pool())
		.await
		.unwrap();

		let actor = store.get_actor(&ActorId::new("u2")).await.unwrap().unwrap();
		assert_eq!(actor.role, Some(RoleId::SupportManager));
		assert_eq!(actor.page_permissions, None);
		assert_eq!(actor.custom_permission(&Section::Faq, &Action::Add), Some(true));
		assert_eq!(actor.custom_permission(&Section::Faq, &Action::Delete), None);
	}

	#[tokio::test]
	async fn unknown_role_is_preserved() {
		let store = create_test_store().await;
		store
			.insert_actor(&Actor::new("u3").with_role("regional_manager"))
			.await
			.unwrap();

		let actor = store.get_actor(&ActorId::new("u3")).await.unwrap().unwrap();
		assert_eq!(actor.role, Some(RoleId::from("regional_manager")));
	}

	#[tokio::test]
	async fn update_patches_fields() {
		let store = create_test_store().await;
		store
			.insert_actor(
				&Actor::new("u1")
					.with_role(RoleId::SupportManager)
					.with_page_permission(Section::Faq, true)
					.with_custom_permission(Section::Faq, Action::Delete, false),
			)
			.await
			.unwrap();

		let patch = ActorPatch {
			role: Some(RoleId::ContentManager),
			page_permissions: None,
			custom_permissions: Some(None),
		};
		store.update_actor(&ActorId::new("u1"), &patch).await.unwrap();

		let actor = store.get_actor(&ActorId::new("u1")).await.unwrap().unwrap();
		assert_eq!(actor.role, Some(RoleId::ContentManager));
		assert_eq!(actor.page_permission(&Section::Faq), Some(true));
		assert_eq!(actor.custom_permissions, None);
	}

	#[tokio::test]
	async fn update_missing_is_not_found() {
		let store = create_test_store().await;
		let err = store
			.update_actor(&ActorId::new("ghost"), &ActorPatch::default())
			.await
			.unwrap_err();
		assert!(matches!(err, StoreError::NotFound(_)));
	}

	#[tokio::test]
	async fn service_reads_through_sqlite() {
		use crate::service::PermissionService;
		use backoffice_permissions_core::{PermissionEngine, RoleCatalog};
		use std::sync::Arc;

		let store = create_test_store().await;
		store
			.insert_actor(&Actor::new("support").with_role(RoleId::SupportManager))
			.await
			.unwrap();
		store
			.insert_actor(
				&Actor::new("admin")
					.with_role(RoleId::Admin)
					.with_page_permission(Section::Orders, false),
			)
			.await
			.unwrap();
		store
			.insert_actor(
				&Actor::new("orders")
					.with_role(RoleId::OrdersManager)
					.with_custom_permission(Section::Orders, Action::Delete, false),
			)
			.await
			.unwrap();

		let service = PermissionService::new(
			PermissionEngine::new(RoleCatalog::builtin()),
			Arc::new(store),
		);
		let check = |actor: &'static str, section: Section, action: Action| {
			let service = service.clone();
			async move {
				service
					.evaluate_remote(&ActorId::new(actor), &section, &action)
					.await
			}
		};

		assert!(check("support", Section::Support, Action::Close).await);
		assert!(!check("support", Section::Users, Action::Delete).await);
		assert!(check("support", Section::Users, Action::View).await);
		assert!(!check("admin", Section::Orders, Action::View).await);
		assert!(!check("orders", Section::Orders, Action::Delete).await);
		assert!(check("orders", Section::Orders, Action::Edit).await);
		assert!(!check("nobody", Section::Dashboard, Action::View).await);
	}
}
