// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Identity-store backed permission checks.
//!
//! Every entry point fetches the actor and delegates to
//! [`PermissionEngine`]. A missing actor, a store error or a fetch that
//! exceeds the configured timeout all deny.

use std::sync::Arc;
use std::time::Duration;

use backoffice_permissions_core::{
	Action, Actor, ActorId, ActorPatch, Decision, DecisionReason, EditorSubmission, EditorView,
	MenuCatalog, PermissionEditor, PermissionEngine, PermissionMatrix, Section, VisibilityDirective,
};
use backoffice_server_config::{
	load_role_catalog, BackofficeConfig, ConfigError, DEFAULT_FETCH_TIMEOUT_MS,
};
use futures::future::join_all;
use tracing::{info, instrument, warn};

use crate::error::{Result, StoreError};
use crate::store::ActorStore;
use crate::visibility::VisibilitySink;

enum Fetched {
	Found(Actor),
	Missing,
	Failed,
}

/// Permission checks, menu visibility and the permission editor for actors
/// held in an [`ActorStore`].
#[derive(Clone)]
pub struct PermissionService {
	engine: PermissionEngine,
	store: Arc<dyn ActorStore>,
	matrix: PermissionMatrix,
	fetch_timeout: Duration,
}

impl PermissionService {
	pub fn new(engine: PermissionEngine, store: Arc<dyn ActorStore>) -> Self {
		Self {
			engine,
			store,
			matrix: PermissionMatrix::standard(),
			fetch_timeout: Duration::from_millis(DEFAULT_FETCH_TIMEOUT_MS),
		}
	}

	/// Builds a service from resolved configuration, loading the role catalog
	/// it names.
	pub fn from_config(
		config: &BackofficeConfig,
		store: Arc<dyn ActorStore>,
	) -> std::result::Result<Self, ConfigError> {
		let catalog = load_role_catalog(&config.permissions)?;
		Ok(Self::new(PermissionEngine::new(catalog), store)
			.with_fetch_timeout(config.permissions.fetch_timeout()))
	}

	pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
		self.fetch_timeout = timeout;
		self
	}

	pub fn with_matrix(mut self, matrix: PermissionMatrix) -> Self {
		self.matrix = matrix;
		self
	}

	pub fn engine(&self) -> &PermissionEngine {
		&self.engine
	}

	pub fn editor(&self) -> PermissionEditor<'_> {
		PermissionEditor::new(&self.engine, &self.matrix)
	}

	/// Fetches the actor and evaluates the permission. Fails closed.
	pub async fn evaluate_remote(&self, actor_id: &ActorId, section: &Section, action: &Action) -> bool {
		self.explain_remote(actor_id, section, action).await.allowed
	}

	/// Like [`Self::evaluate_remote`], reporting which rule decided.
	#[instrument(skip(self), fields(actor_id = %actor_id, section = %section, action = %action))]
	pub async fn explain_remote(
		&self,
		actor_id: &ActorId,
		section: &Section,
		action: &Action,
	) -> Decision {
		match self.fetch_actor(actor_id).await {
			Fetched::Found(actor) => self.engine.explain(Some(&actor), section, action),
			Fetched::Missing => self.engine.explain(None, section, action),
			Fetched::Failed => Decision::deny(DecisionReason::ActorUnavailable),
		}
	}

	/// Resolves every menu entry concurrently and applies the result to the sink.
	///
	/// Entries are independent: a failed lookup hides only its own element.
	/// Returns the directives in menu order.
	#[instrument(skip(self, menu, sink), fields(actor_id = %actor_id, entries = menu.len()))]
	pub async fn apply_visibility(
		&self,
		actor_id: &ActorId,
		menu: &MenuCatalog,
		sink: &dyn VisibilitySink,
	) -> Vec<VisibilityDirective> {
		let checks = menu.entries().iter().map(|entry| async move {
			let allowed = self
				.evaluate_remote(actor_id, &entry.section, &entry.action)
				.await;
			let directive = VisibilityDirective::new(entry.selector.clone(), allowed);
			sink.apply(directive.clone());
			directive
		});

		join_all(checks).await
	}

	/// Editor state for an actor. An actor that cannot be fetched yields a
	/// form with no role selected and nothing checked.
	#[instrument(skip(self), fields(actor_id = %actor_id))]
	pub async fn editor_view(&self, actor_id: &ActorId) -> EditorView {
		let actor = match self.fetch_actor(actor_id).await {
			Fetched::Found(actor) => Some(actor),
			Fetched::Missing | Fetched::Failed => None,
		};

		let mut view = self.editor().view_for(actor.as_ref());
		view.actor_id = Some(actor_id.clone());
		view
	}

	/// Rendered editor markup for an actor.
	pub async fn build_editor_view(&self, actor_id: &ActorId) -> String {
		self.editor_view(actor_id).await.render_html()
	}

	/// Stores a submitted editor form and returns the patch written.
	///
	/// The current record is read first so page-level entries that would
	/// mask the submitted boxes can be dropped. Afterwards every box in the
	/// form evaluates the way it was submitted.
	#[instrument(skip(self, submission), fields(actor_id = %actor_id, role = %submission.role))]
	pub async fn save_editor(
		&self,
		actor_id: &ActorId,
		submission: &EditorSubmission,
	) -> Result<ActorPatch> {
		let actor = tokio::time::timeout(self.fetch_timeout, self.store.get_actor(actor_id))
			.await
			.map_err(|_| StoreError::Unavailable("fetch timed out".to_string()))??
			.ok_or_else(|| StoreError::NotFound(actor_id.clone()))?;

		let patch = self.editor().submission_to_patch(Some(&actor), submission)?;

		tokio::time::timeout(self.fetch_timeout, self.store.update_actor(actor_id, &patch))
			.await
			.map_err(|_| StoreError::Unavailable("update timed out".to_string()))??;

		let overrides = patch
			.custom_permissions
			.as_ref()
			.and_then(|c| c.as_ref())
			.map(|c| c.values().map(|actions| actions.len()).sum::<usize>())
			.unwrap_or(0);
		info!(overrides, "actor permissions saved");
		Ok(patch)
	}

	async fn fetch_actor(&self, actor_id: &ActorId) -> Fetched {
		match tokio::time::timeout(self.fetch_timeout, self.store.get_actor(actor_id)).await {
			Ok(Ok(Some(actor))) => Fetched::Found(actor),
			Ok(Ok(None)) => {
				warn!(actor_id = %actor_id, "actor not found, denying");
				Fetched::Missing
			}
			Ok(Err(e)) => {
				warn!(actor_id = %actor_id, error = %e, "actor fetch failed, denying");
				Fetched::Failed
			}
			Err(_) => {
				warn!(
					actor_id = %actor_id,
					timeout_ms = self.fetch_timeout.as_millis() as u64,
					"actor fetch timed out, denying"
				);
				Fetched::Failed
			}
		}
	}
}
