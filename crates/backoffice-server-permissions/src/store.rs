// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Identity store boundary.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use backoffice_permissions_core::{Actor, ActorId, ActorPatch};
use tokio::sync::RwLock;
use tracing::instrument;

use crate::error::{Result, StoreError};

/// Read and update access to actor records.
#[async_trait]
pub trait ActorStore: Send + Sync {
	/// Fetches an actor record. `Ok(None)` means the record does not exist.
	async fn get_actor(&self, id: &ActorId) -> Result<Option<Actor>>;

	/// Applies a patch to an existing record. Missing records are an error.
	async fn update_actor(&self, id: &ActorId, patch: &ActorPatch) -> Result<()>;
}

/// Actor store held in process memory.
///
/// Can be switched into a failing mode where every call returns
/// [`StoreError::Unavailable`].
#[derive(Debug, Default)]
pub struct InMemoryActorStore {
	actors: RwLock<HashMap<ActorId, Actor>>,
	failing: AtomicBool,
}

impl InMemoryActorStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_actors(actors: impl IntoIterator<Item = Actor>) -> Self {
		Self {
			actors: RwLock::new(actors.into_iter().map(|a| (a.id.clone(), a)).collect()),
			failing: AtomicBool::new(false),
		}
	}

	/// Inserts or replaces a record.
	pub async fn insert(&self, actor: Actor) {
		self.actors.write().await.insert(actor.id.clone(), actor);
	}

	pub fn set_failing(&self, failing: bool) {
		self.failing.store(failing, Ordering::SeqCst);
	}

	fn check_available(&self) -> Result<()> {
		if self.failing.load(Ordering::SeqCst) {
			return Err(StoreError::Unavailable("in-memory store set to fail".to_string()));
		}
		Ok(())
	}
}

#[async_trait]
impl ActorStore for InMemoryActorStore {
	#[instrument(skip(self), fields(actor_id = %id))]
	async fn get_actor(&self, id: &ActorId) -> Result<Option<Actor>> {
		self.check_available()?;
		Ok(self.actors.read().await.get(id).cloned())
	}

	#[instrument(skip(self, patch), fields(actor_id = %id))]
	async fn update_actor(&self, id: &ActorId, patch: &ActorPatch) -> Result<()> {
		self.check_available()?;
		let mut actors = self.actors.write().await;
		let actor = actors
			.get_mut(id)
			.ok_or_else(|| StoreError::NotFound(id.clone()))?;
		patch.apply(actor);
		Ok(())
	}
}
