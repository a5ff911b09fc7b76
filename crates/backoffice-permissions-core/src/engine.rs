// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Permission evaluation engine.
//!
//! [`PermissionEngine::explain`] is the one implementation of the precedence
//! chain. Everything else (the boolean [`PermissionEngine::evaluate`], the
//! store-backed check, menu visibility, the permission editor) goes through it.
//!
//! Precedence, first match decides:
//!
//! 1. No actor, no role, or role `user` => deny
//! 2. Role `super_admin` => allow
//! 3. Section or action outside the catalog => deny
//! 4. Page override: `false` => deny; `true` for `view` => allow
//! 5. Custom per-action override => its value
//! 6. Role without definition => allow only for the literal `admin`
//! 7. Role grants => [`Grants::resolve`]
//!
//! Evaluation is pure and never fails: anything unknown or absent resolves to
//! deny.

use crate::actor::Actor;
use crate::catalog::{Action, RoleId, Section};
use crate::menu::{MenuCatalog, VisibilityDirective};
use crate::role::{GrantMatch, Grants, RoleCatalog};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, instrument};

/// The rule that decided an evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionReason {
	NoActor,
	/// The actor record could not be fetched from the identity store.
	ActorUnavailable,
	NoRole,
	UserRole,
	SuperAdmin,
	UnknownIdentifier,
	PageDisabled,
	PageEnabled,
	CustomOverride,
	/// Literal `admin` role with no definition in the catalog.
	LegacyAdminFallback,
	UndefinedRole,
	RoleGrantsAll,
	SectionNotGranted,
	SectionGrantsAll,
	ActionList,
	ActionFlag,
}

/// Outcome of an evaluation together with the rule that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Decision {
	pub allowed: bool,
	pub reason: DecisionReason,
}

impl Decision {
	pub fn allow(reason: DecisionReason) -> Self {
		Self {
			allowed: true,
			reason,
		}
	}

	pub fn deny(reason: DecisionReason) -> Self {
		Self {
			allowed: false,
			reason,
		}
	}
}

/// Evaluates actor permissions against an immutable role catalog.
///
/// Cloning is cheap; clones share the catalog.
#[derive(Debug, Clone)]
pub struct PermissionEngine {
	catalog: Arc<RoleCatalog>,
}

impl PermissionEngine {
	pub fn new(catalog: RoleCatalog) -> Self {
		Self {
			catalog: Arc::new(catalog),
		}
	}

	/// Creates an engine over an already shared catalog.
	pub fn from_shared(catalog: Arc<RoleCatalog>) -> Self {
		Self { catalog }
	}

	pub fn catalog(&self) -> &RoleCatalog {
		&self.catalog
	}

	/// Returns true if the actor may perform `action` in `section`.
	pub fn evaluate(&self, actor: Option<&Actor>, section: &Section, action: &Action) -> bool {
		self.explain(actor, section, action).allowed
	}

	/// Evaluates the permission and reports which rule decided it.
	#[instrument(
		level = "debug",
		skip(self, actor),
		fields(
			actor_id = actor.map(|a| a.id.as_str()).unwrap_or("<none>"),
			section = %section,
			action = %action,
		)
	)]
	pub fn explain(&self, actor: Option<&Actor>, section: &Section, action: &Action) -> Decision {
		let decision = self.decide(actor, section, action);
		debug!(
			allowed = decision.allowed,
			reason = ?decision.reason,
			"permission evaluated"
		);
		decision
	}

	/// Evaluates the defaults of a role alone, with no per-actor overrides.
	pub fn evaluate_role(&self, role: &RoleId, section: &Section, action: &Action) -> bool {
		let actor = Actor::new("").with_role(role.clone());
		self.evaluate(Some(&actor), section, action)
	}

	/// Computes show/hide directives for every entry of a menu catalog.
	pub fn visibility_plan(
		&self,
		actor: Option<&Actor>,
		menu: &MenuCatalog,
	) -> Vec<VisibilityDirective> {
		menu
			.entries()
			.iter()
			.map(|entry| {
				VisibilityDirective::new(
					entry.selector.clone(),
					self.evaluate(actor, &entry.section, &entry.action),
				)
			})
			.collect()
	}

	fn decide(&self, actor: Option<&Actor>, section: &Section, action: &Action) -> Decision {
		let Some(actor) = actor else {
			return Decision::deny(DecisionReason::NoActor);
		};

		let role = match &actor.role {
			None => return Decision::deny(DecisionReason::NoRole),
			Some(RoleId::User) => return Decision::deny(DecisionReason::UserRole),
			Some(RoleId::SuperAdmin) => return Decision::allow(DecisionReason::SuperAdmin),
			Some(role) => role,
		};

		if !section.is_known() || !action.is_known() {
			return Decision::deny(DecisionReason::UnknownIdentifier);
		}

		match actor.page_permission(section) {
			Some(false) => return Decision::deny(DecisionReason::PageDisabled),
			Some(true) if *action == Action::View => {
				return Decision::allow(DecisionReason::PageEnabled)
			}
			_ => {}
		}

		if let Some(allowed) = actor.custom_permission(section, action) {
			return Decision {
				allowed,
				reason: DecisionReason::CustomOverride,
			};
		}

		let Some(definition) = self.catalog.get(role) else {
			return if *role == RoleId::Admin {
				Decision::allow(DecisionReason::LegacyAdminFallback)
			} else {
				Decision::deny(DecisionReason::UndefinedRole)
			};
		};

		decision_from_grants(&definition.grants, section, action)
	}
}

fn decision_from_grants(grants: &Grants, section: &Section, action: &Action) -> Decision {
	match grants.resolve(section, action) {
		GrantMatch::AllSections => Decision::allow(DecisionReason::RoleGrantsAll),
		GrantMatch::SectionMissing => Decision::deny(DecisionReason::SectionNotGranted),
		GrantMatch::SectionAll => Decision::allow(DecisionReason::SectionGrantsAll),
		GrantMatch::Listed(allowed) => Decision {
			allowed,
			reason: DecisionReason::ActionList,
		},
		GrantMatch::Flagged(allowed) => Decision {
			allowed,
			reason: DecisionReason::ActionFlag,
		},
	}
}
