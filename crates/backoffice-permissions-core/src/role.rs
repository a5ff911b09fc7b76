// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Role definitions and the role catalog.
//!
//! A [`RoleDefinition`] carries a display name and its default [`Grants`]:
//! either every section and action, or a per-section [`SectionGrant`].
//!
//! In stored and configured form a grant is written the way operators have
//! always written it:
//!
//! ```text
//! "all"                          every action (or every section)
//! ["view", "edit"]               legacy list of allowed actions
//! { view = true, delete = false } explicit per-action flags
//! ```
//!
//! [`Grants::resolve`] is the single place where these shapes are expanded.
//! The engine and the permission editor both go through it.
//!
//! Grants may only name catalog sections and actions. The engine denies any
//! unknown identifier, so [`RoleCatalog::validate`] rejects them at load time.

use crate::catalog::{Action, RoleId, Section};
use crate::error::{PermissionsError, Result};
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Wire form of the "everything" sentinel.
pub const ALL_GRANT: &str = "all";

/// Default grants for one section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawSectionGrant", into = "RawSectionGrant")]
pub enum SectionGrant {
	/// Every action in the section.
	All,
	/// Legacy list of allowed actions.
	Actions(BTreeSet<Action>),
	/// Explicit per-action flags; missing actions are denied.
	Flags(BTreeMap<Action, bool>),
}

impl SectionGrant {
	/// Builds a list grant from actions.
	pub fn actions(actions: impl IntoIterator<Item = Action>) -> Self {
		SectionGrant::Actions(actions.into_iter().collect())
	}

	/// Builds a flag grant from `(action, allowed)` pairs.
	pub fn flags(flags: impl IntoIterator<Item = (Action, bool)>) -> Self {
		SectionGrant::Flags(flags.into_iter().collect())
	}
}

/// Default grants for a role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawGrants", into = "RawGrants")]
pub enum Grants {
	/// Every section, every action.
	All,
	/// Grants keyed by section; missing sections are denied.
	Sections(BTreeMap<Section, SectionGrant>),
}

/// How a role's grants decided a section/action pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantMatch {
	/// The role grants every section.
	AllSections,
	/// The role has no grant for the section.
	SectionMissing,
	/// The role grants every action in the section.
	SectionAll,
	/// The section uses an action list; carries membership.
	Listed(bool),
	/// The section uses action flags; carries the flag, false if absent.
	Flagged(bool),
}

impl Grants {
	/// Builds section grants from `(section, grant)` pairs.
	pub fn sections(sections: impl IntoIterator<Item = (Section, SectionGrant)>) -> Self {
		Grants::Sections(sections.into_iter().collect())
	}

	/// Expands the grants for a section/action pair.
	pub fn resolve(&self, section: &Section, action: &Action) -> GrantMatch {
		let sections = match self {
			Grants::All => return GrantMatch::AllSections,
			Grants::Sections(sections) => sections,
		};

		match sections.get(section) {
			None => GrantMatch::SectionMissing,
			Some(SectionGrant::All) => GrantMatch::SectionAll,
			Some(SectionGrant::Actions(actions)) => GrantMatch::Listed(actions.contains(action)),
			Some(SectionGrant::Flags(flags)) => {
				GrantMatch::Flagged(flags.get(action).copied().unwrap_or(false))
			}
		}
	}

}

/// A named bundle of default grants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleDefinition {
	pub name: String,
	pub grants: Grants,
}

impl RoleDefinition {
	pub fn new(name: impl Into<String>, grants: Grants) -> Self {
		Self {
			name: name.into(),
			grants,
		}
	}
}

/// The static catalog of role definitions.
///
/// Loaded once at startup and shared read-only; nothing mutates it after
/// construction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleCatalog {
	roles: BTreeMap<RoleId, RoleDefinition>,
}

impl RoleCatalog {
	/// Creates a catalog with no roles.
	pub fn empty() -> Self {
		Self::default()
	}

	/// Builder: add or replace a role.
	pub fn with_role(mut self, id: RoleId, definition: RoleDefinition) -> Self {
		self.roles.insert(id, definition);
		self
	}

	/// The catalog shipped with the back-office.
	pub fn builtin() -> Self {
		use Action::*;

		Self::empty()
			.with_role(
				RoleId::SuperAdmin,
				RoleDefinition::new("Super Admin", Grants::All),
			)
			.with_role(
				RoleId::Admin,
				RoleDefinition::new("Administrator", Grants::All),
			)
			.with_role(
				RoleId::ProductsManager,
				RoleDefinition::new(
					"Products Manager",
					Grants::sections([
						(Section::Dashboard, SectionGrant::actions([View])),
						(Section::Products, SectionGrant::All),
						(Section::Coupons, SectionGrant::actions([View, Add, Edit])),
						(Section::Analytics, SectionGrant::actions([View])),
					]),
				),
			)
			.with_role(
				RoleId::SupportManager,
				RoleDefinition::new(
					"Support Manager",
					Grants::sections([
						(Section::Dashboard, SectionGrant::actions([View])),
						(Section::Support, SectionGrant::All),
						(Section::Chat, SectionGrant::All),
						(Section::Faq, SectionGrant::All),
						(Section::Customers, SectionGrant::actions([View])),
						(Section::Users, SectionGrant::flags([(View, true)])),
					]),
				),
			)
			.with_role(
				RoleId::OrdersManager,
				RoleDefinition::new(
					"Orders Manager",
					Grants::sections([
						(Section::Dashboard, SectionGrant::actions([View])),
						(Section::Orders, SectionGrant::All),
						(Section::Customers, SectionGrant::actions([View, Edit])),
						(Section::Devices, SectionGrant::actions([View])),
						(
							Section::ActivationCodes,
							SectionGrant::flags([(View, true), (Add, true), (Delete, false)]),
						),
						(Section::Analytics, SectionGrant::actions([View, Reports])),
					]),
				),
			)
			.with_role(
				RoleId::ContentManager,
				RoleDefinition::new(
					"Content Manager",
					Grants::sections([
						(Section::Dashboard, SectionGrant::actions([View])),
						(Section::Cms, SectionGrant::All),
						(Section::Faq, SectionGrant::All),
						(
							Section::Products,
							SectionGrant::flags([(View, true), (Edit, true)]),
						),
					]),
				),
			)
	}

	/// Parses and validates a catalog from a JSON object keyed by role ID.
	pub fn from_json(json: &str) -> Result<Self> {
		let catalog: Self = serde_json::from_str(json).map_err(PermissionsError::InvalidCatalog)?;
		catalog.validate()?;
		Ok(catalog)
	}

	/// Rejects grants keyed by a section or action outside the catalog.
	pub fn validate(&self) -> Result<()> {
		for (role, definition) in &self.roles {
			let Grants::Sections(sections) = &definition.grants else {
				continue;
			};
			for (section, grant) in sections {
				if !section.is_known() {
					return Err(PermissionsError::UnknownGrantKey {
						role: role.clone(),
						kind: "section",
						key: section.as_str().to_string(),
					});
				}
				let actions: Vec<&Action> = match grant {
					SectionGrant::All => Vec::new(),
					SectionGrant::Actions(actions) => actions.iter().collect(),
					SectionGrant::Flags(flags) => flags.keys().collect(),
				};
				if let Some(action) = actions.into_iter().find(|a| !a.is_known()) {
					return Err(PermissionsError::UnknownGrantKey {
						role: role.clone(),
						kind: "action",
						key: format!("{section}.{action}"),
					});
				}
			}
		}
		Ok(())
	}

	/// Returns the definition for a role, if the catalog has one.
	pub fn get(&self, id: &RoleId) -> Option<&RoleDefinition> {
		self.roles.get(id)
	}

	pub fn contains(&self, id: &RoleId) -> bool {
		self.roles.contains_key(id)
	}

	/// Iterates roles in catalog order.
	pub fn iter(&self) -> impl Iterator<Item = (&RoleId, &RoleDefinition)> {
		self.roles.iter()
	}

	pub fn len(&self) -> usize {
		self.roles.len()
	}

	pub fn is_empty(&self) -> bool {
		self.roles.is_empty()
	}
}

// =============================================================================
// Serialized forms
// =============================================================================

/// The `"all"` sentinel. Deserializes only from that exact string.
#[derive(Debug, Clone, Copy)]
struct AllSentinel;

impl Serialize for AllSentinel {
	fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
		serializer.serialize_str(ALL_GRANT)
	}
}

impl<'de> Deserialize<'de> for AllSentinel {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
		struct SentinelVisitor;

		impl Visitor<'_> for SentinelVisitor {
			type Value = AllSentinel;

			fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				write!(f, "the string \"{ALL_GRANT}\"")
			}

			fn visit_str<E: de::Error>(self, value: &str) -> std::result::Result<AllSentinel, E> {
				if value == ALL_GRANT {
					Ok(AllSentinel)
				} else {
					Err(E::invalid_value(de::Unexpected::Str(value), &self))
				}
			}
		}

		deserializer.deserialize_str(SentinelVisitor)
	}
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawSectionGrant {
	All(AllSentinel),
	Actions(Vec<Action>),
	Flags(BTreeMap<Action, bool>),
}

impl From<RawSectionGrant> for SectionGrant {
	fn from(raw: RawSectionGrant) -> Self {
		match raw {
			RawSectionGrant::All(_) => SectionGrant::All,
			RawSectionGrant::Actions(actions) => SectionGrant::actions(actions),
			RawSectionGrant::Flags(flags) => SectionGrant::Flags(flags),
		}
	}
}

impl From<SectionGrant> for RawSectionGrant {
	fn from(grant: SectionGrant) -> Self {
		match grant {
			SectionGrant::All => RawSectionGrant::All(AllSentinel),
			SectionGrant::Actions(actions) => RawSectionGrant::Actions(actions.into_iter().collect()),
			SectionGrant::Flags(flags) => RawSectionGrant::Flags(flags),
		}
	}
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawGrants {
	All(AllSentinel),
	Sections(BTreeMap<Section, SectionGrant>),
}

impl From<RawGrants> for Grants {
	fn from(raw: RawGrants) -> Self {
		match raw {
			RawGrants::All(_) => Grants::All,
			RawGrants::Sections(sections) => Grants::Sections(sections),
		}
	}
}

impl From<Grants> for RawGrants {
	fn from(grants: Grants) -> Self {
		match grants {
			Grants::All => RawGrants::All(AllSentinel),
			Grants::Sections(sections) => RawGrants::Sections(sections),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::engine::PermissionEngine;
	use serde_json::json;

	#[test]
	fn resolve_expands_each_grant_shape() {
		let grants = Grants::sections([
			(Section::Support, SectionGrant::All),
			(
				Section::Orders,
				SectionGrant::actions([Action::View, Action::Edit]),
			),
			(Section::Users, SectionGrant::flags([(Action::View, true)])),
		]);

		assert_eq!(
			grants.resolve(&Section::Support, &Action::Close),
			GrantMatch::SectionAll
		);
		assert_eq!(
			grants.resolve(&Section::Orders, &Action::Edit),
			GrantMatch::Listed(true)
		);
		assert_eq!(
			grants.resolve(&Section::Orders, &Action::Delete),
			GrantMatch::Listed(false)
		);
		assert_eq!(
			grants.resolve(&Section::Users, &Action::View),
			GrantMatch::Flagged(true)
		);
		assert_eq!(
			grants.resolve(&Section::Users, &Action::Delete),
			GrantMatch::Flagged(false)
		);
		assert_eq!(
			grants.resolve(&Section::Logs, &Action::View),
			GrantMatch::SectionMissing
		);
		assert_eq!(
			Grants::All.resolve(&Section::Logs, &Action::System),
			GrantMatch::AllSections
		);
	}

	#[test]
	fn decodes_legacy_shapes_from_json() {
		let catalog = RoleCatalog::from_json(
			&json!({
				"support_manager": {
					"name": "Support Manager",
					"grants": {
						"support": "all",
						"users": { "view": true },
						"faq": ["view", "edit"]
					}
				},
				"admin": { "name": "Administrator", "grants": "all" }
			})
			.to_string(),
		)
		.unwrap();

		assert_eq!(
			catalog.get(&RoleId::SupportManager).unwrap().name,
			"Support Manager"
		);
		let engine = PermissionEngine::new(catalog.clone());
		let role = RoleId::SupportManager;
		assert!(engine.evaluate_role(&role, &Section::Support, &Action::Close));
		assert!(engine.evaluate_role(&role, &Section::Users, &Action::View));
		assert!(!engine.evaluate_role(&role, &Section::Users, &Action::Delete));
		assert!(engine.evaluate_role(&role, &Section::Faq, &Action::Edit));
		assert!(!engine.evaluate_role(&role, &Section::Faq, &Action::Delete));

		assert_eq!(catalog.get(&RoleId::Admin).unwrap().grants, Grants::All);
	}

	#[test]
	fn rejects_strings_other_than_all() {
		let err = RoleCatalog::from_json(r#"{"admin": {"name": "A", "grants": "everything"}}"#);
		assert!(matches!(err, Err(PermissionsError::InvalidCatalog(_))));
	}

	#[test]
	fn serializes_back_to_legacy_shapes() {
		let definition = RoleDefinition::new(
			"Orders",
			Grants::sections([
				(Section::Orders, SectionGrant::All),
				(Section::Customers, SectionGrant::actions([Action::View])),
			]),
		);
		let value = serde_json::to_value(&definition).unwrap();
		assert_eq!(
			value,
			json!({
				"name": "Orders",
				"grants": { "customers": ["view"], "orders": "all" }
			})
		);
	}

	#[test]
	fn builtin_catalog_has_named_roles() {
		let catalog = RoleCatalog::builtin();
		assert_eq!(catalog.len(), 6);
		assert!(catalog.contains(&RoleId::SuperAdmin));
		assert!(catalog.contains(&RoleId::ContentManager));
		assert!(!catalog.contains(&RoleId::User));
		assert_eq!(catalog.get(&RoleId::Admin).unwrap().grants, Grants::All);
	}

	#[test]
	fn rejects_misspelled_section() {
		let err = RoleCatalog::from_json(r#"{"orders_manager": {"name": "Orders", "grants": {"order": "all"}}}"#)
			.unwrap_err();
		assert!(matches!(
			&err,
			PermissionsError::UnknownGrantKey { role, kind: "section", key }
				if *role == RoleId::OrdersManager && key == "order"
		));
		assert!(err.to_string().contains("'order'"));
	}

	#[test]
	fn rejects_unknown_action_in_list_or_flags() {
		let listed = RoleCatalog::from_json(
			r#"{"auditor": {"name": "Auditor", "grants": {"logs": ["view", "inspect"]}}}"#,
		);
		assert!(matches!(
			listed,
			Err(PermissionsError::UnknownGrantKey { kind: "action", ref key, .. }) if key == "logs.inspect"
		));

		let flagged = RoleCatalog::from_json(
			r#"{"auditor": {"name": "Auditor", "grants": {"logs": {"veiw": true}}}}"#,
		);
		assert!(matches!(
			flagged,
			Err(PermissionsError::UnknownGrantKey { kind: "action", .. })
		));
	}

	#[test]
	fn unknown_role_ids_are_allowed() {
		let catalog = RoleCatalog::from_json(
			r#"{"auditor": {"name": "Auditor", "grants": {"logs": ["view"]}}}"#,
		)
		.unwrap();
		let engine = PermissionEngine::new(catalog);
		assert!(engine.evaluate_role(&RoleId::from("auditor"), &Section::Logs, &Action::View));
	}

	#[test]
	fn builtin_catalog_is_valid() {
		assert!(RoleCatalog::builtin().validate().is_ok());
	}
}
