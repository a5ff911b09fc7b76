// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Actor records as read from the identity store.
//!
//! An [`Actor`] is owned by the identity store. The engine only reads it;
//! writes go through [`ActorPatch`], applied by the store.
//!
//! Stored records are decoded leniently: a `pagePermissions` or
//! `customPermissions` field that is not a map is treated as absent, and
//! individual non-boolean entries are dropped. A malformed override therefore
//! falls through to the next precedence rule instead of failing the read.

use crate::catalog::{Action, ActorId, RoleId, Section};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Page-level overrides: section -> enabled.
pub type PagePermissions = BTreeMap<Section, bool>;

/// Per-action overrides: section -> action -> allowed.
pub type CustomPermissions = BTreeMap<Section, BTreeMap<Action, bool>>;

/// A user record whose permissions are being evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
	pub id: ActorId,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub role: Option<RoleId>,
	#[serde(
		default,
		deserialize_with = "decode::page_permissions_field",
		skip_serializing_if = "Option::is_none"
	)]
	pub page_permissions: Option<PagePermissions>,
	#[serde(
		default,
		deserialize_with = "decode::custom_permissions_field",
		skip_serializing_if = "Option::is_none"
	)]
	pub custom_permissions: Option<CustomPermissions>,
}

impl Actor {
	/// Creates an actor with no role and no overrides.
	pub fn new(id: impl Into<ActorId>) -> Self {
		Self {
			id: id.into(),
			role: None,
			page_permissions: None,
			custom_permissions: None,
		}
	}

	/// Builder: set the role.
	pub fn with_role(mut self, role: impl Into<RoleId>) -> Self {
		self.role = Some(role.into());
		self
	}

	/// Builder: add a page-level override.
	pub fn with_page_permission(mut self, section: Section, enabled: bool) -> Self {
		self
			.page_permissions
			.get_or_insert_with(BTreeMap::new)
			.insert(section, enabled);
		self
	}

	/// Builder: add a per-action override.
	pub fn with_custom_permission(mut self, section: Section, action: Action, allowed: bool) -> Self {
		self
			.custom_permissions
			.get_or_insert_with(BTreeMap::new)
			.entry(section)
			.or_default()
			.insert(action, allowed);
		self
	}

	/// Returns the page-level override for a section, if one is defined.
	pub fn page_permission(&self, section: &Section) -> Option<bool> {
		self.page_permissions.as_ref()?.get(section).copied()
	}

	/// Returns the per-action override for a section/action pair, if one is defined.
	pub fn custom_permission(&self, section: &Section, action: &Action) -> Option<bool> {
		self
			.custom_permissions
			.as_ref()?
			.get(section)?
			.get(action)
			.copied()
	}
}

/// A partial update to an actor record.
///
/// `None` leaves a field untouched. For the permission maps, `Some(None)`
/// clears the field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActorPatch {
	pub role: Option<RoleId>,
	pub page_permissions: Option<Option<PagePermissions>>,
	pub custom_permissions: Option<Option<CustomPermissions>>,
}

impl ActorPatch {
	/// Returns true if applying this patch changes nothing.
	pub fn is_empty(&self) -> bool {
		self.role.is_none() && self.page_permissions.is_none() && self.custom_permissions.is_none()
	}

	/// Applies the patch to an actor record in place.
	pub fn apply(&self, actor: &mut Actor) {
		if let Some(role) = &self.role {
			actor.role = Some(role.clone());
		}
		if let Some(page_permissions) = &self.page_permissions {
			actor.page_permissions = page_permissions.clone();
		}
		if let Some(custom_permissions) = &self.custom_permissions {
			actor.custom_permissions = custom_permissions.clone();
		}
	}
}

/// Lenient decoding of stored permission maps.
pub mod decode {
	use super::{CustomPermissions, PagePermissions};
	use crate::catalog::{Action, Section};
	use serde::{Deserialize, Deserializer};
	use serde_json::Value;
	use std::collections::BTreeMap;

	/// Decodes `pagePermissions` from a JSON value.
	///
	/// Returns `None` if the value is not an object. Non-boolean entries are skipped.
	pub fn page_permissions(value: &Value) -> Option<PagePermissions> {
		let object = value.as_object()?;
		Some(
			object
				.iter()
				.filter_map(|(section, enabled)| {
					enabled
						.as_bool()
						.map(|enabled| (Section::from(section.as_str()), enabled))
				})
				.collect(),
		)
	}

	/// Decodes `customPermissions` from a JSON value.
	///
	/// Returns `None` if the value is not an object. Sections whose value is not
	/// an object and non-boolean action entries are skipped.
	pub fn custom_permissions(value: &Value) -> Option<CustomPermissions> {
		let object = value.as_object()?;
		Some(
			object
				.iter()
				.filter_map(|(section, actions)| {
					let actions = actions.as_object()?;
					let actions: BTreeMap<Action, bool> = actions
						.iter()
						.filter_map(|(action, allowed)| {
							allowed
								.as_bool()
								.map(|allowed| (Action::from(action.as_str()), allowed))
						})
						.collect();
					Some((Section::from(section.as_str()), actions))
				})
				.collect(),
		)
	}

	/// Decodes a JSON text column. Invalid JSON is treated as absent.
	pub fn page_permissions_text(text: &str) -> Option<PagePermissions> {
		serde_json::from_str::<Value>(text)
			.ok()
			.as_ref()
			.and_then(page_permissions)
	}

	/// Decodes a JSON text column. Invalid JSON is treated as absent.
	pub fn custom_permissions_text(text: &str) -> Option<CustomPermissions> {
		serde_json::from_str::<Value>(text)
			.ok()
			.as_ref()
			.and_then(custom_permissions)
	}

	pub(super) fn page_permissions_field<'de, D>(
		deserializer: D,
	) -> Result<Option<PagePermissions>, D::Error>
	where
		D: Deserializer<'de>,
	{
		let value = Option::<Value>::deserialize(deserializer)?;
		Ok(value.as_ref().and_then(page_permissions))
	}

	pub(super) fn custom_permissions_field<'de, D>(
		deserializer: D,
	) -> Result<Option<CustomPermissions>, D::Error>
	where
		D: Deserializer<'de>,
	{
		let value = Option::<Value>::deserialize(deserializer)?;
		Ok(value.as_ref().and_then(custom_permissions))
	}
}
