// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Closed identifier catalogs for permission evaluation.
//!
//! This module defines the identifiers the permission engine reasons about:
//!
//! - [`Section`]: a functional area of the back-office (orders, users, ...)
//! - [`Action`]: an operation within a section (view, edit, delete, ...)
//! - [`RoleId`]: a named bundle of default grants
//! - [`ActorId`]: the identity-store key of a user record
//!
//! The catalogs are closed and known at build time. Every catalog enum also
//! carries an `Other` case so identifiers coming from stored records or
//! server-driven configuration can be represented without failing; the
//! engine resolves any `Other` value to deny.
//!
//! All catalog enums serialize as their plain wire string (`"orders"`,
//! `"activation_codes"`, `"super_admin"`).

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

// =============================================================================
// Catalog enums
// =============================================================================

macro_rules! define_catalog_enum {
	(
		$(#[$meta:meta])*
		$name:ident {
			$($(#[$vmeta:meta])* $variant:ident => $wire:literal),+ $(,)?
		}
	) => {
		$(#[$meta])*
		#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
		pub enum $name {
			$($(#[$vmeta])* $variant,)+
			/// An identifier outside the built-in catalog.
			Other(String),
		}

		impl $name {
			/// Returns every catalog entry, excluding `Other`.
			pub fn all() -> &'static [$name] {
				const ALL: &[$name] = &[$($name::$variant),+];
				ALL
			}

			/// Returns the wire identifier.
			pub fn as_str(&self) -> &str {
				match self {
					$($name::$variant => $wire,)+
					$name::Other(raw) => raw.as_str(),
				}
			}

			/// Returns true if this identifier belongs to the built-in catalog.
			pub fn is_known(&self) -> bool {
				!matches!(self, $name::Other(_))
			}
		}

		impl From<&str> for $name {
			fn from(raw: &str) -> Self {
				match raw {
					$($wire => $name::$variant,)+
					other => $name::Other(other.to_string()),
				}
			}
		}

		impl From<String> for $name {
			fn from(raw: String) -> Self {
				match $name::from(raw.as_str()) {
					$name::Other(_) => $name::Other(raw),
					known => known,
				}
			}
		}

		impl FromStr for $name {
			type Err = Infallible;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				Ok($name::from(s))
			}
		}

		impl fmt::Display for $name {
			fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				f.write_str(self.as_str())
			}
		}

		impl Serialize for $name {
			fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
				serializer.serialize_str(self.as_str())
			}
		}

		impl<'de> Deserialize<'de> for $name {
			fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
				String::deserialize(deserializer).map($name::from)
			}
		}
	};
}

define_catalog_enum! {
	/// A functional area of the back-office.
	Section {
		Dashboard => "dashboard",
		Products => "products",
		Customers => "customers",
		Users => "users",
		Support => "support",
		Orders => "orders",
		Faq => "faq",
		Settings => "settings",
		Analytics => "analytics",
		Coupons => "coupons",
		Cms => "cms",
		Logs => "logs",
		Devices => "devices",
		ActivationCodes => "activation_codes",
		Chat => "chat",
	}
}

define_catalog_enum! {
	/// An operation within a section.
	Action {
		View => "view",
		Add => "add",
		Edit => "edit",
		Delete => "delete",
		Reply => "reply",
		Close => "close",
		Permissions => "permissions",
		Backup => "backup",
		Import => "import",
		Export => "export",
		System => "system",
		Reports => "reports",
		Advanced => "advanced",
		Approve => "approve",
		Reject => "reject",
		Block => "block",
	}
}

define_catalog_enum! {
	/// Identifier of a role assignable to an actor.
	RoleId {
		/// Unconditional access to everything.
		SuperAdmin => "super_admin",
		/// Full back-office access unless overridden per page.
		Admin => "admin",
		ProductsManager => "products_manager",
		SupportManager => "support_manager",
		OrdersManager => "orders_manager",
		ContentManager => "content_manager",
		/// Storefront customer; never has back-office access.
		User => "user",
	}
}

impl Section {
	/// Human readable label, e.g. `"Activation codes"`.
	pub fn label(&self) -> String {
		humanize(self.as_str())
	}
}

impl Action {
	/// Human readable label, e.g. `"Export"`.
	pub fn label(&self) -> String {
		humanize(self.as_str())
	}
}

fn humanize(wire: &str) -> String {
	let spaced = wire.replace('_', " ");
	let mut chars = spaced.chars();
	match chars.next() {
		Some(first) => first.to_uppercase().chain(chars).collect(),
		None => String::new(),
	}
}

// =============================================================================
// Actor identifier
// =============================================================================

/// Identity-store key of a user record.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(String);

impl ActorId {
	/// Create a new ID from its store key.
	pub fn new(id: impl Into<String>) -> Self {
		Self(id.into())
	}

	/// Get the store key.
	pub fn as_str(&self) -> &str {
		&self.0
	}

	/// Get the inner string value.
	pub fn into_inner(self) -> String {
		self.0
	}
}

impl fmt::Display for ActorId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl From<&str> for ActorId {
	fn from(id: &str) -> Self {
		Self(id.to_string())
	}
}

impl From<String> for ActorId {
	fn from(id: String) -> Self {
		Self(id)
	}
}
