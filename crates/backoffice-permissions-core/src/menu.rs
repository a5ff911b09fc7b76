// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Menu catalog and visibility directives.
//!
//! The sidebar and page-level buttons are gated by `(selector, section, action)`
//! triples. Resolving a triple produces a [`VisibilityDirective`] the UI layer
//! applies to every element matching the selector.

use crate::catalog::{Action, Section};
use serde::{Deserialize, Serialize};

/// CSS declaration used to hide gated elements. `!important` is required
/// because unrelated stylesheets may show these elements.
pub const HIDDEN_DECLARATION: &str = "display: none !important";

/// One gated element group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuEntry {
	pub selector: String,
	pub section: Section,
	pub action: Action,
}

impl MenuEntry {
	pub fn new(selector: impl Into<String>, section: Section, action: Action) -> Self {
		Self {
			selector: selector.into(),
			section,
			action,
		}
	}
}

/// Static list of gated elements.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MenuCatalog {
	entries: Vec<MenuEntry>,
}

impl MenuCatalog {
	pub fn new(entries: Vec<MenuEntry>) -> Self {
		Self { entries }
	}

	/// The admin sidebar plus the action buttons gated on individual pages.
	pub fn sidebar() -> Self {
		let nav = Section::all()
			.iter()
			.map(|section| {
				MenuEntry::new(
					format!("[data-nav-section=\"{}\"]", section.as_str()),
					section.clone(),
					Action::View,
				)
			});

		let buttons = [
			("#add-product-btn", Section::Products, Action::Add),
			("#import-products-btn", Section::Products, Action::Import),
			("#export-orders-btn", Section::Orders, Action::Export),
			("#export-customers-btn", Section::Customers, Action::Export),
			("#add-user-btn", Section::Users, Action::Add),
			("#user-permissions-tab", Section::Users, Action::Permissions),
			("#generate-codes-btn", Section::ActivationCodes, Action::Add),
			("#add-device-btn", Section::Devices, Action::Add),
			("#backup-btn", Section::Settings, Action::Backup),
			("#system-settings-tab", Section::Settings, Action::System),
			("#advanced-settings-tab", Section::Settings, Action::Advanced),
			("#analytics-reports-tab", Section::Analytics, Action::Reports),
		]
		.into_iter()
		.map(|(selector, section, action)| MenuEntry::new(selector, section, action));

		Self::new(nav.chain(buttons).collect())
	}

	pub fn entries(&self) -> &[MenuEntry] {
		&self.entries
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
	Visible,
	Hidden,
}

impl Visibility {
	pub fn from_allowed(allowed: bool) -> Self {
		if allowed {
			Visibility::Visible
		} else {
			Visibility::Hidden
		}
	}
}

/// Show or hide every element matching a selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibilityDirective {
	pub selector: String,
	pub visibility: Visibility,
}

impl VisibilityDirective {
	pub fn new(selector: impl Into<String>, allowed: bool) -> Self {
		Self {
			selector: selector.into(),
			visibility: Visibility::from_allowed(allowed),
		}
	}

	/// Inline style override to set on matching elements.
	///
	/// `None` means the override is removed so the page's own styles apply.
	pub fn style_override(&self) -> Option<&'static str> {
		match self.visibility {
			Visibility::Hidden => Some(HIDDEN_DECLARATION),
			Visibility::Visible => None,
		}
	}

	/// Equivalent stylesheet rule, for pages that inject a `<style>` block.
	pub fn css_rule(&self) -> Option<String> {
		self
			.style_override()
			.map(|declaration| format!("{} {{ {declaration}; }}", self.selector))
	}
}
