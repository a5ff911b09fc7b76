// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Permission editor view model and markup.
//!
//! The editor shows a role selector and one checkbox per `(section, action)`
//! pair of a [`PermissionMatrix`]. Checkbox state is never computed here
//! directly: the initial state is [`PermissionEngine::evaluate`] for the
//! actor, and selecting a role uses [`PermissionEngine::evaluate_role`]. The
//! editor therefore cannot show a state the engine would not compute.
//!
//! Rendered markup embeds the per-role presets as JSON so the page can
//! repopulate checkboxes on role change without re-deriving grants in script.

use crate::actor::{Actor, ActorPatch, CustomPermissions};
use crate::catalog::{Action, ActorId, RoleId, Section};
use crate::engine::PermissionEngine;
use crate::error::{PermissionsError, Result};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write;

/// Sections shown in the editor together with the actions each one offers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionMatrix {
	sections: Vec<(Section, Vec<Action>)>,
}

impl PermissionMatrix {
	pub fn new(sections: Vec<(Section, Vec<Action>)>) -> Self {
		Self { sections }
	}

	/// Every back-office section with the actions its pages expose.
	pub fn standard() -> Self {
		use Action::*;

		Self::new(vec![
			(Section::Dashboard, vec![View]),
			(Section::Products, vec![View, Add, Edit, Delete, Import, Export]),
			(Section::Customers, vec![View, Edit, Delete, Block, Export]),
			(Section::Users, vec![View, Add, Edit, Delete, Permissions, Block]),
			(Section::Support, vec![View, Reply, Close]),
			(Section::Orders, vec![View, Edit, Delete, Approve, Reject, Export]),
			(Section::Faq, vec![View, Add, Edit, Delete]),
			(Section::Settings, vec![View, Edit, Backup, System, Advanced]),
			(Section::Analytics, vec![View, Reports, Export]),
			(Section::Coupons, vec![View, Add, Edit, Delete]),
			(Section::Cms, vec![View, Add, Edit, Delete]),
			(Section::Logs, vec![View, Export]),
			(Section::Devices, vec![View, Add, Edit, Delete, Block]),
			(Section::ActivationCodes, vec![View, Add, Delete, Export]),
			(Section::Chat, vec![View, Reply, Close]),
		])
	}

	pub fn sections(&self) -> &[(Section, Vec<Action>)] {
		&self.sections
	}

	/// Iterates every `(section, action)` pair in display order.
	pub fn pairs(&self) -> impl Iterator<Item = (&Section, &Action)> {
		self
			.sections
			.iter()
			.flat_map(|(section, actions)| actions.iter().map(move |action| (section, action)))
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleOption {
	pub id: RoleId,
	pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EditorCheckbox {
	pub action: Action,
	pub checked: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EditorSection {
	pub section: Section,
	pub checkboxes: Vec<EditorCheckbox>,
}

/// State of the permission editor form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EditorView {
	pub actor_id: Option<ActorId>,
	pub roles: Vec<RoleOption>,
	pub selected_role: Option<RoleId>,
	pub sections: Vec<EditorSection>,
	/// Checked `section:action` values for each selectable role.
	pub role_presets: BTreeMap<RoleId, Vec<String>>,
}

impl EditorView {
	/// Returns the checkbox state for a pair, false if the pair is not shown.
	pub fn is_checked(&self, section: &Section, action: &Action) -> bool {
		self
			.sections
			.iter()
			.find(|s| &s.section == section)
			.and_then(|s| s.checkboxes.iter().find(|c| &c.action == action))
			.map(|c| c.checked)
			.unwrap_or(false)
	}

	/// Every checked pair.
	pub fn checked_pairs(&self) -> BTreeSet<(Section, Action)> {
		self
			.sections
			.iter()
			.flat_map(|s| {
				s.checkboxes
					.iter()
					.filter(|c| c.checked)
					.map(move |c| (s.section.clone(), c.action.clone()))
			})
			.collect()
	}

	/// What submitting the form in its current state would send.
	pub fn submission(&self) -> Option<EditorSubmission> {
		Some(EditorSubmission {
			role: self.selected_role.clone()?,
			granted: self.checked_pairs(),
		})
	}

	/// Renders the form as HTML.
	pub fn render_html(&self) -> String {
		let mut html = String::new();

		let _ = write!(html, "<form class=\"permission-editor\"");
		if let Some(actor_id) = &self.actor_id {
			let _ = write!(html, " data-actor-id=\"{}\"", escape_html(actor_id.as_str()));
		}
		html.push_str(">\n");

		html.push_str("  <label for=\"permission-role\">Role</label>\n");
		html.push_str("  <select id=\"permission-role\" name=\"role\">\n");
		let placeholder_selected = if self.selected_role.is_none() {
			" selected"
		} else {
			""
		};
		let _ = writeln!(
			html,
			"    <option value=\"\"{placeholder_selected}>Select a role</option>"
		);
		for role in &self.roles {
			let selected = if self.selected_role.as_ref() == Some(&role.id) {
				" selected"
			} else {
				""
			};
			let _ = writeln!(
				html,
				"    <option value=\"{}\"{selected}>{}</option>",
				escape_html(role.id.as_str()),
				escape_html(&role.name)
			);
		}
		html.push_str("  </select>\n");

		for section in &self.sections {
			let wire = escape_html(section.section.as_str());
			let _ = writeln!(
				html,
				"  <fieldset class=\"permission-section\" data-section=\"{wire}\">"
			);
			let _ = writeln!(
				html,
				"    <legend>{}</legend>",
				escape_html(&section.section.label())
			);
			for checkbox in &section.checkboxes {
				let action = escape_html(checkbox.action.as_str());
				let checked = if checkbox.checked { " checked" } else { "" };
				let _ = writeln!(
					html,
					"    <label><input type=\"checkbox\" name=\"permissions\" value=\"{wire}:{action}\" data-section=\"{wire}\" data-action=\"{action}\"{checked}> {}</label>",
					escape_html(&checkbox.action.label())
				);
			}
			html.push_str("  </fieldset>\n");
		}

		let presets = serde_json::to_string(&self.role_presets)
			.unwrap_or_else(|_| "{}".to_string())
			.replace("</", "<\\/");
		let _ = writeln!(
			html,
			"  <script type=\"application/json\" id=\"permission-role-presets\">{presets}</script>"
		);
		html.push_str("  <button type=\"submit\">Save permissions</button>\n");
		html.push_str("</form>\n");
		html
	}
}

/// A submitted editor form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorSubmission {
	pub role: RoleId,
	pub granted: BTreeSet<(Section, Action)>,
}

impl EditorSubmission {
	pub fn new(role: RoleId) -> Self {
		Self {
			role,
			granted: BTreeSet::new(),
		}
	}

	/// Builder: mark a pair as checked.
	pub fn with_granted(mut self, section: Section, action: Action) -> Self {
		self.granted.insert((section, action));
		self
	}

	/// Parses raw form fields: the role value and every checked
	/// `section:action` value.
	pub fn parse_form<'a>(role: &str, values: impl IntoIterator<Item = &'a str>) -> Result<Self> {
		let role = role.trim();
		if role.is_empty() {
			return Err(PermissionsError::MissingRole);
		}

		let mut submission = Self::new(RoleId::from(role));
		for value in values {
			let (section, action) = value
				.split_once(':')
				.filter(|(s, a)| !s.is_empty() && !a.is_empty())
				.ok_or_else(|| PermissionsError::InvalidFormValue(value.to_string()))?;
			submission
				.granted
				.insert((Section::from(section), Action::from(action)));
		}
		Ok(submission)
	}
}

/// Builds editor views and turns submissions into actor patches.
#[derive(Debug, Clone, Copy)]
pub struct PermissionEditor<'a> {
	engine: &'a PermissionEngine,
	matrix: &'a PermissionMatrix,
}

impl<'a> PermissionEditor<'a> {
	pub fn new(engine: &'a PermissionEngine, matrix: &'a PermissionMatrix) -> Self {
		Self { engine, matrix }
	}

	/// Editor state for an actor; every box reflects what the engine computes.
	///
	/// An absent actor yields a form with no role selected and nothing checked.
	pub fn view_for(&self, actor: Option<&Actor>) -> EditorView {
		let mut roles: Vec<RoleOption> = self
			.engine
			.catalog()
			.iter()
			.map(|(id, definition)| RoleOption {
				id: id.clone(),
				name: definition.name.clone(),
			})
			.collect();

		let selected_role = actor.and_then(|a| a.role.clone());
		if let Some(role) = &selected_role {
			if !roles.iter().any(|r| &r.id == role) {
				roles.push(RoleOption {
					id: role.clone(),
					name: role.as_str().to_string(),
				});
			}
		}

		let sections = self.build_sections(|section, action| {
			self.engine.evaluate(actor, section, action)
		});

		let role_presets = roles
			.iter()
			.map(|role| (role.id.clone(), self.preset_values(&role.id)))
			.collect();

		EditorView {
			actor_id: actor.map(|a| a.id.clone()),
			roles,
			selected_role,
			sections,
			role_presets,
		}
	}

	/// Selects a role and repopulates every checkbox from its defaults.
	pub fn select_role(&self, view: &mut EditorView, role: RoleId) {
		view.sections = self.build_sections(|section, action| {
			self.engine.evaluate_role(&role, section, action)
		});
		view.selected_role = Some(role);
	}

	/// Converts a submission into the patch the identity store should apply.
	///
	/// The patch sets the role and stores only the pairs whose checkbox
	/// differs from that role's defaults as custom overrides. Page-level
	/// entries of `actor` that would mask a submitted box are dropped: a
	/// disabled page loses its entry when any of its boxes is checked, and an
	/// enabled page loses its entry when its `view` box is unchecked.
	///
	/// Roles decided before overrides (`user`, `super_admin`) only accept
	/// their own defaults; any other submission is rejected.
	pub fn submission_to_patch(
		&self,
		actor: Option<&Actor>,
		submission: &EditorSubmission,
	) -> Result<ActorPatch> {
		let role = &submission.role;
		let is_checked = |section: &Section, action: &Action| {
			submission
				.granted
				.contains(&(section.clone(), action.clone()))
		};

		let mut custom: CustomPermissions = BTreeMap::new();
		for (section, action) in self.matrix.pairs() {
			let checked = is_checked(section, action);
			if checked != self.engine.evaluate_role(role, section, action) {
				custom
					.entry(section.clone())
					.or_default()
					.insert(action.clone(), checked);
			}
		}

		if ignores_overrides(role) && !custom.is_empty() {
			return Err(PermissionsError::RoleIgnoresOverrides(role.clone()));
		}

		let page_permissions = actor
			.and_then(|a| a.page_permissions.as_ref())
			.and_then(|pages| {
				let mut kept = pages.clone();
				kept.retain(|section, enabled| {
					let Some((_, actions)) = self.matrix.sections().iter().find(|(s, _)| s == section)
					else {
						return true;
					};
					if *enabled {
						!actions.contains(&Action::View) || is_checked(section, &Action::View)
					} else {
						!actions.iter().any(|action| is_checked(section, action))
					}
				});
				match (kept.len() == pages.len(), kept.is_empty()) {
					(true, _) => None,
					(false, true) => Some(None),
					(false, false) => Some(Some(kept)),
				}
			});

		Ok(ActorPatch {
			role: Some(role.clone()),
			page_permissions,
			custom_permissions: Some(if custom.is_empty() {
				None
			} else {
				Some(custom)
			}),
		})
	}

	fn build_sections(&self, checked: impl Fn(&Section, &Action) -> bool) -> Vec<EditorSection> {
		self
			.matrix
			.sections()
			.iter()
			.map(|(section, actions)| EditorSection {
				section: section.clone(),
				checkboxes: actions
					.iter()
					.map(|action| EditorCheckbox {
						action: action.clone(),
						checked: checked(section, action),
					})
					.collect(),
			})
			.collect()
	}

	fn preset_values(&self, role: &RoleId) -> Vec<String> {
		self
			.matrix
			.pairs()
			.filter(|(section, action)| self.engine.evaluate_role(role, section, action))
			.map(|(section, action)| format!("{section}:{action}"))
			.collect()
	}
}

fn ignores_overrides(role: &RoleId) -> bool {
	matches!(role, RoleId::User | RoleId::SuperAdmin)
}

fn escape_html(raw: &str) -> String {
	let mut escaped = String::with_capacity(raw.len());
	for c in raw.chars() {
		match c {
			'&' => escaped.push_str("&amp;"),
			'<' => escaped.push_str("&lt;"),
			'>' => escaped.push_str("&gt;"),
			'"' => escaped.push_str("&quot;"),
			'\'' => escaped.push_str("&#39;"),
			_ => escaped.push(c),
		}
	}
	escaped
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::role::RoleCatalog;

	fn engine() -> PermissionEngine {
		PermissionEngine::new(RoleCatalog::builtin())
	}

	#[test]
	fn matrix_covers_every_section_and_action() {
		let matrix = PermissionMatrix::standard();
		for section in Section::all() {
			assert!(matrix.sections().iter().any(|(s, _)| s == section));
		}
		for action in Action::all() {
			assert!(matrix.pairs().any(|(_, a)| a == action), "missing {action}");
		}
	}

	#[test]
	fn initial_state_matches_engine() {
		let engine = engine();
		let matrix = PermissionMatrix::standard();
		let editor = PermissionEditor::new(&engine, &matrix);
		let actor = Actor::new("u1")
			.with_role(RoleId::OrdersManager)
			.with_page_permission(Section::Orders, false)
			.with_custom_permission(Section::Logs, Action::View, true);

		let view = editor.view_for(Some(&actor));
		assert_eq!(view.selected_role, Some(RoleId::OrdersManager));
		for (section, action) in matrix.pairs() {
			assert_eq!(
				view.is_checked(section, action),
				engine.evaluate(Some(&actor), section, action),
				"{section}:{action}"
			);
		}
		assert!(!view.is_checked(&Section::Orders, &Action::View));
		assert!(view.is_checked(&Section::Logs, &Action::View));
	}

	#[test]
	fn selecting_role_repopulates_from_grants() {
		let engine = engine();
		let matrix = PermissionMatrix::standard();
		let editor = PermissionEditor::new(&engine, &matrix);
		let actor = Actor::new("u2")
			.with_role(RoleId::ContentManager)
			.with_custom_permission(Section::Cms, Action::Delete, false);

		let mut view = editor.view_for(Some(&actor));
		assert!(!view.is_checked(&Section::Cms, &Action::Delete));

		editor.select_role(&mut view, RoleId::SupportManager);
		assert_eq!(view.selected_role, Some(RoleId::SupportManager));
		assert!(view.is_checked(&Section::Support, &Action::Close));
		assert!(view.is_checked(&Section::Users, &Action::View));
		assert!(!view.is_checked(&Section::Users, &Action::Delete));
		assert!(!view.is_checked(&Section::Cms, &Action::Delete));

		editor.select_role(&mut view, RoleId::Admin);
		assert!(matrix
			.pairs()
			.all(|(section, action)| view.is_checked(section, action)));
	}

	#[test]
	fn absent_actor_has_nothing_selected() {
		let engine = engine();
		let matrix = PermissionMatrix::standard();
		let view = PermissionEditor::new(&engine, &matrix).view_for(None);

		assert_eq!(view.actor_id, None);
		assert_eq!(view.selected_role, None);
		assert!(view.checked_pairs().is_empty());
		assert!(view.submission().is_none());
		assert_eq!(view.roles.len(), engine.catalog().len());
	}

	#[test]
	fn unknown_actor_role_is_still_listed() {
		let engine = engine();
		let matrix = PermissionMatrix::standard();
		let actor = Actor::new("u3").with_role("regional_manager");
		let view = PermissionEditor::new(&engine, &matrix).view_for(Some(&actor));

		assert!(view
			.roles
			.iter()
			.any(|r| r.id == RoleId::from("regional_manager")));
		assert!(view.checked_pairs().is_empty());
	}

	#[test]
	fn presets_match_role_selection() {
		let engine = engine();
		let matrix = PermissionMatrix::standard();
		let editor = PermissionEditor::new(&engine, &matrix);
		let mut view = editor.view_for(None);

		for role in view.roles.clone() {
			editor.select_role(&mut view, role.id.clone());
			let expected: Vec<String> = view
				.checked_pairs()
				.iter()
				.map(|(s, a)| format!("{s}:{a}"))
				.collect();
			let mut preset = view.role_presets[&role.id].clone();
			preset.sort();
			let mut expected = expected;
			expected.sort();
			assert_eq!(preset, expected, "{}", role.id);
		}
	}

	#[test]
	fn patch_stores_only_differences_from_role() {
		let engine = engine();
		let matrix = PermissionMatrix::standard();
		let editor = PermissionEditor::new(&engine, &matrix);

		let mut view = editor.view_for(None);
		editor.select_role(&mut view, RoleId::SupportManager);
		let mut submission = view.submission().unwrap();
		submission.granted.remove(&(Section::Support, Action::Close));
		submission.granted.insert((Section::Orders, Action::View));

		let patch = editor.submission_to_patch(None, &submission).unwrap();
		assert_eq!(patch.role, Some(RoleId::SupportManager));
		assert_eq!(patch.page_permissions, None);

		let custom = patch.custom_permissions.unwrap().unwrap();
		assert_eq!(custom.len(), 2);
		assert!(!custom[&Section::Support][&Action::Close]);
		assert!(custom[&Section::Orders][&Action::View]);
	}

	#[test]
	fn unchanged_submission_clears_custom_overrides() {
		let engine = engine();
		let matrix = PermissionMatrix::standard();
		let editor = PermissionEditor::new(&engine, &matrix);

		let mut view = editor.view_for(None);
		editor.select_role(&mut view, RoleId::ProductsManager);
		let patch = editor
			.submission_to_patch(None, &view.submission().unwrap())
			.unwrap();

		assert_eq!(patch.custom_permissions, Some(None));
	}

	#[test]
	fn applied_patch_reproduces_submission() {
		let engine = engine();
		let matrix = PermissionMatrix::standard();
		let editor = PermissionEditor::new(&engine, &matrix);

		let submission = EditorSubmission::new(RoleId::OrdersManager)
			.with_granted(Section::Orders, Action::View)
			.with_granted(Section::Settings, Action::Backup)
			.with_granted(Section::ActivationCodes, Action::Delete);

		let mut actor = Actor::new("u4").with_role(RoleId::User);
		editor
			.submission_to_patch(Some(&actor), &submission)
			.unwrap()
			.apply(&mut actor);

		for (section, action) in matrix.pairs() {
			assert_eq!(
				engine.evaluate(Some(&actor), section, action),
				submission
					.granted
					.contains(&(section.clone(), action.clone())),
				"{section}:{action}"
			);
		}
	}

	#[test]
	fn checked_box_lifts_page_denial() {
		let engine = engine();
		let matrix = PermissionMatrix::standard();
		let editor = PermissionEditor::new(&engine, &matrix);
		let mut actor = Actor::new("u5")
			.with_role(RoleId::ContentManager)
			.with_page_permission(Section::Orders, false)
			.with_page_permission(Section::Settings, false);

		let mut view = editor.view_for(Some(&actor));
		editor.select_role(&mut view, RoleId::ContentManager);
		let mut submission = view.submission().unwrap();
		submission.granted.insert((Section::Orders, Action::View));

		let patch = editor.submission_to_patch(Some(&actor), &submission).unwrap();
		let pages = patch.page_permissions.clone().unwrap().unwrap();
		assert_eq!(pages.get(&Section::Orders), None);
		assert_eq!(pages.get(&Section::Settings), Some(&false));

		patch.apply(&mut actor);
		assert!(engine.evaluate(Some(&actor), &Section::Orders, &Action::View));
		assert!(editor.view_for(Some(&actor)).is_checked(&Section::Orders, &Action::View));
	}

	#[test]
	fn unchecked_view_lifts_page_grant() {
		let engine = engine();
		let matrix = PermissionMatrix::standard();
		let editor = PermissionEditor::new(&engine, &matrix);
		let mut actor = Actor::new("u6")
			.with_role(RoleId::SupportManager)
			.with_page_permission(Section::Support, true);

		let submission = EditorSubmission::new(RoleId::SupportManager)
			.with_granted(Section::Support, Action::Reply);
		let patch = editor.submission_to_patch(Some(&actor), &submission).unwrap();
		assert_eq!(patch.page_permissions, Some(None));

		patch.apply(&mut actor);
		assert!(!engine.evaluate(Some(&actor), &Section::Support, &Action::View));
		assert!(engine.evaluate(Some(&actor), &Section::Support, &Action::Reply));
	}

	#[test]
	fn consistent_pages_are_left_alone() {
		let engine = engine();
		let matrix = PermissionMatrix::standard();
		let editor = PermissionEditor::new(&engine, &matrix);
		let actor = Actor::new("u7")
			.with_role(RoleId::OrdersManager)
			.with_page_permission(Section::Settings, false);

		let mut view = editor.view_for(Some(&actor));
		editor.select_role(&mut view, RoleId::OrdersManager);
		let patch = editor
			.submission_to_patch(Some(&actor), &view.submission().unwrap())
			.unwrap();
		assert_eq!(patch.page_permissions, None);
	}

	#[test]
	fn roles_without_overrides_reject_changes() {
		let engine = engine();
		let matrix = PermissionMatrix::standard();
		let editor = PermissionEditor::new(&engine, &matrix);

		let user = EditorSubmission::new(RoleId::User).with_granted(Section::Orders, Action::View);
		assert!(matches!(
			editor.submission_to_patch(None, &user),
			Err(PermissionsError::RoleIgnoresOverrides(RoleId::User))
		));

		let mut view = editor.view_for(None);
		editor.select_role(&mut view, RoleId::SuperAdmin);
		let mut root = view.submission().unwrap();
		assert!(editor.submission_to_patch(None, &root).is_ok());
		root.granted.remove(&(Section::Settings, Action::System));
		assert!(matches!(
			editor.submission_to_patch(None, &root),
			Err(PermissionsError::RoleIgnoresOverrides(RoleId::SuperAdmin))
		));

		let plain_user = editor
			.submission_to_patch(None, &EditorSubmission::new(RoleId::User))
			.unwrap();
		assert_eq!(plain_user.custom_permissions, Some(None));
	}

	#[test]
	fn parse_form_values() {
		let submission =
			EditorSubmission::parse_form("orders_manager", ["orders:view", "logs:export"]).unwrap();
		assert_eq!(submission.role, RoleId::OrdersManager);
		assert!(submission
			.granted
			.contains(&(Section::Logs, Action::Export)));

		assert!(matches!(
			EditorSubmission::parse_form("  ", ["orders:view"]),
			Err(PermissionsError::MissingRole)
		));
		assert!(matches!(
			EditorSubmission::parse_form("admin", ["orders"]),
			Err(PermissionsError::InvalidFormValue(v)) if v == "orders"
		));
	}

	#[test]
	fn renders_escaped_markup() {
		let engine = PermissionEngine::new(RoleCatalog::empty().with_role(
			RoleId::from("night_shift"),
			crate::role::RoleDefinition::new(
				"Night <Shift> & Co",
				crate::role::Grants::sections([(
					Section::Orders,
					crate::role::SectionGrant::actions([Action::View]),
				)]),
			),
		));
		let matrix = PermissionMatrix::new(vec![(Section::Orders, vec![Action::View, Action::Edit])]);
		let actor = Actor::new("id\"1").with_role("night_shift");
		let html = PermissionEditor::new(&engine, &matrix)
			.view_for(Some(&actor))
			.render_html();

		assert!(html.contains("data-actor-id=\"id&quot;1\""));
		assert!(html.contains("<option value=\"night_shift\" selected>Night &lt;Shift&gt; &amp; Co</option>"));
		assert!(html.contains("value=\"orders:view\" data-section=\"orders\" data-action=\"view\" checked> View"));
		assert!(html.contains("value=\"orders:edit\" data-section=\"orders\" data-action=\"edit\"> Edit"));
		assert!(html.contains(r#"{"night_shift":["orders:view"]}"#));
	}
}
