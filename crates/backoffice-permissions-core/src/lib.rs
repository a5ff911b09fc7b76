// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Role and permission evaluation for the back-office admin.
//!
//! This crate provides:
//! - Closed catalogs of sections, actions and roles ([`Section`], [`Action`], [`RoleId`])
//! - Actor records with page-level and per-action overrides ([`Actor`])
//! - Role definitions and the role catalog ([`RoleDefinition`], [`RoleCatalog`])
//! - The pure evaluation engine ([`PermissionEngine`])
//! - Menu visibility directives ([`MenuCatalog`], [`VisibilityDirective`])
//! - The permission editor view model ([`PermissionEditor`], [`EditorView`])
//!
//! Nothing here performs I/O. The identity-store backed entry points live in
//! `backoffice-server-permissions` and delegate to [`PermissionEngine`].
//!
//! # Example
//!
//! ```
//! use backoffice_permissions_core::{Action, Actor, PermissionEngine, RoleCatalog, RoleId, Section};
//!
//! let engine = PermissionEngine::new(RoleCatalog::builtin());
//! let actor = Actor::new("uid-1")
//!     .with_role(RoleId::OrdersManager)
//!     .with_custom_permission(Section::Orders, Action::Delete, false);
//!
//! assert!(engine.evaluate(Some(&actor), &Section::Orders, &Action::Edit));
//! assert!(!engine.evaluate(Some(&actor), &Section::Orders, &Action::Delete));
//! ```

pub mod actor;
pub mod catalog;
pub mod editor;
pub mod engine;
pub mod error;
pub mod menu;
pub mod role;

pub use actor::{Actor, ActorPatch, CustomPermissions, PagePermissions};
pub use catalog::{Action, ActorId, RoleId, Section};
pub use editor::{
	EditorCheckbox, EditorSection, EditorSubmission, EditorView, PermissionEditor, PermissionMatrix,
	RoleOption,
};
pub use engine::{Decision, DecisionReason, PermissionEngine};
pub use error::{PermissionsError, Result};
pub use menu::{MenuCatalog, MenuEntry, Visibility, VisibilityDirective};
pub use role::{GrantMatch, Grants, RoleCatalog, RoleDefinition, SectionGrant};
