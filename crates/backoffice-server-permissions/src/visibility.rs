// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Destinations for menu visibility directives.

use std::collections::BTreeMap;

use backoffice_permissions_core::{Visibility, VisibilityDirective};
use parking_lot::Mutex;

/// Receives show/hide directives for page elements.
///
/// Directives for the same selector may arrive from overlapping passes; the
/// last one applied wins.
pub trait VisibilitySink: Send + Sync {
	fn apply(&self, directive: VisibilityDirective);
}

/// Sink that keeps the current state of every selector it has seen.
#[derive(Debug, Default)]
pub struct RecordingSink {
	state: Mutex<BTreeMap<String, Visibility>>,
	applied: Mutex<usize>,
}

impl RecordingSink {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn visibility(&self, selector: &str) -> Option<Visibility> {
		self.state.lock().get(selector).copied()
	}

	pub fn is_hidden(&self, selector: &str) -> bool {
		self.visibility(selector) == Some(Visibility::Hidden)
	}

	/// Total number of directives applied, including overwrites.
	pub fn applied_count(&self) -> usize {
		*self.applied.lock()
	}

	/// Current state as directives, ordered by selector.
	pub fn snapshot(&self) -> Vec<VisibilityDirective> {
		self
			.state
			.lock()
			.iter()
			.map(|(selector, visibility)| VisibilityDirective {
				selector: selector.clone(),
				visibility: *visibility,
			})
			.collect()
	}

	/// Stylesheet hiding every currently hidden selector.
	pub fn stylesheet(&self) -> String {
		self
			.snapshot()
			.iter()
			.filter_map(VisibilityDirective::css_rule)
			.collect::<Vec<_>>()
			.join("\n")
	}
}

impl VisibilitySink for RecordingSink {
	fn apply(&self, directive: VisibilityDirective) {
		self
			.state
			.lock()
			.insert(directive.selector, directive.visibility);
		*self.applied.lock() += 1;
	}
}
