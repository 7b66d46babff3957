// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Free-form property maps for `event_properties`, `user_properties` and `groups`.

use serde_json::{Map, Value};

/// Chainable builder for a JSON property map.
///
/// ```
/// use beacon_core::{Event, Properties};
///
/// let event = Event::new("checkout.completed")
///     .with_user_id("user-demo")
///     .with_event_properties(Properties::new().insert("from", "mobile").insert("items", 3));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Properties(Map<String, Value>);

impl Properties {
	pub fn new() -> Self {
		Self(Map::new())
	}

	/// Adds `key`, replacing any earlier value under the same key.
	pub fn insert<K, V>(mut self, key: K, value: V) -> Self
	where
		K: Into<String>,
		V: Into<Value>,
	{
		self.0.insert(key.into(), value.into());
		self
	}

	/// Adds `key` only when `value` is present.
	pub fn insert_opt<K, V>(self, key: K, value: Option<V>) -> Self
	where
		K: Into<String>,
		V: Into<Value>,
	{
		match value {
			Some(value) => self.insert(key, value),
			None => self,
		}
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn into_map(self) -> Map<String, Value> {
		self.0
	}
}

impl From<Map<String, Value>> for Properties {
	fn from(map: Map<String, Value>) -> Self {
		Self(map)
	}
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Properties {
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
	}
}
