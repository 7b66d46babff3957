// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Analytics event schema.
//!
//! Field names follow the HTTP API v2 ingestion format. Every optional field is
//! omitted from the serialized event when unset.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::properties::Properties;

/// Tracking plan metadata attached to an event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Plan {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub branch: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub source: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub version: Option<String>,
}

/// A single analytics event.
///
/// Only `event_type` is required. The ingestion endpoint additionally expects
/// either `user_id` or `device_id` to be present, but that is validated
/// server-side and reported back through [`crate::ErrorResponse`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Event {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub user_id: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub device_id: Option<String>,
	pub event_type: String,
	/// Event time in unix seconds.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub time: Option<i64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub event_properties: Option<Map<String, Value>>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub user_properties: Option<Map<String, Value>>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub groups: Option<Map<String, Value>>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub app_version: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub platform: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub os_name: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub os_version: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub device_brand: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub device_manufacturer: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub device_model: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub carrier: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub country: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub region: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub city: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub dma: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub language: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub price: Option<f64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub quantity: Option<i64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub revenue: Option<f64>,
	#[serde(rename = "productId", skip_serializing_if = "Option::is_none")]
	pub product_id: Option<String>,
	#[serde(rename = "revenueType", skip_serializing_if = "Option::is_none")]
	pub revenue_type: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub location_lat: Option<f64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub location_lng: Option<f64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub ip: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub idfa: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub idfv: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub adid: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub android_id: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub event_id: Option<i64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub session_id: Option<i64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub insert_id: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub plan: Option<Plan>,
}

impl Event {
	/// Creates an event of the given type with every optional field unset.
	pub fn new(event_type: impl Into<String>) -> Self {
		Self {
			event_type: event_type.into(),
			..Default::default()
		}
	}

	pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
		self.user_id = Some(user_id.into());
		self
	}

	pub fn with_device_id(mut self, device_id: impl Into<String>) -> Self {
		self.device_id = Some(device_id.into());
		self
	}

	/// Sets the event time from a UTC timestamp, truncated to whole seconds.
	pub fn with_time(mut self, time: DateTime<Utc>) -> Self {
		self.time = Some(time.timestamp());
		self
	}

	pub fn with_insert_id(mut self, insert_id: impl Into<String>) -> Self {
		self.insert_id = Some(insert_id.into());
		self
	}

	pub fn with_event_properties(mut self, properties: Properties) -> Self {
		self.event_properties = Some(properties.into_map());
		self
	}

	pub fn with_user_properties(mut self, properties: Properties) -> Self {
		self.user_properties = Some(properties.into_map());
		self
	}

	pub fn with_groups(mut self, groups: Properties) -> Self {
		self.groups = Some(groups.into_map());
		self
	}

	pub fn with_plan(mut self, plan: Plan) -> Self {
		self.plan = Some(plan);
		self
	}

	/// Fills in `time` with `now` when the caller left it unset.
	///
	/// Returns the effective event time.
	pub fn stamp_if_missing(&mut self, now: DateTime<Utc>) -> i64 {
		*self.time.get_or_insert_with(|| now.timestamp())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::TimeZone;

	#[test]
	fn new_event_serializes_only_event_type() {
		let json = serde_json::to_string(&Event::new("app.opened")).unwrap();
		assert_eq!(json, r#"{"event_type":"app.opened"}"#);
	}

	#[test]
	fn stamp_if_missing_sets_unset_time() {
		let now = Utc.with_ymd_and_hms(2022, 1, 28, 10, 53, 37).unwrap();
		let mut event = Event::new("user.created");

		assert_eq!(event.stamp_if_missing(now), 1643367217);
		assert_eq!(event.time, Some(1643367217));
	}

	#[test]
	fn stamp_if_missing_keeps_caller_time() {
		let now = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
		let mut event = Event::new("user.created");
		event.time = Some(42);

		assert_eq!(event.stamp_if_missing(now), 42);
		assert_eq!(event.time, Some(42));
	}

	#[test]
	fn revenue_fields_use_camel_case_names() {
		let event = Event {
			product_id: Some("sku-1".to_string()),
			revenue_type: Some("purchase".to_string()),
			..Event::new("order.completed")
		};
		let value = serde_json::to_value(&event).unwrap();

		assert_eq!(value["productId"], "sku-1");
		assert_eq!(value["revenueType"], "purchase");
		assert!(value.get("product_id").is_none());
	}

	#[test]
	fn plan_omits_unset_fields() {
		let event = Event::new("x").with_plan(Plan {
			branch: Some("main".to_string()),
			..Default::default()
		});
		let value = serde_json::to_value(&event).unwrap();

		assert_eq!(value["plan"], serde_json::json!({ "branch": "main" }));
	}

	#[test]
	fn properties_builder_lands_in_event_properties() {
		let event = Event::new("clicked").with_event_properties(
			Properties::new().insert("from", "mobile").insert("count", 3),
		);
		let props = event.event_properties.unwrap();

		assert_eq!(props["from"], "mobile");
		assert_eq!(props["count"], 3);
	}
}
