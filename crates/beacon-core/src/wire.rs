// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Request and error-response bodies exchanged with the ingestion endpoint.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::event::Event;

/// Optional ingestion settings sent alongside a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadOptions {
	/// Minimum accepted length of `user_id` and `device_id`.
	pub min_id_length: u32,
}

/// Body of a batch upload request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestPayload {
	pub api_key: String,
	pub events: Vec<Event>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub options: Option<PayloadOptions>,
}

#[derive(Serialize)]
struct RequestPayloadRef<'a> {
	api_key: &'a str,
	events: &'a [Event],
	#[serde(skip_serializing_if = "Option::is_none")]
	options: Option<&'a PayloadOptions>,
}

/// Encodes a batch into the JSON request body without cloning the events.
pub fn encode_request(
	api_key: &str,
	events: &[Event],
	options: Option<&PayloadOptions>,
) -> Result<Bytes> {
	let body = serde_json::to_vec(&RequestPayloadRef {
		api_key,
		events,
		options,
	})?;
	Ok(Bytes::from(body))
}

/// Error body returned by the ingestion endpoint on a rejected batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
	#[serde(default)]
	pub code: i32,
	#[serde(rename = "error", default)]
	pub message: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub missing_field: Option<String>,
}

impl ErrorResponse {
	/// Parses an error body, returning `None` when it is not the expected shape.
	pub fn parse(body: &[u8]) -> Option<Self> {
		serde_json::from_slice(body).ok()
	}
}

impl std::fmt::Display for ErrorResponse {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}: {}", self.code, self.message)?;
		match self.missing_field.as_deref() {
			Some(field) if !field.is_empty() => write!(f, ": missing: {field}"),
			_ => Ok(()),
		}
	}
}

impl std::error::Error for ErrorResponse {}

#[cfg(test)]
mod tests {
	use super::*;

	fn sample_event() -> Event {
		Event {
			user_id: Some("f892be22-8f8e-445d-83b0-af199b9a5c72".to_string()),
			device_id: Some("0a16e988-8f70-4877-bdc6-08997832cfff".to_string()),
			time: Some(1643367217),
			platform: Some("ios".to_string()),
			os_name: Some("iOS".to_string()),
			os_version: Some("15.2.1".to_string()),
			device_model: Some("iPhone13,3".to_string()),
			language: Some("fr-FR".to_string()),
			insert_id: Some("a5461410-6b12-4a7a-905d-166cc00af4b2".to_string()),
			..Event::new("user.created")
		}
	}

	#[test]
	fn encodes_batch_in_wire_field_order() {
		let body = encode_request("foo", &[sample_event()], None).unwrap();

		assert_eq!(
			std::str::from_utf8(&body).unwrap(),
			r#"{"api_key":"foo","events":[{"user_id":"f892be22-8f8e-445d-83b0-af199b9a5c72","device_id":"0a16e988-8f70-4877-bdc6-08997832cfff","event_type":"user.created","time":1643367217,"platform":"ios","os_name":"iOS","os_version":"15.2.1","device_model":"iPhone13,3","language":"fr-FR","insert_id":"a5461410-6b12-4a7a-905d-166cc00af4b2"}]}"#
		);
	}

	#[test]
	fn encodes_options_when_present() {
		let options = PayloadOptions { min_id_length: 4 };
		let body = encode_request("foo", &[Event::new("x")], Some(&options)).unwrap();
		let decoded: RequestPayload = serde_json::from_slice(&body).unwrap();

		assert_eq!(decoded.api_key, "foo");
		assert_eq!(decoded.events.len(), 1);
		assert_eq!(decoded.options, Some(options));
	}

	#[test]
	fn error_response_display_includes_missing_field() {
		let err = ErrorResponse::parse(
			br#"{"code":400,"error":"Request missing required field","missing_field":"api_key"}"#,
		)
		.unwrap();

		assert_eq!(
			err.to_string(),
			"400: Request missing required field: missing: api_key"
		);
	}

	#[test]
	fn error_response_display_without_missing_field() {
		let err = ErrorResponse::parse(br#"{"code":429,"error":"Too many requests"}"#).unwrap();
		assert_eq!(err.to_string(), "429: Too many requests");
	}

	#[test]
	fn error_response_parse_rejects_non_json() {
		assert!(ErrorResponse::parse(b"<html>bad gateway</html>").is_none());
	}
}
