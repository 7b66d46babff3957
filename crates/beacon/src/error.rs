// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for the Beacon client.

use beacon_core::{CoreError, ErrorResponse};
use thiserror::Error;

/// Beacon client errors.
///
/// Only `Closed` and `AlreadyClosed` reach callers of the running client.
/// Delivery and encoding failures are absorbed by the background loop and
/// surface as logs and [`crate::StatsSnapshot`] counters instead.
#[derive(Debug, Error)]
pub enum BeaconError {
	/// An event was submitted after shutdown began.
	#[error("the client is closed")]
	Closed,

	/// `close` was called more than once.
	#[error("the client was already closed")]
	AlreadyClosed,

	/// API key is missing or blank.
	#[error("API key is required")]
	MissingApiKey,

	/// Endpoint is not an http(s) URL.
	#[error("invalid endpoint: {0}")]
	InvalidEndpoint(String),

	/// A configuration value is out of range or unparsable.
	#[error("invalid configuration: {0}")]
	InvalidConfig(String),

	/// The client was built outside a tokio runtime.
	#[error("no tokio runtime available to run the delivery loop")]
	NoRuntime,

	/// HTTP request failed before a response was received (connect, timeout).
	#[error("HTTP request failed: {0}")]
	RequestFailed(#[from] reqwest::Error),

	/// The endpoint answered with a non-success status.
	#[error("server rejected batch (status {status}){}", render_detail(.detail))]
	ServerError {
		status: u16,
		/// Decoded error body, when the server sent one.
		detail: Option<ErrorResponse>,
	},

	/// The batch could not be encoded.
	#[error(transparent)]
	Encode(#[from] CoreError),
}

fn render_detail(detail: &Option<ErrorResponse>) -> String {
	detail
		.as_ref()
		.map(|detail| format!(": {detail}"))
		.unwrap_or_default()
}

/// Result type alias for Beacon operations.
pub type Result<T> = std::result::Result<T, BeaconError>;
