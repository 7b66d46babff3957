// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! HTTP client construction with the Beacon User-Agent header.

use reqwest::{Client, ClientBuilder};
use std::time::Duration;

const SDK_NAME: &str = "beacon";
const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Creates a client builder with the standard Beacon User-Agent header.
///
/// Use this when you need to customize the client further (proxies, TLS).
pub fn builder() -> ClientBuilder {
	Client::builder().user_agent(user_agent())
}

/// Builds a client whose requests time out after `timeout`.
///
/// The timeout covers the whole request, from connect until the response
/// body has been read.
pub fn client_with_timeout(timeout: Duration) -> reqwest::Result<Client> {
	builder().timeout(timeout).build()
}

/// Returns the standard Beacon User-Agent string.
///
/// Format: `beacon/{version} ({os}-{arch})`
pub fn user_agent() -> String {
	format!(
		"{SDK_NAME}/{SDK_VERSION} ({}-{})",
		std::env::consts::OS,
		std::env::consts::ARCH
	)
}
