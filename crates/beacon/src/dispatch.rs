// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Single-attempt batch delivery.

use std::sync::Arc;
use std::time::Duration;

use beacon_core::ErrorResponse;
use bytes::Bytes;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use tracing::{debug, warn};

use crate::error::{BeaconError, Result};
use crate::payload::Payload;
use crate::stats::DeliveryStats;

/// Sends an encoded batch to the ingestion endpoint.
///
/// Implementations make exactly one attempt and classify the outcome; retry
/// policy belongs to the caller.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
	async fn send(&self, body: Bytes) -> Result<()>;
}

/// Default transport: a JSON `POST` over `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
	client: Client,
	endpoint: String,
}

impl HttpTransport {
	/// Builds a transport with the Beacon User-Agent and the given request timeout.
	pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
		let client = beacon_common_http::client_with_timeout(timeout)?;
		Ok(Self::with_client(client, endpoint))
	}

	/// Uses a caller-configured `reqwest::Client` as-is.
	pub fn with_client(client: Client, endpoint: impl Into<String>) -> Self {
		Self {
			client,
			endpoint: endpoint.into(),
		}
	}

	pub fn endpoint(&self) -> &str {
		&self.endpoint
	}
}

#[async_trait::async_trait]
impl Transport for HttpTransport {
	async fn send(&self, body: Bytes) -> Result<()> {
		let response = self
			.client
			.post(&self.endpoint)
			.header(CONTENT_TYPE, "application/json")
			.header(ACCEPT, "application/json")
			.body(body)
			.send()
			.await?;

		let status = response.status();
		if status.is_success() {
			return Ok(());
		}

		// A body we cannot read or decode still counts as a rejection.
		let detail = match response.bytes().await {
			Ok(body) => ErrorResponse::parse(&body),
			Err(e) => {
				debug!(error = %e, "failed to read error response body");
				None
			}
		};

		Err(BeaconError::ServerError {
			status: status.as_u16(),
			detail,
		})
	}
}

/// Performs one delivery attempt per call and records it.
pub(crate) struct Dispatcher {
	transport: Arc<dyn Transport>,
	stats: Arc<DeliveryStats>,
}

impl Dispatcher {
	pub(crate) fn new(transport: Arc<dyn Transport>, stats: Arc<DeliveryStats>) -> Self {
		Self { transport, stats }
	}

	/// Sends `payload` once, bumping its attempt counter first.
	pub(crate) async fn send(&self, payload: &mut Payload) -> Result<()> {
		let attempt = payload.record_attempt();
		self.stats.record_attempt();
		debug!(events = payload.size(), attempt, "Sending batch");

		match self.transport.send(payload.body().clone()).await {
			Ok(()) => {
				self.stats.record_delivered(payload.size());
				debug!(events = payload.size(), attempt, "Batch delivered");
				Ok(())
			}
			Err(e) => {
				self.stats.record_failed_attempt();
				warn!(error = %e, events = payload.size(), attempt, "Batch delivery failed");
				Err(e)
			}
		}
	}
}
