// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Test doubles for the transport and encoder seams.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use beacon_core::{CoreError, Event, RequestPayload};
use bytes::Bytes;

use crate::dispatch::Transport;
use crate::encoder::BatchEncoder;
use crate::error::{BeaconError, Result};

/// Records every batch it receives and fails the first `fail_first` calls.
pub struct MockTransport {
	calls: AtomicUsize,
	fail_first: usize,
	delay: Option<std::time::Duration>,
	delivered: Mutex<Vec<RequestPayload>>,
}

impl MockTransport {
	pub fn new() -> Self {
		Self::failing_first(0)
	}

	pub fn failing_first(fail_first: usize) -> Self {
		Self {
			calls: AtomicUsize::new(0),
			fail_first,
			delay: None,
			delivered: Mutex::new(Vec::new()),
		}
	}

	/// Holds every send for `delay` before answering.
	pub fn with_delay(mut self, delay: std::time::Duration) -> Self {
		self.delay = Some(delay);
		self
	}

	pub fn always_failing() -> Self {
		Self::failing_first(usize::MAX)
	}

	pub fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}

	/// Sizes of successfully delivered batches, in delivery order.
	pub fn batch_sizes(&self) -> Vec<usize> {
		self
			.delivered
			.lock()
			.unwrap()
			.iter()
			.map(|p| p.events.len())
			.collect()
	}

	/// Event types across all delivered batches, in delivery order.
	pub fn event_types(&self) -> Vec<String> {
		self
			.delivered
			.lock()
			.unwrap()
			.iter()
			.flat_map(|p| p.events.iter().map(|e| e.event_type.clone()))
			.collect()
	}

	pub fn delivered(&self) -> Vec<RequestPayload> {
		self.delivered.lock().unwrap().clone()
	}
}

#[async_trait::async_trait]
impl Transport for MockTransport {
	async fn send(&self, body: Bytes) -> Result<()> {
		let call = self.calls.fetch_add(1, Ordering::SeqCst);
		if let Some(delay) = self.delay {
			tokio::time::sleep(delay).await;
		}
		if call < self.fail_first {
			return Err(BeaconError::ServerError {
				status: 500,
				detail: None,
			});
		}
		let payload: RequestPayload =
			serde_json::from_slice(&body).expect("mock transport received invalid JSON");
		self.delivered.lock().unwrap().push(payload);
		Ok(())
	}
}

/// Encoder that rejects every batch.
pub struct FailingEncoder;

impl BatchEncoder for FailingEncoder {
	fn encode(&self, _api_key: &str, _events: &[Event]) -> beacon_core::Result<Bytes> {
		let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
		Err(CoreError::from(err))
	}
}

/// Polls `condition` every 10ms until it holds or `timeout` elapses.
pub async fn wait_until(timeout: std::time::Duration, condition: impl Fn() -> bool) -> bool {
	let deadline = tokio::time::Instant::now() + timeout;
	while tokio::time::Instant::now() < deadline {
		if condition() {
			return true;
		}
		tokio::time::sleep(std::time::Duration::from_millis(10)).await;
	}
	condition()
}
