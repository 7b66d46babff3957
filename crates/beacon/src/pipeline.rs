// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Flush and retry paths shared by the delivery loop and the intake signal.

use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::batch::Accumulator;
use crate::dispatch::Dispatcher;
use crate::encoder::BatchEncoder;
use crate::payload::Payload;
use crate::retry::{Rejected, RetryQueue};
use crate::stats::{DeliveryStats, DropReason};

pub(crate) struct Pipeline {
	api_key: String,
	batch_size: usize,
	max_retry: u32,
	accumulator: Accumulator,
	encoder: Arc<dyn BatchEncoder>,
	dispatcher: Dispatcher,
	retries: RetryQueue,
	stats: Arc<DeliveryStats>,
}

impl Pipeline {
	pub(crate) fn new(
		api_key: String,
		batch_size: usize,
		max_retry: u32,
		encoder: Arc<dyn BatchEncoder>,
		dispatcher: Dispatcher,
		retries: RetryQueue,
		stats: Arc<DeliveryStats>,
	) -> Self {
		Self {
			api_key,
			batch_size,
			max_retry,
			accumulator: Accumulator::new(),
			encoder,
			dispatcher,
			retries,
			stats,
		}
	}

	pub(crate) fn accumulator(&self) -> &Accumulator {
		&self.accumulator
	}

	pub(crate) fn retries(&self) -> &RetryQueue {
		&self.retries
	}

	/// Extracts one batch, encodes it and makes the first delivery attempt.
	///
	/// Returns `false` when there was nothing to flush.
	pub(crate) async fn flush(&self) -> bool {
		let payload = {
			let mut pending = self.accumulator.lock().await;
			let Some(batch) = pending.take_batch(self.batch_size) else {
				return false;
			};
			match self.encoder.encode(&self.api_key, &batch) {
				Ok(body) => Payload::new(body, batch.len()),
				Err(e) => {
					error!(error = %e, events = batch.len(), "Failed to encode batch, events lost");
					self.record_drop(batch.len(), DropReason::Encode);
					return true;
				}
			}
		};

		self.deliver(payload).await;
		true
	}

	/// Flushes until the accumulator is empty.
	pub(crate) async fn flush_all(&self) {
		while self.flush().await {}
	}

	/// Re-sends every retry payload that is currently due.
	pub(crate) async fn retry_ready(&self) {
		while let Some(payload) = self.retries.pop_ready().await {
			debug!(
				events = payload.size(),
				attempts = payload.attempts(),
				"Retrying batch"
			);
			self.deliver(payload).await;
		}
	}

	/// Closes the retry queue and gives each queued payload one final attempt.
	pub(crate) async fn drain_retries(&self) {
		let remaining = self.retries.close().await;
		if !remaining.is_empty() {
			debug!(payloads = remaining.len(), "Draining retry queue");
		}

		for mut payload in remaining {
			if self.dispatcher.send(&mut payload).await.is_err() {
				error!(
					events = payload.size(),
					attempts = payload.attempts(),
					"Send batch failed during shutdown, events lost"
				);
				self.record_drop(payload.size(), DropReason::Shutdown);
			}
		}
	}

	async fn deliver(&self, mut payload: Payload) {
		if self.dispatcher.send(&mut payload).await.is_ok() {
			return;
		}

		if payload.attempts() > self.max_retry {
			warn!(
				events = payload.size(),
				attempts = payload.attempts(),
				"Batch dropped after exhausting retries"
			);
			self.record_drop(payload.size(), DropReason::RetriesExhausted);
			return;
		}

		match self.retries.push(payload).await {
			Ok(()) => {}
			Err(Rejected::Full(payload)) => {
				warn!(
					events = payload.size(),
					attempts = payload.attempts(),
					"Retry queue full, batch dropped"
				);
				self.record_drop(payload.size(), DropReason::RetryQueueFull);
			}
			Err(Rejected::Closed(payload)) => {
				error!(
					events = payload.size(),
					attempts = payload.attempts(),
					"Retry queue closed, events lost"
				);
				self.record_drop(payload.size(), DropReason::Shutdown);
			}
		}
	}

	fn record_drop(&self, events: usize, reason: DropReason) {
		debug!(events, reason = %reason, "Recording dropped batch");
		self.stats.record_dropped(events);
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::encoder::JsonEncoder;
	use crate::testing::{FailingEncoder, MockTransport};
	use beacon_core::Event;
	use std::time::Duration;

	fn pipeline(
		transport: Arc<MockTransport>,
		batch_size: usize,
		max_retry: u32,
		retry_capacity: usize,
	) -> (Pipeline, Arc<DeliveryStats>) {
		let stats = Arc::new(DeliveryStats::default());
		let pipeline = Pipeline::new(
			"foo".to_string(),
			batch_size,
			max_retry,
			Arc::new(JsonEncoder::default()),
			Dispatcher::new(transport, stats.clone()),
			RetryQueue::new(retry_capacity, Duration::ZERO),
			stats.clone(),
		);
		(pipeline, stats)
	}

	#[tokio::test]
	async fn flush_on_empty_accumulator_is_noop() {
		let transport = Arc::new(MockTransport::new());
		let (pipeline, _) = pipeline(transport.clone(), 2, 3, 10);

		assert!(!pipeline.flush().await);
		assert_eq!(transport.calls(), 0);
	}

	#[tokio::test]
	async fn flush_sends_at_most_batch_size() {
		let transport = Arc::new(MockTransport::new());
		let (pipeline, _) = pipeline(transport.clone(), 2, 3, 10);
		for i in 0..3 {
			pipeline.accumulator().push(Event::new(format!("e{i}"))).await;
		}

		assert!(pipeline.flush().await);
		assert_eq!(transport.batch_sizes(), vec![2]);
		assert_eq!(pipeline.accumulator().len().await, 1);

		pipeline.flush_all().await;
		assert_eq!(transport.batch_sizes(), vec![2, 1]);
		assert_eq!(transport.event_types(), vec!["e0", "e1", "e2"]);
	}

	#[tokio::test]
	async fn failed_flush_lands_in_retry_queue() {
		let transport = Arc::new(MockTransport::failing_first(1));
		let (pipeline, stats) = pipeline(transport.clone(), 5, 2, 10);
		pipeline.accumulator().push(Event::new("e")).await;

		pipeline.flush().await;
		assert_eq!(pipeline.retries().len().await, 1);

		pipeline.retry_ready().await;
		assert_eq!(pipeline.retries().len().await, 0);
		assert_eq!(transport.calls(), 2);
		assert_eq!(stats.snapshot().delivered_events, 1);
	}

	#[tokio::test]
	async fn retries_stop_after_max_retry() {
		let transport = Arc::new(MockTransport::always_failing());
		let (pipeline, stats) = pipeline(transport.clone(), 5, 2, 10);
		pipeline.accumulator().push(Event::new("e")).await;

		pipeline.flush().await;
		for _ in 0..5 {
			pipeline.retry_ready().await;
		}

		assert_eq!(transport.calls(), 3);
		let snap = stats.snapshot();
		assert_eq!(snap.dropped_batches, 1);
		assert_eq!(snap.dropped_events, 1);
		assert_eq!(pipeline.retries().len().await, 0);
	}

	#[tokio::test]
	async fn zero_max_retry_drops_after_first_failure() {
		let transport = Arc::new(MockTransport::always_failing());
		let (pipeline, stats) = pipeline(transport.clone(), 5, 0, 10);
		pipeline.accumulator().push(Event::new("e")).await;

		pipeline.flush().await;

		assert_eq!(transport.calls(), 1);
		assert_eq!(pipeline.retries().len().await, 0);
		assert_eq!(stats.snapshot().dropped_batches, 1);
	}

	#[tokio::test]
	async fn full_retry_queue_drops_batch() {
		let transport = Arc::new(MockTransport::always_failing());
		let (pipeline, stats) = pipeline(transport.clone(), 1, 3, 1);
		pipeline.accumulator().push(Event::new("a")).await;
		pipeline.accumulator().push(Event::new("b")).await;

		pipeline.flush_all().await;

		assert_eq!(pipeline.retries().len().await, 1);
		assert_eq!(stats.snapshot().dropped_events, 1);
	}

	#[tokio::test]
	async fn drain_gives_each_retry_one_final_attempt() {
		let transport = Arc::new(MockTransport::failing_first(1));
		let (pipeline, stats) = pipeline(transport.clone(), 5, 3, 10);
		pipeline.accumulator().push(Event::new("e")).await;
		pipeline.flush().await;

		pipeline.drain_retries().await;

		assert_eq!(transport.calls(), 2);
		assert_eq!(stats.snapshot().delivered_events, 1);
		assert!(matches!(
			pipeline.retries().push(Payload::new(bytes::Bytes::new(), 1)).await,
			Err(Rejected::Closed(_))
		));
	}

	#[tokio::test]
	async fn drain_reports_payloads_that_still_fail() {
		let transport = Arc::new(MockTransport::always_failing());
		let (pipeline, stats) = pipeline(transport.clone(), 5, 3, 10);
		pipeline.accumulator().push(Event::new("e")).await;
		pipeline.flush().await;

		pipeline.drain_retries().await;

		assert_eq!(transport.calls(), 2);
		assert_eq!(stats.snapshot().dropped_events, 1);
	}

	#[tokio::test]
	async fn encode_failure_drops_batch_without_sending() {
		let transport = Arc::new(MockTransport::new());
		let stats = Arc::new(DeliveryStats::default());
		let pipeline = Pipeline::new(
			"foo".to_string(),
			10,
			3,
			Arc::new(FailingEncoder),
			Dispatcher::new(transport.clone(), stats.clone()),
			RetryQueue::new(10, Duration::ZERO),
			stats.clone(),
		);
		pipeline.accumulator().push(Event::new("a")).await;
		pipeline.accumulator().push(Event::new("b")).await;

		assert!(pipeline.flush().await);

		assert_eq!(transport.calls(), 0);
		assert_eq!(pipeline.accumulator().len().await, 0);
		assert_eq!(pipeline.retries().len().await, 0);
		assert_eq!(stats.snapshot().dropped_events, 2);
	}
}
