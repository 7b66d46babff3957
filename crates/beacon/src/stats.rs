// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Delivery counters.

use std::sync::atomic::{AtomicU64, Ordering};

/// Why a batch was discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DropReason {
	/// The batch could not be encoded.
	Encode,
	/// Every allowed attempt failed.
	RetriesExhausted,
	/// The retry queue had no room.
	RetryQueueFull,
	/// The final attempt during shutdown failed.
	Shutdown,
}

impl DropReason {
	pub(crate) fn as_str(&self) -> &'static str {
		match self {
			DropReason::Encode => "encode_failed",
			DropReason::RetriesExhausted => "retries_exhausted",
			DropReason::RetryQueueFull => "retry_queue_full",
			DropReason::Shutdown => "shutdown",
		}
	}
}

impl std::fmt::Display for DropReason {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.as_str())
	}
}

/// Live counters shared by the intake, dispatcher and retry path.
#[derive(Debug, Default)]
pub(crate) struct DeliveryStats {
	submitted_events: AtomicU64,
	attempts: AtomicU64,
	failed_attempts: AtomicU64,
	delivered_batches: AtomicU64,
	delivered_events: AtomicU64,
	dropped_batches: AtomicU64,
	dropped_events: AtomicU64,
}

impl DeliveryStats {
	pub(crate) fn record_submitted(&self) {
		self.submitted_events.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_attempt(&self) {
		self.attempts.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_failed_attempt(&self) {
		self.failed_attempts.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_delivered(&self, events: usize) {
		self.delivered_batches.fetch_add(1, Ordering::Relaxed);
		self.delivered_events.fetch_add(events as u64, Ordering::Relaxed);
	}

	pub(crate) fn record_dropped(&self, events: usize) {
		self.dropped_batches.fetch_add(1, Ordering::Relaxed);
		self.dropped_events.fetch_add(events as u64, Ordering::Relaxed);
	}

	pub(crate) fn snapshot(&self) -> StatsSnapshot {
		StatsSnapshot {
			submitted_events: self.submitted_events.load(Ordering::Relaxed),
			attempts: self.attempts.load(Ordering::Relaxed),
			failed_attempts: self.failed_attempts.load(Ordering::Relaxed),
			delivered_batches: self.delivered_batches.load(Ordering::Relaxed),
			delivered_events: self.delivered_events.load(Ordering::Relaxed),
			dropped_batches: self.dropped_batches.load(Ordering::Relaxed),
			dropped_events: self.dropped_events.load(Ordering::Relaxed),
		}
	}
}

/// Point-in-time copy of the client's delivery counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
	pub submitted_events: u64,
	pub attempts: u64,
	pub failed_attempts: u64,
	pub delivered_batches: u64,
	pub delivered_events: u64,
	pub dropped_batches: u64,
	pub dropped_events: u64,
}

impl StatsSnapshot {
	/// Events neither delivered nor dropped yet.
	pub fn in_flight_events(&self) -> u64 {
		self
			.submitted_events
			.saturating_sub(self.delivered_events + self.dropped_events)
	}
}
