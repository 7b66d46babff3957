// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Encoded batches and their delivery bookkeeping.

use bytes::Bytes;
use tokio::time::Instant;

/// An encoded batch together with its attempt counter.
///
/// A payload is moved between the flush path, the dispatcher and the retry
/// queue; it is never shared.
#[derive(Debug)]
pub(crate) struct Payload {
	body: Bytes,
	size: usize,
	attempts: u32,
	ready_at: Instant,
}

impl Payload {
	/// Wraps an encoded body carrying `size` events.
	pub(crate) fn new(body: Bytes, size: usize) -> Self {
		Self {
			body,
			size,
			attempts: 0,
			ready_at: Instant::now(),
		}
	}

	pub(crate) fn body(&self) -> &Bytes {
		&self.body
	}

	/// Number of events in the batch.
	pub(crate) fn size(&self) -> usize {
		self.size
	}

	/// Delivery attempts made so far.
	pub(crate) fn attempts(&self) -> u32 {
		self.attempts
	}

	/// Earliest instant at which a retry may be attempted.
	pub(crate) fn ready_at(&self) -> Instant {
		self.ready_at
	}

	pub(crate) fn record_attempt(&mut self) -> u32 {
		self.attempts += 1;
		self.attempts
	}

	pub(crate) fn defer_until(&mut self, at: Instant) {
		self.ready_at = at;
	}
}
