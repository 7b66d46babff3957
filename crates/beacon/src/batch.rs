// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Pending-event accumulator.

use std::collections::VecDeque;

use beacon_core::Event;
use tokio::sync::{Mutex, MutexGuard};

/// Events received by the delivery loop that have not been batched yet.
#[derive(Debug, Default)]
pub(crate) struct Pending {
	events: VecDeque<Event>,
}

impl Pending {
	pub(crate) fn len(&self) -> usize {
		self.events.len()
	}

	/// Removes up to `max` events from the front, oldest first.
	///
	/// Returns `None` when nothing is pending, so callers never see an empty batch.
	pub(crate) fn take_batch(&mut self, max: usize) -> Option<Vec<Event>> {
		if self.events.is_empty() || max == 0 {
			return None;
		}
		let end = max.min(self.events.len());
		Some(self.events.drain(..end).collect())
	}
}

/// Shared accumulator guarded by a single lock.
///
/// The delivery loop appends; flushes from the loop, the ticker and the
/// buffer-full signal all extract through [`Accumulator::lock`].
#[derive(Debug, Default)]
pub(crate) struct Accumulator {
	pending: Mutex<Pending>,
}

impl Accumulator {
	pub(crate) fn new() -> Self {
		Self::default()
	}

	/// Appends an event and returns the pending count afterwards.
	pub(crate) async fn push(&self, event: Event) -> usize {
		let mut pending = self.pending.lock().await;
		pending.events.push_back(event);
		pending.len()
	}

	pub(crate) async fn len(&self) -> usize {
		self.pending.lock().await.len()
	}

	pub(crate) async fn lock(&self) -> MutexGuard<'_, Pending> {
		self.pending.lock().await
	}
}
