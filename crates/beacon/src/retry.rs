// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Bounded queue of failed payloads awaiting another attempt.

use std::collections::VecDeque;
use std::time::Duration;

use tokio::sync::{Mutex, Notify};
use tokio::time::Instant;

use crate::payload::Payload;

/// Why the queue refused a payload. The payload is handed back.
#[derive(Debug)]
pub(crate) enum Rejected {
	Full(Payload),
	Closed(Payload),
}

#[derive(Debug, Default)]
struct State {
	queue: VecDeque<Payload>,
	closed: bool,
}

/// FIFO of failed payloads, each held back until its retry interval elapses.
///
/// Every payload waits the same interval, so readiness follows queue order and
/// only the front needs to be inspected.
#[derive(Debug)]
pub(crate) struct RetryQueue {
	state: Mutex<State>,
	pushed: Notify,
	capacity: usize,
	interval: Duration,
}

impl RetryQueue {
	pub(crate) fn new(capacity: usize, interval: Duration) -> Self {
		Self {
			state: Mutex::new(State::default()),
			pushed: Notify::new(),
			capacity,
			interval,
		}
	}

	/// Queues `payload` for a retry after the configured interval.
	pub(crate) async fn push(&self, mut payload: Payload) -> Result<(), Rejected> {
		let mut state = self.state.lock().await;
		if state.closed {
			return Err(Rejected::Closed(payload));
		}
		if state.queue.len() >= self.capacity {
			return Err(Rejected::Full(payload));
		}
		payload.defer_until(Instant::now() + self.interval);
		state.queue.push_back(payload);
		drop(state);

		self.pushed.notify_one();
		Ok(())
	}

	/// Completes once the front payload is due. Pends forever while the queue
	/// is empty and nothing is pushed.
	pub(crate) async fn ready(&self) {
		loop {
			let pushed = self.pushed.notified();
			let next = self.state.lock().await.queue.front().map(Payload::ready_at);
			match next {
				Some(at) => {
					tokio::time::sleep_until(at).await;
					return;
				}
				None => pushed.await,
			}
		}
	}

	/// Removes the front payload if it is due.
	pub(crate) async fn pop_ready(&self) -> Option<Payload> {
		let mut state = self.state.lock().await;
		let due = state
			.queue
			.front()
			.is_some_and(|payload| payload.ready_at() <= Instant::now());
		if due {
			state.queue.pop_front()
		} else {
			None
		}
	}

	/// Refuses further pushes and hands back everything still queued.
	pub(crate) async fn close(&self) -> Vec<Payload> {
		let mut state = self.state.lock().await;
		state.closed = true;
		state.queue.drain(..).collect()
	}

	pub(crate) async fn len(&self) -> usize {
		self.state.lock().await.queue.len()
	}
}
