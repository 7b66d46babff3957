// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The background delivery loop and its shutdown drain.

use std::sync::Arc;
use std::time::Duration;

use beacon_core::Event;
use tokio::sync::{mpsc, watch};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info};

use crate::pipeline::Pipeline;

/// Where the client is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
	/// Accepting events.
	Running,
	/// Shutdown requested; intake closed, pending work getting final attempts.
	Draining,
	/// The delivery loop has exited.
	Stopped,
}

impl LifecycleState {
	pub fn as_str(&self) -> &'static str {
		match self {
			LifecycleState::Running => "running",
			LifecycleState::Draining => "draining",
			LifecycleState::Stopped => "stopped",
		}
	}
}

impl std::fmt::Display for LifecycleState {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.as_str())
	}
}

/// Owns the intake receiver and drives every flush and retry.
pub(crate) struct Controller {
	pub(crate) pipeline: Arc<Pipeline>,
	pub(crate) intake: mpsc::Receiver<Event>,
	pub(crate) state: Arc<watch::Sender<LifecycleState>>,
	pub(crate) shutdown: CancellationToken,
	pub(crate) flushes: TaskTracker,
	pub(crate) flush_interval: Duration,
	pub(crate) buffer_size: usize,
}

impl Controller {
	pub(crate) async fn run(mut self) {
		info!(
			flush_interval_ms = self.flush_interval.as_millis() as u64,
			buffer_size = self.buffer_size,
			"Starting delivery loop"
		);

		let mut ticker = interval_at(Instant::now() + self.flush_interval, self.flush_interval);
		ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

		loop {
			tokio::select! {
				_ = self.pipeline.retries().ready() => {
					self.pipeline.retry_ready().await;
				}
				received = self.intake.recv() => match received {
					Some(event) => self.accept(event).await,
					None => {
						debug!("All client handles dropped, draining");
						break;
					}
				},
				_ = ticker.tick() => {
					self.pipeline.flush().await;
				}
				_ = self.shutdown.cancelled() => {
					debug!("Exit requested, draining");
					break;
				}
			}
		}

		self.drain().await;
	}

	async fn accept(&self, event: Event) {
		if self.pipeline.accumulator().push(event).await >= self.buffer_size {
			self.pipeline.flush().await;
		}
	}

	async fn drain(mut self) {
		self.state.send_if_modified(|state| {
			if *state == LifecycleState::Running {
				*state = LifecycleState::Draining;
				true
			} else {
				false
			}
		});

		// Closing first stops producers from refilling the channel while it drains.
		self.intake.close();
		while let Some(event) = self.intake.recv().await {
			self.accept(event).await;
		}

		self.flushes.close();
		self.flushes.wait().await;

		self.pipeline.flush_all().await;
		self.pipeline.drain_retries().await;

		self.state.send_replace(LifecycleState::Stopped);
		info!("Delivery loop stopped");
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn state_labels() {
		assert_eq!(LifecycleState::Running.to_string(), "running");
		assert_eq!(LifecycleState::Draining.to_string(), "draining");
		assert_eq!(LifecycleState::Stopped.to_string(), "stopped");
	}
}
