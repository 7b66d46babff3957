// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Public client: construction, event intake and shutdown.

use std::sync::Arc;
use std::time::Duration;

use beacon_core::{Event, PayloadOptions};
use chrono::Utc;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

use crate::config::{self, ClientConfig};
use crate::dispatch::{Dispatcher, HttpTransport, Transport};
use crate::encoder::{BatchEncoder, JsonEncoder};
use crate::error::{BeaconError, Result};
use crate::lifecycle::{Controller, LifecycleState};
use crate::pipeline::Pipeline;
use crate::retry::RetryQueue;
use crate::stats::{DeliveryStats, StatsSnapshot};

/// Builder for constructing a [`BeaconClient`].
pub struct BeaconClientBuilder {
	api_key: String,
	config: ClientConfig,
	transport: Option<Arc<dyn Transport>>,
	http_client: Option<reqwest::Client>,
	encoder: Option<Arc<dyn BatchEncoder>>,
}

impl BeaconClientBuilder {
	/// Creates a builder with default settings for `api_key`.
	pub fn new(api_key: impl Into<String>) -> Self {
		Self {
			api_key: api_key.into(),
			config: ClientConfig::default(),
			transport: None,
			http_client: None,
			encoder: None,
		}
	}

	/// Creates a builder from `BEACON_API_KEY` and the other `BEACON_*` variables.
	pub fn from_env() -> Result<Self> {
		let api_key = config::api_key_from_env()?;
		Ok(Self::new(api_key).config(ClientConfig::from_env()?))
	}

	/// Replaces every delivery parameter at once.
	pub fn config(mut self, config: ClientConfig) -> Self {
		self.config = config;
		self
	}

	/// Sets the ingestion URL.
	///
	/// Example: [`crate::EU_RESIDENCY_ENDPOINT`]
	pub fn endpoint(mut self, url: impl Into<String>) -> Self {
		self.config.endpoint = url.into();
		self
	}

	pub fn request_timeout(mut self, timeout: Duration) -> Self {
		self.config.request_timeout = timeout;
		self
	}

	pub fn flush_interval(mut self, interval: Duration) -> Self {
		self.config.flush_interval = interval;
		self
	}

	pub fn batch_size(mut self, size: usize) -> Self {
		self.config.batch_size = size;
		self
	}

	pub fn buffer_size(mut self, size: usize) -> Self {
		self.config.buffer_size = size;
		self
	}

	pub fn max_retry(mut self, retries: u32) -> Self {
		self.config.max_retry = retries;
		self
	}

	pub fn retry_interval(mut self, interval: Duration) -> Self {
		self.config.retry_interval = interval;
		self
	}

	pub fn retry_queue_size(mut self, size: usize) -> Self {
		self.config.retry_queue_size = size;
		self
	}

	pub fn min_id_length(mut self, length: u32) -> Self {
		self.config.min_id_length = Some(length);
		self
	}

	/// Sends batches through `transport` instead of the built-in HTTP transport.
	pub fn transport(mut self, transport: impl Transport + 'static) -> Self {
		self.transport = Some(Arc::new(transport));
		self
	}

	/// Uses a preconfigured `reqwest::Client` for the built-in HTTP transport.
	///
	/// The client's own timeout applies; `request_timeout` is ignored.
	pub fn http_client(mut self, client: reqwest::Client) -> Self {
		self.http_client = Some(client);
		self
	}

	/// Replaces the JSON batch encoder.
	pub fn encoder(mut self, encoder: impl BatchEncoder + 'static) -> Self {
		self.encoder = Some(Arc::new(encoder));
		self
	}

	/// Validates the configuration and starts the delivery loop on the current
	/// tokio runtime.
	pub fn build(self) -> Result<BeaconClient> {
		if self.api_key.trim().is_empty() {
			return Err(BeaconError::MissingApiKey);
		}
		self.config.validate()?;
		let runtime = Handle::try_current().map_err(|_| BeaconError::NoRuntime)?;

		let config = self.config;
		let transport: Arc<dyn Transport> = match (self.transport, self.http_client) {
			(Some(transport), _) => transport,
			(None, Some(client)) => Arc::new(HttpTransport::with_client(client, &config.endpoint)),
			(None, None) => Arc::new(HttpTransport::new(&config.endpoint, config.request_timeout)?),
		};
		let encoder: Arc<dyn BatchEncoder> = match self.encoder {
			Some(encoder) => encoder,
			None => {
				let options = config
					.min_id_length
					.map(|min_id_length| PayloadOptions { min_id_length });
				Arc::new(JsonEncoder::new(options))
			}
		};

		let stats = Arc::new(DeliveryStats::default());
		let pipeline = Arc::new(Pipeline::new(
			self.api_key,
			config.batch_size,
			config.max_retry,
			encoder,
			Dispatcher::new(transport, Arc::clone(&stats)),
			RetryQueue::new(config.retry_queue_size, config.retry_interval),
			Arc::clone(&stats),
		));

		let (intake, receiver) = mpsc::channel(config.buffer_size);
		let (state, _) = watch::channel(LifecycleState::Running);
		let state = Arc::new(state);
		let shutdown = CancellationToken::new();
		let flushes = TaskTracker::new();

		runtime.spawn(
			Controller {
				pipeline: Arc::clone(&pipeline),
				intake: receiver,
				state: Arc::clone(&state),
				shutdown: shutdown.clone(),
				flushes: flushes.clone(),
				flush_interval: config.flush_interval,
				buffer_size: config.buffer_size,
			}
			.run(),
		);

		info!(
			endpoint = %config.endpoint,
			batch_size = config.batch_size,
			max_retry = config.max_retry,
			"Beacon client initialized"
		);

		Ok(BeaconClient {
			inner: Arc::new(ClientInner {
				intake,
				state,
				shutdown,
				flushes,
				pipeline,
				stats,
				runtime,
			}),
		})
	}
}

struct ClientInner {
	intake: mpsc::Sender<Event>,
	state: Arc<watch::Sender<LifecycleState>>,
	shutdown: CancellationToken,
	flushes: TaskTracker,
	pipeline: Arc<Pipeline>,
	stats: Arc<DeliveryStats>,
	runtime: Handle,
}

/// Batching analytics client.
///
/// Cloning is cheap; all clones feed the same delivery loop. Dropping the last
/// clone without calling [`BeaconClient::close`] still drains pending events,
/// but nothing waits for it.
///
/// # Dropped events
///
/// Every submitted event is either delivered once or counted in
/// [`StatsSnapshot::dropped_events`]. A batch is dropped when it cannot be
/// encoded, when it has failed `1 + max_retry` attempts, when a final attempt
/// during shutdown fails, or when it fails while the retry queue already
/// holds `retry_queue_size` batches. Size the retry queue for the outage you
/// want to ride out.
///
/// # Example
///
/// ```ignore
/// use beacon::{BeaconClient, Event, EU_RESIDENCY_ENDPOINT};
///
/// let client = BeaconClient::builder(std::env::var("BEACON_API_KEY")?)
///     .endpoint(EU_RESIDENCY_ENDPOINT)
///     .build()?;
///
/// client.submit(Event::new("app.started").with_user_id("user-demo")).await?;
///
/// // Blocks until buffered events and pending retries got their final attempt.
/// client.close().await?;
/// ```
#[derive(Clone)]
pub struct BeaconClient {
	inner: Arc<ClientInner>,
}

impl BeaconClient {
	pub fn builder(api_key: impl Into<String>) -> BeaconClientBuilder {
		BeaconClientBuilder::new(api_key)
	}

	/// Builds a client with default settings.
	pub fn new(api_key: impl Into<String>) -> Result<Self> {
		BeaconClientBuilder::new(api_key).build()
	}

	/// Builds a client configured from `BEACON_*` environment variables.
	pub fn from_env() -> Result<Self> {
		BeaconClientBuilder::from_env()?.build()
	}

	/// Queues an event for delivery.
	///
	/// Waits while the intake buffer is full. Events without a `time` are
	/// stamped with the current UTC second.
	pub async fn submit(&self, mut event: Event) -> Result<()> {
		self.check_running()?;
		event.stamp_if_missing(Utc::now());

		self
			.inner
			.intake
			.send(event)
			.await
			.map_err(|_| BeaconError::Closed)?;
		self.accepted();
		Ok(())
	}

	/// Queues an event from a thread that is not running async code.
	///
	/// Blocks the thread while the intake buffer is full.
	///
	/// # Panics
	///
	/// Panics if called from within an asynchronous execution context, like
	/// [`tokio::sync::mpsc::Sender::blocking_send`].
	pub fn blocking_submit(&self, mut event: Event) -> Result<()> {
		self.check_running()?;
		event.stamp_if_missing(Utc::now());

		self
			.inner
			.intake
			.blocking_send(event)
			.map_err(|_| BeaconError::Closed)?;
		self.accepted();
		Ok(())
	}

	/// Flushes one batch of the events the delivery loop has already received.
	///
	/// The flush runs as a tracked task, so a concurrent [`BeaconClient::close`]
	/// waits for it and a failed batch still reaches the retry queue.
	pub async fn flush(&self) -> Result<()> {
		// Held across the state check so the drain cannot finish waiting on
		// tracked flushes between the check and the spawn.
		let _pending = self.inner.flushes.token();
		self.check_running()?;

		let pipeline = Arc::clone(&self.inner.pipeline);
		let handle = self.inner.flushes.spawn_on(
			async move {
				pipeline.flush().await;
			},
			&self.inner.runtime,
		);
		if let Err(e) = handle.await {
			warn!(error = %e, "Manual flush task failed");
		}
		Ok(())
	}

	/// Stops intake and waits until every buffered event and pending retry
	/// has had its final delivery attempt.
	pub async fn close(&self) -> Result<()> {
		let mut began = false;
		self.inner.state.send_if_modified(|state| {
			if *state == LifecycleState::Running {
				*state = LifecycleState::Draining;
				began = true;
			}
			began
		});
		if !began {
			return Err(BeaconError::AlreadyClosed);
		}

		info!("Closing client, draining pending events");
		let mut state = self.inner.state.subscribe();
		self.inner.shutdown.cancel();

		// The sender lives as long as `inner`, so this only ends on Stopped.
		let _ = state
			.wait_for(|state| *state == LifecycleState::Stopped)
			.await;

		info!(stats = ?self.stats(), "Client closed");
		Ok(())
	}

	pub fn state(&self) -> LifecycleState {
		*self.inner.state.borrow()
	}

	pub fn is_closed(&self) -> bool {
		self.state() != LifecycleState::Running
	}

	pub fn stats(&self) -> StatsSnapshot {
		self.inner.stats.snapshot()
	}

	fn check_running(&self) -> Result<()> {
		if self.is_closed() {
			return Err(BeaconError::Closed);
		}
		Ok(())
	}

	fn accepted(&self) {
		self.inner.stats.record_submitted();

		if self.inner.intake.capacity() == 0 {
			debug!("Intake buffer full, flushing");
			let pipeline = Arc::clone(&self.inner.pipeline);
			self.inner.flushes.spawn_on(
				async move {
					pipeline.flush().await;
				},
				&self.inner.runtime,
			);
		}
	}
}
