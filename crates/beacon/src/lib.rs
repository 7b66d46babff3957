// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Batching analytics event client.
//!
//! Events submitted through a [`BeaconClient`] are buffered, grouped into
//! batches and posted to an HTTP ingestion endpoint by a single background
//! task. Failed batches are retried a bounded number of times; on
//! [`BeaconClient::close`] every buffered event and pending retry gets a final
//! delivery attempt before the call returns.
//!
//! # Example
//!
//! ```ignore
//! use beacon::{BeaconClient, Event, Properties};
//! use std::time::Duration;
//!
//! let client = BeaconClient::builder("api-key")
//!     .batch_size(100)
//!     .flush_interval(Duration::from_secs(5))
//!     .build()?;
//!
//! let props = Properties::new().insert("plan", "pro");
//! client
//!     .submit(Event::new("checkout.completed").with_user_id("u-42").with_event_properties(props))
//!     .await?;
//!
//! client.close().await?;
//! ```

mod batch;
mod client;
mod config;
mod dispatch;
mod encoder;
mod error;
mod lifecycle;
mod payload;
mod pipeline;
mod retry;
mod stats;

#[cfg(test)]
mod testing;

pub use client::{BeaconClient, BeaconClientBuilder};
pub use config::{
	api_key_from_env, ClientConfig, DEFAULT_BATCH_SIZE, DEFAULT_BUFFER_SIZE, DEFAULT_FLUSH_INTERVAL,
	DEFAULT_MAX_RETRY, DEFAULT_REQUEST_TIMEOUT, DEFAULT_RETRY_INTERVAL, DEFAULT_RETRY_QUEUE_SIZE,
	EU_RESIDENCY_ENDPOINT, STANDARD_ENDPOINT,
};
pub use dispatch::{HttpTransport, Transport};
pub use encoder::{BatchEncoder, JsonEncoder};
pub use error::{BeaconError, Result};
pub use lifecycle::LifecycleState;
pub use stats::StatsSnapshot;

pub use beacon_core::{ErrorResponse, Event, PayloadOptions, Plan, Properties};
