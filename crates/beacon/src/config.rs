// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Client configuration, defaults and environment loading.

use std::time::Duration;

use url::Url;

use crate::error::{BeaconError, Result};

/// Default ingestion endpoint.
pub const STANDARD_ENDPOINT: &str = "https://api2.amplitude.com/2/httpapi";
/// Ingestion endpoint for projects with EU data residency.
pub const EU_RESIDENCY_ENDPOINT: &str = "https://api.eu.amplitude.com/2/httpapi";

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(1);
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(10);
pub const DEFAULT_BATCH_SIZE: usize = 1000;
pub const DEFAULT_BUFFER_SIZE: usize = 2000;
pub const DEFAULT_MAX_RETRY: u32 = 3;
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(1);
pub const DEFAULT_RETRY_QUEUE_SIZE: usize = 1000;

/// Delivery parameters, fixed once the client is built.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
	/// URL batches are POSTed to.
	pub endpoint: String,
	/// Timeout for a single delivery request.
	pub request_timeout: Duration,
	/// Interval between timer-driven flushes.
	pub flush_interval: Duration,
	/// Maximum number of events per batch.
	pub batch_size: usize,
	/// Capacity of the intake channel, and the accumulator size that forces a flush.
	pub buffer_size: usize,
	/// Retries allowed after the first failed attempt.
	pub max_retry: u32,
	/// Minimum delay before a failed batch is attempted again.
	pub retry_interval: Duration,
	/// Maximum number of failed batches waiting for a retry.
	pub retry_queue_size: usize,
	/// Sent as `options.min_id_length` when set.
	pub min_id_length: Option<u32>,
}

impl Default for ClientConfig {
	fn default() -> Self {
		Self {
			endpoint: STANDARD_ENDPOINT.to_string(),
			request_timeout: DEFAULT_REQUEST_TIMEOUT,
			flush_interval: DEFAULT_FLUSH_INTERVAL,
			batch_size: DEFAULT_BATCH_SIZE,
			buffer_size: DEFAULT_BUFFER_SIZE,
			max_retry: DEFAULT_MAX_RETRY,
			retry_interval: DEFAULT_RETRY_INTERVAL,
			retry_queue_size: DEFAULT_RETRY_QUEUE_SIZE,
			min_id_length: None,
		}
	}
}

impl ClientConfig {
	/// Loads configuration from `BEACON_*` environment variables on top of the
	/// defaults.
	pub fn from_env() -> Result<Self> {
		Self::from_lookup(|name| std::env::var(name).ok())
	}

	/// Same as [`ClientConfig::from_env`], reading variables through `lookup`.
	pub fn from_lookup<F>(lookup: F) -> Result<Self>
	where
		F: Fn(&str) -> Option<String>,
	{
		let mut config = Self::default();

		match lookup("BEACON_REGION").as_deref().map(str::to_ascii_lowercase) {
			None => {}
			Some(region) if region == "eu" => config.endpoint = EU_RESIDENCY_ENDPOINT.to_string(),
			Some(region) if region == "us" || region == "standard" => {}
			Some(other) => {
				return Err(BeaconError::InvalidConfig(format!(
					"unknown BEACON_REGION '{other}'"
				)))
			}
		}
		if let Some(endpoint) = lookup("BEACON_ENDPOINT") {
			config.endpoint = endpoint;
		}

		if let Some(v) = parse_var::<usize>(&lookup, "BEACON_BATCH_SIZE")? {
			config.batch_size = v;
		}
		if let Some(v) = parse_var::<usize>(&lookup, "BEACON_BUFFER_SIZE")? {
			config.buffer_size = v;
		}
		if let Some(v) = parse_var::<u32>(&lookup, "BEACON_MAX_RETRY")? {
			config.max_retry = v;
		}
		if let Some(v) = parse_var::<usize>(&lookup, "BEACON_RETRY_QUEUE_SIZE")? {
			config.retry_queue_size = v;
		}
		if let Some(v) = parse_var::<u32>(&lookup, "BEACON_MIN_ID_LENGTH")? {
			config.min_id_length = Some(v);
		}
		if let Some(ms) = parse_var::<u64>(&lookup, "BEACON_FLUSH_INTERVAL_MS")? {
			config.flush_interval = Duration::from_millis(ms);
		}
		if let Some(ms) = parse_var::<u64>(&lookup, "BEACON_RETRY_INTERVAL_MS")? {
			config.retry_interval = Duration::from_millis(ms);
		}
		if let Some(ms) = parse_var::<u64>(&lookup, "BEACON_REQUEST_TIMEOUT_MS")? {
			config.request_timeout = Duration::from_millis(ms);
		}

		Ok(config)
	}

	/// Checks that the configuration can drive a delivery loop.
	pub fn validate(&self) -> Result<()> {
		let url = Url::parse(&self.endpoint)
			.map_err(|e| BeaconError::InvalidEndpoint(format!("{}: {e}", self.endpoint)))?;
		if !matches!(url.scheme(), "http" | "https") {
			return Err(BeaconError::InvalidEndpoint(format!(
				"{}: scheme must be http or https",
				self.endpoint
			)));
		}

		if self.batch_size == 0 {
			return Err(BeaconError::InvalidConfig("batch_size must be at least 1".into()));
		}
		if self.buffer_size == 0 {
			return Err(BeaconError::InvalidConfig("buffer_size must be at least 1".into()));
		}
		if self.retry_queue_size == 0 {
			return Err(BeaconError::InvalidConfig(
				"retry_queue_size must be at least 1".into(),
			));
		}
		if self.flush_interval.is_zero() {
			return Err(BeaconError::InvalidConfig(
				"flush_interval must be greater than zero".into(),
			));
		}

		Ok(())
	}
}

/// Reads the API key from `BEACON_API_KEY`.
pub fn api_key_from_env() -> Result<String> {
	api_key_from_lookup(|name| std::env::var(name).ok())
}

pub(crate) fn api_key_from_lookup<F>(lookup: F) -> Result<String>
where
	F: Fn(&str) -> Option<String>,
{
	lookup("BEACON_API_KEY")
		.filter(|key| !key.trim().is_empty())
		.ok_or(BeaconError::MissingApiKey)
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Result<Option<T>>
where
	T: std::str::FromStr,
	T::Err: std::fmt::Display,
{
	lookup(name)
		.map(|raw| {
			raw
				.trim()
				.parse::<T>()
				.map_err(|e| BeaconError::InvalidConfig(format!("invalid {name} '{raw}': {e}")))
		})
		.transpose()
}
