// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Batch encoding seam.

use beacon_core::{encode_request, Event, PayloadOptions};
use bytes::Bytes;

/// Turns a batch of events into a request body.
///
/// Encoding runs while the accumulator lock is held, so implementations must
/// not block.
pub trait BatchEncoder: Send + Sync {
	fn encode(&self, api_key: &str, events: &[Event]) -> beacon_core::Result<Bytes>;
}

/// Encodes batches as the JSON upload body.
#[derive(Debug, Clone, Default)]
pub struct JsonEncoder {
	options: Option<PayloadOptions>,
}

impl JsonEncoder {
	pub fn new(options: Option<PayloadOptions>) -> Self {
		Self { options }
	}
}

impl BatchEncoder for JsonEncoder {
	fn encode(&self, api_key: &str, events: &[Event]) -> beacon_core::Result<Bytes> {
		encode_request(api_key, events, self.options.as_ref())
	}
}
