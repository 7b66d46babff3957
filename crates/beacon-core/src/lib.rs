// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core types for the Beacon analytics client.
//!
//! This crate holds the data that crosses the wire:
//! - [`Event`] and [`Plan`]: the event schema
//! - [`Properties`]: builder for free-form property maps
//! - [`RequestPayload`] / [`encode_request`]: the batch upload body
//! - [`ErrorResponse`]: the endpoint's rejection body

mod error;
mod event;
mod properties;
mod wire;

pub use error::{CoreError, Result};
pub use event::{Event, Plan};
pub use properties::Properties;
pub use wire::{encode_request, ErrorResponse, PayloadOptions, RequestPayload};
