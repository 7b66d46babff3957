// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Shared HTTP utilities for Beacon.
//!
//! This crate provides a pre-configured HTTP client with a consistent
//! User-Agent header so every request the SDK makes is attributable.

mod client;

pub use client::{builder, client_with_timeout, user_agent};
