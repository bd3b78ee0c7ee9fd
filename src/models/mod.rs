// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod credentials;
pub mod snapshot;

pub use credentials::{Credentials, Service, TokenPair};
pub use snapshot::{BikeCounts, LaMetricFrame, LaMetricFrames, Snapshot, StationBikes};
