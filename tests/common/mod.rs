//! Shared fixtures for the integration tests

#![allow(dead_code)]

pub mod builders;
pub mod mocks;
pub mod strategies;

pub use builders::*;
pub use mocks::*;

use chrono::{DateTime, TimeZone, Utc};

/// Fixed reference instant: a Monday morning, far from midnight
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap()
}
