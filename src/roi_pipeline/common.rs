//! Common utilities module
//!
//! This module contains shared utilities used across the acquisition pipeline.

pub mod error;

pub use error::{MonitorError, Result};
