//! Mock host implementation for testing platforms.
//!
//! This module provides a host that records every call a platform makes and
//! can be told to refuse registrations, without running a bridge.

pub mod host;

pub use host::{HostCall, MockHost, MockHostHandle};
