//! Common test utilities for gridscale.
//!
//! This module provides shared utilities for testing the gridscale server.

#![allow(dead_code)]

pub mod assertions;
pub mod http_client;
pub mod test_data;
