//! HTTP API client module.
//!
//! This module provides the `ApiClient`, a typed JSON request/response client
//! with bounded retries and exponential backoff, and `NetworkError`, the
//! classified failure returned once retries are exhausted.
//!
//! Client errors (4xx) are terminal. Server errors (5xx), unexpected status
//! codes and transport failures are retried.

pub mod client;
pub mod error;

pub use client::{backoff_delay, ApiClient, ClientSettings, HttpMethod};
pub use error::NetworkError;
