//! Backend API module.
//!
//! This module provides the HTTP client for the lookup backend and the
//! view models its endpoints return:
//! - One request/response pair per lookup tool
//! - A shared `ApiClient` carrying the configured base URL
//! - FastAPI-style error body decoding

pub mod client;
pub mod types;

pub use client::ApiClient;
pub use types::*;
