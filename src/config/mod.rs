//! Configuration module.
//!
//! This module provides the runtime configuration for ipscout,
//! most importantly the backend API base URL.

pub mod loader;

pub use loader::Config;
