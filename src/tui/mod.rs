//! Terminal User Interface (TUI) module.
//!
//! This module provides an interactive terminal-based user interface
//! for the lookup tools and the speed test using the `ratatui` library.

mod app;

pub use app::App;
