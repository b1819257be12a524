//! CLI utilities for droidspec
//!
//! Provides shared terminal output formatting and status messages.

#![warn(missing_docs)]

pub mod output;
