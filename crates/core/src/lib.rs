//! Core utilities for droidspec
//!
//! Shared functionality used by the Android descriptor crate and the CLI:
//!
//! - **Error handling**: errors with codes, context, and recovery suggestions
//! - **Configuration**: `droidspec.toml` discovery and schema
//! - **Validation**: fluent field validator with errors and warnings

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod validation;

pub use error::{Error, ErrorCode, Result, ResultExt};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::{Config, OutputFormat};
    pub use crate::error::{exit_codes, Error, ErrorCode, Result, ResultExt};
    pub use crate::validation::{ValidationResult, Validator};
}
