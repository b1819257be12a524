//! Project configuration loading and schema definitions
//!
//! A project may carry a `droidspec.toml` naming its default descriptor
//! layers and output preferences.

mod loader;
mod schema;

pub use loader::Config;
pub use schema::*;
