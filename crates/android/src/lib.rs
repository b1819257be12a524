//! Android build descriptor resolution
//!
//! This crate provides:
//! - The resolved [`BuildDescriptor`] model
//! - Layered [`DescriptorFragment`]s loaded from TOML, JSON or Gradle scripts
//! - Field-by-field resolution with invariant checks
//! - Gradle Kotlin-DSL extraction and rendering
//! - Advisory lint on resolved descriptors
//!
//! # Example
//!
//! ```rust
//! use droidspec_android::{resolve, DescriptorFragment};
//!
//! let base = DescriptorFragment::from_toml_str(r#"
//!     applicationId = "com.example.tam_an"
//!     minSdk = 21
//!     targetSdk = 34
//!     compileSdk = 34
//!     versionCode = 1
//!     versionName = "1.0.0"
//!     javaVersion = "17"
//!     desugaringEnabled = true
//!     minifyEnabled = false
//!     shrinkResourcesEnabled = false
//!     signingConfigRef = "debug"
//! "#).unwrap();
//! let release = DescriptorFragment::from_json_str(
//!     r#"{"minSdk": 24, "targetSdk": 36, "compileSdk": 36}"#,
//! ).unwrap();
//!
//! let descriptor = resolve(&base, &release).unwrap();
//! assert_eq!(descriptor.min_sdk, 24);
//! ```

#![warn(missing_docs)]

pub mod descriptor;
pub mod fragment;
pub mod gradle;
pub mod lint;
pub mod resolver;

pub use descriptor::{BuildDescriptor, JavaVersion};
pub use fragment::DescriptorFragment;
pub use resolver::{resolve, resolve_layers, ResolveError};
