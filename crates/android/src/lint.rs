//! Advisory checks on a resolved descriptor
//!
//! Lint never rejects a descriptor; callers decide whether warnings are
//! fatal (`check --strict`).

use crate::descriptor::BuildDescriptor;
use droidspec_core::validation::{ValidationResult, Validator};
use once_cell::sync::Lazy;
use regex::Regex;

/// Android application ids need two or more segments, each starting with a
/// letter
static APPLICATION_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9_]*(\.[A-Za-z][A-Za-z0-9_]*)+$").unwrap()
});

/// Run all lint checks against a resolved descriptor
pub fn lint(descriptor: &BuildDescriptor) -> ValidationResult {
    Validator::new()
        .warn_unless_matches(
            "applicationId",
            &descriptor.application_id,
            &APPLICATION_ID,
            "a dotted package name with at least two segments",
        )
        .warn_if(
            "shrinkResourcesEnabled",
            descriptor.shrink_resources_enabled && !descriptor.minify_enabled,
            "resource shrinking requires minifyEnabled",
        )
        .warn_if(
            "signingConfigRef",
            descriptor.signing_config_ref == "debug",
            "release build is signed with the debug signing config",
        )
        .warn_if(
            "targetSdk",
            descriptor.target_sdk < descriptor.compile_sdk,
            &format!(
                "targetSdk {} is below compileSdk {}",
                descriptor.target_sdk, descriptor.compile_sdk
            ),
        )
        .validate()
}
