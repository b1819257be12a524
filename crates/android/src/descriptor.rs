//! Resolved Android build descriptor
//!
//! A [`BuildDescriptor`] is produced once per build invocation by
//! [`crate::resolver::resolve`] and is never modified afterwards.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Java language level used for `compileOptions` and `jvmTarget`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum JavaVersion {
    /// Java 8
    V1_8,
    /// Java 11
    V11,
    /// Java 17
    V17,
    /// Java 21
    V21,
}

impl JavaVersion {
    /// All supported versions, oldest first
    pub const ALL: [JavaVersion; 4] = [Self::V1_8, Self::V11, Self::V17, Self::V21];

    /// Short form, as written in descriptor fragments (`"17"`, `"1.8"`)
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::V1_8 => "1.8",
            Self::V11 => "11",
            Self::V17 => "17",
            Self::V21 => "21",
        }
    }

    /// Gradle constant, e.g. `JavaVersion.VERSION_17`
    pub fn gradle_constant(&self) -> &'static str {
        match self {
            Self::V1_8 => "JavaVersion.VERSION_1_8",
            Self::V11 => "JavaVersion.VERSION_11",
            Self::V17 => "JavaVersion.VERSION_17",
            Self::V21 => "JavaVersion.VERSION_21",
        }
    }
}

impl fmt::Display for JavaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JavaVersion {
    type Err = String;

    /// Accepts `17`, `1.8`, `VERSION_17`, `VERSION_1_8` and
    /// `JavaVersion.VERSION_17`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let bare = trimmed.strip_prefix("JavaVersion.").unwrap_or(trimmed);
        let bare = bare.strip_prefix("VERSION_").unwrap_or(bare).replace('_', ".");

        match bare.as_str() {
            "1.8" | "8" => Ok(Self::V1_8),
            "11" => Ok(Self::V11),
            "17" => Ok(Self::V17),
            "21" => Ok(Self::V21),
            _ => Err(format!(
                "unsupported Java version '{trimmed}' (expected one of 1.8, 11, 17, 21)"
            )),
        }
    }
}

impl TryFrom<String> for JavaVersion {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<JavaVersion> for String {
    fn from(value: JavaVersion) -> Self {
        value.as_str().to_string()
    }
}

/// Fully resolved build configuration
///
/// Every field is populated and `min_sdk <= target_sdk <= compile_sdk`
/// holds for descriptors returned by the resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildDescriptor {
    /// Unique package identifier, e.g. `com.example.tam_an`
    pub application_id: String,
    /// Lowest Android API level the app installs on
    pub min_sdk: u32,
    /// API level the app is tested against
    pub target_sdk: u32,
    /// API level the app is compiled against
    pub compile_sdk: u32,
    /// Internal monotonically increasing version number
    pub version_code: u32,
    /// User-visible version string
    pub version_name: String,
    /// Java language level for sources and bytecode
    pub java_version: JavaVersion,
    /// Whether core library desugaring is on
    pub desugaring_enabled: bool,
    /// Whether code shrinking runs for release builds
    pub minify_enabled: bool,
    /// Whether unused resources are removed for release builds
    pub shrink_resources_enabled: bool,
    /// Name of the signing configuration used for release builds
    pub signing_config_ref: String,
    /// Kotlin/Java namespace for generated sources; defaults to the application id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    /// Pinned NDK version
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ndk_version: Option<String>,
}

impl BuildDescriptor {
    /// Namespace to emit, falling back to the application id
    pub fn effective_namespace(&self) -> &str {
        self.namespace.as_deref().unwrap_or(&self.application_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_java_version_parse_forms() {
        assert_eq!("17".parse::<JavaVersion>().unwrap(), JavaVersion::V17);
        assert_eq!("VERSION_17".parse::<JavaVersion>().unwrap(), JavaVersion::V17);
        assert_eq!(
            "JavaVersion.VERSION_1_8".parse::<JavaVersion>().unwrap(),
            JavaVersion::V1_8
        );
        assert_eq!("1.8".parse::<JavaVersion>().unwrap(), JavaVersion::V1_8);
        assert!("16".parse::<JavaVersion>().is_err());
    }

    #[test]
    fn test_java_version_gradle_constant_parses_back() {
        for version in JavaVersion::ALL {
            assert_eq!(version.gradle_constant().parse::<JavaVersion>().unwrap(), version);
        }
    }

    #[test]
    fn test_java_version_serde_as_string() {
        let json = serde_json::to_string(&JavaVersion::V1_8).unwrap();
        assert_eq!(json, "\"1.8\"");
        let parsed: JavaVersion = serde_json::from_str("\"21\"").unwrap();
        assert_eq!(parsed, JavaVersion::V21);
        assert!(serde_json::from_str::<JavaVersion>("\"9\"").is_err());
    }

    #[test]
    fn test_effective_namespace_falls_back_to_application_id() {
        let mut descriptor = BuildDescriptor {
            application_id: "com.example.tam_an".into(),
            min_sdk: 24,
            target_sdk: 36,
            compile_sdk: 36,
            version_code: 1,
            version_name: "1.0.0".into(),
            java_version: JavaVersion::V17,
            desugaring_enabled: true,
            minify_enabled: false,
            shrink_resources_enabled: false,
            signing_config_ref: "debug".into(),
            namespace: None,
            ndk_version: None,
        };
        assert_eq!(descriptor.effective_namespace(), "com.example.tam_an");

        descriptor.namespace = Some("com.example.app".into());
        assert_eq!(descriptor.effective_namespace(), "com.example.app");
    }
}
