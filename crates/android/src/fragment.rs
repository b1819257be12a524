//! Descriptor fragments: partial build configuration layers
//!
//! Fragments are read from TOML, JSON or a Gradle Kotlin-DSL script and
//! stacked with [`DescriptorFragment::overlay`]; the later layer wins per
//! key.

use crate::descriptor::{BuildDescriptor, JavaVersion};
use crate::gradle;
use droidspec_core::error::{Error, Result, ResultExt};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A partial set of build-configuration key-value pairs
///
/// Integer fields are kept signed so that zero and negative values reach
/// the resolver and are reported as invalid values rather than parse
/// errors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DescriptorFragment {
    /// Unique package identifier, e.g. `com.example.tam_an`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_id: Option<String>,
    /// Lowest Android API level the app installs on
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_sdk: Option<i64>,
    /// API level the app is tested against
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_sdk: Option<i64>,
    /// API level the app is compiled against
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compile_sdk: Option<i64>,
    /// Internal monotonically increasing version number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_code: Option<i64>,
    /// User-visible version string
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_name: Option<String>,
    /// Java language level for sources and bytecode
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub java_version: Option<JavaVersion>,
    /// Whether core library desugaring is on
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desugaring_enabled: Option<bool>,
    /// Whether code shrinking runs for release builds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minify_enabled: Option<bool>,
    /// Whether unused resources are removed for release builds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shrink_resources_enabled: Option<bool>,
    /// Name of the signing configuration used for release builds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signing_config_ref: Option<String>,
    /// Kotlin/Java namespace for generated sources; defaults to the application id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    /// Pinned NDK version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ndk_version: Option<String>,
}

impl DescriptorFragment {
    /// Create an empty fragment
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge `over` on top of `self`: every field present in `over`
    /// replaces the one in `self`
    #[must_use]
    pub fn overlay(&self, over: &Self) -> Self {
        Self {
            application_id: pick(&over.application_id, &self.application_id),
            min_sdk: over.min_sdk.or(self.min_sdk),
            target_sdk: over.target_sdk.or(self.target_sdk),
            compile_sdk: over.compile_sdk.or(self.compile_sdk),
            version_code: over.version_code.or(self.version_code),
            version_name: pick(&over.version_name, &self.version_name),
            java_version: over.java_version.or(self.java_version),
            desugaring_enabled: over.desugaring_enabled.or(self.desugaring_enabled),
            minify_enabled: over.minify_enabled.or(self.minify_enabled),
            shrink_resources_enabled: over
                .shrink_resources_enabled
                .or(self.shrink_resources_enabled),
            signing_config_ref: pick(&over.signing_config_ref, &self.signing_config_ref),
            namespace: pick(&over.namespace, &self.namespace),
            ndk_version: pick(&over.ndk_version, &self.ndk_version),
        }
    }

    /// Number of fields set in this fragment
    pub fn field_count(&self) -> usize {
        [
            self.application_id.is_some(),
            self.min_sdk.is_some(),
            self.target_sdk.is_some(),
            self.compile_sdk.is_some(),
            self.version_code.is_some(),
            self.version_name.is_some(),
            self.java_version.is_some(),
            self.desugaring_enabled.is_some(),
            self.minify_enabled.is_some(),
            self.shrink_resources_enabled.is_some(),
            self.signing_config_ref.is_some(),
            self.namespace.is_some(),
            self.ndk_version.is_some(),
        ]
        .into_iter()
        .filter(|set| *set)
        .count()
    }

    /// Whether no field is set
    pub fn is_empty(&self) -> bool {
        self.field_count() == 0
    }

    /// Parse a TOML fragment
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Parse a JSON fragment
    pub fn from_json_str(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Load a fragment from a file, choosing the format by extension
    ///
    /// `.toml` and `.json` files are parsed directly; `.kts` files go
    /// through Gradle extraction and their deferred assignments are left
    /// unset.
    pub fn from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::file_not_found(path));
        }

        let format = SourceFormat::detect(path).ok_or_else(|| Error::unsupported_format(path))?;
        let content = std::fs::read_to_string(path)
            .map_err(Error::from)
            .context(format!("Reading descriptor layer {}", path.display()))?;

        let fragment = match format {
            SourceFormat::Toml => Self::from_toml_str(&content),
            SourceFormat::Json => Self::from_json_str(&content),
            SourceFormat::GradleKts => {
                let extraction = gradle::extract(&content);
                for deferred in &extraction.deferred {
                    tracing::debug!(
                        path = %path.display(),
                        field = deferred.field,
                        expression = %deferred.expression,
                        "leaving non-literal Gradle assignment unset"
                    );
                }
                Ok(extraction.fragment)
            }
        }
        .context(format!("Parsing descriptor layer {}", path.display()))?;

        tracing::debug!(
            path = %path.display(),
            fields = fragment.field_count(),
            "loaded descriptor layer"
        );
        Ok(fragment)
    }

    /// Render as pretty JSON
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Render as TOML
    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string(self)?)
    }
}

impl From<&BuildDescriptor> for DescriptorFragment {
    fn from(descriptor: &BuildDescriptor) -> Self {
        Self {
            application_id: Some(descriptor.application_id.clone()),
            min_sdk: Some(i64::from(descriptor.min_sdk)),
            target_sdk: Some(i64::from(descriptor.target_sdk)),
            compile_sdk: Some(i64::from(descriptor.compile_sdk)),
            version_code: Some(i64::from(descriptor.version_code)),
            version_name: Some(descriptor.version_name.clone()),
            java_version: Some(descriptor.java_version),
            desugaring_enabled: Some(descriptor.desugaring_enabled),
            minify_enabled: Some(descriptor.minify_enabled),
            shrink_resources_enabled: Some(descriptor.shrink_resources_enabled),
            signing_config_ref: Some(descriptor.signing_config_ref.clone()),
            namespace: descriptor.namespace.clone(),
            ndk_version: descriptor.ndk_version.clone(),
        }
    }
}

fn pick(over: &Option<String>, base: &Option<String>) -> Option<String> {
    over.as_ref().or(base.as_ref()).cloned()
}

/// On-disk fragment formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SourceFormat {
    Toml,
    Json,
    GradleKts,
}

impl SourceFormat {
    fn detect(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            "kts" => Some(Self::GradleKts),
            _ => None,
        }
    }
}
