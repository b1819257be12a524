//! Layered descriptor resolution
//!
//! Fragments are merged field by field (the later layer wins) and the
//! result is checked before a [`BuildDescriptor`] is handed out:
//!
//! 1. every required field is present in some layer
//! 2. integer fields are positive and string fields are non-blank
//! 3. `minSdk <= targetSdk <= compileSdk`
//!
//! Each call is a pure function of its inputs. The first failure is
//! returned; nothing is retried or defaulted.

use crate::descriptor::BuildDescriptor;
use crate::fragment::DescriptorFragment;
use droidspec_core::error::{Error, ErrorCode};

/// Resolution failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    /// A required field is absent from every layer
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// `minSdk <= targetSdk <= compileSdk` does not hold
    #[error(
        "invalid SDK ordering: expected minSdk <= targetSdk <= compileSdk, \
         got minSdk={min_sdk}, targetSdk={target_sdk}, compileSdk={compile_sdk}"
    )]
    InvalidSdkOrdering {
        /// Resolved minimum SDK
        min_sdk: u32,
        /// Resolved target SDK
        target_sdk: u32,
        /// Resolved compile SDK
        compile_sdk: u32,
    },

    /// A present field holds a value outside its domain
    #[error("invalid value for {field}: {reason}")]
    InvalidValue {
        /// Offending field, as spelled in fragments
        field: &'static str,
        /// What is wrong with the value
        reason: String,
    },
}

impl ResolveError {
    /// Error code used when this failure is surfaced as a crate error
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::MissingField(_) => ErrorCode::MissingField,
            Self::InvalidSdkOrdering { .. } => ErrorCode::InvalidSdkOrdering,
            Self::InvalidValue { .. } => ErrorCode::InvalidValue,
        }
    }

    fn suggestion(&self) -> String {
        match self {
            Self::MissingField(field) => {
                format!("Set `{field}` in the base layer or in an override layer")
            }
            Self::InvalidSdkOrdering { .. } => {
                "Lower minSdk or raise targetSdk/compileSdk so that minSdk <= targetSdk <= compileSdk"
                    .to_string()
            }
            Self::InvalidValue { field, .. } => format!("Fix the value of `{field}`"),
        }
    }
}

impl From<ResolveError> for Error {
    fn from(err: ResolveError) -> Self {
        let suggestion = err.suggestion();
        Error::new(err.code(), err.to_string())
            .with_suggestion(suggestion)
            .with_source(err)
    }
}

/// Merge `over` onto `base` and resolve the result
pub fn resolve(
    base: &DescriptorFragment,
    over: &DescriptorFragment,
) -> Result<BuildDescriptor, ResolveError> {
    resolve_layers([base, over])
}

/// Fold any number of layers left to right (later wins) and resolve
pub fn resolve_layers<'a, I>(layers: I) -> Result<BuildDescriptor, ResolveError>
where
    I: IntoIterator<Item = &'a DescriptorFragment>,
{
    let mut count = 0usize;
    let merged = layers
        .into_iter()
        .inspect(|_| count += 1)
        .fold(DescriptorFragment::default(), |acc, layer| acc.overlay(layer));

    tracing::debug!(
        layers = count,
        fields = merged.field_count(),
        "resolving build descriptor"
    );

    let result = finalize(&merged);
    match &result {
        Ok(descriptor) => tracing::debug!(
            application_id = %descriptor.application_id,
            min_sdk = descriptor.min_sdk,
            target_sdk = descriptor.target_sdk,
            compile_sdk = descriptor.compile_sdk,
            "build descriptor resolved"
        ),
        Err(err) => tracing::debug!(error = %err, "build descriptor rejected"),
    }
    result
}

fn finalize(merged: &DescriptorFragment) -> Result<BuildDescriptor, ResolveError> {
    let application_id = require(&merged.application_id, "applicationId")?;
    let min_sdk = require(&merged.min_sdk, "minSdk")?;
    let target_sdk = require(&merged.target_sdk, "targetSdk")?;
    let compile_sdk = require(&merged.compile_sdk, "compileSdk")?;
    let version_code = require(&merged.version_code, "versionCode")?;
    let version_name = require(&merged.version_name, "versionName")?;
    let java_version = require(&merged.java_version, "javaVersion")?;
    let desugaring_enabled = require(&merged.desugaring_enabled, "desugaringEnabled")?;
    let minify_enabled = require(&merged.minify_enabled, "minifyEnabled")?;
    let shrink_resources_enabled =
        require(&merged.shrink_resources_enabled, "shrinkResourcesEnabled")?;
    let signing_config_ref = require(&merged.signing_config_ref, "signingConfigRef")?;

    let descriptor = BuildDescriptor {
        application_id: non_blank(application_id, "applicationId")?,
        min_sdk: positive(min_sdk, "minSdk")?,
        target_sdk: positive(target_sdk, "targetSdk")?,
        compile_sdk: positive(compile_sdk, "compileSdk")?,
        version_code: positive(version_code, "versionCode")?,
        version_name: non_blank(version_name, "versionName")?,
        java_version,
        desugaring_enabled,
        minify_enabled,
        shrink_resources_enabled,
        signing_config_ref: non_blank(signing_config_ref, "signingConfigRef")?,
        namespace: merged
            .namespace
            .clone()
            .map(|ns| non_blank(ns, "namespace"))
            .transpose()?,
        ndk_version: merged
            .ndk_version
            .clone()
            .map(|v| non_blank(v, "ndkVersion"))
            .transpose()?,
    };

    check_sdk_ordering(&descriptor)?;
    Ok(descriptor)
}

fn require<T: Clone>(value: &Option<T>, field: &'static str) -> Result<T, ResolveError> {
    value.clone().ok_or(ResolveError::MissingField(field))
}

fn positive(value: i64, field: &'static str) -> Result<u32, ResolveError> {
    if value <= 0 {
        return Err(ResolveError::InvalidValue {
            field,
            reason: format!("must be a positive integer, got {value}"),
        });
    }
    u32::try_from(value).map_err(|_| ResolveError::InvalidValue {
        field,
        reason: format!("{value} is out of range"),
    })
}

fn non_blank(value: String, field: &'static str) -> Result<String, ResolveError> {
    if value.trim().is_empty() {
        Err(ResolveError::InvalidValue {
            field,
            reason: "must not be empty".to_string(),
        })
    } else {
        Ok(value)
    }
}

fn check_sdk_ordering(descriptor: &BuildDescriptor) -> Result<(), ResolveError> {
    let (min_sdk, target_sdk, compile_sdk) = (
        descriptor.min_sdk,
        descriptor.target_sdk,
        descriptor.compile_sdk,
    );
    if min_sdk <= target_sdk && target_sdk <= compile_sdk {
        Ok(())
    } else {
        Err(ResolveError::InvalidSdkOrdering {
            min_sdk,
            target_sdk,
            compile_sdk,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::JavaVersion;
    use proptest::prelude::*;

    fn base() -> DescriptorFragment {
        DescriptorFragment {
            application_id: Some("com.example.tam_an".into()),
            min_sdk: Some(21),
            target_sdk: Some(34),
            compile_sdk: Some(34),
            version_code: Some(1),
            version_name: Some("1.0.0".into()),
            java_version: Some(JavaVersion::V11),
            desugaring_enabled: Some(false),
            minify_enabled: Some(false),
            shrink_resources_enabled: Some(false),
            signing_config_ref: Some("debug".into()),
            namespace: None,
            ndk_version: None,
        }
    }

    fn sdks(min: i64, target: i64, compile: i64) -> DescriptorFragment {
        DescriptorFragment {
            min_sdk: Some(min),
            target_sdk: Some(target),
            compile_sdk: Some(compile),
            ..Default::default()
        }
    }

    #[test]
    fn test_resolve_valid_sdk_ordering() {
        let descriptor = resolve(&base(), &sdks(24, 36, 36)).unwrap();
        assert_eq!(descriptor.min_sdk, 24);
        assert_eq!(descriptor.target_sdk, 36);
        assert_eq!(descriptor.compile_sdk, 36);
    }

    #[test]
    fn test_resolve_invalid_sdk_ordering() {
        let err = resolve(&base(), &sdks(36, 24, 36)).unwrap_err();
        assert_eq!(
            err,
            ResolveError::InvalidSdkOrdering {
                min_sdk: 36,
                target_sdk: 24,
                compile_sdk: 36,
            }
        );
        assert!(err.to_string().contains("minSdk=36"));
    }

    #[test]
    fn test_resolve_target_above_compile_rejected() {
        let err = resolve(&base(), &sdks(24, 36, 35)).unwrap_err();
        assert!(matches!(err, ResolveError::InvalidSdkOrdering { .. }));
    }

    #[test]
    fn test_missing_application_id() {
        let mut layer = base();
        layer.application_id = None;
        let err = resolve(&layer, &DescriptorFragment::new()).unwrap_err();
        assert_eq!(err, ResolveError::MissingField("applicationId"));
    }

    #[test]
    fn test_missing_fields_reported_in_declaration_order() {
        let err = resolve(&DescriptorFragment::new(), &DescriptorFragment::new()).unwrap_err();
        assert_eq!(err, ResolveError::MissingField("applicationId"));

        let mut layer = base();
        layer.version_name = None;
        layer.signing_config_ref = None;
        let err = resolve(&layer, &DescriptorFragment::new()).unwrap_err();
        assert_eq!(err, ResolveError::MissingField("versionName"));
    }

    #[test]
    fn test_missing_field_wins_over_bad_ordering() {
        let mut layer = base();
        layer.signing_config_ref = None;
        let err = resolve(&layer, &sdks(36, 24, 36)).unwrap_err();
        assert_eq!(err, ResolveError::MissingField("signingConfigRef"));
    }

    #[test]
    fn test_non_positive_and_blank_values_rejected() {
        let err = resolve(&base(), &sdks(0, 34, 34)).unwrap_err();
        assert!(matches!(err, ResolveError::InvalidValue { field: "minSdk", .. }));

        let over = DescriptorFragment {
            version_code: Some(-3),
            ..Default::default()
        };
        let err = resolve(&base(), &over).unwrap_err();
        assert!(matches!(err, ResolveError::InvalidValue { field: "versionCode", .. }));

        let over = DescriptorFragment {
            application_id: Some("   ".into()),
            ..Default::default()
        };
        let err = resolve(&base(), &over).unwrap_err();
        assert!(matches!(err, ResolveError::InvalidValue { field: "applicationId", .. }));

        let over = DescriptorFragment {
            namespace: Some(String::new()),
            ..Default::default()
        };
        let err = resolve(&base(), &over).unwrap_err();
        assert!(matches!(err, ResolveError::InvalidValue { field: "namespace", .. }));
    }

    #[test]
    fn test_out_of_range_integer_rejected() {
        let over = DescriptorFragment {
            version_code: Some(i64::from(u32::MAX) + 1),
            ..Default::default()
        };
        let err = resolve(&base(), &over).unwrap_err();
        assert!(matches!(err, ResolveError::InvalidValue { field: "versionCode", .. }));
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let resolved = resolve(&base(), &sdks(24, 36, 36)).unwrap();
        let again = resolve(&DescriptorFragment::from(&resolved), &DescriptorFragment::new()).unwrap();
        assert_eq!(again, resolved);
    }

    #[test]
    fn test_resolve_layers_matches_pairwise_resolve() {
        let release = DescriptorFragment {
            minify_enabled: Some(true),
            shrink_resources_enabled: Some(true),
            signing_config_ref: Some("release".into()),
            ..Default::default()
        };
        let layered = resolve_layers([&base(), &sdks(24, 36, 36), &release]).unwrap();
        let pairwise = resolve(&base().overlay(&sdks(24, 36, 36)), &release).unwrap();
        assert_eq!(layered, pairwise);
        assert_eq!(layered.signing_config_ref, "release");
    }

    #[test]
    fn test_error_conversion_carries_code_and_suggestion() {
        let err: Error = ResolveError::MissingField("applicationId").into();
        assert_eq!(err.code, ErrorCode::MissingField);
        assert!(err.message.contains("applicationId"));
        assert!(err.suggestion.unwrap().contains("applicationId"));
    }

    fn opt_i64() -> impl Strategy<Value = Option<i64>> {
        prop::option::of(1i64..=40)
    }

    fn opt_string() -> impl Strategy<Value = Option<String>> {
        prop::option::of("[a-z]{1,8}(\\.[a-z]{1,8}){1,2}")
    }

    prop_compose! {
        fn arb_fragment()(
            application_id in opt_string(),
            min_sdk in opt_i64(),
            target_sdk in opt_i64(),
            compile_sdk in opt_i64(),
            version_code in opt_i64(),
            version_name in opt_string(),
            java_version in prop::option::of(prop::sample::select(JavaVersion::ALL.to_vec())),
            desugaring_enabled in prop::option::of(any::<bool>()),
            minify_enabled in prop::option::of(any::<bool>()),
            shrink_resources_enabled in prop::option::of(any::<bool>()),
            signing_config_ref in opt_string(),
            namespace in opt_string(),
        ) -> DescriptorFragment {
            DescriptorFragment {
                application_id,
                min_sdk,
                target_sdk,
                compile_sdk,
                version_code,
                version_name,
                java_version,
                desugaring_enabled,
                minify_enabled,
                shrink_resources_enabled,
                signing_config_ref,
                namespace,
                ndk_version: None,
            }
        }
    }

    proptest! {
        #[test]
        fn prop_override_wins_else_base(over in arb_fragment()) {
            let base = base();
            if let Ok(d) = resolve(&base, &over) {
                prop_assert_eq!(&d.application_id, over.application_id.as_ref().or(base.application_id.as_ref()).unwrap());
                prop_assert_eq!(i64::from(d.min_sdk), over.min_sdk.or(base.min_sdk).unwrap());
                prop_assert_eq!(i64::from(d.target_sdk), over.target_sdk.or(base.target_sdk).unwrap());
                prop_assert_eq!(i64::from(d.compile_sdk), over.compile_sdk.or(base.compile_sdk).unwrap());
                prop_assert_eq!(i64::from(d.version_code), over.version_code.or(base.version_code).unwrap());
                prop_assert_eq!(&d.version_name, over.version_name.as_ref().or(base.version_name.as_ref()).unwrap());
                prop_assert_eq!(d.java_version, over.java_version.or(base.java_version).unwrap());
                prop_assert_eq!(d.desugaring_enabled, over.desugaring_enabled.or(base.desugaring_enabled).unwrap());
                prop_assert_eq!(d.minify_enabled, over.minify_enabled.or(base.minify_enabled).unwrap());
                prop_assert_eq!(d.shrink_resources_enabled, over.shrink_resources_enabled.or(base.shrink_resources_enabled).unwrap());
                prop_assert_eq!(&d.signing_config_ref, over.signing_config_ref.as_ref().or(base.signing_config_ref.as_ref()).unwrap());
                prop_assert_eq!(d.namespace, over.namespace);
            } else {
                let merged = base.overlay(&over);
                prop_assert!(!(merged.min_sdk <= merged.target_sdk && merged.target_sdk <= merged.compile_sdk));
            }
        }

        #[test]
        fn prop_resolve_idempotent(a in arb_fragment(), b in arb_fragment()) {
            if let Ok(d) = resolve(&a, &b) {
                let again = resolve(&DescriptorFragment::from(&d), &DescriptorFragment::new());
                prop_assert_eq!(again, Ok(d));
            }
        }
    }
}
