//! Gradle Kotlin-DSL integration
//!
//! Reads literal assignments out of an Android `build.gradle.kts` into a
//! [`DescriptorFragment`], and renders a resolved [`BuildDescriptor`] back
//! into an `android { ... }` block.
//!
//! Only literals are taken. Right-hand sides the build tool evaluates
//! (`flutter.versionCode`, string templates, function calls) are reported
//! as [`DeferredAssignment`]s and leave the field unset for a later layer.

use crate::descriptor::{BuildDescriptor, JavaVersion};
use crate::fragment::DescriptorFragment;
use once_cell::sync::Lazy;
use regex::Regex;

/// Core library desugaring artifact emitted when desugaring is enabled
pub const DESUGAR_JDK_LIBS: &str = "com.android.tools:desugar_jdk_libs:2.1.4";

static ASSIGNMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Za-z_][A-Za-z0-9_]*)\s*=\s*(.+)$").unwrap());

static LEGACY_CALL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(minSdkVersion|targetSdkVersion|compileSdkVersion)\s*\(\s*(.+?)\s*\)$").unwrap()
});

static BLOCK_OPENER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^([A-Za-z_][A-Za-z0-9_.]*)\s*(?:\(\s*"([^"]*)"\s*\))?$"#).unwrap()
});

static STRING_LITERAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^"((?:[^"\\]|\\.)*)"$"#).unwrap());

static INT_LITERAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+$").unwrap());

static SIGNING_REF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"^signingConfigs(?:\.getByName\(\s*"([^"]+)"\s*\)|\[\s*"([^"]+)"\s*\]|\.([A-Za-z_][A-Za-z0-9_]*))$"#,
    )
    .unwrap()
});

/// An assignment whose value only the build tool can evaluate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeferredAssignment {
    /// Descriptor field the assignment targets
    pub field: &'static str,
    /// Right-hand side as written
    pub expression: String,
    /// 1-based line number
    pub line: usize,
}

/// Result of scanning a Gradle script
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    /// Fields assigned from literals
    pub fragment: DescriptorFragment,
    /// Recognized assignments left for a later layer, in source order
    pub deferred: Vec<DeferredAssignment>,
}

/// How a recognized key's value is read
#[derive(Debug, Clone, Copy)]
enum Target {
    Str(&'static str),
    Int(&'static str),
    Bool(&'static str),
    Java,
    Signing,
}

impl Target {
    fn field(self) -> &'static str {
        match self {
            Self::Str(f) | Self::Int(f) | Self::Bool(f) => f,
            Self::Java => "javaVersion",
            Self::Signing => "signingConfigRef",
        }
    }
}

/// Map a Gradle key to its descriptor field, given the enclosing blocks
fn target_for(key: &str, blocks: &[String]) -> Option<Target> {
    let in_release = blocks.iter().any(|b| b == "release");
    let in_default_config = blocks.iter().any(|b| b == "defaultConfig");

    let target = match key {
        "applicationId" => Target::Str("applicationId"),
        "namespace" => Target::Str("namespace"),
        "versionName" => Target::Str("versionName"),
        "ndkVersion" => Target::Str("ndkVersion"),
        "minSdk" | "minSdkVersion" => Target::Int("minSdk"),
        "targetSdk" | "targetSdkVersion" => Target::Int("targetSdk"),
        "compileSdk" | "compileSdkVersion" => Target::Int("compileSdk"),
        "versionCode" => Target::Int("versionCode"),
        "sourceCompatibility" | "targetCompatibility" | "jvmTarget" => Target::Java,
        "isCoreLibraryDesugaringEnabled" => Target::Bool("desugaringEnabled"),
        // Build-type settings only count for the release variant
        "isMinifyEnabled" if in_release => Target::Bool("minifyEnabled"),
        "isShrinkResources" if in_release => Target::Bool("shrinkResourcesEnabled"),
        "signingConfig" if in_release || in_default_config => Target::Signing,
        _ => return None,
    };
    Some(target)
}

/// Scan a Kotlin-DSL build script for descriptor assignments
///
/// A later literal assignment of the same field wins. A deferred
/// assignment never erases an earlier literal; a later literal drops the
/// earlier deferred entries for that field. Text inside `//` and `/* */`
/// comments is ignored.
pub fn extract(source: &str) -> Extraction {
    let mut extraction = Extraction::default();
    let mut blocks: Vec<String> = Vec::new();
    let mut comment_depth = 0;

    for (index, raw) in source.lines().enumerate() {
        let code = strip_comments(raw, &mut comment_depth);
        let line = index + 1;

        for piece in split_pieces(&code) {
            match piece {
                Piece::Open(head) => {
                    // `versionCode = run {` assigns whatever the lambda returns
                    if let Some((key, value)) = split_assignment(head) {
                        if let Some(target) = target_for(key, &blocks) {
                            apply(&mut extraction, target, &format!("{value} {{ ... }}"), line);
                        }
                    }
                    blocks.push(block_label(head));
                }
                Piece::Statement(statement) => {
                    if let Some((key, value)) = split_assignment(statement) {
                        if let Some(target) = target_for(key, &blocks) {
                            apply(&mut extraction, target, value, line);
                        }
                    }
                }
                Piece::Close => {
                    blocks.pop();
                }
            }
        }
    }

    extraction
}

/// A piece of one source line, split at braces and `;`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Piece<'a> {
    /// Text before an opening brace
    Open(&'a str),
    Statement(&'a str),
    Close,
}

/// Split a comment-free line at braces and semicolons outside string
/// literals. Empty statements are dropped; pieces are trimmed.
fn split_pieces(code: &str) -> Vec<Piece<'_>> {
    let mut pieces = Vec::new();
    let mut in_string = false;
    let mut escaped = false;
    let mut start = 0;

    for (i, c) in code.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        if in_string {
            match c {
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => {
                pieces.push(Piece::Open(code[start..i].trim()));
                start = i + 1;
            }
            '}' | ';' => {
                let statement = code[start..i].trim();
                if !statement.is_empty() {
                    pieces.push(Piece::Statement(statement));
                }
                if c == '}' {
                    pieces.push(Piece::Close);
                }
                start = i + 1;
            }
            _ => {}
        }
    }

    let rest = code[start..].trim();
    if !rest.is_empty() {
        pieces.push(Piece::Statement(rest));
    }
    pieces
}

fn split_assignment(line: &str) -> Option<(&str, &str)> {
    if let Some(caps) = LEGACY_CALL.captures(line) {
        let key = caps.get(1)?.as_str();
        let value = caps.get(2)?.as_str();
        return Some((key, value));
    }
    let caps = ASSIGNMENT.captures(line)?;
    Some((caps.get(1)?.as_str(), caps.get(2)?.as_str().trim()))
}

fn apply(extraction: &mut Extraction, target: Target, value: &str, line: usize) {
    let fragment = &mut extraction.fragment;
    let applied = match target {
        Target::Str(field) => parse_string(value).map(|s| set_string(fragment, field, s)),
        Target::Int(field) => parse_int(value).map(|n| set_int(fragment, field, n)),
        Target::Bool(field) => parse_bool(value).map(|b| set_bool(fragment, field, b)),
        Target::Java => parse_java(value).map(|v| fragment.java_version = Some(v)),
        Target::Signing => parse_signing(value).map(|r| fragment.signing_config_ref = Some(r)),
    };

    let field = target.field();
    if applied.is_some() {
        extraction.deferred.retain(|d| d.field != field);
    } else {
        tracing::trace!(field, expression = value, line, "deferred Gradle assignment");
        extraction.deferred.push(DeferredAssignment {
            field,
            expression: value.to_string(),
            line,
        });
    }
}

fn set_string(fragment: &mut DescriptorFragment, field: &str, value: String) {
    let slot = match field {
        "applicationId" => &mut fragment.application_id,
        "namespace" => &mut fragment.namespace,
        "versionName" => &mut fragment.version_name,
        _ => &mut fragment.ndk_version,
    };
    *slot = Some(value);
}

fn set_int(fragment: &mut DescriptorFragment, field: &str, value: i64) {
    let slot = match field {
        "minSdk" => &mut fragment.min_sdk,
        "targetSdk" => &mut fragment.target_sdk,
        "compileSdk" => &mut fragment.compile_sdk,
        _ => &mut fragment.version_code,
    };
    *slot = Some(value);
}

fn set_bool(fragment: &mut DescriptorFragment, field: &str, value: bool) {
    let slot = match field {
        "desugaringEnabled" => &mut fragment.desugaring_enabled,
        "minifyEnabled" => &mut fragment.minify_enabled,
        _ => &mut fragment.shrink_resources_enabled,
    };
    *slot = Some(value);
}

/// String literal without templates, with Kotlin escapes decoded
fn parse_string(value: &str) -> Option<String> {
    let inner = STRING_LITERAL.captures(value)?.get(1)?.as_str();
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.push(decode_escape(&mut chars)?),
            '$' => return None,
            other => out.push(other),
        }
    }
    Some(out)
}

/// Decode the escape following a backslash; `None` for unknown escapes
fn decode_escape(chars: &mut std::str::Chars<'_>) -> Option<char> {
    match chars.next()? {
        'n' => Some('\n'),
        't' => Some('\t'),
        'r' => Some('\r'),
        'b' => Some('\u{8}'),
        c @ ('"' | '\'' | '\\' | '$') => Some(c),
        'u' => {
            let hex: String = chars.by_ref().take(4).collect();
            if hex.len() != 4 {
                return None;
            }
            char::from_u32(u32::from_str_radix(&hex, 16).ok()?)
        }
        _ => None,
    }
}

fn parse_int(value: &str) -> Option<i64> {
    if INT_LITERAL.is_match(value) {
        value.parse().ok()
    } else {
        None
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

fn parse_java(value: &str) -> Option<JavaVersion> {
    let value = value.strip_suffix(".toString()").unwrap_or(value);
    let value = parse_string(value).unwrap_or_else(|| value.to_string());
    value.parse().ok()
}

fn parse_signing(value: &str) -> Option<String> {
    let caps = SIGNING_REF.captures(value)?;
    caps.get(1)
        .or_else(|| caps.get(2))
        .or_else(|| caps.get(3))
        .map(|m| m.as_str().to_string())
}

/// Name of the block opened by the text before `{`;
/// `getByName("release")` opens `release`
fn block_label(head: &str) -> String {
    match BLOCK_OPENER.captures(head) {
        Some(caps) => match caps.get(2) {
            Some(arg) => arg.as_str().to_string(),
            None => caps[1].to_string(),
        },
        None => String::new(),
    }
}

/// Remove `//` and `/* */` comments from a line, ignoring comment
/// markers inside string literals
///
/// `depth` carries the block-comment nesting level from one line to the
/// next; Kotlin block comments nest.
fn strip_comments(line: &str, depth: &mut usize) -> String {
    let mut out = String::with_capacity(line.len());
    let mut chars = line.chars().peekable();
    let mut in_string = false;

    while let Some(c) = chars.next() {
        if *depth > 0 {
            match (c, chars.peek()) {
                ('*', Some('/')) => {
                    chars.next();
                    *depth -= 1;
                    if *depth == 0 {
                        out.push(' ');
                    }
                }
                ('/', Some('*')) => {
                    chars.next();
                    *depth += 1;
                }
                _ => {}
            }
            continue;
        }

        if in_string {
            out.push(c);
            match c {
                '\\' => {
                    if let Some(next) = chars.next() {
                        out.push(next);
                    }
                }
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match (c, chars.peek()) {
            ('/', Some('/')) => break,
            ('/', Some('*')) => {
                chars.next();
                *depth += 1;
            }
            ('"', _) => {
                in_string = true;
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}

fn kotlin_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' | '\\' | '$' => {
                out.push('\\');
                out.push(c);
            }
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Render a resolved descriptor as a Kotlin-DSL `android { ... }` block
pub fn render(descriptor: &BuildDescriptor) -> String {
    let java = descriptor.java_version.gradle_constant();
    let mut lines = vec![
        "android {".to_string(),
        format!("    namespace = {}", kotlin_string(descriptor.effective_namespace())),
        format!("    compileSdk = {}", descriptor.compile_sdk),
    ];
    if let Some(ndk) = &descriptor.ndk_version {
        lines.push(format!("    ndkVersion = {}", kotlin_string(ndk)));
    }

    lines.push(String::new());
    lines.push("    compileOptions {".to_string());
    lines.push(format!(
        "        isCoreLibraryDesugaringEnabled = {}",
        descriptor.desugaring_enabled
    ));
    lines.push(format!("        sourceCompatibility = {java}"));
    lines.push(format!("        targetCompatibility = {java}"));
    lines.push("    }".to_string());

    lines.push(String::new());
    lines.push("    kotlinOptions {".to_string());
    lines.push(format!("        jvmTarget = {java}.toString()"));
    lines.push("    }".to_string());

    lines.push(String::new());
    lines.push("    defaultConfig {".to_string());
    lines.push(format!(
        "        applicationId = {}",
        kotlin_string(&descriptor.application_id)
    ));
    lines.push(format!("        minSdk = {}", descriptor.min_sdk));
    lines.push(format!("        targetSdk = {}", descriptor.target_sdk));
    lines.push(format!("        versionCode = {}", descriptor.version_code));
    lines.push(format!(
        "        versionName = {}",
        kotlin_string(&descriptor.version_name)
    ));
    lines.push("    }".to_string());

    lines.push(String::new());
    lines.push("    buildTypes {".to_string());
    lines.push("        release {".to_string());
    lines.push(format!("            isMinifyEnabled = {}", descriptor.minify_enabled));
    lines.push(format!(
        "            isShrinkResources = {}",
        descriptor.shrink_resources_enabled
    ));
    lines.push(format!(
        "            signingConfig = signingConfigs.getByName({})",
        kotlin_string(&descriptor.signing_config_ref)
    ));
    lines.push("        }".to_string());
    lines.push("    }".to_string());
    lines.push("}".to_string());

    if descriptor.desugaring_enabled {
        lines.push(String::new());
        lines.push("dependencies {".to_string());
        lines.push(format!(
            "    coreLibraryDesugaring({})",
            kotlin_string(DESUGAR_JDK_LIBS)
        ));
        lines.push("}".to_string());
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}
