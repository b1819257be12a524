//! droidspec CLI
//!
//! Resolve, check and render layered Android build descriptors.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use droidspec_android::gradle;
use droidspec_android::lint::lint;
use droidspec_android::{resolve_layers, BuildDescriptor, DescriptorFragment};
use droidspec_cli::output::{format_count, Status};
use droidspec_core::config::{Config, OutputFormat};
use droidspec_core::error::{exit_codes, Error};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "droidspec")]
#[command(about = "Resolve, check and render layered Android build descriptors")]
#[command(version)]
struct Cli {
    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve descriptor layers (lowest precedence first) and print the result
    Resolve {
        /// Layer files (.toml, .json, .gradle.kts); defaults to the configured layers
        layers: Vec<PathBuf>,
        /// Output format: json, toml, gradle
        #[arg(long)]
        format: Option<OutputFormat>,
    },

    /// Extract a descriptor fragment from a Gradle Kotlin-DSL script
    Extract {
        /// Path to build.gradle.kts
        file: PathBuf,
        /// Output format: json, toml
        #[arg(long, default_value = "json")]
        format: OutputFormat,
    },

    /// Resolve layers and run lint checks
    Check {
        /// Layer files; defaults to the configured layers
        layers: Vec<PathBuf>,
        /// Treat lint warnings as failures
        #[arg(long)]
        strict: bool,
    },

    /// Resolve layers and print the Gradle android block
    Render {
        /// Layer files; defaults to the configured layers
        layers: Vec<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.no_color {
        owo_colors::set_override(false);
    }

    init_tracing(cli.verbose, cli.quiet);

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => std::process::exit(report(&e)),
    };

    let exit_code = match cli.command {
        Commands::Resolve { layers, format } => {
            let format = format.unwrap_or(config.schema.output.format);
            run_resolve(&layers, format, &config)
        }
        Commands::Extract { file, format } => run_extract(&file, format, cli.quiet),
        Commands::Check { layers, strict } => {
            run_check(&layers, strict || config.schema.lint.strict, cli.quiet, &config)
        }
        Commands::Render { layers } => run_resolve(&layers, OutputFormat::Gradle, &config),
    };

    std::process::exit(exit_code);
}

fn init_tracing(verbose: u8, quiet: bool) {
    let default_filter = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "droidspec=debug,droidspec_android=debug,droidspec_core=debug",
        (false, _) => "droidspec=trace,droidspec_android=trace,droidspec_core=trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Print an error with its context and suggestion, returning the exit code
fn report(err: &Error) -> i32 {
    Status::error(&format!("[{}] {}", err.code, err.message));
    if let Some(context) = &err.context {
        Status::detail(context);
    }
    if let Some(suggestion) = &err.suggestion {
        Status::detail(suggestion);
    }
    err.code.exit_code()
}

fn load_layers(paths: &[PathBuf], config: &Config) -> droidspec_core::Result<Vec<DescriptorFragment>> {
    let paths = if paths.is_empty() {
        config.layer_paths()
    } else {
        paths.to_vec()
    };

    if paths.is_empty() {
        return Err(Error::config("No descriptor layers given")
            .with_suggestion("Pass layer files or list them under [layers] in droidspec.toml"));
    }

    tracing::debug!(layers = paths.len(), "loading descriptor layers");
    paths
        .iter()
        .map(|path| DescriptorFragment::from_path(path))
        .collect()
}

fn resolve_paths(paths: &[PathBuf], config: &Config) -> droidspec_core::Result<BuildDescriptor> {
    let layers = load_layers(paths, config)?;
    Ok(resolve_layers(&layers)?)
}

fn emit_descriptor(descriptor: &BuildDescriptor, format: OutputFormat) -> Result<String> {
    let text = match format {
        OutputFormat::Json => {
            serde_json::to_string_pretty(descriptor).context("encoding descriptor as JSON")? + "\n"
        }
        OutputFormat::Toml => toml::to_string(descriptor).context("encoding descriptor as TOML")?,
        OutputFormat::Gradle => gradle::render(descriptor),
    };
    Ok(text)
}

fn emit_fragment(fragment: &DescriptorFragment, format: OutputFormat) -> droidspec_core::Result<String> {
    match format {
        OutputFormat::Toml => fragment.to_toml_string(),
        OutputFormat::Json | OutputFormat::Gradle => {
            fragment.to_json_string().map(|json| json + "\n")
        }
    }
}

fn run_resolve(paths: &[PathBuf], format: OutputFormat, config: &Config) -> i32 {
    let descriptor = match resolve_paths(paths, config) {
        Ok(descriptor) => descriptor,
        Err(e) => return report(&e),
    };

    match emit_descriptor(&descriptor, format) {
        Ok(text) => {
            print!("{text}");
            exit_codes::SUCCESS
        }
        Err(e) => {
            Status::error(&format!("{e:#}"));
            exit_codes::FAILURE
        }
    }
}

fn run_extract(file: &Path, format: OutputFormat, quiet: bool) -> i32 {
    if format == OutputFormat::Gradle {
        Status::error("extract prints a fragment; use --format json or --format toml");
        return exit_codes::FAILURE;
    }

    let source = match std::fs::read_to_string(file) {
        Ok(source) => source,
        Err(e) => {
            return report(&Error::from(e).with_context(format!("Reading {}", file.display())));
        }
    };

    let extraction = gradle::extract(&source);

    if !quiet {
        for deferred in &extraction.deferred {
            Status::warning(&format!(
                "{}:{}: {} = {} is evaluated by Gradle; supply it from another layer",
                file.display(),
                deferred.line,
                deferred.field,
                deferred.expression
            ));
        }
    }

    match emit_fragment(&extraction.fragment, format) {
        Ok(text) => {
            print!("{text}");
            exit_codes::SUCCESS
        }
        Err(e) => report(&e),
    }
}

fn run_check(paths: &[PathBuf], strict: bool, quiet: bool, config: &Config) -> i32 {
    let descriptor = match resolve_paths(paths, config) {
        Ok(descriptor) => descriptor,
        Err(e) => return report(&e),
    };

    if !quiet {
        Status::success(&format!(
            "Resolved {} (minSdk {}, targetSdk {}, compileSdk {})",
            descriptor.application_id,
            descriptor.min_sdk,
            descriptor.target_sdk,
            descriptor.compile_sdk
        ));
    }

    let result = lint(&descriptor);
    for warning in result.warnings() {
        Status::warning(&warning.to_string());
    }

    let count = result.warnings().len();
    if count == 0 {
        if !quiet {
            Status::success("No lint warnings");
        }
        return exit_codes::SUCCESS;
    }

    if strict {
        match result.promote_warnings().to_result() {
            Ok(()) => exit_codes::SUCCESS,
            Err(e) => report(&e.with_context("lint warnings are fatal in strict mode")),
        }
    } else {
        if !quiet {
            Status::info(&format_count(count, "lint warning", "lint warnings"));
        }
        exit_codes::SUCCESS
    }
}
