//! droidconf CLI
//!
//! Resolve, validate and normalize Android Gradle build descriptors.

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use droidconf_android::{
    BuildDescriptor, MapVersionSource, Resolution, Resolver, SigningRegistry, ValidationOptions, VersionValue,
};
use droidconf_cli::output::{format_duration, set_colors, Status};
use droidconf_cli::report::{print_report, summary};
use droidconf_core::config::Config;
use droidconf_core::error::{exit_codes, Error, ResultExt};
use droidconf_telemetry::TelemetryConfig;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

#[derive(Parser)]
#[command(name = "droidconf")]
#[command(about = "Resolve, validate and normalize Android Gradle build descriptors")]
#[command(version)]
struct Cli {
    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Version source file (`key=value` properties or TOML)
    #[arg(long, global = true)]
    versions: Option<PathBuf>,

    /// Define a version symbol, e.g. `-D flutter.minSdkVersion=21`
    #[arg(short = 'D', value_name = "KEY=VALUE", value_parser = parse_define, global = true)]
    define: Vec<(String, String)>,

    /// Additional known signing config (repeatable)
    #[arg(long = "signing", value_name = "NAME", global = true)]
    signing: Vec<String>,

    /// Treat warnings as errors
    #[arg(long, global = true)]
    strict: bool,

    /// Increase output verbosity
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
    /// Print the parsed descriptor as JSON
    Parse {
        /// Path to build.gradle.kts
        file: PathBuf,
    },

    /// Resolve and validate, then print the report
    Check {
        /// Path to build.gradle.kts
        file: PathBuf,
    },

    /// Print the normalized configuration
    Emit {
        /// Path to build.gradle.kts
        file: PathBuf,
        /// Output format (defaults to `output.format` from the config file)
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,
        /// Emit even when validation reports errors
        #[arg(long)]
        force: bool,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Kts,
}

impl OutputFormat {
    fn from_config(name: &str) -> Self {
        match name {
            "kts" => OutputFormat::Kts,
            _ => OutputFormat::Json,
        }
    }
}

fn parse_define(raw: &str) -> std::result::Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.trim().to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got `{}`", raw)),
    }
}

/// Everything a command needs besides its own arguments
struct Settings {
    config: Config,
    versions: MapVersionSource,
    registry: SigningRegistry,
    options: ValidationOptions,
}

impl Settings {
    fn load(cli: &Cli) -> droidconf_core::Result<Self> {
        let config = Config::load(cli.config.as_deref())?;
        if let Some(path) = &config.path {
            debug!(path = %path.display(), "Loaded configuration");
        }

        // Later sources override earlier ones
        let mut versions = MapVersionSource::from_toml_table(&config.schema.versions.symbols)
            .context("In [versions.symbols]")?;
        if let Some(path) = config.properties_path() {
            versions.merge(MapVersionSource::load(&path)?);
        }
        if let Some(path) = &cli.versions {
            versions.merge(MapVersionSource::load(path)?);
        }
        for (key, value) in &cli.define {
            versions.insert(key.as_str(), VersionValue::parse(value));
        }
        debug!(symbols = versions.len(), "Version source ready");

        let mut registry = if config.schema.signing.implicit_debug {
            SigningRegistry::new()
        } else {
            SigningRegistry::empty()
        };
        registry.extend(config.schema.signing.configs.iter().cloned());
        registry.extend(cli.signing.iter().cloned());

        let mut options = ValidationOptions::from(config.schema.validation.clone());
        options.strict |= cli.strict;

        Ok(Self {
            config,
            versions,
            registry,
            options,
        })
    }

    fn resolver(&self) -> Resolver<&MapVersionSource, &SigningRegistry> {
        Resolver::new(&self.versions, &self.registry).with_options(self.options.clone())
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.no_color {
        set_colors(false);
    }

    droidconf_telemetry::init_with_config(TelemetryConfig::default().with_verbosity(cli.verbose, cli.quiet))?;

    let exit_code = match Settings::load(&cli) {
        Ok(settings) => match &cli.command {
            Commands::Parse { file } => run_parse(file),
            Commands::Check { file } => run_check(file, &settings, &cli),
            Commands::Emit { file, format, force } => run_emit(file, *format, *force, &settings, &cli),
        },
        Err(e) => fail(e),
    };

    if cli.verbose > 0 && !cli.quiet {
        print_timings();
    }

    std::process::exit(exit_code);
}

fn fail(err: Error) -> i32 {
    Status::error(&err.to_string());
    err.code.exit_code()
}

fn read_descriptor(path: &Path) -> droidconf_core::Result<String> {
    std::fs::read_to_string(path)
        .map_err(Error::from)
        .context(format!("While reading {}", path.display()))
}

fn run_parse(file: &Path) -> i32 {
    let result = read_descriptor(file).and_then(|text| {
        let descriptor = BuildDescriptor::parse(&text)?;
        Ok(serde_json::to_string_pretty(&descriptor)?)
    });
    match result {
        Ok(json) => {
            println!("{}", json);
            exit_codes::SUCCESS
        }
        Err(e) => fail(e),
    }
}

fn resolve(file: &Path, settings: &Settings) -> droidconf_core::Result<Resolution> {
    let text = read_descriptor(file)?;
    Ok(settings.resolver().run(&text)?)
}

fn run_check(file: &Path, settings: &Settings, cli: &Cli) -> i32 {
    let resolution = match resolve(file, settings) {
        Ok(r) => r,
        Err(e) => return fail(e),
    };

    print_report(&resolution.report, cli.quiet);
    let line = format!("{}: {}", file.display(), summary(&resolution.report));
    if resolution.is_valid() {
        if !cli.quiet {
            Status::success(&line);
        }
        exit_codes::SUCCESS
    } else {
        Status::error(&line);
        exit_codes::VALIDATION_ERROR
    }
}

fn run_emit(file: &Path, format: Option<OutputFormat>, force: bool, settings: &Settings, cli: &Cli) -> i32 {
    let resolution = match resolve(file, settings) {
        Ok(r) => r,
        Err(e) => return fail(e),
    };

    print_report(&resolution.report, cli.quiet);
    if !resolution.is_valid() && !force {
        Status::error(&format!(
            "Refusing to emit {} ({}); use --force to override",
            file.display(),
            summary(&resolution.report)
        ));
        return exit_codes::VALIDATION_ERROR;
    }

    let output = settings.config.schema.output.clone();
    let format = format.unwrap_or_else(|| OutputFormat::from_config(&output.format));
    let rendered = match format {
        OutputFormat::Json => resolution.config.to_json(output.pretty),
        OutputFormat::Kts => Ok(resolution.config.to_gradle_kts()),
    };
    match rendered {
        Ok(text) => {
            print!("{}", text);
            if !text.ends_with('\n') {
                println!();
            }
            exit_codes::SUCCESS
        }
        Err(e) => fail(e),
    }
}

fn print_timings() {
    for stage in ["parse", "resolve", "validate", "emit"] {
        if let Some(stats) = droidconf_telemetry::timings().stage(stage) {
            let elapsed = Duration::from_secs_f64(stats.total_ms / 1000.0);
            Status::info(&format!("{}: {}", stage, format_duration(elapsed)));
        }
    }
    debug!(session_id = droidconf_telemetry::session_id(), "Session finished");
}
