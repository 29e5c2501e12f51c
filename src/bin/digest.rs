//! Digest CLI - Command-line interface for Synheart Digest
//!
//! Commands:
//! - slim: Slim a collected provider document into a digest document
//! - plan: Print the collection windows for a configuration
//! - config: Print the effective configuration
//! - doctor: Diagnose configuration and environment

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chrono::{Local, NaiveDate};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use synheart_digest::{
    DigestConfig, DigestEncoder, DigestError, DigestProcessor, OutputStyle, PickPolicy, Preset, DIGEST_VERSION, PRODUCER_NAME,
};

/// Digest - Turn verbose wearable records into compact daily summaries
#[derive(Parser)]
#[command(name = "digest")]
#[command(author = "Synheart AI Inc")]
#[command(version = DIGEST_VERSION)]
#[command(about = "Slim wearable records into a compact digest", long_about = None)]
struct Cli {
    /// Log debug output to stderr (DIGEST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Slim a collected provider document
    Slim {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long)]
        output: PathBuf,

        /// Configuration file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Configuration preset, used when no file is given
        #[arg(long, default_value = "default")]
        preset: PresetArg,

        /// Stress level above which event timelines keep full resolution
        #[arg(long)]
        high_stress_threshold: Option<f64>,

        /// Which training readiness record to keep per day
        #[arg(long)]
        readiness_pick: Option<PickArg>,

        /// Output format
        #[arg(long, default_value = "json-pretty")]
        output_format: OutputFormat,
    },

    /// Print the collection windows per metric
    Plan {
        /// Configuration file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Configuration preset, used when no file is given
        #[arg(long, default_value = "default")]
        preset: PresetArg,

        /// Reference date (YYYY-MM-DD), defaults to the local date
        #[arg(long)]
        today: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the effective configuration as JSON
    Config {
        /// Configuration preset
        #[arg(long, default_value = "default")]
        preset: PresetArg,
    },

    /// Diagnose configuration and environment
    Doctor {
        /// Check a configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum PresetArg {
    /// All metrics over the default window
    Default,
    /// Overnight recovery metrics
    Morning,
    /// Daytime load metrics
    Evening,
}

impl From<PresetArg> for Preset {
    fn from(arg: PresetArg) -> Self {
        match arg {
            PresetArg::Default => Preset::Default,
            PresetArg::Morning => Preset::Morning,
            PresetArg::Evening => Preset::Evening,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum PickArg {
    /// Keep the latest record of the day
    Latest,
    /// Keep the earliest record of the day
    Earliest,
}

impl From<PickArg> for PickPolicy {
    fn from(arg: PickArg) -> Self {
        match arg {
            PickArg::Latest => PickPolicy::Latest,
            PickArg::Earliest => PickPolicy::Earliest,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Single-line JSON
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

impl From<OutputFormat> for OutputStyle {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Json => OutputStyle::Compact,
            OutputFormat::JsonPretty => OutputStyle::Pretty,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", serde_json::to_string(&CliError::from(e)).unwrap_or_else(|_| "Unknown error".to_string()));
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("DIGEST_LOG").unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), DigestCliError> {
    match cli.command {
        Commands::Slim {
            input,
            output,
            config,
            preset,
            high_stress_threshold,
            readiness_pick,
            output_format,
        } => {
            let mut config = resolve_config(config.as_deref(), preset)?;
            if let Some(threshold) = high_stress_threshold {
                config.high_stress_threshold = threshold;
            }
            if let Some(pick) = readiness_pick {
                config.readiness_pick = pick.into();
            }
            config.validate()?;
            cmd_slim(&input, &output, config, output_format)
        }

        Commands::Plan {
            config,
            preset,
            today,
            json,
        } => {
            let config = resolve_config(config.as_deref(), preset)?;
            cmd_plan(&config, today.as_deref(), json)
        }

        Commands::Config { preset } => {
            println!("{}", DigestConfig::preset(preset.into()).to_json()?);
            Ok(())
        }

        Commands::Doctor { config, json } => cmd_doctor(config.as_deref(), json),
    }
}

/// Configuration file when given, otherwise the preset
fn resolve_config(path: Option<&Path>, preset: PresetArg) -> Result<DigestConfig, DigestCliError> {
    match path {
        Some(path) => {
            debug!(path = %path.display(), "loading configuration file");
            Ok(DigestConfig::load(path)?)
        }
        None => Ok(DigestConfig::preset(preset.into())),
    }
}

fn cmd_slim(
    input: &Path,
    output: &Path,
    config: DigestConfig,
    output_format: OutputFormat,
) -> Result<(), DigestCliError> {
    // Read input
    let input_data = if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        fs::read_to_string(input)?
    };

    if input_data.trim().is_empty() {
        return Err(DigestCliError::EmptyInput);
    }

    let digest = DigestProcessor::new(config).digest(&input_data)?;
    let output_data = DigestEncoder::with_style(output_format.into()).encode(&digest.document)?;

    info!(
        metrics = digest.document.len(),
        bytes_in = input_data.len(),
        bytes_out = output_data.len(),
        "slimmed document"
    );

    // Write output
    if output.to_string_lossy() == "-" {
        println!("{}", output_data);
    } else {
        fs::write(output, output_data)?;
    }

    Ok(())
}

fn cmd_plan(config: &DigestConfig, today: Option<&str>, json: bool) -> Result<(), DigestCliError> {
    let today = match today {
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map_err(|_| DigestCliError::InvalidDate(s.to_string()))?,
        None => Local::now().date_naive(),
    };

    let plan = config.collection_plan(today)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    println!("Collection Plan ({})", today);
    println!("===============");
    for window in &plan {
        match (window.start_date, window.end_date, window.limit) {
            (Some(start), Some(end), _) => {
                println!("  {:<24} {} .. {} ({} days)", window.metric, start, end, window.days)
            }
            (_, _, Some(limit)) => println!("  {:<24} last {} records", window.metric, limit),
            _ => println!("  {:<24} {} days", window.metric, window.days),
        }
    }

    Ok(())
}

#[derive(serde::Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(serde::Serialize)]
#[serde(rename_all = "lowercase")]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}

fn cmd_doctor(config: Option<&Path>, json: bool) -> Result<(), DigestCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "digest_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("Digest version {}", DIGEST_VERSION),
    });

    // Check configuration file if provided
    let config_check = match config {
        Some(path) if !path.exists() => DoctorCheck {
            name: "config".to_string(),
            status: CheckStatus::Warning,
            message: "Configuration file does not exist, defaults apply".to_string(),
        },
        Some(path) => match DigestConfig::load(path) {
            Ok(config) => {
                let enabled = config.metrics.values().filter(|m| m.enabled).count();
                DoctorCheck {
                    name: "config".to_string(),
                    status: CheckStatus::Ok,
                    message: format!(
                        "Configuration valid ({} metrics enabled, threshold {})",
                        enabled, config.high_stress_threshold
                    ),
                }
            }
            Err(e) => DoctorCheck {
                name: "config".to_string(),
                status: CheckStatus::Error,
                message: format!("Invalid configuration: {}", e),
            },
        },
        None => DoctorCheck {
            name: "config".to_string(),
            status: CheckStatus::Ok,
            message: "No configuration file, defaults apply".to_string(),
        },
    };
    checks.push(config_check);

    let stdin_check = if atty::is(atty::Stream::Stdin) {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a TTY (pass documents with -i <file>)".to_string(),
        }
    } else {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a pipe (ready for -i -)".to_string(),
        }
    };
    checks.push(stdin_check);

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: DIGEST_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Digest Doctor Report");
        println!("====================");
        println!("Producer: {}", report.producer);
        println!("Version:  {}", report.version);
        println!("\nChecks:");

        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    let has_errors = report.checks.iter().any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(DigestCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

// Error types

#[derive(Debug)]
enum DigestCliError {
    Io(io::Error),
    Digest(DigestError),
    Json(serde_json::Error),
    InvalidDate(String),
    EmptyInput,
    DoctorFailed,
}

impl From<io::Error> for DigestCliError {
    fn from(e: io::Error) -> Self {
        DigestCliError::Io(e)
    }
}

impl From<DigestError> for DigestCliError {
    fn from(e: DigestError) -> Self {
        DigestCliError::Digest(e)
    }
}

impl From<serde_json::Error> for DigestCliError {
    fn from(e: serde_json::Error) -> Self {
        DigestCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<DigestCliError> for CliError {
    fn from(e: DigestCliError) -> Self {
        match e {
            DigestCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            DigestCliError::Digest(DigestError::InvalidConfig(message)) => CliError {
                code: "CONFIG_ERROR".to_string(),
                message,
                hint: Some("Run 'digest config' to see a valid configuration".to_string()),
            },
            DigestCliError::Digest(e) => CliError {
                code: "DIGEST_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Input must be a JSON object keyed by metric name".to_string()),
            },
            DigestCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            DigestCliError::InvalidDate(value) => CliError {
                code: "INVALID_DATE".to_string(),
                message: format!("Invalid date '{}'", value),
                hint: Some("Use YYYY-MM-DD".to_string()),
            },
            DigestCliError::EmptyInput => CliError {
                code: "EMPTY_INPUT".to_string(),
                message: "Input document is empty".to_string(),
                hint: Some("Ensure input file is not empty".to_string()),
            },
            DigestCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: None,
            },
        }
    }
}
