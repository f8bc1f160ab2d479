//! vBRIEF Validator CLI
//!
//! Validates vBRIEF v0.5 documents and inspects their dependency graphs.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;
use vbrief_validator::graph::validate_plan_dag;
use vbrief_validator::model::{plan_items, plan_of};
use vbrief_validator::{
    parse_document, resolve_ids, CheckKind, DagOutcome, OutputFormat, ReportMessage, SchemaCheck,
    Severity, ValidationReport, Validator, ValidatorConfig,
};
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "vbrief-validate")]
#[command(about = "Validate vBRIEF v0.5 planning documents")]
struct Cli {
    /// Config file layered over the default locations
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run schema, conformance and DAG checks
    Validate {
        /// Documents or directories (walked for *.json)
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// JSON Schema file (overrides config)
        #[arg(short, long)]
        schema: Option<PathBuf>,

        /// Output format (overrides config)
        #[arg(short, long, value_enum)]
        format: Option<FormatArg>,

        /// Hide conformance warnings
        #[arg(long)]
        no_warnings: bool,
    },

    /// Check edge references and cycles only
    Dag {
        /// Document to check
        file: PathBuf,
    },

    /// Print resolved fully-qualified item IDs in declaration order
    Ids {
        /// Document to read
        file: PathBuf,
    },

    /// Show the effective configuration
    Config {
        /// Write a default config file instead
        #[arg(long)]
        init: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Text,
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Text => OutputFormat::Text,
            FormatArg::Json => OutputFormat::Json,
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("✗ {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Returns whether every checked document passed
fn run(cli: Cli) -> anyhow::Result<bool> {
    let config_path = cli.config.as_deref().map(path_str).transpose()?;
    let mut config =
        ValidatorConfig::load_from(config_path).context("Failed to load configuration")?;

    match cli.command {
        Commands::Validate {
            paths,
            schema,
            format,
            no_warnings,
        } => {
            if let Some(schema) = schema {
                config.schema.path = Some(schema);
            }
            if let Some(format) = format {
                config.output.format = format.into();
            }
            if no_warnings {
                config.output.show_warnings = false;
            }
            validate(&paths, &config)
        }

        Commands::Dag { file } => {
            let document = read_document(&file)?;
            let outcome = match plan_of(&document) {
                Some(plan) => validate_plan_dag(plan),
                None => DagOutcome::Skipped,
            };
            match &outcome {
                DagOutcome::Skipped => {
                    println!("○ No edges to validate (DAG validation skipped)")
                }
                DagOutcome::Passed => {
                    println!("✓ DAG is valid (no cycles, all references resolve)")
                }
                DagOutcome::Failed(errors) => {
                    println!("✗ DAG validation failed:");
                    for error in errors {
                        println!("  - {}", error);
                    }
                }
            }
            Ok(!outcome.is_failed())
        }

        Commands::Ids { file } => {
            let document = read_document(&file)?;
            let Some(plan) = plan_of(&document) else {
                bail!("{} has no plan object", file.display());
            };
            let index = resolve_ids(plan_items(plan));
            for id in index.ids() {
                println!("{}", id);
            }
            Ok(true)
        }

        Commands::Config { init } => {
            if let Some(path) = init {
                if path.exists() {
                    bail!("{} already exists", path.display());
                }
                ValidatorConfig::default()
                    .save(path_str(&path)?)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                println!("✓ Wrote default configuration to {}", path.display());
            } else {
                print!("{}", toml::to_string_pretty(&config)?);
            }
            Ok(true)
        }
    }
}

fn validate(paths: &[PathBuf], config: &ValidatorConfig) -> anyhow::Result<bool> {
    let schema_path = config.schema_path();
    let schema = SchemaCheck::load(schema_path.as_deref())
        .with_context(|| format!("Failed to load schema {:?}", schema_path))?;
    let validator = Validator::new(schema);

    let files = collect_documents(paths)?;
    if files.is_empty() {
        bail!("No JSON documents found");
    }

    let mut all_valid = true;
    let mut results = Vec::new();

    for file in &files {
        match validator.validate_file(file) {
            Ok(report) => {
                all_valid &= report.is_valid();
                match config.output.format {
                    OutputFormat::Text => print_report(file, &report, config.output.show_warnings),
                    OutputFormat::Json => results.push(serde_json::json!({
                        "file": file.display().to_string(),
                        "valid": report.is_valid(),
                        "checked_at": chrono::Utc::now().to_rfc3339(),
                        "messages": visible_messages(&report, config.output.show_warnings),
                        "report": report,
                    })),
                }
            }
            Err(e) => {
                all_valid = false;
                match config.output.format {
                    OutputFormat::Text => {
                        println!("✗ {}: {}", file.display(), e);
                        println!();
                    }
                    OutputFormat::Json => results.push(serde_json::json!({
                        "file": file.display().to_string(),
                        "valid": false,
                        "checked_at": chrono::Utc::now().to_rfc3339(),
                        "error": e.to_string(),
                    })),
                }
            }
        }
    }

    if config.output.format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else if files.len() > 1 {
        let valid = if all_valid { "all valid" } else { "some INVALID" };
        println!("{} document(s) checked, {}", files.len(), valid);
    }

    Ok(all_valid)
}

/// Expand directories into the `*.json` files beneath them, sorted per directory
fn collect_documents(paths: &[PathBuf]) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if !path.is_dir() {
            files.push(path.clone());
            continue;
        }
        for entry in WalkDir::new(path).sort_by_file_name() {
            let entry = entry.with_context(|| format!("Failed to walk {}", path.display()))?;
            let is_json = entry.path().extension().is_some_and(|ext| ext == "json");
            if entry.file_type().is_file() && is_json {
                files.push(entry.into_path());
            }
        }
    }
    Ok(files)
}

fn visible_messages(report: &ValidationReport, show_warnings: bool) -> Vec<ReportMessage> {
    report
        .messages()
        .into_iter()
        .filter(|m| show_warnings || m.severity != Severity::Warning)
        .collect()
}

fn select(
    messages: &[ReportMessage],
    check: CheckKind,
    severity: Severity,
) -> impl Iterator<Item = &ReportMessage> {
    messages
        .iter()
        .filter(move |m| m.check == check && m.severity == severity)
}

fn print_report(file: &Path, report: &ValidationReport, show_warnings: bool) {
    println!("Validating: {}", file.display());
    println!();

    let messages = visible_messages(report, show_warnings);
    let of = |check, severity| select(&messages, check, severity);

    // Schema
    if report.schema.is_failed() {
        println!("✗ JSON Schema validation failed:");
        for message in of(CheckKind::Schema, Severity::Error) {
            println!("  {}", message.text);
            if let Some(path) = &message.path {
                println!("  at: {}", path);
            }
        }
    } else if let Some(info) = of(CheckKind::Schema, Severity::Info).next() {
        println!("⚠ {}", info.text);
    } else {
        println!("✓ JSON Schema validation passed");
    }

    // Conformance
    if report.conformance.is_conformant() {
        println!("✓ Conformance validation passed");
    } else {
        println!("✗ Conformance validation failed:");
        for message in of(CheckKind::Conformance, Severity::Error) {
            println!("  - {}", message.text);
        }
    }
    let mut warnings = of(CheckKind::Conformance, Severity::Warning).peekable();
    if warnings.peek().is_some() {
        println!("⚠ Warnings:");
        for message in warnings {
            println!("  - {}", message.text);
        }
    }

    // DAG
    match &report.dag {
        DagOutcome::Skipped => println!("○ No edges to validate (DAG validation skipped)"),
        DagOutcome::Passed => println!("✓ DAG validation passed"),
        DagOutcome::Failed(_) => {
            println!("✗ DAG validation failed:");
            for message in of(CheckKind::Dag, Severity::Error) {
                println!("  - {}", message.text);
            }
        }
    }

    println!();
    if report.is_valid() {
        println!("✓ Document is vBRIEF v0.5 conformant");
    } else {
        println!("✗ Document is NOT vBRIEF v0.5 conformant");
    }
    println!();
}

fn read_document(path: &Path) -> anyhow::Result<serde_json::Value> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(parse_document(&text)?)
}

fn path_str(path: &Path) -> anyhow::Result<&str> {
    path.to_str()
        .with_context(|| format!("Path is not valid UTF-8: {}", path.display()))
}
