//! Implementation of the `srvconf-check` command.

use crate::report;
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use serde::Serialize;
use srvconf_core::{DocumentKind, Workspace};
use srvconf_loader::{load_schema_or_builtin, WorkspaceScanner};
use srvconf_validate::{validate_source, Diagnostic, ValidationOptions};
use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Output format for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output (default)
    #[default]
    Text,
    /// JSON output for IDE/tooling integration
    Json,
}

/// A diagnostic message in JSON format.
#[derive(Debug, Serialize)]
pub struct JsonDiagnostic {
    /// Source file path
    pub file: String,
    /// Line number (1-based)
    pub line: usize,
    /// Column number (1-based)
    pub column: usize,
    /// End line number (1-based)
    pub end_line: usize,
    /// End column number (1-based)
    pub end_column: usize,
    /// Always "error"
    pub severity: String,
    /// Diagnostic code (e.g., "incorrect_variable")
    pub code: String,
    /// Error message
    pub message: String,
}

/// JSON output structure for all diagnostics.
#[derive(Debug, Serialize)]
pub struct JsonOutput {
    /// List of diagnostics
    pub diagnostics: Vec<JsonDiagnostic>,
    /// Total error count
    pub error_count: usize,
    /// Number of files checked
    pub file_count: usize,
}

/// Convert a byte offset to (line, column) in 1-based indexing.
fn byte_offset_to_line_col(source: &str, offset: usize) -> (usize, usize) {
    let mut line = 1;
    let mut col = 1;
    for (i, ch) in source.char_indices() {
        if i >= offset {
            break;
        }
        if ch == '\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }
    (line, col)
}

/// Check server configuration files for undeclared variables and invalid
/// values.
#[derive(Parser, Debug)]
#[command(name = "srvconf-check", author, version, about, long_about = None)]
pub struct Args {
    /// Files or directories to check (defaults to the workspace root)
    #[arg(value_name = "PATH")]
    pub paths: Vec<PathBuf>,

    /// Workspace root scanned for variable declarations
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub root: PathBuf,

    /// Schema JSON to use instead of the built-in schema
    #[arg(long, value_name = "FILE")]
    pub schema: Option<PathBuf>,

    /// Report keys that are not in the schema
    #[arg(long)]
    pub unknown_keys: bool,

    /// Output format (text or json)
    #[arg(long, short = 'f', value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Suppress all output (just use exit code)
    #[arg(short, long)]
    pub quiet: bool,

    /// Show verbose output including debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Expand the command line paths into the documents to check.
///
/// Directories contribute the files that declare variables; files named
/// explicitly are checked whenever their kind is known.
fn collect_files(args: &Args, scanner: &WorkspaceScanner) -> Result<Vec<PathBuf>> {
    let roots = if args.paths.is_empty() {
        std::slice::from_ref(&args.root)
    } else {
        args.paths.as_slice()
    };

    let mut files = Vec::new();
    for path in roots {
        if path.is_dir() {
            let found = scanner
                .source_files(path)
                .with_context(|| format!("failed to scan {}", path.display()))?;
            files.extend(found);
        } else if path.is_file() {
            if DocumentKind::from_path(path).is_some() {
                files.push(path.clone());
            } else {
                tracing::warn!("Skipping {}: unknown file type", path.display());
            }
        } else {
            anyhow::bail!("file not found: {}", path.display());
        }
    }
    files.dedup();
    Ok(files)
}

fn load_workspace(args: &Args, scanner: &WorkspaceScanner) -> Result<Workspace> {
    let schema =
        load_schema_or_builtin(args.schema.as_deref()).context("failed to load schema")?;
    let workspace = Workspace::new(schema);

    let sources = scanner
        .scan(&args.root)
        .with_context(|| format!("failed to scan workspace {}", args.root.display()))?;
    tracing::debug!("Loaded {} variable sources", sources.len());
    for source in sources {
        workspace.refresh_source(source);
    }
    Ok(workspace)
}

fn check_file(
    path: &Path,
    workspace: &Workspace,
    options: &ValidationOptions,
) -> Result<(String, Vec<Diagnostic>)> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let diagnostics = match DocumentKind::from_path(path) {
        Some(kind) => validate_source(&source, kind, workspace, options),
        None => Vec::new(),
    };
    Ok((source, diagnostics))
}

/// Run the check, writing the report to `out`.
///
/// Returns the number of diagnostics found.
pub fn run<W: Write>(args: &Args, out: &mut W) -> Result<usize> {
    let start = std::time::Instant::now();
    let scanner = WorkspaceScanner::new();
    let workspace = load_workspace(args, &scanner)?;
    let files = collect_files(args, &scanner)?;
    let options = ValidationOptions {
        unknown_keys: args.unknown_keys,
    };

    let json_mode = args.format == OutputFormat::Json;
    let color = !json_mode && io::stdout().is_terminal();
    let mut json_diagnostics = Vec::new();
    let mut error_count = 0;

    for path in &files {
        if args.verbose && !args.quiet {
            eprintln!("Checking {}...", path.display());
        }
        let (source, diagnostics) = check_file(path, &workspace, &options)?;
        error_count += diagnostics.len();

        let path_str = path.display().to_string();
        if json_mode {
            for diag in &diagnostics {
                let (line, column) = byte_offset_to_line_col(&source, diag.span.start);
                let (end_line, end_column) = byte_offset_to_line_col(&source, diag.span.end);
                json_diagnostics.push(JsonDiagnostic {
                    file: path_str.clone(),
                    line,
                    column,
                    end_line,
                    end_column,
                    severity: "error".to_string(),
                    code: diag.code.code().to_string(),
                    message: diag.message.clone(),
                });
            }
        } else if !args.quiet {
            report::report_diagnostics(&diagnostics, &path_str, &source, color, out)?;
        }
    }

    if json_mode {
        let output = JsonOutput {
            diagnostics: json_diagnostics,
            error_count,
            file_count: files.len(),
        };
        writeln!(out, "{}", serde_json::to_string_pretty(&output)?)?;
    } else if !args.quiet {
        if args.verbose {
            writeln!(
                out,
                "\nChecked in {:.2}ms",
                start.elapsed().as_secs_f64() * 1000.0
            )?;
        }
        report::print_summary(error_count, files.len(), out)?;
    }

    Ok(error_count)
}

/// Main entry point for the check command.
pub fn main() -> ExitCode {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(io::stderr)
        .init();

    let mut stdout = io::stdout().lock();
    match run(&args, &mut stdout) {
        Ok(0) => ExitCode::SUCCESS,
        Ok(_) => ExitCode::from(1),
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(2)
        }
    }
}
