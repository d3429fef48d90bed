//! Server configuration language server.
//!
//! Usage:
//!   srvconf-lsp              # Start LSP server (stdio)
//!   srvconf-lsp --version    # Print version
//!   srvconf-lsp --help       # Print help

use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    // No clap needed for two flags
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--version" || a == "-V") {
        println!("srvconf-lsp {}", srvconf_lsp::VERSION);
        return ExitCode::SUCCESS;
    }

    if args.iter().any(|a| a == "--help" || a == "-h") {
        println!("Server configuration language server");
        println!();
        println!("Usage: srvconf-lsp [OPTIONS]");
        println!();
        println!("Options:");
        println!("  -h, --help     Print help");
        println!("  -V, --version  Print version");
        println!();
        println!("The server communicates via stdio using the Language Server Protocol.");
        println!();
        println!("Initialization options:");
        println!("  unknownKeyDiagnostics  Report keys missing from the schema (default false)");
        println!("  schemaPath             Schema JSON replacing the built-in schema");
        println!();
        println!("Environment variables:");
        println!("  RUST_LOG       Set log level (e.g., RUST_LOG=srvconf_lsp=debug)");
        return ExitCode::SUCCESS;
    }

    // Logs go to stderr; stdout carries the protocol
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("srvconf_lsp=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match srvconf_lsp::start_stdio() {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => {
            tracing::warn!("Exit without shutdown request");
            ExitCode::FAILURE
        }
        Err(e) => {
            tracing::error!("Server error: {}", e);
            ExitCode::FAILURE
        }
    }
}
