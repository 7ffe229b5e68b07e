// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
//   audit-runner <url> [run_id] [--config PATH] [--json] [--per-route] [--verbose]
//
// The URL is declared optional on purpose: a missing URL is reported by
// main.rs with our own message and exit code 1, instead of clap's usage
// error.
//
// Rust concepts:
// - Structs: Custom data types that group related data
// - Derive macros: Automatically generate code for our types
// - Option<T>: An argument that may or may not be present
// =============================================================================

use clap::Parser;
use std::path::PathBuf;

use crate::config::DEFAULT_CONFIG_FILE;

#[derive(Parser, Debug)]
#[command(
    name = "audit-runner",
    version,
    about = "Audit every page of a website and write per-route JSON reports",
    long_about = "audit-runner crawls a website, audits each discovered route and writes the \
                  results as JSON under the reports folder configured in config.yml."
)]
pub struct Cli {
    /// Website URL to audit (e.g., https://example.com)
    pub url: Option<String>,

    /// Optional run identifier; reports go to <reports>/<run_id>/ instead
    /// of directly under the reports folder
    pub run_id: Option<String>,

    /// Path to the YAML configuration file
    #[arg(long, short = 'c', default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Print the run result as JSON on stdout
    #[arg(long)]
    pub json: bool,

    /// Write one result.json per route instead of one per site
    #[arg(long)]
    pub per_route: bool,

    /// Log per-route detail (same as RUST_LOG=audit_runner=debug)
    #[arg(long, short = 'v')]
    pub verbose: bool,
}
