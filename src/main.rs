// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Load config.yml and create the output folders
// 3. Run the audit against the URL
// 4. Print the result and exit with the proper code (0 = success, 1 = error)
//
// Rust concepts used:
// - async/await: The engine crawls and audits pages concurrently
// - Result<T, E>: For error handling (T = success type, E = error type)
// - anyhow::Context: Adds a human-readable layer on top of typed errors
// =============================================================================

mod cli;
mod config;
mod engine;
mod runner;
mod storage;

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cli::Cli;
use engine::SiteEngineFactory;
use runner::{AuditRunner, RunResult, RunSettings};
use storage::ReportLayout;

#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            // {:#} prints the whole context chain on one line
            eprintln!("Error: {:#}", e);
            1
        }
    };

    std::process::exit(exit_code);
}

// Returns:
//   Ok(0) = audit finished and reports were written
//   Ok(1) = bad invocation (missing URL, unknown flag)
//   Err   = config or run failure, also exit code 1
async fn run() -> Result<i32> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => 1,
            };
            e.print()?;
            return Ok(code);
        }
    };

    init_logging(cli.verbose);

    let Some(url) = cli.url.as_deref() else {
        eprintln!("Error: Please provide a URL.");
        return Ok(1);
    };

    // Config is read once, here, and passed down explicitly
    let config = config::load(&cli.config)
        .await
        .context("could not load configuration")?;
    let base_dir = config::base_dir_of(&cli.config)
        .context("could not determine the project directory")?;
    let paths = config.resolve(&base_dir);

    storage::prepare_output_dirs(&paths)
        .await
        .with_context(|| format!("could not create {}", paths.reports_dir.display()))?;

    info!(
        project = %paths.project_dir.display(),
        temp = %paths.temp_dir.display(),
        reports = %paths.reports_dir.display(),
        artifacts = %paths.artifacts_dir.display(),
        "configuration ready"
    );

    let layout = if cli.per_route {
        ReportLayout::PerRoute
    } else {
        ReportLayout::SiteWide
    };
    let runner = AuditRunner::new(
        &paths,
        RunSettings::from_config(&config, layout),
        SiteEngineFactory,
    );

    if !cli.json {
        println!("🔍 Scanning: {}", url);
    }

    let result = runner.run(url, cli.run_id.as_deref()).await?;
    print_result(&result, cli.json)?;

    Ok(0)
}

// RUST_LOG wins when set; otherwise info, or debug with --verbose.
// Logs go to stderr so --json output on stdout stays clean.
fn init_logging(verbose: bool) {
    let default_directive = if verbose {
        "audit_runner=debug"
    } else {
        "audit_runner=info"
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

// Prints the result either as a summary or JSON
fn print_result(result: &RunResult, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
        return Ok(());
    }

    println!("{:<60} {}", "ROUTE", "REPORT");
    println!("{}", "=".repeat(100));

    for entry in &result.reports {
        // Truncate URL if too long for display
        let url_display = if entry.url.chars().count() > 57 {
            format!("{}...", entry.url.chars().take(57).collect::<String>())
        } else {
            entry.url.clone()
        };
        println!("{:<60} {}", url_display, entry.file.display());
    }

    println!();
    println!("📊 Summary:");
    println!("   📋 Routes scanned: {}", result.scanned_routes);
    println!("   📝 Reports written: {}", result.reports.len());
    println!("   ⏱️  Duration: {}s", result.duration_seconds);

    Ok(())
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why Cli::try_parse() instead of Cli::parse()?
//    - parse() exits with code 2 on bad arguments
//    - This tool promises exit code 1 for any failure, so we catch clap's
//      error, print it ourselves and pick the code
//
// 2. What is `let ... else`?
//    - Pattern-match or bail out: if cli.url is None, the else block runs
//      and must leave the function (here with `return Ok(1)`)
//
// 3. Why anyhow here but thiserror elsewhere?
//    - Modules return typed errors so callers (and tests) can match on them
//    - main only needs to print them, so anyhow wraps everything and
//      .context() adds what we were doing when it failed
// -----------------------------------------------------------------------------
