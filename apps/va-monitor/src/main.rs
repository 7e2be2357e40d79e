//! va-monitor CLI binary entry point.
//! Resolves configuration, delegates to the library and prints results.

use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use va_monitor::cli::{Cli, Commands};
use va_monitor::config::{self, Effective, Overrides};
use va_monitor::error::Result;
use va_monitor::mcp::McpServer;
use va_monitor::models::{ComponentUsage, Severity};
use va_monitor::monitor::{run_scan, validate_component, ScanContext};
use va_monitor::source::FsSource;
use va_monitor::{catalog, output, report};

fn main() {
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("{} {}", output::error_prefix(), e);
            std::process::exit(e.exit_code());
        }
    }
}

/// Logs go to stderr so JSON on stdout stays clean. `RUST_LOG` wins over
/// the verbosity default.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn setup(overrides: Overrides) -> Result<Effective> {
    let eff = config::resolve_effective(&overrides)?;
    init_tracing(eff.verbose);
    if eff.config_path.is_none() && eff.output != "json" {
        eprintln!(
            "{} No va-monitor.toml found; using defaults.",
            output::note_prefix()
        );
    }
    Ok(eff)
}

fn has_errors<'a>(usages: impl IntoIterator<Item = &'a ComponentUsage>) -> bool {
    usages
        .into_iter()
        .flat_map(|u| &u.issues)
        .any(|i| i.severity == Severity::Error)
}

fn run(cli: Cli) -> Result<i32> {
    let verbose = cli.verbose.then_some(true);
    match cli.cmd {
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(0)
        }
        Commands::Scan {
            path,
            no_accessibility,
            output,
            version_key,
            sequential,
        } => {
            let eff = setup(Overrides {
                project: path.map(PathBuf::from),
                output,
                design_system_version: version_key,
                accessibility: no_accessibility.then_some(false),
                parallel: sequential.then_some(false),
                verbose,
            })?;
            let ctx = ScanContext::from_effective(&eff)?;
            let result = run_scan(&FsSource, &eff.project, &ctx)?;
            output::print_scan(&result, &eff.output)?;
            Ok(if has_errors(&result.components) { 1 } else { 0 })
        }
        Commands::Validate {
            file,
            component,
            output,
        } => {
            let file = PathBuf::from(file);
            let eff = setup(Overrides {
                project: Some(config::file_project(&file)),
                output,
                verbose,
                ..Default::default()
            })?;
            let ctx = ScanContext::from_effective(&eff)?;
            let usage = validate_component(&FsSource, &file, &component, &ctx)?;
            output::print_usage(&usage, &eff.output)?;
            Ok(if has_errors([&usage]) { 1 } else { 0 })
        }
        Commands::Report { path, format } => {
            let eff = setup(Overrides {
                project: path.map(PathBuf::from),
                output: format,
                verbose,
                ..Default::default()
            })?;
            let ctx = ScanContext::from_effective(&eff)?;
            let result = run_scan(&FsSource, &eff.project, &ctx)?;
            let rep = report::build_report(&result, &eff.thresholds);
            output::print_report(&rep, &eff.output)?;
            Ok(0)
        }
        Commands::Serve => {
            // stdout carries the protocol; logs stay on stderr.
            init_tracing(cli.verbose);
            McpServer::new().with_verbose(cli.verbose).run()?;
            Ok(0)
        }
        Commands::Catalog {
            version_key,
            output,
        } => {
            let eff = setup(Overrides {
                output,
                design_system_version: version_key,
                verbose,
                ..Default::default()
            })?;
            let cat = catalog::load(eff.catalog.as_deref(), &eff.design_system_version)?;
            output::print_catalog(&cat, &eff.output)?;
            Ok(0)
        }
    }
}
