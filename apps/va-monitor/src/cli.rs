//! CLI argument parsing via `clap`.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "va-monitor",
    version,
    about = "VA design system component monitor",
    long_about = "va-monitor finds VA design system components in JS/TS/JSX/Vue sources and checks them against the component catalog and WCAG accessibility rules.\n\nConfiguration precedence: CLI > va-monitor.toml > defaults.",
    after_help = "Examples:\n  va-monitor scan ./apps/web\n  va-monitor scan --output json --no-accessibility\n  va-monitor validate src/Form.vue va-text-input\n  va-monitor report ./apps/web --format json\n  va-monitor catalog --version-key v1\n  va-monitor serve",
    arg_required_else_help = true
)]
/// Top-level CLI options and subcommands.
pub struct Cli {
    #[arg(long, global = true, action = clap::ArgAction::SetTrue, help = "Log per-file progress to stderr")]
    pub verbose: bool,
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand)]
/// Supported subcommands for scanning, validating and reporting.
pub enum Commands {
    /// Show version
    #[command(about = "Show version", long_about = "Print the current va-monitor version.")]
    Version,
    /// Scan a project for component usages
    #[command(
        about = "Scan a project",
        long_about = "Extract every design system component usage under PATH and evaluate design system and accessibility rules. Exits 1 when any error-severity issue is found.",
        after_help = "Examples:\n  va-monitor scan\n  va-monitor scan ./apps/web --output json --sequential"
    )]
    Scan {
        #[arg(help = "Project directory (default: current dir)")]
        path: Option<String>,
        #[arg(long, action = clap::ArgAction::SetTrue, help = "Skip accessibility rules")]
        no_accessibility: bool,
        #[arg(long, help = "Output mode: human|json (default: human)")]
        output: Option<String>,
        #[arg(long, help = "Design system version key (default: latest)")]
        version_key: Option<String>,
        #[arg(long, action = clap::ArgAction::SetTrue, help = "Process files one at a time")]
        sequential: bool,
    },
    /// Validate one component usage in one file
    #[command(
        about = "Validate a single component",
        long_about = "Extract FILE and evaluate the first usage of COMPONENT with accessibility rules always on. Exits 1 when the component is not found or has error-severity issues.",
        after_help = "Examples:\n  va-monitor validate src/Form.vue va-text-input\n  va-monitor validate src/App.jsx VaButton --output json"
    )]
    Validate {
        #[arg(help = "Source file to extract")]
        file: String,
        #[arg(help = "Component name, kebab or Pascal case (va-button, VaButton)")]
        component: String,
        #[arg(long, help = "Output mode: human|json (default: human)")]
        output: Option<String>,
    },
    /// Build a compliance report
    #[command(
        about = "Build a compliance report",
        long_about = "Scan PATH and summarize compliance score, issue counts and recommendations.",
        after_help = "Examples:\n  va-monitor report\n  va-monitor report ./apps/web --format json"
    )]
    Report {
        #[arg(help = "Project directory (default: current dir)")]
        path: Option<String>,
        #[arg(long, help = "Report format: human|json (default: human)")]
        format: Option<String>,
    },
    /// Serve the tools over MCP
    #[command(
        about = "Run the MCP server on stdio",
        long_about = "Serve scan_components, validate_component and get_compliance_report as MCP tools: JSON-RPC 2.0, one message per line on stdin/stdout. Logs go to stderr."
    )]
    Serve,
    /// List the component catalog
    #[command(
        about = "List catalog components",
        long_about = "Print the components of one design system version, resolved through its extends chain."
    )]
    Catalog {
        #[arg(long, help = "Design system version key (default: latest)")]
        version_key: Option<String>,
        #[arg(long, help = "Output mode: human|json (default: human)")]
        output: Option<String>,
    },
}
