//! va-monitor core library.
//!
//! This crate finds VA design system component usages in JS/TS/JSX/Vue
//! sources, evaluates them against a versioned component catalog and WCAG
//! accessibility rules, and aggregates the findings into scan results and
//! compliance reports.
//!
//! High-level modules:
//! - `cli`: CLI argument parsing (binary uses this).
//! - `config`: Discovery and effective configuration resolution.
//! - `catalog`: Catalog loading and version resolution.
//! - `extract`: Component usage extraction from source text.
//! - `rules`: Design system and accessibility rule engines.
//! - `monitor`: Project scans and single-component validation.
//! - `report`: Compliance report construction.
//! - `source`: File listing and reading providers.
//! - `models`: Data models for usages, issues, results and the catalog.
//! - `output`: Human/JSON printers.
//! - `mcp`: JSON-RPC (MCP) server over stdio.
pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod extract;
pub mod mcp;
pub mod models;
pub mod monitor;
pub mod output;
pub mod report;
pub mod rules;
pub mod source;
