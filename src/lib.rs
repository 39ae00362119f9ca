//! falco-rules-tools core library.
//!
//! This crate exposes programmatic APIs for the build and CI tooling around
//! Falco rules files.
//!
//! High-level modules:
//! - `checker`: change classification between two rule sets, and the
//!   container runner for the rules engine.
//! - `registry`: rulesfile registry checks, packaging and index upkeep.
//! - `explorer`: rules file scraping and dependency graph for the explorer index.
//! - `mitre`: MITRE ATT&CK tag checks against a STIX bundle.
//! - `models`: engine descriptions, explorer entities and the registry catalog.
//! - `cli`: CLI argument parsing (binary uses this).
//! - `config`: Discovery and effective configuration resolution.
//! - `output`: Human/JSON printers.
//! - `utils`: Supporting helpers.
//! - `error`: Shared error type.
pub mod checker;
pub mod cli;
pub mod config;
pub mod error;
pub mod explorer;
pub mod mitre;
pub mod models;
pub mod output;
pub mod registry;
pub mod utils;
