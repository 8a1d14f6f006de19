//! # psse2grg-io: PSS/E RAW <-> GRG translation
//!
//! Reads and writes PSS/E v33 RAW cases and maps them to and from GRG
//! bus-breaker documents using the engine in `psse2grg-core`.
//!
//! ## Quick Start: RAW to GRG
//!
//! ```rust,no_run
//! use psse2grg_core::TranslationOptions;
//! use psse2grg_io::raw_file_to_grg;
//!
//! fn main() -> anyhow::Result<()> {
//!     let result = raw_file_to_grg("case5.raw", &TranslationOptions::default())?;
//!     println!("{}", serde_json::to_string_pretty(&result.value)?);
//!     Ok(())
//! }
//! ```
//!
//! ## Supported Formats
//!
//! | Format | File Extensions | Notes |
//! |--------|-----------------|-------|
//! | PSS/E RAW | `.raw` | Revision 33, bus through switched shunt data |
//! | GRG JSON | `.json` | Bus-breaker subtype, per-unit |
//!
//! ## Module Overview
//!
//! - [`psse`] - RAW record model, tokenizer, section parser and writer
//! - [`forward`] - RAW case to GRG document
//! - [`reverse`] - GRG document back to a RAW case
//! - [`diff`] - field-level comparison of two cases
//! - [`roundtrip`] - RAW -> GRG -> RAW self test
//! - [`format`] - format detection by extension
//!
//! ## Error Handling
//!
//! Translation functions return `GrgResult`; the file entry points below
//! wrap them in `anyhow` with the offending path as context. Warnings are
//! returned alongside the value and also logged through `tracing`.

pub mod diff;
pub mod format;
pub mod forward;
pub mod psse;
pub mod reverse;
pub mod roundtrip;

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use psse2grg_core::{Diagnostics, Document, Translation, TranslationOptions};
use tracing::{info, warn};

pub use diff::diff_cases;
pub use format::Format;
pub use forward::to_grg;
pub use psse::{parse_raw, Case};
pub use reverse::build_case;
pub use roundtrip::{round_trip, RoundTripReport};

/// Network id used for a file: its stem, or `network` when it has none.
pub fn network_id_for(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("network")
        .to_string()
}

pub fn log_diagnostics(diagnostics: &Diagnostics) {
    for issue in &diagnostics.issues {
        warn!("{issue}");
    }
}

pub fn read_raw(path: impl AsRef<Path>) -> Result<Case> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading RAW file '{}'", path.display()))?;
    let case = parse_raw(&text).with_context(|| format!("parsing '{}'", path.display()))?;
    info!(
        buses = case.buses.len(),
        branches = case.branches.len(),
        "loaded {}",
        path.display()
    );
    Ok(case)
}

pub fn read_grg(path: impl AsRef<Path>) -> Result<Document> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading GRG file '{}'", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("parsing GRG document '{}'", path.display()))
}

pub fn raw_file_to_grg(
    path: impl AsRef<Path>,
    options: &TranslationOptions,
) -> Result<Translation<Document>> {
    let path = path.as_ref();
    let case = read_raw(path)?;
    let out = to_grg(&case, &network_id_for(path), options)
        .with_context(|| format!("translating '{}' to GRG", path.display()))?;
    log_diagnostics(&out.diagnostics);
    Ok(out)
}

pub fn grg_file_to_raw(
    path: impl AsRef<Path>,
    options: &TranslationOptions,
) -> Result<Translation<Case>> {
    let path = path.as_ref();
    let doc = read_grg(path)?;
    let out = build_case(&doc, options)
        .with_context(|| format!("translating '{}' to RAW", path.display()))?;
    log_diagnostics(&out.diagnostics);
    Ok(out)
}

pub fn round_trip_file(
    path: impl AsRef<Path>,
    options: &TranslationOptions,
) -> Result<RoundTripReport> {
    let path = path.as_ref();
    let case = read_raw(path)?;
    let report = round_trip(&case, &network_id_for(path), options)
        .with_context(|| format!("round trip of '{}'", path.display()))?;
    log_diagnostics(&report.diagnostics);
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_id_for() {
        assert_eq!(network_id_for(Path::new("data/case5.raw")), "case5");
        assert_eq!(network_id_for(Path::new("/")), "network");
    }
}
