//! Input format detection by file extension.

use std::path::Path;

use psse2grg_core::{GrgError, GrgResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// PSS/E v33 RAW case
    Raw,
    /// GRG bus-breaker JSON document
    Grg,
}

impl Format {
    pub const ALL: &'static [Format] = &[Format::Raw, Format::Grg];

    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            Format::Raw => &["raw"],
            Format::Grg => &["json"],
        }
    }

    pub fn friendly_name(&self) -> &'static str {
        match self {
            Format::Raw => "PSS/E RAW",
            Format::Grg => "GRG JSON",
        }
    }

    pub fn detect(path: &Path) -> GrgResult<Format> {
        let unrecognized = || GrgError::UnrecognizedFormat(path.display().to_string());
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(unrecognized)?;

        Self::ALL
            .iter()
            .copied()
            .find(|f| f.extensions().iter().any(|e| e.eq_ignore_ascii_case(ext)))
            .ok_or_else(unrecognized)
    }
}
