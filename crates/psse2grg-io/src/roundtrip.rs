//! RAW -> GRG -> RAW self test.

use psse2grg_core::{Diagnostics, GrgResult, TranslationOptions};
use tracing::info;

use crate::diff::diff_cases;
use crate::forward::to_grg;
use crate::psse::Case;
use crate::reverse::build_case;

#[derive(Debug, Clone)]
pub struct RoundTripReport {
    pub original: Case,
    pub rebuilt: Case,
    /// Fields that differ beyond the rounding tolerance.
    pub diff_count: usize,
    pub identical: bool,
    /// Warnings from both directions.
    pub diagnostics: Diagnostics,
}

/// Translate `case` to GRG and back, then compare.
///
/// Translation failures propagate; a mismatch does not, it is reported.
pub fn round_trip(
    case: &Case,
    network_id: &str,
    options: &TranslationOptions,
) -> GrgResult<RoundTripReport> {
    let forward = to_grg(case, network_id, options)?;
    let mut diagnostics = forward.diagnostics;
    let reverse = build_case(&forward.value, options)?;
    diagnostics.merge(reverse.diagnostics);

    let diff_count = diff_cases(case, &reverse.value, options.float_precision)?;
    info!(network_id, diff_count, "round trip finished");

    Ok(RoundTripReport {
        original: case.clone(),
        rebuilt: reverse.value,
        diff_count,
        identical: diff_count == 0,
        diagnostics,
    })
}
