//! Translation options and process-wide defaults.

use serde::{Deserialize, Serialize};

/// System base power assumed when a document does not carry `sbase`.
pub const DEFAULT_BASE_MVA: f64 = 100.0;

/// Decimal digits kept when converting per-unit values back to RAW units.
pub const DEFAULT_FLOAT_PRECISION: u32 = 4;

/// Angle difference band emitted for every ac line (30 degrees).
pub const DEFAULT_ANGLE_DIFFERENCE: f64 = 0.5236;

/// GRG schema version written into every document.
pub const GRG_VERSION: &str = "1.5";

/// Unit system tag written into every document.
pub const GRG_UNITS: &str = "si";

pub const DEFAULT_STARTING_POINT_MAPPING: &str = "starting_points";
pub const DEFAULT_SWITCH_ASSIGNMENT_MAPPING: &str = "breakers_assignment";

/// Knobs shared by both translation directions.
///
/// Every field has a default so a partial TOML table is accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationOptions {
    /// Mapping read for voltages, outputs and tap positions
    #[serde(default = "default_starting_point_mapping")]
    pub starting_point_mapping: String,
    /// Mapping read for breaker on/off state
    #[serde(default = "default_switch_assignment_mapping")]
    pub switch_assignment_mapping: String,
    /// Drop optional component subtype tags on RAW -> GRG
    #[serde(default)]
    pub omit_subtypes: bool,
    /// Skip structural validation of generated documents
    #[serde(default)]
    pub skip_validation: bool,
    #[serde(default = "default_float_precision")]
    pub float_precision: u32,
}

impl Default for TranslationOptions {
    fn default() -> Self {
        Self {
            starting_point_mapping: default_starting_point_mapping(),
            switch_assignment_mapping: default_switch_assignment_mapping(),
            omit_subtypes: false,
            skip_validation: false,
            float_precision: default_float_precision(),
        }
    }
}

fn default_starting_point_mapping() -> String {
    DEFAULT_STARTING_POINT_MAPPING.to_string()
}

fn default_switch_assignment_mapping() -> String {
    DEFAULT_SWITCH_ASSIGNMENT_MAPPING.to_string()
}

fn default_float_precision() -> u32 {
    DEFAULT_FLOAT_PRECISION
}

impl TranslationOptions {
    /// Absolute tolerance matching `float_precision` decimal digits.
    pub fn tolerance(&self) -> f64 {
        10f64.powi(-(self.float_precision as i32))
    }
}
