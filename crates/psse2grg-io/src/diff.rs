//! Field-level comparison of two RAW cases.

use psse2grg_core::GrgResult;
use serde_json::Value;
use tracing::debug;

use crate::psse::Case;

fn differs(tolerance: f64, a: f64, b: f64) -> bool {
    (a - b).abs() > tolerance
}

fn walk(path: &str, a: &Value, b: &Value, tolerance: f64, found: &mut usize) {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            let (x, y) = (x.as_f64().unwrap_or(f64::NAN), y.as_f64().unwrap_or(f64::NAN));
            if differs(tolerance, x, y) {
                debug!(path, left = x, right = y, "value differs");
                *found += 1;
            }
        }
        (Value::Object(x), Value::Object(y)) => {
            for (key, left) in x {
                let child = format!("{path}.{key}");
                match y.get(key) {
                    Some(right) => walk(&child, left, right, tolerance, found),
                    None => {
                        debug!(path = child, "field missing on the right");
                        *found += 1;
                    }
                }
            }
            for key in y.keys().filter(|k| !x.contains_key(*k)) {
                debug!(path = format!("{path}.{key}"), "field missing on the left");
                *found += 1;
            }
        }
        (Value::Array(x), Value::Array(y)) => {
            for (idx, (left, right)) in x.iter().zip(y).enumerate() {
                walk(&format!("{path}[{idx}]"), left, right, tolerance, found);
            }
            if x.len() != y.len() {
                debug!(path, left = x.len(), right = y.len(), "length differs");
                *found += x.len().abs_diff(y.len());
            }
        }
        (x, y) if x != y => {
            debug!(path, left = %x, right = %y, "value differs");
            *found += 1;
        }
        _ => {}
    }
}

/// Number of fields that differ between two cases. Numbers match when they
/// are within `10^-precision`; every difference is logged at debug level.
pub fn diff_cases(a: &Case, b: &Case, precision: u32) -> GrgResult<usize> {
    let tolerance = 10f64.powi(-(precision as i32));
    let left = serde_json::to_value(a)?;
    let right = serde_json::to_value(b)?;

    let mut found = 0;
    walk("case", &left, &right, tolerance, &mut found);
    Ok(found)
}
