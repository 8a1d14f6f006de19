//! Variable encodings used inside GRG documents.

use serde::de::{self, Deserializer, Visitor};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A number that may be infinite. Infinities are written as `"Inf"` and
/// `"-Inf"` since JSON has no literal for them.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Bound(pub f64);

impl Bound {
    pub const INF: Bound = Bound(f64::INFINITY);
    pub const NEG_INF: Bound = Bound(f64::NEG_INFINITY);

    pub fn value(self) -> f64 {
        self.0
    }
}

impl From<f64> for Bound {
    fn from(value: f64) -> Self {
        Bound(value)
    }
}

impl Serialize for Bound {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0 == f64::INFINITY {
            serializer.serialize_str("Inf")
        } else if self.0 == f64::NEG_INFINITY {
            serializer.serialize_str("-Inf")
        } else {
            serializer.serialize_f64(self.0)
        }
    }
}

struct BoundVisitor;

impl<'de> Visitor<'de> for BoundVisitor {
    type Value = Bound;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a number or one of \"Inf\", \"-Inf\"")
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Bound, E> {
        Ok(Bound(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Bound, E> {
        Ok(Bound(v as f64))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Bound, E> {
        Ok(Bound(v as f64))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Bound, E> {
        match v.trim().to_ascii_lowercase().as_str() {
            "inf" | "+inf" | "infinity" => Ok(Bound::INF),
            "-inf" | "-infinity" => Ok(Bound::NEG_INF),
            other => other
                .parse::<f64>()
                .map(Bound)
                .map_err(|_| E::invalid_value(de::Unexpected::Str(v), &self)),
        }
    }
}

impl<'de> Deserialize<'de> for Bound {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(BoundVisitor)
    }
}

/// Continuous variable domain `[lb, ub]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Range {
    pub lb: Bound,
    pub ub: Bound,
}

impl Range {
    pub fn new(lb: f64, ub: f64) -> Self {
        Self {
            lb: Bound(lb),
            ub: Bound(ub),
        }
    }

    /// A range holding exactly one value.
    pub fn fixed(value: f64) -> Self {
        Self::new(value, value)
    }

    pub fn unbounded() -> Self {
        Self {
            lb: Bound::NEG_INF,
            ub: Bound::INF,
        }
    }

    pub fn min(&self) -> f64 {
        self.lb.0
    }

    pub fn max(&self) -> f64 {
        self.ub.0
    }
}

/// Discrete variable domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetVariable<T> {
    pub var: Vec<T>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwitchStatus {
    Off,
    On,
}

impl SwitchStatus {
    pub fn is_on(self) -> bool {
        self == SwitchStatus::On
    }

    /// RAW status flag (`1` in service).
    pub fn from_flag(flag: i64) -> Self {
        if flag == 1 {
            SwitchStatus::On
        } else {
            SwitchStatus::Off
        }
    }

    pub fn as_flag(self) -> i64 {
        match self {
            SwitchStatus::On => 1,
            SwitchStatus::Off => 0,
        }
    }
}

impl SetVariable<SwitchStatus> {
    /// The `{off, on}` domain of every breaker.
    pub fn binary() -> Self {
        Self {
            var: vec![SwitchStatus::Off, SwitchStatus::On],
        }
    }

    pub fn is_binary(&self) -> bool {
        self.var.len() == 2
            && self.var.contains(&SwitchStatus::Off)
            && self.var.contains(&SwitchStatus::On)
    }
}

/// Shunt admittance component: a constant, or a set of selectable values
/// for switched shunts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Admittance {
    Fixed(f64),
    Set(SetVariable<f64>),
}

impl Admittance {
    pub fn fixed(&self) -> Option<f64> {
        match self {
            Admittance::Fixed(v) => Some(*v),
            Admittance::Set(_) => None,
        }
    }
}

/// Thermal band report flag. Only `off` is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Report {
    Off,
    On,
}

/// One thermal rating tier. `duration` is in seconds, `Inf` for the
/// continuous rating.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThermalLimit {
    pub duration: Bound,
    pub min: f64,
    pub max: f64,
    pub report: Report,
}

/// Duration of the emergency tier built from `rateb`.
pub const LONG_TERM_DURATION: f64 = 14400.0;
/// Duration of the short-term tier built from `ratec`.
pub const SHORT_TERM_DURATION: f64 = 900.0;

impl ThermalLimit {
    fn tier(duration: Bound, max: f64) -> Self {
        Self {
            duration,
            min: 0.0,
            max,
            report: Report::Off,
        }
    }
}

/// Thermal bands from the three RAW ratings (already per unit).
///
/// A longer-duration tier is kept only when strictly larger than the tiers
/// before it, zero ratings never produce a tier.
pub fn thermal_limits(rate_a: f64, rate_b: f64, rate_c: f64) -> Vec<ThermalLimit> {
    let mut limits = vec![ThermalLimit::tier(Bound::INF, rate_a)];

    if rate_b != 0.0 && rate_b > rate_a {
        limits.push(ThermalLimit::tier(Bound(LONG_TERM_DURATION), rate_b));
    }
    if rate_c != 0.0 && rate_c > rate_a && (limits.len() == 1 || rate_c > rate_b) {
        limits.push(ThermalLimit::tier(Bound(SHORT_TERM_DURATION), rate_c));
    }

    limits
}

/// Inverse of [`thermal_limits`]: `(rate_a, rate_b, rate_c)`, missing tiers
/// read as `0`.
pub fn thermal_rates(limits: &[ThermalLimit]) -> (f64, f64, f64) {
    let pick = |duration: f64| {
        limits
            .iter()
            .find(|l| l.duration.0 == duration)
            .map(|l| l.max)
            .unwrap_or(0.0)
    };
    (
        pick(f64::INFINITY),
        pick(LONG_TERM_DURATION),
        pick(SHORT_TERM_DURATION),
    )
}
