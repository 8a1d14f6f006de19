//! Unit wrappers for the quantities that change representation during a
//! translation.
//!
//! RAW data stores powers in MW/Mvar/MVA and angles in degrees, while a GRG
//! document is per-unit on the system base and uses radians. Conversions are
//! funnelled through these newtypes so a degree never ends up where a radian
//! is expected.
//!
//! ```
//! use psse2grg_core::units::{Degrees, Megawatts, SystemBase};
//!
//! let base = SystemBase::new(100.0);
//! assert_eq!(base.to_per_unit(Megawatts(250.0)).value(), 2.5);
//!
//! let angle = Degrees(180.0).to_radians();
//! assert!((angle.value() - std::f64::consts::PI).abs() < 1e-12);
//! ```

use serde::{Deserialize, Serialize};
use std::ops::{Add, Div, Mul, Neg, Sub};

use crate::config::DEFAULT_BASE_MVA;

macro_rules! impl_unit_ops {
    ($type:ty, $unit_name:literal) => {
        impl Add for $type {
            type Output = Self;
            fn add(self, rhs: Self) -> Self::Output {
                Self(self.0 + rhs.0)
            }
        }

        impl Sub for $type {
            type Output = Self;
            fn sub(self, rhs: Self) -> Self::Output {
                Self(self.0 - rhs.0)
            }
        }

        impl Neg for $type {
            type Output = Self;
            fn neg(self) -> Self::Output {
                Self(-self.0)
            }
        }

        impl Mul<f64> for $type {
            type Output = Self;
            fn mul(self, rhs: f64) -> Self::Output {
                Self(self.0 * rhs)
            }
        }

        impl Div<f64> for $type {
            type Output = Self;
            fn div(self, rhs: f64) -> Self::Output {
                Self(self.0 / rhs)
            }
        }

        impl std::fmt::Display for $type {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{:.4} {}", self.0, $unit_name)
            }
        }

        impl $type {
            #[inline]
            pub const fn new(value: f64) -> Self {
                Self(value)
            }

            /// Get the raw numeric value
            #[inline]
            pub const fn value(self) -> f64 {
                self.0
            }
        }
    };
}

/// Power in MW, Mvar or MVA as written in a RAW file.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Megawatts(pub f64);

impl_unit_ops!(Megawatts, "MW");

/// Quantity normalized to the system base.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct PerUnit(pub f64);

impl_unit_ops!(PerUnit, "pu");

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Radians(pub f64);

impl_unit_ops!(Radians, "rad");

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Degrees(pub f64);

impl_unit_ops!(Degrees, "°");

impl Radians {
    #[inline]
    pub fn to_degrees(self) -> Degrees {
        Degrees(self.0.to_degrees())
    }
}

impl Degrees {
    #[inline]
    pub fn to_radians(self) -> Radians {
        Radians(self.0.to_radians())
    }
}

/// System base power (`sbase`) used for every per-unit conversion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SystemBase(f64);

impl SystemBase {
    pub fn new(mva: f64) -> Self {
        Self(mva)
    }

    pub fn mva(self) -> f64 {
        self.0
    }

    #[inline]
    pub fn to_per_unit(self, power: Megawatts) -> PerUnit {
        PerUnit(power.0 / self.0)
    }

    #[inline]
    pub fn to_megawatts(self, value: PerUnit) -> Megawatts {
        Megawatts(value.0 * self.0)
    }
}

impl Default for SystemBase {
    fn default() -> Self {
        Self(DEFAULT_BASE_MVA)
    }
}

/// Round to a fixed number of decimal digits.
///
/// Reverse conversions multiply per-unit values back by the base, which
/// reintroduces floating point noise (`0.1 * 100.0 = 10.000000000000002`).
pub fn round_to(value: f64, precision: u32) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let scale = 10f64.powi(precision as i32);
    (value * scale).round() / scale
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_per_unit_conversion() {
        let base = SystemBase::new(100.0);
        let pu = base.to_per_unit(Megawatts(40.0));
        assert_eq!(pu, PerUnit(0.4));
        assert!((base.to_megawatts(pu).value() - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_angle_conversion() {
        let rad = Degrees(-30.0).to_radians();
        assert!((rad.value() + 0.5235987755982988).abs() < 1e-12);
        assert!((rad.to_degrees().value() + 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(0.1 * 100.0, 4), 10.0);
        assert_eq!(round_to(1.23456, 2), 1.23);
        assert_eq!(round_to(-2.71828, 3), -2.718);
        assert!(round_to(f64::INFINITY, 4).is_infinite());
    }

    #[test]
    fn test_default_base() {
        assert_eq!(SystemBase::default().mva(), 100.0);
    }
}
