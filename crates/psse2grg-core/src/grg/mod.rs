//! GRG bus-breaker network documents.
//!
//! A network holds substations, each holding voltage levels, each holding
//! buses, loads, shunts, generators and switches. Components connect to named
//! voltage points rather than to buses. State lives apart from structure in
//! named mappings (`starting_points`, `breakers_assignment`).

pub mod by_type;
pub mod components;
pub mod document;
pub mod variables;

pub use by_type::{components_by_type, visit_components, voltage_level_by_voltage_point, ComponentsByType};
pub use components::*;
pub use document::{
    Assignment, CostModel, Document, Group, GroupKind, Mapping, Market, Network, PowerAssignment,
    VoltageValue,
};
pub use variables::{
    thermal_limits, thermal_rates, Admittance, Bound, Range, Report, SetVariable, SwitchStatus,
    ThermalLimit,
};

/// Network subtype produced and accepted by this crate.
pub const BUS_BREAKER: &str = "bus_breaker";
