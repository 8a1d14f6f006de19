//! Typed GRG network components.
//!
//! Every optional field is an `Option` so absent keys stay absent on
//! re-serialization. Fields prefixed `psse_` and the flattened parameter
//! blocks have no GRG meaning; they carry RAW values the reverse mapper needs
//! to rebuild a record exactly.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::variables::{Admittance, Range, SetVariable, SwitchStatus, ThermalLimit};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Component {
    Substation(Substation),
    VoltageLevel(VoltageLevel),
    Bus(Bus),
    Load(Load),
    Shunt(Shunt),
    Generator(Generator),
    SynchronousCondenser(SynchronousCondenser),
    Switch(Switch),
    AcLine(AcLine),
    TwoWindingTransformer(TwoWindingTransformer),
    ThreeWindingTransformer(ThreeWindingTransformer),
}

impl Component {
    pub fn id(&self) -> &str {
        match self {
            Component::Substation(c) => &c.id,
            Component::VoltageLevel(c) => &c.id,
            Component::Bus(c) => &c.id,
            Component::Load(c) => &c.id,
            Component::Shunt(c) => &c.id,
            Component::Generator(c) => &c.id,
            Component::SynchronousCondenser(c) => &c.id,
            Component::Switch(c) => &c.id,
            Component::AcLine(c) => &c.id,
            Component::TwoWindingTransformer(c) => &c.id,
            Component::ThreeWindingTransformer(c) => &c.id,
        }
    }

    /// The `type` tag as written in JSON.
    pub fn kind(&self) -> &'static str {
        match self {
            Component::Substation(_) => "substation",
            Component::VoltageLevel(_) => "voltage_level",
            Component::Bus(_) => "bus",
            Component::Load(_) => "load",
            Component::Shunt(_) => "shunt",
            Component::Generator(_) => "generator",
            Component::SynchronousCondenser(_) => "synchronous_condenser",
            Component::Switch(_) => "switch",
            Component::AcLine(_) => "ac_line",
            Component::TwoWindingTransformer(_) => "two_winding_transformer",
            Component::ThreeWindingTransformer(_) => "three_winding_transformer",
        }
    }

    /// Voltage points this component connects to.
    pub fn links(&self) -> Vec<&str> {
        match self {
            Component::Substation(_) | Component::VoltageLevel(_) => Vec::new(),
            Component::Bus(c) => vec![c.link.as_str()],
            Component::Load(c) => vec![c.link.as_str()],
            Component::Shunt(c) => vec![c.link.as_str()],
            Component::Generator(c) => vec![c.link.as_str()],
            Component::SynchronousCondenser(c) => vec![c.link.as_str()],
            Component::Switch(c) => vec![c.link_1.as_str(), c.link_2.as_str()],
            Component::AcLine(c) => vec![c.link_1.as_str(), c.link_2.as_str()],
            Component::TwoWindingTransformer(c) => vec![c.link_1.as_str(), c.link_2.as_str()],
            Component::ThreeWindingTransformer(c) => {
                vec![c.link_1.as_str(), c.link_2.as_str(), c.link_3.as_str()]
            }
        }
    }

    /// Nested components of containers, `None` for leaves.
    pub fn children(&self) -> Option<&BTreeMap<String, Component>> {
        match self {
            Component::Substation(c) => Some(&c.substation_components),
            Component::VoltageLevel(c) => Some(&c.voltage_level_components),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Substation {
    pub id: String,
    pub substation_components: BTreeMap<String, Component>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NominalVoltage {
    pub lower_limit: f64,
    pub upper_limit: f64,
    pub nominal_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoltageLevel {
    pub id: String,
    pub voltage: NominalVoltage,
    pub voltage_points: Vec<String>,
    pub voltage_level_components: BTreeMap<String, Component>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VoltageVariables {
    pub magnitude: Range,
    pub angle: Range,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bus {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub psse_name: Option<String>,
    pub link: String,
    pub voltage: VoltageVariables,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub psse_bus_type: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evhi: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evlo: Option<f64>,
}

/// Active/reactive pair in per unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PowerValue {
    pub active: f64,
    pub reactive: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Load {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub psse_id: Option<String>,
    pub link: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,
    pub demand: PowerValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iq: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yp: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yq: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intrpt: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShuntAdmittance {
    pub conductance: Admittance,
    pub susceptance: Admittance,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shunt {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub psse_id: Option<String>,
    pub link: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,
    pub shunt: ShuntAdmittance,
}

/// RAW machine fields with no GRG counterpart.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MachineParameters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vs: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ireg: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zr: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zx: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rt: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xt: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gtap: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rmpct: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wmod: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wpf: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_fractions: Option<Vec<f64>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeneratorOutput {
    pub active: Range,
    pub reactive: Range,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Generator {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub psse_id: Option<String>,
    pub link: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mbase: Option<f64>,
    pub output: GeneratorOutput,
    #[serde(flatten)]
    pub parameters: MachineParameters,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CondenserOutput {
    pub reactive: Range,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynchronousCondenser {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub psse_id: Option<String>,
    pub link: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mbase: Option<f64>,
    pub output: CondenserOutput,
    #[serde(flatten)]
    pub parameters: MachineParameters,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Switch {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,
    pub link_1: String,
    pub link_2: String,
    pub status: SetVariable<SwitchStatus>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Impedance {
    pub resistance: f64,
    pub reactance: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FixedAdmittance {
    pub conductance: f64,
    pub susceptance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcLine {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,
    pub link_1: String,
    pub link_2: String,
    pub thermal_limits_1: Vec<ThermalLimit>,
    pub thermal_limits_2: Vec<ThermalLimit>,
    pub impedance: Impedance,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub circuit_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub psse_line_charge: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shunt_1: Option<FixedAdmittance>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shunt_2: Option<FixedAdmittance>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub met: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub len: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_fractions: Option<Vec<f64>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImpedanceRange {
    pub resistance: Range,
    pub reactance: Range,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdmittanceRange {
    pub conductance: Range,
    pub susceptance: Range,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransformRange {
    pub tap_ratio: Range,
    pub angle_shift: Range,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub tap_ratio: f64,
    pub angle_shift: f64,
}

/// One selectable tap changer position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TapStep {
    pub position: i64,
    pub impedance: Impedance,
    pub shunt: FixedAdmittance,
    pub transform: Transform,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TapChanger {
    pub position: Range,
    pub impedance: ImpedanceRange,
    pub shunt: AdmittanceRange,
    pub transform: TransformRange,
    pub steps: Vec<TapStep>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ntp: Option<i64>,
}

impl TapChanger {
    /// Step selected by a tap position.
    pub fn step_at(&self, position: i64) -> Option<&TapStep> {
        self.steps.iter().find(|s| s.position == position)
    }
}

/// RAW transformer fields with no GRG counterpart.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransformerParameters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cw: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cz: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cm: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nmetr: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vecgrp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cod: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cont: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vma: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vmi: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tab: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cr: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cx: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cnxa: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nomv_1: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nomv_2: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_fractions: Option<Vec<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TwoWindingTransformer {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,
    pub link_1: String,
    pub link_2: String,
    pub thermal_limits_1: Vec<ThermalLimit>,
    pub thermal_limits_2: Vec<ThermalLimit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub circuit_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub psse_name: Option<String>,
    pub tap_changer: TapChanger,
    #[serde(flatten)]
    pub parameters: TransformerParameters,
}

/// Winding of a three winding transformer, seen from the star point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Winding {
    pub tap_ratio: f64,
    pub angle_shift: f64,
    pub nominal_voltage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreeWindingTransformer {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,
    pub link_1: String,
    pub link_2: String,
    pub link_3: String,
    pub thermal_limits_1: Vec<ThermalLimit>,
    pub thermal_limits_2: Vec<ThermalLimit>,
    pub thermal_limits_3: Vec<ThermalLimit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub circuit_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub psse_name: Option<String>,
    pub impedance_12: Impedance,
    pub impedance_23: Impedance,
    pub impedance_31: Impedance,
    pub windings: Vec<Winding>,
    #[serde(flatten)]
    pub parameters: TransformerParameters,
}
