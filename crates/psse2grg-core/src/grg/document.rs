//! Top level GRG document: network, groups, mappings, market and operation
//! constraints.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::components::Component;
use super::variables::{Range, SwitchStatus};
use crate::error::{GrgError, GrgResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub grg_version: String,
    pub units: String,
    pub network: Network,
    #[serde(default)]
    pub groups: BTreeMap<String, Group>,
    #[serde(default)]
    pub mappings: BTreeMap<String, Mapping>,
    #[serde(default)]
    pub market: Market,
    #[serde(default)]
    pub operation_constraints: BTreeMap<String, Range>,
}

impl Document {
    /// Named mapping, or [`GrgError::MissingMapping`].
    pub fn mapping(&self, name: &str) -> GrgResult<&Mapping> {
        self.mappings
            .get(name)
            .ok_or_else(|| GrgError::MissingMapping(name.to_string()))
    }

    pub fn from_json(text: &str) -> GrgResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json_pretty(&self) -> GrgResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn network_type() -> String {
    "network".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Network {
    #[serde(rename = "type", default = "network_type")]
    pub kind: String,
    pub id: String,
    pub subtype: String,
    pub per_unit: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sbase: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ic: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rev: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xfrrat: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nxfrat: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub basfrq: Option<f64>,
    pub components: BTreeMap<String, Component>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupKind {
    Area,
    Zone,
    Owner,
}

/// Area, zone or owner with the ids of its member components.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    #[serde(rename = "type")]
    pub kind: GroupKind,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    pub component_ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub isw: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdes: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ptol: Option<f64>,
}

impl Group {
    pub fn new(kind: GroupKind, name: impl Into<String>, source_id: i64) -> Self {
        Self {
            kind,
            name: name.into(),
            source_id: Some(source_id.to_string()),
            component_ids: Vec::new(),
            isw: None,
            pdes: None,
            ptol: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VoltageValue {
    pub magnitude: f64,
    pub angle: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PowerAssignment {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reactive: Option<f64>,
}

/// Value stored under a `"<component>/<path>"` key of a mapping.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Assignment {
    Status(SwitchStatus),
    Number(f64),
    Voltage(VoltageValue),
    Power(PowerAssignment),
}

impl Assignment {
    pub fn as_status(&self) -> Option<SwitchStatus> {
        match self {
            Assignment::Status(s) => Some(*s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Assignment::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_voltage(&self) -> Option<VoltageValue> {
        match self {
            Assignment::Voltage(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_power(&self) -> Option<PowerAssignment> {
        match self {
            Assignment::Power(p) => Some(*p),
            _ => None,
        }
    }
}

pub type Mapping = BTreeMap<String, Assignment>;

/// Polynomial cost of one generator's active output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostModel {
    #[serde(rename = "type")]
    pub kind: String,
    pub input: String,
    pub coefficients: Vec<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Market {
    #[serde(default)]
    pub operational_costs: BTreeMap<String, CostModel>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assignment_variants() {
        let mapping: Mapping = serde_json::from_str(
            r#"{
                "switch_1/status": "off",
                "transformer_1/tap_changer/position": 0,
                "bus_1/voltage": {"magnitude": 1.02, "angle": -0.1},
                "gen_1/output": {"active": 0.4, "reactive": 0.1},
                "sync_cond_1/output": {"reactive": 0.2}
            }"#,
        )
        .unwrap();

        assert_eq!(mapping["switch_1/status"].as_status(), Some(SwitchStatus::Off));
        assert_eq!(mapping["transformer_1/tap_changer/position"].as_number(), Some(0.0));
        assert_eq!(mapping["bus_1/voltage"].as_voltage().map(|v| v.magnitude), Some(1.02));
        assert_eq!(mapping["gen_1/output"].as_power().and_then(|p| p.active), Some(0.4));
        let condenser = mapping["sync_cond_1/output"].as_power().unwrap();
        assert_eq!(condenser.active, None);
        assert_eq!(condenser.reactive, Some(0.2));
    }

    #[test]
    fn test_optional_blocks_default_to_empty() {
        let doc = Document::from_json(
            r#"{
                "grg_version": "1.5",
                "units": "si",
                "network": {
                    "type": "network",
                    "id": "empty",
                    "subtype": "bus_breaker",
                    "per_unit": true,
                    "components": {}
                }
            }"#,
        )
        .unwrap();
        assert!(doc.groups.is_empty());
        assert!(doc.market.operational_costs.is_empty());
        assert!(doc.operation_constraints.is_empty());
        assert!(matches!(
            doc.mapping("starting_points"),
            Err(GrgError::MissingMapping(_))
        ));
    }

    #[test]
    fn test_group_serialization() {
        let mut group = Group::new(GroupKind::Area, "NORTH", 3);
        group.component_ids.push("bus_1".into());
        let value = serde_json::to_value(&group).unwrap();
        assert_eq!(value["type"], "area");
        assert_eq!(value["source_id"], "3");
        assert!(value.get("isw").is_none());
    }
}
