//! Structural checks on GRG documents.
//!
//! This does not judge electrical feasibility. It checks that ids are unique,
//! that every reference (links, group members, mapping keys) resolves, and
//! that components sit in the container kinds that may hold them.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::diagnostics::{Category, Diagnostics};
use crate::grg::{visit_components, Component, Document, BUS_BREAKER};

fn allowed_in_network(c: &Component) -> bool {
    matches!(
        c,
        Component::Substation(_)
            | Component::AcLine(_)
            | Component::TwoWindingTransformer(_)
            | Component::ThreeWindingTransformer(_)
    )
}

fn allowed_in_substation(c: &Component) -> bool {
    matches!(
        c,
        Component::VoltageLevel(_)
            | Component::TwoWindingTransformer(_)
            | Component::ThreeWindingTransformer(_)
    )
}

fn allowed_in_voltage_level(c: &Component) -> bool {
    matches!(
        c,
        Component::Bus(_)
            | Component::Load(_)
            | Component::Shunt(_)
            | Component::Generator(_)
            | Component::SynchronousCondenser(_)
            | Component::Switch(_)
    )
}

fn check_placement(
    components: &BTreeMap<String, Component>,
    container: &str,
    allowed: fn(&Component) -> bool,
    diag: &mut Diagnostics,
) {
    for (key, component) in components {
        if key != component.id() {
            diag.add_error_with_entity(
                Category::Structure,
                format!("stored under key '{key}' but has id '{}'", component.id()),
                component.id(),
            );
        }
        if !allowed(component) {
            diag.add_error_with_entity(
                Category::Structure,
                format!("{} is not allowed inside {container}", component.kind()),
                component.id(),
            );
        }
        match component {
            Component::Substation(s) => check_placement(
                &s.substation_components,
                "a substation",
                allowed_in_substation,
                diag,
            ),
            Component::VoltageLevel(vl) => check_placement(
                &vl.voltage_level_components,
                "a voltage level",
                allowed_in_voltage_level,
                diag,
            ),
            _ => {}
        }
    }
}

/// Collect every structural problem of `doc`.
pub fn validate_document(doc: &Document) -> Diagnostics {
    let mut diag = Diagnostics::new();

    if doc.network.subtype != BUS_BREAKER {
        diag.add_error_with_entity(
            Category::Structure,
            format!("unsupported network subtype '{}'", doc.network.subtype),
            doc.network.id.clone(),
        );
    }

    check_placement(&doc.network.components, "the network", allowed_in_network, &mut diag);

    let mut ids: HashMap<&str, &'static str> = HashMap::new();
    let mut points: HashSet<&str> = HashSet::new();
    let mut components: Vec<&Component> = Vec::new();

    visit_components(&doc.network.components, &mut |component| {
        components.push(component);
    });

    for component in &components {
        if ids.insert(component.id(), component.kind()).is_some() {
            diag.add_error_with_entity(Category::Structure, "duplicate component id", component.id());
        }
        if let Component::VoltageLevel(vl) = component {
            for point in &vl.voltage_points {
                if !points.insert(point.as_str()) {
                    diag.add_error_with_entity(
                        Category::Structure,
                        format!("voltage point {point} declared more than once"),
                        vl.id.clone(),
                    );
                }
            }
        }
    }

    for component in &components {
        for link in component.links() {
            if !points.contains(link) {
                diag.add_error_with_entity(
                    Category::Structure,
                    format!("link to undeclared voltage point {link}"),
                    component.id(),
                );
            }
        }
        if let Component::Switch(sw) = component {
            if sw.link_1 == sw.link_2 {
                diag.add_error_with_entity(Category::Structure, "switch links a point to itself", &sw.id);
            }
            if !sw.status.is_binary() {
                diag.add_error_with_entity(Category::Structure, "switch status domain is not {off, on}", &sw.id);
            }
        }
    }

    for (group_id, group) in &doc.groups {
        for member in &group.component_ids {
            if !ids.contains_key(member.as_str()) {
                diag.add_error_with_entity(
                    Category::Structure,
                    format!("group member {member} does not exist"),
                    group_id.clone(),
                );
            }
        }
    }

    let owner_of = |key: &str| key.split('/').next().unwrap_or_default().to_string();

    for (name, mapping) in &doc.mappings {
        for key in mapping.keys() {
            if !ids.contains_key(owner_of(key).as_str()) {
                diag.add_error_with_entity(
                    Category::Structure,
                    format!("mapping key {key} names no component"),
                    name.clone(),
                );
            }
        }
    }

    for (gen_id, cost) in &doc.market.operational_costs {
        if ids.get(gen_id.as_str()) != Some(&"generator") {
            diag.add_error_with_entity(Category::Structure, "cost model for a non-generator", gen_id.clone());
        }
        if owner_of(&cost.input) != *gen_id {
            diag.add_error_with_entity(
                Category::Structure,
                format!("cost input {} does not belong to the generator", cost.input),
                gen_id.clone(),
            );
        }
    }

    for key in doc.operation_constraints.keys() {
        if !ids.contains_key(owner_of(key).as_str()) {
            diag.add_error_with_entity(Category::Structure, "operation constraint names no component", key.clone());
        }
    }

    diag
}

pub fn is_valid(doc: &Document) -> bool {
    !validate_document(doc).has_errors()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal(extra_vl_components: serde_json::Value, groups: serde_json::Value) -> Document {
        let mut vl_components = serde_json::json!({
            "bus_1": {"type": "bus", "id": "bus_1", "link": "bus_voltage_1",
                "voltage": {"magnitude": {"lb": 0.9, "ub": 1.1}, "angle": {"lb": "-Inf", "ub": "Inf"}}},
            "switch_1": {"type": "switch", "id": "switch_1", "subtype": "breaker",
                "link_1": "bus_voltage_1", "link_2": "switch_voltage_1", "status": {"var": ["off", "on"]}},
            "load_1": {"type": "load", "id": "load_1", "link": "switch_voltage_1",
                "demand": {"active": 0.5, "reactive": 0.1}}
        });
        if let (Some(target), Some(extra)) = (vl_components.as_object_mut(), extra_vl_components.as_object()) {
            for (k, v) in extra {
                target.insert(k.clone(), v.clone());
            }
        }

        serde_json::from_value(serde_json::json!({
            "grg_version": "1.5",
            "units": "si",
            "network": {
                "id": "t",
                "subtype": "bus_breaker",
                "per_unit": true,
                "components": {
                    "substation_1": {"type": "substation", "id": "substation_1", "substation_components": {
                        "voltage_level_1": {"type": "voltage_level", "id": "voltage_level_1",
                            "voltage": {"lower_limit": 0.9, "upper_limit": 1.1, "nominal_value": 13.8},
                            "voltage_points": ["bus_voltage_1", "switch_voltage_1"],
                            "voltage_level_components": vl_components}
                    }}
                }
            },
            "groups": groups,
            "mappings": {"starting_points": {"load_1/demand": {"active": 0.5, "reactive": 0.1}}}
        }))
        .unwrap()
    }

    #[test]
    fn test_valid_document() {
        let doc = minimal(serde_json::json!({}), serde_json::json!({}));
        let diag = validate_document(&doc);
        assert!(!diag.has_errors(), "{diag}");
        assert!(is_valid(&doc));
    }

    #[test]
    fn test_dangling_link() {
        let doc = minimal(
            serde_json::json!({
                "load_2": {"type": "load", "id": "load_2", "link": "nowhere",
                    "demand": {"active": 0.0, "reactive": 0.0}}
            }),
            serde_json::json!({}),
        );
        let diag = validate_document(&doc);
        assert_eq!(diag.error_count(), 1);
        assert!(diag.issues[0].message.contains("nowhere"));
    }

    #[test]
    fn test_missing_group_member() {
        let doc = minimal(
            serde_json::json!({}),
            serde_json::json!({
                "area_1": {"type": "area", "name": "A", "component_ids": ["bus_1", "bus_9"]}
            }),
        );
        assert!(!is_valid(&doc));
    }

    #[test]
    fn test_misplaced_component() {
        let doc = minimal(
            serde_json::json!({
                "voltage_level_2": {"type": "voltage_level", "id": "voltage_level_2",
                    "voltage": {"lower_limit": 0.9, "upper_limit": 1.1, "nominal_value": 13.8},
                    "voltage_points": [], "voltage_level_components": {}}
            }),
            serde_json::json!({}),
        );
        let diag = validate_document(&doc);
        assert!(diag
            .errors()
            .any(|e| e.message.contains("not allowed inside a voltage level")));
    }
}
