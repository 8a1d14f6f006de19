//! Flat, per-type views over the nested component tree.

use std::collections::{BTreeMap, HashMap};

use super::components::*;
use super::document::Document;

/// Every component of a document, grouped by type and sorted by id.
#[derive(Debug, Default)]
pub struct ComponentsByType<'a> {
    pub substations: Vec<&'a Substation>,
    pub voltage_levels: Vec<&'a VoltageLevel>,
    pub buses: Vec<&'a Bus>,
    pub loads: Vec<&'a Load>,
    pub shunts: Vec<&'a Shunt>,
    pub generators: Vec<&'a Generator>,
    pub synchronous_condensers: Vec<&'a SynchronousCondenser>,
    pub switches: Vec<&'a Switch>,
    pub ac_lines: Vec<&'a AcLine>,
    pub two_winding_transformers: Vec<&'a TwoWindingTransformer>,
    pub three_winding_transformers: Vec<&'a ThreeWindingTransformer>,
}

/// Depth-first walk over a component map, containers before their children.
pub fn visit_components<'a, F>(components: &'a BTreeMap<String, Component>, f: &mut F)
where
    F: FnMut(&'a Component),
{
    for component in components.values() {
        f(component);
        if let Some(children) = component.children() {
            visit_components(children, f);
        }
    }
}

pub fn components_by_type(doc: &Document) -> ComponentsByType<'_> {
    let mut cbt = ComponentsByType::default();

    visit_components(&doc.network.components, &mut |component| match component {
        Component::Substation(c) => cbt.substations.push(c),
        Component::VoltageLevel(c) => cbt.voltage_levels.push(c),
        Component::Bus(c) => cbt.buses.push(c),
        Component::Load(c) => cbt.loads.push(c),
        Component::Shunt(c) => cbt.shunts.push(c),
        Component::Generator(c) => cbt.generators.push(c),
        Component::SynchronousCondenser(c) => cbt.synchronous_condensers.push(c),
        Component::Switch(c) => cbt.switches.push(c),
        Component::AcLine(c) => cbt.ac_lines.push(c),
        Component::TwoWindingTransformer(c) => cbt.two_winding_transformers.push(c),
        Component::ThreeWindingTransformer(c) => cbt.three_winding_transformers.push(c),
    });

    cbt.substations.sort_by(|a, b| a.id.cmp(&b.id));
    cbt.voltage_levels.sort_by(|a, b| a.id.cmp(&b.id));
    cbt.buses.sort_by(|a, b| a.id.cmp(&b.id));
    cbt.loads.sort_by(|a, b| a.id.cmp(&b.id));
    cbt.shunts.sort_by(|a, b| a.id.cmp(&b.id));
    cbt.generators.sort_by(|a, b| a.id.cmp(&b.id));
    cbt.synchronous_condensers.sort_by(|a, b| a.id.cmp(&b.id));
    cbt.switches.sort_by(|a, b| a.id.cmp(&b.id));
    cbt.ac_lines.sort_by(|a, b| a.id.cmp(&b.id));
    cbt.two_winding_transformers.sort_by(|a, b| a.id.cmp(&b.id));
    cbt.three_winding_transformers.sort_by(|a, b| a.id.cmp(&b.id));

    cbt
}

/// Voltage level declaring each voltage point.
pub fn voltage_level_by_voltage_point(doc: &Document) -> HashMap<&str, &VoltageLevel> {
    let mut lookup = HashMap::new();
    visit_components(&doc.network.components, &mut |component| {
        if let Component::VoltageLevel(vl) = component {
            for point in &vl.voltage_points {
                lookup.insert(point.as_str(), vl);
            }
        }
    });
    lookup
}
