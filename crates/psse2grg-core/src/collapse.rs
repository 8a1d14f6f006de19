//! Collapse of GRG voltage points back onto flat bus numbers.
//!
//! Points joined by closed switches are one electrical node. Every node that
//! holds a bus point becomes one flat bus; points cut off by an open breaker
//! still belong to the bus on the other side of that breaker.

use std::collections::{HashMap, HashSet};

use petgraph::algo::kosaraju_scc;
use petgraph::graph::{NodeIndex, UnGraph};

use crate::error::{GrgError, GrgResult};
use crate::grg::{components_by_type, visit_components, Document, SwitchStatus};
use crate::ids::parse_source_id;

/// Breaker state keyed by switch id. Switches with no entry are closed.
pub type SwitchAssignment = HashMap<String, SwitchStatus>;

#[derive(Debug, Clone)]
pub struct VoltagePointIndex {
    group_of: HashMap<String, usize>,
    numbers: HashMap<usize, i64>,
    upstream: HashMap<String, String>,
    isolated: HashSet<String>,
    detached: HashSet<String>,
    merged: Vec<Vec<String>>,
}

impl VoltagePointIndex {
    pub fn build(doc: &Document, assignment: &SwitchAssignment) -> GrgResult<Self> {
        let cbt = components_by_type(doc);

        let mut graph: UnGraph<String, ()> = UnGraph::new_undirected();
        let mut nodes: HashMap<String, NodeIndex> = HashMap::new();
        let mut node_for = |graph: &mut UnGraph<String, ()>, point: &str| -> NodeIndex {
            *nodes
                .entry(point.to_string())
                .or_insert_with(|| graph.add_node(point.to_string()))
        };

        for vl in &cbt.voltage_levels {
            for point in &vl.voltage_points {
                node_for(&mut graph, point);
            }
        }
        visit_components(&doc.network.components, &mut |component| {
            for link in component.links() {
                node_for(&mut graph, link);
            }
        });

        let mut upstream = HashMap::new();
        let mut incident: HashMap<&str, Vec<SwitchStatus>> = HashMap::new();
        for switch in &cbt.switches {
            let status = assignment
                .get(&switch.id)
                .copied()
                .unwrap_or(SwitchStatus::On);
            if status.is_on() {
                let a = node_for(&mut graph, &switch.link_1);
                let b = node_for(&mut graph, &switch.link_2);
                graph.add_edge(a, b, ());
            }
            upstream.insert(switch.link_2.clone(), switch.link_1.clone());
            incident.entry(switch.link_1.as_str()).or_default().push(status);
            incident.entry(switch.link_2.as_str()).or_default().push(status);
        }

        let mut group_of = HashMap::new();
        for (group, members) in kosaraju_scc(&graph).into_iter().enumerate() {
            for node in members {
                group_of.insert(graph[node].clone(), group);
            }
        }

        // buses are already sorted by id
        let mut numbers: HashMap<usize, i64> = HashMap::new();
        let mut members: HashMap<usize, Vec<String>> = HashMap::new();
        let mut order: Vec<usize> = Vec::new();
        for bus in &cbt.buses {
            let group = *group_of.get(&bus.link).ok_or_else(|| {
                GrgError::InvalidDocument(format!("bus {} links to no voltage point", bus.id))
            })?;
            if !numbers.contains_key(&group) {
                numbers.insert(group, order.len() as i64 + 1);
                order.push(group);
            }
            members.entry(group).or_default().push(bus.id.clone());
        }

        if !cbt.buses.is_empty() && cbt.buses.iter().all(|b| b.source_id.is_some()) {
            let mut renumbered: HashMap<usize, i64> = HashMap::new();
            for bus in &cbt.buses {
                if let (Some(tag), Some(group)) = (&bus.source_id, group_of.get(&bus.link)) {
                    if !renumbered.contains_key(group) {
                        renumbered.insert(*group, parse_source_id(&bus.id, tag)?);
                    }
                }
            }
            numbers = renumbered;
        }

        let isolated = cbt
            .buses
            .iter()
            .filter(|bus| {
                incident
                    .get(bus.link.as_str())
                    .map(|s| !s.is_empty() && s.iter().all(|st| !st.is_on()))
                    .unwrap_or(false)
            })
            .map(|bus| bus.link.clone())
            .collect();

        let detached = cbt
            .buses
            .iter()
            .filter(|bus| !incident.contains_key(bus.link.as_str()))
            .map(|bus| bus.link.clone())
            .collect();

        let merged = order
            .iter()
            .filter_map(|g| members.remove(g))
            .filter(|m| m.len() > 1)
            .collect();

        Ok(Self {
            group_of,
            numbers,
            upstream,
            isolated,
            detached,
            merged,
        })
    }

    /// Flat bus number a voltage point belongs to.
    pub fn bus_number(&self, point: &str) -> GrgResult<i64> {
        let mut current = point;
        let mut seen = HashSet::new();
        loop {
            if let Some(number) = self
                .group_of
                .get(current)
                .and_then(|g| self.numbers.get(g))
            {
                return Ok(*number);
            }
            if !seen.insert(current) {
                break;
            }
            match self.upstream.get(current) {
                Some(next) => current = next.as_str(),
                None => break,
            }
        }
        Err(GrgError::TopologyInvariant(format!(
            "voltage point {point} does not reach any bus"
        )))
    }

    /// True when the point is electrically connected to a bus.
    pub fn is_active(&self, point: &str) -> bool {
        self.group_of
            .get(point)
            .map(|g| self.numbers.contains_key(g))
            .unwrap_or(false)
    }

    /// True for a bus point whose breakers are all open.
    pub fn is_isolated(&self, point: &str) -> bool {
        self.isolated.contains(point)
    }

    /// True for a bus point with no switch attached at all.
    pub fn is_detached(&self, point: &str) -> bool {
        self.detached.contains(point)
    }

    /// Bus ids of every flat bus built from more than one GRG bus.
    pub fn merged_buses(&self) -> &[Vec<String>] {
        &self.merged
    }
}

/// Extract switch states from a breaker mapping (`"<switch>/status"` keys).
pub fn switch_assignment(mapping: &crate::grg::Mapping) -> SwitchAssignment {
    mapping
        .iter()
        .filter_map(|(key, value)| {
            let switch = key.strip_suffix("/status")?;
            if switch.contains('/') {
                return None;
            }
            Some((switch.to_string(), value.as_status()?))
        })
        .collect()
}
