//! Identifier allocation in both translation directions.
//!
//! Forward, every RAW record gets a `<prefix><zero padded number>` id whose
//! width is the minimum that fits the collection. Reverse, GRG ids are turned
//! back into RAW numbers, reusing `source_id` tags when a collection carries
//! them.

use std::collections::{BTreeMap, HashMap};

use crate::diagnostics::{Category, Diagnostics};
use crate::error::{GrgError, GrgResult};

/// Most owners a RAW generator, branch or transformer record can hold.
pub const MAX_OWNERS: usize = 4;

/// Identifier families used in generated documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdKind {
    Bus,
    BusVoltage,
    VoltageLevel,
    Substation,
    Load,
    Shunt,
    Generator,
    SynchronousCondenser,
    Line,
    Transformer,
    Area,
    Zone,
    Owner,
    Switch,
    SwitchVoltage,
}

impl IdKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            IdKind::Bus => "bus_",
            IdKind::BusVoltage => "bus_voltage_",
            IdKind::VoltageLevel => "voltage_level_",
            IdKind::Substation => "substation_",
            IdKind::Load => "load_",
            IdKind::Shunt => "shunt_",
            IdKind::Generator => "gen_",
            IdKind::SynchronousCondenser => "sync_cond_",
            IdKind::Line => "line_",
            IdKind::Transformer => "transformer_",
            IdKind::Area => "area_",
            IdKind::Zone => "zone_",
            IdKind::Owner => "owner_",
            IdKind::Switch => "switch_",
            IdKind::SwitchVoltage => "switch_voltage_",
        }
    }
}

/// Number of digits used to label a collection of `n` elements:
/// `max(1, ceil(log10(n)))`.
///
/// Computed on integers so exact powers of ten do not round up.
pub fn digit_width(n: usize) -> usize {
    let mut width = 0;
    let mut reach: usize = 1;
    while reach < n {
        width += 1;
        reach = reach.saturating_mul(10);
    }
    width.max(1)
}

/// `format_id(IdKind::Bus, 7, 2) == "bus_07"`
pub fn format_id(kind: IdKind, number: usize, width: usize) -> String {
    format!("{}{:0width$}", kind.prefix(), number, width = width)
}

/// 1-based label counter for one identifier family.
#[derive(Debug, Clone)]
pub struct Sequence {
    kind: IdKind,
    width: usize,
    next: usize,
}

impl Sequence {
    /// Counter sized for a collection of `total` elements.
    pub fn new(kind: IdKind, total: usize) -> Self {
        Self {
            kind,
            width: digit_width(total),
            next: 1,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Id for a given 1-based number without advancing the counter.
    pub fn id_for(&self, number: usize) -> String {
        format_id(self.kind, number, self.width)
    }

    pub fn next_id(&mut self) -> String {
        let id = format_id(self.kind, self.next, self.width);
        self.next += 1;
        id
    }
}

/// Generators and synchronous condensers share one counted space: the width
/// comes from the total machine count, labels restart per kind and a single
/// position counter keeps the parse order.
#[derive(Debug, Clone)]
pub struct MachineLabels {
    width: usize,
    next_generator: usize,
    next_condenser: usize,
    position: usize,
}

impl MachineLabels {
    pub fn new(total: usize) -> Self {
        Self {
            width: digit_width(total),
            next_generator: 1,
            next_condenser: 1,
            position: 0,
        }
    }

    /// Returns the label and the 0-based combined position of the machine.
    pub fn assign(&mut self, synchronous_condenser: bool) -> (String, usize) {
        let label = if synchronous_condenser {
            let id = format_id(IdKind::SynchronousCondenser, self.next_condenser, self.width);
            self.next_condenser += 1;
            id
        } else {
            let id = format_id(IdKind::Generator, self.next_generator, self.width);
            self.next_generator += 1;
            id
        };
        let position = self.position;
        self.position += 1;
        (label, position)
    }
}

/// Parse a `source_id` tag back into its RAW number.
pub fn parse_source_id(id: &str, source_id: &str) -> GrgResult<i64> {
    source_id.trim().parse::<i64>().map_err(|_| {
        GrgError::InvalidDocument(format!(
            "component {id} has non-numeric source_id '{source_id}'"
        ))
    })
}

/// Map GRG ids to RAW indices.
///
/// When every element carries a `source_id` the tags are reused verbatim.
/// When none does, elements are numbered from `0` in ascending id order.
/// A partially tagged collection is rejected.
pub fn resolve_indices<'a, I>(collection: &str, items: I) -> GrgResult<BTreeMap<String, i64>>
where
    I: IntoIterator<Item = (&'a str, Option<&'a str>)>,
{
    resolve_from(collection, items.into_iter().collect(), 0)
}

fn resolve_from(
    collection: &str,
    items: Vec<(&str, Option<&str>)>,
    first: i64,
) -> GrgResult<BTreeMap<String, i64>> {
    let tagged = items.iter().filter(|(_, tag)| tag.is_some()).count();
    let mut resolved = BTreeMap::new();

    if tagged == items.len() {
        for (id, tag) in items {
            if let Some(tag) = tag {
                resolved.insert(id.to_string(), parse_source_id(id, tag)?);
            }
        }
    } else if tagged == 0 {
        let mut ids: Vec<&str> = items.iter().map(|(id, _)| *id).collect();
        ids.sort_unstable();
        for (offset, id) in ids.into_iter().enumerate() {
            resolved.insert(id.to_string(), first + offset as i64);
        }
    } else {
        return Err(GrgError::InconsistentIdentity {
            collection: collection.to_string(),
            tagged,
            total: items.len(),
        });
    }

    Ok(resolved)
}

/// Joint resolution of generators and synchronous condensers.
///
/// They came from one RAW table, so either both kinds are tagged or neither
/// is. Untagged generators take `0..g` and condensers continue at `g`.
pub fn resolve_machine_indices<'a>(
    generators: &[(&'a str, Option<&'a str>)],
    condensers: &[(&'a str, Option<&'a str>)],
) -> GrgResult<BTreeMap<String, i64>> {
    let total = generators.len() + condensers.len();
    let tagged = generators
        .iter()
        .chain(condensers.iter())
        .filter(|(_, tag)| tag.is_some())
        .count();

    if tagged != 0 && tagged != total {
        return Err(GrgError::InconsistentIdentity {
            collection: "generator".to_string(),
            tagged,
            total,
        });
    }

    let mut resolved = resolve_from("generator", generators.to_vec(), 0)?;
    resolved.extend(resolve_from(
        "synchronous_condenser",
        condensers.to_vec(),
        generators.len() as i64,
    )?);
    Ok(resolved)
}

/// One group as seen by membership resolution.
#[derive(Debug, Clone, Copy)]
pub struct GroupRef<'a> {
    pub id: &'a str,
    pub source_id: Option<&'a str>,
    pub component_ids: &'a [String],
}

/// RAW numbers of the groups of one kind and the single group each component
/// belongs to.
#[derive(Debug, Clone, Default)]
pub struct Membership {
    pub numbers: BTreeMap<String, i64>,
    pub members: HashMap<String, i64>,
}

/// RAW numbers of the owner groups and the (at most four) owners of each
/// component, in group order.
#[derive(Debug, Clone, Default)]
pub struct OwnerMembership {
    pub numbers: BTreeMap<String, i64>,
    pub members: HashMap<String, Vec<i64>>,
}

fn group_numbers(kind: &str, groups: &[GroupRef<'_>]) -> GrgResult<BTreeMap<String, i64>> {
    resolve_from(
        kind,
        groups.iter().map(|g| (g.id, g.source_id)).collect(),
        1,
    )
}

/// Area or zone membership. The first group listing a component wins.
pub fn resolve_membership(
    kind: &str,
    groups: &[GroupRef<'_>],
    diagnostics: &mut Diagnostics,
) -> GrgResult<Membership> {
    let numbers = group_numbers(kind, groups)?;
    let mut members = HashMap::new();

    for group in groups {
        let number = numbers[group.id];
        for component in group.component_ids {
            match members.get(component) {
                None => {
                    members.insert(component.clone(), number);
                }
                Some(kept) => {
                    diagnostics.add_warning_with_entity(
                        Category::MultipleMembership,
                        format!(
                            "component is in multiple {kind}s, only {kind} {kept} will be used"
                        ),
                        component.clone(),
                    );
                }
            }
        }
    }

    Ok(Membership { numbers, members })
}

/// Owner membership. Up to four owners are kept per component.
pub fn resolve_owners(
    groups: &[GroupRef<'_>],
    diagnostics: &mut Diagnostics,
) -> GrgResult<OwnerMembership> {
    let numbers = group_numbers("owner", groups)?;
    let mut members: HashMap<String, Vec<i64>> = HashMap::new();

    for group in groups {
        let number = numbers[group.id];
        for component in group.component_ids {
            let owners = members.entry(component.clone()).or_default();
            if owners.len() < MAX_OWNERS {
                owners.push(number);
            } else {
                diagnostics.add_warning_with_entity(
                    Category::MultipleMembership,
                    format!("component has more than {MAX_OWNERS} owners, owner {number} dropped"),
                    component.clone(),
                );
            }
        }
    }

    Ok(OwnerMembership { numbers, members })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digit_width() {
        assert_eq!(digit_width(0), 1);
        assert_eq!(digit_width(1), 1);
        assert_eq!(digit_width(9), 1);
        assert_eq!(digit_width(10), 1);
        assert_eq!(digit_width(11), 2);
        assert_eq!(digit_width(100), 2);
        assert_eq!(digit_width(101), 3);
        assert_eq!(digit_width(1000), 3);
    }

    #[test]
    fn test_sequence_padding() {
        let mut seq = Sequence::new(IdKind::Load, 42);
        assert_eq!(seq.next_id(), "load_01");
        assert_eq!(seq.next_id(), "load_02");
        assert_eq!(seq.id_for(42), "load_42");
    }

    #[test]
    fn test_sequence_overflows_width_at_power_of_ten() {
        let seq = Sequence::new(IdKind::Bus, 10);
        assert_eq!(seq.id_for(9), "bus_9");
        assert_eq!(seq.id_for(10), "bus_10");
    }

    #[test]
    fn test_machine_labels_restart_per_kind() {
        let mut labels = MachineLabels::new(12);
        assert_eq!(labels.assign(false), ("gen_01".to_string(), 0));
        assert_eq!(labels.assign(true), ("sync_cond_01".to_string(), 1));
        assert_eq!(labels.assign(false), ("gen_02".to_string(), 2));
    }

    #[test]
    fn test_resolve_indices_reuses_source_ids() {
        let resolved =
            resolve_indices("load", vec![("load_2", Some("7")), ("load_1", Some("3"))]).unwrap();
        assert_eq!(resolved["load_1"], 3);
        assert_eq!(resolved["load_2"], 7);
    }

    #[test]
    fn test_resolve_indices_sorted_when_untagged() {
        let resolved =
            resolve_indices("load", vec![("load_b", None), ("load_a", None), ("load_c", None)])
                .unwrap();
        assert_eq!(resolved["load_a"], 0);
        assert_eq!(resolved["load_b"], 1);
        assert_eq!(resolved["load_c"], 2);
    }

    #[test]
    fn test_resolve_indices_is_idempotent() {
        let items = vec![("line_3", None), ("line_1", None), ("line_2", None)];
        let first = resolve_indices("ac_line", items.clone()).unwrap();
        let second = resolve_indices("ac_line", items).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_resolve_indices_rejects_mixed() {
        let err = resolve_indices("load", vec![("load_1", Some("0")), ("load_2", None)]).unwrap_err();
        assert!(matches!(
            err,
            GrgError::InconsistentIdentity { tagged: 1, total: 2, .. }
        ));
    }

    #[test]
    fn test_resolve_machine_indices_offsets_condensers() {
        let gens = vec![("gen_2", None), ("gen_1", None)];
        let syncs = vec![("sync_cond_1", None)];
        let resolved = resolve_machine_indices(&gens, &syncs).unwrap();
        assert_eq!(resolved["gen_1"], 0);
        assert_eq!(resolved["gen_2"], 1);
        assert_eq!(resolved["sync_cond_1"], 2);
    }

    #[test]
    fn test_resolve_machine_indices_mixed_across_kinds() {
        let gens = vec![("gen_1", Some("0"))];
        let syncs = vec![("sync_cond_1", None)];
        assert!(resolve_machine_indices(&gens, &syncs).is_err());
    }

    #[test]
    fn test_membership_first_wins() {
        let a = vec!["bus_1".to_string(), "bus_2".to_string()];
        let b = vec!["bus_2".to_string()];
        let groups = [
            GroupRef { id: "area_1", source_id: Some("10"), component_ids: &a },
            GroupRef { id: "area_2", source_id: Some("20"), component_ids: &b },
        ];
        let mut diag = Diagnostics::new();
        let membership = resolve_membership("area", &groups, &mut diag).unwrap();

        assert_eq!(membership.members["bus_2"], 10);
        assert_eq!(membership.numbers["area_2"], 20);
        assert_eq!(diag.issues_by_category(Category::MultipleMembership).count(), 1);
    }

    #[test]
    fn test_untagged_groups_numbered_from_one() {
        let a = vec!["bus_1".to_string()];
        let groups = [
            GroupRef { id: "zone_b", source_id: None, component_ids: &a },
            GroupRef { id: "zone_a", source_id: None, component_ids: &[] },
        ];
        let mut diag = Diagnostics::new();
        let membership = resolve_membership("zone", &groups, &mut diag).unwrap();
        assert_eq!(membership.numbers["zone_a"], 1);
        assert_eq!(membership.numbers["zone_b"], 2);
        assert_eq!(membership.members["bus_1"], 2);
    }

    #[test]
    fn test_owner_overflow_warns() {
        let members = vec!["line_1".to_string()];
        let ids: Vec<String> = (1..=5).map(|n| format!("owner_{n}")).collect();
        let groups: Vec<GroupRef<'_>> = ids
            .iter()
            .map(|id| GroupRef { id: id.as_str(), source_id: None, component_ids: &members })
            .collect();

        let mut diag = Diagnostics::new();
        let owners = resolve_owners(&groups, &mut diag).unwrap();
        assert_eq!(owners.members["line_1"], vec![1, 2, 3, 4]);
        assert_eq!(diag.warning_count(), 1);
    }
}
