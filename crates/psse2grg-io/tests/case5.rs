//! End-to-end translation of the five bus fixture.

use std::collections::HashSet;
use std::path::PathBuf;

use psse2grg_core::grg::{components_by_type, Component, Document, SwitchStatus};
use psse2grg_core::{is_valid, TranslationOptions};
use psse2grg_io::{
    build_case, grg_file_to_raw, parse_raw, raw_file_to_grg, round_trip, to_grg, Case,
};
use tempfile::tempdir;

fn repo_path(relative: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .join(relative)
}

fn case5() -> Case {
    let text = std::fs::read_to_string(repo_path("test_data/psse/case5.raw")).unwrap();
    parse_raw(&text).unwrap()
}

fn forward(case: &Case) -> Document {
    to_grg(case, "case5", &TranslationOptions::default())
        .unwrap()
        .value
}

#[test]
fn test_parse_case5() {
    let case = case5();
    assert_eq!(case.buses.len(), 5);
    assert_eq!(case.loads.len(), 3);
    assert_eq!(case.fixed_shunts.len(), 1);
    assert_eq!(case.generators.len(), 5);
    assert_eq!(case.branches.len(), 6);
    assert_eq!(case.transformers.len(), 1);
    assert_eq!(case.record1, "PJM 5 BUS SYSTEM");
}

#[test]
fn test_forward_counts() {
    let doc = forward(&case5());
    assert!(is_valid(&doc));

    let cbt = components_by_type(&doc);
    assert_eq!(cbt.buses.len(), 5);
    assert_eq!(cbt.ac_lines.len() + cbt.two_winding_transformers.len(), 7);
    assert_eq!(cbt.loads.len(), 3);
    assert_eq!(cbt.shunts.len(), 1);
}

#[test]
fn test_reverse_counts() {
    let doc = forward(&case5());
    let case = build_case(&doc, &TranslationOptions::default()).unwrap().value;
    assert_eq!(case.buses.len(), 5);
    assert_eq!(case.branches.len(), 6);
    assert_eq!(case.generators.len(), 5);
    assert_eq!(case.transformers.len(), 1);
}

#[test]
fn test_round_trip_is_identical() {
    let case = case5();
    let report = round_trip(&case, "case5", &TranslationOptions::default()).unwrap();
    assert_eq!(report.diff_count, 0);
    assert!(report.identical);
    assert_eq!(report.rebuilt.buses, case.buses);
    assert_eq!(report.rebuilt.generators, case.generators);
    assert_eq!(report.rebuilt.transformers, case.transformers);
}

#[test]
fn test_substations_follow_transformers() {
    let doc = forward(&case5());
    let cbt = components_by_type(&doc);

    // buses 4 and 5 share the transformer substation
    assert_eq!(cbt.substations.len(), 4);

    let mut seen = HashSet::new();
    for sub in &cbt.substations {
        let points: HashSet<&str> = sub
            .substation_components
            .values()
            .filter_map(|c| match c {
                Component::VoltageLevel(vl) => Some(vl.voltage_points.iter()),
                _ => None,
            })
            .flatten()
            .map(String::as_str)
            .collect();
        for point in &points {
            assert!(seen.insert(point.to_string()), "{point} in two substations");
        }
        for component in sub.substation_components.values() {
            if let Component::TwoWindingTransformer(t) = component {
                assert!(points.contains(t.link_1.as_str()));
                assert!(points.contains(t.link_2.as_str()));
            }
        }
    }
}

#[test]
fn test_switch_per_connection() {
    let case = case5();
    let doc = forward(&case);
    let cbt = components_by_type(&doc);

    let attached = case.loads.len() + case.fixed_shunts.len() + case.generators.len();
    let two_ended = case.branches.len() + case.two_winding_count();
    assert_eq!(cbt.switches.len(), attached + 2 * two_ended);

    for switch in &cbt.switches {
        assert_ne!(switch.link_1, switch.link_2);
        assert_eq!(switch.status.var, vec![SwitchStatus::Off, SwitchStatus::On]);
    }
}

#[test]
fn test_forward_is_deterministic() {
    let case = case5();
    assert_eq!(forward(&case), forward(&case));
}

#[test]
fn test_condenser_split() {
    let doc = forward(&case5());
    let cbt = components_by_type(&doc);
    assert_eq!(cbt.generators.len(), 4);
    assert_eq!(cbt.synchronous_condensers.len(), 1);

    let costs = &doc.market.operational_costs;
    assert_eq!(costs.len(), 4);
    let condenser = &cbt.synchronous_condensers[0].id;
    assert!(!costs.contains_key(condenser));
}

#[test]
fn test_optional_sections_can_be_dropped() {
    let mut doc = forward(&case5());
    doc.operation_constraints.clear();
    doc.market.operational_costs.clear();
    doc.groups.clear();
    assert!(is_valid(&doc));

    let case = build_case(&doc, &TranslationOptions::default()).unwrap().value;
    assert_eq!(case.buses.len(), 5);
    assert_eq!(case.branches.len(), 6);
    assert_eq!(case.generators.len(), 5);
    assert_eq!(case.transformers.len(), 1);
    assert_eq!(case.loads.len(), 3);
}

#[test]
fn test_file_entry_points() {
    let dir = tempdir().unwrap();
    let raw_path = dir.path().join("grid.raw");
    std::fs::copy(repo_path("test_data/psse/case5.raw"), &raw_path).unwrap();

    let options = TranslationOptions::default();
    let grg = raw_file_to_grg(&raw_path, &options).unwrap();
    assert_eq!(grg.value.network.id, "grid");

    let json_path = dir.path().join("grid.json");
    std::fs::write(&json_path, grg.value.to_json_pretty().unwrap()).unwrap();
    let back = grg_file_to_raw(&json_path, &options).unwrap().value;

    let written = dir.path().join("again.raw");
    std::fs::write(&written, back.to_raw()).unwrap();
    let reread = raw_file_to_grg(&written, &options).unwrap();
    assert_eq!(components_by_type(&reread.value).buses.len(), 5);
}

#[test]
fn test_missing_file_names_path() {
    let err = raw_file_to_grg("does/not/exist.raw", &TranslationOptions::default()).unwrap_err();
    assert!(format!("{err:#}").contains("does/not/exist.raw"));
}
