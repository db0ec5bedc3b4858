use assert_matches::assert_matches;
use gantry_topology_types::{NodeDirectory, TopologyError};
use pretty_assertions::assert_eq;

use crate::test_utils::{directory, split_fabric_definitions, two_leaf_definitions};
use crate::validate::{build_forest, StaticSwitchConfig, SwitchConfigSource, SwitchDefinition};

#[test]
fn empty_directory_is_a_noop() {
    let dir = NodeDirectory::default();
    let forest = build_forest(&two_leaf_definitions(), &dir).unwrap();
    assert!(forest.is_empty());
    assert_eq!(forest.switch_count(), 0);
}

#[test]
fn empty_definitions_build_an_empty_forest() {
    let dir = directory(4);
    assert!(build_forest(&[], &dir).unwrap().is_empty());
}

#[test]
fn two_leaf_fabric_satisfies_the_postcondition() {
    let dir = directory(4);
    let forest = build_forest(&two_leaf_definitions(), &dir).unwrap();

    forest.check_invariants(&dir).unwrap();
    assert_eq!(forest.switch_count(), 3);
    assert_eq!(forest.switch_levels(), 1);

    // The spine's bitmap is the union over its leaves.
    let spine = forest.record(0);
    assert_eq!(spine.node_bitmap.count(), 4);
    assert_eq!(spine.nodes, "tux[0-3]");
    assert_eq!(spine.switches, "leaf[0-1]");
}

#[test]
fn multiple_roots_are_a_forest() {
    let dir = directory(8);
    let forest = build_forest(&split_fabric_definitions(), &dir).unwrap();

    forest.check_invariants(&dir).unwrap();
    assert_eq!(forest.record(0).parent, None);
    assert_eq!(forest.record(1).parent, None);
    assert_eq!(forest.switch_levels(), 1);
}

#[test]
fn duplicate_switch_names_are_rejected() {
    let dir = directory(4);
    let definitions =
        vec![SwitchDefinition::leaf("leaf0", "tux0"), SwitchDefinition::leaf("leaf0", "tux1")];
    assert_matches!(build_forest(&definitions, &dir), Err(TopologyError::ConfigInvalid(_)));
}

#[test]
fn leaf_and_interior_roles_are_exclusive() {
    let dir = directory(4);
    let both = vec![SwitchDefinition {
        name: "odd".to_string(),
        switches: Some("leaf0".to_string()),
        nodes: Some("tux0".to_string()),
        link_speed: 0,
    }];
    assert_matches!(build_forest(&both, &dir), Err(TopologyError::ConfigInvalid(_)));

    let neither = vec![SwitchDefinition { name: "odd".to_string(), ..Default::default() }];
    assert_matches!(build_forest(&neither, &dir), Err(TopologyError::ConfigInvalid(_)));
}

#[test]
fn undefined_child_switch_is_rejected() {
    let dir = directory(4);
    let definitions = vec![
        SwitchDefinition::interior("spine0", "leaf[0-1]"),
        SwitchDefinition::leaf("leaf0", "tux[0-1]"),
    ];
    assert_matches!(build_forest(&definitions, &dir), Err(TopologyError::ConfigInvalid(_)));
}

#[test]
fn two_parents_are_rejected() {
    let dir = directory(4);
    let definitions = vec![
        SwitchDefinition::interior("spine0", "leaf0"),
        SwitchDefinition::interior("spine1", "leaf0"),
        SwitchDefinition::leaf("leaf0", "tux[0-1]"),
    ];
    assert_matches!(build_forest(&definitions, &dir), Err(TopologyError::ConfigInvalid(_)));
}

#[test]
fn child_cycles_are_rejected() {
    let dir = directory(4);
    let definitions = vec![
        SwitchDefinition::interior("s0", "s1"),
        SwitchDefinition::interior("s1", "s0"),
    ];
    assert_matches!(build_forest(&definitions, &dir), Err(TopologyError::ConfigInvalid(_)));
}

#[test]
fn unknown_nodes_are_rejected() {
    let dir = directory(2);
    let definitions = vec![SwitchDefinition::leaf("leaf0", "tux[0-5]")];
    assert_matches!(build_forest(&definitions, &dir), Err(TopologyError::ConfigInvalid(_)));
}

#[test]
fn node_under_two_leaves_is_rejected() {
    let dir = directory(4);
    let definitions = vec![
        SwitchDefinition::leaf("leaf0", "tux[0-2]"),
        SwitchDefinition::leaf("leaf1", "tux[2-3]"),
    ];
    assert_matches!(build_forest(&definitions, &dir), Err(TopologyError::ConfigInvalid(_)));
}

#[test]
fn static_source_hands_back_its_definitions() {
    let source = StaticSwitchConfig::new(two_leaf_definitions());
    assert_eq!(source.switch_definitions().unwrap(), two_leaf_definitions());
}
