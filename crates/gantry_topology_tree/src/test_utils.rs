//! Shared fixtures: small fabrics exercised across the unit tests.

use gantry_topology_types::NodeDirectory;

use crate::forest::SwitchForest;
use crate::validate::{build_forest, SwitchDefinition};

/// `tux0 .. tux{count-1}`.
pub(crate) fn directory(count: usize) -> NodeDirectory {
    NodeDirectory::new((0..count).map(|index| format!("tux{index}")))
}

/// One leaf holding three nodes; the smallest routable fabric.
pub(crate) fn single_leaf_definitions() -> Vec<SwitchDefinition> {
    vec![SwitchDefinition::leaf("leaf0", "tux[0-2]")]
}

/// `spine0` over `leaf0{tux0,tux1}` and `leaf1{tux2,tux3}`.
pub(crate) fn two_leaf_definitions() -> Vec<SwitchDefinition> {
    vec![
        SwitchDefinition::interior("spine0", "leaf[0-1]").with_link_speed(100),
        SwitchDefinition::leaf("leaf0", "tux[0-1]").with_link_speed(40),
        SwitchDefinition::leaf("leaf1", "tux[2-3]").with_link_speed(40),
    ]
}

pub(crate) fn two_leaf_forest(dir: &NodeDirectory) -> SwitchForest {
    build_forest(&two_leaf_definitions(), dir).expect("fixture builds")
}

/// Three tiers: `core0` over `spine[0-1]`, each spine over two leaves, each
/// leaf holding two nodes (`tux0 .. tux7`).
pub(crate) fn fat_tree_definitions() -> Vec<SwitchDefinition> {
    vec![
        SwitchDefinition::interior("core0", "spine[0-1]"),
        SwitchDefinition::interior("spine0", "leaf[0-1]"),
        SwitchDefinition::interior("spine1", "leaf[2-3]"),
        SwitchDefinition::leaf("leaf0", "tux[0-1]"),
        SwitchDefinition::leaf("leaf1", "tux[2-3]"),
        SwitchDefinition::leaf("leaf2", "tux[4-5]"),
        SwitchDefinition::leaf("leaf3", "tux[6-7]"),
    ]
}

pub(crate) fn fat_tree_forest(dir: &NodeDirectory) -> SwitchForest {
    build_forest(&fat_tree_definitions(), dir).expect("fixture builds")
}

/// Two disjoint trees sharing one node directory.
pub(crate) fn split_fabric_definitions() -> Vec<SwitchDefinition> {
    vec![
        SwitchDefinition::interior("spineA", "leaf[0-1]"),
        SwitchDefinition::interior("spineB", "leaf[2-3]"),
        SwitchDefinition::leaf("leaf0", "tux[0-1]"),
        SwitchDefinition::leaf("leaf1", "tux[2-3]"),
        SwitchDefinition::leaf("leaf2", "tux[4-5]"),
        SwitchDefinition::leaf("leaf3", "tux[6-7]"),
    ]
}
