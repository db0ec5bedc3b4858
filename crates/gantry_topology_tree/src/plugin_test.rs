use assert_matches::assert_matches;
use gantry_hostlist::Hostlist;
use gantry_topology_types::{Bitmap, TopologyError};
use pretty_assertions::assert_eq;

use crate::config::TopologyConfig;
use crate::plugin::TreeTopology;
use crate::queries::{TopologyData, TopologyDataKind};
use crate::test_utils::{directory, two_leaf_definitions};
use crate::validate::StaticSwitchConfig;

fn topology(config: TopologyConfig, in_controller: bool) -> TreeTopology {
    TreeTopology::new(
        config,
        Box::new(StaticSwitchConfig::new(two_leaf_definitions())),
        in_controller,
    )
}

#[test]
fn build_config_is_idempotent() {
    let dir = directory(4);
    let topology = topology(TopologyConfig::default(), true);

    assert!(topology.forest().is_none());
    topology.build_config(&dir).unwrap();
    assert_eq!(topology.forest().unwrap().switch_count(), 3);
    topology.build_config(&dir).unwrap();
    assert_eq!(topology.forest().unwrap().switch_count(), 3);
}

#[test]
fn build_config_without_nodes_is_a_noop() {
    let dir = gantry_topology_types::NodeDirectory::default();
    let topology = topology(TopologyConfig::default(), true);

    topology.build_config(&dir).unwrap();
    assert!(topology.forest().is_none());
}

#[test]
fn destroy_config_allows_a_rebuild() {
    let dir = directory(4);
    let mut topology = topology(TopologyConfig::default(), true);

    topology.build_config(&dir).unwrap();
    topology.destroy_config();
    assert!(topology.forest().is_none());
    topology.build_config(&dir).unwrap();
    assert!(topology.forest().is_some());
}

#[test]
fn routing_disabled_skips_the_forest_entirely() {
    let dir = directory(4);
    let config = TopologyConfig { route_tree: false, ..TopologyConfig::default() };
    let topology = topology(config, false);

    let (lists, depth) =
        topology.split_hostlist(&Hostlist::from_expr("tux[1-2]").unwrap(), 2, &dir);
    let rendered: Vec<String> = lists.iter().map(Hostlist::ranged_string).collect();
    assert_eq!(rendered, vec!["tux1", "tux2"]);
    assert_eq!(depth, 2);
    // The short circuit comes before the lazy build.
    assert!(topology.forest().is_none());
}

#[test]
fn first_router_call_builds_the_forest_outside_the_controller() {
    let dir = directory(4);
    let topology = topology(TopologyConfig::default(), false);

    assert!(topology.forest().is_none());
    let (lists, depth) =
        topology.split_hostlist(&Hostlist::from_expr("tux[1-2]").unwrap(), 2, &dir);
    assert_eq!(lists.len(), 2);
    assert_eq!(depth, 2);
    assert_eq!(topology.forest().unwrap().switch_count(), 3);
}

#[test]
#[should_panic(expected = "no switch records inside the controller")]
fn routing_without_a_forest_in_the_controller_aborts() {
    let dir = directory(4);
    let topology = topology(TopologyConfig::default(), true);
    topology.split_hostlist(&Hostlist::from_expr("tux0").unwrap(), 2, &dir);
}

#[test]
fn zero_tree_width_selects_the_configured_default() {
    let dir = directory(4);
    let config = TopologyConfig { tree_width: 2, ..TopologyConfig::default() };
    let topology = topology(config, false);
    topology.build_config(&dir).unwrap();

    let (lists, depth) =
        topology.split_hostlist(&Hostlist::from_expr("tux[1-2]").unwrap(), 0, &dir);
    assert_eq!(lists.len(), 2);
    assert_eq!(depth, 2);
}

#[test]
fn mutating_an_unbuilt_context() {
    let dir = directory(4);
    let mut topology = topology(TopologyConfig::default(), true);

    // A pure removal has nothing to do; an add has nowhere to anchor.
    topology.add_rm_node(0, None, &dir).unwrap();
    assert_matches!(
        topology.add_rm_node(0, Some("spine0:leaf0"), &dir),
        Err(TopologyError::UnknownSwitch { .. })
    );
}

#[test]
fn mutating_a_built_context_updates_the_forest() {
    let dir = directory(5);
    let mut topology = topology(TopologyConfig::default(), true);
    topology.build_config(&dir).unwrap();

    topology.add_rm_node(4, Some("spine0:leaf1"), &dir).unwrap();
    let bitmap = topology.get_bitmap("leaf1").unwrap();
    assert!(bitmap.test(4));
}

#[test]
fn queries_on_an_unbuilt_context_see_an_empty_table() {
    let dir = directory(4);
    let topology = topology(TopologyConfig::default(), true);

    assert!(topology.get_bitmap("spine0").is_none());
    assert_eq!(topology.get(TopologyDataKind::RecordCount), TopologyData::RecordCount(0));
    assert_eq!(topology.get_fragmentation(&Bitmap::new(4)), 0);

    let mut mask = Bitmap::new(4);
    mask.set(1);
    topology.whole_topo(&mut mask);
    assert_eq!(mask.count(), 1);

    let (address, pattern) = topology.get_node_addr("tux1", &dir).unwrap();
    assert_eq!(address, "tux1");
    assert_eq!(pattern, "node");
}

#[test]
fn ranking_leaves_the_context_forest_untouched() {
    let mut dir = directory(4);
    let config = TopologyConfig {
        topology_param: "SwitchAsNodeRank".to_string(),
        ..TopologyConfig::default()
    };
    let topology = topology(config, true);

    assert!(topology.generate_node_ranking(&mut dir));
    assert_eq!(dir.node_rank(0), Some(1));
    assert_eq!(dir.node_rank(3), Some(2));
    // The ranking forest is transient.
    assert!(topology.forest().is_none());
}
