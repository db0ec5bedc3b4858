//! Optional startup node ranking: nodes sharing a leaf switch get the same
//! rank so that the scheduler's node ordering follows the fabric.

use gantry_topology_types::NodeDirectory;
use tracing::{debug, warn};

use crate::config::TopologyConfig;
use crate::validate::{build_forest, SwitchConfigSource};

#[cfg(test)]
#[path = "ranking_test.rs"]
mod ranking_test;

/// The `topology_param` token that opts into leaf-switch node ranking.
pub const SWITCH_AS_NODE_RANK: &str = "SwitchAsNodeRank";

/// Assigns each attached node the 1-based ordinal of its leaf switch, in
/// table order; unattached nodes keep rank 0. Runs on a transient forest
/// that is discarded before returning. Returns whether ranking was
/// performed.
pub fn generate_node_ranking(
    config: &TopologyConfig,
    source: &dyn SwitchConfigSource,
    dir: &mut NodeDirectory,
) -> bool {
    if !config
        .topology_param
        .to_ascii_lowercase()
        .contains(&SWITCH_AS_NODE_RANK.to_ascii_lowercase())
    {
        return false;
    }

    // Build a temporary forest just to find the leaf switches.
    let forest = match source.switch_definitions().and_then(|defs| build_forest(&defs, dir)) {
        Ok(forest) => forest,
        Err(err) => {
            warn!("node ranking skipped, topology build failed: {err}");
            return false;
        }
    };
    if forest.is_empty() {
        return false;
    }

    // By default node_rank is 0, so start at 1.
    let mut switch_rank = 1u32;
    for record in forest.records() {
        if !record.is_leaf() {
            continue;
        }
        for node in record.node_bitmap.iter_ones() {
            dir.set_node_rank(node, switch_rank);
            debug!("node={} rank={}", dir.name(node).unwrap_or("<unknown>"), switch_rank);
        }
        switch_rank += 1;
    }
    true
}
