//! Hierarchical node addresses.
//!
//! Example output for a three-tier fabric:
//!
//! ```text
//! address: s0.s4.s8.tux1
//! pattern: switch.switch.switch.node
//! ```

use gantry_hostlist::Hostlist;
use gantry_topology_types::{NodeDirectory, TopologyError};

use crate::forest::SwitchForest;

#[cfg(test)]
#[path = "address_test.rs"]
mod address_test;

/// Builds the dotted topology address of a node and the associated pattern.
/// Each address segment names the switches at one level (top first) whose
/// subtree contains the node, in compressed hostlist form.
pub fn get_node_addr(
    forest: &SwitchForest,
    node_name: &str,
    dir: &NodeDirectory,
) -> Result<(String, String), TopologyError> {
    // Without switches the node stands alone.
    if forest.is_empty() {
        return Ok((node_name.to_string(), "node".to_string()));
    }

    let node = dir
        .find(node_name)
        .ok_or_else(|| TopologyError::NodeUnknown { name: node_name.to_string() })?;

    let max_level = forest.records().iter().map(|record| record.level).max().unwrap_or(0);

    let mut address = String::new();
    let mut pattern = String::new();
    for level in (0..=max_level).rev() {
        let mut names = Hostlist::new();
        for record in forest.records() {
            if record.level == level && record.node_bitmap.test(node) {
                names.push(&record.name);
            }
        }
        if !names.is_empty() {
            address.push_str(&names.ranged_string());
        }
        address.push('.');
        pattern.push_str("switch.");
    }

    address.push_str(node_name);
    pattern.push_str("node");
    Ok((address, pattern))
}
