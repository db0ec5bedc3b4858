//! Topology-aware splitting of a broadcast destination set.
//!
//! A destination hostlist is tiled into per-subtree sub-lists that mirror
//! the switch hierarchy, so that forwarding follows physical links instead
//! of fanning out blindly. The returned depth estimates the number of hop
//! levels the resulting tree broadcast takes.

use gantry_hostlist::Hostlist;
use gantry_topology_types::{Bitmap, NodeDirectory};
use tracing::debug;

use crate::config::TopologyConfig;
use crate::forest::SwitchForest;

#[cfg(test)]
#[path = "route_test.rs"]
mod route_test;

/// Depth of a `tree_width`-ary forward tree spanning `host_count` hosts:
/// `ceil(log_w(n * (w - 1) + 1))`.
pub(crate) fn broadcast_depth(host_count: usize, tree_width: u16) -> u32 {
    debug_assert!(tree_width >= 2);
    if host_count == 0 {
        return 0;
    }
    let width = f64::from(tree_width);
    let span = (host_count as f64) * (width - 1.0) + 1.0;
    (span.log2() / width.log2()).ceil() as u32
}

/// Splits `hostlist` into at most `tree_width` contiguous sub-lists,
/// ignoring topology. This is the fallback when topology-aware routing is
/// disabled and the fan-out for a destination set fully contained in one
/// leaf. Returns the sub-lists and the forward-tree depth.
pub fn split_hostlist_treewidth(hostlist: &Hostlist, tree_width: u16) -> (Vec<Hostlist>, u32) {
    let host_count = hostlist.len();
    let depth = broadcast_depth(host_count, tree_width);
    let list_count = usize::from(tree_width).min(host_count);
    if list_count == 0 {
        return (Vec::new(), 0);
    }

    let base = host_count / list_count;
    let extra = host_count % list_count;
    let mut lists = Vec::with_capacity(list_count);
    let mut names = hostlist.iter();
    for position in 0..list_count {
        let take = base + usize::from(position < extra);
        let mut sublist = Hostlist::new();
        for _ in 0..take {
            if let Some(name) = names.next() {
                sublist.push(name);
            }
        }
        lists.push(sublist);
    }
    (lists, depth)
}

/// Splits `hostlist` along the switch hierarchy.
///
/// Aborts (panics) if the hostlist cannot be resolved against the node
/// directory: the destination set is produced by the caller from the same
/// directory, so a miss is a programming error, not bad input.
pub(crate) fn split_hostlist(
    forest: &SwitchForest,
    config: &TopologyConfig,
    hostlist: &Hostlist,
    tree_width: u16,
    dir: &NodeDirectory,
) -> (Vec<Hostlist>, u32) {
    let mut nodes_bitmap = dir.hostlist_to_bitmap(hostlist).unwrap_or_else(|err| {
        panic!("ROUTE: failed to make bitmap from hostlist={}: {err}", hostlist.ranged_string())
    });

    // Mark the leaf switches touching the destination set. The broadcast
    // below each leaf is a standard forward tree; the final depth starts at
    // the deepest of those.
    let mut depth: u32 = 0;
    let mut switch_bitmap = Bitmap::new(forest.switch_count());
    for (index, record) in forest.records().iter().enumerate() {
        if !record.is_leaf() {
            continue;
        }
        let switch_nodes = record.node_bitmap.overlap_count(&nodes_bitmap);
        if switch_nodes > 0 {
            depth = depth.max(broadcast_depth(switch_nodes, tree_width));
            switch_bitmap.set(index);
        }
    }
    let mut switch_count = switch_bitmap.count();

    // Merge marked switches upward: whenever a switch at the current level
    // covers two or more marked descendants, it replaces them. Stops as soon
    // as a single subtree covers everything.
    let mut upper_switch_level: u16 = 0;
    for level in 1..=forest.switch_levels() {
        if switch_count < 2 {
            break;
        }
        for index in 0..forest.switch_count() {
            if switch_count < 2 {
                break;
            }
            if forest.record(index).level != level {
                continue;
            }
            let mut first_child = None;
            let mut child_count = 0usize;
            for &descendant in &forest.record(index).descendants {
                if switch_bitmap.test(descendant) {
                    child_count += 1;
                    if child_count > 1 {
                        switch_bitmap.clear(descendant);
                    } else {
                        first_child = Some(descendant);
                    }
                }
            }
            if child_count > 1 {
                upper_switch_level = upper_switch_level.max(level);
                if let Some(first) = first_child {
                    switch_bitmap.clear(first);
                }
                switch_bitmap.set(index);
                switch_count -= child_count - 1;
            }
        }
    }

    // Hop levels through the intermediate switches, plus the forward trees
    // hanging off the leaves.
    depth += u32::from(upper_switch_level);

    let s_first = switch_bitmap.first_set();
    if let Some(first) = s_first {
        let record = forest.record(first);
        if switch_count == 1
            && record.is_leaf()
            && nodes_bitmap.is_subset_of(&record.node_bitmap)
        {
            // Everything sits under one leaf switch; fan out by tree width.
            // The splitter's depth replaces the one computed above.
            return split_hostlist_treewidth(hostlist, tree_width);
        }
    }

    let mut lists: Vec<Hostlist> = Vec::new();
    let mut msg_count = hostlist.len();
    if let (Some(first), Some(last)) = (s_first, switch_bitmap.last_set()) {
        for index in first..=last {
            if !switch_bitmap.test(index) {
                continue;
            }
            subtree_split_hostlist(
                forest,
                config,
                index,
                &mut nodes_bitmap,
                &mut msg_count,
                &mut lists,
                dir,
            );
        }
    }
    debug_assert_eq!(msg_count, nodes_bitmap.count());

    // Whatever is left is not reachable through any marked subtree; send to
    // each such node individually.
    if msg_count > 0 {
        if config.route_debug {
            debug!(
                "ROUTE: didn't find switch containing nodes={}",
                dir.bitmap_to_names(&nodes_bitmap)
            );
        }
        for index in nodes_bitmap.iter_ones() {
            let mut single = Hostlist::new();
            if let Some(name) = dir.name(index) {
                single.push(name);
            }
            lists.push(single);
        }
    }

    (lists, depth)
}

/// Splits the part of `nodes_bitmap` under `parent` into one sub-list per
/// direct child subtree, in declared child order, consuming the split nodes
/// from `nodes_bitmap`.
fn subtree_split_hostlist(
    forest: &SwitchForest,
    config: &TopologyConfig,
    parent: usize,
    nodes_bitmap: &mut Bitmap,
    msg_count: &mut usize,
    lists: &mut Vec<Hostlist>,
    dir: &NodeDirectory,
) -> usize {
    let mut list_count = 0usize;
    let mut fwd_bitmap: Option<Bitmap> = None;

    for &child in &forest.record(parent).children {
        let child_record = forest.record(child);
        let fwd = fwd_bitmap.get_or_insert_with(|| Bitmap::new(nodes_bitmap.len()));
        fwd.copy_from(&child_record.node_bitmap);
        fwd.intersect_with(nodes_bitmap);
        let switch_nodes = fwd.count();
        if switch_nodes == 0 {
            continue; // no nodes on this switch in the message list
        }
        let sublist = dir.bitmap_to_hostlist(fwd);
        nodes_bitmap.subtract(fwd);
        if config.route_debug {
            debug!(
                "ROUTE: ... sublist[{}] switch={} :: {}",
                lists.len(),
                child_record.name,
                sublist.ranged_string()
            );
        }
        lists.push(sublist);
        list_count += switch_nodes;
        if list_count == *msg_count {
            break; // all remaining nodes are in a child list
        }
    }
    *msg_count -= list_count;
    list_count
}
