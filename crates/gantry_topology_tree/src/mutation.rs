//! Incremental add/remove of a node while the controller is running.

use gantry_topology_types::{NodeDirectory, TopologyError};
use tracing::debug;

use crate::forest::SwitchForest;

#[cfg(test)]
#[path = "mutation_test.rs"]
mod mutation_test;

/// Attaches `node` to the leaf named by `unit_path` (creating missing
/// switches along the way) and detaches it from any other leaf, propagating
/// membership along every affected path to the root. With no path this is a
/// pure removal.
///
/// `unit_path` is a colon separated chain of switch names from an ancestor
/// down to a leaf, e.g. `"spine0:leaf1"`. The first name must already exist;
/// later unknown names are created one level below their predecessor. The
/// final name must resolve to a leaf. The full path is validated before any
/// switch is created, so a failing call leaves the forest untouched.
pub fn add_rm_node(
    forest: &mut SwitchForest,
    node: usize,
    unit_path: Option<&str>,
    dir: &NodeDirectory,
) -> Result<(), TopologyError> {
    let target_leaf = match unit_path {
        Some(path) => resolve_unit_path(forest, path)?,
        None => None,
    };

    let node_name = dir.name(node).unwrap_or("<unknown>").to_string();
    let mut added = vec![false; forest.switch_count()];
    for leaf in 0..forest.switch_count() {
        if !forest.record(leaf).is_leaf() {
            continue;
        }
        let in_switch = forest.record(leaf).node_bitmap.test(node);
        let add = target_leaf == Some(leaf);
        if in_switch == add {
            continue;
        }

        let mut current = Some(leaf);
        while let Some(index) = current {
            if added[index] {
                // Reached a switch the add walk already updated; the rest of
                // the chain is shared.
                break;
            }
            if add {
                debug!("add {} to {}", node_name, forest.record(index).name);
                forest.record_mut(index).node_bitmap.set(node);
                added[index] = true;
            } else {
                debug!("remove {} from {}", node_name, forest.record(index).name);
                forest.record_mut(index).node_bitmap.clear(node);
            }
            let nodes = dir.bitmap_to_names(&forest.record(index).node_bitmap);
            let switches = forest.render_switches(index);
            let record = forest.record_mut(index);
            record.nodes = nodes;
            record.switches = switches;
            current = forest.record(index).parent;
        }
    }
    Ok(())
}

/// Walks the colon separated path, creating missing switches, and returns
/// the target leaf index. An empty path resolves to `None` (pure removal).
fn resolve_unit_path(
    forest: &mut SwitchForest,
    path: &str,
) -> Result<Option<usize>, TopologyError> {
    let segments: Vec<&str> = path.split(':').filter(|segment| !segment.is_empty()).collect();
    if segments.is_empty() {
        return Ok(None);
    }
    check_unit_path(forest, &segments)?;

    let mut current = None;
    for &segment in &segments {
        let index = match forest.index_of(segment) {
            Some(index) => index,
            None => {
                let parent = current.expect("checked: first segment exists");
                forest.add_switch(segment, parent)?
            }
        };
        current = Some(index);
    }
    Ok(current)
}

/// Dry-runs the path walk so that a bad path is rejected before any switch
/// is created.
fn check_unit_path(forest: &SwitchForest, segments: &[&str]) -> Result<(), TopologyError> {
    let mut previous: Option<(String, u16)> = None;
    for &segment in segments {
        let (name, level) = match forest.index_of(segment) {
            Some(index) => (forest.record(index).name.clone(), forest.record(index).level),
            None => match previous.as_ref() {
                None => {
                    return Err(TopologyError::UnknownSwitch { name: segment.to_string() });
                }
                Some((parent_name, parent_level)) => {
                    let level = parent_level.checked_sub(1).ok_or_else(|| {
                        TopologyError::NonLeafTarget { name: parent_name.clone() }
                    })?;
                    (segment.to_string(), level)
                }
            },
        };
        previous = Some((name, level));
    }
    match previous {
        Some((name, level)) if level != 0 => Err(TopologyError::NonLeafTarget { name }),
        _ => Ok(()),
    }
}
