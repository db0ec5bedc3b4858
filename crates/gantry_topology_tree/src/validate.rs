//! Forest construction from pre-parsed switch definitions.
//!
//! Configuration-file parsing happens outside this crate; callers hand in
//! [`SwitchDefinition`]s through a [`SwitchConfigSource`]. `build_forest`
//! turns them into a [`SwitchForest`] satisfying every structural invariant,
//! or fails with `ConfigInvalid` and leaves no forest behind.

use std::collections::HashMap;

use gantry_hostlist::Hostlist;
use gantry_topology_types::{Bitmap, NodeDirectory, TopologyError};
use tracing::debug;

use crate::forest::{SwitchForest, SwitchRecord};

#[cfg(test)]
#[path = "validate_test.rs"]
mod validate_test;

/// One switch as declared in configuration, before validation. Exactly one
/// of `switches` (child names, host-expression form) and `nodes` (attached
/// node names) must be set: the former declares an interior switch, the
/// latter a leaf.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SwitchDefinition {
    pub name: String,
    pub switches: Option<String>,
    pub nodes: Option<String>,
    pub link_speed: u32,
}

impl SwitchDefinition {
    pub fn leaf(name: &str, nodes: &str) -> Self {
        Self { name: name.to_string(), nodes: Some(nodes.to_string()), ..Self::default() }
    }

    pub fn interior(name: &str, switches: &str) -> Self {
        Self { name: name.to_string(), switches: Some(switches.to_string()), ..Self::default() }
    }

    pub fn with_link_speed(mut self, link_speed: u32) -> Self {
        self.link_speed = link_speed;
        self
    }
}

/// The opaque configuration handle: yields the declared switches whenever a
/// forest has to be (re)built.
pub trait SwitchConfigSource {
    fn switch_definitions(&self) -> Result<Vec<SwitchDefinition>, TopologyError>;
}

/// A [`SwitchConfigSource`] over an in-memory definition list.
#[derive(Clone, Debug, Default)]
pub struct StaticSwitchConfig {
    definitions: Vec<SwitchDefinition>,
}

impl StaticSwitchConfig {
    pub fn new(definitions: Vec<SwitchDefinition>) -> Self {
        Self { definitions }
    }
}

impl SwitchConfigSource for StaticSwitchConfig {
    fn switch_definitions(&self) -> Result<Vec<SwitchDefinition>, TopologyError> {
        Ok(self.definitions.clone())
    }
}

/// Builds a forest satisfying the structural invariants from `definitions`.
///
/// With no nodes configured this is a no-op returning an empty forest. Any
/// inconsistency in the definitions fails the whole build.
pub fn build_forest(
    definitions: &[SwitchDefinition],
    dir: &NodeDirectory,
) -> Result<SwitchForest, TopologyError> {
    if dir.is_empty() || definitions.is_empty() {
        return Ok(SwitchForest::default());
    }

    let invalid = |message: String| Err(TopologyError::ConfigInvalid(message));

    let mut index_by_name: HashMap<&str, usize> = HashMap::with_capacity(definitions.len());
    for (index, definition) in definitions.iter().enumerate() {
        if index_by_name.insert(definition.name.as_str(), index).is_some() {
            return invalid(format!("switch {} is defined twice", definition.name));
        }
    }

    // Resolve child lists and parent links.
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); definitions.len()];
    let mut parent: Vec<Option<usize>> = vec![None; definitions.len()];
    for (index, definition) in definitions.iter().enumerate() {
        match (&definition.switches, &definition.nodes) {
            (Some(_), Some(_)) => {
                return invalid(format!(
                    "switch {} declares both child switches and nodes",
                    definition.name
                ));
            }
            (None, None) => {
                return invalid(format!(
                    "switch {} declares neither child switches nor nodes",
                    definition.name
                ));
            }
            (Some(switches), None) => {
                for child_name in Hostlist::from_expr(switches)?.iter() {
                    let child = match index_by_name.get(child_name) {
                        Some(&child) => child,
                        None => {
                            return invalid(format!(
                                "switch {} lists undefined child switch {child_name}",
                                definition.name
                            ));
                        }
                    };
                    if let Some(previous) = parent[child] {
                        return invalid(format!(
                            "switch {child_name} has two parents: {} and {}",
                            definitions[previous].name, definition.name
                        ));
                    }
                    parent[child] = Some(index);
                    children[index].push(child);
                }
                if children[index].is_empty() {
                    return invalid(format!("switch {} has an empty child list", definition.name));
                }
            }
            (None, Some(_)) => {}
        }
    }

    let levels = assign_levels(definitions, &children)?;

    // Leaf attachment bitmaps; a node may appear under one leaf only.
    let mut bitmaps: Vec<Bitmap> = Vec::with_capacity(definitions.len());
    let mut attached = Bitmap::new(dir.len());
    for definition in definitions {
        let mut bitmap = Bitmap::new(dir.len());
        if let Some(nodes) = &definition.nodes {
            let hostlist = Hostlist::from_expr(nodes)?;
            bitmap = dir.hostlist_to_bitmap(&hostlist).map_err(|err| {
                TopologyError::ConfigInvalid(format!(
                    "switch {} lists unconfigured nodes: {err}",
                    definition.name
                ))
            })?;
            if bitmap.overlap_any(&attached) {
                return invalid(format!(
                    "switch {} re-attaches nodes already under another leaf",
                    definition.name
                ));
            }
            attached.union_with(&bitmap);
        }
        bitmaps.push(bitmap);
    }

    // Interior bitmaps are unions over children; ascending level order
    // guarantees children are complete first.
    let max_level = levels.iter().copied().max().unwrap_or(0);
    for level in 1..=max_level {
        for index in 0..definitions.len() {
            if levels[index] != level {
                continue;
            }
            let mut union = Bitmap::new(dir.len());
            for &child in &children[index] {
                union.union_with(&bitmaps[child]);
            }
            bitmaps[index] = union;
        }
    }

    let mut descendants: Vec<Vec<usize>> = vec![Vec::new(); definitions.len()];
    for index in 0..definitions.len() {
        collect_descendants(&children, index, &mut descendants[index]);
    }

    let records = definitions
        .iter()
        .enumerate()
        .map(|(index, definition)| {
            let child_names = children[index]
                .iter()
                .fold(Hostlist::new(), |mut names, &child| {
                    names.push(&definitions[child].name);
                    names
                });
            SwitchRecord {
                name: definition.name.clone(),
                level: levels[index],
                parent: parent[index],
                children: children[index].clone(),
                descendants: std::mem::take(&mut descendants[index]),
                nodes: dir.bitmap_to_names(&bitmaps[index]),
                switches: child_names.ranged_string(),
                node_bitmap: std::mem::replace(&mut bitmaps[index], Bitmap::new(0)),
                link_speed: definition.link_speed,
            }
        })
        .collect();

    let forest = SwitchForest::from_records(records);
    forest.check_invariants(dir)?;
    debug!(
        switch_count = forest.switch_count(),
        switch_levels = forest.switch_levels(),
        "switch table validated"
    );
    Ok(forest)
}

/// Leaf switches sit at level 0; an interior switch sits one above its
/// deepest child. Cycles in the declared child lists are rejected.
fn assign_levels(
    definitions: &[SwitchDefinition],
    children: &[Vec<usize>],
) -> Result<Vec<u16>, TopologyError> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Unvisited,
        InProgress,
        Done,
    }

    fn level_of(
        index: usize,
        definitions: &[SwitchDefinition],
        children: &[Vec<usize>],
        levels: &mut [u16],
        marks: &mut [Mark],
    ) -> Result<u16, TopologyError> {
        match marks[index] {
            Mark::Done => return Ok(levels[index]),
            Mark::InProgress => {
                return Err(TopologyError::ConfigInvalid(format!(
                    "switch {} is its own ancestor",
                    definitions[index].name
                )));
            }
            Mark::Unvisited => {}
        }
        marks[index] = Mark::InProgress;
        let mut level = 0;
        for &child in &children[index] {
            let child_level = level_of(child, definitions, children, levels, marks)?;
            level = level.max(child_level + 1);
        }
        levels[index] = level;
        marks[index] = Mark::Done;
        Ok(level)
    }

    let mut levels = vec![0u16; definitions.len()];
    let mut marks = vec![Mark::Unvisited; definitions.len()];
    for index in 0..definitions.len() {
        level_of(index, definitions, children, &mut levels, &mut marks)?;
    }
    Ok(levels)
}

fn collect_descendants(children: &[Vec<usize>], index: usize, out: &mut Vec<usize>) {
    for &child in &children[index] {
        out.push(child);
        collect_descendants(children, child, out);
    }
}
