//! The in-memory switch forest: an arena of switch records wired together by
//! parent/child indices.
//!
//! Switches are stored in a flat table; `parent` is `None` for roots and
//! cross-references are integer indices into the table, never owning
//! references. Indices are assigned on append and never reused for the life
//! of a forest.

use gantry_hostlist::Hostlist;
use gantry_topology_types::{Bitmap, NodeDirectory, TopologyError};

#[cfg(test)]
#[path = "forest_test.rs"]
mod forest_test;

/// One switch in the table.
#[derive(Clone, Debug, PartialEq)]
pub struct SwitchRecord {
    /// Unique switch name.
    pub name: String,
    /// Distance from the leaf tier; 0 means nodes attach directly.
    pub level: u16,
    /// Index of the parent switch, `None` for a tree root.
    pub parent: Option<usize>,
    /// Direct children, in declared order.
    pub children: Vec<usize>,
    /// All transitive child switches: each child in declared order followed
    /// by that child's descendants.
    pub descendants: Vec<usize>,
    /// Nodes reachable through this switch.
    pub node_bitmap: Bitmap,
    /// `node_bitmap` rendered as a ranged hostlist (regenerated on mutation).
    pub nodes: String,
    /// Direct child names rendered as a ranged list.
    pub switches: String,
    /// Carried verbatim from the configuration.
    pub link_speed: u32,
}

impl SwitchRecord {
    pub fn is_leaf(&self) -> bool {
        self.level == 0
    }
}

/// The switch table for a cluster. Built by [`crate::validate::build_forest`]
/// and mutated only through [`crate::mutation::add_rm_node`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SwitchForest {
    records: Vec<SwitchRecord>,
    levels: u16,
}

/// Stand-in for contexts whose forest has not been built yet.
pub(crate) static EMPTY_FOREST: SwitchForest =
    SwitchForest { records: Vec::new(), levels: 0 };

impl SwitchForest {
    pub(crate) fn from_records(records: Vec<SwitchRecord>) -> Self {
        let levels = records.iter().map(|record| record.level).max().unwrap_or(0);
        Self { records, levels }
    }

    pub fn switch_count(&self) -> usize {
        self.records.len()
    }

    /// The maximum switch level in the table; 0 means leaves only.
    pub fn switch_levels(&self) -> u16 {
        self.levels
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[SwitchRecord] {
        &self.records
    }

    pub fn record(&self, index: usize) -> &SwitchRecord {
        &self.records[index]
    }

    pub(crate) fn record_mut(&mut self, index: usize) -> &mut SwitchRecord {
        &mut self.records[index]
    }

    /// Resolves a switch name to its table index. Linear search; the table
    /// is small and queries are rare.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.records.iter().position(|record| record.name == name)
    }

    /// Borrowed view of the node bitmap of the named switch. The bitmap is
    /// owned by the forest; it stays valid for as long as the forest does.
    pub fn get_bitmap(&self, name: &str) -> Option<&Bitmap> {
        self.records.iter().find(|record| record.name == name).map(|record| &record.node_bitmap)
    }

    /// Renders the direct-child name list of `index` in ranged form.
    pub(crate) fn render_switches(&self, index: usize) -> String {
        let children = &self.records[index].children;
        if children.is_empty() {
            return String::new();
        }
        let mut names = Hostlist::new();
        for &child in children {
            names.push(&self.records[child].name);
        }
        names.ranged_string()
    }

    /// Appends a new switch as a child of `parent` with a fresh index. The
    /// new switch sits one level below its parent; hanging a switch off a
    /// leaf is refused.
    pub(crate) fn add_switch(&mut self, name: &str, parent: usize) -> Result<usize, TopologyError> {
        let parent_record = &self.records[parent];
        let level = parent_record.level.checked_sub(1).ok_or_else(|| {
            TopologyError::NonLeafTarget { name: parent_record.name.clone() }
        })?;
        let width = parent_record.node_bitmap.len();
        let index = self.records.len();
        self.records.push(SwitchRecord {
            name: name.to_string(),
            level,
            parent: Some(parent),
            children: Vec::new(),
            descendants: Vec::new(),
            node_bitmap: Bitmap::new(width),
            nodes: String::new(),
            switches: String::new(),
            link_speed: 0,
        });

        self.records[parent].children.push(index);
        let switches = self.render_switches(parent);
        self.records[parent].switches = switches;
        let mut ancestor = Some(parent);
        while let Some(current) = ancestor {
            self.records[current].descendants.push(index);
            ancestor = self.records[current].parent;
        }
        Ok(index)
    }

    /// Verifies the structural invariants the validator establishes and the
    /// mutator preserves. Intended as a post-condition check; the error
    /// names the first violation found.
    pub fn check_invariants(&self, dir: &NodeDirectory) -> Result<(), TopologyError> {
        let invalid = |message: String| Err(TopologyError::ConfigInvalid(message));

        for (index, record) in self.records.iter().enumerate() {
            // Parent/child links must agree and terminate.
            for &child in &record.children {
                if self.records[child].parent != Some(index) {
                    return invalid(format!(
                        "switch {} does not point back at its parent {}",
                        self.records[child].name, record.name
                    ));
                }
            }
            if let Some(parent) = record.parent {
                if !self.records[parent].children.contains(&index) {
                    return invalid(format!(
                        "switch {} is missing from the child list of {}",
                        record.name, self.records[parent].name
                    ));
                }
            }
            let mut steps = 0usize;
            let mut ancestor = record.parent;
            while let Some(current) = ancestor {
                steps += 1;
                if steps > self.records.len() {
                    return invalid(format!("parent chain of {} does not terminate", record.name));
                }
                ancestor = self.records[current].parent;
            }

            // Level structure.
            if record.is_leaf() != record.children.is_empty() {
                return invalid(format!(
                    "switch {} is at level {} but has {} children",
                    record.name,
                    record.level,
                    record.children.len()
                ));
            }
            if !record.children.is_empty() {
                let highest = record
                    .children
                    .iter()
                    .map(|&child| self.records[child].level)
                    .max()
                    .unwrap_or(0);
                if highest + 1 != record.level {
                    return invalid(format!(
                        "switch {} at level {} has deepest child at level {}",
                        record.name, record.level, highest
                    ));
                }
            }

            // Descendant closure: exactly the switches reachable downward.
            let mut reachable = Vec::new();
            collect_descendants(&self.records, index, &mut reachable);
            let mut expected = reachable.clone();
            let mut actual = record.descendants.clone();
            expected.sort_unstable();
            actual.sort_unstable();
            if expected != actual {
                return invalid(format!("descendant table of {} is stale", record.name));
            }

            // Interior bitmaps are the union of their children.
            if !record.children.is_empty() {
                let mut union = Bitmap::new(record.node_bitmap.len());
                for &child in &record.children {
                    union.union_with(&self.records[child].node_bitmap);
                }
                if union != record.node_bitmap {
                    return invalid(format!(
                        "node bitmap of {} is not the union of its children",
                        record.name
                    ));
                }
            }

            // Denormalized strings are canonical.
            if record.nodes != dir.bitmap_to_names(&record.node_bitmap) {
                return invalid(format!("nodes string of {} is stale", record.name));
            }
            if record.switches != self.render_switches(index) {
                return invalid(format!("switches string of {} is stale", record.name));
            }
        }

        // A node lives under exactly one leaf.
        let leaves: Vec<&SwitchRecord> =
            self.records.iter().filter(|record| record.is_leaf()).collect();
        for (position, leaf) in leaves.iter().enumerate() {
            for other in &leaves[position + 1..] {
                if leaf.node_bitmap.overlap_any(&other.node_bitmap) {
                    return invalid(format!(
                        "leaves {} and {} share nodes",
                        leaf.name, other.name
                    ));
                }
            }
        }

        let max_level = self.records.iter().map(|record| record.level).max().unwrap_or(0);
        if max_level != self.levels {
            return invalid(format!(
                "cached switch_levels {} does not match table maximum {}",
                self.levels, max_level
            ));
        }
        Ok(())
    }
}

fn collect_descendants(records: &[SwitchRecord], index: usize, out: &mut Vec<usize>) {
    for &child in &records[index].children {
        out.push(child);
        collect_descendants(records, child, out);
    }
}
