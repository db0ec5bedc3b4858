//! Read-side queries over a built forest: leaf-closure expansion, snapshot
//! extraction and the tagged data requests served to RPC callers.

use gantry_topology_types::{Bitmap, TopologyError, TopologyRecord, TopologySnapshot};
use strum::FromRepr;

use crate::forest::SwitchForest;

#[cfg(test)]
#[path = "queries_test.rs"]
mod queries_test;

/// Expands `mask` in place to the full membership of every leaf it touches:
/// the smallest set closed under leaf membership that contains the input.
/// Interior switches are ignored.
pub fn whole_topo(forest: &SwitchForest, mask: &mut Bitmap) {
    for record in forest.records() {
        if !record.is_leaf() {
            continue;
        }
        if record.node_bitmap.overlap_any(mask) {
            mask.union_with(&record.node_bitmap);
        }
    }
}

/// The data requests a caller may issue, with their wire tags.
#[derive(Clone, Copy, Debug, PartialEq, Eq, FromRepr)]
#[repr(u16)]
pub enum TopologyDataKind {
    Snapshot = 0,
    RecordCount = 1,
    ExclusiveTopo = 2,
}

impl TopologyDataKind {
    /// Decodes a wire tag; unknown tags are an error, never silence.
    pub fn from_wire(kind: u16) -> Result<Self, TopologyError> {
        Self::from_repr(kind).ok_or(TopologyError::UnsupportedQuery { kind })
    }
}

/// One answer per [`TopologyDataKind`].
#[derive(Clone, Debug, PartialEq)]
pub enum TopologyData {
    Snapshot(TopologySnapshot),
    RecordCount(u32),
    ExclusiveTopo(bool),
}

pub fn get(forest: &SwitchForest, kind: TopologyDataKind) -> TopologyData {
    match kind {
        TopologyDataKind::Snapshot => TopologyData::Snapshot(snapshot(forest)),
        TopologyDataKind::RecordCount => {
            let count =
                u32::try_from(forest.switch_count()).expect("switch table exceeds u32::MAX");
            TopologyData::RecordCount(count)
        }
        TopologyDataKind::ExclusiveTopo => {
            TopologyData::ExclusiveTopo(crate::SUPPORTS_EXCLUSIVE_TOPO)
        }
    }
}

/// Flattens the forest into its wire-compatible view.
pub fn snapshot(forest: &SwitchForest) -> TopologySnapshot {
    TopologySnapshot {
        records: forest
            .records()
            .iter()
            .map(|record| TopologyRecord {
                level: record.level,
                link_speed: record.link_speed,
                name: record.name.clone(),
                nodes: record.nodes.clone(),
                switches: record.switches.clone(),
            })
            .collect(),
    }
}

/// A tree topology exposes no fragmentation metric.
pub fn get_fragmentation(_forest: &SwitchForest, _node_mask: &Bitmap) -> u32 {
    0
}
