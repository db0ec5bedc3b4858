use gantry_hostlist::Hostlist;
use indexmap::IndexMap;

use crate::bitmap::Bitmap;
use crate::errors::TopologyError;

#[cfg(test)]
#[path = "nodes_test.rs"]
mod nodes_test;

/// The node directory: maps node names to dense indices and back.
///
/// Indices are insertion positions and stay stable for the directory's life,
/// so node bitmaps allocated against [`NodeDirectory::len`] remain valid as
/// long as the directory does. Mutation (ranking) requires `&mut self`; every
/// read path borrows immutably, which is the single-writer/many-reader
/// contract the topology core relies on.
#[derive(Clone, Debug, Default)]
pub struct NodeDirectory {
    // name -> node_rank; the map position is the node index.
    records: IndexMap<String, u32>,
}

impl NodeDirectory {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { records: names.into_iter().map(|name| (name.into(), 0)).collect() }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Resolves a node name to its index.
    pub fn find(&self, name: &str) -> Option<usize> {
        self.records.get_index_of(name)
    }

    pub fn name(&self, index: usize) -> Option<&str> {
        self.records.get_index(index).map(|(name, _)| name.as_str())
    }

    pub fn node_rank(&self, index: usize) -> Option<u32> {
        self.records.get_index(index).map(|(_, rank)| *rank)
    }

    pub fn set_node_rank(&mut self, index: usize, rank: u32) {
        if let Some((_, slot)) = self.records.get_index_mut(index) {
            *slot = rank;
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    /// Allocates a node-width bitmap with the bits of `hostlist` set.
    pub fn hostlist_to_bitmap(&self, hostlist: &Hostlist) -> Result<Bitmap, TopologyError> {
        let mut bitmap = Bitmap::new(self.len());
        for name in hostlist.iter() {
            let index = self
                .find(name)
                .ok_or_else(|| TopologyError::NodeUnknown { name: name.to_string() })?;
            bitmap.set(index);
        }
        Ok(bitmap)
    }

    /// Renders the set nodes of `bitmap` as an ordered hostlist.
    pub fn bitmap_to_hostlist(&self, bitmap: &Bitmap) -> Hostlist {
        debug_assert_eq!(bitmap.len(), self.len());
        let mut hostlist = Hostlist::new();
        for index in bitmap.iter_ones() {
            if let Some(name) = self.name(index) {
                hostlist.push(name);
            }
        }
        hostlist
    }

    /// Renders the set nodes of `bitmap` in the compressed ranged form.
    pub fn bitmap_to_names(&self, bitmap: &Bitmap) -> String {
        self.bitmap_to_hostlist(bitmap).ranged_string()
    }
}
