use gantry_hostlist::Hostlist;
use gantry_topology_types::{Bitmap, NodeDirectory, TopologyError};
use once_cell::sync::OnceCell;
use tracing::info;

use crate::config::TopologyConfig;
use crate::forest::{SwitchForest, EMPTY_FOREST};
use crate::queries::{self, TopologyData, TopologyDataKind};
use crate::validate::{build_forest, SwitchConfigSource};
use crate::{address, mutation, ranking, route, PLUGIN_TYPE};

#[cfg(test)]
#[path = "plugin_test.rs"]
mod plugin_test;

/// The tree topology context: one per process, owning the switch forest and
/// the configuration it was resolved from.
///
/// The forest is single-writer/many-reader; mutating operations take
/// `&mut self` while queries share `&self`. The node directory passed to
/// each operation must stay read-locked (borrowed) for the duration of the
/// call, which the borrow checker enforces.
pub struct TreeTopology {
    config: TopologyConfig,
    source: Box<dyn SwitchConfigSource + Send + Sync>,
    forest: OnceCell<SwitchForest>,
    in_controller: bool,
}

impl TreeTopology {
    /// `in_controller` selects the controller-process contract: there the
    /// forest must be built before routing, and an empty forest at routing
    /// time aborts instead of being built late.
    pub fn new(
        config: TopologyConfig,
        source: Box<dyn SwitchConfigSource + Send + Sync>,
        in_controller: bool,
    ) -> Self {
        info!("{PLUGIN_TYPE} context created");
        Self { config, source, forest: OnceCell::new(), in_controller }
    }

    pub fn config(&self) -> &TopologyConfig {
        &self.config
    }

    /// The built forest, if any.
    pub fn forest(&self) -> Option<&SwitchForest> {
        self.forest.get()
    }

    fn forest_view(&self) -> &SwitchForest {
        self.forest.get().unwrap_or(&EMPTY_FOREST)
    }

    /// Builds the system topology after startup or reconfiguration. A no-op
    /// when no nodes are configured or the forest is already built.
    pub fn build_config(&self, dir: &NodeDirectory) -> Result<(), TopologyError> {
        if dir.is_empty() {
            return Ok(());
        }
        self.forest.get_or_try_init(|| {
            let definitions = self.source.switch_definitions()?;
            build_forest(&definitions, dir)
        })?;
        Ok(())
    }

    /// Drops the built forest; the next build starts from scratch.
    pub fn destroy_config(&mut self) {
        self.forest.take();
    }

    /// Adds `node` to the leaf named by `unit_path` and/or removes it from
    /// wherever else it is attached. See [`mutation::add_rm_node`].
    pub fn add_rm_node(
        &mut self,
        node: usize,
        unit_path: Option<&str>,
        dir: &NodeDirectory,
    ) -> Result<(), TopologyError> {
        match self.forest.get_mut() {
            Some(forest) => mutation::add_rm_node(forest, node, unit_path, dir),
            None => {
                // Nothing is built; a pure removal is a no-op and an add has
                // nowhere to anchor.
                let mut empty = SwitchForest::default();
                mutation::add_rm_node(&mut empty, node, unit_path, dir)
            }
        }
    }

    /// Ranks nodes by leaf switch when `topology_param` opts in; see
    /// [`ranking::generate_node_ranking`]. Runs on a transient forest and
    /// leaves the context untouched.
    pub fn generate_node_ranking(&self, dir: &mut NodeDirectory) -> bool {
        ranking::generate_node_ranking(&self.config, self.source.as_ref(), dir)
    }

    /// The dotted topology address and pattern of a node.
    pub fn get_node_addr(
        &self,
        node_name: &str,
        dir: &NodeDirectory,
    ) -> Result<(String, String), TopologyError> {
        address::get_node_addr(self.forest_view(), node_name, dir)
    }

    /// Expands `mask` to whole leaves in place.
    pub fn whole_topo(&self, mask: &mut Bitmap) {
        queries::whole_topo(self.forest_view(), mask);
    }

    /// Borrowed node bitmap of the named switch.
    pub fn get_bitmap(&self, name: &str) -> Option<&Bitmap> {
        self.forest_view().get_bitmap(name)
    }

    pub fn get(&self, kind: TopologyDataKind) -> TopologyData {
        queries::get(self.forest_view(), kind)
    }

    pub fn get_fragmentation(&self, node_mask: &Bitmap) -> u32 {
        queries::get_fragmentation(self.forest_view(), node_mask)
    }

    /// Splits a destination hostlist into per-subtree sub-lists and returns
    /// them with the estimated broadcast depth.
    ///
    /// A `tree_width` of 0 selects the configured default. Outside the
    /// controller the forest is built on first use, serialized across
    /// threads; inside the controller an unbuilt forest aborts.
    pub fn split_hostlist(
        &self,
        hostlist: &Hostlist,
        tree_width: u16,
        dir: &NodeDirectory,
    ) -> (Vec<Hostlist>, u32) {
        let tree_width = if tree_width == 0 { self.config.tree_width } else { tree_width };
        if !self.config.route_tree {
            return route::split_hostlist_treewidth(hostlist, tree_width);
        }
        let forest = self.routable_forest(dir);
        route::split_hostlist(forest, &self.config, hostlist, tree_width, dir)
    }

    fn routable_forest(&self, dir: &NodeDirectory) -> &SwitchForest {
        if self.in_controller && self.forest.get().map_or(true, SwitchForest::is_empty) {
            // The controller builds the forest during startup; getting here
            // without one is a programming error, not a recoverable state.
            panic!("split_hostlist: no switch records inside the controller");
        }
        self.forest
            .get_or_try_init(|| {
                let definitions = self.source.switch_definitions()?;
                build_forest(&definitions, dir)
            })
            .unwrap_or_else(|err| panic!("ROUTE: failed to build topology config: {err}"))
    }
}
