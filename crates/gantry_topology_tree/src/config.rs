//! Configuration for the tree topology core.

use serde::{Deserialize, Serialize};
use validator::Validate;

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

/// Fan-out used when the caller does not pass a tree width of its own.
pub const DEFAULT_TREE_WIDTH: u16 = 16;

/// Knobs the surrounding process resolves from its configuration before
/// constructing the topology context. Nothing here is read from the
/// environment at call time.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq, Validate)]
pub struct TopologyConfig {
    /// Free-form topology option string (comma separated tokens, e.g.
    /// `SwitchAsNodeRank`).
    pub topology_param: String,
    /// Route broadcast traffic along the switch hierarchy. When false the
    /// router falls back to plain tree-width splitting.
    pub route_tree: bool,
    /// Emit per-sublist route debug lines.
    pub route_debug: bool,
    /// Default broadcast fan-out.
    #[validate(range(min = 2))]
    pub tree_width: u16,
}

impl Default for TopologyConfig {
    fn default() -> Self {
        Self {
            topology_param: String::new(),
            route_tree: true,
            route_debug: false,
            tree_width: DEFAULT_TREE_WIDTH,
        }
    }
}
