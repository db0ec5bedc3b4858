//! Hierarchical switch-topology core for the fabric scheduler.
//!
//! The compute fabric is modeled as a forest of switches with nodes attached
//! at the leaves. From that model this crate answers the questions that gate
//! placement and message dispatch: which nodes are topologically close to a
//! given set ([`queries::whole_topo`]), how a broadcast should be tiled into
//! per-subtree sub-lists ([`TreeTopology::split_hostlist`]), and what
//! hierarchical address a node carries ([`TreeTopology::get_node_addr`]).
//! Node add/remove events mutate the forest incrementally with membership
//! propagated up to the root ([`TreeTopology::add_rm_node`]).
//!
//! Configuration parsing stays outside: the forest is built from pre-parsed
//! definitions handed in through a [`validate::SwitchConfigSource`].

pub mod address;
pub mod config;
pub mod forest;
pub mod mutation;
pub mod print;
pub mod queries;
pub mod ranking;
pub mod route;
pub mod validate;

mod plugin;

pub use plugin::TreeTopology;

/// Plugin identity, for logs and dispatch tables.
pub const PLUGIN_TYPE: &str = "topology/tree";

/// A tree fabric carries no exclusive-topology semantics.
pub const SUPPORTS_EXCLUSIVE_TOPO: bool = false;

#[cfg(test)]
pub(crate) mod test_utils;
