//! Compressed host expressions for the cluster fabric.
//!
//! A host expression names a set of hosts in the compact bracketed form used
//! throughout cluster configuration and tooling, e.g. `node[1-3,7]` for
//! `node1,node2,node3,node7`. [`Hostlist`] is an ordered list of host names
//! that can be parsed from and rendered back to this form; [`HostSet`] is the
//! deduplicated variant used for membership queries.

mod hostlist;

pub use hostlist::{HostSet, Hostlist, HostlistError};
