//! Shared types for the fabric topology plugins: the fixed-width node
//! [`Bitmap`], the [`NodeDirectory`] resolving node names to dense indices,
//! the flat [`TopologySnapshot`] served over the wire, and the common
//! [`TopologyError`] kinds.

pub mod bitmap;
pub mod errors;
pub mod nodes;
pub mod snapshot;

pub use bitmap::Bitmap;
pub use errors::TopologyError;
pub use nodes::NodeDirectory;
pub use snapshot::{DecodeError, TopologyRecord, TopologySnapshot};
