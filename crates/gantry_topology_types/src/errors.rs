use gantry_hostlist::HostlistError;
use thiserror::Error;

use crate::snapshot::DecodeError;

#[cfg(test)]
#[path = "errors_test.rs"]
mod errors_test;

/// Recoverable failures of the topology core. Contract violations that the
/// core cannot continue past (see the router) abort instead of returning one
/// of these.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TopologyError {
    #[error("Invalid topology configuration: {0}")]
    ConfigInvalid(String),
    #[error("Don't know where to add switch {name}.")]
    UnknownSwitch { name: String },
    #[error("{name} isn't a leaf switch.")]
    NonLeafTarget { name: String },
    #[error("Node {name} not found in configuration.")]
    NodeUnknown { name: String },
    #[error("Failed to decode topology snapshot: {0}")]
    Decode(#[from] DecodeError),
    #[error("Unsupported topology data request {kind}.")]
    UnsupportedQuery { kind: u16 },
}

impl From<HostlistError> for TopologyError {
    fn from(err: HostlistError) -> Self {
        TopologyError::ConfigInvalid(err.to_string())
    }
}
