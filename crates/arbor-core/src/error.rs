use thiserror::Error;

use crate::router::Slot;

/// Raised by a builder that cannot assemble its node.
///
/// Both variants are programmer errors: the parent scope chain or the
/// caller's arguments do not satisfy what the node kind declares it needs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("{node}: required capability `{capability}` is not provided by the scope chain")]
    MissingCapability {
        node: &'static str,
        capability: &'static str,
    },
    #[error("{node}: invalid argument: {reason}")]
    InvalidArgument { node: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("slot `{slot}` is already occupied; detach it first")]
    SlotOccupied { slot: Slot },
    #[error(transparent)]
    Build(#[from] BuildError),
    #[error("child attached at `{slot}` failed to activate")]
    Activation {
        slot: Slot,
        #[source]
        source: Box<RouteError>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("the tree already has a launched root")]
    AlreadyLaunched,
    #[error("the tree has no launched root")]
    NotLaunched,
    #[error("no node at path `{path}`")]
    NoSuchNode { path: String },
    #[error("node at `{path}` expects events of type {expected}")]
    EventTypeMismatch { path: String, expected: &'static str },
    #[error(transparent)]
    Route(#[from] RouteError),
}
