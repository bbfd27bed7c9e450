use thiserror::Error;

use crate::envelope::Lane;
use crate::ids::ComponentId;

/// Errors surfaced by the router, either synchronously from a submit call or
/// through an acknowledgement once the consumer loop has handled the envelope.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RouterError {
    /// The lane's bounded channel is at capacity. Transient; retry later.
    #[error("router busy: {lane} channel full")]
    ChannelFull { lane: Lane },

    /// The consumer loop is gone and no longer accepts envelopes.
    #[error("router stopped: {lane} channel closed")]
    Closed { lane: Lane },

    #[error("component not registered: no identity assigned")]
    Unassigned,

    #[error("component not registered: {0}")]
    NotRegistered(ComponentId),

    /// The owner dropped the component before the router handled it.
    #[error("component dropped before the router handled it")]
    ComponentDropped,

    #[error("identity generation failed: {0}")]
    Identity(#[from] IdentityError),

    #[error("component rejected operation: {0}")]
    Component(#[from] ComponentError),

    /// The consumer loop went away without replying.
    #[error("acknowledgement dropped before the router replied")]
    AckDropped,
}

/// Errors reported by a component's capability surface.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ComponentError {
    #[error("component inbox full")]
    Full,

    #[error("component inbox closed")]
    Closed,

    #[error("identity rejected: {0}")]
    Identity(String),

    #[error("{0}")]
    Failed(String),
}

/// Errors from the identity-generation collaborator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    #[error("identity space exhausted")]
    Exhausted,

    #[error("{0}")]
    Failed(String),
}
