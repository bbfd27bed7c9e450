//! Envelopes carried on the router's channels.
//!
//! Each envelope is created by one submit call, handled exactly once by the
//! consumer loop and then dropped. Operations other than plain messages carry
//! a [`Reply`] so the submitter can observe the handler's outcome.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::oneshot;

use crate::component::ComponentHandle;
use crate::error::RouterError;
use crate::ids::ComponentId;
use crate::snapshot::RouteSnapshot;

/// One-shot reply channel back to the submitter.
pub type Reply<T> = oneshot::Sender<Result<T, RouterError>>;

/// The router channel an envelope travels on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lane {
    Message,
    Route,
    Registration,
}

impl fmt::Display for Lane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Lane::Message => "message",
            Lane::Route => "route",
            Lane::Registration => "registration",
        };
        f.write_str(name)
    }
}

/// A payload emitted by a source component.
#[derive(Debug)]
pub struct MessageEnvelope<P> {
    pub source: ComponentId,
    pub payload: P,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteOpKind {
    Add,
    Remove,
    List,
}

/// A routing-table operation.
#[derive(Debug)]
pub enum RouteEnvelope {
    Add {
        source: ComponentId,
        destination: ComponentId,
        reply: Reply<()>,
    },
    Remove {
        source: ComponentId,
        destination: ComponentId,
        reply: Reply<()>,
    },
    List {
        reply: Reply<RouteSnapshot>,
    },
}

impl RouteEnvelope {
    pub fn kind(&self) -> RouteOpKind {
        match self {
            RouteEnvelope::Add { .. } => RouteOpKind::Add,
            RouteEnvelope::Remove { .. } => RouteOpKind::Remove,
            RouteEnvelope::List { .. } => RouteOpKind::List,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationOpKind {
    Register,
    Unregister,
}

/// A registry operation. Both kinds reply with the affected identity.
#[derive(Debug)]
pub enum RegistrationEnvelope<P> {
    Register {
        component: ComponentHandle<P>,
        reply: Reply<ComponentId>,
    },
    Unregister {
        component: ComponentHandle<P>,
        reply: Reply<ComponentId>,
    },
}

impl<P> RegistrationEnvelope<P> {
    pub fn kind(&self) -> RegistrationOpKind {
        match self {
            RegistrationEnvelope::Register { .. } => RegistrationOpKind::Register,
            RegistrationEnvelope::Unregister { .. } => RegistrationOpKind::Unregister,
        }
    }
}

/// Any unit of work submitted to the router.
#[derive(Debug)]
pub enum Envelope<P> {
    Message(MessageEnvelope<P>),
    Route(RouteEnvelope),
    Registration(RegistrationEnvelope<P>),
}

impl<P> Envelope<P> {
    /// The lane this envelope is submitted on.
    pub fn lane(&self) -> Lane {
        match self {
            Envelope::Message(_) => Lane::Message,
            Envelope::Route(_) => Lane::Route,
            Envelope::Registration(_) => Lane::Registration,
        }
    }
}
