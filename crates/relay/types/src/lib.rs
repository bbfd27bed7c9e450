//! Relay shared types.
//!
//! Everything that crosses the boundary between producers, the router's
//! consumer loop and the components it delivers to:
//!
//! - [`ComponentId`] and the [`IdGenerator`] collaborator that mints them
//! - the [`Component`] capability trait and the non-owning [`ComponentHandle`]
//! - the three envelope shapes carried on the router's channels
//! - the [`RouteSnapshot`] diagnostic view
//! - the error taxonomy shared by all of the above

pub mod component;
pub mod envelope;
pub mod error;
pub mod ids;
pub mod snapshot;

pub use component::{ChannelComponent, Component, ComponentHandle, IdentityCell};
pub use envelope::{
    Envelope, Lane, MessageEnvelope, RegistrationEnvelope, RegistrationOpKind, Reply,
    RouteEnvelope, RouteOpKind,
};
pub use error::{ComponentError, IdentityError, RouterError};
pub use ids::{ComponentId, IdGenerator, SequentialIdGenerator, UuidIdGenerator};
pub use snapshot::{RouteEntry, RouteSnapshot, RouteTarget};
