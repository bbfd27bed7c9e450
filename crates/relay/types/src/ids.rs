//! Component identity and the generators that mint it.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::IdentityError;

/// Unique identifier assigned to a component when it is registered.
///
/// Identifiers are never reused: a component that is unregistered and
/// registered again receives a fresh one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ComponentId(Uuid);

impl ComponentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_u128(value: u128) -> Self {
        Self(Uuid::from_u128(value))
    }
}

impl Default for ComponentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "component:{}", self.0)
    }
}

/// Source of fresh component identifiers.
///
/// The generator is owned by the router's consumer loop, so implementations
/// get `&mut self` and need no synchronization of their own.
pub trait IdGenerator: Send + 'static {
    fn next_id(&mut self) -> Result<ComponentId, IdentityError>;
}

/// Random (v4) identifiers. The default generator.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidIdGenerator;

impl IdGenerator for UuidIdGenerator {
    fn next_id(&mut self) -> Result<ComponentId, IdentityError> {
        Ok(ComponentId::new())
    }
}

/// Deterministic identifiers counting up from a starting value.
///
/// Useful when tests or tooling need to know ids before registration
/// completes.
#[derive(Debug, Clone)]
pub struct SequentialIdGenerator {
    next: Option<u128>,
}

impl SequentialIdGenerator {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    pub fn starting_at(first: u128) -> Self {
        Self { next: Some(first) }
    }
}

impl Default for SequentialIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn next_id(&mut self) -> Result<ComponentId, IdentityError> {
        let current = self.next.ok_or(IdentityError::Exhausted)?;
        self.next = current.checked_add(1);
        Ok(ComponentId::from_u128(current))
    }
}
