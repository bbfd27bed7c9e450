//! Components and helpers shared by the router integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use relay_router::Router;
use relay_types::{Component, ComponentError, ComponentId, IdentityCell, RouteSnapshot};

/// Records every payload it is sent.
pub struct RecordingComponent<P> {
    identity: IdentityCell,
    received: Mutex<Vec<P>>,
}

impl<P: Clone + Send + 'static> RecordingComponent<P> {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            identity: IdentityCell::new(),
            received: Mutex::new(Vec::new()),
        })
    }

    pub fn received(&self) -> Vec<P> {
        self.received.lock().clone()
    }
}

#[async_trait]
impl<P: Clone + Send + 'static> Component<P> for RecordingComponent<P> {
    async fn send(&self, payload: P) -> Result<(), ComponentError> {
        self.received.lock().push(payload);
        Ok(())
    }

    fn id(&self) -> Option<ComponentId> {
        self.identity.get()
    }

    fn set_id(&self, id: ComponentId) -> Result<(), ComponentError> {
        self.identity.set(id);
        Ok(())
    }
}

/// Accepts an identity but fails every delivery.
pub struct FailingComponent {
    identity: IdentityCell,
}

impl FailingComponent {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            identity: IdentityCell::new(),
        })
    }
}

#[async_trait]
impl<P: Send + 'static> Component<P> for FailingComponent {
    async fn send(&self, _payload: P) -> Result<(), ComponentError> {
        Err(ComponentError::Failed("downstream unavailable".into()))
    }

    fn id(&self) -> Option<ComponentId> {
        self.identity.get()
    }

    fn set_id(&self, id: ComponentId) -> Result<(), ComponentError> {
        self.identity.set(id);
        Ok(())
    }
}

/// Refuses any identity the router assigns.
pub struct RejectingComponent;

#[async_trait]
impl<P: Send + 'static> Component<P> for RejectingComponent {
    async fn send(&self, _payload: P) -> Result<(), ComponentError> {
        Ok(())
    }

    fn id(&self) -> Option<ComponentId> {
        None
    }

    fn set_id(&self, _id: ComponentId) -> Result<(), ComponentError> {
        Err(ComponentError::Identity("identity is fixed".into()))
    }
}

/// Wait until every envelope submitted before this call has been handled.
///
/// Only a true barrier for totally ordered routers.
pub async fn settle<P: Clone + Send + 'static>(router: &Router<P>) -> RouteSnapshot {
    router.list_routes().unwrap().await.unwrap()
}
