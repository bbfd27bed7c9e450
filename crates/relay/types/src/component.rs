//! The component capability surface and the router's handle onto it.

use std::fmt;
use std::sync::{Arc, Weak};

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::sync::mpsc;

use crate::error::ComponentError;
use crate::ids::ComponentId;

/// Anything the router can deliver payloads to.
///
/// Implementations own their buffering: `send` should hand the payload off
/// quickly (typically a bounded, non-blocking push into the component's own
/// inbox) because the router awaits it before handling its next envelope.
///
/// Identity is assigned by the router at registration time through
/// [`Component::set_id`]; the component only stores it.
#[async_trait]
pub trait Component<P>: Send + Sync
where
    P: Send + 'static,
{
    /// Deliver one payload.
    async fn send(&self, payload: P) -> Result<(), ComponentError>;

    /// The identity currently assigned, if any.
    fn id(&self) -> Option<ComponentId>;

    /// Store the identity assigned by the router.
    fn set_id(&self, id: ComponentId) -> Result<(), ComponentError>;
}

/// Interior-mutable identity slot for component implementations.
#[derive(Debug, Default)]
pub struct IdentityCell {
    id: RwLock<Option<ComponentId>>,
}

impl IdentityCell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<ComponentId> {
        *self.id.read()
    }

    pub fn set(&self, id: ComponentId) {
        *self.id.write() = Some(id);
    }
}

/// Mailbox component backed by a bounded tokio channel.
///
/// `send` never waits: a full inbox is reported as [`ComponentError::Full`]
/// and a dropped receiver as [`ComponentError::Closed`].
pub struct ChannelComponent<P> {
    identity: IdentityCell,
    inbox: mpsc::Sender<P>,
}

impl<P: Send + 'static> ChannelComponent<P> {
    /// Create a component and the receiving end of its inbox.
    pub fn new(capacity: usize) -> (Arc<Self>, mpsc::Receiver<P>) {
        let (inbox, receiver) = mpsc::channel(capacity);
        (Self::with_sender(inbox), receiver)
    }

    /// Wrap an existing inbox sender.
    pub fn with_sender(inbox: mpsc::Sender<P>) -> Arc<Self> {
        Arc::new(Self {
            identity: IdentityCell::new(),
            inbox,
        })
    }
}

#[async_trait]
impl<P: Send + 'static> Component<P> for ChannelComponent<P> {
    async fn send(&self, payload: P) -> Result<(), ComponentError> {
        self.inbox.try_send(payload).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => ComponentError::Full,
            mpsc::error::TrySendError::Closed(_) => ComponentError::Closed,
        })
    }

    fn id(&self) -> Option<ComponentId> {
        self.identity.get()
    }

    fn set_id(&self, id: ComponentId) -> Result<(), ComponentError> {
        self.identity.set(id);
        Ok(())
    }
}

/// Non-owning reference to a registered component.
///
/// The router keeps only these: a component lives exactly as long as its
/// owner keeps an `Arc` to it. Two handles are equal when they point at the
/// same component allocation.
pub struct ComponentHandle<P> {
    inner: Weak<dyn Component<P>>,
    addr: usize,
}

impl<P: Send + 'static> ComponentHandle<P> {
    pub fn new<C>(component: &Arc<C>) -> Self
    where
        C: Component<P> + 'static,
    {
        let addr = Arc::as_ptr(component) as *const () as usize;
        let weak: Weak<C> = Arc::downgrade(component);
        let inner: Weak<dyn Component<P>> = weak;
        Self { inner, addr }
    }

    pub fn from_dyn(component: &Arc<dyn Component<P>>) -> Self {
        let addr = Arc::as_ptr(component) as *const () as usize;
        Self {
            inner: Arc::downgrade(component),
            addr,
        }
    }

    /// A strong reference, if the owner still holds the component.
    pub fn upgrade(&self) -> Option<Arc<dyn Component<P>>> {
        self.inner.upgrade()
    }

    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }

    /// The identity the component currently reports.
    pub fn id(&self) -> Option<ComponentId> {
        self.upgrade().and_then(|c| c.id())
    }

    pub fn same_component(&self, other: &Self) -> bool {
        self.addr == other.addr
    }
}

impl<P> Clone for ComponentHandle<P> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            addr: self.addr,
        }
    }
}

impl<P> PartialEq for ComponentHandle<P> {
    fn eq(&self, other: &Self) -> bool {
        self.addr == other.addr
    }
}

impl<P> Eq for ComponentHandle<P> {}

impl<P> fmt::Debug for ComponentHandle<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentHandle")
            .field("addr", &format_args!("{:#x}", self.addr))
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}
