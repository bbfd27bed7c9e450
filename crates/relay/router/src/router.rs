//! The submit side of the router.

use std::sync::Arc;

use relay_types::{
    Component, ComponentHandle, ComponentId, Envelope, IdGenerator, Lane, MessageEnvelope,
    RegistrationEnvelope, RouteEnvelope, RouteSnapshot, RouterError, UuidIdGenerator,
};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::ack::Ack;
use crate::config::{OrderingMode, RouterConfig};
use crate::consumer::{ConsumerLoop, Inbound};
use crate::error::ConfigError;
use crate::metrics::{MetricsSnapshot, RouterMetrics};

/// Cloneable handle for submitting work to a router.
///
/// Every operation is non-blocking: it either enqueues an envelope or fails
/// immediately with [`RouterError::ChannelFull`] or [`RouterError::Closed`].
/// Non-message operations return an [`Ack`] that resolves once the consumer
/// loop has applied them.
///
/// The consumer loop stops after the last clone is dropped.
pub struct Router<P> {
    messages: mpsc::Sender<Envelope<P>>,
    routes: mpsc::Sender<Envelope<P>>,
    registrations: mpsc::Sender<Envelope<P>>,
    metrics: Arc<RouterMetrics>,
}

impl<P> Clone for Router<P> {
    fn clone(&self) -> Self {
        Self {
            messages: self.messages.clone(),
            routes: self.routes.clone(),
            registrations: self.registrations.clone(),
            metrics: Arc::clone(&self.metrics),
        }
    }
}

impl<P> Router<P>
where
    P: Clone + Send + 'static,
{
    /// Create a router and its (not yet running) consumer loop, minting
    /// random identities.
    pub fn new(config: &RouterConfig) -> Result<(Self, ConsumerLoop<P>), ConfigError> {
        Self::with_id_generator(config, Box::new(UuidIdGenerator))
    }

    pub fn with_id_generator(
        config: &RouterConfig,
        ids: Box<dyn IdGenerator>,
    ) -> Result<(Self, ConsumerLoop<P>), ConfigError> {
        config.validate()?;
        let capacity = config.channels.capacity;

        let (senders, inbound) = match config.channels.ordering {
            OrderingMode::PerLane => {
                let (messages, messages_rx) = mpsc::channel(capacity);
                let (routes, routes_rx) = mpsc::channel(capacity);
                let (registrations, registrations_rx) = mpsc::channel(capacity);
                let inbound = Inbound::PerLane {
                    messages: messages_rx,
                    routes: routes_rx,
                    registrations: registrations_rx,
                };
                ((messages, routes, registrations), inbound)
            }
            OrderingMode::Total => {
                let (tx, rx) = mpsc::channel(capacity);
                ((tx.clone(), tx.clone(), tx), Inbound::Total(rx))
            }
        };

        let metrics = Arc::new(RouterMetrics::new());
        let (messages, routes, registrations) = senders;
        let consumer = ConsumerLoop::new(
            inbound,
            ids,
            config.routing.clone(),
            Arc::clone(&metrics),
        );

        info!(
            capacity,
            ordering = ?config.channels.ordering,
            "Router created"
        );

        Ok((
            Self {
                messages,
                routes,
                registrations,
                metrics,
            },
            consumer,
        ))
    }

    /// Create a router and run its consumer loop on a new tokio task.
    ///
    /// The task finishes with the final counters once every router clone
    /// has been dropped.
    pub fn spawn(
        config: &RouterConfig,
    ) -> Result<(Self, JoinHandle<MetricsSnapshot>), ConfigError> {
        let (router, consumer) = Self::new(config)?;
        let task = tokio::spawn(consumer.run());
        Ok((router, task))
    }

    /// Submit a message from `source` for fan-out to its routes.
    ///
    /// Success means only that the message was queued; delivery is
    /// best-effort and never reported back.
    pub fn send(&self, source: ComponentId, payload: P) -> Result<(), RouterError> {
        self.submit(Envelope::Message(MessageEnvelope { source, payload }))
    }

    /// Register a component, assigning it an identity unless it is already
    /// registered.
    pub fn register<C>(&self, component: &Arc<C>) -> Result<Ack<ComponentId>, RouterError>
    where
        C: Component<P> + 'static,
    {
        self.register_handle(ComponentHandle::new(component))
    }

    pub fn register_handle(
        &self,
        component: ComponentHandle<P>,
    ) -> Result<Ack<ComponentId>, RouterError> {
        let (reply, ack) = Ack::channel();
        self.submit(Envelope::Registration(RegistrationEnvelope::Register {
            component,
            reply,
        }))?;
        Ok(ack)
    }

    /// Remove a component from the registry. Routes that mention it stay in
    /// place unless `routing.scrub_on_unregister` is set.
    pub fn unregister<C>(&self, component: &Arc<C>) -> Result<Ack<ComponentId>, RouterError>
    where
        C: Component<P> + 'static,
    {
        self.unregister_handle(ComponentHandle::new(component))
    }

    pub fn unregister_handle(
        &self,
        component: ComponentHandle<P>,
    ) -> Result<Ack<ComponentId>, RouterError> {
        let (reply, ack) = Ack::channel();
        self.submit(Envelope::Registration(RegistrationEnvelope::Unregister {
            component,
            reply,
        }))?;
        Ok(ack)
    }

    /// Route messages from `source` to `destination`. Both must be
    /// registered when the operation is handled.
    pub fn add_route(
        &self,
        source: ComponentId,
        destination: ComponentId,
    ) -> Result<Ack<()>, RouterError> {
        let (reply, ack) = Ack::channel();
        self.submit(Envelope::Route(RouteEnvelope::Add {
            source,
            destination,
            reply,
        }))?;
        Ok(ack)
    }

    /// Drop every route from `source` to `destination`.
    pub fn remove_route(
        &self,
        source: ComponentId,
        destination: ComponentId,
    ) -> Result<Ack<()>, RouterError> {
        let (reply, ack) = Ack::channel();
        self.submit(Envelope::Route(RouteEnvelope::Remove {
            source,
            destination,
            reply,
        }))?;
        Ok(ack)
    }

    /// Snapshot of the routing table as of the moment the request is handled.
    pub fn list_routes(&self) -> Result<Ack<RouteSnapshot>, RouterError> {
        let (reply, ack) = Ack::channel();
        self.submit(Envelope::Route(RouteEnvelope::List { reply }))?;
        Ok(ack)
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    fn submit(&self, envelope: Envelope<P>) -> Result<(), RouterError> {
        let lane = envelope.lane();
        let sender = match lane {
            Lane::Message => &self.messages,
            Lane::Route => &self.routes,
            Lane::Registration => &self.registrations,
        };

        match sender.try_send(envelope) {
            Ok(()) => {
                self.metrics.submitted();
                Ok(())
            }
            Err(TrySendError::Full(_)) => {
                self.metrics.rejected_full();
                warn!(lane = %lane, "Router channel full, submission rejected");
                Err(RouterError::ChannelFull { lane })
            }
            Err(TrySendError::Closed(_)) => Err(RouterError::Closed { lane }),
        }
    }
}
