//! The consumer loop: sole owner and mutator of router state.
//!
//! Every registry and routing-table access happens inside [`ConsumerLoop`]
//! handlers, one envelope at a time, so that state needs no locks. Producers
//! only ever reach it through the submit channels.

use std::fmt;
use std::sync::Arc;

use relay_types::{
    ComponentHandle, ComponentId, Envelope, IdGenerator, MessageEnvelope, RegistrationEnvelope,
    Reply, RouteEnvelope, RouterError,
};
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

use crate::config::RoutingConfig;
use crate::fanout;
use crate::metrics::{MetricsSnapshot, RouterMetrics};
use crate::registry::ComponentRegistry;
use crate::table::{Destination, RoutingTable};

/// Receiving ends of the submit channels.
pub(crate) enum Inbound<P> {
    PerLane {
        messages: mpsc::Receiver<Envelope<P>>,
        routes: mpsc::Receiver<Envelope<P>>,
        registrations: mpsc::Receiver<Envelope<P>>,
    },
    Total(mpsc::Receiver<Envelope<P>>),
}

impl<P> Inbound<P> {
    /// Next ready envelope from any lane, or `None` once every lane is closed
    /// and drained. Lanes are polled in random order for fairness.
    async fn next(&mut self) -> Option<Envelope<P>> {
        match self {
            Inbound::Total(rx) => rx.recv().await,
            Inbound::PerLane {
                messages,
                routes,
                registrations,
            } => {
                tokio::select! {
                    Some(envelope) = registrations.recv() => Some(envelope),
                    Some(envelope) = routes.recv() => Some(envelope),
                    Some(envelope) = messages.recv() => Some(envelope),
                    else => None,
                }
            }
        }
    }
}

/// Serializes every router operation.
///
/// Obtained from [`Router::new`](crate::Router::new); drive it by awaiting
/// [`ConsumerLoop::run`], normally on its own task.
pub struct ConsumerLoop<P> {
    inbound: Inbound<P>,
    registry: ComponentRegistry<P>,
    table: RoutingTable<P>,
    ids: Box<dyn IdGenerator>,
    config: RoutingConfig,
    metrics: Arc<RouterMetrics>,
}

impl<P> ConsumerLoop<P>
where
    P: Clone + Send + 'static,
{
    pub(crate) fn new(
        inbound: Inbound<P>,
        ids: Box<dyn IdGenerator>,
        config: RoutingConfig,
        metrics: Arc<RouterMetrics>,
    ) -> Self {
        Self {
            inbound,
            registry: ComponentRegistry::new(),
            table: RoutingTable::new(),
            ids,
            config,
            metrics,
        }
    }

    /// Handle envelopes until every [`Router`](crate::Router) clone has been
    /// dropped, then return the final counters.
    pub async fn run(mut self) -> MetricsSnapshot {
        info!(
            scrub_on_unregister = self.config.scrub_on_unregister,
            duplicates = ?self.config.duplicates,
            "Router consumer loop started"
        );

        while let Some(envelope) = self.inbound.next().await {
            self.handle(envelope).await;
        }

        if !self.registry.is_empty() {
            debug!(
                registered = self.registry.len(),
                "Components still registered at shutdown"
            );
        }
        info!(
            registered = self.registry.len(),
            sources = self.table.source_count(),
            "Router inputs closed, consumer loop stopped"
        );
        self.metrics.snapshot()
    }

    async fn handle(&mut self, envelope: Envelope<P>) {
        match envelope {
            Envelope::Message(message) => self.dispatch(message).await,
            Envelope::Route(route) => self.handle_route(route),
            Envelope::Registration(registration) => self.handle_registration(registration),
        }
    }

    fn handle_registration(&mut self, envelope: RegistrationEnvelope<P>) {
        let kind = envelope.kind();
        match envelope {
            RegistrationEnvelope::Register { component, reply } => {
                let result = self.register(component);
                self.settle(kind, result, reply);
            }
            RegistrationEnvelope::Unregister { component, reply } => {
                let result = self.unregister(component);
                self.settle(kind, result, reply);
            }
        }
    }

    fn handle_route(&mut self, envelope: RouteEnvelope) {
        let kind = envelope.kind();
        match envelope {
            RouteEnvelope::Add {
                source,
                destination,
                reply,
            } => {
                let result = self.add_route(source, destination);
                self.settle(kind, result, reply);
            }
            RouteEnvelope::Remove {
                source,
                destination,
                reply,
            } => {
                let result = self.remove_route(source, destination);
                self.settle(kind, result, reply);
            }
            RouteEnvelope::List { reply } => {
                let snapshot = self.table.snapshot(&self.registry);
                self.settle(kind, Ok(snapshot), reply);
            }
        }
    }

    /// Log and count a failed operation, then hand the outcome back.
    fn settle<K, T>(&self, operation: K, result: Result<T, RouterError>, reply: Reply<T>)
    where
        K: fmt::Debug,
    {
        if let Err(error) = &result {
            self.metrics.operation_failed();
            warn!(operation = ?operation, error = %error, "Router operation failed");
        }
        if reply.send(result).is_err() {
            trace!(operation = ?operation, "Acknowledgement dropped by submitter");
        }
    }

    fn register(&mut self, handle: ComponentHandle<P>) -> Result<ComponentId, RouterError> {
        let component = handle.upgrade().ok_or(RouterError::ComponentDropped)?;

        if let Some(id) = component.id() {
            if self.registry.holds(&id, &handle) {
                debug!(component = %id, "Component already registered");
                return Ok(id);
            }
        }

        let id = self.ids.next_id()?;
        component.set_id(id)?;
        self.registry.insert(id, handle);
        self.metrics.registered();

        info!(
            component = %id,
            registered = self.registry.len(),
            "Component registered"
        );
        Ok(id)
    }

    fn unregister(&mut self, handle: ComponentHandle<P>) -> Result<ComponentId, RouterError> {
        let id = match handle.upgrade() {
            Some(component) => component.id().ok_or(RouterError::Unassigned)?,
            None => self
                .registry
                .find(&handle)
                .ok_or(RouterError::ComponentDropped)?,
        };

        if !self.registry.holds(&id, &handle) {
            return Err(RouterError::NotRegistered(id));
        }
        self.registry.remove(&id);
        self.metrics.unregistered();

        if self.config.scrub_on_unregister {
            let removed = self.table.scrub(&id, &handle);
            debug!(component = %id, removed, "Routes scrubbed");
        }

        info!(
            component = %id,
            registered = self.registry.len(),
            "Component unregistered"
        );
        Ok(id)
    }

    fn add_route(
        &mut self,
        source: ComponentId,
        destination: ComponentId,
    ) -> Result<(), RouterError> {
        if !self.registry.contains(&source) {
            return Err(RouterError::NotRegistered(source));
        }
        let handle = self
            .registry
            .get(&destination)
            .cloned()
            .ok_or(RouterError::NotRegistered(destination))?;

        let added = self.table.add(
            source,
            Destination {
                id: destination,
                handle,
            },
            self.config.duplicates,
        );

        if added {
            self.metrics.route_changed();
            info!(source = %source, destination = %destination, "Route added");
        } else {
            debug!(source = %source, destination = %destination, "Duplicate route ignored");
        }
        Ok(())
    }

    fn remove_route(
        &mut self,
        source: ComponentId,
        destination: ComponentId,
    ) -> Result<(), RouterError> {
        if !self.registry.contains(&source) {
            return Err(RouterError::NotRegistered(source));
        }

        let removed = match self.registry.get(&destination) {
            Some(handle) => self.table.remove(&source, handle),
            // Stale routes to an unregistered destination can still be
            // cleaned out by id.
            None => match self.table.remove_by_id(&source, &destination) {
                0 => return Err(RouterError::NotRegistered(destination)),
                n => n,
            },
        };

        if removed > 0 {
            self.metrics.route_changed();
            info!(source = %source, destination = %destination, removed, "Route removed");
        } else {
            debug!(source = %source, destination = %destination, "No matching route to remove");
        }
        Ok(())
    }

    async fn dispatch(&mut self, envelope: MessageEnvelope<P>) {
        let MessageEnvelope { source, payload } = envelope;

        if !self.registry.contains(&source) {
            debug!(source = %source, "Dropping message from unregistered source");
            self.metrics.message_dropped();
            return;
        }

        let destinations = self.table.destinations(&source);
        if destinations.is_empty() {
            debug!(source = %source, "No routes for source, dropping message");
            self.metrics.message_dropped();
            return;
        }

        let concurrent = self.config.concurrent_fanout;
        let report = fanout::deliver(source, destinations, payload, concurrent).await;

        self.metrics.message_dispatched();
        self.metrics.delivered(report.delivered, report.failed);
        trace!(
            source = %source,
            delivered = report.delivered,
            failed = report.failed,
            "Message dispatched"
        );
    }
}
