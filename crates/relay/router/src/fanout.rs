//! Best-effort delivery of one payload to every destination of a source.

use std::sync::Arc;

use futures::future::join_all;
use relay_types::{Component, ComponentError, ComponentId};
use tracing::warn;

use crate::table::Destination;

/// Delivery counts for one dispatched message.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FanoutReport {
    pub delivered: u64,
    pub failed: u64,
}

impl FanoutReport {
    fn record(
        &mut self,
        source: ComponentId,
        destination: ComponentId,
        result: Result<(), ComponentError>,
    ) {
        match result {
            Ok(()) => self.delivered += 1,
            Err(error) => {
                warn!(
                    source = %source,
                    destination = %destination,
                    error = %error,
                    "Delivery failed"
                );
                self.failed += 1;
            }
        }
    }
}

/// Send `payload` to each destination. A failing or dropped destination never
/// prevents delivery to the others.
pub async fn deliver<P>(
    source: ComponentId,
    destinations: &[Destination<P>],
    payload: P,
    concurrent: bool,
) -> FanoutReport
where
    P: Clone + Send + 'static,
{
    let mut report = FanoutReport::default();
    let mut targets: Vec<(ComponentId, Arc<dyn Component<P>>)> =
        Vec::with_capacity(destinations.len());

    for destination in destinations {
        match destination.handle.upgrade() {
            Some(component) => targets.push((destination.id, component)),
            None => {
                warn!(
                    source = %source,
                    destination = %destination.id,
                    "Destination dropped by its owner, skipping"
                );
                report.failed += 1;
            }
        }
    }

    if concurrent {
        let sends = targets.iter().map(|(id, component)| {
            let payload = payload.clone();
            async move { (*id, component.send(payload).await) }
        });
        for (destination, result) in join_all(sends).await {
            report.record(source, destination, result);
        }
    } else {
        for (destination, component) in &targets {
            let result = component.send(payload.clone()).await;
            report.record(source, *destination, result);
        }
    }

    report
}
