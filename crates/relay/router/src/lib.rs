//! Relay router core.
//!
//! A [`Router`] accepts message, route and registration operations from any
//! number of producers and hands them to a single [`ConsumerLoop`], which
//! owns the component registry and the routing table outright. Producers
//! never block: a full channel is reported as
//! [`RouterError::ChannelFull`](relay_types::RouterError::ChannelFull).
//!
//! ```no_run
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! use relay_router::{Router, RouterConfig};
//! use relay_types::ChannelComponent;
//!
//! let (router, _task) = Router::<String>::spawn(&RouterConfig::default())?;
//! let (producer, _) = ChannelComponent::<String>::new(16);
//! let (sink, mut inbox) = ChannelComponent::<String>::new(16);
//!
//! let producer_id = router.register(&producer)?.await?;
//! let sink_id = router.register(&sink)?.await?;
//! router.add_route(producer_id, sink_id)?.await?;
//!
//! router.send(producer_id, "hello".to_string())?;
//! assert_eq!(inbox.recv().await.as_deref(), Some("hello"));
//! # Ok(())
//! # }
//! ```

pub mod ack;
pub mod config;
pub mod consumer;
pub mod error;
pub mod fanout;
pub mod metrics;
pub mod registry;
pub mod router;
pub mod table;

pub use ack::Ack;
pub use config::{
    ChannelConfig, DuplicatePolicy, LoggingConfig, OrderingMode, RouterConfig, RoutingConfig,
};
pub use consumer::ConsumerLoop;
pub use error::ConfigError;
pub use fanout::FanoutReport;
pub use metrics::{MetricsSnapshot, RouterMetrics};
pub use registry::ComponentRegistry;
pub use router::Router;
pub use table::{Destination, RoutingTable};
