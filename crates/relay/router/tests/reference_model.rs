//! Property tests: random operation sequences against a plain in-memory model.
//!
//! The router runs totally ordered and every acknowledgement is awaited
//! before the next operation, so its replies, final routing table and
//! delivery counts must match the model exactly. Both unregister behaviors
//! are covered: stale routes left in place, and routes scrubbed.

mod common;

use std::collections::BTreeSet;
use std::sync::Arc;

use common::{settle, RecordingComponent};
use proptest::prelude::*;
use relay_router::{Router, RouterConfig};
use relay_types::{ComponentId, RouterError};

const POOL: usize = 4;

#[derive(Debug, Clone)]
enum Op {
    Register(usize),
    Unregister(usize),
    AddRoute(usize, usize),
    RemoveRoute(usize, usize),
    Send(usize),
}

fn arb_op() -> impl Strategy<Value = Op> {
    let idx = 0..POOL;
    prop_oneof![
        3 => idx.clone().prop_map(Op::Register),
        1 => idx.clone().prop_map(Op::Unregister),
        3 => (idx.clone(), idx.clone()).prop_map(|(s, d)| Op::AddRoute(s, d)),
        1 => (idx.clone(), idx.clone()).prop_map(|(s, d)| Op::RemoveRoute(s, d)),
        3 => idx.prop_map(Op::Send),
    ]
}

/// One table edge: the source id it is filed under, and the destination as
/// a pool index plus the id it had when the route was added.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Edge {
    source: ComponentId,
    dest: usize,
    dest_id: ComponentId,
}

#[derive(Default)]
struct Model {
    scrub: bool,
    /// Last identity handed to each component, kept after unregistration.
    assigned: [Option<ComponentId>; POOL],
    registered: [bool; POOL],
    /// Edges in insertion order.
    routes: Vec<Edge>,
    expected: [usize; POOL],
}

impl Model {
    /// The id a request for component `i` carries; unassigned components get
    /// an id nothing will ever be registered under.
    fn id_of(&self, i: usize) -> ComponentId {
        self.assigned[i].unwrap_or(ComponentId::from_u128(u128::MAX - i as u128))
    }

    fn require(&self, i: usize) -> Result<(), RouterError> {
        if self.registered[i] {
            Ok(())
        } else {
            Err(RouterError::NotRegistered(self.id_of(i)))
        }
    }

    fn is_current(&self, edge: &Edge) -> bool {
        self.registered[edge.dest] && self.assigned[edge.dest] == Some(edge.dest_id)
    }

    fn unregister(&mut self, i: usize) -> Result<ComponentId, RouterError> {
        let id = self.assigned[i].ok_or(RouterError::Unassigned)?;
        if !self.registered[i] {
            return Err(RouterError::NotRegistered(id));
        }
        self.registered[i] = false;
        if self.scrub {
            self.routes
                .retain(|e| e.source != id && e.dest != i && e.dest_id != id);
        }
        Ok(id)
    }

    fn add_route(&mut self, s: usize, d: usize) -> Result<(), RouterError> {
        self.require(s)?;
        self.require(d)?;
        self.routes.push(Edge {
            source: self.id_of(s),
            dest: d,
            dest_id: self.id_of(d),
        });
        Ok(())
    }

    fn remove_route(&mut self, s: usize, d: usize) -> Result<(), RouterError> {
        self.require(s)?;
        let source = self.id_of(s);
        let before = self.routes.len();
        if self.registered[d] {
            self.routes.retain(|e| !(e.source == source && e.dest == d));
            return Ok(());
        }
        let dest_id = self.id_of(d);
        self.routes
            .retain(|e| !(e.source == source && e.dest_id == dest_id));
        if self.routes.len() == before {
            return Err(RouterError::NotRegistered(dest_id));
        }
        Ok(())
    }

    fn send(&mut self, s: usize) {
        if !self.registered[s] {
            return;
        }
        let source = self.id_of(s);
        for edge in self.routes.iter().filter(|e| e.source == source) {
            self.expected[edge.dest] += 1;
        }
    }
}

fn run(ops: Vec<Op>, scrub: bool) -> Result<(), TestCaseError> {
    let rt = tokio::runtime::Runtime::new().unwrap();
    rt.block_on(async {
        let mut config = RouterConfig::totally_ordered(256);
        config.routing.scrub_on_unregister = scrub;
        let (router, _task) = Router::<u32>::spawn(&config).unwrap();

        let pool: Vec<Arc<RecordingComponent<u32>>> =
            (0..POOL).map(|_| RecordingComponent::new()).collect();
        let mut model = Model {
            scrub,
            ..Default::default()
        };

        for (n, op) in ops.into_iter().enumerate() {
            match op {
                Op::Register(i) => {
                    let id = router.register(&pool[i]).unwrap().await.unwrap();
                    if model.registered[i] {
                        prop_assert_eq!(Some(id), model.assigned[i]);
                    } else {
                        prop_assert_ne!(Some(id), model.assigned[i]);
                        model.assigned[i] = Some(id);
                        model.registered[i] = true;
                    }
                }
                Op::Unregister(i) => {
                    let result = router.unregister(&pool[i]).unwrap().await;
                    prop_assert_eq!(result, model.unregister(i));
                }
                Op::AddRoute(s, d) => {
                    let result = router
                        .add_route(model.id_of(s), model.id_of(d))
                        .unwrap()
                        .await;
                    prop_assert_eq!(result, model.add_route(s, d));
                }
                Op::RemoveRoute(s, d) => {
                    let result = router
                        .remove_route(model.id_of(s), model.id_of(d))
                        .unwrap()
                        .await;
                    prop_assert_eq!(result, model.remove_route(s, d));
                }
                Op::Send(s) => {
                    router.send(model.id_of(s), n as u32).unwrap();
                    model.send(s);
                }
            }
        }

        let snapshot = settle(&router).await;
        prop_assert_eq!(
            snapshot.registered,
            model.registered.iter().filter(|r| **r).count()
        );
        prop_assert_eq!(snapshot.route_count(), model.routes.len());

        let sources: BTreeSet<ComponentId> = model.routes.iter().map(|e| e.source).collect();
        prop_assert_eq!(snapshot.entries.len(), sources.len());
        for source in &sources {
            let expected: Vec<ComponentId> = model
                .routes
                .iter()
                .filter(|e| e.source == *source)
                .map(|e| e.dest_id)
                .collect();
            prop_assert_eq!(snapshot.destinations(source), expected);
        }

        let stale = model.routes.iter().filter(|e| !model.is_current(e)).count();
        prop_assert_eq!(snapshot.stale_targets().count(), stale);
        if scrub {
            prop_assert_eq!(stale, 0);
        }

        for (i, component) in pool.iter().enumerate() {
            prop_assert_eq!(component.received().len(), model.expected[i]);
        }
        Ok(())
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Stale routes survive unregistration and keep delivering while the
    /// component is alive.
    #[test]
    fn router_matches_model_keeping_stale_routes(
        ops in prop::collection::vec(arb_op(), 1..60),
    ) {
        run(ops, false)?;
    }

    /// Unregistration scrubs every route touching the component.
    #[test]
    fn router_matches_model_scrubbing_routes(
        ops in prop::collection::vec(arb_op(), 1..60),
    ) {
        run(ops, true)?;
    }
}
