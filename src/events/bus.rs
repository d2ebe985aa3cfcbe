//! Typed, synchronous publish/subscribe bus.
//!
//! The [`EventBus`] is the only channel through which components coordinate.
//! It is an explicit handle passed into constructors rather than ambient
//! global state, and every event is a concrete Rust type implementing
//! [`BusEvent`], so payloads are checked at compile time.
//!
//! # Delivery contract
//!
//! - [`EventBus::publish`] delivers synchronously, in subscription order, to
//!   every handler that is still registered when its turn comes.
//! - Publishing from inside a handler re-enters the bus immediately; there is
//!   no queue and nothing is buffered across ticks. This includes a handler
//!   publishing its own event type: it receives the nested event too.
//! - Handlers are `Fn`; state they mutate lives in a `Cell` or `RefCell` they
//!   capture, so no borrow is held on the bus while a handler runs.
//! - A handler that returns an error or panics is logged and skipped; the
//!   remaining handlers still receive the event.
//! - Registration is not deduplicated. Callers that must not double-subscribe
//!   keep their [`Subscription`] and check it themselves.
//!
//! # Example
//!
//! ```ignore
//! let bus = EventBus::new();
//! let sub = bus.subscribe(|e: &TimerUpdate| {
//!     info!("mental health is now {}", e.0.value());
//!     Ok(())
//! });
//! bus.publish(TimerUpdate(MentalHealth::FULL));
//! bus.unsubscribe(sub);
//! ```

use std::any::{Any, TypeId};
use std::cell::{Cell, RefCell};
use std::panic::{self, AssertUnwindSafe};
use std::rc::{Rc, Weak};

use log::{debug, error, trace};
use rustc_hash::FxHashMap;
use thiserror::Error;

/// Marker trait for anything that can travel on the [`EventBus`].
pub trait BusEvent: Any {
    /// Stable event name, matching the names UI collaborators listen for.
    const NAME: &'static str;
}

/// Error a handler may report back to the bus.
///
/// The bus never propagates these; it logs them and moves on to the next
/// handler.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// The component behind this handler was destroyed without unsubscribing.
    #[error("handler outlived its component (missing unsubscribe)")]
    Stale,
    /// The component state was already borrowed further up the call stack.
    #[error("handler state is busy")]
    Busy,
    /// Any other handler-specific failure.
    #[error("{0}")]
    Failed(String),
}

/// Result returned by every bus handler.
pub type HandlerResult = Result<(), HandlerError>;

type ErasedHandler = dyn Fn(&dyn Any) -> HandlerResult;

/// Receipt for a registered handler; pass it back to
/// [`EventBus::unsubscribe`] to remove the handler.
///
/// This is plain data (`Copy`, `Send`, `Sync`), so it can be stored inside
/// ECS components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription {
    event: TypeId,
    name: &'static str,
    id: u64,
}

impl Subscription {
    /// Wire name of the event this subscription listens to.
    pub fn event_name(&self) -> &'static str {
        self.name
    }
}

#[derive(Clone)]
struct Slot {
    id: u64,
    live: Rc<Cell<bool>>,
    handler: Rc<ErasedHandler>,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    slots: FxHashMap<TypeId, Vec<Slot>>,
}

/// Cheaply cloneable handle to a shared subscription registry.
///
/// Clones refer to the same bus. The bus is single-threaded by construction.
#[derive(Clone, Default)]
pub struct EventBus {
    registry: Rc<RefCell<Registry>>,
}

impl EventBus {
    /// Create an empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for events of type `E`.
    pub fn subscribe<E, F>(&self, handler: F) -> Subscription
    where
        E: BusEvent,
        F: Fn(&E) -> HandlerResult + 'static,
    {
        let erased = move |payload: &dyn Any| match payload.downcast_ref::<E>() {
            Some(event) => handler(event),
            None => Ok(()),
        };

        let mut registry = self.registry.borrow_mut();
        registry.next_id += 1;
        let id = registry.next_id;
        registry
            .slots
            .entry(TypeId::of::<E>())
            .or_default()
            .push(Slot {
                id,
                live: Rc::new(Cell::new(true)),
                handler: Rc::new(erased),
            });
        debug!("subscribed handler #{id} to '{}'", E::NAME);

        Subscription {
            event: TypeId::of::<E>(),
            name: E::NAME,
            id,
        }
    }

    /// Remove a single handler. Returns `false` if it was already gone.
    pub fn unsubscribe(&self, subscription: Subscription) -> bool {
        let mut registry = self.registry.borrow_mut();
        let Some(slots) = registry.slots.get_mut(&subscription.event) else {
            return false;
        };
        let Some(index) = slots.iter().position(|slot| slot.id == subscription.id) else {
            return false;
        };
        let slot = slots.remove(index);
        slot.live.set(false);
        if slots.is_empty() {
            registry.slots.remove(&subscription.event);
        }
        debug!(
            "unsubscribed handler #{} from '{}'",
            subscription.id, subscription.name
        );
        true
    }

    /// Remove every handler registered for `E`. Returns how many were removed.
    pub fn unsubscribe_all<E: BusEvent>(&self) -> usize {
        let removed = self
            .registry
            .borrow_mut()
            .slots
            .remove(&TypeId::of::<E>())
            .unwrap_or_default();
        for slot in &removed {
            slot.live.set(false);
        }
        debug!("unsubscribed all {} handler(s) from '{}'", removed.len(), E::NAME);
        removed.len()
    }

    /// Deliver `event` to every current handler of its type.
    ///
    /// Returns the number of handlers that completed without error.
    pub fn publish<E: BusEvent>(&self, event: E) -> usize {
        // Snapshot so handlers may subscribe or unsubscribe while we iterate.
        let snapshot = self
            .registry
            .borrow()
            .slots
            .get(&TypeId::of::<E>())
            .cloned()
            .unwrap_or_default();
        if snapshot.is_empty() {
            trace!("'{}' published with no listeners", E::NAME);
            return 0;
        }

        let payload: &dyn Any = &event;
        let mut delivered = 0;
        for slot in snapshot {
            if !slot.live.get() {
                continue;
            }
            let handler = &slot.handler;
            match panic::catch_unwind(AssertUnwindSafe(|| handler(payload))) {
                Ok(Ok(())) => delivered += 1,
                Ok(Err(e)) => error!("handler #{} for '{}' failed: {e}", slot.id, E::NAME),
                Err(_) => error!("handler #{} for '{}' panicked", slot.id, E::NAME),
            }
        }
        delivered
    }

    /// Number of handlers currently registered for `E`.
    pub fn listener_count<E: BusEvent>(&self) -> usize {
        self.registry
            .borrow()
            .slots
            .get(&TypeId::of::<E>())
            .map_or(0, Vec::len)
    }

    /// Number of handlers registered across all event types.
    pub fn total_listeners(&self) -> usize {
        self.registry.borrow().slots.values().map(Vec::len).sum()
    }

    /// Non-owning handle, for handlers that need to publish back into the bus
    /// without keeping it alive.
    pub fn downgrade(&self) -> WeakEventBus {
        WeakEventBus {
            registry: Rc::downgrade(&self.registry),
        }
    }
}

/// Weak counterpart of [`EventBus`].
#[derive(Clone, Default)]
pub struct WeakEventBus {
    registry: Weak<RefCell<Registry>>,
}

impl WeakEventBus {
    /// Recover a strong handle if the bus is still alive.
    pub fn upgrade(&self) -> Option<EventBus> {
        self.registry.upgrade().map(|registry| EventBus { registry })
    }

    /// Publish through the bus if it is still alive; returns 0 otherwise.
    pub fn publish<E: BusEvent>(&self, event: E) -> usize {
        self.upgrade().map_or(0, |bus| bus.publish(event))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Ping(u32);
    impl BusEvent for Ping {
        const NAME: &'static str = "ping";
    }

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Pong;
    impl BusEvent for Pong {
        const NAME: &'static str = "pong";
    }

    fn recorder() -> Rc<RefCell<Vec<String>>> {
        Rc::new(RefCell::new(Vec::new()))
    }

    #[test]
    fn test_publish_delivers_in_subscription_order() {
        let bus = EventBus::new();
        let log = recorder();
        for label in ["a", "b", "c"] {
            let log = Rc::clone(&log);
            bus.subscribe(move |e: &Ping| {
                log.borrow_mut().push(format!("{label}{}", e.0));
                Ok(())
            });
        }
        assert_eq!(bus.publish(Ping(1)), 3);
        assert_eq!(*log.borrow(), vec!["a1", "b1", "c1"]);
    }

    #[test]
    fn test_publish_only_reaches_matching_type() {
        let bus = EventBus::new();
        let hits = Rc::new(Cell::new(0));
        let counter = Rc::clone(&hits);
        bus.subscribe(move |_: &Pong| {
            counter.set(counter.get() + 1);
            Ok(())
        });
        assert_eq!(bus.publish(Ping(7)), 0);
        assert_eq!(hits.get(), 0);
        assert_eq!(bus.publish(Pong), 1);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_failing_handler_does_not_block_later_handlers() {
        let bus = EventBus::new();
        let hits = Rc::new(Cell::new(0));
        bus.subscribe(|_: &Ping| Err(HandlerError::Failed("boom".into())));
        let counter = Rc::clone(&hits);
        bus.subscribe(move |_: &Ping| {
            counter.set(counter.get() + 1);
            Ok(())
        });
        assert_eq!(bus.publish(Ping(0)), 1);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_panicking_handler_is_isolated() {
        let bus = EventBus::new();
        let hits = Rc::new(Cell::new(0));
        bus.subscribe(|_: &Ping| -> HandlerResult { panic!("handler exploded") });
        let counter = Rc::clone(&hits);
        bus.subscribe(move |_: &Ping| {
            counter.set(counter.get() + 1);
            Ok(())
        });
        assert_eq!(bus.publish(Ping(0)), 1);
        assert_eq!(hits.get(), 1);
        // The bus stays usable afterwards.
        assert_eq!(bus.publish(Ping(1)), 1);
        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn test_unsubscribe_removes_single_handler() {
        let bus = EventBus::new();
        let first = bus.subscribe(|_: &Ping| Ok(()));
        bus.subscribe(|_: &Ping| Ok(()));
        assert_eq!(bus.listener_count::<Ping>(), 2);
        assert!(bus.unsubscribe(first));
        assert!(!bus.unsubscribe(first));
        assert_eq!(bus.listener_count::<Ping>(), 1);
        assert_eq!(first.event_name(), "ping");
    }

    #[test]
    fn test_unsubscribe_all_clears_one_event_type() {
        let bus = EventBus::new();
        bus.subscribe(|_: &Ping| Ok(()));
        bus.subscribe(|_: &Ping| Ok(()));
        bus.subscribe(|_: &Pong| Ok(()));
        assert_eq!(bus.unsubscribe_all::<Ping>(), 2);
        assert_eq!(bus.listener_count::<Ping>(), 0);
        assert_eq!(bus.total_listeners(), 1);
    }

    #[test]
    fn test_handler_unsubscribed_mid_publish_is_skipped() {
        let bus = EventBus::new();
        let victim_hits = Rc::new(Cell::new(0));
        let victim_sub: Rc<Cell<Option<Subscription>>> = Rc::new(Cell::new(None));

        let weak = bus.downgrade();
        let target = Rc::clone(&victim_sub);
        bus.subscribe(move |_: &Ping| {
            if let (Some(bus), Some(sub)) = (weak.upgrade(), target.get()) {
                bus.unsubscribe(sub);
            }
            Ok(())
        });
        let counter = Rc::clone(&victim_hits);
        let sub = bus.subscribe(move |_: &Ping| {
            counter.set(counter.get() + 1);
            Ok(())
        });
        victim_sub.set(Some(sub));

        assert_eq!(bus.publish(Ping(0)), 1);
        assert_eq!(victim_hits.get(), 0);
    }

    #[test]
    fn test_publish_from_handler_reenters_synchronously() {
        let bus = EventBus::new();
        let log = recorder();

        let weak = bus.downgrade();
        let outer_log = Rc::clone(&log);
        bus.subscribe(move |e: &Ping| {
            outer_log.borrow_mut().push(format!("ping{}", e.0));
            weak.publish(Pong);
            outer_log.borrow_mut().push("after".to_string());
            Ok(())
        });
        let inner_log = Rc::clone(&log);
        bus.subscribe(move |_: &Pong| {
            inner_log.borrow_mut().push("pong".to_string());
            Ok(())
        });

        bus.publish(Ping(3));
        assert_eq!(*log.borrow(), vec!["ping3", "pong", "after"]);
    }

    #[test]
    fn test_handler_receives_its_own_nested_events() {
        let bus = EventBus::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let weak = bus.downgrade();
        let sink = Rc::clone(&seen);
        bus.subscribe(move |e: &Ping| {
            sink.borrow_mut().push(e.0);
            if e.0 < 3 {
                weak.publish(Ping(e.0 + 1));
            }
            Ok(())
        });
        let after = Rc::new(Cell::new(0));
        let counter = Rc::clone(&after);
        bus.subscribe(move |_: &Ping| {
            counter.set(counter.get() + 1);
            Ok(())
        });

        assert_eq!(bus.publish(Ping(1)), 2);
        assert_eq!(*seen.borrow(), vec![1, 2, 3]);
        // Every nested publish reached the second handler as well.
        assert_eq!(after.get(), 3);
    }

    #[test]
    fn test_weak_bus_is_inert_after_drop() {
        let bus = EventBus::new();
        let weak = bus.downgrade();
        drop(bus);
        assert!(weak.upgrade().is_none());
        assert_eq!(weak.publish(Ping(1)), 0);
    }

    #[test]
    fn test_clones_share_registry() {
        let bus = EventBus::new();
        let other = bus.clone();
        other.subscribe(|_: &Ping| Ok(()));
        assert_eq!(bus.total_listeners(), 1);
    }
}
