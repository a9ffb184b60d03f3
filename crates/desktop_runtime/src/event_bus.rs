//! Priority-ordered publish/subscribe dispatcher with an internal FIFO queue.
//!
//! Events published while a dispatch is already running are queued behind the current event, so
//! every listener observes events in publish order. Listeners are revoked by dropping their
//! [`Subscription`].

use std::{
    cell::RefCell,
    collections::VecDeque,
    rc::{Rc, Weak},
};

use tracing::debug;

use crate::events::{DesktopEvent, DesktopEventKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EventPriority {
    Low,
    Normal,
    High,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventFilter {
    All,
    Kinds(Vec<DesktopEventKind>),
}

impl EventFilter {
    pub fn only(kind: DesktopEventKind) -> Self {
        Self::Kinds(vec![kind])
    }

    fn matches(&self, kind: DesktopEventKind) -> bool {
        match self {
            Self::All => true,
            Self::Kinds(kinds) => kinds.contains(&kind),
        }
    }
}

type Handler = Rc<RefCell<dyn FnMut(&DesktopEvent)>>;

struct Listener {
    id: u64,
    priority: EventPriority,
    filter: EventFilter,
    handler: Handler,
}

#[derive(Default)]
struct BusInner {
    next_id: u64,
    /// Sorted by priority, highest first; ties keep subscription order.
    listeners: Vec<Listener>,
    queue: VecDeque<DesktopEvent>,
    draining: bool,
}

impl BusInner {
    fn is_subscribed(&self, id: u64) -> bool {
        self.listeners.iter().any(|listener| listener.id == id)
    }
}

/// Shared handle to one event bus. Clones dispatch to the same listeners.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Rc<RefCell<BusInner>>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("EventBus")
            .field("listeners", &inner.listeners.len())
            .field("queued", &inner.queue.len())
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for events accepted by `filter`.
    pub fn subscribe<F>(
        &self,
        priority: EventPriority,
        filter: EventFilter,
        handler: F,
    ) -> Subscription
    where
        F: FnMut(&DesktopEvent) + 'static,
    {
        let mut inner = self.inner.borrow_mut();
        inner.next_id += 1;
        let id = inner.next_id;
        let position = inner
            .listeners
            .iter()
            .position(|listener| listener.priority < priority)
            .unwrap_or(inner.listeners.len());
        inner.listeners.insert(
            position,
            Listener {
                id,
                priority,
                filter,
                handler: Rc::new(RefCell::new(handler)),
            },
        );
        Subscription {
            bus: Rc::downgrade(&self.inner),
            id,
            active: true,
        }
    }

    /// Queues `event` and, unless a dispatch is already running, drains the queue.
    pub fn publish(&self, event: DesktopEvent) {
        {
            let mut inner = self.inner.borrow_mut();
            inner.queue.push_back(event);
            if inner.draining {
                return;
            }
            inner.draining = true;
        }
        let _guard = DrainGuard(&self.inner);

        loop {
            let (event, targets) = {
                let mut inner = self.inner.borrow_mut();
                let Some(event) = inner.queue.pop_front() else {
                    break;
                };
                let kind = event.kind();
                let targets: Vec<(u64, Handler)> = inner
                    .listeners
                    .iter()
                    .filter(|listener| listener.filter.matches(kind))
                    .map(|listener| (listener.id, Rc::clone(&listener.handler)))
                    .collect();
                (event, targets)
            };

            for (id, handler) in targets {
                // A handler earlier in this round may have revoked this one.
                if !self.inner.borrow().is_subscribed(id) {
                    continue;
                }
                match handler.try_borrow_mut() {
                    Ok(mut handler) => (&mut *handler)(&event),
                    Err(_) => debug!(listener = id, event = event.token(), "listener busy; skipped"),
                }
            }
        }
    }

    /// Returns a non-owning publishing handle suitable for spawned tasks.
    pub fn publisher(&self) -> EventPublisher {
        EventPublisher {
            inner: Rc::downgrade(&self.inner),
        }
    }

    pub fn listener_count(&self) -> usize {
        self.inner.borrow().listeners.len()
    }

    fn remove(inner: &RefCell<BusInner>, id: u64) {
        let removed = {
            let mut inner = inner.borrow_mut();
            inner
                .listeners
                .iter()
                .position(|listener| listener.id == id)
                .map(|position| inner.listeners.remove(position))
        };
        // The handler may own other subscriptions; drop it with the bus unborrowed.
        drop(removed);
    }
}

struct DrainGuard<'a>(&'a RefCell<BusInner>);

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut inner) = self.0.try_borrow_mut() {
            inner.draining = false;
        }
    }
}

/// Revocable registration returned by [`EventBus::subscribe`].
#[must_use = "dropping a Subscription unsubscribes its listener"]
pub struct Subscription {
    bus: Weak<RefCell<BusInner>>,
    id: u64,
    active: bool,
}

impl Subscription {
    /// Revokes the listener now.
    pub fn unsubscribe(self) {
        drop(self);
    }

    /// Keeps the listener registered for the lifetime of the bus.
    pub fn detach(mut self) {
        self.active = false;
    }

    pub fn is_active(&self) -> bool {
        if !self.active {
            return false;
        }
        let Some(inner) = self.bus.upgrade() else {
            return false;
        };
        let subscribed = inner.borrow().is_subscribed(self.id);
        subscribed
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if !self.active {
            return;
        }
        if let Some(inner) = self.bus.upgrade() {
            EventBus::remove(&inner, self.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.active)
            .finish()
    }
}

/// Weak publishing handle; publishing after the bus is gone is a no-op.
#[derive(Clone)]
pub struct EventPublisher {
    inner: Weak<RefCell<BusInner>>,
}

impl EventPublisher {
    /// Publishes `event` and reports whether the bus was still alive.
    pub fn publish(&self, event: DesktopEvent) -> bool {
        match self.inner.upgrade() {
            Some(inner) => {
                EventBus { inner }.publish(event);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::{AppId, WindowId};

    fn minimized(id: u64) -> DesktopEvent {
        DesktopEvent::WindowMinimized {
            window_id: WindowId(id),
        }
    }

    fn recorder() -> (Rc<RefCell<Vec<String>>>, impl Fn(&'static str) -> Box<dyn FnMut(&DesktopEvent)>) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        let make = move |name: &'static str| {
            let sink = Rc::clone(&sink);
            Box::new(move |event: &DesktopEvent| {
                sink.borrow_mut().push(format!("{name}:{}", event.token()));
            }) as Box<dyn FnMut(&DesktopEvent)>
        };
        (log, make)
    }

    #[test]
    fn listeners_run_by_priority_then_subscription_order() {
        let bus = EventBus::new();
        let (log, make) = recorder();
        let _a = bus.subscribe(EventPriority::Normal, EventFilter::All, make("normal-1"));
        let _b = bus.subscribe(EventPriority::Low, EventFilter::All, make("low"));
        let _c = bus.subscribe(EventPriority::High, EventFilter::All, make("high"));
        let _d = bus.subscribe(EventPriority::Normal, EventFilter::All, make("normal-2"));

        bus.publish(DesktopEvent::BootCompleted);

        assert_eq!(
            *log.borrow(),
            vec![
                "high:BOOT_COMPLETE",
                "normal-1:BOOT_COMPLETE",
                "normal-2:BOOT_COMPLETE",
                "low:BOOT_COMPLETE",
            ]
        );
    }

    #[test]
    fn filters_limit_delivery_to_named_kinds() {
        let bus = EventBus::new();
        let (log, make) = recorder();
        let _sub = bus.subscribe(
            EventPriority::Normal,
            EventFilter::only(DesktopEventKind::WindowMinimize),
            make("min"),
        );

        bus.publish(DesktopEvent::BootCompleted);
        bus.publish(minimized(1));

        assert_eq!(*log.borrow(), vec!["min:WINDOW_MINIMIZE"]);
    }

    #[test]
    fn publishing_from_a_handler_queues_behind_current_event() {
        let bus = EventBus::new();
        let log = Rc::new(RefCell::new(Vec::<String>::new()));

        let inner_bus = bus.clone();
        let first_log = Rc::clone(&log);
        let _first = bus.subscribe(EventPriority::High, EventFilter::All, move |event| {
            first_log.borrow_mut().push(format!("first:{}", event.token()));
            if matches!(event, DesktopEvent::BootCompleted) {
                inner_bus.publish(DesktopEvent::SessionReset);
            }
        });
        let second_log = Rc::clone(&log);
        let _second = bus.subscribe(EventPriority::Low, EventFilter::All, move |event| {
            second_log
                .borrow_mut()
                .push(format!("second:{}", event.token()));
        });

        bus.publish(DesktopEvent::BootCompleted);

        assert_eq!(
            *log.borrow(),
            vec![
                "first:BOOT_COMPLETE",
                "second:BOOT_COMPLETE",
                "first:SESSION_RESET",
                "second:SESSION_RESET",
            ]
        );
    }

    #[test]
    fn dropping_subscription_revokes_listener() {
        let bus = EventBus::new();
        let (log, make) = recorder();
        let sub = bus.subscribe(EventPriority::Normal, EventFilter::All, make("a"));
        assert!(sub.is_active());
        drop(sub);

        bus.publish(DesktopEvent::BootCompleted);

        assert!(log.borrow().is_empty());
        assert_eq!(bus.listener_count(), 0);
    }

    #[test]
    fn detached_subscription_outlives_its_handle() {
        let bus = EventBus::new();
        let (log, make) = recorder();
        bus.subscribe(EventPriority::Normal, EventFilter::All, make("a"))
            .detach();

        bus.publish(DesktopEvent::BootCompleted);

        assert_eq!(*log.borrow(), vec!["a:BOOT_COMPLETE"]);
    }

    #[test]
    fn listener_revoked_mid_dispatch_is_skipped() {
        let bus = EventBus::new();
        let (log, make) = recorder();
        let victim: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));

        let slot = Rc::clone(&victim);
        let _killer = bus.subscribe(EventPriority::High, EventFilter::All, move |_| {
            slot.borrow_mut().take();
        });
        *victim.borrow_mut() = Some(bus.subscribe(EventPriority::Low, EventFilter::All, make("victim")));

        bus.publish(DesktopEvent::ProcessTerminated {
            process_id: AppId::trusted("calculator"),
        });

        assert!(log.borrow().is_empty());
        assert_eq!(bus.listener_count(), 1);
    }

    #[test]
    fn publisher_is_inert_after_bus_is_dropped() {
        let bus = EventBus::new();
        let publisher = bus.publisher();
        assert!(publisher.publish(DesktopEvent::BootCompleted));
        drop(bus);
        assert!(!publisher.publish(DesktopEvent::BootCompleted));
    }
}
