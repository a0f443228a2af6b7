use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::mpsc;
use tracing::trace;

type Handler<E> = Arc<dyn Fn(E) + Send + Sync>;

struct Entry<E> {
    id: u64,
    once: bool,
    handler: Handler<E>,
}

struct Table<E> {
    next_id: u64,
    handlers: HashMap<String, Vec<Entry<E>>>,
}

impl<E> Table<E> {
    fn remove(&mut self, name: &str, id: u64) -> bool {
        let Some(entries) = self.handlers.get_mut(name) else {
            return false;
        };

        let before = entries.len();
        entries.retain(|entry| entry.id != id);
        let removed = entries.len() != before;

        if entries.is_empty() {
            self.handlers.remove(name);
        }

        removed
    }
}

/// A table of named subscriptions.
///
/// Every handler is called with its own clone of the published event, outside of the
/// table lock, so handlers may publish or subscribe themselves.
///
/// Lifecycle: subscribe at startup, keep the returned [`Subscription`] for as long as
/// events should be received, and call [`EventBus::shutdown`] when the node stops.
pub struct EventBus<E> {
    table: Arc<RwLock<Table<E>>>,
}

impl<E> Clone for EventBus<E> {
    fn clone(&self) -> Self {
        Self {
            table: Arc::clone(&self.table),
        }
    }
}

impl<E> Default for EventBus<E> {
    fn default() -> Self {
        Self {
            table: Arc::new(RwLock::new(Table {
                next_id: 0,
                handlers: HashMap::new(),
            })),
        }
    }
}

impl<E> fmt::Debug for EventBus<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let table = self.table.read().unwrap_or_else(PoisonError::into_inner);

        f.debug_struct("EventBus")
            .field("events", &table.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<E> EventBus<E>
where
    E: Clone + Send + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Call `handler` for every event published under `name`.
    pub fn on(
        &self,
        name: impl Into<String>,
        handler: impl Fn(E) + Send + Sync + 'static,
    ) -> Subscription {
        self.register(name.into(), false, Arc::new(handler))
    }

    /// Call `handler` for the next event published under `name` only.
    pub fn once(
        &self,
        name: impl Into<String>,
        handler: impl Fn(E) + Send + Sync + 'static,
    ) -> Subscription {
        self.register(name.into(), true, Arc::new(handler))
    }

    /// Receive the events published under `name` on a channel.
    ///
    /// The channel closes once the subscription is cancelled and no delivery is in flight.
    pub fn channel(&self, name: impl Into<String>) -> (mpsc::UnboundedReceiver<E>, Subscription) {
        let (tx, rx) = mpsc::unbounded_channel();

        let subscription = self.on(name, move |event| {
            // The receiver may be gone before the subscription is cancelled.
            let _ = tx.send(event);
        });

        (rx, subscription)
    }

    /// Publish an event to every handler subscribed to `name`.
    /// Returns the number of handlers called.
    pub fn notify(&self, name: &str, event: &E) -> usize {
        let handlers: Vec<Handler<E>> = {
            let mut table = self.table.write().unwrap_or_else(PoisonError::into_inner);

            let Some(entries) = table.handlers.get_mut(name) else {
                return 0;
            };

            let handlers = entries.iter().map(|e| Arc::clone(&e.handler)).collect();
            entries.retain(|entry| !entry.once);

            if entries.is_empty() {
                table.handlers.remove(name);
            }

            handlers
        };

        trace!(event = %name, handlers = handlers.len(), "Notifying subscribers");

        for handler in &handlers {
            handler(event.clone());
        }

        handlers.len()
    }

    /// Remove every handler subscribed to `name`.
    pub fn clear(&self, name: &str) {
        let mut table = self.table.write().unwrap_or_else(PoisonError::into_inner);
        table.handlers.remove(name);
    }

    /// The number of handlers subscribed to `name`.
    pub fn subscribers(&self, name: &str) -> usize {
        let table = self.table.read().unwrap_or_else(PoisonError::into_inner);
        table.handlers.get(name).map_or(0, Vec::len)
    }

    /// Remove every handler.
    pub fn shutdown(&self) {
        let mut table = self.table.write().unwrap_or_else(PoisonError::into_inner);
        let count: usize = table.handlers.values().map(Vec::len).sum();
        table.handlers.clear();

        trace!(handlers = count, "Event bus shut down");
    }

    fn register(&self, name: String, once: bool, handler: Handler<E>) -> Subscription {
        let mut table = self.table.write().unwrap_or_else(PoisonError::into_inner);

        let id = table.next_id;
        table.next_id += 1;

        table.handlers.entry(name.clone()).or_default().push(Entry {
            id,
            once,
            handler,
        });

        trace!(event = %name, id, once, "Registered handler");

        let weak = Arc::downgrade(&self.table);
        let deregister: Deregister = Box::new(move || {
            let Some(shared) = weak.upgrade() else {
                return false;
            };

            let mut table = shared.write().unwrap_or_else(PoisonError::into_inner);
            table.remove(&name, id)
        });

        Subscription {
            deregister: Some(deregister),
        }
    }
}

type Deregister = Box<dyn FnOnce() -> bool + Send + Sync>;

/// A registered handler. Dropping it deregisters the handler.
#[must_use = "dropping a subscription deregisters its handler"]
pub struct Subscription {
    deregister: Option<Deregister>,
}

impl Subscription {
    /// Deregister the handler. Returns `false` if it was already gone,
    /// because it fired once, or was cleared.
    pub fn cancel(mut self) -> bool {
        self.deregister.take().is_some_and(|deregister| deregister())
    }

    /// Keep the handler registered until the event is cleared or the bus shut down.
    pub fn detach(mut self) {
        self.deregister = None;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(deregister) = self.deregister.take() {
            deregister();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.deregister.is_some())
            .finish()
    }
}
