use crate::Result;
use std::{
    cell::Cell,
    rc::{Rc, Weak},
};

/// A callback which is notified after every successful
/// [Store::dispatch()](crate::Store::dispatch()).
///
/// Listeners are told nothing about what changed, call
/// [Store::get_state()](crate::Store::get_state()) inside the
/// listener to observe the new state. An `Err` returned by a listener
/// stops the notification pass and is returned to the dispatch caller.
///
/// Any `Fn() -> Result<()>` is a listener.
pub trait Listener {
    fn notify(&self) -> Result<()>;
}

impl<F> Listener for F
where
    F: Fn() -> Result<()>,
{
    fn notify(&self) -> Result<()> {
        (self)()
    }
}

pub(crate) type ListenerId = u64;

/// A [Listener] registered with a store, keyed by its subscription.
#[derive(Clone)]
pub(crate) struct ListenerEntry {
    pub id: ListenerId,
    pub listener: Rc<dyn Listener>,
}

/// Something listeners can be removed from.
pub(crate) trait ListenerRegistry {
    fn remove_listener(&self, id: ListenerId) -> Result<()>;
}

/// Returned by [Store::subscribe()](crate::Store::subscribe()), used
/// to remove the listener again.
///
/// Dropping a `Subscription` does **not** unsubscribe the listener.
/// The subscription only holds a weak reference to its store.
pub struct Subscription {
    id: ListenerId,
    registry: Weak<dyn ListenerRegistry>,
    subscribed: Cell<bool>,
}

impl Subscription {
    pub(crate) fn new(id: ListenerId, registry: Weak<dyn ListenerRegistry>) -> Self {
        Self {
            id,
            registry,
            subscribed: Cell::new(true),
        }
    }

    /// Remove the listener from the store. Only the first successful
    /// call has an effect, later calls are no-ops.
    ///
    /// Fails with a [ReentrancyError](crate::ReentrancyError) if the
    /// store's reducer is executing, in which case the listener stays
    /// subscribed.
    pub fn unsubscribe(&self) -> Result<()> {
        if !self.subscribed.get() {
            return Ok(());
        }

        if let Some(registry) = self.registry.upgrade() {
            registry.remove_listener(self.id)?;
        }

        self.subscribed.set(false);
        Ok(())
    }

    /// Whether [unsubscribe()](Subscription::unsubscribe()) has
    /// succeeded yet.
    pub fn is_subscribed(&self) -> bool {
        self.subscribed.get()
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("subscribed", &self.subscribed.get())
            .finish()
    }
}
