//! Adapter presenting a [Store](crate::Store) as a minimal observable
//! of its state, for consumers which prefer being pushed values over
//! subscribing a listener and calling
//! [get_state()](crate::Store::get_state()) themselves.

use crate::{store::StoreCore, Action, Result, Subscription};
use std::rc::Rc;

/// Receives the states pushed by a [StateObservable]. Observers which
/// don't override [Observer::next()] are still subscribed, they just
/// ignore every value.
///
/// Any `Fn(Rc<State>)` is an observer.
pub trait Observer<State> {
    fn next(&self, _state: Rc<State>) {}
}

impl<State, F> Observer<State> for F
where
    F: Fn(Rc<State>),
{
    fn next(&self, state: Rc<State>) {
        (self)(state)
    }
}

/// Returned by [Store::observable()](crate::Store::observable()).
pub struct StateObservable<State, A> {
    core: Rc<StoreCore<State, A>>,
}

impl<State, A> StateObservable<State, A>
where
    State: 'static,
    A: Action + 'static,
{
    pub(crate) fn new(core: Rc<StoreCore<State, A>>) -> Self {
        Self { core }
    }

    /// Push the current state to the `observer` straight away, and
    /// again after every dispatch until the returned [Subscription] is
    /// unsubscribed.
    pub fn subscribe<O: Observer<State> + 'static>(&self, observer: O) -> Result<Subscription> {
        observer.next(self.core.get_state()?);

        let core = Rc::downgrade(&self.core);
        let observe_state = move || -> Result<()> {
            if let Some(core) = core.upgrade() {
                observer.next(core.get_state()?);
            }
            Ok(())
        };

        self.core.subscribe(Rc::new(observe_state))
    }
}
