use crate::Result;
use std::rc::{Rc, Weak};

/// The capability to dispatch an `Action` to a [Store](crate::Store),
/// possibly through a chain of
/// [Middleware](crate::middleware::Middleware).
///
/// Cloning a `Dispatch` is cheap, all clones dispatch to the same
/// place.
pub struct Dispatch<Action>(Rc<dyn Fn(Action) -> Result<Action>>);

impl<Action> Dispatch<Action> {
    pub fn new<F: Fn(Action) -> Result<Action> + 'static>(dispatch: F) -> Self {
        Dispatch(Rc::new(dispatch))
    }

    /// Dispatch the `action`, returning whatever the end of the chain
    /// returned (the core store returns the action unchanged).
    pub fn dispatch(&self, action: Action) -> Result<Action> {
        (self.0)(action)
    }

    pub(crate) fn downgrade(&self) -> WeakDispatch<Action> {
        WeakDispatch(Rc::downgrade(&self.0))
    }
}

impl<Action> Clone for Dispatch<Action> {
    fn clone(&self) -> Self {
        Dispatch(Rc::clone(&self.0))
    }
}

impl<Action> std::fmt::Debug for Dispatch<Action> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Dispatch(function @ {:p})", Rc::as_ptr(&self.0))
    }
}

/// A [Dispatch] which doesn't keep the dispatch chain alive.
pub(crate) struct WeakDispatch<Action>(Weak<dyn Fn(Action) -> Result<Action>>);

impl<Action> WeakDispatch<Action> {
    pub fn upgrade(&self) -> Option<Dispatch<Action>> {
        self.0.upgrade().map(Dispatch)
    }
}
