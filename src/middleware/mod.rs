//! [Middleware] used to modify the behaviour of a [Store] during a
//! [Store::dispatch()]. This module also contains a simple logging
//! middleware which can be used as a utility in an application.

pub mod logger;

use crate::{
    compose, dispatch::WeakDispatch, Action, BoxedReducer, Composable, Dispatch,
    ReentrancyError, Result, Store, StoreCreator, StoreEnhancer, StoreError,
};
use std::{cell::OnceCell, rc::Rc};

/// What a [Middleware] gets to see of the [Store] it is applied to.
///
/// [MiddlewareApi::dispatch()] goes through the complete middleware
/// chain, so a middleware can dispatch follow-up actions from within
/// [Middleware::on_dispatch()]. The API may be cloned and kept, it
/// doesn't keep the middleware chain alive.
pub struct MiddlewareApi<State, A> {
    store: Store<State, A>,
    /// Empty until the middleware chain is wired up.
    dispatch: Rc<OnceCell<WeakDispatch<A>>>,
}

impl<State, A> MiddlewareApi<State, A>
where
    State: 'static,
    A: Action + 'static,
{
    pub fn get_state(&self) -> Result<Rc<State>> {
        self.store.get_state()
    }

    /// Dispatch the `action` through the complete middleware chain.
    ///
    /// Fails with [ReentrancyError::ConstructingMiddleware] when
    /// called from [Middleware::on_wire()], and with
    /// [StoreError::Dropped] once the enhanced store is gone.
    pub fn dispatch(&self, action: A) -> Result<A> {
        let dispatch = self
            .dispatch
            .get()
            .ok_or(ReentrancyError::ConstructingMiddleware)?
            .upgrade()
            .ok_or(StoreError::Dropped)?;
        dispatch.dispatch(action)
    }
}

impl<State, A> Clone for MiddlewareApi<State, A> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            dispatch: Rc::clone(&self.dispatch),
        }
    }
}

/// `Middleware` used to modify the behaviour of a [Store] during a
/// [Store::dispatch()].
pub trait Middleware<State, A> {
    /// Invoked once while the middleware chain is being wired up,
    /// before any action passes through it. Dispatching from here
    /// fails with [ReentrancyError::ConstructingMiddleware].
    fn on_wire(&self, _api: &MiddlewareApi<State, A>) -> Result<()> {
        Ok(())
    }

    /// This method is invoked during a [Store::dispatch()] before the
    /// `action` reaches the [Reducer](crate::Reducer). Calling `next`
    /// executes subsequent middleware and then the store's own
    /// dispatch, and usually its result is returned from this method.
    ///
    /// This method allows modifying the action in question, or even
    /// swallowing it by not calling `next` at all, preventing the
    /// [Reducer](crate::Reducer) from processing the action.
    fn on_dispatch(
        &self,
        _api: &MiddlewareApi<State, A>,
        action: A,
        next: &Dispatch<A>,
    ) -> Result<A> {
        next.dispatch(action)
    }
}

/// The [StoreEnhancer] returned by [apply_middleware()].
///
/// The first middleware is the outermost one: it sees every action
/// first, and its `next` is the second middleware.
pub struct MiddlewareEnhancer<State, A> {
    middleware: Vec<Rc<dyn Middleware<State, A>>>,
}

impl<State, A> MiddlewareEnhancer<State, A> {
    pub fn new() -> Self {
        Self {
            middleware: Vec::new(),
        }
    }

    /// Append `middleware` to the end of the chain.
    pub fn with<M: Middleware<State, A> + 'static>(mut self, middleware: M) -> Self {
        self.middleware.push(Rc::new(middleware));
        self
    }
}

impl<State, A> Default for MiddlewareEnhancer<State, A> {
    fn default() -> Self {
        Self::new()
    }
}

/// Create a [StoreEnhancer] which runs every [Store::dispatch()]
/// through the `middleware`, in order.
///
/// ```
/// use reactive_store::{
///     middleware::{apply_middleware, logger::LoggerMiddleware, Middleware},
///     Envelope, Result, Store,
/// };
/// use serde_json::{json, Value};
/// use std::rc::Rc;
///
/// fn counter(state: Option<&Rc<i64>>, action: &Envelope<'_, Value>) -> Result<Option<Rc<i64>>> {
///     let state = state.cloned().unwrap_or_else(|| Rc::new(0));
///     Ok(Some(match action.action_type().as_deref() {
///         Some("INC") => Rc::new(*state + 1),
///         _ => state,
///     }))
/// }
///
/// let logger: Box<dyn Middleware<i64, Value>> = Box::new(LoggerMiddleware::new());
/// let store = Store::builder(counter)
///     .enhancer(apply_middleware(vec![logger]))
///     .build()
///     .unwrap();
///
/// store.dispatch(json!({"type": "INC"})).unwrap();
/// assert_eq!(*store.get_state().unwrap(), 1);
/// ```
pub fn apply_middleware<State, A>(
    middleware: Vec<Box<dyn Middleware<State, A>>>,
) -> MiddlewareEnhancer<State, A> {
    MiddlewareEnhancer {
        middleware: middleware.into_iter().map(Rc::from).collect(),
    }
}

impl<State, A> StoreEnhancer<State, A> for MiddlewareEnhancer<State, A>
where
    State: 'static,
    A: Action + 'static,
{
    fn enhance(&self, create: StoreCreator<State, A>) -> StoreCreator<State, A> {
        let middleware = self.middleware.clone();

        Rc::new(
            move |reducer: BoxedReducer<State, A>,
                  preloaded_state: Option<Rc<State>>|
                  -> Result<Store<State, A>> {
                let store = create(reducer, preloaded_state)?;
                let slot = Rc::new(OnceCell::new());
                let api = MiddlewareApi {
                    store: store.clone(),
                    dispatch: Rc::clone(&slot),
                };

                for middleware in &middleware {
                    middleware.on_wire(&api)?;
                }

                let chain: Vec<Composable<Dispatch<A>>> = middleware
                    .iter()
                    .map(|middleware| {
                        let middleware = Rc::clone(middleware);
                        let api = api.clone();
                        Box::new(move |next: Dispatch<A>| {
                            let middleware = Rc::clone(&middleware);
                            let api = api.clone();
                            Dispatch::new(move |action: A| {
                                middleware.on_dispatch(&api, action, &next)
                            })
                        }) as Composable<Dispatch<A>>
                    })
                    .collect();

                let dispatch = compose(chain)(store.dispatcher());
                slot.get_or_init(|| dispatch.downgrade());
                log::trace!("wired {} middleware", middleware.len());

                Ok(store.with_dispatch(dispatch))
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::{apply_middleware, Middleware, MiddlewareApi, MiddlewareEnhancer};
    use crate::{
        compose, Action, Composable, Dispatch, Envelope, ReentrancyError, Result, Store,
        StoreCreator, StoreEnhancer, StoreError,
    };
    use std::{
        borrow::Cow,
        cell::{Cell, RefCell},
        rc::Rc,
    };

    #[derive(Debug, Clone, PartialEq)]
    enum TestAction {
        Increment,
        Decrement,
    }

    impl Action for TestAction {
        fn action_type(&self) -> Option<Cow<'_, str>> {
            Some(Cow::Borrowed(match self {
                TestAction::Increment => "INCREMENT",
                TestAction::Decrement => "DECREMENT",
            }))
        }
    }

    fn counter(
        state: Option<&Rc<i32>>,
        action: &Envelope<'_, TestAction>,
    ) -> Result<Option<Rc<i32>>> {
        let state = state.cloned().unwrap_or_else(|| Rc::new(0));
        Ok(Some(match action.action() {
            Some(TestAction::Increment) => Rc::new(*state + 1),
            Some(TestAction::Decrement) => Rc::new(*state - 1),
            None => state,
        }))
    }

    #[derive(Default)]
    struct CountingMiddleware {
        calls: Rc<Cell<usize>>,
    }

    impl<State, A> Middleware<State, A> for CountingMiddleware {
        fn on_dispatch(
            &self,
            _api: &MiddlewareApi<State, A>,
            action: A,
            next: &Dispatch<A>,
        ) -> Result<A> {
            self.calls.set(self.calls.get() + 1);
            next.dispatch(action)
        }
    }

    struct RecordingMiddleware {
        name: &'static str,
        log: Rc<RefCell<Vec<String>>>,
    }

    impl<State, A> Middleware<State, A> for RecordingMiddleware {
        fn on_dispatch(
            &self,
            _api: &MiddlewareApi<State, A>,
            action: A,
            next: &Dispatch<A>,
        ) -> Result<A> {
            self.log.borrow_mut().push(format!("{} before", self.name));
            let result = next.dispatch(action);
            self.log.borrow_mut().push(format!("{} after", self.name));
            result
        }
    }

    /// Swallows every decrement.
    struct NoDecrements;

    impl Middleware<i32, TestAction> for NoDecrements {
        fn on_dispatch(
            &self,
            _api: &MiddlewareApi<i32, TestAction>,
            action: TestAction,
            next: &Dispatch<TestAction>,
        ) -> Result<TestAction> {
            match action {
                TestAction::Decrement => Ok(action),
                _ => next.dispatch(action),
            }
        }
    }

    /// Turns every decrement into an increment.
    struct Inverting;

    impl Middleware<i32, TestAction> for Inverting {
        fn on_dispatch(
            &self,
            _api: &MiddlewareApi<i32, TestAction>,
            action: TestAction,
            next: &Dispatch<TestAction>,
        ) -> Result<TestAction> {
            match action {
                TestAction::Decrement => next.dispatch(TestAction::Increment),
                _ => next.dispatch(action),
            }
        }
    }

    #[derive(Default)]
    struct CapturingMiddleware {
        api: Rc<RefCell<Option<MiddlewareApi<i32, TestAction>>>>,
        wiring_result: Rc<RefCell<Option<Result<TestAction>>>>,
    }

    impl Middleware<i32, TestAction> for CapturingMiddleware {
        fn on_wire(&self, api: &MiddlewareApi<i32, TestAction>) -> Result<()> {
            *self.wiring_result.borrow_mut() = Some(api.dispatch(TestAction::Increment));
            *self.api.borrow_mut() = Some(api.clone());
            Ok(())
        }
    }

    /// Fails the wiring by dispatching too early.
    struct EagerMiddleware;

    impl Middleware<i32, TestAction> for EagerMiddleware {
        fn on_wire(&self, api: &MiddlewareApi<i32, TestAction>) -> Result<()> {
            api.dispatch(TestAction::Increment)?;
            Ok(())
        }
    }

    #[test]
    fn next_is_called_once_per_dispatch() {
        let counting = CountingMiddleware::default();
        let calls = counting.calls.clone();
        let middleware: Vec<Box<dyn Middleware<i32, TestAction>>> = vec![Box::new(counting)];
        let store = Store::builder(counter)
            .enhancer(apply_middleware(middleware))
            .build()
            .unwrap();

        assert_eq!(
            store.dispatch(TestAction::Increment),
            Ok(TestAction::Increment)
        );
        store.dispatch(TestAction::Increment).unwrap();

        assert_eq!(*store.get_state().unwrap(), 2);
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn first_middleware_is_outermost() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let store = Store::builder(counter)
            .enhancer(
                MiddlewareEnhancer::new()
                    .with(RecordingMiddleware {
                        name: "first",
                        log: log.clone(),
                    })
                    .with(RecordingMiddleware {
                        name: "second",
                        log: log.clone(),
                    }),
            )
            .build()
            .unwrap();

        store.dispatch(TestAction::Increment).unwrap();
        assert_eq!(
            *log.borrow(),
            vec!["first before", "second before", "second after", "first after"]
        );
    }

    #[test]
    fn middleware_can_swallow_actions() {
        let counting = CountingMiddleware::default();
        let calls = counting.calls.clone();
        let store = Store::builder(counter)
            .enhancer(MiddlewareEnhancer::new().with(NoDecrements).with(counting))
            .build()
            .unwrap();

        store.dispatch(TestAction::Decrement).unwrap();
        assert_eq!(*store.get_state().unwrap(), 0);
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn middleware_can_replace_actions() {
        let store = Store::builder(counter)
            .enhancer(MiddlewareEnhancer::new().with(Inverting))
            .build()
            .unwrap();

        assert_eq!(
            store.dispatch(TestAction::Decrement),
            Ok(TestAction::Increment)
        );
        assert_eq!(*store.get_state().unwrap(), 1);
    }

    #[test]
    fn dispatch_while_wiring_is_rejected() {
        let capturing = CapturingMiddleware::default();
        let wiring_result = capturing.wiring_result.clone();
        let store = Store::builder(counter)
            .enhancer(MiddlewareEnhancer::new().with(capturing))
            .build()
            .unwrap();

        assert_eq!(
            *wiring_result.borrow(),
            Some(Err(ReentrancyError::ConstructingMiddleware.into()))
        );
        assert_eq!(*store.get_state().unwrap(), 0);
    }

    #[test]
    fn failed_wiring_fails_the_build() {
        let result = Store::builder(counter)
            .enhancer(MiddlewareEnhancer::new().with(EagerMiddleware))
            .build();
        assert_eq!(
            result.err(),
            Some(ReentrancyError::ConstructingMiddleware.into())
        );
    }

    #[test]
    fn api_dispatch_goes_through_the_whole_chain() {
        let capturing = CapturingMiddleware::default();
        let api = capturing.api.clone();
        let counting = CountingMiddleware::default();
        let calls = counting.calls.clone();
        let store = Store::builder(counter)
            .enhancer(MiddlewareEnhancer::new().with(counting).with(capturing))
            .build()
            .unwrap();

        let api = api.borrow().clone().unwrap();
        api.dispatch(TestAction::Increment).unwrap();

        assert_eq!(calls.get(), 1);
        assert_eq!(*api.get_state().unwrap(), 1);
        assert_eq!(*store.get_state().unwrap(), 1);

        drop(store);
        assert_eq!(
            api.dispatch(TestAction::Increment),
            Err(StoreError::Dropped)
        );
    }

    #[test]
    fn preloaded_state_reaches_the_inner_store() {
        let counting = CountingMiddleware::default();
        let calls = counting.calls.clone();
        let store = Store::builder(counter)
            .preloaded_state(10)
            .enhancer(MiddlewareEnhancer::new().with(counting))
            .build()
            .unwrap();

        store.dispatch(TestAction::Decrement).unwrap();
        assert_eq!(*store.get_state().unwrap(), 9);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn listeners_survive_enhancement() {
        let store = Store::builder(counter)
            .enhancer(MiddlewareEnhancer::new().with(Inverting))
            .build()
            .unwrap();
        let seen = Rc::new(Cell::new(0));
        let seen_copy = seen.clone();
        let store_copy = store.clone();
        store
            .subscribe(move || -> Result<()> {
                seen_copy.set(*store_copy.get_state()?);
                Ok(())
            })
            .unwrap();

        store.dispatch(TestAction::Decrement).unwrap();
        assert_eq!(seen.get(), 1);
    }

    #[test]
    fn enhancers_compose() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let outer = MiddlewareEnhancer::new().with(RecordingMiddleware {
            name: "outer",
            log: log.clone(),
        });
        let inner = MiddlewareEnhancer::new().with(RecordingMiddleware {
            name: "inner",
            log: log.clone(),
        });

        let enhancers: Vec<Composable<StoreCreator<i32, TestAction>>> = vec![
            Box::new(move |create: StoreCreator<i32, TestAction>| outer.enhance(create)),
            Box::new(move |create: StoreCreator<i32, TestAction>| inner.enhance(create)),
        ];
        let store = Store::builder(counter)
            .enhancer(compose(enhancers))
            .build()
            .unwrap();

        store.dispatch(TestAction::Increment).unwrap();
        assert_eq!(
            *log.borrow(),
            vec!["outer before", "inner before", "inner after", "outer after"]
        );
    }
}
