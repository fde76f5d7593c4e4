use crate::{
    action,
    listener::{ListenerEntry, ListenerId, ListenerRegistry},
    observable::StateObservable,
    Action, BoxedReducer, Dispatch, Envelope, Listener, ReentrancyError, Reducer, Result,
    Subscription, ValidationError,
};
use std::{
    cell::{Cell, RefCell},
    fmt::Debug,
    rc::{Rc, Weak},
};

/// Constructs a [Store] from a reducer and an optional preloaded
/// state. [StoreEnhancer]s take one of these and return another.
pub type StoreCreator<State, Action> =
    Rc<dyn Fn(BoxedReducer<State, Action>, Option<Rc<State>>) -> Result<Store<State, Action>>>;

/// A higher-order store constructor which adds some capability to the
/// [Store]s it creates, such as
/// [apply_middleware()](crate::middleware::apply_middleware()).
///
/// Any `Fn(StoreCreator) -> StoreCreator` is an enhancer, so enhancers
/// can be chained with [compose()](crate::compose()).
pub trait StoreEnhancer<State, Action> {
    /// Take the store constructor (ultimately the one which builds
    /// the core [Store]) and return a constructor with the same
    /// signature.
    fn enhance(&self, create: StoreCreator<State, Action>) -> StoreCreator<State, Action>;
}

impl<State, Action, F> StoreEnhancer<State, Action> for F
where
    F: Fn(StoreCreator<State, Action>) -> StoreCreator<State, Action>,
{
    fn enhance(&self, create: StoreCreator<State, Action>) -> StoreCreator<State, Action> {
        (self)(create)
    }
}

/// Whether the store's reducer is currently executing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Dispatching,
}

/// Holds a store in [Phase::Dispatching] for as long as it lives, and
/// returns it to [Phase::Idle] when dropped, whether the reducer
/// returned normally, returned an error or panicked.
struct DispatchGuard<'a> {
    phase: &'a Cell<Phase>,
}

impl<'a> DispatchGuard<'a> {
    fn acquire(phase: &'a Cell<Phase>) -> Result<Self> {
        if phase.get() == Phase::Dispatching {
            return Err(ReentrancyError::Dispatch.into());
        }
        phase.set(Phase::Dispatching);
        Ok(Self { phase })
    }
}

impl<'a> Drop for DispatchGuard<'a> {
    fn drop(&mut self) {
        self.phase.set(Phase::Idle);
    }
}

/// Run the `reducer` with the store in [Phase::Dispatching].
fn reduce_guarded<State, A: Action>(
    phase: &Cell<Phase>,
    reducer: &dyn Reducer<State, A>,
    prev_state: Option<&Rc<State>>,
    action: &Envelope<'_, A>,
) -> Result<Rc<State>> {
    let next_state = {
        let _guard = DispatchGuard::acquire(phase)?;
        reducer.reduce(prev_state, action)?
    };

    next_state.ok_or_else(|| {
        ValidationError::RootUndefined {
            action: action.describe(),
        }
        .into()
    })
}

type Listeners = Rc<Vec<ListenerEntry>>;

/// The state, reducer and listeners of a [Store], exclusively owned
/// and mutated by it.
pub(crate) struct StoreCore<State, A> {
    phase: Cell<Phase>,
    reducer: RefCell<Rc<dyn Reducer<State, A>>>,
    state: RefCell<Rc<State>>,
    /// The listeners being notified by the most recent dispatch.
    current_listeners: RefCell<Listeners>,
    /// The listeners the next dispatch will notify. Shares its list
    /// with `current_listeners` until the first subscription change
    /// after a dispatch took its snapshot.
    next_listeners: RefCell<Listeners>,
    next_listener_id: Cell<ListenerId>,
}

impl<State, A> StoreCore<State, A> {
    fn is_dispatching(&self) -> bool {
        self.phase.get() == Phase::Dispatching
    }

    pub(crate) fn get_state(&self) -> Result<Rc<State>> {
        if self.is_dispatching() {
            return Err(ReentrancyError::GetState.into());
        }
        Ok(Rc::clone(&self.state.borrow()))
    }

    /// Give `next_listeners` its own list if it is still shared with
    /// the snapshot in `current_listeners`.
    fn ensure_can_mutate_next_listeners(&self) {
        let current_listeners = self.current_listeners.borrow();
        let mut next_listeners = self.next_listeners.borrow_mut();
        if Rc::ptr_eq(&current_listeners, &next_listeners) {
            *next_listeners = Rc::new(Vec::clone(&current_listeners));
        }
    }
}

impl<State, A> StoreCore<State, A>
where
    State: 'static,
    A: Action + 'static,
{
    /// Create the core, dispatching the init control signal to the
    /// `reducer` to produce the initial state. No listeners can exist
    /// yet, so there is nobody to notify.
    fn new(reducer: Rc<dyn Reducer<State, A>>, preloaded_state: Option<Rc<State>>) -> Result<Self> {
        let phase = Cell::new(Phase::Idle);
        let state = reduce_guarded(
            &phase,
            reducer.as_ref(),
            preloaded_state.as_ref(),
            &Envelope::init(),
        )?;
        let listeners: Listeners = Rc::new(Vec::new());

        Ok(Self {
            phase,
            reducer: RefCell::new(reducer),
            state: RefCell::new(state),
            current_listeners: RefCell::new(Rc::clone(&listeners)),
            next_listeners: RefCell::new(listeners),
            next_listener_id: Cell::new(0),
        })
    }

    pub(crate) fn subscribe(self: &Rc<Self>, listener: Rc<dyn Listener>) -> Result<Subscription> {
        if self.is_dispatching() {
            return Err(ReentrancyError::Subscribe.into());
        }

        let id = self.next_listener_id.get();
        self.next_listener_id.set(id + 1);

        self.ensure_can_mutate_next_listeners();
        Rc::make_mut(&mut self.next_listeners.borrow_mut()).push(ListenerEntry { id, listener });

        let registry: Weak<dyn ListenerRegistry> = Rc::downgrade(self) as Weak<dyn ListenerRegistry>;
        Ok(Subscription::new(id, registry))
    }

    /// The core dispatch which every middleware chain ends in.
    fn dispatch(&self, action: A) -> Result<A> {
        action::validate(&action)?;
        self.dispatch_envelope(&Envelope::new(&action))?;
        Ok(action)
    }

    fn dispatch_envelope(&self, action: &Envelope<'_, A>) -> Result<()> {
        log::trace!("dispatching {}", action.describe());

        let reducer = Rc::clone(&self.reducer.borrow());
        let prev_state = Rc::clone(&self.state.borrow());
        let next_state = reduce_guarded(&self.phase, reducer.as_ref(), Some(&prev_state), action)?;
        *self.state.borrow_mut() = next_state;

        let listeners = {
            let next_listeners = Rc::clone(&self.next_listeners.borrow());
            *self.current_listeners.borrow_mut() = Rc::clone(&next_listeners);
            next_listeners
        };

        for entry in listeners.iter() {
            entry.listener.notify()?;
        }

        Ok(())
    }

    fn replace_reducer(&self, reducer: Rc<dyn Reducer<State, A>>) -> Result<()> {
        *self.reducer.borrow_mut() = reducer;
        self.dispatch_envelope(&Envelope::replace())
    }
}

impl<State, A> ListenerRegistry for StoreCore<State, A> {
    fn remove_listener(&self, id: ListenerId) -> Result<()> {
        if self.is_dispatching() {
            return Err(ReentrancyError::Unsubscribe.into());
        }

        self.ensure_can_mutate_next_listeners();
        let mut next_listeners = self.next_listeners.borrow_mut();
        let listeners = Rc::make_mut(&mut next_listeners);
        if let Some(index) = listeners.iter().position(|entry| entry.id == id) {
            listeners.remove(index);
        }
        Ok(())
    }
}

/// This struct is designed to operate as a central source of truth
/// and global "immutable" state within your application.
///
/// The current state of this store ([Store::get_state()]) can only be
/// modified by dispatching an `Action` via [Store::dispatch()]. The
/// action is taken by the [Reducer] you provided at construction,
/// which produces the new current state. The previous state is never
/// mutated, and remains valid for anything which still holds it.
///
/// [Listener]s subscribed with [Store::subscribe()] are notified after
/// every dispatch, in subscription order.
///
/// A `Store` is a cheap-clone handle: clones share the same state.
/// Everything runs synchronously on the calling thread; the store
/// guards against reentrancy (a reducer touching the store) rather
/// than against parallelism.
///
/// ```
/// use reactive_store::{create_store, Action, Envelope, Result};
/// use std::{borrow::Cow, rc::Rc};
///
/// enum CounterAction {
///     Increment,
/// }
///
/// impl Action for CounterAction {
///     fn action_type(&self) -> Option<Cow<'_, str>> {
///         Some(Cow::Borrowed("INCREMENT"))
///     }
/// }
///
/// fn counter(
///     state: Option<&Rc<i32>>,
///     action: &Envelope<'_, CounterAction>,
/// ) -> Result<Option<Rc<i32>>> {
///     let state = state.cloned().unwrap_or_else(|| Rc::new(0));
///     Ok(Some(match action.action() {
///         Some(CounterAction::Increment) => Rc::new(*state + 1),
///         None => state,
///     }))
/// }
///
/// let store = create_store(counter).unwrap();
/// assert_eq!(*store.get_state().unwrap(), 0);
///
/// store.dispatch(CounterAction::Increment).unwrap();
/// assert_eq!(*store.get_state().unwrap(), 1);
/// ```
pub struct Store<State, A> {
    core: Rc<StoreCore<State, A>>,
    /// The entry point for [Store::dispatch()], which may be wrapped by
    /// middleware.
    dispatch: Dispatch<A>,
}

impl<State, A> Store<State, A>
where
    State: 'static,
    A: Action + 'static,
{
    /// Create a new [Store] which uses the specified `reducer` to
    /// handle `Action`s. The reducer produces the initial state.
    pub fn new<R: Reducer<State, A> + 'static>(reducer: R) -> Result<Self> {
        Self::create(Rc::new(reducer), None)
    }

    /// Start building a [Store] with a preloaded state and/or a
    /// [StoreEnhancer].
    pub fn builder<R: Reducer<State, A> + 'static>(reducer: R) -> StoreBuilder<State, A> {
        StoreBuilder::new(reducer)
    }

    /// The [StoreCreator] which builds the core store, without any
    /// enhancement.
    pub fn creator() -> StoreCreator<State, A> {
        Rc::new(
            |reducer: BoxedReducer<State, A>, preloaded_state: Option<Rc<State>>| {
                Self::create(Rc::from(reducer), preloaded_state)
            },
        )
    }

    fn create(
        reducer: Rc<dyn Reducer<State, A>>,
        preloaded_state: Option<Rc<State>>,
    ) -> Result<Self> {
        let core = Rc::new(StoreCore::new(reducer, preloaded_state)?);
        let dispatch = {
            let core = Rc::clone(&core);
            Dispatch::new(move |action| core.dispatch(action))
        };
        Ok(Self { core, dispatch })
    }

    /// Get the current `State` stored in this store.
    ///
    /// Fails with [ReentrancyError::GetState] if called while the
    /// reducer is executing; the reducer already has the state as its
    /// argument.
    pub fn get_state(&self) -> Result<Rc<State>> {
        self.core.get_state()
    }

    /// Dispatch an `Action` to be passed to the [Reducer] in order to
    /// produce the next state, then notify the listeners. Returns the
    /// action, unless middleware decided otherwise.
    ///
    /// Fails with a [ValidationError] if the action isn't plain or has
    /// no type, and with [ReentrancyError::Dispatch] if called from
    /// within the reducer. If the reducer fails, the state is left as
    /// it was and no listener is notified.
    pub fn dispatch(&self, action: A) -> Result<A> {
        self.dispatch.dispatch(action)
    }

    /// The dispatch capability of this store, e.g. for
    /// [bind_action_creators()](crate::bind_action_creators()).
    pub fn dispatcher(&self) -> Dispatch<A> {
        self.dispatch.clone()
    }

    /// Subscribe a [Listener] to be notified after every dispatch.
    ///
    /// Changes to the subscriptions made while listeners are being
    /// notified only take effect from the next dispatch on.
    pub fn subscribe<L: Listener + 'static>(&self, listener: L) -> Result<Subscription> {
        self.core.subscribe(Rc::new(listener))
    }

    /// Replace the [Reducer] used to calculate the state, then
    /// dispatch the replace control signal so every part of the state
    /// is revalidated by the new reducer.
    pub fn replace_reducer<R: Reducer<State, A> + 'static>(&self, reducer: R) -> Result<()> {
        self.core.replace_reducer(Rc::new(reducer))
    }

    /// Interoperability point for observer-based consumers.
    pub fn observable(&self) -> StateObservable<State, A> {
        StateObservable::new(Rc::clone(&self.core))
    }

    /// This store with its dispatch entry point replaced, sharing
    /// everything else. Used by enhancers.
    pub fn with_dispatch(self, dispatch: Dispatch<A>) -> Self {
        Self {
            core: self.core,
            dispatch,
        }
    }
}

impl<State, A> Clone for Store<State, A> {
    fn clone(&self) -> Self {
        Self {
            core: Rc::clone(&self.core),
            dispatch: self.dispatch.clone(),
        }
    }
}

/// Stores are equal when they share the same state.
impl<State, A> PartialEq for Store<State, A> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.core, &other.core)
    }
}

impl<State, A> Debug for Store<State, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Store @ {:p}", Rc::as_ptr(&self.core))
    }
}

/// Create a new [Store] with the specified `reducer`, see
/// [Store::builder()] for preloading state or adding an enhancer.
pub fn create_store<State, A, R>(reducer: R) -> Result<Store<State, A>>
where
    State: 'static,
    A: Action + 'static,
    R: Reducer<State, A> + 'static,
{
    Store::new(reducer)
}

/// Builds a [Store], see [Store::builder()].
pub struct StoreBuilder<State, A> {
    reducer: BoxedReducer<State, A>,
    preloaded_state: Option<Rc<State>>,
    enhancer: Option<Box<dyn StoreEnhancer<State, A>>>,
}

impl<State, A> StoreBuilder<State, A>
where
    State: 'static,
    A: Action + 'static,
{
    pub fn new<R: Reducer<State, A> + 'static>(reducer: R) -> Self {
        Self {
            reducer: Box::new(reducer),
            preloaded_state: None,
            enhancer: None,
        }
    }

    /// The state to pass to the reducer along with the init control
    /// signal, e.g. to restore a previous session.
    pub fn preloaded_state<S: Into<Rc<State>>>(mut self, preloaded_state: S) -> Self {
        self.preloaded_state = Some(preloaded_state.into());
        self
    }

    /// Construct the store through this enhancer.
    pub fn enhancer<E: StoreEnhancer<State, A> + 'static>(mut self, enhancer: E) -> Self {
        self.enhancer = Some(Box::new(enhancer));
        self
    }

    pub fn build(self) -> Result<Store<State, A>> {
        let create = match &self.enhancer {
            Some(enhancer) => enhancer.enhance(Store::creator()),
            None => Store::creator(),
        };
        create(self.reducer, self.preloaded_state)
    }
}
