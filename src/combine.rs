//! Splitting the [Reducer] of a [Store](crate::Store) into independent
//! reducers, each managing one key of a [CombinedState].

use crate::{Action, BoxedReducer, Envelope, Reducer, Result, StoreError, ValidationError};
use std::{
    cell::RefCell,
    collections::{btree_map, BTreeMap, HashSet},
    fmt::{Debug, Display},
    rc::Rc,
};

/// The state produced by a [CombinedReducer]: a mapping from reducer
/// key to the state managed by that reducer.
///
/// Values are kept behind [Rc]s so that a key which didn't change
/// between two states is shared by both.
#[derive(PartialEq)]
pub struct CombinedState<V> {
    entries: BTreeMap<String, Rc<V>>,
}

impl<V> CombinedState<V> {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Rc<V>> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, Rc<V>> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V> Clone for CombinedState<V> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
        }
    }
}

impl<V> Default for CombinedState<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Debug> Debug for CombinedState<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.entries.iter()).finish()
    }
}

impl<K: Into<String>, V> FromIterator<(K, V)> for CombinedState<V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(key, value)| (key.into(), Rc::new(value)))
                .collect(),
        }
    }
}

impl<'a, V> IntoIterator for &'a CombinedState<V> {
    type Item = (&'a String, &'a Rc<V>);
    type IntoIter = btree_map::Iter<'a, String, Rc<V>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Where a state with unexpected keys came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateOrigin {
    /// The preloaded state, seen along with the store's init signal.
    PreloadedState,
    /// The state the store held before a dispatch.
    PreviousState,
}

impl Display for StateOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StateOrigin::PreloadedState => {
                write!(f, "preloaded state passed to the store builder")
            }
            StateOrigin::PreviousState => write!(f, "previous state received by the reducer"),
        }
    }
}

/// A non-fatal diagnostic about the shape of a [CombinedReducer] or of
/// the state it receives. These are only reported to the diagnostics
/// sink, see [CombineReducers::on_warning()].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShapeWarning {
    NoReducers,
    MissingReducer {
        key: String,
    },
    UnexpectedKeys {
        keys: Vec<String>,
        expected: Vec<String>,
        origin: StateOrigin,
    },
}

impl Display for ShapeWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShapeWarning::NoReducers => write!(
                f,
                "Store does not have a valid reducer. \
                 Make sure combine_reducers() was given at least one reducer."
            ),
            ShapeWarning::MissingReducer { key } => {
                write!(f, "No reducer provided for key \"{}\"", key)
            }
            ShapeWarning::UnexpectedKeys {
                keys,
                expected,
                origin,
            } => write!(
                f,
                "Unexpected {} \"{}\" found in {}. \
                 Expected to find one of the known reducer keys instead: \"{}\". \
                 Unexpected keys will be ignored.",
                if keys.len() > 1 { "keys" } else { "key" },
                keys.join("\", \""),
                origin,
                expected.join("\", \""),
            ),
        }
    }
}

fn log_warning(warning: &ShapeWarning) {
    log::warn!(target: "reactive_store::combine", "{}", warning);
}

/// Builds a [CombinedReducer].
///
/// ```
/// use reactive_store::{create_store, CombineReducers, Envelope, Result};
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
/// let reducer = CombineReducers::new().reducer("count", counter).build();
/// let store = create_store(reducer).unwrap();
///
/// store.dispatch(json!({"type": "INC"})).unwrap();
/// assert_eq!(**store.get_state().unwrap().get("count").unwrap(), 1);
/// ```
pub struct CombineReducers<V, A> {
    entries: Vec<(String, Option<BoxedReducer<V, A>>)>,
    diagnostics: bool,
    on_warning: Option<Box<dyn Fn(&ShapeWarning)>>,
}

impl<V, A> CombineReducers<V, A>
where
    V: 'static,
    A: Action + 'static,
{
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            diagnostics: cfg!(debug_assertions),
            on_warning: None,
        }
    }

    /// Manage the `key` of the combined state with `reducer`.
    pub fn reducer<K: Into<String>, R: Reducer<V, A> + 'static>(self, key: K, reducer: R) -> Self {
        let reducer: BoxedReducer<V, A> = Box::new(reducer);
        self.entry(key, Some(reducer))
    }

    /// Declare the `key`, with or without a reducer. Keys without a
    /// reducer are left out of the combined state (with a
    /// [ShapeWarning::MissingReducer] when diagnostics are enabled).
    /// Declaring a key again replaces its reducer.
    pub fn entry<K: Into<String>>(mut self, key: K, reducer: Option<BoxedReducer<V, A>>) -> Self {
        let key = key.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some(entry) => entry.1 = reducer,
            None => self.entries.push((key, reducer)),
        }
        self
    }

    /// Whether to check the shape of the reducers and of the state
    /// they receive. Defaults to enabled in debug builds only.
    pub fn diagnostics(mut self, diagnostics: bool) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Where [ShapeWarning]s are reported. Defaults to [log::warn!()]
    /// with the target `reactive_store::combine`.
    pub fn on_warning<F: Fn(&ShapeWarning) + 'static>(mut self, on_warning: F) -> Self {
        self.on_warning = Some(Box::new(on_warning));
        self
    }

    /// Probe every reducer with the init signal and an unknown action.
    /// A reducer failing the probe doesn't fail the build, the
    /// resulting [CombinedReducer] fails every time it is invoked
    /// instead.
    pub fn build(self) -> CombinedReducer<V, A> {
        let on_warning = self
            .on_warning
            .unwrap_or_else(|| Box::new(log_warning));

        let mut reducers = Vec::with_capacity(self.entries.len());
        for (key, reducer) in self.entries {
            match reducer {
                Some(reducer) => reducers.push((key, reducer)),
                None if self.diagnostics => on_warning(&ShapeWarning::MissingReducer { key }),
                None => {}
            }
        }

        let shape_error = assert_reducer_shapes(&reducers).err();

        CombinedReducer {
            reducers,
            shape_error,
            diagnostics: self.diagnostics,
            on_warning,
            unexpected_keys_cache: RefCell::new(HashSet::new()),
        }
    }
}

impl<V, A> Default for CombineReducers<V, A>
where
    V: 'static,
    A: Action + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Check that each reducer returns its initial state for the init
/// signal and for an unknown action.
fn assert_reducer_shapes<V, A>(reducers: &[(String, BoxedReducer<V, A>)]) -> Result<()>
where
    A: Action + 'static,
{
    for (key, reducer) in reducers {
        if reducer.reduce(None, &Envelope::init())?.is_none() {
            return Err(ValidationError::UndefinedInitialState { key: key.clone() }.into());
        }

        if reducer.reduce(None, &Envelope::probe())?.is_none() {
            return Err(ValidationError::UndefinedProbeState { key: key.clone() }.into());
        }
    }
    Ok(())
}

/// Combine `reducers` into a single reducer with the default settings
/// of [CombineReducers].
pub fn combine_reducers<V, A, K, I>(reducers: I) -> CombinedReducer<V, A>
where
    V: 'static,
    A: Action + 'static,
    K: Into<String>,
    I: IntoIterator<Item = (K, BoxedReducer<V, A>)>,
{
    reducers
        .into_iter()
        .fold(CombineReducers::new(), |combine, (key, reducer)| {
            combine.entry(key, Some(reducer))
        })
        .build()
}

/// A [Reducer] for a [CombinedState], which hands every key to its own
/// reducer. Built with [CombineReducers] or [combine_reducers()].
///
/// When none of the reducers changed their part of the state, the
/// previous [CombinedState] is returned as is.
pub struct CombinedReducer<V, A> {
    /// In declaration order.
    reducers: Vec<(String, BoxedReducer<V, A>)>,
    shape_error: Option<StoreError>,
    diagnostics: bool,
    on_warning: Box<dyn Fn(&ShapeWarning)>,
    unexpected_keys_cache: RefCell<HashSet<String>>,
}

impl<V, A> CombinedReducer<V, A>
where
    A: Action + 'static,
{
    /// The declared reducer keys, in declaration order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.reducers.iter().map(|(key, _)| key.as_str())
    }

    fn is_declared(&self, key: &str) -> bool {
        self.reducers.iter().any(|(declared, _)| declared == key)
    }

    fn unexpected_state_shape(
        &self,
        state: &CombinedState<V>,
        action: &Envelope<'_, A>,
    ) -> Option<ShapeWarning> {
        if self.reducers.is_empty() {
            return Some(ShapeWarning::NoReducers);
        }

        let mut cache = self.unexpected_keys_cache.borrow_mut();
        let keys: Vec<String> = state
            .keys()
            .filter(|key| !self.is_declared(key) && !cache.contains(*key))
            .cloned()
            .collect();
        cache.extend(keys.iter().cloned());

        if keys.is_empty() || action.is_replace() {
            return None;
        }

        let origin = if action.is_init() {
            StateOrigin::PreloadedState
        } else {
            StateOrigin::PreviousState
        };

        Some(ShapeWarning::UnexpectedKeys {
            keys,
            expected: self.keys().map(str::to_string).collect(),
            origin,
        })
    }
}

impl<V, A> Reducer<CombinedState<V>, A> for CombinedReducer<V, A>
where
    A: Action + 'static,
{
    fn reduce(
        &self,
        prev_state: Option<&Rc<CombinedState<V>>>,
        action: &Envelope<'_, A>,
    ) -> Result<Option<Rc<CombinedState<V>>>> {
        if let Some(error) = &self.shape_error {
            return Err(error.clone());
        }

        let state = prev_state
            .cloned()
            .unwrap_or_else(|| Rc::new(CombinedState::new()));

        if self.diagnostics {
            if let Some(warning) = self.unexpected_state_shape(&state, action) {
                (self.on_warning)(&warning);
            }
        }

        let mut has_changed = false;
        let mut next_entries = BTreeMap::new();
        for (key, reducer) in &self.reducers {
            let prev_value = state.get(key);
            let next_value = reducer.reduce(prev_value, action)?.ok_or_else(|| {
                StoreError::from(ValidationError::UndefinedState {
                    key: key.clone(),
                    action: action.describe(),
                })
            })?;

            has_changed =
                has_changed || prev_value.map_or(true, |prev| !Rc::ptr_eq(prev, &next_value));
            next_entries.insert(key.clone(), next_value);
        }

        if has_changed {
            Ok(Some(Rc::new(CombinedState {
                entries: next_entries,
            })))
        } else {
            Ok(Some(state))
        }
    }
}
