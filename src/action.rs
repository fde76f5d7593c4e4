use crate::error::ValidationError;
use std::borrow::Cow;

/// An `Action` describes an intended change to the state held by a
/// [Store](crate::Store). It is submitted via
/// [Store::dispatch()](crate::Store::dispatch()) and handed to the
/// store's [Reducer](crate::Reducer) wrapped in an [Envelope].
///
/// An action must be a plain record carrying a discriminant (its
/// "type"). For application enums this is usually just the variant
/// name:
///
/// ```
/// use reactive_store::Action;
/// use std::borrow::Cow;
///
/// enum CounterAction {
///     Increment,
///     Decrement,
/// }
///
/// impl Action for CounterAction {
///     fn action_type(&self) -> Option<Cow<'_, str>> {
///         Some(Cow::Borrowed(match self {
///             CounterAction::Increment => "INCREMENT",
///             CounterAction::Decrement => "DECREMENT",
///         }))
///     }
/// }
/// ```
pub trait Action {
    /// The discriminant of this action, or `None` if it is absent.
    fn action_type(&self) -> Option<Cow<'_, str>>;

    /// Whether this action is a plain key-value record which the core
    /// [Store::dispatch()](crate::Store::dispatch()) accepts. Actions
    /// of any other kind need to be handled by middleware before they
    /// reach the store.
    fn is_plain(&self) -> bool {
        true
    }

    /// Whether the discriminant is blank, in which case error messages
    /// refer to "an action" rather than naming it.
    fn is_anonymous(&self) -> bool {
        self.action_type()
            .map_or(true, |action_type| action_type.is_empty())
    }
}

/// JSON actions: plain when they are an object, with the discriminant
/// taken from the `"type"` member. A `null` type is present, only a
/// missing member counts as absent.
impl Action for serde_json::Value {
    fn action_type(&self) -> Option<Cow<'_, str>> {
        match self.get("type")? {
            serde_json::Value::String(action_type) => Some(Cow::Borrowed(action_type.as_str())),
            other => Some(Cow::Owned(other.to_string())),
        }
    }

    fn is_plain(&self) -> bool {
        self.is_object()
    }

    /// `null`, `false`, `0` and `""` types are blank.
    fn is_anonymous(&self) -> bool {
        match self.get("type") {
            None | Some(serde_json::Value::Null) | Some(serde_json::Value::Bool(false)) => true,
            Some(serde_json::Value::Number(number)) => number.as_f64() == Some(0.0),
            Some(serde_json::Value::String(action_type)) => action_type.is_empty(),
            Some(_) => false,
        }
    }
}

/// Check that an application action may be dispatched to the core
/// store.
pub(crate) fn validate<A: Action>(action: &A) -> Result<(), ValidationError> {
    if !action.is_plain() {
        return Err(ValidationError::NotPlain);
    }

    if action.action_type().is_none() {
        return Err(ValidationError::MissingType);
    }

    Ok(())
}

/// Signals reserved by the store itself. These never collide with
/// application actions, and application code has no way to build or
/// match on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ControlSignal {
    /// Dispatched once when a store is created, so every reducer
    /// returns its initial state.
    Init,
    /// Dispatched after [Store::replace_reducer()](crate::Store::replace_reducer()).
    Replace,
    /// Used by [combine_reducers()](crate::combine_reducers()) to
    /// check that reducers handle unknown actions.
    Probe,
}

impl ControlSignal {
    fn name(&self) -> &'static str {
        match self {
            ControlSignal::Init => "@@reactive-store/INIT",
            ControlSignal::Replace => "@@reactive-store/REPLACE",
            ControlSignal::Probe => "@@reactive-store/PROBE_UNKNOWN_ACTION",
        }
    }
}

#[derive(Debug)]
enum Payload<'a, A> {
    Action(&'a A),
    Control(ControlSignal),
}

impl<'a, A> Clone for Payload<'a, A> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, A> Copy for Payload<'a, A> {}

/// What a [Reducer](crate::Reducer) receives: either a borrowed
/// application `Action` or one of the store's reserved control
/// signals.
///
/// Reducers should match on [Envelope::action()] and return the
/// previous state (or their initial state if it is absent) for
/// anything they don't recognise, control signals included.
#[derive(Debug)]
pub struct Envelope<'a, A> {
    payload: Payload<'a, A>,
}

impl<'a, A> Clone for Envelope<'a, A> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, A> Copy for Envelope<'a, A> {}

impl<'a, A> Envelope<'a, A> {
    /// Wrap an application action, e.g. to call a reducer directly in
    /// a test.
    pub fn new(action: &'a A) -> Self {
        Self {
            payload: Payload::Action(action),
        }
    }

    /// The application action, or `None` for a control signal.
    pub fn action(&self) -> Option<&'a A> {
        match self.payload {
            Payload::Action(action) => Some(action),
            Payload::Control(_) => None,
        }
    }

    pub(crate) fn is_init(&self) -> bool {
        matches!(self.payload, Payload::Control(ControlSignal::Init))
    }

    pub(crate) fn is_replace(&self) -> bool {
        matches!(self.payload, Payload::Control(ControlSignal::Replace))
    }
}

impl<A> Envelope<'static, A> {
    pub(crate) fn init() -> Self {
        Self::control(ControlSignal::Init)
    }

    pub(crate) fn replace() -> Self {
        Self::control(ControlSignal::Replace)
    }

    pub(crate) fn probe() -> Self {
        Self::control(ControlSignal::Probe)
    }

    fn control(signal: ControlSignal) -> Self {
        Self {
            payload: Payload::Control(signal),
        }
    }
}

impl<'a, A: Action> Envelope<'a, A> {
    /// The discriminant of the wrapped action. Control signals report
    /// their reserved names.
    pub fn action_type(&self) -> Option<Cow<'a, str>> {
        match self.payload {
            Payload::Action(action) => action.action_type(),
            Payload::Control(signal) => Some(Cow::Borrowed(signal.name())),
        }
    }

    /// How this action is named in error messages.
    pub(crate) fn describe(&self) -> String {
        match (&self.payload, self.action_type()) {
            (Payload::Action(action), _) if action.is_anonymous() => "an action".to_string(),
            (_, Some(action_type)) if !action_type.is_empty() => {
                format!("action \"{}\"", action_type)
            }
            _ => "an action".to_string(),
        }
    }
}

impl<'a, A> From<&'a A> for Envelope<'a, A> {
    fn from(action: &'a A) -> Self {
        Envelope::new(action)
    }
}
