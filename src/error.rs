//! Error types for the [Store](crate::Store) and its collaborators.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error(transparent)]
    Reentrancy(#[from] ReentrancyError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A [MiddlewareApi](crate::middleware::MiddlewareApi) was used
    /// after the store it was wired into had been dropped.
    #[error("The store behind this middleware API has been dropped.")]
    Dropped,

    /// An error raised by application code (a reducer or a listener).
    #[error("{0}")]
    Custom(String),
}

impl StoreError {
    /// Create a [StoreError::Custom] from an application error message.
    pub fn custom<S: Into<String>>(message: S) -> Self {
        StoreError::Custom(message.into())
    }
}

/// Misuse of the single-writer contract: something tried to touch the
/// store while its reducer was executing, or before the middleware
/// chain finished wiring.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReentrancyError {
    #[error(
        "You may not call Store::get_state() while the reducer is executing. \
         The reducer has already received the state as an argument."
    )]
    GetState,

    #[error(
        "You may not call Store::subscribe() while the reducer is executing. \
         Subscribe from outside the reducer and call Store::get_state() in the listener instead."
    )]
    Subscribe,

    #[error("You may not unsubscribe from a store listener while the reducer is executing.")]
    Unsubscribe,

    #[error("Reducers may not dispatch actions.")]
    Dispatch,

    #[error(
        "Dispatching while constructing your middleware is not allowed. \
         Other middleware would not be applied to this dispatch."
    )]
    ConstructingMiddleware,
}

/// A contract violation by an action creator or a reducer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Actions must be plain key-value records. Use custom middleware for other kinds of actions.")]
    NotPlain,

    #[error("Actions may not have an undefined \"type\" property. Have you misspelled a constant?")]
    MissingType,

    #[error(
        "Given {action}, reducer \"{key}\" returned no state. \
         To ignore an action, you must explicitly return the previous state."
    )]
    UndefinedState { key: String, action: String },

    #[error(
        "Reducer \"{key}\" returned no state during initialization. \
         If the state passed to the reducer is absent, you must explicitly return the initial state."
    )]
    UndefinedInitialState { key: String },

    #[error(
        "Reducer \"{key}\" returned no state when probed with an unknown action. \
         You must return the current state for any unknown action, \
         or the initial state if the current state is absent."
    )]
    UndefinedProbeState { key: String },

    #[error("Given {action}, the root reducer returned no state.")]
    RootUndefined { action: String },
}
