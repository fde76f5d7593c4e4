//! Turning action creators into functions which dispatch the actions
//! they create.

use crate::{Dispatch, Result};
use std::{collections::BTreeMap, rc::Rc};

/// A function creating an action from its `Args`. Several arguments
/// are passed as a tuple.
pub type ActionCreator<Args, A> = Box<dyn Fn(Args) -> A>;

/// An action creator bound to a [Dispatch]: calling it creates the
/// action and immediately dispatches it.
pub struct BoundActionCreator<Args, A> {
    creator: Rc<dyn Fn(Args) -> A>,
    dispatch: Dispatch<A>,
}

impl<Args, A> BoundActionCreator<Args, A> {
    /// Create the action from `args` and dispatch it, returning the
    /// result of the dispatch.
    pub fn call(&self, args: Args) -> Result<A> {
        self.dispatch.dispatch((self.creator)(args))
    }
}

impl<Args, A> Clone for BoundActionCreator<Args, A> {
    fn clone(&self) -> Self {
        Self {
            creator: Rc::clone(&self.creator),
            dispatch: self.dispatch.clone(),
        }
    }
}

impl<Args, A> std::fmt::Debug for BoundActionCreator<Args, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundActionCreator")
            .field("dispatch", &self.dispatch)
            .finish()
    }
}

/// Bind a single action `creator` to `dispatch`, usually obtained from
/// [Store::dispatcher()](crate::Store::dispatcher()).
pub fn bind_action_creator<Args, A, F>(
    creator: F,
    dispatch: &Dispatch<A>,
) -> BoundActionCreator<Args, A>
where
    F: Fn(Args) -> A + 'static,
{
    BoundActionCreator {
        creator: Rc::new(creator),
        dispatch: dispatch.clone(),
    }
}

/// Bind every named action creator to `dispatch`. Entries without a
/// creator are left out of the result.
///
/// ```
/// use reactive_store::{bind_action_creators, create_store, ActionCreator, Envelope, Result};
/// use serde_json::{json, Value};
/// use std::rc::Rc;
///
/// fn total(state: Option<&Rc<i64>>, action: &Envelope<'_, Value>) -> Result<Option<Rc<i64>>> {
///     let state = state.cloned().unwrap_or_else(|| Rc::new(0));
///     Ok(Some(match action.action() {
///         Some(action) if action["type"] == "ADD" => {
///             Rc::new(*state + action["amount"].as_i64().unwrap_or(0))
///         }
///         _ => state,
///     }))
/// }
///
/// let store = create_store(total).unwrap();
/// let add: ActionCreator<i64, Value> = Box::new(|amount| json!({"type": "ADD", "amount": amount}));
/// let bound = bind_action_creators(vec![("add", Some(add))], &store.dispatcher());
///
/// bound["add"].call(5).unwrap();
/// assert_eq!(*store.get_state().unwrap(), 5);
/// ```
pub fn bind_action_creators<Args, A, K, I>(
    creators: I,
    dispatch: &Dispatch<A>,
) -> BTreeMap<String, BoundActionCreator<Args, A>>
where
    K: Into<String>,
    I: IntoIterator<Item = (K, Option<ActionCreator<Args, A>>)>,
{
    creators
        .into_iter()
        .filter_map(|(key, creator)| {
            let creator = creator?;
            Some((
                key.into(),
                BoundActionCreator {
                    creator: Rc::from(creator),
                    dispatch: dispatch.clone(),
                },
            ))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{bind_action_creator, bind_action_creators, ActionCreator};
    use crate::{create_store, Envelope, Result, Store, ValidationError};
    use serde_json::{json, Value};
    use std::rc::Rc;

    fn total(state: Option<&Rc<i64>>, action: &Envelope<'_, Value>) -> Result<Option<Rc<i64>>> {
        let state = state.cloned().unwrap_or_else(|| Rc::new(0));
        Ok(Some(match action.action_type().as_deref() {
            Some("ADD") => {
                let amount = action
                    .action()
                    .and_then(|action| action["amount"].as_i64())
                    .unwrap_or(0);
                Rc::new(*state + amount)
            }
            Some("RESET") => Rc::new(0),
            _ => state,
        }))
    }

    fn store() -> Store<i64, Value> {
        create_store(total).unwrap()
    }

    #[test]
    fn bound_creator_dispatches() {
        let store = store();
        let add = bind_action_creator(
            |amount: i64| json!({"type": "ADD", "amount": amount}),
            &store.dispatcher(),
        );

        assert_eq!(add.call(3), Ok(json!({"type": "ADD", "amount": 3})));
        add.clone().call(4).unwrap();
        assert_eq!(*store.get_state().unwrap(), 7);
    }

    #[test]
    fn several_arguments_as_a_tuple() {
        let store = store();
        let add_product = bind_action_creator(
            |(price, quantity): (i64, i64)| json!({"type": "ADD", "amount": price * quantity}),
            &store.dispatcher(),
        );

        add_product.call((4, 3)).unwrap();
        assert_eq!(*store.get_state().unwrap(), 12);
    }

    #[test]
    fn mapping_keeps_keys_and_drops_missing_creators() {
        let store = store();
        let add: ActionCreator<i64, Value> =
            Box::new(|amount| json!({"type": "ADD", "amount": amount}));
        let reset: ActionCreator<i64, Value> = Box::new(|_| json!({"type": "RESET"}));

        let bound = bind_action_creators(
            vec![("add", Some(add)), ("missing", None), ("reset", Some(reset))],
            &store.dispatcher(),
        );
        assert_eq!(bound.keys().collect::<Vec<_>>(), vec!["add", "reset"]);

        bound["add"].call(10).unwrap();
        assert_eq!(*store.get_state().unwrap(), 10);
        bound["reset"].call(0).unwrap();
        assert_eq!(*store.get_state().unwrap(), 0);
    }

    #[test]
    fn dispatch_errors_are_returned() {
        let store = store();
        let untyped = bind_action_creator(
            |amount: i64| json!({ "amount": amount }),
            &store.dispatcher(),
        );
        assert_eq!(untyped.call(1), Err(ValidationError::MissingType.into()));
    }
}
