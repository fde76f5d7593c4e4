use crate::{Envelope, Result};
use std::rc::Rc;

/// Using the [reduce()](Reducer::reduce()) method, implementors of
/// this trait take an action submitted to a store via
/// [Store::dispatch()](crate::Store::dispatch()) and the previous
/// `State`, and produce the next `State`. The previous state is never
/// mutated.
///
/// Any `Fn(Option<&Rc<State>>, &Envelope<Action>) -> Result<Option<Rc<State>>>`
/// is a reducer, plain `fn` items being the most convenient.
pub trait Reducer<State, Action> {
    /// Take the `prev_state` and an action submitted to a store via
    /// [Store::dispatch()](crate::Store::dispatch()), and return the
    /// next `State`.
    ///
    /// A reducer must return `Some` state for every action:
    ///
    /// + its initial state when `prev_state` is `None`, whatever the
    ///   action is;
    /// + the `prev_state` unchanged (the same [Rc]) for any action it
    ///   doesn't recognise, including the store's control signals.
    ///
    /// Returning `None` is a contract violation which the store and
    /// [combine_reducers()](crate::combine_reducers()) report as a
    /// [ValidationError](crate::ValidationError). Returning `Err`
    /// aborts the dispatch, leaving the store's state as it was.
    fn reduce(
        &self,
        prev_state: Option<&Rc<State>>,
        action: &Envelope<'_, Action>,
    ) -> Result<Option<Rc<State>>>;
}

impl<State, Action, F> Reducer<State, Action> for F
where
    F: Fn(Option<&Rc<State>>, &Envelope<'_, Action>) -> Result<Option<Rc<State>>>,
{
    fn reduce(
        &self,
        prev_state: Option<&Rc<State>>,
        action: &Envelope<'_, Action>,
    ) -> Result<Option<Rc<State>>> {
        (self)(prev_state, action)
    }
}

pub type BoxedReducer<State, Action> = Box<dyn Reducer<State, Action>>;

#[cfg(test)]
mod tests {
    use crate::{Envelope, Reducer, Result};
    use std::rc::Rc;

    #[derive(Debug, PartialEq)]
    enum TestAction {
        Increment,
        Unknown,
    }

    struct CounterReducer;

    impl Reducer<i32, TestAction> for CounterReducer {
        fn reduce(
            &self,
            prev_state: Option<&Rc<i32>>,
            action: &Envelope<'_, TestAction>,
        ) -> Result<Option<Rc<i32>>> {
            let prev_state = prev_state.cloned().unwrap_or_else(|| Rc::new(0));
            Ok(Some(match action.action() {
                Some(TestAction::Increment) => Rc::new(*prev_state + 1),
                _ => prev_state,
            }))
        }
    }

    #[test]
    fn struct_reducer() {
        let state = CounterReducer
            .reduce(None, &Envelope::init())
            .unwrap()
            .unwrap();
        assert_eq!(*state, 0);

        let next = CounterReducer
            .reduce(Some(&state), &Envelope::new(&TestAction::Increment))
            .unwrap()
            .unwrap();
        assert_eq!(*next, 1);

        let unchanged = CounterReducer
            .reduce(Some(&next), &Envelope::new(&TestAction::Unknown))
            .unwrap()
            .unwrap();
        assert!(Rc::ptr_eq(&next, &unchanged));
    }

    fn greeting(
        prev_state: Option<&Rc<String>>,
        _action: &Envelope<'_, TestAction>,
    ) -> Result<Option<Rc<String>>> {
        Ok(Some(
            prev_state
                .cloned()
                .unwrap_or_else(|| Rc::new("initial".to_string())),
        ))
    }

    #[test]
    fn fn_reducer() {
        let state = greeting.reduce(None, &Envelope::probe()).unwrap().unwrap();
        assert_eq!(state.as_str(), "initial");

        let next = greeting
            .reduce(Some(&state), &Envelope::new(&TestAction::Increment))
            .unwrap()
            .unwrap();
        assert!(Rc::ptr_eq(&state, &next));
    }
}
