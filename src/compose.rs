/// A single-argument function which can be passed to [compose()].
pub type Composable<T> = Box<dyn Fn(T) -> T>;

/// Compose single-argument functions from right to left.
///
/// `compose(vec![f, g, h])(x)` is `f(g(h(x)))`. Composing no functions
/// yields the identity function, composing one function yields that
/// function.
///
/// ```
/// use reactive_store::{compose, Composable};
///
/// let functions: Vec<Composable<i32>> = vec![Box::new(|x: i32| x + 1), Box::new(|x: i32| x * 2)];
/// assert_eq!(compose(functions)(5), 11);
/// ```
pub fn compose<T: 'static>(functions: Vec<Composable<T>>) -> Composable<T> {
    functions
        .into_iter()
        .reduce(|outer, inner| Box::new(move |value: T| outer(inner(value))) as Composable<T>)
        .unwrap_or_else(|| Box::new(|value: T| value))
}
