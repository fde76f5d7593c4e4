mod action;
mod bind;
mod combine;
mod compose;
mod dispatch;
mod error;
mod listener;
pub mod middleware;
mod observable;
mod reducer;
mod store;

pub use action::{Action, Envelope};
pub use bind::*;
pub use combine::*;
pub use compose::*;
pub use dispatch::Dispatch;
pub use error::*;
pub use listener::{Listener, Subscription};
pub use observable::*;
pub use reducer::*;
pub use store::{create_store, Store, StoreBuilder, StoreCreator, StoreEnhancer};
