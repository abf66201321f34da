//! State model for declarative page composition: values, session storage,
//! state cells and namespaces.

pub mod cell;
pub mod collections;
pub mod error;
pub mod namespace;
pub mod persist;
pub mod store;
pub mod value;

pub use cell::{CellOptions, FormatFn, Scope, StateCell, CURRENT_PAGE, GLOBAL_PREFIX};
pub use error::StateError;
pub use namespace::{Arg, KeySignature, Namespace, ResolvedCall, KEY_PARAM};
pub use persist::{PersistState, PersistenceTracker};
pub use store::{MemorySessionStore, SessionStore};
pub use value::Value;

pub use indexmap::IndexMap;
