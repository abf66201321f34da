//! Testing utilities: an in-memory host that records every widget call and
//! scope transition made by a render pass.

pub mod testing;

pub use testing::*;

pub mod prelude {
    pub use crate::testing::*;
}
