//! Declarative page composition: component configs and the renderer that
//! walks them against a host widget library.

mod component;
mod error;
mod renderer;
mod schema;

pub use component::{
    Anchor, Component, ContainerFn, DecoratorFn, RenderFn, ScopedResource, WidgetFn,
};
pub use error::RenderError;
pub use renderer::PageRenderer;
pub use schema::{Children, ComponentConfig, Condition, ConfigUpdate, PageConfig, Slot};

pub use configurator_core::{
    Arg, CellOptions, MemorySessionStore, Namespace, ResolvedCall, Scope, SessionStore,
    StateCell, StateError, Value,
};
