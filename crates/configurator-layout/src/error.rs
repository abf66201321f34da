use configurator_core::StateError;
use thiserror::Error;

/// Errors surfaced by a render pass. The renderer never recovers locally;
/// the first failure aborts the pass.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("component `{component}` failed")]
    Component {
        component: String,
        #[source]
        source: anyhow::Error,
    },
    #[error(transparent)]
    State(#[from] StateError),
    #[error("component `{component}` declares children but is not a container")]
    NotAContainer { component: String },
    #[error("`{component}` has no child for anchor slot {index} ({available} available)")]
    MissingSlot {
        component: String,
        index: usize,
        available: usize,
    },
    #[error("`{component}` cannot lay out {shape} children")]
    UnsupportedShape {
        component: String,
        shape: &'static str,
    },
    #[error("page has sidebar content but no sidebar scope is installed")]
    MissingSidebar,
}
