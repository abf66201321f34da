//! Registration of host callables and the anchors container callables return.

use std::fmt;
use std::rc::Rc;

use configurator_core::{KeySignature, ResolvedCall, Value};

use crate::{RenderError, Slot};

/// Leaf callable: renders something and optionally returns a value.
pub type WidgetFn = dyn Fn(&ResolvedCall) -> anyhow::Result<Value>;

/// Container callable: opens a rendering scope for children. `None` means
/// the container produced nothing to render into.
pub type ContainerFn = dyn Fn(&ResolvedCall) -> anyhow::Result<Option<Anchor>>;

/// The renderer's own layout operation, handed to decorators.
pub type RenderFn<'a> = dyn FnMut(&[Slot]) -> Result<(), RenderError> + 'a;

/// Decorator-style anchor: wraps the render operation instead of exposing
/// enter/exit framing.
pub type DecoratorFn = dyn Fn(&mut RenderFn<'_>, &[Slot]) -> Result<(), RenderError>;

/// A rendering scope with enter/exit framing, such as a container or a column.
pub trait ScopedResource {
    fn enter(&self) -> anyhow::Result<()>;

    /// Called exactly once for every successful [`enter`](Self::enter),
    /// including when rendering inside the scope fails.
    fn exit(&self);
}

/// What a container callable hands back to frame its children.
#[derive(Clone)]
pub enum Anchor {
    Scoped(Rc<dyn ScopedResource>),
    ScopedSequence(Vec<Rc<dyn ScopedResource>>),
    Decorator(Rc<DecoratorFn>),
}

impl Anchor {
    pub fn scoped(scope: impl ScopedResource + 'static) -> Self {
        Anchor::Scoped(Rc::new(scope))
    }

    pub fn sequence<S, I>(scopes: I) -> Self
    where
        S: ScopedResource + 'static,
        I: IntoIterator<Item = S>,
    {
        Anchor::ScopedSequence(
            scopes
                .into_iter()
                .map(|scope| Rc::new(scope) as Rc<dyn ScopedResource>)
                .collect(),
        )
    }

    pub fn decorator<F>(decorate: F) -> Self
    where
        F: Fn(&mut RenderFn<'_>, &[Slot]) -> Result<(), RenderError> + 'static,
    {
        Anchor::Decorator(Rc::new(decorate))
    }

    /// An empty sequence is as good as no anchor at all.
    pub fn is_empty(&self) -> bool {
        matches!(self, Anchor::ScopedSequence(scopes) if scopes.is_empty())
    }

    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Anchor::Scoped(_) => "scoped",
            Anchor::ScopedSequence(_) => "sequence",
            Anchor::Decorator(_) => "decorator",
        }
    }
}

impl fmt::Debug for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Anchor::ScopedSequence(scopes) => write!(f, "Anchor::ScopedSequence({})", scopes.len()),
            other => write!(f, "Anchor::{}", other.kind()),
        }
    }
}

#[derive(Clone)]
enum Callable {
    Widget(Rc<WidgetFn>),
    Container(Rc<ContainerFn>),
}

/// A host callable registered for use in a [`ComponentConfig`](crate::ComponentConfig).
///
/// Whether the callable declares an identity `key` parameter is stated at
/// registration with [`keyed`](Self::keyed).
#[derive(Clone)]
pub struct Component {
    name: Rc<str>,
    accepts_key: bool,
    callable: Callable,
}

impl Component {
    pub fn widget<F>(name: impl Into<String>, widget: F) -> Self
    where
        F: Fn(&ResolvedCall) -> anyhow::Result<Value> + 'static,
    {
        let name: String = name.into();
        Self {
            name: Rc::from(name),
            accepts_key: false,
            callable: Callable::Widget(Rc::new(widget)),
        }
    }

    pub fn container<F>(name: impl Into<String>, container: F) -> Self
    where
        F: Fn(&ResolvedCall) -> anyhow::Result<Option<Anchor>> + 'static,
    {
        let name: String = name.into();
        Self {
            name: Rc::from(name),
            accepts_key: false,
            callable: Callable::Container(Rc::new(container)),
        }
    }

    /// Marks the callable as accepting a `key` identity parameter.
    pub fn keyed(mut self) -> Self {
        self.accepts_key = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_container(&self) -> bool {
        matches!(self.callable, Callable::Container(_))
    }

    /// Invokes the callable for its value. A container yields whether it
    /// produced a non-empty anchor.
    pub(crate) fn invoke(&self, call: &ResolvedCall) -> Result<Value, RenderError> {
        match &self.callable {
            Callable::Widget(widget) => widget(call).map_err(|source| self.failed(source)),
            Callable::Container(container) => container(call)
                .map(|anchor| Value::Bool(anchor.is_some_and(|anchor| !anchor.is_empty())))
                .map_err(|source| self.failed(source)),
        }
    }

    pub(crate) fn anchor(&self, call: &ResolvedCall) -> Result<Option<Anchor>, RenderError> {
        match &self.callable {
            Callable::Widget(_) => Err(RenderError::NotAContainer {
                component: self.name.to_string(),
            }),
            Callable::Container(container) => container(call).map_err(|source| self.failed(source)),
        }
    }

    pub(crate) fn failed(&self, source: anyhow::Error) -> RenderError {
        RenderError::Component {
            component: self.name.to_string(),
            source,
        }
    }
}

impl KeySignature for Component {
    fn accepts_key(&self) -> bool {
        self.accepts_key
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("name", &self.name)
            .field("accepts_key", &self.accepts_key)
            .field("container", &self.is_container())
            .finish()
    }
}
