//! Immutable descriptions of widget invocations and pages.

use std::fmt;

use configurator_core::{Arg, IndexMap, StateCell};

use crate::Component;

/// One position in a node list. `None` leaves the position empty.
pub type Slot = Option<ComponentConfig>;

/// Children of a container node.
///
/// `Rows` is the nested shape used with parallel anchors such as columns:
/// each inner list is a row and each row position targets one anchor.
#[derive(Clone, Debug)]
pub enum Children {
    Flat(Vec<Slot>),
    Rows(Vec<Vec<Slot>>),
}

impl Children {
    pub fn is_empty(&self) -> bool {
        match self {
            Children::Flat(slots) => slots.is_empty(),
            Children::Rows(rows) => rows.is_empty(),
        }
    }

    pub fn shape(&self) -> &'static str {
        match self {
            Children::Flat(_) => "flat",
            Children::Rows(_) => "nested",
        }
    }
}

impl Default for Children {
    fn default() -> Self {
        Children::Flat(Vec::new())
    }
}

impl From<Vec<ComponentConfig>> for Children {
    fn from(nodes: Vec<ComponentConfig>) -> Self {
        Children::Flat(nodes.into_iter().map(Some).collect())
    }
}

impl From<Vec<Slot>> for Children {
    fn from(slots: Vec<Slot>) -> Self {
        Children::Flat(slots)
    }
}

impl From<Vec<Vec<Slot>>> for Children {
    fn from(rows: Vec<Vec<Slot>>) -> Self {
        Children::Rows(rows)
    }
}

/// Gate deciding whether a node renders.
#[derive(Clone, Debug)]
pub enum Condition {
    /// Renders when the cell's value is truthy.
    Cell(StateCell),
    /// Renders the config as a leaf and uses the truthiness of its result.
    Component(Box<ComponentConfig>),
}

impl From<StateCell> for Condition {
    fn from(cell: StateCell) -> Self {
        Condition::Cell(cell)
    }
}

impl From<&StateCell> for Condition {
    fn from(cell: &StateCell) -> Self {
        Condition::Cell(cell.clone())
    }
}

impl From<ComponentConfig> for Condition {
    fn from(config: ComponentConfig) -> Self {
        Condition::Component(Box::new(config))
    }
}

/// Description of one widget invocation.
///
/// Configs are built once and reused as templates; the renderer only reads
/// them. Derive variants with [`update`](Self::update).
#[derive(Clone)]
pub struct ComponentConfig {
    component: Component,
    args: Vec<Arg>,
    kwargs: IndexMap<String, Arg>,
    children: Children,
    condition: Option<Condition>,
    result_key: Option<StateCell>,
}

impl ComponentConfig {
    pub fn new(component: Component) -> Self {
        Self {
            component,
            args: Vec::new(),
            kwargs: IndexMap::new(),
            children: Children::default(),
            condition: None,
            result_key: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<Arg>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, A>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<Arg>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn kwarg(mut self, name: impl Into<String>, value: impl Into<Arg>) -> Self {
        self.kwargs.insert(name.into(), value.into());
        self
    }

    pub fn children(mut self, children: impl Into<Children>) -> Self {
        self.children = children.into();
        self
    }

    pub fn condition(mut self, condition: impl Into<Condition>) -> Self {
        self.condition = Some(condition.into());
        self
    }

    pub fn result_key(mut self, cell: &StateCell) -> Self {
        self.result_key = Some(cell.clone());
        self
    }

    /// Returns a copy with `changes` applied.
    ///
    /// `args`, `children`, `condition` and `result_key` are replaced when
    /// given; `kwargs` are merged, with new entries overwriting same-named
    /// old ones.
    pub fn update(&self, changes: ConfigUpdate) -> ComponentConfig {
        let mut kwargs = self.kwargs.clone();
        if let Some(extra) = changes.kwargs {
            kwargs.extend(extra);
        }
        ComponentConfig {
            component: self.component.clone(),
            args: changes.args.unwrap_or_else(|| self.args.clone()),
            kwargs,
            children: changes.children.unwrap_or_else(|| self.children.clone()),
            condition: changes.condition.or_else(|| self.condition.clone()),
            result_key: changes.result_key.or_else(|| self.result_key.clone()),
        }
    }

    pub fn component(&self) -> &Component {
        &self.component
    }

    pub fn get_args(&self) -> &[Arg] {
        &self.args
    }

    pub fn get_kwargs(&self) -> &IndexMap<String, Arg> {
        &self.kwargs
    }

    pub fn get_children(&self) -> &Children {
        &self.children
    }

    pub fn get_condition(&self) -> Option<&Condition> {
        self.condition.as_ref()
    }

    pub fn get_result_key(&self) -> Option<&StateCell> {
        self.result_key.as_ref()
    }
}

impl fmt::Debug for ComponentConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentConfig")
            .field("component", &self.component.name())
            .field("args", &self.args)
            .field("kwargs", &self.kwargs)
            .field("children", &self.children)
            .field("condition", &self.condition)
            .field("result_key", &self.result_key)
            .finish()
    }
}

/// Changes applied by [`ComponentConfig::update`]. Unset fields keep the
/// values of the config being updated.
#[derive(Clone, Debug, Default)]
pub struct ConfigUpdate {
    pub args: Option<Vec<Arg>>,
    pub kwargs: Option<IndexMap<String, Arg>>,
    pub children: Option<Children>,
    pub condition: Option<Condition>,
    pub result_key: Option<StateCell>,
}

impl ConfigUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn args<I, A>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<Arg>,
    {
        self.args = Some(args.into_iter().map(Into::into).collect());
        self
    }

    pub fn kwarg(mut self, name: impl Into<String>, value: impl Into<Arg>) -> Self {
        self.kwargs
            .get_or_insert_with(IndexMap::new)
            .insert(name.into(), value.into());
        self
    }

    pub fn children(mut self, children: impl Into<Children>) -> Self {
        self.children = Some(children.into());
        self
    }

    pub fn condition(mut self, condition: impl Into<Condition>) -> Self {
        self.condition = Some(condition.into());
        self
    }

    pub fn result_key(mut self, cell: &StateCell) -> Self {
        self.result_key = Some(cell.clone());
        self
    }
}

/// A page: a scope tag plus the body and sidebar node lists.
#[derive(Clone, Debug)]
pub struct PageConfig {
    tag: String,
    body: Vec<Slot>,
    sidebar: Vec<Slot>,
}

impl PageConfig {
    pub fn new<I>(tag: impl Into<String>, body: I) -> Self
    where
        I: IntoIterator<Item = ComponentConfig>,
    {
        Self {
            tag: tag.into(),
            body: body.into_iter().map(Some).collect(),
            sidebar: Vec::new(),
        }
    }

    pub fn sidebar<I>(mut self, nodes: I) -> Self
    where
        I: IntoIterator<Item = ComponentConfig>,
    {
        self.sidebar = nodes.into_iter().map(Some).collect();
        self
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn body(&self) -> &[Slot] {
        &self.body
    }

    pub fn sidebar_nodes(&self) -> &[Slot] {
        &self.sidebar
    }
}
