//! The tree walk that turns page configs into host widget calls.

use std::rc::Rc;

use configurator_core::{Namespace, ResolvedCall, SessionStore, Value};
use log::{debug, trace};

use crate::{
    Anchor, Children, ComponentConfig, Condition, PageConfig, RenderError, ScopedResource, Slot,
};

/// Walks node lists in declaration order, resolving state and driving
/// host callables.
///
/// A pass is synchronous and runs to completion or to the first error.
/// Every page-scoped cell resolved during [`render_page`](Self::render_page)
/// is keyed by the tag of the page being rendered.
pub struct PageRenderer {
    namespace: Namespace,
    sidebar: Option<Rc<dyn ScopedResource>>,
}

impl PageRenderer {
    pub fn new(namespace: Namespace) -> Self {
        Self {
            namespace,
            sidebar: None,
        }
    }

    /// Installs the host scope that sidebar content renders into.
    pub fn with_sidebar(mut self, scope: Rc<dyn ScopedResource>) -> Self {
        self.sidebar = Some(scope);
        self
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    fn store(&self) -> &dyn SessionStore {
        self.namespace.store()
    }

    pub fn render_page(&self, page: &PageConfig) -> Result<(), RenderError> {
        debug!("rendering page `{}`", page.tag());
        self.namespace.set_current_page(page.tag());

        let sidebar = page.sidebar_nodes();
        if !sidebar.is_empty() {
            let scope = self.sidebar.as_ref().ok_or(RenderError::MissingSidebar)?;
            self.within_scope("sidebar", scope.as_ref(), sidebar)?;
        }
        self.render_layout(page.body())
    }

    /// Renders every present node of `nodes` in order.
    pub fn render_layout(&self, nodes: &[Slot]) -> Result<(), RenderError> {
        for node in nodes.iter().flatten() {
            let name = node.component().name();
            if !self.check_condition(node.get_condition())? {
                trace!("skipping `{name}`: condition not met");
                continue;
            }
            if node.get_children().is_empty() {
                trace!("rendering leaf `{name}`");
                self.build_component(node)?;
            } else {
                trace!("rendering container `{name}`");
                self.render_container(node)?;
            }
        }
        Ok(())
    }

    fn resolve(&self, node: &ComponentConfig) -> Result<ResolvedCall, RenderError> {
        let call = self.namespace.resolve_call_arguments(
            node.component(),
            node.get_args(),
            node.get_kwargs(),
            node.get_result_key(),
        )?;
        Ok(call)
    }

    /// Invokes `node` as a leaf and stores its result in the result cell.
    fn build_component(&self, node: &ComponentConfig) -> Result<Value, RenderError> {
        let call = self.resolve(node)?;
        let result = node.component().invoke(&call)?;
        if let Some(cell) = node.get_result_key() {
            cell.set(self.store(), result.clone());
        }
        Ok(result)
    }

    fn check_condition(&self, condition: Option<&Condition>) -> Result<bool, RenderError> {
        match condition {
            None => Ok(true),
            Some(Condition::Cell(cell)) => Ok(cell.get(self.store())?.is_truthy()),
            Some(Condition::Component(config)) => Ok(self.build_component(config)?.is_truthy()),
        }
    }

    fn render_container(&self, node: &ComponentConfig) -> Result<(), RenderError> {
        let component = node.component();
        let call = self.resolve(node)?;
        let anchor = match component.anchor(&call)? {
            Some(anchor) if !anchor.is_empty() => anchor,
            _ => {
                trace!("`{}` produced no anchor", component.name());
                return Ok(());
            }
        };
        debug!(
            "dispatching {} children of `{}` to {anchor:?}",
            node.get_children().shape(),
            component.name()
        );
        self.dispatch(component.name(), anchor, node.get_children())
    }

    fn dispatch(&self, name: &str, anchor: Anchor, children: &Children) -> Result<(), RenderError> {
        match (anchor, children) {
            (Anchor::ScopedSequence(scopes), Children::Flat(slots)) => {
                for (index, scope) in scopes.iter().enumerate() {
                    let slot = slots.get(index).ok_or_else(|| RenderError::MissingSlot {
                        component: name.to_owned(),
                        index,
                        available: slots.len(),
                    })?;
                    if slot.is_none() {
                        debug!("slot {index} of `{name}` left empty");
                    }
                    self.within_scope(name, scope.as_ref(), std::slice::from_ref(slot))?;
                }
                Ok(())
            }
            (Anchor::ScopedSequence(scopes), Children::Rows(rows)) => {
                let columns = transpose(rows);
                for (index, scope) in scopes.iter().enumerate() {
                    let column = columns.get(index).ok_or_else(|| RenderError::MissingSlot {
                        component: name.to_owned(),
                        index,
                        available: columns.len(),
                    })?;
                    self.within_scope(name, scope.as_ref(), column)?;
                }
                Ok(())
            }
            (Anchor::Scoped(scope), Children::Flat(slots)) => {
                self.within_scope(name, scope.as_ref(), slots)
            }
            (Anchor::Decorator(decorate), Children::Flat(slots)) => {
                let mut render = |nodes: &[Slot]| self.render_layout(nodes);
                decorate(&mut render, slots)
            }
            (_, Children::Rows(_)) => Err(RenderError::UnsupportedShape {
                component: name.to_owned(),
                shape: children.shape(),
            }),
        }
    }

    fn within_scope(
        &self,
        name: &str,
        scope: &dyn ScopedResource,
        nodes: &[Slot],
    ) -> Result<(), RenderError> {
        scope.enter().map_err(|source| RenderError::Component {
            component: name.to_owned(),
            source,
        })?;
        let _guard = ExitGuard { scope };
        self.render_layout(nodes)
    }
}

/// Exits the scope when dropped, so failures inside still release it.
struct ExitGuard<'a> {
    scope: &'a dyn ScopedResource,
}

impl Drop for ExitGuard<'_> {
    fn drop(&mut self) {
        self.scope.exit();
    }
}

/// Turns rows into columns. Ragged rows are cut to the shortest row.
fn transpose(rows: &[Vec<Slot>]) -> Vec<Vec<Slot>> {
    let width = rows.iter().map(Vec::len).min().unwrap_or(0);
    (0..width)
        .map(|column| rows.iter().map(|row| row[column].clone()).collect())
        .collect()
}
