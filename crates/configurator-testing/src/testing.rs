use std::cell::RefCell;
use std::rc::Rc;

use configurator_core::{MemorySessionStore, Namespace, ResolvedCall, SessionStore, Value};
use configurator_layout::{Anchor, Component, PageRenderer, ScopedResource};

/// Something the host observed during a render pass.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    Enter(String),
    Exit(String),
    Call {
        component: String,
        path: Vec<String>,
        call: ResolvedCall,
    },
}

#[derive(Default)]
struct HostState {
    events: RefCell<Vec<Event>>,
    stack: RefCell<Vec<String>>,
}

impl HostState {
    fn push(&self, label: &str) {
        self.stack.borrow_mut().push(label.to_owned());
        self.events.borrow_mut().push(Event::Enter(label.to_owned()));
    }

    fn pop(&self, label: &str) {
        self.stack.borrow_mut().pop();
        self.events.borrow_mut().push(Event::Exit(label.to_owned()));
    }

    fn record_call(&self, component: &str, call: &ResolvedCall) {
        let path = self.stack.borrow().clone();
        self.events.borrow_mut().push(Event::Call {
            component: component.to_owned(),
            path,
            call: call.clone(),
        });
    }
}

/// Scope that records enter/exit and tracks the nesting path of calls.
pub struct RecordingScope {
    label: String,
    state: Rc<HostState>,
}

impl ScopedResource for RecordingScope {
    fn enter(&self) -> anyhow::Result<()> {
        self.state.push(&self.label);
        Ok(())
    }

    fn exit(&self) {
        self.state.pop(&self.label);
    }
}

/// In-memory stand-in for a host widget library and its session store.
///
/// Every component built from a host records its calls, including the
/// path of scopes it was rendered in, so tests can assert on nesting and
/// order.
#[derive(Clone)]
pub struct RecordingHost {
    state: Rc<HostState>,
    store: Rc<MemorySessionStore>,
}

impl Default for RecordingHost {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingHost {
    pub fn new() -> Self {
        Self {
            state: Rc::new(HostState::default()),
            store: Rc::new(MemorySessionStore::new()),
        }
    }

    pub fn store(&self) -> Rc<MemorySessionStore> {
        Rc::clone(&self.store)
    }

    /// A fresh namespace over this host's session store.
    pub fn namespace(&self) -> Namespace {
        Namespace::new(self.store.clone())
    }

    /// A renderer over a fresh namespace with the host's sidebar installed.
    pub fn renderer(&self) -> PageRenderer {
        PageRenderer::new(self.namespace()).with_sidebar(Rc::new(self.scope("sidebar")))
    }

    pub fn scope(&self, label: impl Into<String>) -> RecordingScope {
        RecordingScope {
            label: label.into(),
            state: Rc::clone(&self.state),
        }
    }

    /// Simulates a user interaction: the host writes widget state under `key`.
    pub fn interact(&self, key: &str, value: impl Into<Value>) {
        self.store.set(key, value.into());
    }

    pub fn events(&self) -> Vec<Event> {
        self.state.events.borrow().clone()
    }

    pub fn clear_events(&self) {
        self.state.events.borrow_mut().clear();
    }

    /// Every widget call as `scope/.../component`, in render order.
    pub fn rendered(&self) -> Vec<String> {
        self.state
            .events
            .borrow()
            .iter()
            .filter_map(|event| match event {
                Event::Call {
                    component, path, ..
                } => Some(
                    path.iter()
                        .map(String::as_str)
                        .chain([component.as_str()])
                        .collect::<Vec<_>>()
                        .join("/"),
                ),
                _ => None,
            })
            .collect()
    }

    /// The resolved arguments of every call made to `component`.
    pub fn calls_of(&self, component: &str) -> Vec<ResolvedCall> {
        self.state
            .events
            .borrow()
            .iter()
            .filter_map(|event| match event {
                Event::Call {
                    component: name,
                    call,
                    ..
                } if name == component => Some(call.clone()),
                _ => None,
            })
            .collect()
    }

    /// Widget that records its call and returns nothing.
    pub fn text(&self, name: &str) -> Component {
        let state = Rc::clone(&self.state);
        let label = name.to_owned();
        Component::widget(name, move |call| {
            state.record_call(&label, call);
            Ok(Value::Null)
        })
    }

    /// Widget returning its first positional argument, or its `value` kwarg.
    pub fn echo(&self, name: &str) -> Component {
        let state = Rc::clone(&self.state);
        let label = name.to_owned();
        Component::widget(name, move |call| {
            state.record_call(&label, call);
            Ok(call
                .arg(0)
                .or_else(|| call.kwarg("value"))
                .cloned()
                .unwrap_or_default())
        })
    }

    /// Keyed input widget. Returns the host's state under its key when the
    /// user has interacted, otherwise its `value` kwarg, and writes the
    /// result back under the key.
    pub fn input(&self, name: &str) -> Component {
        let state = Rc::clone(&self.state);
        let store = Rc::clone(&self.store);
        let label = name.to_owned();
        Component::widget(name, move |call| {
            state.record_call(&label, call);
            let initial = call.kwarg("value").cloned().unwrap_or_default();
            let Some(key) = call.key() else {
                return Ok(initial);
            };
            let value = store.get(key).unwrap_or(initial);
            store.set(key, value.clone());
            Ok(value)
        })
        .keyed()
    }

    /// Widget that always fails with `message`.
    pub fn failing(&self, name: &str, message: &'static str) -> Component {
        let state = Rc::clone(&self.state);
        let label = name.to_owned();
        Component::widget(name, move |call| {
            state.record_call(&label, call);
            Err(anyhow::anyhow!(message))
        })
    }

    /// Container opening a single recording scope.
    pub fn container(&self, name: &str) -> Component {
        let host = self.clone();
        let label = name.to_owned();
        Component::container(name, move |call| {
            host.state.record_call(&label, call);
            Ok(Some(Anchor::scoped(host.scope(label.clone()))))
        })
    }

    /// Container that produces no anchor, so its children never render.
    pub fn empty_container(&self, name: &str) -> Component {
        let state = Rc::clone(&self.state);
        let label = name.to_owned();
        Component::container(name, move |call| {
            state.record_call(&label, call);
            Ok(None)
        })
    }

    /// Parallel container: the first argument is the number of slots, each
    /// rendered in a scope labelled `name[i]`.
    pub fn columns(&self, name: &str) -> Component {
        let host = self.clone();
        let label = name.to_owned();
        Component::container(name, move |call| {
            host.state.record_call(&label, call);
            let count = call
                .arg(0)
                .and_then(Value::as_i64)
                .ok_or_else(|| anyhow::anyhow!("`{label}` expects a slot count"))?;
            let scopes = (0..count).map(|index| host.scope(format!("{label}[{index}]")));
            Ok(Some(Anchor::sequence(scopes)))
        })
    }

    /// Decorator-style container that frames the render it is handed.
    pub fn decorator(&self, name: &str) -> Component {
        let host = self.clone();
        let label = name.to_owned();
        Component::container(name, move |call| {
            host.state.record_call(&label, call);
            let state = Rc::clone(&host.state);
            let label = label.clone();
            Ok(Some(Anchor::decorator(move |render, children| {
                state.push(&label);
                let result = render(children);
                state.pop(&label);
                result
            })))
        })
    }
}
