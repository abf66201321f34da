//! State cells: named, scope-keyed slots in the session store.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use log::trace;

use crate::{SessionStore, StateError, Value};

/// Name of the cell that tracks which page is being rendered.
pub const CURRENT_PAGE: &str = "_CURRENT_PAGE";

/// Prefix of every globally scoped storage key.
pub const GLOBAL_PREFIX: &str = "_GLOBAL_";

/// Whether a cell's storage key is namespaced by page.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Scope {
    #[default]
    Page,
    Global,
}

/// Transform applied to a cell's value on every read.
pub type FormatFn = Rc<dyn Fn(Value) -> anyhow::Result<Value>>;

/// Configuration of a [`StateCell`].
///
/// `Default` yields the type defaults that [`StateCell::reconfigure`]
/// falls back to for every field it is not given.
#[derive(Clone, Default)]
pub struct CellOptions {
    pub default: Value,
    pub persist: bool,
    pub scope: Scope,
    pub invert: bool,
    pub format: Option<FormatFn>,
}

impl CellOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = value.into();
        self
    }

    pub fn persist(mut self, persist: bool) -> Self {
        self.persist = persist;
        self
    }

    pub fn scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    pub fn global(self) -> Self {
        self.scope(Scope::Global)
    }

    /// Replaces the read value with the negation of its truthiness.
    pub fn invert(mut self, invert: bool) -> Self {
        self.invert = invert;
        self
    }

    pub fn format<F>(mut self, format: F) -> Self
    where
        F: Fn(Value) -> anyhow::Result<Value> + 'static,
    {
        self.format = Some(Rc::new(format));
        self
    }
}

impl fmt::Debug for CellOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CellOptions")
            .field("default", &self.default)
            .field("persist", &self.persist)
            .field("scope", &self.scope)
            .field("invert", &self.invert)
            .field("format", &self.format.is_some())
            .finish()
    }
}

struct CellInner {
    name: Option<String>,
    options: CellOptions,
    override_key: Option<String>,
}

/// A named, lazily defaulted slot in the session store.
///
/// Cloning yields another handle to the same cell: renaming,
/// reconfiguring or binding a key through one handle is visible through
/// all of them. Two distinct cells that resolve to the same storage key
/// read and write the same stored value.
#[derive(Clone)]
pub struct StateCell {
    inner: Rc<RefCell<CellInner>>,
}

impl StateCell {
    /// Creates an unnamed page-scoped cell. Cells are normally named when
    /// declared in a [`Namespace`](crate::Namespace).
    pub fn new(default: impl Into<Value>) -> Self {
        Self::with_options(None::<String>, CellOptions::new().default_value(default))
    }

    pub fn named(name: impl Into<String>, default: impl Into<Value>) -> Self {
        Self::with_options(Some(name), CellOptions::new().default_value(default))
    }

    pub fn with_options(name: Option<impl Into<String>>, options: CellOptions) -> Self {
        Self {
            inner: Rc::new(RefCell::new(CellInner {
                name: name.map(Into::into),
                options,
                override_key: None,
            })),
        }
    }

    /// The cell recording the current page tag. Its key is always its name.
    pub fn current_page() -> Self {
        Self::named(CURRENT_PAGE, Value::Null)
    }

    pub fn name(&self) -> Option<String> {
        self.inner.borrow().name.clone()
    }

    pub fn rename(&self, name: impl Into<String>) {
        self.inner.borrow_mut().name = Some(name.into());
    }

    pub fn options(&self) -> CellOptions {
        self.inner.borrow().options.clone()
    }

    /// Overwrites the whole configuration in place.
    ///
    /// Fields left at their [`CellOptions::default`] values reset the cell's
    /// previous settings. The change is seen by every handle to this cell.
    pub fn reconfigure(&self, options: CellOptions) -> &Self {
        self.inner.borrow_mut().options = options;
        self
    }

    /// Pins the storage key, so reads and writes target a slot the host has
    /// already assigned to a widget.
    pub fn bind_external_key(&self, key: impl Into<String>) {
        self.inner.borrow_mut().override_key = Some(key.into());
    }

    pub fn external_key(&self) -> Option<String> {
        self.inner.borrow().override_key.clone()
    }

    pub fn storage_key(&self, store: &dyn SessionStore) -> String {
        let inner = self.inner.borrow();
        if let Some(key) = &inner.override_key {
            return key.clone();
        }
        let name = inner.name.as_deref().unwrap_or("None");
        if name == CURRENT_PAGE {
            return name.to_owned();
        }
        match inner.options.scope {
            Scope::Global => format!("{GLOBAL_PREFIX}{name}"),
            Scope::Page => format!("{}_{name}", current_page_tag(store)),
        }
    }

    pub fn set(&self, store: &dyn SessionStore, value: impl Into<Value>) {
        let key = self.storage_key(store);
        self.set_at(store, &key, value);
    }

    pub fn set_at(&self, store: &dyn SessionStore, key: &str, value: impl Into<Value>) {
        let value = value.into();
        trace!("set `{key}` = {value}");
        store.set_placeholder(key, value);
    }

    pub fn get(&self, store: &dyn SessionStore) -> Result<Value, StateError> {
        let key = self.storage_key(store);
        self.get_at(store, &key)
    }

    pub fn get_at(&self, store: &dyn SessionStore, key: &str) -> Result<Value, StateError> {
        let (options, name) = {
            let inner = self.inner.borrow();
            (inner.options.clone(), inner.name.clone())
        };

        let mut value = read_raw(store, key).unwrap_or(options.default);
        if options.persist {
            value = store.observe_persisted(key, value);
        }
        if options.invert {
            value = Value::Bool(!value.is_truthy());
        }
        match options.format {
            Some(format) => format(value).map_err(|source| StateError::Format {
                cell: name.unwrap_or_else(|| key.to_owned()),
                source,
            }),
            None => Ok(value),
        }
    }
}

impl PartialEq for StateCell {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for StateCell {}

impl fmt::Debug for StateCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("StateCell")
            .field("name", &inner.name)
            .field("options", &inner.options)
            .field("override_key", &inner.override_key)
            .finish()
    }
}

/// Top-level entries shadow placeholder entries.
fn read_raw(store: &dyn SessionStore, key: &str) -> Option<Value> {
    store.get(key).or_else(|| store.placeholder(key))
}

fn current_page_tag(store: &dyn SessionStore) -> Value {
    read_raw(store, CURRENT_PAGE).unwrap_or_default()
}
