//! Registry of named state cells and resolution of call arguments.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use log::trace;

use crate::{SessionStore, StateCell, StateError, Value};

/// Name of the identity-key parameter a widget may declare.
pub const KEY_PARAM: &str = "key";

/// Declares whether a call target accepts an identity `key` parameter.
pub trait KeySignature {
    fn accepts_key(&self) -> bool;
}

/// A call argument: either a state cell resolved at render time or a literal.
#[derive(Clone, Debug, PartialEq)]
pub enum Arg {
    Cell(StateCell),
    Literal(Value),
}

impl From<StateCell> for Arg {
    fn from(cell: StateCell) -> Self {
        Arg::Cell(cell)
    }
}

impl From<&StateCell> for Arg {
    fn from(cell: &StateCell) -> Self {
        Arg::Cell(cell.clone())
    }
}

macro_rules! literal_arg_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Arg {
                fn from(value: $ty) -> Self {
                    Arg::Literal(value.into())
                }
            }
        )*
    };
}

literal_arg_from!(Value, bool, i32, i64, u32, usize, f32, f64, &str, String, Vec<Value>);

/// Arguments after every state cell has been replaced by its current value.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResolvedCall {
    pub args: Vec<Value>,
    pub kwargs: IndexMap<String, Value>,
}

impl ResolvedCall {
    pub fn arg(&self, index: usize) -> Option<&Value> {
        self.args.get(index)
    }

    pub fn kwarg(&self, name: &str) -> Option<&Value> {
        self.kwargs.get(name)
    }

    /// The identity key handed to the widget, if any.
    pub fn key(&self) -> Option<&str> {
        self.kwargs.get(KEY_PARAM).and_then(Value::as_str)
    }
}

/// A set of named state cells sharing one session store.
///
/// Several namespaces may sit on the same store; cells that resolve to the
/// same storage key alias each other across namespaces.
pub struct Namespace {
    store: Rc<dyn SessionStore>,
    cells: RefCell<IndexMap<String, StateCell>>,
    current_page: StateCell,
}

impl Namespace {
    pub fn new(store: Rc<dyn SessionStore>) -> Self {
        Self {
            store,
            cells: RefCell::new(IndexMap::new()),
            current_page: StateCell::current_page(),
        }
    }

    pub fn store(&self) -> &dyn SessionStore {
        &*self.store
    }

    pub fn current_page(&self) -> &StateCell {
        &self.current_page
    }

    pub fn set_current_page(&self, tag: &str) {
        self.current_page.set(self.store(), tag);
    }

    /// Declares `name` holding a fresh cell defaulted to `default`.
    pub fn declare(&self, name: &str, default: impl Into<Value>) -> StateCell {
        self.bind(name, StateCell::named(name, default))
    }

    /// Declares `name` holding `cell`, renaming the cell to `name`.
    pub fn declare_cell(&self, name: &str, cell: StateCell) -> StateCell {
        self.bind(name, cell)
    }

    /// Replaces whatever cell is registered under `name` and renames `cell`.
    pub fn bind(&self, name: &str, cell: StateCell) -> StateCell {
        cell.rename(name);
        self.cells.borrow_mut().insert(name.to_owned(), cell.clone());
        cell
    }

    /// Writes `value` through the existing cell, or declares a new cell
    /// defaulted to `value` when `name` is unknown.
    pub fn set(&self, name: &str, value: impl Into<Value>) -> StateCell {
        let value = value.into();
        let existing = self.get(name);
        match existing {
            Some(cell) => {
                cell.set(self.store(), value);
                cell
            }
            None => self.declare(name, value),
        }
    }

    pub fn get(&self, name: &str) -> Option<StateCell> {
        self.cells.borrow().get(name).cloned()
    }

    pub fn cell(&self, name: &str) -> Result<StateCell, StateError> {
        self.get(name).ok_or_else(|| StateError::UnknownCell {
            name: name.to_owned(),
        })
    }

    /// Reads the current value of the cell registered under `name`.
    pub fn value(&self, name: &str) -> Result<Value, StateError> {
        self.cell(name)?.get(self.store())
    }

    pub fn names(&self) -> Vec<String> {
        self.cells.borrow().keys().cloned().collect()
    }

    pub fn resolve(&self, arg: &Arg) -> Result<Value, StateError> {
        match arg {
            Arg::Cell(cell) => cell.get(self.store()),
            Arg::Literal(value) => Ok(value.clone()),
        }
    }

    /// Substitutes every cell in `args` and `kwargs` with its current value
    /// and wires `result_cell` to the target's identity key.
    ///
    /// When the target accepts a `key` and a result cell is given, an
    /// explicit `key` kwarg is bound into the result cell; otherwise the
    /// result cell's own storage key is passed as `key`.
    pub fn resolve_call_arguments(
        &self,
        target: &dyn KeySignature,
        args: &[Arg],
        kwargs: &IndexMap<String, Arg>,
        result_cell: Option<&StateCell>,
    ) -> Result<ResolvedCall, StateError> {
        let args = args
            .iter()
            .map(|arg| self.resolve(arg))
            .collect::<Result<Vec<_>, _>>()?;
        let mut kwargs = kwargs
            .iter()
            .map(|(name, arg)| Ok((name.clone(), self.resolve(arg)?)))
            .collect::<Result<IndexMap<_, _>, StateError>>()?;

        if let (true, Some(cell)) = (target.accepts_key(), result_cell) {
            match kwargs.get(KEY_PARAM) {
                Some(key) => cell.bind_external_key(key.to_string()),
                None => {
                    let key = cell.storage_key(self.store());
                    kwargs.insert(KEY_PARAM.to_owned(), Value::Str(key));
                }
            }
        }
        trace!("resolved call: {} args, {} kwargs", args.len(), kwargs.len());
        Ok(ResolvedCall { args, kwargs })
    }
}

impl fmt::Debug for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Namespace")
            .field("cells", &self.names())
            .finish()
    }
}
