//! The scope chain that expressions are evaluated against.
//!
//! A [`Model`] has a local frame and a reference to the global frame shared
//! by the whole document. Local frames are reference-counted and copied on
//! first write, so forking a sibling or child scope is cheap and later
//! definitions in one branch never leak into another.

use crate::error::TalesError;
use crate::repetition::RepetitionInfo;
use crate::value::{TalesObject, Value};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
struct LocalFrame {
    bindings: HashMap<String, Value>,
    repetitions: BTreeMap<String, Arc<RepetitionInfo>>,
    error: Option<Value>,
}

#[derive(Debug)]
struct SharedScope {
    root: Value,
    globals: RefCell<HashMap<String, Value>>,
}

#[derive(Debug, Clone)]
pub struct Model {
    local: Rc<LocalFrame>,
    shared: Rc<SharedScope>,
    parent: Option<Rc<Model>>,
    depth: usize,
}

impl Model {
    /// Creates the top-level scope for one render, exposing `root` as `here`.
    pub fn new(root: Value) -> Self {
        Self {
            local: Rc::new(LocalFrame::default()),
            shared: Rc::new(SharedScope {
                root,
                globals: RefCell::new(HashMap::new()),
            }),
            parent: None,
            depth: 0,
        }
    }

    pub fn root(&self) -> &Value {
        &self.shared.root
    }

    pub fn parent(&self) -> Option<&Model> {
        self.parent.as_deref()
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// A frame for one level further down the tree. Starts with a copy of
    /// this frame's local bindings.
    pub fn create_child(&self) -> Model {
        Model {
            local: Rc::clone(&self.local),
            shared: Rc::clone(&self.shared),
            parent: Some(Rc::new(self.clone())),
            depth: self.depth + 1,
        }
    }

    /// A frame at the same level, for repetition or replacement. Shares this
    /// frame's parent and starts from a snapshot of its local bindings.
    pub fn create_sibling(&self) -> Model {
        Model {
            local: Rc::clone(&self.local),
            shared: Rc::clone(&self.shared),
            parent: self.parent.clone(),
            depth: self.depth,
        }
    }

    /// Local binding first, then global.
    pub fn get(&self, name: &str) -> Option<Value> {
        self.get_local(name).or_else(|| self.get_global(name))
    }

    pub fn get_local(&self, name: &str) -> Option<Value> {
        self.local.bindings.get(name).cloned()
    }

    pub fn get_global(&self, name: &str) -> Option<Value> {
        self.shared.globals.borrow().get(name).cloned()
    }

    pub fn add_local(&mut self, name: impl Into<String>, value: Value) {
        Rc::make_mut(&mut self.local).bindings.insert(name.into(), value);
    }

    /// Global definitions are visible to every frame of the render, including
    /// frames created before the definition.
    pub fn add_global(&self, name: impl Into<String>, value: Value) {
        self.shared.globals.borrow_mut().insert(name.into(), value);
    }

    /// Binds the repeat variable and records its repetition details.
    pub fn add_repetition(&mut self, info: RepetitionInfo) {
        let frame = Rc::make_mut(&mut self.local);
        frame.bindings.insert(info.name.clone(), info.item.clone());
        frame.repetitions.insert(info.name.clone(), Arc::new(info));
    }

    pub fn repetition(&self, name: &str) -> Option<&RepetitionInfo> {
        self.local.repetitions.get(name).map(Arc::as_ref)
    }

    /// All repetitions in scope, as exposed by `repeat`.
    pub fn repetitions_value(&self) -> Value {
        Value::Map(
            self.local
                .repetitions
                .iter()
                .map(|(name, info)| {
                    let obj: Arc<dyn TalesObject> = info.clone();
                    (name.clone(), Value::Object(obj))
                })
                .collect(),
        )
    }

    pub fn set_error(&mut self, error: Value) {
        Rc::make_mut(&mut self.local).error = Some(error);
    }

    pub fn error(&self) -> Option<&Value> {
        self.local.error.as_ref()
    }
}

/// An error caught by an `on-error` boundary, as seen by expressions through `error`.
#[derive(Debug, Clone, PartialEq)]
pub struct CaughtError {
    pub kind: String,
    pub message: String,
}

impl CaughtError {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
        }
    }
}

impl TalesObject for CaughtError {
    fn member(&self, name: &str) -> Result<Option<Value>, TalesError> {
        Ok(match name {
            "type" => Some(Value::from(self.kind.as_str())),
            "value" | "message" => Some(Value::from(self.message.as_str())),
            _ => None,
        })
    }

    fn to_text(&self) -> String {
        self.message.clone()
    }

    fn type_name(&self) -> &str {
        "error"
    }
}
