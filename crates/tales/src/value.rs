//! Values produced and consumed by TALES evaluation.

use crate::error::TalesError;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use zpt_dom::NodeId;

/// A host object exposed to expressions.
///
/// Each lookup returns `Ok(None)` when the object has nothing under that
/// name, which lets the resolver move on to its next strategy. An `Err` is a
/// failure of the host call and aborts the current alternate.
pub trait TalesObject: fmt::Debug + Send + Sync {
    /// Members published under an explicit alias. Tried before anything else.
    fn aliased_member(&self, _alias: &str) -> Result<Option<Value>, TalesError> {
        Ok(None)
    }

    fn member(&self, _name: &str) -> Result<Option<Value>, TalesError> {
        Ok(None)
    }

    /// Keyed lookup, tried last.
    fn index(&self, _key: &str) -> Result<Option<Value>, TalesError> {
        Ok(None)
    }

    fn to_text(&self) -> String {
        String::new()
    }

    fn is_truthy(&self) -> bool {
        true
    }

    /// The sequence a `repeat` directive iterates, if the object is iterable.
    fn items(&self) -> Option<Vec<Value>> {
        None
    }

    fn type_name(&self) -> &str {
        "object"
    }

    /// Applies the object as a function, as `pipe:` expressions do.
    /// `Ok(None)` when the object is not callable.
    fn call(&self, _argument: &Value) -> Result<Option<Value>, TalesError> {
        Ok(None)
    }
}

type HostFn = dyn Fn(&Value) -> Result<Value, TalesError> + Send + Sync;

/// A host function exposed to templates, applied with `pipe:`.
pub struct HostFunction {
    name: String,
    function: Box<HostFn>,
}

impl HostFunction {
    pub fn new(
        name: impl Into<String>,
        function: impl Fn(&Value) -> Result<Value, TalesError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            function: Box::new(function),
        }
    }
}

impl fmt::Debug for HostFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostFunction").field("name", &self.name).finish()
    }
}

impl TalesObject for HostFunction {
    fn to_text(&self) -> String {
        self.name.clone()
    }

    fn type_name(&self) -> &str {
        "function"
    }

    fn call(&self, argument: &Value) -> Result<Option<Value>, TalesError> {
        (self.function)(argument).map(Some)
    }
}

/// A macro resolved from a `define-macro` element.
#[derive(Debug, Clone, PartialEq)]
pub struct MetalMacro {
    pub name: String,
    /// The registered defining element. Callers copy it before expanding.
    pub element: NodeId,
}

#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Null,
    /// The cancellation sentinel exposed as `default`: directives that see it leave the markup alone.
    Default,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
    Macro(MetalMacro),
    Object(Arc<dyn TalesObject>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// True only for the cancellation sentinel.
    pub fn cancels_action(&self) -> bool {
        matches!(self, Value::Default)
    }

    /// False for null and for the zero value of each concrete type.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Default => true,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0 && !f.is_nan(),
            Value::String(s) => !s.is_empty(),
            Value::List(items) => !items.is_empty(),
            Value::Map(entries) => !entries.is_empty(),
            Value::Macro(_) => true,
            Value::Object(obj) => obj.is_truthy(),
        }
    }

    /// The text form used when the value is written into markup. Null is empty.
    pub fn to_text(&self) -> String {
        match self {
            Value::Null | Value::Default => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::String(s) => s.clone(),
            Value::List(items) => items.iter().map(Value::to_text).collect::<Vec<_>>().join(", "),
            Value::Map(_) => String::new(),
            Value::Macro(m) => m.name.clone(),
            Value::Object(obj) => obj.to_text(),
        }
    }

    /// The items a `repeat` iterates. `None` for values that are not sequences.
    pub fn items(&self) -> Option<Vec<Value>> {
        match self {
            Value::List(items) => Some(items.clone()),
            Value::Map(entries) => Some(entries.values().cloned().collect()),
            Value::Object(obj) => obj.items(),
            _ => None,
        }
    }

    pub fn as_macro(&self) -> Option<&MetalMacro> {
        match self {
            Value::Macro(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &str {
        match self {
            Value::Null => "null",
            Value::Default => "default",
            Value::Bool(_) => "boolean",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Macro(_) => "macro",
            Value::Object(obj) => obj.type_name(),
        }
    }

    /// Converts any serializable host value into a `Value` tree.
    pub fn from_serialize<T: Serialize + ?Sized>(data: &T) -> Result<Self, TalesError> {
        serde_json::to_value(data)
            .map(Value::from)
            .map_err(|e| TalesError::Conversion(e.to_string()))
    }

    pub fn object(obj: impl TalesObject + 'static) -> Self {
        Value::Object(Arc::new(obj))
    }

    /// Wraps a closure as a callable value for `pipe:` expressions.
    pub fn function(
        name: impl Into<String>,
        function: impl Fn(&Value) -> Result<Value, TalesError> + Send + Sync + 'static,
    ) -> Self {
        Value::object(HostFunction::new(name, function))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) | (Value::Default, Value::Default) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => (*a as f64) == *b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Macro(a), Value::Macro(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => Value::List(items.into_iter().map(Value::from).collect()),
            serde_json::Value::Object(entries) => {
                Value::Map(entries.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<usize> for Value {
    fn from(i: usize) -> Self {
        Value::Int(i64::try_from(i).unwrap_or(i64::MAX))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(entries: BTreeMap<String, Value>) -> Self {
        Value::Map(entries)
    }
}

impl From<MetalMacro> for Value {
    fn from(m: MetalMacro) -> Self {
        Value::Macro(m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn truthiness_follows_zero_values() {
        for falsy in [
            Value::Null,
            Value::Bool(false),
            Value::Int(0),
            Value::Float(0.0),
            Value::from(""),
            Value::List(vec![]),
        ] {
            assert!(!falsy.is_truthy(), "{falsy:?}");
        }
        assert!(Value::Default.is_truthy());
        assert!(Value::Int(-1).is_truthy());
        assert!(Value::from("0").is_truthy());
    }

    #[test]
    fn only_default_cancels() {
        assert!(Value::Default.cancels_action());
        assert!(!Value::Null.cancels_action());
        assert!(!Value::Bool(false).cancels_action());
    }

    #[test]
    fn converts_json() {
        let value = Value::from(json!({"n": 3, "f": 1.5, "items": ["a", null]}));
        let Value::Map(map) = value else {
            panic!("expected map");
        };
        assert_eq!(map["n"], Value::Int(3));
        assert_eq!(map["f"], Value::Float(1.5));
        assert_eq!(map["items"], Value::List(vec![Value::from("a"), Value::Null]));
    }

    #[test]
    fn serializable_structs_convert() {
        #[derive(Serialize)]
        struct Person {
            name: String,
            age: u32,
        }
        let value = Value::from_serialize(&Person {
            name: "Ada".into(),
            age: 36,
        })
        .unwrap();
        assert_eq!(value.to_text(), "");
        assert_eq!(value.items().map(|i| i.len()), Some(2));
    }

    #[test]
    fn text_forms() {
        assert_eq!(Value::Null.to_text(), "");
        assert_eq!(Value::Int(42).to_text(), "42");
        assert_eq!(Value::Bool(true).to_text(), "true");
    }
}
