//! Checked navigation over untyped table JSON
//!
//! Every accessor either yields the expected shape or a
//! [`SdbError::MalformedTable`] naming the entry and the JSON path that
//! did not match.

use sdb_core::{SdbError, SdbResult};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

/// Parse an entry's bytes as JSON.
pub fn parse(entry: &str, bytes: &[u8]) -> SdbResult<Value> {
    serde_json::from_slice(bytes).map_err(|e| SdbError::malformed(entry, format!("invalid JSON: {e}")))
}

/// A position inside one entry's JSON document.
#[derive(Debug, Clone)]
pub struct Node<'a> {
    entry: &'a str,
    path: String,
    value: &'a Value,
}

impl<'a> Node<'a> {
    pub fn root(entry: &'a str, value: &'a Value) -> Self {
        Self {
            entry,
            path: "$".to_string(),
            value,
        }
    }

    pub fn value(&self) -> &'a Value {
        self.value
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// A required object field; `null` counts as absent.
    pub fn get(&self, key: &str) -> SdbResult<Node<'a>> {
        self.find(key)?
            .ok_or_else(|| self.malformed(format!("missing field {key:?}")))
    }

    /// An optional object field. The node itself must still be an object.
    pub fn find(&self, key: &str) -> SdbResult<Option<Node<'a>>> {
        let object = self
            .value
            .as_object()
            .ok_or_else(|| self.malformed(format!("expected object, found {}", kind(self.value))))?;

        Ok(object
            .get(key)
            .filter(|v| !v.is_null())
            .map(|value| self.child(format!(".{key}"), value)))
    }

    /// A required array element.
    pub fn at(&self, index: usize) -> SdbResult<Node<'a>> {
        let array = self.array()?;
        array
            .get(index)
            .map(|value| self.child(format!("[{index}]"), value))
            .ok_or_else(|| self.malformed(format!("array has no element {index}")))
    }

    pub fn elements(&self) -> SdbResult<impl Iterator<Item = Node<'a>> + '_> {
        let array = self.array()?;
        Ok(array
            .iter()
            .enumerate()
            .map(move |(i, value)| self.child(format!("[{i}]"), value)))
    }

    pub fn len(&self) -> SdbResult<usize> {
        Ok(self.array()?.len())
    }

    pub fn as_str(&self) -> SdbResult<&'a str> {
        self.value
            .as_str()
            .ok_or_else(|| self.malformed(format!("expected string, found {}", kind(self.value))))
    }

    pub fn as_i32(&self) -> SdbResult<i32> {
        let n = self
            .value
            .as_i64()
            .ok_or_else(|| self.malformed(format!("expected integer, found {}", kind(self.value))))?;
        i32::try_from(n).map_err(|_| self.malformed(format!("integer {n} out of range")))
    }

    /// A string, or a number rendered as its decimal text.
    pub fn coerce_string(&self) -> SdbResult<String> {
        match self.value {
            Value::String(s) => Ok(s.clone()),
            Value::Number(n) => Ok(n.to_string()),
            other => Err(self.malformed(format!("expected string or number, found {}", kind(other)))),
        }
    }

    /// An integer, or a string holding one.
    pub fn coerce_i32(&self) -> SdbResult<i32> {
        match self.value {
            Value::String(s) => s
                .trim()
                .parse::<i32>()
                .map_err(|_| self.malformed(format!("string {s:?} is not an integer"))),
            _ => self.as_i32(),
        }
    }

    /// Deserialize this node into a typed value.
    pub fn deserialize<T: DeserializeOwned>(&self) -> SdbResult<T> {
        <T as Deserialize>::deserialize(self.value).map_err(|e| self.malformed(e.to_string()))
    }

    pub fn malformed(&self, reason: impl std::fmt::Display) -> SdbError {
        SdbError::malformed(self.entry, format!("{}: {reason}", self.path))
    }

    fn array(&self) -> SdbResult<&'a Vec<Value>> {
        self.value
            .as_array()
            .ok_or_else(|| self.malformed(format!("expected array, found {}", kind(self.value))))
    }

    fn child(&self, segment: String, value: &'a Value) -> Node<'a> {
        Node {
            entry: self.entry,
            path: format!("{}{segment}", self.path),
            value,
        }
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
