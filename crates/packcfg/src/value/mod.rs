//! The configuration tree.
//!
//! A [`Value`] is the bundler-facing option tree: plain data (scalars,
//! sequences, mappings) plus the few non-data nodes a bundler config carries,
//! namely regular expressions, plugin descriptors and callables.

mod merge;
mod pattern;

use std::fmt;
use std::ops::Index;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::dev_server::RequestHook;
use crate::externals::Externals;
use crate::plugin::Plugin;

pub use merge::{merge_all, merge_values};
pub use pattern::Pattern;

/// Insertion-ordered mapping used for every object node.
pub type Map = IndexMap<String, Value>;

static NULL: Value = Value::Null;

/// A node of the configuration tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
    /// A compiled regular expression (loader `test`/`exclude` fields).
    Regex(Pattern),
    Array(Vec<Value>),
    Object(Map),
    /// An opaque plugin descriptor, appended to `plugins`.
    Plugin(Plugin),
    /// A callable the bundler or dev server invokes later.
    Function(Function),
}

/// Callable nodes stored in the tree.
///
/// Callables merge like scalars: a later fragment replaces an earlier one.
#[derive(Debug, Clone, PartialEq)]
pub enum Function {
    /// `externals` resolver consulted for every module request.
    Externals(Externals),
    /// Dev-server request hook (`devServer.after`).
    RequestHook(RequestHook),
}

impl Function {
    /// Name shown when the function is rendered as text.
    pub fn name(&self) -> &'static str {
        match self {
            Function::Externals(_) => "externals",
            Function::RequestHook(_) => "after",
        }
    }
}

impl Value {
    /// An empty object node.
    pub fn object() -> Self {
        Value::Object(Map::new())
    }

    /// Returns true for `Null`.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The boolean, if this is a `Bool`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The string slice, if this is a `String`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// The items, if this is an `Array`.
    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    /// The map, if this is an `Object`.
    pub fn as_object(&self) -> Option<&Map> {
        match self {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Mutable access to the map, if this is an `Object`.
    pub fn as_object_mut(&mut self) -> Option<&mut Map> {
        match self {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    /// The pattern, if this is a `Regex`.
    pub fn as_pattern(&self) -> Option<&Pattern> {
        match self {
            Value::Regex(pattern) => Some(pattern),
            _ => None,
        }
    }

    /// The descriptor, if this is a `Plugin`.
    pub fn as_plugin(&self) -> Option<&Plugin> {
        match self {
            Value::Plugin(plugin) => Some(plugin),
            _ => None,
        }
    }

    /// The callable node, if this is a `Function`.
    pub fn as_function(&self) -> Option<&Function> {
        match self {
            Value::Function(function) => Some(function),
            _ => None,
        }
    }

    /// Look up a key on an object node.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_object().and_then(|map| map.get(key))
    }

    /// Look up a nested node by a `/`-separated path such as `"output/path"`.
    ///
    /// Numeric segments index into arrays.
    pub fn pointer(&self, path: &str) -> Option<&Value> {
        path.split('/')
            .filter(|segment| !segment.is_empty())
            .try_fold(self, |node, segment| match node {
                Value::Object(map) => map.get(segment),
                Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
                _ => None,
            })
    }

    /// Render the tree as JSON for inspection or hand-off to another process.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => serde_json::Value::Number(n.clone()),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Regex(pattern) => serde_json::Value::String(pattern.to_string()),
            Value::Array(items) => items.iter().map(Value::to_json).collect(),
            Value::Object(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
            Value::Plugin(plugin) => serde_json::json!({
                "plugin": plugin.name(),
                "options": plugin.options().to_json(),
            }),
            Value::Function(function) => {
                serde_json::Value::String(format!("[function {}]", function.name()))
            }
        }
    }
}

impl Index<&str> for Value {
    type Output = Value;

    fn index(&self, key: &str) -> &Value {
        self.get(key).unwrap_or(&NULL)
    }
}

impl Index<usize> for Value {
    type Output = Value;

    fn index(&self, index: usize) -> &Value {
        self.as_array()
            .and_then(|items| items.get(index))
            .unwrap_or(&NULL)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(n) => n.serialize(serializer),
            Value::String(s) => serializer.serialize_str(s),
            Value::Regex(pattern) => serializer.collect_str(pattern),
            Value::Array(items) => serializer.collect_seq(items),
            Value::Object(map) => {
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (key, value) in map {
                    out.serialize_entry(key, value)?;
                }
                out.end()
            }
            Value::Plugin(plugin) => {
                let mut out = serializer.serialize_map(Some(2))?;
                out.serialize_entry("plugin", plugin.name())?;
                out.serialize_entry("options", plugin.options())?;
                out.end()
            }
            Value::Function(function) => {
                serializer.collect_str(&format_args!("[function {}]", function.name()))
            }
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => Value::Object(
                map.into_iter().map(|(k, v)| (k, Value::from(v))).collect(),
            ),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
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

impl From<&Path> for Value {
    fn from(path: &Path) -> Self {
        Value::String(path.to_string_lossy().into_owned())
    }
}

impl From<PathBuf> for Value {
    fn from(path: PathBuf) -> Self {
        Value::from(path.as_path())
    }
}

macro_rules! from_integer {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(n: $ty) -> Self {
                    Value::Number(n.into())
                }
            }
        )*
    };
}

from_integer!(i32, i64, u32, u64, usize);

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        serde_json::Number::from_f64(n).map_or(Value::Null, Value::Number)
    }
}

impl From<Pattern> for Value {
    fn from(pattern: Pattern) -> Self {
        Value::Regex(pattern)
    }
}

impl From<Plugin> for Value {
    fn from(plugin: Plugin) -> Self {
        Value::Plugin(plugin)
    }
}

impl From<Function> for Value {
    fn from(function: Function) -> Self {
        Value::Function(function)
    }
}

impl From<Map> for Value {
    fn from(map: Map) -> Self {
        Value::Object(map)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Array(items.into_iter().map(Into::into).collect())
    }
}

impl FromIterator<Value> for Value {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Value::Array(iter.into_iter().collect())
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Value {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Value::Object(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}
