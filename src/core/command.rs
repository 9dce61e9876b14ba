//! Overlay edit model and control-command encoding.
//!
//! An [`OverlayEdit`] is the parameter map a caller sends (`text`, `x`, `y`,
//! `fontcolor`, ...). The gateway enforces no schema on the keys - the
//! renderer parses them by name - but the value set is closed: string,
//! number or boolean. [`OverlayEdit::encode`] turns the map into the textual
//! `reinit` command the renderer's control endpoint understands:
//!
//! ```text
//! Parsed_drawtext_2 reinit text='ON AIR':fontsize='34':x='(w-text_w)/2'
//! ```
//!
//! Encoding is deterministic: parameters are emitted in insertion order,
//! each value single-quoted, entries joined with `:`. An empty edit encodes
//! to the bare `<target> reinit ` form, which the renderer accepts as a
//! reset to filter defaults.
//!
//! The encoder itself never inspects content. Delimiter safety is checked
//! at the HTTP boundary via [`OverlayEdit::find_unsafe`] before anything is
//! encoded.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reply token the renderer sends when a reinit command was applied.
pub const REPLY_SUCCESS: &str = "0 Success";

/// Characters with structural meaning in the wire format. A key or value
/// containing any of these would corrupt the command, so the gateway
/// rejects such requests before encoding.
pub const WIRE_DELIMITERS: [char; 3] = ['\'', ':', '\\'];

/// A single overlay parameter value.
///
/// JSON callers may send strings, numbers or booleans; the wire format
/// carries everything as text. Arrays, objects and null do not deserialize
/// and are rejected at the boundary as malformed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(b) => write!(f, "{}", b),
            ParamValue::Int(n) => write!(f, "{}", n),
            ParamValue::Float(x) => write!(f, "{}", x),
            ParamValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        ParamValue::Text(s.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(s: String) -> Self {
        ParamValue::Text(s)
    }
}

impl From<i32> for ParamValue {
    fn from(n: i32) -> Self {
        ParamValue::Int(n.into())
    }
}

impl From<i64> for ParamValue {
    fn from(n: i64) -> Self {
        ParamValue::Int(n)
    }
}

impl From<f64> for ParamValue {
    fn from(x: f64) -> Self {
        ParamValue::Float(x)
    }
}

impl From<bool> for ParamValue {
    fn from(b: bool) -> Self {
        ParamValue::Bool(b)
    }
}

/// An overlay edit: parameter name -> value, in caller order.
///
/// Insertion order is preserved (IndexMap) because it is the order the
/// encoder emits; the renderer parses by key, so order affects only the
/// wire string, not semantics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OverlayEdit {
    params: IndexMap<String, ParamValue>,
}

impl OverlayEdit {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a parameter, appending it to the emit order (or overwriting in
    /// place if the key already exists).
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        self.params.insert(key.into(), value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// First key whose name or rendered value contains a wire delimiter.
    ///
    /// Returns `None` when the whole edit is safe to encode.
    pub fn find_unsafe(&self) -> Option<&str> {
        self.params.iter().find_map(|(key, value)| {
            let rendered = value.to_string();
            if key.contains(&WIRE_DELIMITERS[..]) || rendered.contains(&WIRE_DELIMITERS[..]) {
                Some(key.as_str())
            } else {
                None
            }
        })
    }

    /// Encode as a `reinit` command addressed to the filter instance
    /// `target`. Pure and deterministic; does not validate content.
    pub fn encode(&self, target: &str) -> String {
        let params: Vec<String> = self
            .params
            .iter()
            .map(|(key, value)| format!("{}='{}'", key, value))
            .collect();
        format!("{} reinit {}", target, params.join(":"))
    }
}
