//! Core types shared by the requester and the link contract.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Identifier of a remote object instance of a fixed type.
///
/// Serialized untagged, so the wire form is a bare JSON number or string.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ToiId {
    Int(i64),
    Str(String),
}

impl fmt::Debug for ToiId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToiId::Int(n) => write!(f, "ToiId({})", n),
            ToiId::Str(s) => write!(f, "ToiId({:?})", s),
        }
    }
}

impl fmt::Display for ToiId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToiId::Int(n) => write!(f, "{}", n),
            ToiId::Str(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for ToiId {
    fn from(n: i64) -> Self {
        ToiId::Int(n)
    }
}

impl From<i32> for ToiId {
    fn from(n: i32) -> Self {
        ToiId::Int(n as i64)
    }
}

impl From<&str> for ToiId {
    fn from(s: &str) -> Self {
        ToiId::Str(s.to_string())
    }
}

impl From<String> for ToiId {
    fn from(s: String) -> Self {
        ToiId::Str(s)
    }
}

/// Attribute name -> value. Values are kept as raw JSON (the server sends
/// each attribute as a list).
pub type Attributes = BTreeMap<String, serde_json::Value>;

/// Shallow-merge `diff` into `target`: attributes in the diff replace the
/// previous value, all others are kept.
pub fn merge_attributes(target: &mut Attributes, diff: Attributes) {
    for (name, value) in diff {
        target.insert(name, value);
    }
}

/// Error payload as delivered by the server.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoteError {
    /// Server-side exception class, if any.
    #[serde(rename = "__class__", default, skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.class, &self.args, &self.value) {
            (Some(class), Some(args), _) => write!(f, "{}({})", class, args),
            (Some(class), None, _) => write!(f, "{}", class),
            (None, _, Some(value)) => write!(f, "{}", value),
            (None, Some(args), None) => write!(f, "{}", args),
            (None, None, None) => write!(f, "unknown error"),
        }
    }
}
