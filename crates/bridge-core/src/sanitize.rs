//! Result sanitizer: normalizes engine-native numbers in nested results before transport.
//!
//! `Node` is the closed set of shapes a result can take: mappings, sequences and
//! scalars. Engine-native scalars (`F32`, `I32`, `U32`, `Vector`) are rewritten into
//! the canonical ones (`Float`, `Int`, `Seq` of `Float`). Sanitizing twice is a no-op.

use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Map(Vec<(String, Node)>),
    Seq(Vec<Node>),
    /// Canonical decimal.
    Float(f64),
    /// Canonical integer.
    Int(i64),
    F32(f32),
    I32(i32),
    U32(u32),
    Vector(Vec<f32>),
    Text(String),
    Bool(bool),
    Null,
}

impl Node {
    /// Empty mapping, filled with [`Node::with`].
    pub fn map() -> Self {
        Node::Map(Vec::new())
    }

    /// Append an entry to a mapping. No-op on other shapes.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Node>) -> Self {
        if let Node::Map(entries) = &mut self {
            entries.push((key.into(), value.into()));
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<&Node> {
        match self {
            Node::Map(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::Text(s) => Some(s),
            _ => None,
        }
    }

    /// True when no engine-native scalar remains anywhere in the tree.
    pub fn is_canonical(&self) -> bool {
        match self {
            Node::Map(entries) => entries.iter().all(|(_, v)| v.is_canonical()),
            Node::Seq(items) => items.iter().all(Node::is_canonical),
            Node::F32(_) | Node::I32(_) | Node::U32(_) | Node::Vector(_) => false,
            _ => true,
        }
    }
}

/// Recursive visitor over mappings and sequences; every scalar goes through `normalize`.
pub fn visit<F>(node: Node, normalize: &F) -> Node
where
    F: Fn(Node) -> Node,
{
    match node {
        Node::Map(entries) => Node::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k, visit(v, normalize)))
                .collect(),
        ),
        Node::Seq(items) => Node::Seq(items.into_iter().map(|v| visit(v, normalize)).collect()),
        scalar => normalize(scalar),
    }
}

/// Scalar rule used by [`sanitize`].
pub fn canonical_scalar(node: Node) -> Node {
    match node {
        Node::F32(v) => canonical_float(v),
        Node::Float(v) if !v.is_finite() => Node::Null,
        Node::I32(v) => Node::Int(v as i64),
        Node::U32(v) => Node::Int(v as i64),
        Node::Vector(values) => Node::Seq(values.into_iter().map(canonical_float).collect()),
        other => other,
    }
}

pub fn sanitize(node: Node) -> Node {
    visit(node, &canonical_scalar)
}

/// Widen an `f32` through its shortest decimal form, so 0.81f32 becomes 0.81, not
/// 0.8100000023841858.
pub fn canonical_decimal(v: f32) -> Option<f64> {
    if !v.is_finite() {
        return None;
    }
    Some(v.to_string().parse::<f64>().unwrap_or(v as f64))
}

fn canonical_float(v: f32) -> Node {
    canonical_decimal(v).map(Node::Float).unwrap_or(Node::Null)
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Node::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (k, v) in entries {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
            Node::Seq(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Node::Vector(values) => {
                let mut seq = serializer.serialize_seq(Some(values.len()))?;
                for v in values {
                    seq.serialize_element(v)?;
                }
                seq.end()
            }
            Node::Float(v) => serializer.serialize_f64(*v),
            Node::Int(v) => serializer.serialize_i64(*v),
            Node::F32(v) => serializer.serialize_f32(*v),
            Node::I32(v) => serializer.serialize_i32(*v),
            Node::U32(v) => serializer.serialize_u32(*v),
            Node::Text(s) => serializer.serialize_str(s),
            Node::Bool(b) => serializer.serialize_bool(*b),
            Node::Null => serializer.serialize_unit(),
        }
    }
}

impl From<serde_json::Value> for Node {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => Node::Null,
            Value::Bool(b) => Node::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Node::Int(i),
                None => n.as_f64().map(Node::Float).unwrap_or(Node::Null),
            },
            Value::String(s) => Node::Text(s),
            Value::Array(items) => Node::Seq(items.into_iter().map(Node::from).collect()),
            Value::Object(map) => Node::Map(map.into_iter().map(|(k, v)| (k, Node::from(v))).collect()),
        }
    }
}

impl From<f32> for Node {
    fn from(v: f32) -> Self {
        Node::F32(v)
    }
}

impl From<f64> for Node {
    fn from(v: f64) -> Self {
        Node::Float(v)
    }
}

impl From<&str> for Node {
    fn from(v: &str) -> Self {
        Node::Text(v.to_string())
    }
}

impl From<String> for Node {
    fn from(v: String) -> Self {
        Node::Text(v)
    }
}

impl From<Vec<f32>> for Node {
    fn from(v: Vec<f32>) -> Self {
        Node::Vector(v)
    }
}

impl<T: Into<Node>> From<Option<T>> for Node {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Node::Null)
    }
}
