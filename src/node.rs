//! Rule document tree
//!
//! Documents are loaded from YAML or JSON into [`Node`]s. Every node records
//! its document path (`$`, `$.title`, `$.items[2]`) so that compile errors and
//! operations that inspect their source can point back at it.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::error::CompileError;

/// Path of the document root.
pub const ROOT: &str = "$";

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Null,
    Scalar(String),
    Sequence(Vec<Node>),
    /// Pairs in document order.
    Mapping(Vec<(Node, Node)>),
    /// Reference to an anchored node, compiled in place.
    Alias(Arc<Node>),
    /// YAML tagged value such as `!css x`. Not part of the rule grammar.
    Tagged(String, Box<Node>),
}

impl Node {
    pub fn null() -> Self {
        Node::root(NodeKind::Null)
    }

    pub fn scalar(text: impl Into<String>) -> Self {
        Node::root(NodeKind::Scalar(text.into()))
    }

    pub fn sequence(items: Vec<Node>) -> Self {
        let mut node = Node::root(NodeKind::Sequence(items));
        node.repath(ROOT.to_string());
        node
    }

    pub fn mapping<K: Into<String>>(pairs: Vec<(K, Node)>) -> Self {
        let pairs = pairs
            .into_iter()
            .map(|(k, v)| (Node::scalar(k), v))
            .collect();
        let mut node = Node::root(NodeKind::Mapping(pairs));
        node.repath(ROOT.to_string());
        node
    }

    /// An alias to `target`. The target keeps the path of its anchor.
    pub fn alias(target: Arc<Node>) -> Self {
        Node::root(NodeKind::Alias(target))
    }

    fn root(kind: NodeKind) -> Self {
        Node {
            kind,
            path: ROOT.to_string(),
        }
    }

    /// Load a YAML rule document. Aliases are expanded by the YAML loader.
    pub fn from_yaml_str(source: &str) -> Result<Self, CompileError> {
        let value: serde_yaml::Value = serde_yaml::from_str(source)?;
        Ok(Node::from_yaml_value(&value, ROOT.to_string()))
    }

    /// Load a JSON rule document. Object keys keep their document order.
    pub fn from_json_str(source: &str) -> Result<Self, CompileError> {
        let value: Value = serde_json::from_str(source)?;
        Ok(Node::from(value))
    }

    fn from_yaml_value(value: &serde_yaml::Value, path: String) -> Self {
        use serde_yaml::Value as Yaml;

        let kind = match value {
            Yaml::Null => NodeKind::Null,
            Yaml::Bool(b) => NodeKind::Scalar(b.to_string()),
            Yaml::Number(n) => NodeKind::Scalar(n.to_string()),
            Yaml::String(s) => NodeKind::Scalar(s.clone()),
            Yaml::Sequence(items) => NodeKind::Sequence(
                items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| Node::from_yaml_value(item, format!("{path}[{i}]")))
                    .collect(),
            ),
            Yaml::Mapping(map) => NodeKind::Mapping(
                map.iter()
                    .map(|(k, v)| {
                        let mut key = Node::from_yaml_value(k, path.clone());
                        let child = child_path(&path, &key);
                        key.repath(child.clone());
                        (key, Node::from_yaml_value(v, child))
                    })
                    .collect(),
            ),
            Yaml::Tagged(tagged) => NodeKind::Tagged(
                tagged.tag.to_string(),
                Box::new(Node::from_yaml_value(&tagged.value, path.clone())),
            ),
        };
        Node { kind, path }
    }

    fn from_json_value(value: Value, path: String) -> Self {
        let kind = match value {
            Value::Null => NodeKind::Null,
            Value::Bool(b) => NodeKind::Scalar(b.to_string()),
            Value::Number(n) => NodeKind::Scalar(n.to_string()),
            Value::String(s) => NodeKind::Scalar(s),
            Value::Array(items) => NodeKind::Sequence(
                items
                    .into_iter()
                    .enumerate()
                    .map(|(i, item)| Node::from_json_value(item, format!("{path}[{i}]")))
                    .collect(),
            ),
            Value::Object(map) => NodeKind::Mapping(
                map.into_iter()
                    .map(|(k, v)| {
                        let child = format!("{path}.{k}");
                        let key = Node {
                            kind: NodeKind::Scalar(k),
                            path: child.clone(),
                        };
                        (key, Node::from_json_value(v, child))
                    })
                    .collect(),
            ),
        };
        Node { kind, path }
    }

    /// Rewrite the paths of this node and its children below `path`.
    /// Alias targets keep the path of their anchor.
    fn repath(&mut self, path: String) {
        match &mut self.kind {
            NodeKind::Sequence(items) => {
                for (i, item) in items.iter_mut().enumerate() {
                    item.repath(format!("{path}[{i}]"));
                }
            }
            NodeKind::Mapping(pairs) => {
                for (key, value) in pairs.iter_mut() {
                    let child = child_path(&path, key);
                    key.repath(child.clone());
                    value.repath(child);
                }
            }
            NodeKind::Tagged(_, inner) => inner.repath(path.clone()),
            NodeKind::Null | NodeKind::Scalar(_) | NodeKind::Alias(_) => {}
        }
        self.path = path;
    }

    /// Follow aliases to the node they refer to.
    pub fn resolve(&self) -> &Node {
        match &self.kind {
            NodeKind::Alias(target) => target.resolve(),
            _ => self,
        }
    }

    pub fn as_scalar(&self) -> Option<&str> {
        match &self.resolve().kind {
            NodeKind::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            NodeKind::Null => "null",
            NodeKind::Scalar(_) => "scalar",
            NodeKind::Sequence(_) => "sequence",
            NodeKind::Mapping(_) => "mapping",
            NodeKind::Alias(_) => "alias",
            NodeKind::Tagged(_, _) => "tagged value",
        }
    }
}

fn child_path(parent: &str, key: &Node) -> String {
    match key.as_scalar() {
        Some(k) => format!("{parent}.{k}"),
        None => format!("{parent}.<{}>", key.kind_name()),
    }
}

impl From<Value> for Node {
    fn from(value: Value) -> Self {
        Node::from_json_value(value, ROOT.to_string())
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.kind_name(), self.path)
    }
}
