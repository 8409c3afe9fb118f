//! Rule document compiler
//!
//! Translates a [`Node`] tree into one executor:
//!
//! | node                                   | compiles to                         |
//! |----------------------------------------|-------------------------------------|
//! | scalar                                 | string literal                      |
//! | null                                   | null literal                        |
//! | sequence                               | one executor per element            |
//! | mapping, first key starts with `$`     | one call per pair                   |
//! | mapping, plain keys                    | `map` over key/value pairs          |
//! | alias                                  | the aliased node, compiled in place |
//!
//! Under a plain key, a single-pair mapping is a call even without the `$`
//! sigil, and a multi-pair mapping is a pipe of calls.

use tracing::debug;

use crate::combinators::{Map, Pipe};
use crate::config::EngineConfig;
use crate::error::CompileError;
use crate::executor::{Arguments, Executor, Raw, Str};
use crate::node::{Node, NodeKind};
use crate::registry::Registry;

/// Marks a mapping key as an operation call.
pub const SIGIL: char = '$';

type CompileResult<T> = Result<T, CompileError>;

pub struct Compiler<'r> {
    registry: &'r Registry,
    max_depth: usize,
}

impl<'r> Compiler<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self {
            registry,
            max_depth: EngineConfig::default().max_depth,
        }
    }

    pub fn with_config(registry: &'r Registry, config: &EngineConfig) -> Self {
        Self {
            registry,
            max_depth: config.max_depth,
        }
    }

    /// Compile a document into a single executor.
    pub fn compile(&self, node: &Node) -> CompileResult<Box<dyn Executor>> {
        let args = self.arguments(node, 0)?;
        debug!(path = %node.path, args = args.len(), "compiled rule document");
        Ok(args.into_executor())
    }

    /// Compile a node into the argument list it contributes.
    pub fn arguments(&self, node: &Node, depth: usize) -> CompileResult<Arguments> {
        if depth > self.max_depth {
            return Err(CompileError::TooDeep {
                path: node.path.clone(),
                limit: self.max_depth,
            });
        }

        match &node.kind {
            NodeKind::Null => Ok(single(Raw(serde_json::Value::Null))),
            NodeKind::Scalar(text) => Ok(single(Str::new(text.as_str()))),
            NodeKind::Sequence(items) => items
                .iter()
                .map(|item| self.one(item, depth + 1))
                .collect(),
            NodeKind::Mapping(pairs) => {
                if starts_with_call(pairs) {
                    pairs
                        .iter()
                        .map(|(key, value)| self.call(key, value, depth))
                        .collect()
                } else {
                    let args = self.pairs(pairs, depth)?;
                    Ok(single(Map::new(args)))
                }
            }
            NodeKind::Alias(target) => self.arguments(target, depth + 1),
            NodeKind::Tagged(tag, _) => Err(CompileError::Unsupported {
                path: node.path.clone(),
                kind: format!("tagged value {tag}"),
            }),
        }
    }

    /// Compile a node and fold it into exactly one executor.
    fn one(&self, node: &Node, depth: usize) -> CompileResult<Box<dyn Executor>> {
        Ok(self.arguments(node, depth)?.into_executor())
    }

    /// Compile `$name: args` (the sigil is optional) into one executor.
    fn call(&self, key: &Node, value: &Node, depth: usize) -> CompileResult<Box<dyn Executor>> {
        let raw = key.as_scalar().ok_or_else(|| CompileError::Unsupported {
            path: key.path.clone(),
            kind: format!("{} as operation name", key.kind_name()),
        })?;
        let name = raw.strip_prefix(SIGIL).unwrap_or(raw);

        let ctor = self
            .registry
            .lookup(name)
            .ok_or_else(|| CompileError::UnknownOperation {
                path: key.path.clone(),
                name: name.to_string(),
            })?;

        let args = self.arguments(value, depth + 1)?;
        let mut exec = ctor(args).map_err(|source| CompileError::Construct {
            path: key.path.clone(),
            name: name.to_string(),
            source,
        })?;

        if let Some(inspect) = exec.as_inspect() {
            inspect.inspect(key, value);
        }
        Ok(exec)
    }

    /// Compile plain `key: value` pairs into alternating key and value
    /// executors for `map`.
    fn pairs(&self, pairs: &[(Node, Node)], depth: usize) -> CompileResult<Arguments> {
        let mut args = Arguments::default();
        for (key, value) in pairs {
            let text = key.as_scalar().ok_or_else(|| CompileError::Unsupported {
                path: key.path.clone(),
                kind: format!("{} as map key", key.kind_name()),
            })?;
            args.push(Box::new(Str::new(text)));
            args.push(self.value(value, depth + 1)?);
        }
        Ok(args)
    }

    fn value(&self, node: &Node, depth: usize) -> CompileResult<Box<dyn Executor>> {
        let resolved = node.resolve();
        match &resolved.kind {
            NodeKind::Mapping(pairs) if pairs.len() == 1 => {
                let (key, value) = &pairs[0];
                self.call(key, value, depth)
            }
            NodeKind::Mapping(pairs) if pairs.len() > 1 => {
                let steps = pairs
                    .iter()
                    .map(|(key, value)| self.call(key, value, depth))
                    .collect::<CompileResult<Vec<_>>>()?;
                Ok(Box::new(Pipe::new(steps)))
            }
            _ => self.one(node, depth),
        }
    }
}

fn single<E: Executor + 'static>(exec: E) -> Arguments {
    Arguments::new(vec![Box::new(exec)])
}

fn starts_with_call(pairs: &[(Node, Node)]) -> bool {
    pairs
        .first()
        .and_then(|(key, _)| key.as_scalar())
        .is_some_and(|key| key.starts_with(SIGIL))
}
