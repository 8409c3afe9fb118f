//! The evaluation contract shared by every compiled node
//!
//! An [`Executor`] is built once by a constructor and then evaluated any
//! number of times, possibly from several threads at once.

use std::fmt;

use serde_json::Value;

use crate::combinators::Pipe;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::node::Node;

pub trait Executor: fmt::Debug + Send + Sync {
    fn exec(&self, ctx: &Context, value: &Value) -> Result<Value>;

    /// Cheap "should this run at all" predicate, consulted by `list`.
    fn as_guard(&self) -> Option<&dyn Guard> {
        None
    }

    /// Hook receiving the document nodes this executor was compiled from.
    fn as_inspect(&mut self) -> Option<&mut dyn Inspect> {
        None
    }
}

pub trait Guard {
    fn should_run(&self, ctx: &Context, value: &Value) -> bool;
}

pub trait Inspect {
    /// Called once after construction with the call's key and argument nodes.
    fn inspect(&mut self, key: &Node, value: &Node);
}

/// Ordered, already compiled arguments of a call.
#[derive(Debug, Default)]
pub struct Arguments(Vec<Box<dyn Executor>>);

impl Arguments {
    pub fn new(args: Vec<Box<dyn Executor>>) -> Self {
        Self(args)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&dyn Executor> {
        self.0.get(index).map(|e| e.as_ref())
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Executor> {
        self.0.iter().map(|e| e.as_ref())
    }

    pub fn push(&mut self, exec: Box<dyn Executor>) {
        self.0.push(exec);
    }

    pub fn into_vec(self) -> Vec<Box<dyn Executor>> {
        self.0
    }

    /// Fold into a single executor: one argument stays as is, anything else
    /// becomes a pipe.
    pub fn into_executor(mut self) -> Box<dyn Executor> {
        if self.0.len() == 1 {
            if let Some(only) = self.0.pop() {
                return only;
            }
        }
        Box::new(Pipe::new(self.0))
    }

    /// Evaluate argument `index` against a background context and null input
    /// and return it as text. Used by constructors reading literal options.
    pub fn literal(&self, index: usize) -> Result<String> {
        let arg = self
            .get(index)
            .ok_or_else(|| Error::invalid(format!("missing argument {}", index + 1)))?;
        match arg.exec(&Context::background(), &Value::Null)? {
            Value::String(s) => Ok(s),
            Value::Null => Err(Error::invalid(format!("argument {} is null", index + 1))),
            other => Ok(other.to_string()),
        }
    }

    /// Like [`Arguments::literal`], returning `None` when the argument is
    /// absent or null.
    pub fn optional_literal(&self, index: usize) -> Result<Option<String>> {
        let Some(arg) = self.get(index) else {
            return Ok(None);
        };
        match arg.exec(&Context::background(), &Value::Null)? {
            Value::String(s) => Ok(Some(s)),
            Value::Null => Ok(None),
            other => Ok(Some(other.to_string())),
        }
    }
}

impl From<Vec<Box<dyn Executor>>> for Arguments {
    fn from(args: Vec<Box<dyn Executor>>) -> Self {
        Self(args)
    }
}

impl FromIterator<Box<dyn Executor>> for Arguments {
    fn from_iter<I: IntoIterator<Item = Box<dyn Executor>>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Arguments {
    type Item = Box<dyn Executor>;
    type IntoIter = std::vec::IntoIter<Box<dyn Executor>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// String literal; ignores its input.
#[derive(Debug, Clone, PartialEq)]
pub struct Str(pub String);

impl Str {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }
}

impl Executor for Str {
    fn exec(&self, _ctx: &Context, _value: &Value) -> Result<Value> {
        Ok(Value::String(self.0.clone()))
    }
}

/// Fixed value of any shape; `Raw(Value::Null)` is the null constant.
#[derive(Debug, Clone, PartialEq)]
pub struct Raw(pub Value);

impl Executor for Raw {
    fn exec(&self, _ctx: &Context, _value: &Value) -> Result<Value> {
        Ok(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_literals_ignore_input() {
        let ctx = Context::background();
        assert_eq!(Str::new("a").exec(&ctx, &json!([1, 2])).unwrap(), json!("a"));
        assert_eq!(Raw(Value::Null).exec(&ctx, &json!("x")).unwrap(), Value::Null);
    }

    #[test]
    fn test_literal_arguments() {
        let args = Arguments::new(vec![Box::new(Str::new(",")), Box::new(Raw(json!(3)))]);
        assert_eq!(args.literal(0).unwrap(), ",");
        assert_eq!(args.literal(1).unwrap(), "3");
        assert!(args.literal(2).is_err());
        assert_eq!(args.optional_literal(2).unwrap(), None);
    }

    #[test]
    fn test_null_literal_is_rejected() {
        let args = Arguments::new(vec![Box::new(Raw(Value::Null))]);
        assert!(args.literal(0).is_err());
        assert_eq!(args.optional_literal(0).unwrap(), None);
    }

    #[test]
    fn test_fold_single_argument() {
        let args = Arguments::new(vec![Box::new(Str::new("only"))]);
        let exec = args.into_executor();
        assert_eq!(format!("{exec:?}"), r#"Str("only")"#);
    }

    #[test]
    fn test_fold_many_arguments_into_pipe() {
        let args = Arguments::new(vec![Box::new(Str::new("a")), Box::new(Str::new("b"))]);
        let exec = args.into_executor();
        let out = exec.exec(&Context::background(), &Value::Null).unwrap();
        assert_eq!(out, json!("b"));
    }
}
