//! String helpers and the `str.has` gate

use serde_json::Value;

use super::{map_strings, text};
use crate::context::Context;
use crate::error::{Error, Result};
use crate::executor::{Arguments, Executor, Guard};

/// Passes its input through when it contains the needle, otherwise yields.
///
/// Arrays match when any string member contains the needle. Values that are
/// not strings never match.
#[derive(Debug, Clone)]
pub struct Has(String);

impl Has {
    pub fn new(needle: impl Into<String>) -> Self {
        Self(needle.into())
    }

    pub fn from_args(args: Arguments) -> Result<Box<dyn Executor>> {
        Ok(Box::new(Self(args.literal(0)?)))
    }

    fn matches(&self, value: &Value) -> bool {
        match value {
            Value::String(s) => s.contains(&self.0),
            Value::Array(items) => items
                .iter()
                .any(|item| matches!(item, Value::String(s) if s.contains(&self.0))),
            _ => false,
        }
    }
}

impl Executor for Has {
    fn exec(&self, _ctx: &Context, value: &Value) -> Result<Value> {
        if self.matches(value) {
            Ok(value.clone())
        } else {
            Err(Error::Yield)
        }
    }

    fn as_guard(&self) -> Option<&dyn Guard> {
        Some(self)
    }
}

impl Guard for Has {
    fn should_run(&self, _ctx: &Context, value: &Value) -> bool {
        self.matches(value)
    }
}

/// Joins the members of an array with a separator (default: empty).
#[derive(Debug, Clone)]
pub struct Join(String);

impl Join {
    pub fn from_args(args: Arguments) -> Result<Box<dyn Executor>> {
        Ok(Box::new(Self(args.optional_literal(0)?.unwrap_or_default())))
    }
}

impl Executor for Join {
    fn exec(&self, _ctx: &Context, value: &Value) -> Result<Value> {
        match value {
            Value::Array(items) => {
                let parts: Vec<String> = items.iter().filter_map(text).collect();
                Ok(Value::String(parts.join(&self.0)))
            }
            other => Ok(other.clone()),
        }
    }
}

/// Splits text on a separator, dropping empty pieces.
#[derive(Debug, Clone)]
pub struct Split(String);

impl Split {
    pub fn from_args(args: Arguments) -> Result<Box<dyn Executor>> {
        let sep = args.literal(0)?;
        if sep.is_empty() {
            return Err(Error::invalid("str.split needs a non-empty separator"));
        }
        Ok(Box::new(Self(sep)))
    }
}

impl Executor for Split {
    fn exec(&self, _ctx: &Context, value: &Value) -> Result<Value> {
        let Some(s) = text(value) else {
            return Ok(Value::Null);
        };
        Ok(Value::Array(
            s.split(self.0.as_str())
                .filter(|part| !part.is_empty())
                .map(|part| Value::String(part.to_string()))
                .collect(),
        ))
    }
}

/// Trims whitespace from strings, element-wise for arrays.
#[derive(Debug, Clone)]
pub struct Trim;

impl Trim {
    pub fn from_args(_args: Arguments) -> Result<Box<dyn Executor>> {
        Ok(Box::new(Self))
    }
}

impl Executor for Trim {
    fn exec(&self, _ctx: &Context, value: &Value) -> Result<Value> {
        Ok(map_strings(value, &|s: &str| Value::String(s.trim().to_string())))
    }
}

/// Replaces every occurrence of `from` with `to`.
#[derive(Debug, Clone)]
pub struct Replace {
    from: String,
    to: String,
}

impl Replace {
    pub fn from_args(args: Arguments) -> Result<Box<dyn Executor>> {
        Ok(Box::new(Self {
            from: args.literal(0)?,
            to: args.optional_literal(1)?.unwrap_or_default(),
        }))
    }
}

impl Executor for Replace {
    fn exec(&self, _ctx: &Context, value: &Value) -> Result<Value> {
        Ok(map_strings(value, &|s: &str| {
            Value::String(s.replace(&self.from, &self.to))
        }))
    }
}

/// Prepends a fixed string to the text of its input. Null stays null.
#[derive(Debug, Clone)]
pub struct Prefix(String);

impl Prefix {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self(prefix.into())
    }

    pub fn from_args(args: Arguments) -> Result<Box<dyn Executor>> {
        Ok(Box::new(Self(args.literal(0)?)))
    }
}

impl Executor for Prefix {
    fn exec(&self, _ctx: &Context, value: &Value) -> Result<Value> {
        Ok(text(value)
            .map(|s| Value::String(format!("{}{s}", self.0)))
            .unwrap_or(Value::Null))
    }
}
