//! Regular expression leaves: `regex`, `regex.first`, `regex.replace`

use regex::Regex;
use serde_json::Value;

use super::{map_strings, text};
use crate::context::Context;
use crate::error::{Error, Result};
use crate::executor::{Arguments, Executor};

/// Finds matches of a pattern in the text of its input.
///
/// The optional second argument selects a capture group; matches where that
/// group did not participate are skipped.
#[derive(Debug, Clone)]
pub struct Find {
    regex: Regex,
    group: usize,
    first: bool,
}

impl Find {
    fn build(args: &Arguments, first: bool) -> Result<Box<dyn Executor>> {
        let regex = Regex::new(&args.literal(0)?)?;
        let group = match args.optional_literal(1)? {
            Some(g) => g
                .trim()
                .parse::<usize>()
                .map_err(|_| Error::invalid(format!("invalid capture group `{g}`")))?,
            None => 0,
        };
        if group >= regex.captures_len() {
            return Err(Error::invalid(format!(
                "pattern `{}` has no capture group {group}",
                regex.as_str()
            )));
        }
        Ok(Box::new(Self {
            regex,
            group,
            first,
        }))
    }

    pub fn all(args: Arguments) -> Result<Box<dyn Executor>> {
        Self::build(&args, false)
    }

    pub fn first(args: Arguments) -> Result<Box<dyn Executor>> {
        Self::build(&args, true)
    }
}

impl Executor for Find {
    fn exec(&self, ctx: &Context, value: &Value) -> Result<Value> {
        ctx.check()?;
        let Some(haystack) = text(value) else {
            return Ok(Value::Null);
        };
        let mut found = self
            .regex
            .captures_iter(&haystack)
            .filter_map(|caps| caps.get(self.group))
            .map(|m| Value::String(m.as_str().to_string()));

        if self.first {
            Ok(found.next().unwrap_or(Value::Null))
        } else {
            Ok(Value::Array(found.collect()))
        }
    }
}

/// Replaces every match; the replacement may refer to groups as `$1`.
#[derive(Debug, Clone)]
pub struct Replace {
    regex: Regex,
    replacement: String,
}

impl Replace {
    pub fn from_args(args: Arguments) -> Result<Box<dyn Executor>> {
        Ok(Box::new(Self {
            regex: Regex::new(&args.literal(0)?)?,
            replacement: args.optional_literal(1)?.unwrap_or_default(),
        }))
    }
}

impl Executor for Replace {
    fn exec(&self, ctx: &Context, value: &Value) -> Result<Value> {
        ctx.check()?;
        Ok(map_strings(value, &|s: &str| {
            Value::String(
                self.regex
                    .replace_all(s, self.replacement.as_str())
                    .into_owned(),
            )
        }))
    }
}
