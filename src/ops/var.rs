//! Context bag access: `var.set` and `var.get`

use serde_json::Value;

use crate::context::Context;
use crate::error::Result;
use crate::executor::{Arguments, Executor};

/// Stores its input under a name and passes it through.
#[derive(Debug, Clone)]
pub struct Set(String);

impl Set {
    pub fn from_args(args: Arguments) -> Result<Box<dyn Executor>> {
        Ok(Box::new(Self(args.literal(0)?)))
    }
}

impl Executor for Set {
    fn exec(&self, ctx: &Context, value: &Value) -> Result<Value> {
        ctx.set(self.0.clone(), value.clone());
        Ok(value.clone())
    }
}

/// Reads a name from the bag, ignoring its input. Missing names are null.
#[derive(Debug, Clone)]
pub struct Get(String);

impl Get {
    pub fn from_args(args: Arguments) -> Result<Box<dyn Executor>> {
        Ok(Box::new(Self(args.literal(0)?)))
    }
}

impl Executor for Get {
    fn exec(&self, ctx: &Context, _value: &Value) -> Result<Value> {
        Ok(ctx.get(&self.0).unwrap_or(Value::Null))
    }
}
