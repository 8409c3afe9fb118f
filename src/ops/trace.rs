//! `debug`: logs the value flowing through a point of the document

use serde_json::Value;
use tracing::debug;

use crate::context::Context;
use crate::error::Result;
use crate::executor::{Arguments, Executor, Inspect};
use crate::node::Node;

/// Pass-through that logs its input at debug level, tagged with an optional
/// label and the document path it was compiled from.
#[derive(Debug, Clone, Default)]
pub struct Trace {
    label: Option<String>,
    path: Option<String>,
}

impl Trace {
    pub fn from_args(args: Arguments) -> Result<Box<dyn Executor>> {
        Ok(Box::new(Self {
            label: args.optional_literal(0)?,
            path: None,
        }))
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }
}

impl Executor for Trace {
    fn exec(&self, _ctx: &Context, value: &Value) -> Result<Value> {
        debug!(
            label = self.label.as_deref().unwrap_or(""),
            path = self.path.as_deref().unwrap_or("?"),
            %value,
            "trace"
        );
        Ok(value.clone())
    }

    fn as_inspect(&mut self) -> Option<&mut dyn Inspect> {
        Some(self)
    }
}

impl Inspect for Trace {
    fn inspect(&mut self, key: &Node, _value: &Node) {
        self.path = Some(key.path.clone());
    }
}
