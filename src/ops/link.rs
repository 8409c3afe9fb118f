//! Link resolution
//!
//! `url.resolve` turns relative links into absolute http(s) URLs. The base
//! comes from the argument, or from the `url` entry of the context bag.

use serde_json::Value;
use url::Url;

use crate::context::Context;
use crate::error::{Error, Result};
use crate::executor::{Arguments, Executor};

/// Context bag key holding the page URL.
pub const BASE_KEY: &str = "url";

#[derive(Debug, Clone)]
pub struct Resolve {
    base: Option<Url>,
}

impl Resolve {
    pub fn from_args(args: Arguments) -> Result<Box<dyn Executor>> {
        let base = match args.optional_literal(0)? {
            Some(base) => Some(parse_base(&base)?),
            None => None,
        };
        Ok(Box::new(Self { base }))
    }

    fn base(&self, ctx: &Context) -> Result<Url> {
        if let Some(base) = &self.base {
            return Ok(base.clone());
        }
        match ctx.get(BASE_KEY) {
            Some(Value::String(base)) => parse_base(&base),
            _ => Err(Error::invalid("url.resolve needs a base url")),
        }
    }
}

impl Executor for Resolve {
    fn exec(&self, ctx: &Context, value: &Value) -> Result<Value> {
        let base = self.base(ctx)?;
        let absolute = |href: &str| resolve(&base, href).map(Value::String);
        match value {
            Value::String(href) => Ok(absolute(href).unwrap_or(Value::Null)),
            Value::Array(items) => Ok(Value::Array(
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .filter_map(absolute)
                    .collect(),
            )),
            _ => Ok(Value::Null),
        }
    }
}

fn parse_base(base: &str) -> Result<Url> {
    Url::parse(base).map_err(|e| Error::invalid(format!("invalid base url `{base}`: {e}")))
}

/// Resolve one href. Empty, `javascript:`, `mailto:`, `tel:` and fragment
/// links are dropped, as is anything that does not end up http(s).
fn resolve(base: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty()
        || href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with('#')
    {
        return None;
    }

    let absolute = base.join(href).ok()?;
    matches!(absolute.scheme(), "http" | "https").then(|| absolute.to_string())
}
