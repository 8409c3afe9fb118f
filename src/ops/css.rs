//! CSS selector-based extraction
//!
//! Uses the scraper crate to select elements by CSS selectors. The input is
//! an HTML string; a document or a fragment returned by an earlier step both
//! work.
//!
//! Accessors (for `css.first`):
//! - `text` (default), `html`, `inner`, `attr:NAME`
//! - `parent.text`, `parent.html`, `parent.attr:NAME`
//! - `children.N.text`, `children.N.html`, `children.N.attr:NAME`

use std::fmt;

use scraper::{ElementRef, Html, Selector};
use serde_json::Value;

use crate::context::Context;
use crate::error::{Error, Result};
use crate::executor::{Arguments, Executor};

#[derive(Debug, Clone, PartialEq)]
enum Mode {
    /// Outer HTML of every match.
    Html,
    /// Trimmed text of every match.
    Text,
    /// One attribute of every match that has it.
    Attr(String),
    /// First match through an accessor.
    First(String),
}

pub struct Css {
    source: String,
    selector: Selector,
    mode: Mode,
}

impl Css {
    fn build(args: &Arguments, mode: Mode) -> Result<Box<dyn Executor>> {
        let source = args.literal(0)?;
        let selector = Selector::parse(&source)
            .map_err(|e| Error::invalid(format!("invalid selector `{source}`: {e:?}")))?;
        Ok(Box::new(Self {
            source,
            selector,
            mode,
        }))
    }

    pub fn all(args: Arguments) -> Result<Box<dyn Executor>> {
        Self::build(&args, Mode::Html)
    }

    pub fn text(args: Arguments) -> Result<Box<dyn Executor>> {
        Self::build(&args, Mode::Text)
    }

    pub fn attr(args: Arguments) -> Result<Box<dyn Executor>> {
        let name = args.literal(1)?;
        Self::build(&args, Mode::Attr(name))
    }

    pub fn first(args: Arguments) -> Result<Box<dyn Executor>> {
        let accessor = args
            .optional_literal(1)?
            .unwrap_or_else(|| "text".to_string());
        Self::build(&args, Mode::First(accessor))
    }

    fn select(&self, html: &str) -> Value {
        let document = Html::parse_document(html);
        let mut matches = document.select(&self.selector);

        let strings = |items: Vec<String>| Value::Array(items.into_iter().map(Value::String).collect());
        match &self.mode {
            Mode::Html => strings(matches.map(|el| el.html()).collect()),
            Mode::Text => strings(matches.map(element_text).collect()),
            Mode::Attr(name) => strings(
                matches
                    .filter_map(|el| el.value().attr(name).map(String::from))
                    .collect(),
            ),
            Mode::First(accessor) => matches
                .next()
                .and_then(|el| access(el, accessor))
                .map(Value::String)
                .unwrap_or(Value::Null),
        }
    }
}

impl fmt::Debug for Css {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Css")
            .field("selector", &self.source)
            .field("mode", &self.mode)
            .finish()
    }
}

impl Executor for Css {
    fn exec(&self, ctx: &Context, value: &Value) -> Result<Value> {
        ctx.check()?;
        match value {
            Value::Null => Ok(Value::Null),
            Value::String(html) => Ok(self.select(html)),
            other => Err(Error::invalid(format!(
                "css `{}` expects an HTML string, got {other}",
                self.source
            ))),
        }
    }
}

fn element_text(el: ElementRef) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// Read a value from an element through an accessor string.
fn access(element: ElementRef, accessor: &str) -> Option<String> {
    // parent.text, parent.html, parent.attr:name
    if let Some(rest) = accessor.strip_prefix("parent.") {
        let parent = ElementRef::wrap(element.parent()?)?;
        return access(parent, rest);
    }

    // children.N.text, children.N.html, children.N.attr:name
    if let Some(rest) = accessor.strip_prefix("children.") {
        let (index, child_accessor) = rest.split_once('.')?;
        let index: usize = index.parse().ok()?;
        let child = element.children().filter_map(ElementRef::wrap).nth(index)?;
        return access(child, child_accessor);
    }

    match accessor {
        "html" => Some(element.html()),
        "inner" => Some(element.inner_html()),
        attr if attr.starts_with("attr:") => {
            let attr_name = attr.strip_prefix("attr:")?;
            element.value().attr(attr_name).map(String::from)
        }
        _ => Some(element_text(element)),
    }
}
