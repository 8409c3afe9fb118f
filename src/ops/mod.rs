//! Built-in operations
//!
//! Each module provides the leaves for one kind of content. Everything is
//! wired into a registry by [`register_builtins`].

pub mod css;
pub mod json;
pub mod kind;
pub mod link;
pub mod pattern;
pub mod string;
pub mod trace;
pub mod var;

use serde_json::Value;

use crate::combinators::{Each, List, Map, Or, Pipe};
use crate::registry::Registry;

/// Register the combinators and leaves shipped with the crate.
pub fn register_builtins(registry: &Registry) {
    registry.register("pipe", Pipe::from_args);
    registry.register("each", Each::from_args);
    registry.register("map", Map::from_args);
    registry.register("or", Or::from_args);
    registry.register("list", List::from_args);
    registry.register("kind", kind::Convert::from_args);

    registry.register("str.has", string::Has::from_args);
    registry.register("str.join", string::Join::from_args);
    registry.register("str.split", string::Split::from_args);
    registry.register("str.trim", string::Trim::from_args);
    registry.register("str.replace", string::Replace::from_args);
    registry.register("str.prefix", string::Prefix::from_args);

    registry.register("css", css::Css::all);
    registry.register("css.text", css::Css::text);
    registry.register("css.attr", css::Css::attr);
    registry.register("css.first", css::Css::first);

    registry.register("json", json::Path::from_args);
    registry.register("json.parse", json::Parse::from_args);
    registry.register("json.string", json::Stringify::from_args);

    registry.register("regex", pattern::Find::all);
    registry.register("regex.first", pattern::Find::first);
    registry.register("regex.replace", pattern::Replace::from_args);

    registry.register("url.resolve", link::Resolve::from_args);

    registry.register("var.set", var::Set::from_args);
    registry.register("var.get", var::Get::from_args);

    registry.register("debug", trace::Trace::from_args);
}

/// Plain text of a value: strings as-is, null as nothing, anything else as
/// its JSON text.
pub(crate) fn text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Apply `f` to a string, or to every string inside an array. Other values
/// are returned unchanged.
pub(crate) fn map_strings(value: &Value, f: &dyn Fn(&str) -> Value) -> Value {
    match value {
        Value::String(s) => f(s),
        Value::Array(items) => Value::Array(items.iter().map(|v| map_strings(v, f)).collect()),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_text() {
        assert_eq!(text(&json!("a")), Some("a".to_string()));
        assert_eq!(text(&json!(1.5)), Some("1.5".to_string()));
        assert_eq!(text(&Value::Null), None);
    }

    #[test]
    fn test_map_strings_nested() {
        let out = map_strings(&json!([" a", ["b "], 3]), &|s: &str| json!(s.trim()));
        assert_eq!(out, json!(["a", ["b"], 3]));
    }
}
