//! JSON navigation
//!
//! Two path notations are accepted:
//! - arrow notation: `->'items'->0->'id'`
//! - dotted notation: `items[0].id`, `$.items[*].id`
//!
//! `[*]` expands an array: the rest of the path is applied to every element
//! and elements where it misses are dropped. String input is parsed as JSON
//! before navigating.

use serde_json::Value;

use crate::context::Context;
use crate::error::{Error, Result, ResultExt};
use crate::executor::{Arguments, Executor};

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    /// Object key, or array index when it parses as one.
    Field(String),
    Expand,
}

/// `json` executor: navigates a path, returning null when it misses.
#[derive(Debug, Clone)]
pub struct Path {
    source: String,
    segments: Vec<Segment>,
}

impl Path {
    pub fn new(path: &str) -> Result<Self> {
        Ok(Self {
            source: path.to_string(),
            segments: parse_path(path)?,
        })
    }

    pub fn from_args(args: Arguments) -> Result<Box<dyn Executor>> {
        let path = args.optional_literal(0)?.unwrap_or_default();
        Ok(Box::new(Self::new(&path)?))
    }
}

impl Executor for Path {
    fn exec(&self, ctx: &Context, value: &Value) -> Result<Value> {
        ctx.check()?;
        let parsed;
        let root = match value {
            Value::Null => return Ok(Value::Null),
            Value::String(s) => {
                parsed = serde_json::from_str::<Value>(s)
                    .map_err(Error::from)
                    .context(format!("json `{}`", self.source))?;
                &parsed
            }
            other => other,
        };
        Ok(navigate(root, &self.segments).unwrap_or(Value::Null))
    }
}

/// `json.parse`: strings are parsed as JSON, other values pass through.
#[derive(Debug, Clone)]
pub struct Parse;

impl Parse {
    pub fn from_args(_args: Arguments) -> Result<Box<dyn Executor>> {
        Ok(Box::new(Self))
    }
}

impl Executor for Parse {
    fn exec(&self, _ctx: &Context, value: &Value) -> Result<Value> {
        match value {
            Value::String(s) => Ok(serde_json::from_str(s)?),
            other => Ok(other.clone()),
        }
    }
}

/// `json.string`: serializes the input as JSON text.
#[derive(Debug, Clone)]
pub struct Stringify;

impl Stringify {
    pub fn from_args(_args: Arguments) -> Result<Box<dyn Executor>> {
        Ok(Box::new(Self))
    }
}

impl Executor for Stringify {
    fn exec(&self, _ctx: &Context, value: &Value) -> Result<Value> {
        match value {
            Value::Null => Ok(Value::Null),
            other => Ok(Value::String(serde_json::to_string(other)?)),
        }
    }
}

fn navigate(value: &Value, path: &[Segment]) -> Option<Value> {
    let Some((first, rest)) = path.split_first() else {
        return Some(value.clone());
    };
    match first {
        Segment::Expand => {
            let items = value.as_array()?;
            Some(Value::Array(
                items.iter().filter_map(|item| navigate(item, rest)).collect(),
            ))
        }
        Segment::Field(part) => {
            let next = match (value, part.parse::<usize>()) {
                (Value::Array(items), Ok(index)) => items.get(index)?,
                _ => value.get(part.as_str())?,
            };
            navigate(next, rest)
        }
    }
}

fn parse_path(path: &str) -> Result<Vec<Segment>> {
    let path = path.trim();
    if path.starts_with("->") {
        parse_arrows(path)
    } else {
        parse_dotted(path)
    }
}

fn malformed(path: &str) -> Error {
    Error::invalid(format!("malformed json path `{path}`"))
}

/// `->'a'->"b"->[0]->c`, with `->>` accepted as a synonym of `->`.
fn parse_arrows(path: &str) -> Result<Vec<Segment>> {
    let mut segments = Vec::new();
    let mut remaining = path;

    while !remaining.is_empty() {
        let Some(r) = remaining
            .strip_prefix("->>")
            .or(remaining.strip_prefix("->"))
        else {
            return Err(malformed(path));
        };
        remaining = r.trim_start();

        let (key, rest) = if let Some(r) = remaining.strip_prefix('\'') {
            let end = r.find('\'').ok_or_else(|| malformed(path))?;
            (&r[..end], &r[end + 1..])
        } else if let Some(r) = remaining.strip_prefix('"') {
            let end = r.find('"').ok_or_else(|| malformed(path))?;
            (&r[..end], &r[end + 1..])
        } else if let Some(r) = remaining.strip_prefix('[') {
            let end = r.find(']').ok_or_else(|| malformed(path))?;
            (&r[..end], &r[end + 1..])
        } else {
            let end = remaining.find("->").unwrap_or(remaining.len());
            (remaining[..end].trim(), &remaining[end..])
        };

        if key == "*" {
            segments.push(Segment::Expand);
        } else {
            segments.push(Segment::Field(key.to_string()));
        }
        remaining = rest.trim_start();
    }

    Ok(segments)
}

/// `items[0].id`, `$.items[*].id`, `['a.b']`.
fn parse_dotted(path: &str) -> Result<Vec<Segment>> {
    let mut segments = Vec::new();
    let mut rest = path.strip_prefix('$').unwrap_or(path);

    while !rest.is_empty() {
        if let Some(r) = rest.strip_prefix("[*]") {
            segments.push(Segment::Expand);
            rest = r;
        } else if let Some(r) = rest.strip_prefix('[') {
            let end = r.find(']').ok_or_else(|| malformed(path))?;
            let key = r[..end].trim().trim_matches(|c: char| c == '\'' || c == '"');
            segments.push(Segment::Field(key.to_string()));
            rest = &r[end + 1..];
        } else {
            let r = rest.strip_prefix('.').unwrap_or(rest);
            let end = r.find(|c: char| c == '[' || c == '.').unwrap_or(r.len());
            if end == 0 {
                return Err(malformed(path));
            }
            segments.push(Segment::Field(r[..end].to_string()));
            rest = &r[end..];
        }
    }

    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn field(s: &str) -> Segment {
        Segment::Field(s.to_string())
    }

    fn get(path: &str, value: Value) -> Value {
        Path::new(path)
            .unwrap()
            .exec(&Context::background(), &value)
            .unwrap()
    }

    #[test]
    fn test_parse_arrows() {
        assert_eq!(
            parse_path("->'items'->0->>\"id\"").unwrap(),
            vec![field("items"), field("0"), field("id")]
        );
        assert_eq!(
            parse_path("-> items -> [*] -> name").unwrap(),
            vec![field("items"), Segment::Expand, field("name")]
        );
        assert!(parse_path("->'open").is_err());
    }

    #[test]
    fn test_parse_dotted() {
        assert_eq!(
            parse_path("$.items[*].id").unwrap(),
            vec![field("items"), Segment::Expand, field("id")]
        );
        assert_eq!(
            parse_path("meta['a.b'][2]").unwrap(),
            vec![field("meta"), field("a.b"), field("2")]
        );
        assert_eq!(parse_path("").unwrap(), vec![]);
        assert!(parse_path("a..b").is_err());
    }

    #[test]
    fn test_navigate() {
        let data = json!({
            "org_info": {"company_name": "Test Corp"},
            "jobs": [{"id": "1", "title": "Dev"}, {"id": "2"}, {"title": "Designer"}]
        });
        assert_eq!(get("org_info.company_name", data.clone()), json!("Test Corp"));
        assert_eq!(get("jobs[0].title", data.clone()), json!("Dev"));
        assert_eq!(get("jobs[*].title", data.clone()), json!(["Dev", "Designer"]));
        assert_eq!(get("jobs[9].title", data.clone()), Value::Null);
        assert_eq!(get("", data.clone()), data);
    }

    #[test]
    fn test_string_input_is_parsed() {
        let raw = json!(r#"[{"id":"123","title":"Developer"}]"#);
        assert_eq!(get("->0->'title'", raw), json!("Developer"));

        let err = Path::new("a")
            .unwrap()
            .exec(&Context::background(), &json!("not json"))
            .unwrap_err();
        assert!(err.to_string().starts_with("json `a`"));
    }

    #[test]
    fn test_parse_and_stringify() {
        let ctx = Context::background();
        assert_eq!(Parse.exec(&ctx, &json!("[1,2]")).unwrap(), json!([1, 2]));
        assert!(Parse.exec(&ctx, &json!("{")).is_err());
        assert_eq!(Stringify.exec(&ctx, &json!({"a": 1})).unwrap(), json!(r#"{"a":1}"#));
    }
}
