//! Type coercion
//!
//! `$kind: int` converts its input to the named representation. Parsing is
//! permissive (surrounding whitespace, `"1.9"` as an integer, `"yes"` as a
//! boolean) but never locale dependent. Arrays are converted element-wise.

use std::fmt;
use std::str::FromStr;

use serde_json::{Number, Value};

use crate::context::Context;
use crate::error::{Error, Result};
use crate::executor::{Arguments, Executor};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Bool,
    Int32,
    Int64,
    Float32,
    Float64,
    String,
    Raw,
}

impl Kind {
    pub fn name(self) -> &'static str {
        match self {
            Kind::Bool => "bool",
            Kind::Int32 => "int32",
            Kind::Int64 => "int64",
            Kind::Float32 => "float32",
            Kind::Float64 => "float64",
            Kind::String => "string",
            Kind::Raw => "raw",
        }
    }

    pub fn convert(self, value: &Value) -> Result<Value> {
        if let (Value::Array(items), false) = (value, self == Kind::Raw) {
            return items
                .iter()
                .map(|item| self.convert(item))
                .collect::<Result<Vec<_>>>()
                .map(Value::Array);
        }
        match self {
            Kind::Bool => to_bool(value).map(Value::Bool),
            Kind::Int64 => to_i64(value).map(Value::from),
            Kind::Int32 => {
                let n = to_i64(value)?;
                i32::try_from(n)
                    .map(Value::from)
                    .map_err(|_| self.fail(value))
            }
            Kind::Float64 => to_f64(value).and_then(|f| self.number(f, value)),
            Kind::Float32 => {
                let f = to_f64(value)? as f32;
                self.number(f64::from(f), value)
            }
            Kind::String => Ok(Value::String(match value {
                Value::Null => String::new(),
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })),
            Kind::Raw => Ok(value.clone()),
        }
    }

    fn number(self, f: f64, value: &Value) -> Result<Value> {
        Number::from_f64(f)
            .map(Value::Number)
            .ok_or_else(|| self.fail(value))
    }

    fn fail(self, value: &Value) -> Error {
        Error::Convert {
            kind: self.name(),
            value: value.to_string(),
        }
    }
}

impl FromStr for Kind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bool" | "boolean" => Ok(Kind::Bool),
            "int32" => Ok(Kind::Int32),
            "int" | "int64" => Ok(Kind::Int64),
            "float32" => Ok(Kind::Float32),
            "float" | "float64" => Ok(Kind::Float64),
            "string" | "str" => Ok(Kind::String),
            "raw" | "any" => Ok(Kind::Raw),
            other => Err(Error::invalid(format!("unknown kind `{other}`"))),
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn to_bool(value: &Value) -> Result<bool> {
    let fail = || Kind::Bool.fail(value);
    match value {
        Value::Null => Ok(false),
        Value::Bool(b) => Ok(*b),
        Value::Number(n) => Ok(n.as_f64().map(|f| f != 0.0).unwrap_or(false)),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "" | "0" | "f" | "false" | "no" | "off" => Ok(false),
            "1" | "t" | "true" | "yes" | "on" => Ok(true),
            _ => Err(fail()),
        },
        _ => Err(fail()),
    }
}

fn to_i64(value: &Value) -> Result<i64> {
    let fail = || Kind::Int64.fail(value);
    match value {
        Value::Null => Ok(0),
        Value::Bool(b) => Ok(i64::from(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Ok(i),
            None => n.as_f64().and_then(truncate).ok_or_else(fail),
        },
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return Ok(0);
            }
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(truncate))
                .ok_or_else(fail)
        }
        _ => Err(fail()),
    }
}

fn truncate(f: f64) -> Option<i64> {
    let t = f.trunc();
    (t.is_finite() && t >= i64::MIN as f64 && t < i64::MAX as f64).then_some(t as i64)
}

fn to_f64(value: &Value) -> Result<f64> {
    let fail = || Kind::Float64.fail(value);
    match value {
        Value::Null => Ok(0.0),
        Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        Value::Number(n) => n.as_f64().ok_or_else(fail),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return Ok(0.0);
            }
            s.parse::<f64>().map_err(|_| fail())
        }
        _ => Err(fail()),
    }
}

/// `kind` executor.
#[derive(Debug, Clone)]
pub struct Convert(Kind);

impl Convert {
    pub fn new(kind: Kind) -> Self {
        Self(kind)
    }

    pub fn from_args(args: Arguments) -> Result<Box<dyn Executor>> {
        Ok(Box::new(Self(args.literal(0)?.parse()?)))
    }
}

impl Executor for Convert {
    fn exec(&self, _ctx: &Context, value: &Value) -> Result<Value> {
        self.0.convert(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn convert(kind: Kind, value: Value) -> Result<Value> {
        Convert::new(kind).exec(&Context::background(), &value)
    }

    #[test]
    fn test_parse_kind() {
        assert_eq!("int".parse::<Kind>().unwrap(), Kind::Int64);
        assert_eq!(" Float32 ".parse::<Kind>().unwrap(), Kind::Float32);
        assert!("decimal".parse::<Kind>().is_err());
    }

    #[test]
    fn test_bool() {
        assert_eq!(convert(Kind::Bool, json!(" TRUE ")).unwrap(), json!(true));
        assert_eq!(convert(Kind::Bool, json!("0")).unwrap(), json!(false));
        assert_eq!(convert(Kind::Bool, json!(2)).unwrap(), json!(true));
        assert!(convert(Kind::Bool, json!("maybe")).is_err());
    }

    #[test]
    fn test_integers() {
        assert_eq!(convert(Kind::Int64, json!(" 42 ")).unwrap(), json!(42));
        assert_eq!(convert(Kind::Int64, json!("1.9")).unwrap(), json!(1));
        assert_eq!(convert(Kind::Int64, json!(-2.5)).unwrap(), json!(-2));
        assert_eq!(convert(Kind::Int32, json!("7")).unwrap(), json!(7));
        assert!(convert(Kind::Int32, json!("3000000000")).is_err());
        assert!(convert(Kind::Int64, json!("1,000")).is_err());
    }

    #[test]
    fn test_floats() {
        assert_eq!(convert(Kind::Float64, json!("19.99")).unwrap(), json!(19.99));
        assert_eq!(convert(Kind::Float32, json!("0.5")).unwrap(), json!(0.5));
        assert!(convert(Kind::Float64, json!("abc")).is_err());
        assert!(convert(Kind::Float64, json!({"a": 1})).is_err());
    }

    #[test]
    fn test_string_and_raw() {
        assert_eq!(convert(Kind::String, json!(1.5)).unwrap(), json!("1.5"));
        assert_eq!(convert(Kind::String, Value::Null).unwrap(), json!(""));
        assert_eq!(convert(Kind::Raw, json!([1, "2"])).unwrap(), json!([1, "2"]));
    }

    #[test]
    fn test_arrays_element_wise() {
        assert_eq!(convert(Kind::Int64, json!(["1", 2.0, true])).unwrap(), json!([1, 2, 1]));
        let err = convert(Kind::Int64, json!(["1", "x"])).unwrap_err();
        assert!(matches!(err, Error::Convert { kind: "int64", .. }));
    }
}
