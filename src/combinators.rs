//! Combinators driving child executors
//!
//! | name   | behavior                                                   |
//! |--------|------------------------------------------------------------|
//! | `pipe` | threads the value through each step                        |
//! | `each` | applies one executor to every element of an array          |
//! | `map`  | builds an object from key/value executor pairs             |
//! | `or`   | first non-null candidate                                   |
//! | `list` | runs every item on the same input, collecting the outputs |
//!
//! Only `each` (per element) and `list` (through [`Guard`](crate::executor::Guard)) absorb the skip
//! signal. Everything else propagates it like any other error.

use serde_json::{Map as JsonMap, Value};

use crate::context::Context;
use crate::error::{Error, Result};
use crate::executor::{Arguments, Executor, Raw};

/// Runs steps in order, feeding each output to the next step.
///
/// Stops at the first error or the first null output. An empty pipe
/// returns null.
#[derive(Debug)]
pub struct Pipe(Vec<Box<dyn Executor>>);

impl Pipe {
    pub fn new(steps: Vec<Box<dyn Executor>>) -> Self {
        Self(steps)
    }

    pub fn from_args(args: Arguments) -> Result<Box<dyn Executor>> {
        Ok(Box::new(Self(args.into_vec())))
    }
}

impl Executor for Pipe {
    fn exec(&self, ctx: &Context, value: &Value) -> Result<Value> {
        let Some((first, rest)) = self.0.split_first() else {
            return Ok(Value::Null);
        };
        let mut current = first.exec(ctx, value)?;
        for step in rest {
            if current.is_null() {
                break;
            }
            current = step.exec(ctx, &current)?;
        }
        Ok(current)
    }
}

/// Applies the inner executor to each array element, dropping elements
/// that yield. Non-array input is passed to the inner executor once.
#[derive(Debug)]
pub struct Each(Box<dyn Executor>);

impl Each {
    pub fn new(inner: Box<dyn Executor>) -> Self {
        Self(inner)
    }

    pub fn from_args(args: Arguments) -> Result<Box<dyn Executor>> {
        if args.is_empty() {
            return Err(Error::invalid("each needs an executor"));
        }
        Ok(Box::new(Self(args.into_executor())))
    }
}

impl Executor for Each {
    fn exec(&self, ctx: &Context, value: &Value) -> Result<Value> {
        let Value::Array(items) = value else {
            return self.0.exec(ctx, value);
        };
        let mut out = Vec::with_capacity(items.len());
        for item in items {
            match self.0.exec(ctx, item) {
                Ok(v) => out.push(v),
                Err(e) if e.is_yield() => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(Value::Array(out))
    }
}

/// Builds an object from alternating key and value executors.
///
/// A pair whose key fails, or evaluates to null, is left out. A failing
/// value is stored as null. Array input merges every element into one
/// object, later elements overwriting earlier keys.
#[derive(Debug)]
pub struct Map(Vec<(Box<dyn Executor>, Box<dyn Executor>)>);

impl Map {
    pub fn new(args: Arguments) -> Self {
        let mut pairs = Vec::with_capacity(args.len().div_ceil(2));
        let mut iter = args.into_iter();
        while let Some(key) = iter.next() {
            let value = iter
                .next()
                .unwrap_or_else(|| Box::new(Raw(Value::Null)) as Box<dyn Executor>);
            pairs.push((key, value));
        }
        Self(pairs)
    }

    pub fn from_args(args: Arguments) -> Result<Box<dyn Executor>> {
        Ok(Box::new(Self::new(args)))
    }

    fn build_into(&self, ctx: &Context, value: &Value, out: &mut JsonMap<String, Value>) {
        for (key, val) in &self.0 {
            let key = match key.exec(ctx, value) {
                Ok(Value::String(s)) => s,
                Ok(Value::Null) | Err(_) => continue,
                Ok(other) => other.to_string(),
            };
            let val = val.exec(ctx, value).unwrap_or(Value::Null);
            out.insert(key, val);
        }
    }
}

impl Executor for Map {
    fn exec(&self, ctx: &Context, value: &Value) -> Result<Value> {
        let mut out = JsonMap::new();
        match value {
            Value::Array(items) => {
                for item in items {
                    self.build_into(ctx, item, &mut out);
                }
            }
            other => self.build_into(ctx, other, &mut out),
        }
        Ok(Value::Object(out))
    }
}

/// Returns the first candidate output that is not null. Candidate errors
/// are discarded.
#[derive(Debug)]
pub struct Or(Vec<Box<dyn Executor>>);

impl Or {
    pub fn new(candidates: Vec<Box<dyn Executor>>) -> Self {
        Self(candidates)
    }

    pub fn from_args(args: Arguments) -> Result<Box<dyn Executor>> {
        Ok(Box::new(Self(args.into_vec())))
    }
}

impl Executor for Or {
    fn exec(&self, ctx: &Context, value: &Value) -> Result<Value> {
        for candidate in &self.0 {
            if let Ok(v) = candidate.exec(ctx, value) {
                if !v.is_null() {
                    return Ok(v);
                }
            }
        }
        Ok(Value::Null)
    }
}

/// Runs every item against the same input and collects the outputs.
///
/// Items exposing a [`Guard`](crate::executor::Guard) that declines the
/// input are skipped without being run. Any error aborts.
#[derive(Debug)]
pub struct List(Vec<Box<dyn Executor>>);

impl List {
    pub fn new(items: Vec<Box<dyn Executor>>) -> Self {
        Self(items)
    }

    pub fn from_args(args: Arguments) -> Result<Box<dyn Executor>> {
        Ok(Box::new(Self(args.into_vec())))
    }
}

impl Executor for List {
    fn exec(&self, ctx: &Context, value: &Value) -> Result<Value> {
        let mut out = Vec::with_capacity(self.0.len());
        for item in &self.0 {
            if let Some(guard) = item.as_guard() {
                if !guard.should_run(ctx, value) {
                    continue;
                }
            }
            out.push(item.exec(ctx, value)?);
        }
        Ok(Value::Array(out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::Str;
    use crate::ops::string::{Has, Prefix};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Adds one to numbers and numeric strings.
    #[derive(Debug)]
    struct Increment;

    impl Executor for Increment {
        fn exec(&self, _ctx: &Context, value: &Value) -> Result<Value> {
            let n = match value {
                Value::Number(n) => n.as_i64(),
                Value::String(s) => s.parse().ok(),
                _ => None,
            };
            n.map(|n| json!(n + 1))
                .ok_or_else(|| Error::invalid(format!("cannot increment {value}")))
        }
    }

    #[derive(Debug)]
    struct Fail;

    impl Executor for Fail {
        fn exec(&self, _ctx: &Context, _value: &Value) -> Result<Value> {
            Err(Error::invalid("boom"))
        }
    }

    #[derive(Debug)]
    struct Yield;

    impl Executor for Yield {
        fn exec(&self, _ctx: &Context, _value: &Value) -> Result<Value> {
            Err(Error::Yield)
        }
    }

    #[derive(Debug, Default)]
    struct Counter(Arc<AtomicUsize>);

    impl Executor for Counter {
        fn exec(&self, _ctx: &Context, value: &Value) -> Result<Value> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(value.clone())
        }
    }

    fn boxed<E: Executor + 'static>(e: E) -> Box<dyn Executor> {
        Box::new(e)
    }

    fn mixed() -> Value {
        json!(["1", 2, "3", 4, "3"])
    }

    #[test]
    fn test_empty_pipe_returns_null() {
        let ctx = Context::background();
        for input in [json!("x"), json!([1, 2]), Value::Null] {
            assert_eq!(Pipe::new(vec![]).exec(&ctx, &input).unwrap(), Value::Null);
        }
    }

    #[test]
    fn test_pipe_threads_values() {
        let pipe = Pipe::new(vec![boxed(Increment), boxed(Increment)]);
        assert_eq!(pipe.exec(&Context::background(), &json!(1)).unwrap(), json!(3));
    }

    #[test]
    fn test_pipe_stops_on_yield() {
        let calls = Arc::new(AtomicUsize::new(0));
        let pipe = Pipe::new(vec![boxed(Yield), boxed(Counter(calls.clone()))]);
        let err = pipe.exec(&Context::background(), &json!("x")).unwrap_err();
        assert!(err.is_yield());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_pipe_stops_on_null() {
        let calls = Arc::new(AtomicUsize::new(0));
        let pipe = Pipe::new(vec![
            boxed(Raw(Value::Null)),
            boxed(Counter(calls.clone())),
        ]);
        assert_eq!(pipe.exec(&Context::background(), &json!("x")).unwrap(), Value::Null);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_each_filters_with_gate() {
        let each = Each::new(boxed(Has::new("3")));
        let out = each.exec(&Context::background(), &mixed()).unwrap();
        assert_eq!(out, json!(["3", "3"]));
    }

    #[test]
    fn test_each_filters_inside_pipe() {
        let each = Each::new(boxed(Pipe::new(vec![boxed(Has::new("3")), boxed(Increment)])));
        let out = each.exec(&Context::background(), &mixed()).unwrap();
        assert_eq!(out, json!([4, 4]));
    }

    #[test]
    fn test_each_aborts_on_error() {
        let each = Each::new(boxed(Increment));
        let err = each
            .exec(&Context::background(), &json!(["1", "x"]))
            .unwrap_err();
        assert!(!err.is_yield());
    }

    #[test]
    fn test_each_on_scalar() {
        let each = Each::new(boxed(Increment));
        assert_eq!(each.exec(&Context::background(), &json!(1)).unwrap(), json!(2));

        let each = Each::new(boxed(Has::new("3")));
        assert!(each
            .exec(&Context::background(), &json!("1"))
            .unwrap_err()
            .is_yield());
    }

    #[test]
    fn test_map_skips_failing_keys() {
        let map = Map::new(Arguments::new(vec![
            boxed(Pipe::new(vec![boxed(Has::new("3")), boxed(Prefix::new("key"))])),
            boxed(Str::new("value")),
        ]));
        let out = map
            .exec(&Context::background(), &json!(["1", "2", "3"]))
            .unwrap();
        assert_eq!(out, json!({"key3": "value"}));
    }

    #[test]
    fn test_map_stores_null_for_failing_values() {
        let map = Map::new(Arguments::new(vec![
            boxed(Str::new("a")),
            boxed(Fail),
            boxed(Str::new("b")),
            boxed(Yield),
        ]));
        let out = map.exec(&Context::background(), &json!("x")).unwrap();
        assert_eq!(out, json!({"a": null, "b": null}));
    }

    #[test]
    fn test_map_odd_arguments() {
        let map = Map::new(Arguments::new(vec![
            boxed(Str::new("a")),
            boxed(Str::new("1")),
            boxed(Str::new("b")),
        ]));
        let out = map.exec(&Context::background(), &Value::Null).unwrap();
        assert_eq!(out, json!({"a": "1", "b": null}));
    }

    #[test]
    fn test_map_merges_elements() {
        let map = Map::new(Arguments::new(vec![boxed(Str::new("last")), boxed(Increment)]));
        let out = map.exec(&Context::background(), &json!([1, 2, 3])).unwrap();
        assert_eq!(out, json!({"last": 4}));
    }

    #[test]
    fn test_or_first_non_null() {
        let or = Or::new(vec![boxed(Raw(Value::Null)), boxed(Str::new("b"))]);
        assert_eq!(or.exec(&Context::background(), &json!(1)).unwrap(), json!("b"));

        let or = Or::new(vec![boxed(Fail), boxed(Yield), boxed(Str::new("c"))]);
        assert_eq!(or.exec(&Context::background(), &json!(1)).unwrap(), json!("c"));
    }

    #[test]
    fn test_or_all_fail() {
        let or = Or::new(vec![boxed(Fail), boxed(Raw(Value::Null))]);
        assert_eq!(or.exec(&Context::background(), &json!(1)).unwrap(), Value::Null);
    }

    #[test]
    fn test_list_collects_outputs() {
        let list = List::new(vec![boxed(Increment), boxed(Str::new("x"))]);
        let out = list.exec(&Context::background(), &json!(1)).unwrap();
        assert_eq!(out, json!([2, "x"]));
    }

    #[test]
    fn test_list_skips_declined_guards() {
        let list = List::new(vec![boxed(Has::new("a")), boxed(Has::new("z"))]);
        let out = list.exec(&Context::background(), &json!("abc")).unwrap();
        assert_eq!(out, json!(["abc"]));
    }

    #[test]
    fn test_list_aborts_on_error() {
        let list = List::new(vec![boxed(Str::new("x")), boxed(Fail)]);
        assert!(list.exec(&Context::background(), &json!(1)).is_err());

        // Yield from an item without a guard is an ordinary error here.
        let list = List::new(vec![boxed(Yield)]);
        assert!(list
            .exec(&Context::background(), &json!(1))
            .unwrap_err()
            .is_yield());
    }
}
