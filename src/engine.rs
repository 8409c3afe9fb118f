//! Compile and run rule documents
//!
//! [`run`] is the recovery boundary for evaluation: a panic inside any
//! operation is logged and turned into a null result, so one bad
//! document/content pair cannot take down a host evaluating many of them.

use std::any::Any;
use std::backtrace::Backtrace;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use serde_json::Value;
use tracing::error;

use crate::compiler::Compiler;
use crate::config::EngineConfig;
use crate::context::Context;
use crate::error::{CompileError, Result};
use crate::executor::Executor;
use crate::node::Node;
use crate::registry::{self, Registry};

/// A registry paired with configuration.
#[derive(Debug, Clone)]
pub struct Engine {
    registry: Arc<Registry>,
    config: EngineConfig,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// Engine over the global registry with default configuration.
    pub fn new() -> Self {
        Self::with_registry(registry::global().clone(), EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self::with_registry(registry::global().clone(), config)
    }

    pub fn with_registry(registry: Arc<Registry>, config: EngineConfig) -> Self {
        Self { registry, config }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn compile(&self, node: &Node) -> Result<Box<dyn Executor>, CompileError> {
        Compiler::with_config(&self.registry, &self.config).compile(node)
    }

    pub fn compile_yaml(&self, source: &str) -> Result<Box<dyn Executor>, CompileError> {
        self.compile(&Node::from_yaml_str(source)?)
    }

    pub fn compile_json(&self, source: &str) -> Result<Box<dyn Executor>, CompileError> {
        self.compile(&Node::from_json_str(source)?)
    }

    /// Evaluate `exec`, recovering from panics unless disabled in the config.
    pub fn run(&self, ctx: &Context, exec: &dyn Executor, value: &Value) -> Result<Value> {
        if self.config.catch_panics {
            run(ctx, exec, value)
        } else {
            exec.exec(ctx, value)
        }
    }
}

/// Evaluate `exec` against `value`. A panic is logged with a backtrace and
/// becomes `Ok(Value::Null)`; returned errors pass through unchanged.
pub fn run(ctx: &Context, exec: &dyn Executor, value: &Value) -> Result<Value> {
    match panic::catch_unwind(AssertUnwindSafe(|| exec.exec(ctx, value))) {
        Ok(result) => result,
        Err(payload) => {
            error!(
                panic = panic_message(payload.as_ref()),
                backtrace = %Backtrace::force_capture(),
                "rule evaluation panicked"
            );
            Ok(Value::Null)
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        *s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use serde_json::json;

    #[derive(Debug)]
    struct Explode;

    impl Executor for Explode {
        fn exec(&self, _ctx: &Context, _value: &Value) -> Result<Value> {
            panic!("malformed content");
        }
    }

    #[test]
    fn test_run_recovers_from_panics() {
        let out = run(&Context::background(), &Explode, &json!("x")).unwrap();
        assert_eq!(out, Value::Null);
    }

    #[test]
    fn test_run_passes_errors_through() {
        let engine = Engine::new();
        let exec = engine.compile_yaml("$kind: int").unwrap();
        let err = engine
            .run(&Context::background(), exec.as_ref(), &json!("abc"))
            .unwrap_err();
        assert!(matches!(err, Error::Convert { .. }));
    }

    #[test]
    #[should_panic(expected = "malformed content")]
    fn test_panics_propagate_when_disabled() {
        let engine = Engine::with_config(EngineConfig {
            catch_panics: false,
            ..EngineConfig::default()
        });
        let _ = engine.run(&Context::background(), &Explode, &Value::Null);
    }

    #[test]
    fn test_custom_registry() {
        let registry = Arc::new(Registry::new());
        registry.register("shout", |_| {
            Ok(Box::new(crate::ops::string::Prefix::new("!")) as Box<dyn Executor>)
        });
        let engine = Engine::with_registry(registry, EngineConfig::default());
        let exec = engine.compile_json(r#"{"$shout": null}"#).unwrap();
        let out = engine
            .run(&Context::background(), exec.as_ref(), &json!("hi"))
            .unwrap();
        assert_eq!(out, json!("!hi"));

        assert!(matches!(
            engine.compile_yaml("$css: a"),
            Err(CompileError::UnknownOperation { .. })
        ));
    }

    #[test]
    fn test_compiled_tree_is_shared_across_threads() {
        let engine = Engine::new();
        let exec: Arc<dyn Executor> = Arc::from(
            engine
                .compile_yaml("$each:\n  $str.has: a\n  $str.prefix: '>'\n")
                .unwrap(),
        );
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let exec = exec.clone();
                std::thread::spawn(move || {
                    let input = json!(["a", "b", format!("a{i}")]);
                    run(&Context::background(), exec.as_ref(), &input).unwrap()
                })
            })
            .collect();
        for (i, handle) in handles.into_iter().enumerate() {
            assert_eq!(handle.join().unwrap(), json!([">a", format!(">a{i}")]));
        }
    }
}
