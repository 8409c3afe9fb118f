//! Declarative extraction rules
//!
//! Rule documents (YAML or JSON) compile into a tree of executors that pull
//! values out of HTML, JSON or plain text and reshape them:
//! - `$name: args` calls a registered operation
//! - sequences and multiple calls run as a pipe
//! - plain mappings build objects
//! - `each`, `or`, `list` and the `str.has` gate give filtering and fallbacks
//!
//! ```no_run
//! use extract_rules::{Context, Engine};
//! use serde_json::json;
//!
//! let engine = Engine::new();
//! let rule = engine
//!     .compile_yaml("title:\n  $css.first: h1\n")
//!     .expect("valid rule");
//! let out = engine.run(&Context::background(), rule.as_ref(), &json!("<h1>Hi</h1>"));
//! assert_eq!(out.ok(), Some(json!({"title": "Hi"})));
//! ```

pub mod combinators;
pub mod compiler;
pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod executor;
pub mod node;
pub mod ops;
pub mod registry;

pub use compiler::Compiler;
pub use config::EngineConfig;
pub use context::{CancelHandle, Context};
pub use engine::{run, Engine};
pub use error::{CompileError, Error, RegistryError, Result};
pub use executor::{Arguments, Executor, Guard, Inspect};
pub use node::{Node, NodeKind};
pub use registry::{NewExecutor, Registry};
pub use serde_json::Value;
