//! Named operation constructors
//!
//! Names are `namespace` or `namespace.method`. Constructors are registered
//! at process start and looked up by the compiler for every `$name` call.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::error::{RegistryError, Result};
use crate::executor::{Arguments, Executor};

/// Builds an executor from compiled arguments.
pub type NewExecutor = Arc<dyn Fn(Arguments) -> Result<Box<dyn Executor>> + Send + Sync>;

static NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)?$")
        .unwrap_or_else(|e| panic!("operation name pattern: {e}"))
});

static GLOBAL: Lazy<Arc<Registry>> = Lazy::new(|| Arc::new(Registry::with_builtins()));

/// Process-wide registry, created with the built-in operations.
pub fn global() -> &'static Arc<Registry> {
    &GLOBAL
}

/// Register into the global registry. Panics on an invalid name.
pub fn register<F>(name: &str, ctor: F)
where
    F: Fn(Arguments) -> Result<Box<dyn Executor>> + Send + Sync + 'static,
{
    global().register(name, ctor);
}

/// Split a name into `(namespace, method)`; the method is empty for a bare
/// namespace.
pub fn split_name(name: &str) -> Result<(&str, &str), RegistryError> {
    if !NAME.is_match(name) {
        return Err(RegistryError::InvalidName(name.to_string()));
    }
    Ok(name.split_once('.').unwrap_or((name, "")))
}

#[derive(Default)]
pub struct Registry {
    entries: RwLock<BTreeMap<String, BTreeMap<String, NewExecutor>>>,
}

impl Registry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in combinators and leaves.
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        crate::ops::register_builtins(&registry);
        registry
    }

    /// Register `ctor` under `name`, replacing any previous entry.
    ///
    /// # Panics
    ///
    /// Panics when `name` is not a valid operation name. Registration
    /// happens at startup, so a bad name is a programming error.
    pub fn register<F>(&self, name: &str, ctor: F)
    where
        F: Fn(Arguments) -> Result<Box<dyn Executor>> + Send + Sync + 'static,
    {
        if let Err(e) = self.try_register(name, ctor) {
            panic!("{e}");
        }
    }

    pub fn try_register<F>(&self, name: &str, ctor: F) -> Result<(), RegistryError>
    where
        F: Fn(Arguments) -> Result<Box<dyn Executor>> + Send + Sync + 'static,
    {
        let (namespace, method) = split_name(name)?;
        debug!(name, "registering operation");
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(namespace.to_string())
            .or_default()
            .insert(method.to_string(), Arc::new(ctor));
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Option<NewExecutor> {
        let (namespace, method) = name.split_once('.').unwrap_or((name, ""));
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(namespace)?
            .get(method)
            .cloned()
    }

    /// Remove one method, or the whole namespace when given a bare name.
    pub fn remove(&self, name: &str) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        match name.split_once('.') {
            Some((namespace, method)) => {
                if let Some(methods) = entries.get_mut(namespace) {
                    methods.remove(method);
                    if methods.is_empty() {
                        entries.remove(namespace);
                    }
                }
            }
            None => {
                entries.remove(name);
            }
        }
    }

    /// Snapshot of every registered name, sorted.
    pub fn list(&self) -> Vec<String> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries
            .iter()
            .flat_map(|(namespace, methods)| {
                methods.keys().map(move |method| {
                    if method.is_empty() {
                        namespace.clone()
                    } else {
                        format!("{namespace}.{method}")
                    }
                })
            })
            .collect()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("names", &self.list())
            .finish()
    }
}
