use super::DefinitionLoader;
use crate::error::ResolutionError;
use crate::handler::{AuthHandler, HandlerModule, RequestHandler};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Builds one handler definition. Called on every load and reload.
pub type ModuleBuilder = Arc<dyn Fn() -> anyhow::Result<HandlerModule> + Send + Sync>;

/// In-process table of handler definitions keyed by name.
///
/// ```rust
/// use nsdispatch::handler::{Body, HandlerUnit, RequestHandler};
/// use nsdispatch::error::HandlerResult;
/// use nsdispatch::loader::{DefinitionLoader, ModuleRegistry};
///
/// struct Hello;
/// impl RequestHandler for Hello {
///     fn content(&mut self, _unit: &mut HandlerUnit<'_>) -> HandlerResult<Body> {
///         Ok("Hello World!".into())
///     }
/// }
///
/// let registry = ModuleRegistry::new();
/// registry.register_request_handler("hello", || Hello);
/// assert!(registry.load("hello").is_ok());
/// assert!(registry.load("missing").is_err());
/// ```
#[derive(Clone, Default)]
pub struct ModuleRegistry {
    builders: Arc<RwLock<HashMap<String, ModuleBuilder>>>,
}

impl ModuleRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a builder under `name`, replacing any previous one.
    pub fn register<F>(&self, name: &str, builder: F)
    where
        F: Fn() -> anyhow::Result<HandlerModule> + Send + Sync + 'static,
    {
        let mut builders = self.builders.write();
        if builders.insert(name.to_string(), Arc::new(builder)).is_some() {
            warn!(name = %name, "Replaced existing handler definition builder");
        }
        info!(
            name = %name,
            total_definitions = builders.len(),
            "Handler definition registered"
        );
    }

    /// Register a definition that only serves requests.
    pub fn register_request_handler<H, F>(&self, name: &str, factory: F)
    where
        H: RequestHandler + 'static,
        F: Fn() -> H + Send + Sync + Clone + 'static,
    {
        let module_name = name.to_string();
        self.register(name, move || {
            Ok(HandlerModule::new(module_name.clone()).with_request_handler(factory.clone()))
        });
    }

    /// Register a definition that only authenticates.
    pub fn register_auth_handler<H, F>(&self, name: &str, factory: F)
    where
        H: AuthHandler + 'static,
        F: Fn() -> H + Send + Sync + Clone + 'static,
    {
        let module_name = name.to_string();
        self.register(name, move || {
            Ok(HandlerModule::new(module_name.clone()).with_auth_handler(factory.clone()))
        });
    }

    pub fn unregister(&self, name: &str) -> bool {
        self.builders.write().remove(name).is_some()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.builders.read().contains_key(name)
    }

    /// Registered names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.builders.read().keys().cloned().collect();
        names.sort();
        names
    }
}

impl DefinitionLoader for ModuleRegistry {
    fn load(&self, name: &str) -> Result<HandlerModule, ResolutionError> {
        let builder = self
            .builders
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| ResolutionError::NotFound {
                key: name.to_string(),
            })?;

        debug!(name = %name, "Building handler definition");
        builder().map_err(|source| ResolutionError::LoadError {
            key: name.to_string(),
            source,
        })
    }
}
