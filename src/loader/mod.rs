//! # Loader Module
//!
//! Turns a handler name into a [`HandlerModule`](crate::handler::HandlerModule).
//!
//! The resolver depends only on the [`DefinitionLoader`] trait; how names map to
//! storage is up to the implementation:
//!
//! - [`ModuleRegistry`] - names registered in code, each with a builder function
//! - [`TemplateLoader`] - names map to files under a directory, served verbatim
//!
//! `load` is called the first time a name is needed; `reload` is called for every
//! debug-mode request and must build the definition from scratch.

mod registry;
mod template;

use crate::error::ResolutionError;
use crate::handler::HandlerModule;

pub use registry::{ModuleBuilder, ModuleRegistry};
pub use template::TemplateLoader;

/// Resolves names to handler definitions.
pub trait DefinitionLoader: Send + Sync {
    /// Build the definition named `name`.
    fn load(&self, name: &str) -> Result<HandlerModule, ResolutionError>;

    /// Build the definition named `name` again, ignoring anything remembered
    /// from an earlier load.
    fn reload(&self, name: &str) -> Result<HandlerModule, ResolutionError> {
        self.load(name)
    }
}
