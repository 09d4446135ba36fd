use super::auth::AuthHandler;
use super::core::RequestHandler;
use crate::error::ResolutionError;
use std::fmt;
use std::sync::Arc;

/// Creates a fresh request handler for each call.
pub type RequestFactory = Arc<dyn Fn() -> Box<dyn RequestHandler> + Send + Sync>;

/// Creates a fresh authentication handler for each call.
pub type AuthFactory = Arc<dyn Fn() -> Box<dyn AuthHandler> + Send + Sync>;

/// A loaded handler definition.
///
/// Holds at most one request-handler factory and one auth-handler factory. The
/// resolver stamps each load with a generation number so a reload can be told
/// apart from a cache hit.
#[derive(Clone)]
pub struct HandlerModule {
    name: String,
    generation: u64,
    request: Option<RequestFactory>,
    auth: Option<AuthFactory>,
}

impl HandlerModule {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            generation: 0,
            request: None,
            auth: None,
        }
    }

    #[must_use]
    pub fn with_request_handler<H, F>(mut self, factory: F) -> Self
    where
        H: RequestHandler + 'static,
        F: Fn() -> H + Send + Sync + 'static,
    {
        self.request = Some(Arc::new(move || Box::new(factory()) as Box<dyn RequestHandler>));
        self
    }

    #[must_use]
    pub fn with_auth_handler<H, F>(mut self, factory: F) -> Self
    where
        H: AuthHandler + 'static,
        F: Fn() -> H + Send + Sync + 'static,
    {
        self.auth = Some(Arc::new(move || Box::new(factory()) as Box<dyn AuthHandler>));
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Load generation assigned by the resolver (0 until first cached).
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn set_generation(&mut self, generation: u64) {
        self.generation = generation;
    }

    #[must_use]
    pub fn has_request_handler(&self) -> bool {
        self.request.is_some()
    }

    #[must_use]
    pub fn has_auth_handler(&self) -> bool {
        self.auth.is_some()
    }

    /// New request handler instance.
    pub fn instantiate_request(&self) -> Result<Box<dyn RequestHandler>, ResolutionError> {
        self.request.as_ref().map(|factory| factory()).ok_or_else(|| {
            ResolutionError::malformed(format!(
                "definition '{}' provides no request handler",
                self.name
            ))
        })
    }

    /// New authentication handler instance.
    pub fn instantiate_auth(&self) -> Result<Box<dyn AuthHandler>, ResolutionError> {
        self.auth.as_ref().map(|factory| factory()).ok_or_else(|| {
            ResolutionError::malformed(format!(
                "definition '{}' provides no authentication handler",
                self.name
            ))
        })
    }
}

impl fmt::Debug for HandlerModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerModule")
            .field("name", &self.name)
            .field("generation", &self.generation)
            .field("request", &self.request.is_some())
            .field("auth", &self.auth.is_some())
            .finish()
    }
}
