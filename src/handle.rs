//! Host-facing entry point.
//!
//! The host calls [`initialize`] once at startup and keeps the returned
//! [`DispatchHandle`] for the life of the process. Everything the host needs goes
//! through the handle: request and authentication dispatch, critical-section
//! tokens, and the logger. There is no other process-wide state.

use crate::config::DispatchConfig;
use crate::context::{ParamBlock, RequestContext};
use crate::critical::CriticalSection;
use crate::dispatcher::Dispatcher;
use crate::loader::DefinitionLoader;
use crate::logging::{init_logging, HostLogger, LoggingGuard};
use crate::outcome::Outcome;
use crate::resolver::Resolver;
use anyhow::Result;
use std::sync::Arc;
use tracing::{info, Level};

/// Set up logging and build the dispatch layer.
///
/// A log destination that cannot be opened is reported as a warning; the
/// dispatch layer still starts, with the host logger disabled.
pub fn initialize(config: DispatchConfig, loader: Arc<dyn DefinitionLoader>) -> Result<DispatchHandle> {
    let logging = init_logging(&config);
    let config = Arc::new(config);
    let logger = HostLogger::new(&config);
    let dispatcher = Dispatcher::new(Resolver::new(loader), Arc::clone(&config));

    info!(
        critical_only = config.critical_only,
        log_destination = ?config.log_destination,
        "Dispatch layer initialized"
    );

    Ok(DispatchHandle {
        config,
        dispatcher,
        logger,
        _logging: logging,
    })
}

/// [`initialize`] from the host's init parameter block, with `NSD_*`
/// environment overrides applied on top.
pub fn initialize_from_params(
    params: &ParamBlock,
    loader: Arc<dyn DefinitionLoader>,
) -> Result<DispatchHandle> {
    let mut config = DispatchConfig::from_init_params(params);
    config.apply_env();
    initialize(config, loader)
}

/// The dispatch layer as the host sees it.
#[derive(Debug)]
pub struct DispatchHandle {
    config: Arc<DispatchConfig>,
    dispatcher: Dispatcher,
    logger: HostLogger,
    _logging: LoggingGuard,
}

impl DispatchHandle {
    pub fn handle_request(&self, ctx: &mut dyn RequestContext) -> Outcome {
        self.dispatcher.handle_request(ctx)
    }

    pub fn handle_auth(&self, ctx: &mut dyn RequestContext) -> Outcome {
        self.dispatcher.handle_auth(ctx)
    }

    /// A new, independent critical-section token.
    #[must_use]
    pub fn create_token(&self) -> CriticalSection {
        CriticalSection::new()
    }

    /// Block until the calling thread owns `token`.
    pub fn acquire(&self, token: &CriticalSection) {
        token.acquire();
    }

    /// Release one level of ownership of `token`; `false` if the calling thread
    /// did not own it.
    pub fn release(&self, token: &CriticalSection) -> bool {
        token.release()
    }

    /// The token held around every dispatch call in critical-only mode.
    #[must_use]
    pub fn global_token(&self) -> Option<&CriticalSection> {
        self.dispatcher.global_section()
    }

    /// Best-effort append to the configured log destination.
    pub fn log(&self, message: &str, level: Level) {
        self.logger.log(message, level);
    }

    #[must_use]
    pub fn resolver(&self) -> &Resolver {
        self.dispatcher.resolver()
    }

    #[must_use]
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    #[must_use]
    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }
}
