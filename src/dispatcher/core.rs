use super::report::render_diagnostic;
use crate::config::DispatchConfig;
use crate::context::{Block, RequestContext};
use crate::critical::CriticalSection;
use crate::error::{HandlerError, HandlerResult, LifecyclePhaseError, Phase, ResolutionError};
use crate::handler::{AuthVerdict, HandlerUnit};
use crate::outcome::Outcome;
use crate::resolver::{conceal, debug_requested, derive_key, AuthTarget, Resolver};
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, info_span, warn};
use ulid::Ulid;

/// A failure together with the step it came from.
type Raised = (Phase, HandlerError);

/// Stateless across calls: everything per-request lives on the stack of
/// [`handle_request`](Self::handle_request) / [`handle_auth`](Self::handle_auth).
/// The only shared state is the resolver cache and the optional global
/// critical section.
#[derive(Clone, Debug)]
pub struct Dispatcher {
    resolver: Resolver,
    config: Arc<DispatchConfig>,
    global: Option<CriticalSection>,
}

impl Dispatcher {
    /// A dispatcher over `resolver`. In critical-only mode a fresh global
    /// critical section is created.
    pub fn new(resolver: Resolver, config: Arc<DispatchConfig>) -> Self {
        let global = config.critical_only.then(CriticalSection::new);
        if let Some(crit) = &global {
            info!(token = crit.id(), "Critical-only mode: all dispatch calls serialized");
        }
        Self {
            resolver,
            config,
            global,
        }
    }

    /// Replace the global critical section.
    #[must_use]
    pub fn with_global_section(mut self, global: Option<CriticalSection>) -> Self {
        self.global = global;
        self
    }

    #[must_use]
    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    #[must_use]
    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// The section held around every call, when in critical-only mode.
    #[must_use]
    pub fn global_section(&self) -> Option<&CriticalSection> {
        self.global.as_ref()
    }

    /// Serve one request.
    pub fn handle_request(&self, ctx: &mut dyn RequestContext) -> Outcome {
        let _critical = self.global.as_ref().map(CriticalSection::lock);
        let dispatch_id = Ulid::new();
        let span = info_span!("dispatch", dispatch_id = %dispatch_id, kind = "request");
        let _enter = span.enter();
        let start = Instant::now();

        let uri = ctx
            .findval(Block::Request, &self.config.uri_param)
            .map(str::to_owned);
        let debug_mode = uri
            .as_deref()
            .is_some_and(|u| debug_requested(u, &self.config.request_debug_suffix));

        debug!(uri = ?uri, debug = debug_mode, "Request dispatch start");

        let outcome = match self.run_request(ctx, uri.as_deref(), debug_mode) {
            Ok(()) => Outcome::Proceed,
            Err((phase, raised)) => self.translate(ctx, phase, raised, debug_mode),
        };

        if outcome == Outcome::Aborted {
            warn!(uri = ?uri, "Request aborted (REQ_ABORTED)");
        }
        info!(
            uri = ?uri,
            debug = debug_mode,
            outcome = %outcome,
            latency_us = u64::try_from(start.elapsed().as_micros()).unwrap_or(u64::MAX),
            "Request dispatch complete"
        );
        outcome
    }

    /// Answer one authentication call: `PROCEED`, `NO_ACTION` or `ABORTED`.
    pub fn handle_auth(&self, ctx: &mut dyn RequestContext) -> Outcome {
        let _critical = self.global.as_ref().map(CriticalSection::lock);
        let dispatch_id = Ulid::new();
        let span = info_span!("dispatch", dispatch_id = %dispatch_id, kind = "auth");
        let _enter = span.enter();

        let module_name = ctx
            .findval(Block::Params, &self.config.auth_module_param)
            .map(str::to_owned);

        let outcome = match self.run_auth(ctx, module_name.as_deref()) {
            Ok(verdict) => Outcome::from(verdict),
            Err((_, HandlerError::Abort(abort))) => {
                if let Some(status) = abort.status {
                    ctx.set_protocol_status(status);
                }
                match abort.code {
                    Outcome::Proceed => Outcome::Proceed,
                    Outcome::NoAction => Outcome::NoAction,
                    Outcome::Aborted | Outcome::Exit => Outcome::Aborted,
                }
            }
            Err((phase, raised)) => {
                // Fail closed, but keep the reason server-side.
                error!(
                    module = ?module_name,
                    phase = %phase,
                    error = %raised,
                    "Authentication failed - answering REQ_ABORTED"
                );
                Outcome::Aborted
            }
        };

        if outcome == Outcome::Aborted {
            warn!(module = ?module_name, "Authentication aborted (REQ_ABORTED)");
        }
        info!(module = ?module_name, outcome = %outcome, "Authentication dispatch complete");
        outcome
    }

    fn run_request(
        &self,
        ctx: &mut dyn RequestContext,
        uri: Option<&str>,
        debug_mode: bool,
    ) -> Result<(), Raised> {
        let resolve = |err: ResolutionError, debug_mode: bool| {
            (Phase::Resolve, conceal(err, debug_mode))
        };

        let uri = uri.ok_or_else(|| {
            resolve(ResolutionError::malformed("request carries no uri"), false)
        })?;
        let key = derive_key(uri).map_err(|err| resolve(err, debug_mode))?;
        let module = guarded_load(Phase::Resolve, &key, || {
            self.resolver.resolve(&key, debug_mode)
        })
        .map_err(|err| resolve(err, debug_mode))?;
        let mut handler = guarded_load(Phase::Instantiate, &key, || module.instantiate_request())
            .map_err(|err| (Phase::Instantiate, conceal(err, debug_mode)))?;

        let mut unit = HandlerUnit::new(ctx, &key, debug_mode)
            .with_content_type(&self.config.default_content_type)
            .with_critical_section(self.global.as_ref());

        let body = guarded(Phase::Content, || handler.content(&mut unit))?;
        guarded(Phase::Header, || handler.header(&mut unit))?;
        guarded(Phase::Status, || handler.status(&mut unit))?;
        guarded(Phase::Send, || handler.send(&mut unit, body))?;
        Ok(())
    }

    fn run_auth(
        &self,
        ctx: &mut dyn RequestContext,
        module_name: Option<&str>,
    ) -> Result<AuthVerdict, Raised> {
        let resolve = |err: ResolutionError| (Phase::Resolve, HandlerError::Resolution(err));

        let module_name = module_name.ok_or_else(|| {
            resolve(ResolutionError::malformed(
                "authentication call names no module",
            ))
        })?;
        let target = AuthTarget::from_module_name(module_name, &self.config.auth_debug_suffix)
            .map_err(resolve)?;
        let module = guarded_load(Phase::Resolve, &target.key, || {
            self.resolver.resolve(&target.key, target.debug)
        })
        .map_err(resolve)?;
        let mut handler = guarded_load(Phase::Instantiate, &target.key, || module.instantiate_auth())
            .map_err(|err| (Phase::Instantiate, HandlerError::Resolution(err)))?;

        let mut unit = HandlerUnit::new(ctx, &target.key, target.debug)
            .with_critical_section(self.global.as_ref());
        guarded(Phase::Authenticate, || handler.handle(&mut unit))
    }

    fn translate(
        &self,
        ctx: &mut dyn RequestContext,
        phase: Phase,
        raised: HandlerError,
        debug_mode: bool,
    ) -> Outcome {
        let failure = match raised {
            HandlerError::Abort(abort) => {
                debug!(phase = %phase, abort = %abort, "Explicit abort");
                if let Some(status) = abort.status {
                    ctx.set_protocol_status(status);
                }
                return abort.code;
            }
            HandlerError::Interrupted => {
                debug!(phase = %phase, "Host rejected response start - treating as handled");
                return Outcome::Proceed;
            }
            HandlerError::Resolution(err) => {
                LifecyclePhaseError::new(phase, anyhow::Error::new(err))
            }
            HandlerError::Failed(err) => LifecyclePhaseError::new(phase, err),
        };

        error!(
            phase = %failure.phase,
            error = %failure,
            debug = debug_mode,
            "Handler lifecycle failed"
        );

        let outcome = if debug_mode {
            render_diagnostic(ctx, &failure)
        } else {
            Outcome::Aborted
        };
        // The failure owns the captured backtrace; let it go before returning.
        drop(failure);
        outcome
    }
}

/// Run one phase, turning a panic into an ordinary failure of that phase.
fn guarded<T>(phase: Phase, f: impl FnOnce() -> HandlerResult<T>) -> Result<T, Raised> {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result.map_err(|raised| (phase, raised)),
        Err(payload) => Err((phase, HandlerError::Failed(panicked(phase, payload.as_ref())))),
    }
}

/// Run a loading step (definition build or handler construction); a panic
/// counts as a failed load of `key`.
fn guarded_load<T>(
    phase: Phase,
    key: &str,
    f: impl FnOnce() -> Result<T, ResolutionError>,
) -> Result<T, ResolutionError> {
    catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|payload| {
        Err(ResolutionError::LoadError {
            key: key.to_string(),
            source: panicked(phase, payload.as_ref()),
        })
    })
}

fn panicked(phase: Phase, payload: &(dyn Any + Send)) -> anyhow::Error {
    let message = payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string());
    let backtrace = std::backtrace::Backtrace::capture();
    error!(
        phase = %phase,
        panic_message = %message,
        backtrace = %backtrace,
        "Handler panicked"
    );
    anyhow::anyhow!("handler panicked: {message}")
}
