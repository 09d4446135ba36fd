#![allow(dead_code)]

//! Fixture handlers and registries shared by the integration tests.

use nsdispatch::context::MemoryContext;
use nsdispatch::error::{HandlerError, HandlerResult};
use nsdispatch::handler::{
    AuthHandler, AuthVerdict, Body, HandlerModule, HandlerUnit, RequestHandler, StaticCredentials,
};
use nsdispatch::loader::ModuleRegistry;
use nsdispatch::outcome::{Outcome, ProtocolStatus};
use nsdispatch::resolver::Resolver;
use nsdispatch::{DispatchConfig, Dispatcher};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub const HELLO_BODY: &str = "Hello World!";
pub const REDIRECT_TARGET: &str = "http://www.example.org/";

#[derive(Clone)]
pub struct Hello;

impl RequestHandler for Hello {
    fn content(&mut self, _unit: &mut HandlerUnit<'_>) -> HandlerResult<Body> {
        Ok(HELLO_BODY.into())
    }
}

#[derive(Clone)]
pub struct Redirect;

impl RequestHandler for Redirect {
    fn content(&mut self, unit: &mut HandlerUnit<'_>) -> HandlerResult<Body> {
        unit.redirect_to(REDIRECT_TARGET);
        Ok("<HTML>Your browser doesn't understand redirects!</HTML>".into())
    }
}

/// Plain-text body plus an auxiliary header.
#[derive(Clone)]
pub struct PlainWithHeader;

impl RequestHandler for PlainWithHeader {
    fn content(&mut self, unit: &mut HandlerUnit<'_>) -> HandlerResult<Body> {
        unit.set_content_type("text/plain");
        Ok(Body::text(format!("key={}", unit.key())))
    }

    fn header(&mut self, unit: &mut HandlerUnit<'_>) -> HandlerResult<()> {
        unit.write_standard_headers();
        unit.set_header("x-handled-by", "nsdispatch");
        Ok(())
    }
}

#[derive(Clone)]
pub struct AbortInContent;

impl RequestHandler for AbortInContent {
    fn content(&mut self, _unit: &mut HandlerUnit<'_>) -> HandlerResult<Body> {
        Err(HandlerError::abort(Outcome::Aborted, ProtocolStatus::Forbidden))
    }
}

/// Starts the response, then aborts without a status.
#[derive(Clone)]
pub struct AbortAfterStart;

impl RequestHandler for AbortAfterStart {
    fn content(&mut self, _unit: &mut HandlerUnit<'_>) -> HandlerResult<Body> {
        Ok("partial".into())
    }

    fn send(&mut self, unit: &mut HandlerUnit<'_>, body: Body) -> HandlerResult<()> {
        unit.send_body(&body)?;
        Err(HandlerError::abort_code(Outcome::Aborted))
    }
}

#[derive(Clone)]
pub struct ExitInStatus;

impl RequestHandler for ExitInStatus {
    fn status(&mut self, _unit: &mut HandlerUnit<'_>) -> HandlerResult<()> {
        Err(HandlerError::abort_code(Outcome::Exit))
    }
}

#[derive(Clone)]
pub struct FailInContent;

impl RequestHandler for FailInContent {
    fn content(&mut self, _unit: &mut HandlerUnit<'_>) -> HandlerResult<Body> {
        Err(anyhow::anyhow!("database <unavailable>").into())
    }
}

#[derive(Clone)]
pub struct FailInHeader;

impl RequestHandler for FailInHeader {
    fn header(&mut self, _unit: &mut HandlerUnit<'_>) -> HandlerResult<()> {
        let parsed: Result<u32, _> = "x".parse::<u32>();
        parsed.map_err(|e| anyhow::Error::new(e).context("reading header template"))?;
        Ok(())
    }
}

#[derive(Clone)]
pub struct PanicInStatus;

impl RequestHandler for PanicInStatus {
    fn status(&mut self, _unit: &mut HandlerUnit<'_>) -> HandlerResult<()> {
        panic!("status table corrupted");
    }
}

/// Echoes the `name` form field.
#[derive(Clone)]
pub struct EchoForm;

impl RequestHandler for EchoForm {
    fn content(&mut self, unit: &mut HandlerUnit<'_>) -> HandlerResult<Body> {
        let form = unit.form_data()?;
        Ok(Body::text(form.findval("name").unwrap_or("anonymous")))
    }
}

/// Records whether the global critical section was visible and held.
#[derive(Clone)]
pub struct CriticalProbe;

impl RequestHandler for CriticalProbe {
    fn content(&mut self, unit: &mut HandlerUnit<'_>) -> HandlerResult<Body> {
        let state = match unit.critical_section() {
            Some(crit) if crit.is_held_by_current_thread() => "held",
            Some(_) => "visible",
            None => "none",
        };
        Ok(state.into())
    }
}

#[derive(Clone)]
pub struct FailingAuth;

impl AuthHandler for FailingAuth {
    fn handle(&mut self, _unit: &mut HandlerUnit<'_>) -> HandlerResult<AuthVerdict> {
        Err(anyhow::anyhow!("password store offline").into())
    }
}

#[derive(Clone)]
pub struct PanickingAuth;

impl AuthHandler for PanickingAuth {
    fn handle(&mut self, _unit: &mut HandlerUnit<'_>) -> HandlerResult<AuthVerdict> {
        panic!("auth backend exploded");
    }
}

#[derive(Clone)]
pub struct AcceptAll;

impl AuthHandler for AcceptAll {}

/// Forces `EXIT` with 401, which authentication must not pass through.
#[derive(Clone)]
pub struct ExitingAuth;

impl AuthHandler for ExitingAuth {
    fn handle(&mut self, _unit: &mut HandlerUnit<'_>) -> HandlerResult<AuthVerdict> {
        Err(HandlerError::abort(Outcome::Exit, ProtocolStatus::Unauthorized))
    }
}

/// Forces `NO_ACTION` without a status.
#[derive(Clone)]
pub struct DeferringAuth;

impl AuthHandler for DeferringAuth {
    fn handle(&mut self, _unit: &mut HandlerUnit<'_>) -> HandlerResult<AuthVerdict> {
        Err(HandlerError::abort_code(Outcome::NoAction))
    }
}

pub fn credentials() -> StaticCredentials {
    StaticCredentials::new([("alice", "secret"), ("bob", "hunter2")])
}

/// Every fixture, registered under a short name.
pub fn fixture_registry() -> ModuleRegistry {
    let registry = ModuleRegistry::new();
    registry.register_request_handler("hello", || Hello);
    registry.register_request_handler("redirect", || Redirect);
    registry.register_request_handler("plain", || PlainWithHeader);
    registry.register_request_handler("forbidden", || AbortInContent);
    registry.register_request_handler("late", || AbortAfterStart);
    registry.register_request_handler("exit", || ExitInStatus);
    registry.register_request_handler("fail", || FailInContent);
    registry.register_request_handler("failheader", || FailInHeader);
    registry.register_request_handler("panic", || PanicInStatus);
    registry.register_request_handler("echo", || EchoForm);
    registry.register_request_handler("probe", || CriticalProbe);
    registry.register("bad", || {
        Err(anyhow::anyhow!("unexpected token at line 3").context("compiling handler bad"))
    });
    registry.register("buildpanic", || -> anyhow::Result<HandlerModule> {
        panic!("definition builder blew up")
    });
    registry.register_request_handler("ctorpanic", || -> Hello {
        panic!("handler constructor blew up")
    });

    let creds = credentials();
    registry.register_auth_handler("passwd", move || creds.clone());
    registry.register_auth_handler("authfail", || FailingAuth);
    registry.register_auth_handler("authpanic", || PanickingAuth);
    registry.register_auth_handler("open", || AcceptAll);
    registry.register_auth_handler("authexit", || ExitingAuth);
    registry.register_auth_handler("authdefer", || DeferringAuth);
    registry.register_auth_handler("authctorpanic", || -> AcceptAll {
        panic!("auth constructor blew up")
    });
    registry
}

/// A registry whose `hello` builder counts its invocations.
pub fn counting_registry() -> (ModuleRegistry, Arc<AtomicUsize>) {
    let loads = Arc::new(AtomicUsize::new(0));
    let registry = ModuleRegistry::new();
    let counter = Arc::clone(&loads);
    registry.register("hello", move || {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(HandlerModule::new("hello").with_request_handler(|| Hello))
    });
    (registry, loads)
}

pub fn dispatcher_with(registry: ModuleRegistry, config: DispatchConfig) -> Dispatcher {
    Dispatcher::new(Resolver::new(Arc::new(registry)), Arc::new(config))
}

pub fn dispatcher() -> Dispatcher {
    dispatcher_with(fixture_registry(), DispatchConfig::default())
}

pub fn request(uri: &str) -> MemoryContext {
    MemoryContext::for_uri(uri)
}

/// Poll `check` until it holds or `attempts` run out.
pub fn wait_for(mut check: impl FnMut() -> bool, attempts: usize) -> bool {
    for _ in 0..attempts {
        if check() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(50));
    }
    check()
}
