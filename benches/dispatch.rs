use criterion::{criterion_group, criterion_main, Criterion};
use nsdispatch::error::{HandlerError, HandlerResult};
use nsdispatch::handler::{Body, HandlerUnit, RequestHandler, StaticCredentials};
use nsdispatch::loader::ModuleRegistry;
use nsdispatch::outcome::Outcome;
use nsdispatch::resolver::Resolver;
use nsdispatch::{DispatchConfig, Dispatcher, MemoryContext};
use std::hint::black_box;
use std::sync::Arc;

#[derive(Clone)]
struct Hello;

impl RequestHandler for Hello {
    fn content(&mut self, _unit: &mut HandlerUnit<'_>) -> HandlerResult<Body> {
        Ok("<HTML><H1>Hello World!</H1></HTML>".into())
    }
}

#[derive(Clone)]
struct Failing;

impl RequestHandler for Failing {
    fn content(&mut self, _unit: &mut HandlerUnit<'_>) -> HandlerResult<Body> {
        Err(HandlerError::Failed(anyhow::anyhow!("backend unavailable")))
    }
}

fn dispatcher(critical_only: bool) -> Dispatcher {
    let registry = ModuleRegistry::new();
    registry.register_request_handler("hello", || Hello);
    registry.register_request_handler("failing", || Failing);
    let creds = StaticCredentials::new([("alice", "secret")]);
    registry.register_auth_handler("passwd", move || creds.clone());

    let config = DispatchConfig {
        critical_only,
        ..DispatchConfig::default()
    };
    Dispatcher::new(Resolver::new(Arc::new(registry)), Arc::new(config))
}

fn bench_dispatch(c: &mut Criterion) {
    let d = dispatcher(false);
    c.bench_function("dispatch_cached", |b| {
        b.iter(|| {
            let mut ctx = MemoryContext::for_uri("/app/hello.nse");
            let outcome = d.handle_request(&mut ctx);
            black_box((outcome, ctx.body().len()));
        })
    });

    c.bench_function("dispatch_debug_reload", |b| {
        b.iter(|| {
            let mut ctx = MemoryContext::for_uri("/app/hello.nsd");
            black_box(d.handle_request(&mut ctx));
        })
    });

    c.bench_function("dispatch_failure_production", |b| {
        b.iter(|| {
            let mut ctx = MemoryContext::for_uri("/app/failing.nse");
            let outcome = d.handle_request(&mut ctx);
            debug_assert_eq!(outcome, Outcome::Aborted);
            black_box(outcome);
        })
    });

    let critical = dispatcher(true);
    c.bench_function("dispatch_critical_only", |b| {
        b.iter(|| {
            let mut ctx = MemoryContext::for_uri("/app/hello.nse");
            black_box(critical.handle_request(&mut ctx));
        })
    });
}

fn bench_auth(c: &mut Criterion) {
    let d = dispatcher(false);
    c.bench_function("auth_static_credentials", |b| {
        b.iter(|| {
            let mut ctx = MemoryContext::for_auth("passwd", "alice", "secret");
            black_box(d.handle_auth(&mut ctx));
        })
    });
}

criterion_group!(benches, bench_dispatch, bench_auth);
criterion_main!(benches);
