use nsdispatch::critical::CriticalSection;
use nsdispatch::error::HandlerResult;
use nsdispatch::handler::{Body, HandlerUnit, RequestHandler};
use nsdispatch::outcome::Outcome;
use nsdispatch::DispatchConfig;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

mod common;
use common::{dispatcher, dispatcher_with, fixture_registry, request};

#[test]
fn test_exclusion_across_threads() {
    let crit = CriticalSection::new();
    let inside = Arc::new(AtomicUsize::new(0));
    let overlap = Arc::new(AtomicBool::new(false));

    let workers: Vec<_> = (0..4)
        .map(|_| {
            let crit = crit.clone();
            let inside = Arc::clone(&inside);
            let overlap = Arc::clone(&overlap);
            thread::spawn(move || {
                for _ in 0..25 {
                    let _guard = crit.lock();
                    if inside.fetch_add(1, Ordering::SeqCst) != 0 {
                        overlap.store(true, Ordering::SeqCst);
                    }
                    thread::sleep(Duration::from_micros(50));
                    inside.fetch_sub(1, Ordering::SeqCst);
                }
            })
        })
        .collect();

    for w in workers {
        w.join().unwrap();
    }
    assert!(!overlap.load(Ordering::SeqCst));
    assert!(!crit.is_held());
}

#[test]
fn test_try_acquire_fails_while_other_thread_holds() {
    let crit = CriticalSection::new();
    let held = Arc::new(Barrier::new(2));
    let done = Arc::new(Barrier::new(2));

    let holder = {
        let crit = crit.clone();
        let held = Arc::clone(&held);
        let done = Arc::clone(&done);
        thread::spawn(move || {
            let _guard = crit.lock();
            held.wait();
            done.wait();
        })
    };

    held.wait();
    assert!(crit.is_held());
    assert!(!crit.is_held_by_current_thread());
    assert!(!crit.try_acquire());
    assert!(!crit.release());
    done.wait();
    holder.join().unwrap();

    assert!(crit.try_acquire());
    assert!(crit.release());
}

#[test]
fn test_guard_release_early_and_reacquire() {
    let crit = CriticalSection::new();
    let mut guard = crit.lock();

    guard.release_early();
    assert!(!crit.is_held());
    guard.release_early();
    assert!(!guard.is_held());

    guard.reacquire();
    assert!(crit.is_held_by_current_thread());
    drop(guard);
    assert!(!crit.is_held());
}

#[test]
fn test_guard_releases_on_unwind() {
    let crit = CriticalSection::new();
    let inner = crit.clone();
    let result = thread::spawn(move || {
        let _guard = inner.lock();
        panic!("boom");
    })
    .join();

    assert!(result.is_err());
    assert!(!crit.is_held());
}

#[test]
fn test_no_global_section_by_default() {
    let d = dispatcher();
    assert!(d.global_section().is_none());

    let mut ctx = request("/app/probe.nse");
    assert_eq!(d.handle_request(&mut ctx), Outcome::Proceed);
    assert_eq!(ctx.body_text(), "none");
}

#[test]
fn test_critical_only_holds_global_section_during_dispatch() {
    let config = DispatchConfig {
        critical_only: true,
        ..DispatchConfig::default()
    };
    let d = dispatcher_with(fixture_registry(), config);
    let global = d.global_section().cloned().unwrap();

    let mut ctx = request("/app/probe.nse");
    assert_eq!(d.handle_request(&mut ctx), Outcome::Proceed);
    assert_eq!(ctx.body_text(), "held");
    assert!(!global.is_held());
}

#[test]
fn test_critical_only_released_after_failures() {
    let config = DispatchConfig {
        critical_only: true,
        ..DispatchConfig::default()
    };
    let d = dispatcher_with(fixture_registry(), config);
    let global = d.global_section().cloned().unwrap();

    for uri in ["/app/panic.nse", "/app/fail.nsd", "/app/bad.nse"] {
        let mut ctx = request(uri);
        d.handle_request(&mut ctx);
        assert!(!global.is_held(), "{uri}");
    }
    let mut ctx = nsdispatch::MemoryContext::for_auth("authpanic", "a", "b");
    assert_eq!(d.handle_auth(&mut ctx), Outcome::Aborted);
    assert!(!global.is_held());
}

/// Gives the global section back around slow work and takes it again.
struct SlowWork {
    released: Arc<AtomicBool>,
}

impl RequestHandler for SlowWork {
    fn content(&mut self, unit: &mut HandlerUnit<'_>) -> HandlerResult<Body> {
        if let Some(crit) = unit.critical_section() {
            crit.release();
            self.released.store(!crit.is_held(), Ordering::SeqCst);
            crit.acquire();
        }
        Ok("done".into())
    }
}

#[test]
fn test_handler_may_release_and_reacquire_global_section() {
    let released = Arc::new(AtomicBool::new(false));
    let registry = fixture_registry();
    {
        let released = Arc::clone(&released);
        registry.register_request_handler("slow", move || SlowWork {
            released: Arc::clone(&released),
        });
    }
    let config = DispatchConfig {
        critical_only: true,
        ..DispatchConfig::default()
    };
    let d = dispatcher_with(registry, config);

    let mut ctx = request("/app/slow.nse");
    assert_eq!(d.handle_request(&mut ctx), Outcome::Proceed);
    assert!(released.load(Ordering::SeqCst));
    assert!(!d.global_section().unwrap().is_held());
}

#[test]
fn test_critical_only_serializes_concurrent_dispatch() {
    let inside = Arc::new(AtomicUsize::new(0));
    let overlap = Arc::new(AtomicBool::new(false));

    struct Tracked {
        inside: Arc<AtomicUsize>,
        overlap: Arc<AtomicBool>,
    }
    impl RequestHandler for Tracked {
        fn content(&mut self, _unit: &mut HandlerUnit<'_>) -> HandlerResult<Body> {
            if self.inside.fetch_add(1, Ordering::SeqCst) != 0 {
                self.overlap.store(true, Ordering::SeqCst);
            }
            thread::sleep(Duration::from_millis(2));
            self.inside.fetch_sub(1, Ordering::SeqCst);
            Ok("ok".into())
        }
    }

    let registry = fixture_registry();
    {
        let inside = Arc::clone(&inside);
        let overlap = Arc::clone(&overlap);
        registry.register_request_handler("tracked", move || Tracked {
            inside: Arc::clone(&inside),
            overlap: Arc::clone(&overlap),
        });
    }
    let config = DispatchConfig {
        critical_only: true,
        ..DispatchConfig::default()
    };
    let d = dispatcher_with(registry, config);

    let workers: Vec<_> = (0..6)
        .map(|_| {
            let d = d.clone();
            thread::spawn(move || {
                for _ in 0..5 {
                    let mut ctx = request("/app/tracked.nse");
                    assert_eq!(d.handle_request(&mut ctx), Outcome::Proceed);
                }
            })
        })
        .collect();
    for w in workers {
        w.join().unwrap();
    }
    assert!(!overlap.load(Ordering::SeqCst));
}
