//! Installs the global subscriber, so this binary holds a single test.

use nsdispatch::outcome::Outcome;
use nsdispatch::{initialize, DispatchConfig, MemoryContext};
use std::sync::Arc;
use tracing::Level;

mod common;
use common::fixture_registry;

#[test]
fn test_events_and_host_log_reach_destination() {
    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("nsdispatch.log");
    std::fs::write(&log_path, "existing line\n").unwrap();

    let config = DispatchConfig {
        log_destination: Some(log_path.clone()),
        ..DispatchConfig::default()
    };
    let handle = initialize(config, Arc::new(fixture_registry())).unwrap();

    handle.log("host says hello", Level::WARN);
    let mut ctx = MemoryContext::for_uri("/app/hello.nse");
    assert_eq!(handle.handle_request(&mut ctx), Outcome::Proceed);
    let mut ctx = MemoryContext::for_uri("/app/bad.nse");
    assert_eq!(handle.handle_request(&mut ctx), Outcome::Aborted);
    let mut ctx = MemoryContext::for_auth("authfail", "alice", "secret");
    assert_eq!(handle.handle_auth(&mut ctx), Outcome::Aborted);

    // Dropping the handle flushes the non-blocking writer
    drop(handle);

    let text = std::fs::read_to_string(&log_path).unwrap();
    assert!(text.starts_with("existing line\n"), "destination was truncated");
    assert!(text.contains("host says hello"));
    assert!(text.contains("nsdispatch::host"));
    assert!(text.contains("Request dispatch complete"));
    assert!(text.contains("Request aborted"));
    assert!(text.contains("Authentication failed"));
    assert!(text.contains("password store offline"));
    assert!(text.contains("dispatch_id"));
}
