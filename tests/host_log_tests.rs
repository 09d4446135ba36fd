//! The host installs its own subscriber first, so this binary holds a single test.

use nsdispatch::{initialize, DispatchConfig};
use std::sync::Arc;
use tracing::Level;

mod common;
use common::fixture_registry;

#[test]
fn test_host_log_reaches_destination_under_foreign_subscriber() {
    tracing_subscriber::fmt()
        .with_writer(std::io::sink)
        .try_init()
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("host.log");
    let config = DispatchConfig {
        log_destination: Some(log_path.clone()),
        log_level: "warn".to_string(),
        ..DispatchConfig::default()
    };
    let handle = initialize(config, Arc::new(fixture_registry())).unwrap();

    handle.log("host message", Level::ERROR);
    handle.log("host detail", Level::INFO);
    drop(handle);

    let text = std::fs::read_to_string(&log_path).unwrap();
    assert!(text.contains("host message"), "destination contents: {text:?}");
    assert!(text.contains("host detail"), "destination contents: {text:?}");
}
