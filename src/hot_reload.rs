//! # Hot Reload Module
//!
//! Production resolution loads each handler definition once. Debug requests
//! reload on every call, but that is opt-in per request. [`watch_handlers`]
//! closes the gap for file-backed definitions: it watches a directory and evicts
//! the cached definition whose key matches a changed file, so the next ordinary
//! request loads the new version.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use nsdispatch::hot_reload::watch_handlers;
//!
//! let handle = nsdispatch::initialize(config, loader)?;
//! let watcher = watch_handlers("templates", handle.resolver().clone())?;
//!
//! // Eviction stops when the watcher is dropped
//! std::mem::forget(watcher);
//! ```
//!
//! ## Key mapping
//!
//! A file maps to the key given by its stem: `templates/hello.html` evicts
//! `hello`. Create, modify and remove events all evict; a failed load after an
//! edit leaves nothing cached, and the request that triggers the load gets the
//! usual resolution failure.

use crate::resolver::Resolver;
use notify::{Config, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Watch `dir` and evict cached definitions whose files change.
pub fn watch_handlers<P>(dir: P, resolver: Resolver) -> notify::Result<RecommendedWatcher>
where
    P: AsRef<Path>,
{
    let path: PathBuf = dir.as_ref().to_path_buf();

    let mut watcher = RecommendedWatcher::new(
        move |res: Result<notify::Event, notify::Error>| match res {
            Ok(event) => {
                if !matches!(
                    event.kind,
                    EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_)
                ) {
                    return;
                }
                for changed in &event.paths {
                    let Some(key) = changed.file_stem().and_then(|s| s.to_str()) else {
                        continue;
                    };
                    if resolver.evict(key) {
                        info!(
                            key = %key,
                            path = %changed.display(),
                            "hot-reload: definition changed on disk, evicted"
                        );
                    } else {
                        debug!(key = %key, "hot-reload: change for uncached definition");
                    }
                }
            }
            Err(e) => warn!(error = %e, "hot-reload: watch error"),
        },
        Config::default(),
    )?;

    watcher.watch(&path, RecursiveMode::NonRecursive)?;
    info!(dir = %path.display(), "hot-reload: watching handler definitions");
    Ok(watcher)
}
