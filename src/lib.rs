//! # nsdispatch
//!
//! **nsdispatch** is the request-dispatch layer between a native web server and
//! per-request handler units. The server calls in once per request (and once per
//! authentication check); nsdispatch resolves a handler definition by name, runs it,
//! and hands back a server result code.
//!
//! ## Overview
//!
//! - Handlers are resolved by a key taken from the request path (`/app/hello.nse`
//!   resolves `hello`) and cached after the first load
//! - A path ending in the debug marker (`/app/hello.nsd`) reloads the definition on
//!   every request and turns handler failures into a diagnostic page
//! - Every request runs four phases: `content` → `header` → `status` → `send`
//! - Failures never escape to the server: they become `REQ_ABORTED`, an explicit
//!   handler-chosen result, or (debug) the diagnostic page with `REQ_PROCEED`
//! - Authentication runs a parallel, fail-closed pipeline
//! - Critical sections serialize work that must not run concurrently; in
//!   critical-only mode every dispatch call runs under one global section
//!
//! ## Architecture
//!
//! - **[`outcome`]** - result codes and protocol statuses
//! - **[`error`]** - the error taxonomy handlers and the resolver raise
//! - **[`context`]** - the host contract ([`RequestContext`]) and an in-memory host
//! - **[`handler`]** - handler traits, the per-request [`HandlerUnit`], definitions
//! - **[`loader`]** - where definitions come from
//! - **[`resolver`]** - key derivation and the definition cache
//! - **[`dispatcher`]** - lifecycle driver and outcome translation
//! - **[`critical`]** - re-entrant critical-section tokens
//! - **[`config`]**, **[`logging`]**, **[`hot_reload`]** - ambient setup
//! - **[`handle`]** - [`initialize`] and the host-facing [`DispatchHandle`]
//!
//! ## Quick Start
//!
//! ```rust
//! use nsdispatch::context::MemoryContext;
//! use nsdispatch::error::HandlerResult;
//! use nsdispatch::handler::{Body, HandlerUnit, RequestHandler};
//! use nsdispatch::loader::ModuleRegistry;
//! use nsdispatch::{initialize, DispatchConfig, Outcome, ProtocolStatus};
//! use std::sync::Arc;
//!
//! #[derive(Clone)]
//! struct Hello;
//!
//! impl RequestHandler for Hello {
//!     fn content(&mut self, _unit: &mut HandlerUnit<'_>) -> HandlerResult<Body> {
//!         Ok("<HTML><H1>Hello World!</H1></HTML>".into())
//!     }
//! }
//!
//! let registry = ModuleRegistry::new();
//! registry.register_request_handler("hello", || Hello);
//!
//! let handle = initialize(DispatchConfig::default(), Arc::new(registry))?;
//! let mut ctx = MemoryContext::for_uri("/app/hello.nse");
//!
//! assert_eq!(handle.handle_request(&mut ctx), Outcome::Proceed);
//! assert_eq!(ctx.status(), Some(ProtocolStatus::Ok));
//! assert_eq!(ctx.body_text(), "<HTML><H1>Hello World!</H1></HTML>");
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod config;
pub mod context;
pub mod critical;
pub mod dispatcher;
pub mod error;
pub mod handle;
pub mod handler;
pub mod hot_reload;
pub mod loader;
pub mod logging;
pub mod outcome;
pub mod resolver;

pub use config::DispatchConfig;
pub use context::{Block, MemoryContext, ParamBlock, RequestContext};
pub use critical::{CriticalGuard, CriticalSection};
pub use dispatcher::Dispatcher;
pub use error::{ExplicitAbort, HandlerError, HandlerResult, HostError, ResolutionError};
pub use handle::{initialize, initialize_from_params, DispatchHandle};
pub use handler::{AuthHandler, AuthVerdict, Body, HandlerModule, HandlerUnit, RequestHandler};
pub use outcome::{Outcome, ProtocolStatus};
pub use resolver::Resolver;
