//! # Handler Module
//!
//! Per-request handler units and the definitions that create them.
//!
//! ## Overview
//!
//! A [`HandlerModule`] is a named definition, resolved by key from the request. It
//! can create two kinds of handler:
//!
//! - a [`RequestHandler`], driven by the dispatcher through four phases
//!   (`content` → `header` → `status` → `send`)
//! - an [`AuthHandler`], asked for a single [`AuthVerdict`]
//!
//! Every phase receives the [`HandlerUnit`] for the request: the host context plus
//! the mutable response settings (`content_type`, default `text/html`, and the
//! redirect target, default empty).
//!
//! ## Writing a handler
//!
//! Only `content` normally needs overriding:
//!
//! ```rust
//! use nsdispatch::handler::{Body, HandlerModule, HandlerUnit, RequestHandler};
//! use nsdispatch::error::HandlerResult;
//!
//! struct Hello;
//!
//! impl RequestHandler for Hello {
//!     fn content(&mut self, _unit: &mut HandlerUnit<'_>) -> HandlerResult<Body> {
//!         Ok("<HTML><H1>Hello World!</H1></HTML>".into())
//!     }
//! }
//!
//! let module = HandlerModule::new("hello").with_request_handler(|| Hello);
//! assert!(module.has_request_handler());
//! ```
//!
//! Setting a redirect target in `content` makes the provided `header` emit a
//! `Location` header and the provided `status` select `PROTOCOL_REDIRECT`:
//!
//! ```rust
//! # use nsdispatch::handler::{Body, HandlerUnit, RequestHandler};
//! # use nsdispatch::error::HandlerResult;
//! struct Moved;
//!
//! impl RequestHandler for Moved {
//!     fn content(&mut self, unit: &mut HandlerUnit<'_>) -> HandlerResult<Body> {
//!         unit.redirect_to("http://www.example.org/");
//!         Ok("<HTML>Your browser doesn't understand redirects!</HTML>".into())
//!     }
//! }
//! ```
//!
//! ## Aborting
//!
//! Any phase may return [`HandlerError::Abort`](crate::error::HandlerError::Abort)
//! to end the request with a chosen result code and optional protocol status.

mod auth;
mod core;
mod module;

pub use auth::{AuthHandler, AuthVerdict, StaticCredentials};
pub use self::core::{Body, HandlerUnit, RequestHandler, DEFAULT_BODY, DEFAULT_CONTENT_TYPE};
pub use module::{AuthFactory, HandlerModule, RequestFactory};
