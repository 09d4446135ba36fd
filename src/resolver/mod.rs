//! # Resolver Module
//!
//! Maps the key derived from a request to a loaded
//! [`HandlerModule`](crate::handler::HandlerModule).
//!
//! ## Keys
//!
//! For requests the key is the final path segment of the `uri` without its
//! extension: `/a/b/script.nse` resolves `script`. A request is in debug mode when
//! the `uri` ends with the configured debug suffix (`d` by default, so
//! `script.nsd` is the debug twin of `script.nse`).
//!
//! For authentication the key is the `userdb` directive parameter. A trailing
//! `DEBUG` marks debug mode and is stripped from the key.
//!
//! ## Load-once and always-fresh
//!
//! Outside debug mode a definition is loaded once per key and cached. In debug
//! mode the cached definition is discarded and rebuilt on every request, so edits
//! show up without a restart.
//!
//! ## Failure policy
//!
//! Outside debug mode a resolution failure never reaches the client as an error
//! page: [`conceal`] turns it into an abort with `PROTOCOL_FORBIDDEN`. In debug
//! mode the original error is passed on so the dispatcher can render it.

mod core;
mod target;

pub use self::core::{conceal, Resolver};
pub use target::{debug_requested, derive_key, AuthTarget, RequestTarget};
