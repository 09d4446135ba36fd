//! # Dispatcher Module
//!
//! Runs one host call from start to finish: resolve the handler definition,
//! instantiate it, drive its lifecycle, and translate whatever happened into an
//! [`Outcome`](crate::outcome::Outcome).
//!
//! ## Request flow
//!
//! 1. Take the global critical section (critical-only mode)
//! 2. Read the `uri`, derive the key and the debug flag
//! 3. Resolve the definition (always fresh in debug mode)
//! 4. Instantiate a request handler bound to a new [`HandlerUnit`](crate::handler::HandlerUnit)
//! 5. Run `content` → `header` → `status` → `send`
//! 6. Translate the result, release the critical section
//!
//! ## Outcome translation
//!
//! Highest priority first:
//!
//! | Raised                           | Result                                          |
//! |----------------------------------|-------------------------------------------------|
//! | `ExplicitAbort { code, status }` | status applied if present, `code` returned      |
//! | host rejected response start     | `PROCEED`                                       |
//! | any other failure, debug         | diagnostic HTML page sent with `OK`, `PROCEED`  |
//! | any other failure, production    | `ABORTED`, nothing sent                         |
//! | nothing                          | `PROCEED`                                       |
//!
//! Resolution failures outside debug mode arrive here already turned into
//! `ExplicitAbort { ABORTED, FORBIDDEN }`.
//!
//! ## Authentication flow
//!
//! Same shape, keyed by the `userdb` parameter, with a single `handle` call. Any
//! failure is `ABORTED`, in debug mode too: credentials are in flight, so nothing
//! is ever rendered to the client. Failures are logged.
//!
//! ## Panics
//!
//! A panicking phase is caught and treated like any other failure of that phase.

mod core;
mod report;

pub use self::core::Dispatcher;
pub use report::{diagnostic_page, escape_html};
