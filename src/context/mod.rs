//! # Context Module
//!
//! The narrow contract through which the dispatch layer talks to the host server
//! for one request.
//!
//! ## Overview
//!
//! The host owns connections, parsing and the response wire format. For each call
//! it hands the dispatcher a [`RequestContext`]: read access to a handful of
//! parameter blocks, and a few write operations on the response (headers, protocol
//! status, response start, body bytes). The dispatcher never keeps the context
//! past the call that received it.
//!
//! ## Blocks
//!
//! | [`Block`]              | Typical keys                          |
//! |------------------------|---------------------------------------|
//! | `Params`               | directive parameters (`userdb`, `user`, `pw`) |
//! | `Request`              | `uri`, `method`, `query`, `protocol`  |
//! | `Headers`              | request headers, lowercase names      |
//! | `ServerHeaders`        | response headers set so far           |
//! | `Vars`                 | server-side request variables         |
//! | `Client`               | `ip`, `dns`                           |
//!
//! ## In-process host
//!
//! [`MemoryContext`] implements the contract entirely in memory. It is what the
//! test suite and benches dispatch against, and it can simulate a host that
//! rejects the response start or fails writes.

mod core;
mod form;
mod memory;
mod pblock;

pub use self::core::{Block, RequestContext};
pub use form::form_data;
pub use memory::MemoryContext;
pub use pblock::{ParamBlock, ParamVec, MAX_INLINE_PARAMS};
