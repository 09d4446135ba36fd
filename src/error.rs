//! # Error Module
//!
//! The error taxonomy of the dispatch layer.
//!
//! - [`ResolutionError`] - a handler definition could not be found or loaded
//! - [`ExplicitAbort`] - a handler forced termination with a chosen result
//! - [`HostError`] - the host refused an operation; [`HostError::Rejected`] is the
//!   "response already rejected" interrupt, which is not a real failure
//! - [`LifecyclePhaseError`] - any other failure, tagged with the phase it came from
//!
//! Handler phases return [`HandlerResult`]. Ordinary application failures are
//! `anyhow::Error` and convert with `?`:
//!
//! ```rust
//! use anyhow::Context;
//! use nsdispatch::error::HandlerResult;
//!
//! fn parse_id(raw: &str) -> HandlerResult<u32> {
//!     Ok(raw.parse::<u32>().context("id must be numeric")?)
//! }
//!
//! assert!(parse_id("42").is_ok());
//! assert!(parse_id("nope").is_err());
//! ```

use crate::outcome::{Outcome, ProtocolStatus};
use std::fmt;

/// Why a handler definition could not be resolved.
#[derive(Debug)]
pub enum ResolutionError {
    /// No definition exists under the key.
    NotFound { key: String },
    /// The request did not carry a usable identifier, or the definition lacks
    /// the handler kind being asked for.
    Malformed { detail: String },
    /// The definition exists but building it failed.
    LoadError { key: String, source: anyhow::Error },
}

impl ResolutionError {
    pub fn malformed(detail: impl Into<String>) -> Self {
        ResolutionError::Malformed {
            detail: detail.into(),
        }
    }
}

impl fmt::Display for ResolutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolutionError::NotFound { key } => {
                write!(f, "no handler definition named '{key}'")
            }
            ResolutionError::Malformed { detail } => {
                write!(f, "malformed handler reference: {detail}")
            }
            ResolutionError::LoadError { key, source } => {
                write!(f, "failed to load handler definition '{key}': {source}")
            }
        }
    }
}

impl std::error::Error for ResolutionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ResolutionError::LoadError { source, .. } => Some(&**source),
            _ => None,
        }
    }
}

/// Handler-initiated forced termination.
///
/// When `status` is `None` only the result code takes effect; use that form once
/// the response has started and no further status can be set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExplicitAbort {
    pub code: Outcome,
    pub status: Option<ProtocolStatus>,
}

impl ExplicitAbort {
    #[must_use]
    pub const fn new(code: Outcome, status: Option<ProtocolStatus>) -> Self {
        Self { code, status }
    }

    /// Abort with a result code and a protocol status.
    #[must_use]
    pub const fn with_status(code: Outcome, status: ProtocolStatus) -> Self {
        Self::new(code, Some(status))
    }

    /// Abort with a result code only.
    #[must_use]
    pub const fn code_only(code: Outcome) -> Self {
        Self::new(code, None)
    }

    /// The production answer to a resolution failure.
    #[must_use]
    pub const fn forbidden() -> Self {
        Self::with_status(Outcome::Aborted, ProtocolStatus::Forbidden)
    }
}

impl fmt::Display for ExplicitAbort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "explicit abort ({}, {})", self.code, status),
            None => write!(f, "explicit abort ({})", self.code),
        }
    }
}

impl std::error::Error for ExplicitAbort {}

/// Failure reported by a host accessor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    /// The host declined to start the response (it already answered the client).
    Rejected,
    /// Writing to or reading from the client failed.
    Io(String),
}

impl fmt::Display for HostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostError::Rejected => write!(f, "host rejected response start"),
            HostError::Io(msg) => write!(f, "host i/o failed: {msg}"),
        }
    }
}

impl std::error::Error for HostError {}

/// Lifecycle step a failure was raised from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Resolve,
    Instantiate,
    Content,
    Header,
    Status,
    Send,
    Authenticate,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Resolve => "resolve",
            Phase::Instantiate => "instantiate",
            Phase::Content => "content",
            Phase::Header => "header",
            Phase::Status => "status",
            Phase::Send => "send",
            Phase::Authenticate => "authenticate",
        };
        f.write_str(name)
    }
}

/// An ordinary failure raised while building a response.
///
/// The cause keeps its own error chain and, when `RUST_BACKTRACE` is enabled,
/// the backtrace captured where it was created.
#[derive(Debug)]
pub struct LifecyclePhaseError {
    pub phase: Phase,
    pub cause: anyhow::Error,
}

impl LifecyclePhaseError {
    #[must_use]
    pub fn new(phase: Phase, cause: anyhow::Error) -> Self {
        Self { phase, cause }
    }

    /// Full diagnostic text: the error chain followed by the backtrace.
    #[must_use]
    pub fn trace(&self) -> String {
        format!("{} phase failed: {:?}", self.phase, self.cause)
    }
}

impl fmt::Display for LifecyclePhaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} phase failed: {:#}", self.phase, self.cause)
    }
}

impl std::error::Error for LifecyclePhaseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&*self.cause)
    }
}

/// What a handler phase can raise.
#[derive(Debug)]
pub enum HandlerError {
    /// Stop now with a caller-chosen result.
    Abort(ExplicitAbort),
    /// The host already rejected the response; treated as success.
    Interrupted,
    /// A definition could not be resolved (debug mode only reaches handlers).
    Resolution(ResolutionError),
    /// Anything else.
    Failed(anyhow::Error),
}

impl HandlerError {
    /// Abort with a result code and a protocol status.
    #[must_use]
    pub fn abort(code: Outcome, status: ProtocolStatus) -> Self {
        HandlerError::Abort(ExplicitAbort::with_status(code, status))
    }

    /// Abort with a result code only.
    #[must_use]
    pub fn abort_code(code: Outcome) -> Self {
        HandlerError::Abort(ExplicitAbort::code_only(code))
    }
}

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandlerError::Abort(abort) => fmt::Display::fmt(abort, f),
            HandlerError::Interrupted => fmt::Display::fmt(&HostError::Rejected, f),
            HandlerError::Resolution(err) => fmt::Display::fmt(err, f),
            HandlerError::Failed(err) => write!(f, "{err:#}"),
        }
    }
}

impl std::error::Error for HandlerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HandlerError::Resolution(err) => Some(err),
            HandlerError::Failed(err) => Some(&**err),
            _ => None,
        }
    }
}

impl From<ExplicitAbort> for HandlerError {
    fn from(abort: ExplicitAbort) -> Self {
        HandlerError::Abort(abort)
    }
}

impl From<ResolutionError> for HandlerError {
    fn from(err: ResolutionError) -> Self {
        HandlerError::Resolution(err)
    }
}

impl From<HostError> for HandlerError {
    fn from(err: HostError) -> Self {
        match err {
            HostError::Rejected => HandlerError::Interrupted,
            io => HandlerError::Failed(anyhow::Error::new(io)),
        }
    }
}

impl From<anyhow::Error> for HandlerError {
    fn from(err: anyhow::Error) -> Self {
        HandlerError::Failed(err)
    }
}

/// Result type of every handler phase.
pub type HandlerResult<T> = Result<T, HandlerError>;
