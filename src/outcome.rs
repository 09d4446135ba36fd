//! # Outcome Module
//!
//! Result codes handed back to the host after every dispatch call, and the
//! protocol statuses the dispatcher (or a handler) asks the host to apply.
//!
//! The two sets are independent: an [`Outcome`] says what the server should do
//! next with the request, a [`ProtocolStatus`] says what the client sees.
//!
//! ```rust
//! use nsdispatch::outcome::{Outcome, ProtocolStatus};
//!
//! assert_eq!(Outcome::Proceed.code(), 0);
//! assert_eq!(Outcome::Aborted.as_str(), "REQ_ABORTED");
//! assert_eq!(ProtocolStatus::Redirect.code(), 302);
//! assert_eq!(ProtocolStatus::from_name("PROTOCOL_NOT_FOUND"), ProtocolStatus::NotFound);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Dispatch-level result code returned to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    /// The request was handled; the host continues normally.
    Proceed,
    /// The request failed; the host produces its own error response.
    Aborted,
    /// This layer declined to act (for authentication: ask for credentials again).
    NoAction,
    /// Stop processing the request without further output.
    Exit,
}

impl Outcome {
    /// NSAPI integer code for this outcome.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Outcome::Proceed => 0,
            Outcome::Aborted => -1,
            Outcome::NoAction => -2,
            Outcome::Exit => -3,
        }
    }

    /// Wire name of the outcome (`REQ_PROCEED`, ...).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Outcome::Proceed => "REQ_PROCEED",
            Outcome::Aborted => "REQ_ABORTED",
            Outcome::NoAction => "REQ_NOACTION",
            Outcome::Exit => "REQ_EXIT",
        }
    }

    /// Translate a result name coming back from handler code.
    ///
    /// Unknown names default to [`Outcome::Aborted`], the pessimistic choice the
    /// host makes for anything it does not recognize.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name {
            "REQ_PROCEED" => Outcome::Proceed,
            "REQ_NOACTION" => Outcome::NoAction,
            "REQ_EXIT" => Outcome::Exit,
            _ => Outcome::Aborted,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// HTTP-level status category the core asks the host to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProtocolStatus {
    Ok,
    Redirect,
    NotModified,
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    ServerError,
    NotImplemented,
}

impl ProtocolStatus {
    /// Numeric HTTP status code.
    #[must_use]
    pub const fn code(self) -> u16 {
        match self {
            ProtocolStatus::Ok => 200,
            ProtocolStatus::Redirect => 302,
            ProtocolStatus::NotModified => 304,
            ProtocolStatus::BadRequest => 400,
            ProtocolStatus::Unauthorized => 401,
            ProtocolStatus::Forbidden => 403,
            ProtocolStatus::NotFound => 404,
            ProtocolStatus::ServerError => 500,
            ProtocolStatus::NotImplemented => 501,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            ProtocolStatus::Ok => "PROTOCOL_OK",
            ProtocolStatus::Redirect => "PROTOCOL_REDIRECT",
            ProtocolStatus::NotModified => "PROTOCOL_NOT_MODIFIED",
            ProtocolStatus::BadRequest => "PROTOCOL_BAD_REQUEST",
            ProtocolStatus::Unauthorized => "PROTOCOL_UNAUTHORIZED",
            ProtocolStatus::Forbidden => "PROTOCOL_FORBIDDEN",
            ProtocolStatus::NotFound => "PROTOCOL_NOT_FOUND",
            ProtocolStatus::ServerError => "PROTOCOL_SERVER_ERROR",
            ProtocolStatus::NotImplemented => "PROTOCOL_NOT_IMPLEMENTED",
        }
    }

    /// Translate a `PROTOCOL_*` name. Unrecognized names map to
    /// [`ProtocolStatus::Forbidden`], matching the host's own default.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name {
            "PROTOCOL_OK" => ProtocolStatus::Ok,
            "PROTOCOL_REDIRECT" => ProtocolStatus::Redirect,
            "PROTOCOL_NOT_MODIFIED" => ProtocolStatus::NotModified,
            "PROTOCOL_BAD_REQUEST" => ProtocolStatus::BadRequest,
            "PROTOCOL_UNAUTHORIZED" => ProtocolStatus::Unauthorized,
            "PROTOCOL_NOT_FOUND" => ProtocolStatus::NotFound,
            "PROTOCOL_SERVER_ERROR" => ProtocolStatus::ServerError,
            "PROTOCOL_NOT_IMPLEMENTED" => ProtocolStatus::NotImplemented,
            _ => ProtocolStatus::Forbidden,
        }
    }
}

impl fmt::Display for ProtocolStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProtocolStatus {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_name(s))
    }
}

impl From<ProtocolStatus> for http::StatusCode {
    fn from(status: ProtocolStatus) -> Self {
        match status {
            ProtocolStatus::Ok => http::StatusCode::OK,
            ProtocolStatus::Redirect => http::StatusCode::FOUND,
            ProtocolStatus::NotModified => http::StatusCode::NOT_MODIFIED,
            ProtocolStatus::BadRequest => http::StatusCode::BAD_REQUEST,
            ProtocolStatus::Unauthorized => http::StatusCode::UNAUTHORIZED,
            ProtocolStatus::Forbidden => http::StatusCode::FORBIDDEN,
            ProtocolStatus::NotFound => http::StatusCode::NOT_FOUND,
            ProtocolStatus::ServerError => http::StatusCode::INTERNAL_SERVER_ERROR,
            ProtocolStatus::NotImplemented => http::StatusCode::NOT_IMPLEMENTED,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_names_are_pessimistic() {
        assert_eq!(Outcome::from_name("REQ_SOMETHING"), Outcome::Aborted);
        assert_eq!(
            ProtocolStatus::from_name("PROTOCOL_TEAPOT"),
            ProtocolStatus::Forbidden
        );
    }

    #[test]
    fn test_status_maps_to_http() {
        let code: http::StatusCode = ProtocolStatus::Redirect.into();
        assert_eq!(code.as_u16(), ProtocolStatus::Redirect.code());
        let code: http::StatusCode = ProtocolStatus::NotImplemented.into();
        assert_eq!(code.as_u16(), 501);
    }
}
