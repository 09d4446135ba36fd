use crate::error::HostError;
use crate::outcome::ProtocolStatus;

/// Selects one of the host's name/value blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Block {
    /// Parameters of the server directive that invoked the dispatcher.
    Params,
    /// Request line values: `uri`, `method`, `query`, `protocol`.
    Request,
    /// Request headers.
    Headers,
    /// Response headers.
    ServerHeaders,
    /// Server-side request variables.
    Vars,
    /// Client session data.
    Client,
}

/// Host-provided view of one in-flight request.
///
/// Implementations wrap whatever the native server hands over per call. Response
/// headers are always written to the [`Block::ServerHeaders`] block.
pub trait RequestContext {
    /// Look up `key` in `block`.
    fn findval(&self, block: Block, key: &str) -> Option<&str>;

    /// Append a response header.
    fn set_header(&mut self, key: &str, value: &str);

    /// Remove every response header named `key`.
    fn remove_header(&mut self, key: &str);

    /// Set the protocol status the host will send.
    fn set_protocol_status(&mut self, status: ProtocolStatus);

    /// Start the response (status line and headers go out).
    ///
    /// Returns [`HostError::Rejected`] when the host decided not to send a
    /// response body, e.g. for a conditional request it already answered.
    fn begin_response(&mut self) -> Result<(), HostError>;

    /// Write body bytes to the client.
    fn write_body(&mut self, bytes: &[u8]) -> Result<(), HostError>;

    /// Read up to `max_len` bytes of the request body.
    fn read_body(&mut self, max_len: usize) -> Result<Vec<u8>, HostError>;
}
