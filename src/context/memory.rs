use super::core::{Block, RequestContext};
use super::pblock::ParamBlock;
use crate::error::HostError;
use crate::outcome::ProtocolStatus;

/// A complete in-memory host for one request.
///
/// Records everything the dispatch layer asks of the host so callers can inspect
/// the response afterwards.
///
/// ```rust
/// use nsdispatch::context::{Block, MemoryContext, RequestContext};
///
/// let ctx = MemoryContext::for_uri("/app/hello.nse").with_query("name=world");
/// assert_eq!(ctx.findval(Block::Request, "uri"), Some("/app/hello.nse"));
/// assert_eq!(ctx.findval(Block::Request, "method"), Some("GET"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryContext {
    pub params: ParamBlock,
    pub request: ParamBlock,
    pub headers: ParamBlock,
    pub server_headers: ParamBlock,
    pub vars: ParamBlock,
    pub client: ParamBlock,
    request_body: Vec<u8>,
    read_offset: usize,
    status_history: Vec<ProtocolStatus>,
    begin_calls: usize,
    response_started: bool,
    body: Vec<u8>,
    reject_response_start: bool,
    fail_writes: bool,
}

impl MemoryContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A GET request for `uri`.
    #[must_use]
    pub fn for_uri(uri: &str) -> Self {
        let mut ctx = Self::new();
        ctx.request.nvinsert("uri", uri);
        ctx.request.nvinsert("method", "GET");
        ctx.request.nvinsert("protocol", "HTTP/1.0");
        ctx
    }

    /// An authentication call naming the `userdb` module and carrying credentials.
    #[must_use]
    pub fn for_auth(userdb: &str, user: &str, password: &str) -> Self {
        Self::new()
            .with_param("userdb", userdb)
            .with_param("user", user)
            .with_param("pw", password)
    }

    #[must_use]
    pub fn with_param(mut self, name: &str, value: &str) -> Self {
        self.params.nvinsert(name, value);
        self
    }

    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.nvinsert(name, value);
        self
    }

    #[must_use]
    pub fn with_method(mut self, method: &str) -> Self {
        self.request.remove("method");
        self.request.nvinsert("method", method);
        self
    }

    #[must_use]
    pub fn with_query(mut self, query: &str) -> Self {
        self.request.remove("query");
        self.request.nvinsert("query", query);
        self
    }

    /// Attach a request body and the matching `content-length` header.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.request_body = body.into();
        self.read_offset = 0;
        self.headers.remove("content-length");
        self.headers
            .nvinsert("content-length", self.request_body.len().to_string());
        self
    }

    /// Make [`RequestContext::begin_response`] report [`HostError::Rejected`].
    #[must_use]
    pub fn rejecting_response_start(mut self) -> Self {
        self.reject_response_start = true;
        self
    }

    /// Make every body write fail.
    #[must_use]
    pub fn failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    /// Last protocol status set, if any.
    #[must_use]
    pub fn status(&self) -> Option<ProtocolStatus> {
        self.status_history.last().copied()
    }

    /// Every protocol status set, in order.
    #[must_use]
    pub fn status_history(&self) -> &[ProtocolStatus] {
        &self.status_history
    }

    /// First response header named `name`.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.server_headers.findval(name)
    }

    #[must_use]
    pub fn response_started(&self) -> bool {
        self.response_started
    }

    /// How many times the response start was attempted.
    #[must_use]
    pub fn begin_calls(&self) -> usize {
        self.begin_calls
    }

    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Response body decoded lossily as UTF-8.
    #[must_use]
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    fn block(&self, block: Block) -> &ParamBlock {
        match block {
            Block::Params => &self.params,
            Block::Request => &self.request,
            Block::Headers => &self.headers,
            Block::ServerHeaders => &self.server_headers,
            Block::Vars => &self.vars,
            Block::Client => &self.client,
        }
    }
}

impl RequestContext for MemoryContext {
    fn findval(&self, block: Block, key: &str) -> Option<&str> {
        self.block(block).findval(key)
    }

    fn set_header(&mut self, key: &str, value: &str) {
        self.server_headers.nvinsert(key, value);
    }

    fn remove_header(&mut self, key: &str) {
        self.server_headers.remove(key);
    }

    fn set_protocol_status(&mut self, status: ProtocolStatus) {
        self.status_history.push(status);
    }

    fn begin_response(&mut self) -> Result<(), HostError> {
        self.begin_calls += 1;
        if self.reject_response_start {
            return Err(HostError::Rejected);
        }
        self.response_started = true;
        Ok(())
    }

    fn write_body(&mut self, bytes: &[u8]) -> Result<(), HostError> {
        if self.fail_writes {
            return Err(HostError::Io("connection reset by peer".to_string()));
        }
        self.body.extend_from_slice(bytes);
        Ok(())
    }

    fn read_body(&mut self, max_len: usize) -> Result<Vec<u8>, HostError> {
        let remaining = &self.request_body[self.read_offset..];
        let take = remaining.len().min(max_len);
        let chunk = remaining[..take].to_vec();
        self.read_offset += take;
        Ok(chunk)
    }
}
