use crate::context::{form_data, Block, ParamBlock, RequestContext};
use crate::critical::CriticalSection;
use crate::error::HandlerResult;
use crate::outcome::ProtocolStatus;
use std::fmt;

/// Content type used when neither configuration nor the handler picks one.
pub const DEFAULT_CONTENT_TYPE: &str = "text/html";

/// Body produced by the provided [`RequestHandler::content`].
pub const DEFAULT_BODY: &str = "Welcome to nsdispatch!";

/// A response body, written to the client as bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    Text(String),
    Bytes(Vec<u8>),
}

impl Body {
    /// The textual representation of any displayable value.
    pub fn text(value: impl fmt::Display) -> Self {
        Body::Text(value.to_string())
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Body::Text(s) => s.as_bytes(),
            Body::Bytes(b) => b,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.as_bytes().is_empty()
    }
}

impl From<String> for Body {
    fn from(value: String) -> Self {
        Body::Text(value)
    }
}

impl From<&str> for Body {
    fn from(value: &str) -> Self {
        Body::Text(value.to_string())
    }
}

impl From<Vec<u8>> for Body {
    fn from(value: Vec<u8>) -> Self {
        Body::Bytes(value)
    }
}

impl From<serde_json::Value> for Body {
    fn from(value: serde_json::Value) -> Self {
        Body::Text(value.to_string())
    }
}

/// Per-request state shared by every lifecycle phase.
///
/// Created fresh by the dispatcher for each call and dropped when the call
/// returns; nothing in it survives to the next request.
pub struct HandlerUnit<'a> {
    ctx: &'a mut dyn RequestContext,
    key: &'a str,
    debug: bool,
    content_type: String,
    redirect: String,
    critical: Option<&'a CriticalSection>,
}

impl<'a> HandlerUnit<'a> {
    pub fn new(ctx: &'a mut dyn RequestContext, key: &'a str, debug: bool) -> Self {
        Self {
            ctx,
            key,
            debug,
            content_type: DEFAULT_CONTENT_TYPE.to_string(),
            redirect: String::new(),
            critical: None,
        }
    }

    #[must_use]
    pub fn with_content_type(mut self, content_type: &str) -> Self {
        self.content_type = content_type.to_string();
        self
    }

    /// Expose the process-wide critical section held for this call.
    #[must_use]
    pub fn with_critical_section(mut self, critical: Option<&'a CriticalSection>) -> Self {
        self.critical = critical;
        self
    }

    /// Key the handler definition was resolved under.
    #[must_use]
    pub fn key(&self) -> &str {
        self.key
    }

    /// Whether this request runs in debug (always-fresh) mode.
    #[must_use]
    pub fn is_debug(&self) -> bool {
        self.debug
    }

    #[must_use]
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn set_content_type(&mut self, content_type: impl Into<String>) {
        self.content_type = content_type.into();
    }

    /// Redirect target; empty means no redirect.
    #[must_use]
    pub fn redirect_target(&self) -> &str {
        &self.redirect
    }

    pub fn redirect_to(&mut self, target: impl Into<String>) {
        self.redirect = target.into();
    }

    #[must_use]
    pub fn is_redirect(&self) -> bool {
        !self.redirect.is_empty()
    }

    /// The global critical section, when the host runs in critical-only mode.
    ///
    /// The dispatcher holds it for the whole call. A handler about to block for a
    /// long time may release it and must re-acquire it before returning if it
    /// still needs exclusivity.
    #[must_use]
    pub fn critical_section(&self) -> Option<&'a CriticalSection> {
        self.critical
    }

    pub fn context(&self) -> &dyn RequestContext {
        &*self.ctx
    }

    pub fn context_mut(&mut self) -> &mut (dyn RequestContext + 'a) {
        &mut *self.ctx
    }

    #[must_use]
    pub fn findval(&self, block: Block, key: &str) -> Option<&str> {
        self.ctx.findval(block, key)
    }

    /// Directive parameter (`user`, `pw`, ...).
    #[must_use]
    pub fn param(&self, key: &str) -> Option<&str> {
        self.ctx.findval(Block::Params, key)
    }

    /// Request header, lowercase name.
    #[must_use]
    pub fn request_header(&self, name: &str) -> Option<&str> {
        self.ctx.findval(Block::Headers, name)
    }

    pub fn set_header(&mut self, key: &str, value: &str) {
        self.ctx.set_header(key, value);
    }

    pub fn remove_header(&mut self, key: &str) {
        self.ctx.remove_header(key);
    }

    pub fn set_status(&mut self, status: ProtocolStatus) {
        self.ctx.set_protocol_status(status);
    }

    /// Start the response. A host rejection surfaces as
    /// [`HandlerError::Interrupted`](crate::error::HandlerError::Interrupted).
    pub fn begin_response(&mut self) -> HandlerResult<()> {
        self.ctx.begin_response()?;
        Ok(())
    }

    pub fn write(&mut self, bytes: &[u8]) -> HandlerResult<()> {
        self.ctx.write_body(bytes)?;
        Ok(())
    }

    /// Decoded form data from the query string or POST body.
    pub fn form_data(&mut self) -> HandlerResult<ParamBlock> {
        form_data(&mut *self.ctx)
    }

    /// Content type header, plus `Location` when redirecting.
    pub fn write_standard_headers(&mut self) {
        self.ctx.remove_header("content-type");
        self.ctx.set_header("content-type", &self.content_type);
        if !self.redirect.is_empty() {
            self.ctx.set_header("Location", &self.redirect);
        }
    }

    /// `PROTOCOL_REDIRECT` when a redirect target is set, `PROTOCOL_OK` otherwise.
    pub fn write_standard_status(&mut self) {
        let status = if self.redirect.is_empty() {
            ProtocolStatus::Ok
        } else {
            ProtocolStatus::Redirect
        };
        self.ctx.set_protocol_status(status);
    }

    /// Begin the response and write `body`.
    pub fn send_body(&mut self, body: &Body) -> HandlerResult<()> {
        self.begin_response()?;
        self.write(body.as_bytes())
    }
}

impl fmt::Debug for HandlerUnit<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerUnit")
            .field("key", &self.key)
            .field("debug", &self.debug)
            .field("content_type", &self.content_type)
            .field("redirect", &self.redirect)
            .field("critical", &self.critical.map(CriticalSection::id))
            .finish_non_exhaustive()
    }
}

/// Four-phase request handler.
///
/// The dispatcher calls the phases in order: [`content`](Self::content),
/// [`header`](Self::header), [`status`](Self::status), [`send`](Self::send).
/// Every phase has a working default; real handlers override `content`, and
/// override `header` to add auxiliary headers.
pub trait RequestHandler {
    /// Produce the response body. May set the content type or a redirect.
    fn content(&mut self, _unit: &mut HandlerUnit<'_>) -> HandlerResult<Body> {
        Ok(Body::from(DEFAULT_BODY))
    }

    /// Set response headers from the unit's content type and redirect target.
    fn header(&mut self, unit: &mut HandlerUnit<'_>) -> HandlerResult<()> {
        unit.write_standard_headers();
        Ok(())
    }

    /// Select the protocol status.
    fn status(&mut self, unit: &mut HandlerUnit<'_>) -> HandlerResult<()> {
        unit.write_standard_status();
        Ok(())
    }

    /// Start the response and transmit the body.
    fn send(&mut self, unit: &mut HandlerUnit<'_>, body: Body) -> HandlerResult<()> {
        unit.send_body(&body)
    }
}
