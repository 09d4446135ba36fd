use crate::context::RequestContext;
use crate::error::{HostError, LifecyclePhaseError};
use crate::outcome::{Outcome, ProtocolStatus};
use tracing::{debug, warn};

const HEADING: &str = "A handler error happened:";

/// Diagnostic HTML for a failed handler: the error chain and, when captured,
/// the backtrace, escaped inside a `<PRE>` block.
#[must_use]
pub fn diagnostic_page(failure: &LifecyclePhaseError) -> String {
    format!(
        "<HTML><H1>{HEADING}</H1><PRE>{}</PRE></HTML>",
        escape_html(&failure.trace())
    )
}

/// Escape the characters that would otherwise be read as markup.
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Send the diagnostic page as an `OK` response.
///
/// Always answers `PROCEED`: the client gets either the page or whatever the
/// host already sent.
pub(crate) fn render_diagnostic(
    ctx: &mut dyn RequestContext,
    failure: &LifecyclePhaseError,
) -> Outcome {
    ctx.remove_header("content-type");
    ctx.set_header("content-type", "text/html");
    ctx.set_protocol_status(ProtocolStatus::Ok);

    match ctx.begin_response() {
        Ok(()) => {}
        Err(HostError::Rejected) => {
            debug!("Host rejected diagnostic response start");
            return Outcome::Proceed;
        }
        Err(err) => {
            warn!(error = %err, "Could not start diagnostic response");
            return Outcome::Proceed;
        }
    }

    let page = diagnostic_page(failure);
    if let Err(err) = ctx.write_body(page.as_bytes()) {
        warn!(error = %err, "Could not write diagnostic page");
    } else {
        debug!(bytes = page.len(), "Diagnostic page sent");
    }
    Outcome::Proceed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Phase;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html("<b>\"a\" & 'b'</b>"),
            "&lt;b&gt;&quot;a&quot; &amp; 'b'&lt;/b&gt;"
        );
    }

    #[test]
    fn test_page_carries_escaped_chain() {
        let cause = anyhow::anyhow!("inner <cause>").context("outer step");
        let page = diagnostic_page(&LifecyclePhaseError::new(Phase::Content, cause));
        assert!(page.starts_with("<HTML><H1>A handler error happened:</H1><PRE>"));
        assert!(page.ends_with("</PRE></HTML>"));
        assert!(page.contains("content phase failed"));
        assert!(page.contains("outer step"));
        assert!(page.contains("inner &lt;cause&gt;"));
    }
}
