use super::core::{Block, RequestContext};
use super::pblock::ParamBlock;
use crate::error::HandlerResult;
use anyhow::Context;

/// Decode the request's form data, whatever the method.
///
/// POST bodies are read up to their `content-length`; every other method uses the
/// request `query`. Both are decoded as `application/x-www-form-urlencoded`.
pub fn form_data(ctx: &mut dyn RequestContext) -> HandlerResult<ParamBlock> {
    let is_post = ctx
        .findval(Block::Request, "method")
        .is_some_and(|m| m.eq_ignore_ascii_case("POST"));

    if is_post {
        let len = match ctx.findval(Block::Headers, "content-length") {
            Some(raw) => raw
                .trim()
                .parse::<usize>()
                .with_context(|| format!("invalid content-length header '{raw}'"))?,
            None => 0,
        };
        let body = ctx.read_body(len)?;
        Ok(decode(&body))
    } else {
        let query = ctx.findval(Block::Request, "query").unwrap_or_default();
        Ok(decode(query.as_bytes()))
    }
}

fn decode(raw: &[u8]) -> ParamBlock {
    url::form_urlencoded::parse(raw).collect()
}
