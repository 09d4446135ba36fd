use crate::error::ResolutionError;

/// Whether `identifier` carries the debug sentinel.
#[must_use]
pub fn debug_requested(identifier: &str, suffix: &str) -> bool {
    !suffix.is_empty() && identifier.ends_with(suffix)
}

/// The path segment between the final `/` and the final `.` of `uri`.
pub fn derive_key(uri: &str) -> Result<String, ResolutionError> {
    let segment = uri.rsplit('/').next().unwrap_or(uri);
    let Some(dot) = segment.rfind('.') else {
        return Err(ResolutionError::malformed(format!(
            "'{uri}' has no extension to strip"
        )));
    };
    let key = &segment[..dot];
    if key.is_empty() {
        return Err(ResolutionError::malformed(format!(
            "'{uri}' does not name a handler"
        )));
    }
    Ok(key.to_string())
}

/// Key and mode of a request dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTarget {
    pub key: String,
    pub debug: bool,
}

impl RequestTarget {
    pub fn from_uri(uri: &str, debug_suffix: &str) -> Result<Self, ResolutionError> {
        Ok(Self {
            key: derive_key(uri)?,
            debug: debug_requested(uri, debug_suffix),
        })
    }
}

/// Key and mode of an authentication dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthTarget {
    pub key: String,
    pub debug: bool,
}

impl AuthTarget {
    pub fn from_module_name(name: &str, debug_suffix: &str) -> Result<Self, ResolutionError> {
        let debug = debug_requested(name, debug_suffix);
        let key = if debug {
            &name[..name.len() - debug_suffix.len()]
        } else {
            name
        };
        if key.is_empty() {
            return Err(ResolutionError::malformed(format!(
                "'{name}' does not name an authentication module"
            )));
        }
        Ok(Self {
            key: key.to_string(),
            debug,
        })
    }
}
