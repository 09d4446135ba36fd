use super::DefinitionLoader;
use crate::error::{HandlerResult, ResolutionError};
use crate::handler::{Body, HandlerModule, HandlerUnit, RequestHandler};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Serves files under a directory as handler definitions.
///
/// The name `about` with extension `html` maps to `<root>/about.html`, whose
/// contents become the response body. Edits show up on the next reload.
#[derive(Debug, Clone)]
pub struct TemplateLoader {
    root: PathBuf,
    extension: String,
}

impl TemplateLoader {
    pub fn new(root: impl Into<PathBuf>, extension: &str) -> Self {
        Self {
            root: root.into(),
            extension: extension.trim_start_matches('.').to_string(),
        }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File backing `name`.
    pub fn path_for(&self, name: &str) -> Result<PathBuf, ResolutionError> {
        let valid = !name.is_empty()
            && name != "."
            && name != ".."
            && !name.contains(['/', '\\', '\0']);
        if !valid {
            return Err(ResolutionError::malformed(format!(
                "'{name}' is not a valid template name"
            )));
        }
        Ok(self.root.join(format!("{name}.{}", self.extension)))
    }

    fn content_type(&self) -> &'static str {
        match self.extension.as_str() {
            "txt" => "text/plain",
            "json" => "application/json",
            "xml" => "application/xml",
            _ => "text/html",
        }
    }
}

impl DefinitionLoader for TemplateLoader {
    fn load(&self, name: &str) -> Result<HandlerModule, ResolutionError> {
        let path = self.path_for(name)?;
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(ResolutionError::NotFound {
                    key: name.to_string(),
                })
            }
            Err(err) => {
                return Err(ResolutionError::LoadError {
                    key: name.to_string(),
                    source: anyhow::Error::new(err)
                        .context(format!("reading {}", path.display())),
                })
            }
        };
        debug!(name = %name, path = %path.display(), bytes = text.len(), "Template loaded");

        let page = StaticPage {
            body: Arc::from(text),
            content_type: self.content_type(),
        };
        Ok(HandlerModule::new(name).with_request_handler(move || page.clone()))
    }
}

#[derive(Debug, Clone)]
struct StaticPage {
    body: Arc<str>,
    content_type: &'static str,
}

impl RequestHandler for StaticPage {
    fn content(&mut self, unit: &mut HandlerUnit<'_>) -> HandlerResult<Body> {
        unit.set_content_type(self.content_type);
        Ok(Body::from(&*self.body))
    }
}
