//! Content translation: turning submitted content into final text.
//!
//! The [`ContentTranslator`] contract is `translate(Content) -> Content`.
//! [`TemplateTranslator`] renders templates with `tera`; plain text passes
//! through untouched.

use std::path::PathBuf;

#[cfg(feature = "templates")]
use tracing::debug;

use crate::message::Content;
#[cfg(feature = "templates")]
use crate::message::{TemplateContent, TemplateSource};

/// Errors from content translation.
#[derive(Debug, thiserror::Error)]
pub enum TranslationError {
    /// Template file could not be read.
    #[error("template '{name}' could not be read from {}: {source}", path.display())]
    TemplateNotFound {
        /// Requested template name.
        name: String,
        /// Resolved file path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Template failed to render.
    #[error("template rendering failed: {0}")]
    Render(String),
}

/// Transforms message content.
pub trait ContentTranslator: Send + Sync {
    /// Translate `content`.
    ///
    /// # Errors
    ///
    /// Returns [`TranslationError`] when the content cannot be produced.
    fn translate(&self, content: Content) -> Result<Content, TranslationError>;
}

/// Template lookup settings for [`TemplateTranslator`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateLocation {
    /// Prepended to template names (typically a directory).
    pub prefix: String,
    /// Appended to template names (typically an extension).
    pub suffix: String,
}

impl TemplateLocation {
    /// Resolve a template name to a file path.
    pub fn resolve(&self, name: &str) -> PathBuf {
        PathBuf::from(format!("{}{}{}", self.prefix, name, self.suffix))
    }
}

/// Renders template content with `tera`.
#[cfg(feature = "templates")]
#[derive(Debug, Clone, Default)]
pub struct TemplateTranslator {
    location: TemplateLocation,
}

#[cfg(feature = "templates")]
impl TemplateTranslator {
    /// Translator resolving template names through `location`.
    pub fn new(location: TemplateLocation) -> Self {
        Self { location }
    }

    fn load(&self, source: &TemplateSource) -> Result<String, TranslationError> {
        match source {
            TemplateSource::Inline(text) => Ok(text.clone()),
            TemplateSource::Path(name) => {
                let path = self.location.resolve(name);
                debug!(template = %name, path = %path.display(), "loading template");
                std::fs::read_to_string(&path).map_err(|source| {
                    TranslationError::TemplateNotFound {
                        name: name.clone(),
                        path,
                        source,
                    }
                })
            }
        }
    }

    fn render(&self, template: &TemplateContent) -> Result<String, TranslationError> {
        let source = self.load(&template.source)?;
        let context = tera::Context::from_serialize(&template.variables)
            .map_err(|e| TranslationError::Render(describe_tera_error(&e)))?;
        tera::Tera::one_off(&source, &context, false)
            .map_err(|e| TranslationError::Render(describe_tera_error(&e)))
    }
}

#[cfg(feature = "templates")]
impl ContentTranslator for TemplateTranslator {
    fn translate(&self, content: Content) -> Result<Content, TranslationError> {
        match content {
            Content::Template(template) => self.render(&template).map(Content::text),
            text @ Content::Text { .. } => Ok(text),
        }
    }
}

/// Tera nests the useful message in the error source chain.
#[cfg(feature = "templates")]
fn describe_tera_error(err: &tera::Error) -> String {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(inner) = source {
        message.push_str(": ");
        message.push_str(&inner.to_string());
        source = inner.source();
    }
    message
}
