//! The maud-backed template registry.
//!
//! Templates are plain functions from context to markup, registered under
//! their full `"{mode}/{page}"` name. Lookup is exact; the dispatcher never
//! retries under another mode's prefix.

use std::collections::HashMap;

use maud::Markup;

use super::context::PageContext;
use super::{RenderError, TemplateEngine};

type TemplateFn = Box<dyn Fn(&PageContext) -> Result<Markup, RenderError> + Send + Sync>;

/// Maps full template names to render functions.
#[derive(Default)]
pub struct TemplateRegistry {
    templates: HashMap<String, TemplateFn>,
}

impl TemplateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the registry with every page of every mode registered.
    pub fn with_default_pages() -> Self {
        let mut registry = Self::new();
        super::templates::register_all(&mut registry);
        registry
    }

    pub fn insert<F>(&mut self, name: &str, template: F)
    where
        F: Fn(&PageContext) -> Result<Markup, RenderError> + Send + Sync + 'static,
    {
        self.templates.insert(name.to_string(), Box::new(template));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

impl TemplateEngine for TemplateRegistry {
    fn render(&self, name: &str, ctx: &PageContext) -> Result<String, RenderError> {
        let template = self
            .templates
            .get(name)
            .ok_or_else(|| RenderError::TemplateNotFound { name: name.to_string() })?;
        Ok(template(ctx)?.into_string())
    }
}
