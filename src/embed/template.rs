//! Template with typed variable injection.

use std::marker::PhantomData;

/// Trait for template variables.
///
/// Placeholders in the embedded source are `__OPTIMIZADOR_*__` tokens.
pub trait TemplateVars {
    /// Apply variables to template content.
    fn apply(&self, content: &str) -> String;
}

/// Template with typed variables.
pub struct Template<V: TemplateVars> {
    content: &'static str,
    _marker: PhantomData<V>,
}

impl<V: TemplateVars> Template<V> {
    /// Create a new template from static content.
    pub const fn new(content: &'static str) -> Self {
        Self {
            content,
            _marker: PhantomData,
        }
    }

    /// Render template with variables.
    pub fn render(&self, vars: &V) -> String {
        vars.apply(self.content)
    }

    /// Get raw template content without variable substitution.
    pub const fn raw(&self) -> &'static str {
        self.content
    }
}

/// No variables to inject.
pub struct NoVars;

impl TemplateVars for NoVars {
    fn apply(&self, content: &str) -> String {
        content.to_string()
    }
}
