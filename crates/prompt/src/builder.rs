//! Handlebars template rendering.

use docchat_core::{AppError, AppResult};
use handlebars::Handlebars;
use std::collections::HashMap;

/// Render a Handlebars template with variables.
///
/// Strict mode: a variable referenced by the template but missing from
/// `variables` is a configuration error, not an empty substitution.
pub fn render_template(template: &str, variables: &HashMap<String, String>) -> AppResult<String> {
    let mut handlebars = Handlebars::new();

    // Plain text prompts, no HTML escaping
    handlebars.register_escape_fn(handlebars::no_escape);
    handlebars.set_strict_mode(true);

    handlebars
        .register_template_string("prompt", template)
        .map_err(|e| AppError::Config(format!("Failed to register template: {}", e)))?;

    handlebars
        .render("prompt", variables)
        .map_err(|e| AppError::Config(format!("Failed to render template: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_substitutes_variables() {
        let mut vars = HashMap::new();
        vars.insert("question".to_string(), "What is docchat?".to_string());

        let rendered = render_template("Q: {{question}}", &vars).unwrap();
        assert_eq!(rendered, "Q: What is docchat?");
    }

    #[test]
    fn test_render_does_not_escape() {
        let mut vars = HashMap::new();
        vars.insert("context".to_string(), "a < b && c > d".to_string());

        let rendered = render_template("{{context}}", &vars).unwrap();
        assert_eq!(rendered, "a < b && c > d");
    }

    #[test]
    fn test_missing_variable_is_an_error() {
        let vars = HashMap::new();
        let result = render_template("Q: {{question}}", &vars);
        assert!(matches!(result, Err(AppError::Config(_))));
    }
}
