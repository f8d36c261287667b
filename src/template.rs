use std::collections::HashMap;

use crate::locale::Locale;

pub struct TemplateEngine;

impl TemplateEngine {
    #[must_use]
    pub fn render(
        template: &str,
        variables: &HashMap<&str, &str>,
    ) -> String {
        let mut result = template.to_string();

        for (key, value) in variables {
            let placeholder = format!("{{{{{key}}}}}");
            result = result.replace(&placeholder, value);
        }

        result
    }

    /// Render a tool's system prompt for the caller's locale.
    #[must_use]
    pub fn render_tool_prompt(
        template: &str,
        locale: Locale,
    ) -> String {
        let mut variables = HashMap::new();
        variables.insert("LOCALE", locale.language_name());

        Self::render(template, &variables)
    }
}
