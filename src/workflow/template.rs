use std::collections::BTreeMap;

/// Substitutes `{{key}}` placeholders from `context`. A placeholder with
/// no matching key is an error; silently rendering an empty string would
/// hand the agent a half-formed instruction.
pub fn render_template(
    template: &str,
    context: &BTreeMap<String, String>,
) -> Result<String, String> {
    let mut rendered = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find("{{") {
        rendered.push_str(&rest[..open]);
        let after = &rest[open + 2..];
        let Some(close) = after.find("}}") else {
            return Err("unterminated placeholder".to_string());
        };
        let key = after[..close].trim();
        match context.get(key) {
            Some(value) => rendered.push_str(value),
            None => return Err(format!("missing context key '{key}'")),
        }
        rest = &after[close + 2..];
    }
    rendered.push_str(rest);
    Ok(rendered)
}
