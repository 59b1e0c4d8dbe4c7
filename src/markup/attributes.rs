use super::StartTag;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

/// Whitespace as defined for HTML token-list attributes.
fn is_html_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r' | '\x0C')
}

/// Whether a whitespace-separated token list contains `token` exactly.
pub fn contains_token(list: &str, token: &str) -> bool {
    !token.is_empty()
        && list
            .split(is_html_whitespace)
            .filter(|entry| !entry.is_empty())
            .any(|entry| entry == token)
}

impl StartTag {
    /// Raw value of the first attribute called `name`.
    pub fn attribute_value(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attr| attr.name == name)
            .map(|attr| attr.value.as_str())
    }

    /// Treats the attribute as a token list (like `class`) and checks for an
    /// exact entry. A missing attribute never matches.
    pub fn has_attribute_token(&self, name: &str, token: &str) -> bool {
        self.attribute_value(name)
            .map(|value| contains_token(value, token))
            .unwrap_or(false)
    }
}
