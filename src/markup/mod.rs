//! Markup tokens consumed by the cache extractor.
//!
//! The listing page is never parsed into a tree. The body is tokenized
//! incrementally and the extractor walks the flat token sequence.

mod attributes;
mod tokenizer;

pub use attributes::{contains_token, Attribute};
pub use tokenizer::{ReaderTokens, TokenStream};

/// A start tag together with its attributes in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartTag {
    pub name: String,
    pub attributes: Vec<Attribute>,
    pub self_closing: bool,
}

impl StartTag {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            self_closing: false,
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push(Attribute {
            name: name.into(),
            value: value.into(),
        });
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkupToken {
    StartTag(StartTag),
    EndTag(String),
    Text(String),
    EndOfStream,
    /// The underlying body could not be read to the end.
    Error(String),
}

/// Collapse whitespace runs and trim.
pub fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
