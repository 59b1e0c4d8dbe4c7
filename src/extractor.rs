//! Turns the listing page's token stream into cache sightings.
//!
//! Each result is a `tr.Data` row; the permalink and title sit in an anchor
//! inside the row's `td.Merge` cell, with the title text wrapped in a `span`.
//! A struck-through (disabled) cache carries the `Strike` class on that
//! anchor. Scopes are tracked without a stack: each closing tag resets
//! exactly the scope it ends, and anything that does not fit the expected
//! shape just never produces a sighting.

use async_trait::async_trait;

use crate::error::FetchError;
use crate::markup::{clean_text, MarkupToken, StartTag, TokenStream};
use crate::models::{CacheLink, CacheSighting};

const ROW_CLASS: &str = "Data";
const LINK_COLUMN_CLASS: &str = "Merge";
const DISABLED_CLASS: &str = "Strike";
const LABEL_TAG: &str = "span";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Scope {
    Outside,
    Row,
    LinkColumn,
    Link { href: String, disabled: bool },
}

impl Scope {
    fn in_link_column(&self) -> bool {
        matches!(self, Scope::LinkColumn | Scope::Link { .. })
    }
}

/// The extraction state machine. Feed it tokens with [`process`].
///
/// [`process`]: CacheExtractor::process
#[derive(Debug)]
pub struct CacheExtractor {
    scope: Scope,
    // Innermost open start tag; cleared by its own end tag.
    current_tag: Option<String>,
    found_any_row: bool,
    finished: bool,
    error: Option<String>,
}

impl Default for CacheExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheExtractor {
    pub fn new() -> Self {
        Self {
            scope: Scope::Outside,
            current_tag: None,
            found_any_row: false,
            finished: false,
            error: None,
        }
    }

    /// Whether a `tr.Data` row appeared anywhere so far.
    pub fn found_any_row(&self) -> bool {
        self.found_any_row
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Message of the `Error` token that ended the stream, if any.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Advances by one token. Returns a sighting when the token completes one.
    /// Tokens after the end of the stream are ignored.
    pub fn process(&mut self, token: MarkupToken) -> Option<CacheSighting> {
        if self.finished {
            return None;
        }

        match token {
            MarkupToken::StartTag(tag) => {
                self.enter(&tag);
                None
            }
            MarkupToken::EndTag(name) => {
                self.leave(&name);
                None
            }
            MarkupToken::Text(text) => self.text(&text),
            MarkupToken::EndOfStream => {
                self.finished = true;
                None
            }
            MarkupToken::Error(message) => {
                self.finished = true;
                self.error = Some(message);
                None
            }
        }
    }

    fn enter(&mut self, tag: &StartTag) {
        // Void elements like <br/> open nothing.
        if tag.self_closing {
            return;
        }
        self.current_tag = Some(tag.name.clone());

        match tag.name.as_str() {
            // Opening a row or cell only ever widens the scope; inner
            // scopes close on their own end tags.
            "tr" if tag.has_attribute_token("class", ROW_CLASS) => {
                if self.scope == Scope::Outside {
                    self.scope = Scope::Row;
                }
                self.found_any_row = true;
            }
            "td" if self.scope == Scope::Row && tag.has_attribute_token("class", LINK_COLUMN_CLASS) => {
                self.scope = Scope::LinkColumn;
            }
            "a" if self.scope.in_link_column() => {
                self.scope = Scope::Link {
                    href: tag.attribute_value("href").unwrap_or_default().to_string(),
                    disabled: tag.has_attribute_token("class", DISABLED_CLASS),
                };
            }
            _ => {}
        }
    }

    fn leave(&mut self, name: &str) {
        if self.current_tag.as_deref() == Some(name) {
            self.current_tag = None;
        }

        match name {
            "tr" => self.scope = Scope::Outside,
            "a" if matches!(self.scope, Scope::Link { .. }) => self.scope = Scope::LinkColumn,
            _ => {}
        }
    }

    fn text(&self, text: &str) -> Option<CacheSighting> {
        let Scope::Link { href, disabled } = &self.scope else {
            return None;
        };
        if self.current_tag.as_deref() != Some(LABEL_TAG) {
            return None;
        }

        let label = clean_text(text);
        if label.is_empty() {
            return None;
        }

        Some(CacheSighting {
            link: CacheLink(href.clone()),
            label,
            disabled: *disabled,
        })
    }
}

/// Lazy, single-pass sequence of sightings over a token iterator.
pub struct Sightings<I> {
    tokens: I,
    extractor: CacheExtractor,
}

impl<I> Sightings<I> {
    pub fn found_any_row(&self) -> bool {
        self.extractor.found_any_row()
    }

    pub fn error(&self) -> Option<&str> {
        self.extractor.error()
    }
}

impl<I: Iterator<Item = MarkupToken>> Iterator for Sightings<I> {
    type Item = CacheSighting;

    fn next(&mut self) -> Option<CacheSighting> {
        while !self.extractor.is_finished() {
            // A token source that simply runs dry counts as end of stream.
            let token = self.tokens.next().unwrap_or(MarkupToken::EndOfStream);
            if let Some(sighting) = self.extractor.process(token) {
                return Some(sighting);
            }
        }
        None
    }
}

pub fn extract<T>(tokens: T) -> Sightings<T::IntoIter>
where
    T: IntoIterator<Item = MarkupToken>,
{
    Sightings {
        tokens: tokens.into_iter(),
        extractor: CacheExtractor::new(),
    }
}

/// A response body read chunk by chunk, exactly once.
#[async_trait]
pub trait BodySource: Send {
    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, FetchError>;
}

/// Async counterpart of [`Sightings`]: only pulls the next body chunk once
/// every token from the previous one has been consumed.
pub struct SightingStream<S> {
    source: S,
    tokens: TokenStream,
    extractor: CacheExtractor,
    failure: Option<FetchError>,
}

impl<S: BodySource> SightingStream<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            tokens: TokenStream::new(),
            extractor: CacheExtractor::new(),
            failure: None,
        }
    }

    /// Next sighting, `Ok(None)` at the end of the page. A body read error
    /// is returned once, after every sighting before it.
    pub async fn next(&mut self) -> Result<Option<CacheSighting>, FetchError> {
        loop {
            if self.extractor.is_finished() {
                return match self.failure.take() {
                    Some(err) => Err(err),
                    None => Ok(None),
                };
            }

            if let Some(token) = self.tokens.next_token() {
                if let Some(sighting) = self.extractor.process(token) {
                    return Ok(Some(sighting));
                }
                continue;
            }

            if self.tokens.is_finished() {
                self.extractor.process(MarkupToken::EndOfStream);
                continue;
            }

            match self.source.next_chunk().await {
                Ok(Some(chunk)) => self.tokens.feed(&chunk),
                Ok(None) => self.tokens.finish(),
                Err(err) => {
                    self.tokens.fail(err.to_string());
                    self.failure = Some(err);
                }
            }
        }
    }

    pub fn found_any_row(&self) -> bool {
        self.extractor.found_any_row()
    }
}
