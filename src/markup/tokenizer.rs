use std::collections::VecDeque;
use std::io::{ErrorKind, Read};

use html5ever::tendril::StrTendril;
use html5ever::tokenizer::states::RawKind;
use html5ever::tokenizer::{
    BufferQueue, Tag, TagKind, Token, TokenSink, TokenSinkResult, Tokenizer, TokenizerOpts,
    TokenizerResult,
};

use super::{Attribute, MarkupToken, StartTag};

const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Receives html5ever tokens and turns them into `MarkupToken`s.
///
/// Character runs are buffered until the next non-text token so that one run
/// of text becomes exactly one `Text`, even when it straddles input chunks.
#[derive(Default)]
struct Collector {
    tokens: VecDeque<MarkupToken>,
    text: String,
}

impl Collector {
    fn flush_text(&mut self) {
        if !self.text.is_empty() {
            self.tokens
                .push_back(MarkupToken::Text(std::mem::take(&mut self.text)));
        }
    }

    fn push_tag(&mut self, tag: Tag) -> TokenSinkResult<()> {
        self.flush_text();

        let name = tag.name.to_string();
        match tag.kind {
            TagKind::StartTag => {
                let raw = if tag.self_closing { None } else { raw_kind(&name) };
                let attributes = tag
                    .attrs
                    .into_iter()
                    .map(|attr| Attribute {
                        name: attr.name.local.to_string(),
                        value: attr.value.to_string(),
                    })
                    .collect();

                self.tokens.push_back(MarkupToken::StartTag(StartTag {
                    name,
                    attributes,
                    self_closing: tag.self_closing,
                }));

                match raw {
                    Some(kind) => TokenSinkResult::RawData(kind),
                    None => TokenSinkResult::Continue,
                }
            }
            TagKind::EndTag => {
                self.tokens.push_back(MarkupToken::EndTag(name));
                TokenSinkResult::Continue
            }
        }
    }
}

/// Elements whose content is not markup. Without a tree builder the
/// tokenizer has to be told to switch state for them.
fn raw_kind(name: &str) -> Option<RawKind> {
    match name {
        "script" => Some(RawKind::ScriptData),
        "style" | "xmp" | "iframe" | "noembed" | "noframes" => Some(RawKind::Rawtext),
        "title" | "textarea" => Some(RawKind::Rcdata),
        _ => None,
    }
}

impl TokenSink for Collector {
    type Handle = ();

    fn process_token(&mut self, token: Token, _line_number: u64) -> TokenSinkResult<()> {
        match token {
            Token::CharacterTokens(text) => {
                self.text.push_str(&text);
                TokenSinkResult::Continue
            }
            Token::TagToken(tag) => self.push_tag(tag),
            Token::EOFToken => {
                self.flush_text();
                self.tokens.push_back(MarkupToken::EndOfStream);
                TokenSinkResult::Continue
            }
            Token::CommentToken(_) | Token::DoctypeToken(_) => {
                self.flush_text();
                TokenSinkResult::Continue
            }
            Token::NullCharacterToken | Token::ParseError(_) => TokenSinkResult::Continue,
        }
    }
}

/// Incremental tokenizer over a body that arrives in chunks.
///
/// Bytes are fed as they come off the wire; `next_token` hands back whatever
/// is complete so far and returns `None` when more input is needed. After
/// `finish` (or `fail`) the queue ends with `EndOfStream` (or `Error`).
///
/// Holds non-atomic tendrils, so it is not `Send`.
pub struct TokenStream {
    tokenizer: Tokenizer<Collector>,
    input: BufferQueue,
    // Trailing bytes of a UTF-8 sequence cut by a chunk boundary.
    pending: Vec<u8>,
    finished: bool,
}

impl Default for TokenStream {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenStream {
    pub fn new() -> Self {
        Self {
            tokenizer: Tokenizer::new(Collector::default(), TokenizerOpts::default()),
            input: BufferQueue::new(),
            pending: Vec::new(),
            finished: false,
        }
    }

    pub fn feed(&mut self, chunk: &[u8]) {
        if self.finished {
            return;
        }

        self.pending.extend_from_slice(chunk);
        let (text, consumed) = decode_utf8_prefix(&self.pending);
        self.pending.drain(..consumed);

        self.push_text(text);
    }

    pub fn finish(&mut self) {
        if self.finished {
            return;
        }

        if !self.pending.is_empty() {
            let tail = String::from_utf8_lossy(&self.pending).into_owned();
            self.pending.clear();
            self.push_text(tail);
        }

        self.tokenizer.end();
        self.finished = true;
    }

    /// Ends the stream early because the body could not be read.
    pub fn fail(&mut self, message: impl Into<String>) {
        if self.finished {
            return;
        }

        self.tokenizer.sink.flush_text();
        self.tokenizer
            .sink
            .tokens
            .push_back(MarkupToken::Error(message.into()));
        self.finished = true;
    }

    pub fn next_token(&mut self) -> Option<MarkupToken> {
        self.tokenizer.sink.tokens.pop_front()
    }

    /// No further input will be accepted. Queued tokens may remain.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    fn push_text(&mut self, text: String) {
        if text.is_empty() {
            return;
        }
        self.input.push_back(StrTendril::from(text));
        // Collector never yields TokenSinkResult::Script, so feed always
        // runs the queue dry and returns Done.
        let result = self.tokenizer.feed(&mut self.input);
        debug_assert!(matches!(result, TokenizerResult::Done));
    }
}

/// Decodes as much of `bytes` as possible. Invalid sequences become U+FFFD;
/// an incomplete sequence at the very end is left unconsumed.
fn decode_utf8_prefix(bytes: &[u8]) -> (String, usize) {
    let mut decoded = String::with_capacity(bytes.len());
    let mut offset = 0;

    while offset < bytes.len() {
        match std::str::from_utf8(&bytes[offset..]) {
            Ok(text) => {
                decoded.push_str(text);
                offset = bytes.len();
            }
            Err(err) => {
                let valid_end = offset + err.valid_up_to();
                decoded.push_str(&String::from_utf8_lossy(&bytes[offset..valid_end]));

                match err.error_len() {
                    Some(len) => {
                        decoded.push(char::REPLACEMENT_CHARACTER);
                        offset = valid_end + len;
                    }
                    None => return (decoded, valid_end),
                }
            }
        }
    }

    (decoded, offset)
}

/// Pull-based token iterator over any blocking reader.
pub struct ReaderTokens<R> {
    reader: R,
    stream: TokenStream,
    buf: Vec<u8>,
}

impl<R: Read> ReaderTokens<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            stream: TokenStream::new(),
            buf: vec![0; READ_CHUNK_SIZE],
        }
    }
}

impl<R: Read> Iterator for ReaderTokens<R> {
    type Item = MarkupToken;

    fn next(&mut self) -> Option<MarkupToken> {
        loop {
            if let Some(token) = self.stream.next_token() {
                return Some(token);
            }
            if self.stream.is_finished() {
                return None;
            }

            match self.reader.read(&mut self.buf) {
                Ok(0) => self.stream.finish(),
                Ok(n) => self.stream.feed(&self.buf[..n]),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => self.stream.fail(err.to_string()),
            }
        }
    }
}
