//! Balanced-tag checking for the HTML embedded in markdown cells.
//!
//! Markdown cells are expected to wrap their content in a `<div class=...>`.
//! A stray or unclosed tag there breaks rendering of every cell that follows,
//! so each cell is tokenized with html5ever (the text between tags is
//! ignored) and its start/end tags are checked against a stack of open tags.
//!
//! Tags that HTML allows to go unclosed (paragraphs, list items, headings, ...)
//! never touch the stack.

use std::cell::RefCell;

use html5ever::tendril::StrTendril;
use html5ever::tokenizer::states::RawKind;
use html5ever::tokenizer::{
    BufferQueue, TagKind, Token, TokenSink, TokenSinkResult, Tokenizer, TokenizerOpts,
};

/// Tags that may legitimately be left open or closed without a match.
pub const UNMATCHED_OK_TAGS: &[&str] = &[
    "p", "li", "td", "img", "br", "hr", "h1", "h2", "h3", "h4", "h5", "h6",
];

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum HtmlError {
    #[error("unclosed tags: {}", .0.join(", "))]
    UnclosedTags(Vec<String>),

    #[error("closing tag </{found}> {}", describe_open(.expected))]
    MismatchedTag {
        found: String,
        expected: Option<String>,
    },
}

fn describe_open(expected: &Option<String>) -> String {
    match expected {
        Some(tag) => format!("while still inside <{tag}>"),
        None => "with no opening tag".to_string(),
    }
}

/// A start tag: lowercased name plus its attributes in source order.
///
/// Valueless attributes carry an empty value. Character references in
/// values are already decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub name: String,
    pub attrs: Vec<(String, String)>,
}

impl Tag {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagToken {
    Start(Tag),
    End(String),
}

/// Check that every non-ignorable tag in `text` is closed in the right order.
///
/// Returns the outer tag: the first non-ignorable tag opened while nothing
/// else was open. Text with no such tags yields `None`.
pub fn validate_tags(text: &str) -> Result<Option<Tag>, HtmlError> {
    let mut stack: Vec<String> = Vec::new();
    let mut outer: Option<Tag> = None;

    for token in tag_tokens(text) {
        match token {
            TagToken::Start(tag) => {
                if is_unmatched_ok(&tag.name) {
                    continue;
                }
                if stack.is_empty() && outer.is_none() {
                    outer = Some(tag.clone());
                }
                stack.push(tag.name);
            }
            TagToken::End(name) => {
                if is_unmatched_ok(&name) {
                    continue;
                }
                match stack.pop() {
                    Some(open) if open == name => {}
                    expected => {
                        return Err(HtmlError::MismatchedTag {
                            found: name,
                            expected,
                        });
                    }
                }
            }
        }
    }

    if !stack.is_empty() {
        return Err(HtmlError::UnclosedTags(stack));
    }

    Ok(outer)
}

pub fn is_unmatched_ok(name: &str) -> bool {
    UNMATCHED_OK_TAGS.contains(&name)
}

/// Parse a single opening tag such as `<div class="x" id=y>`.
pub fn parse_opening_tag(text: &str) -> Option<Tag> {
    match tag_tokens(text).into_iter().next()? {
        TagToken::Start(tag) => Some(tag),
        TagToken::End(_) => None,
    }
}

// =============================================================================
// Tokenizer
// =============================================================================

/// The start and end tags of `text`, in order.
///
/// Comments, doctypes and text are dropped. `<x/>` yields a start tag
/// followed by its end tag. A tag cut off by the end of the text is dropped.
pub fn tag_tokens(text: &str) -> Vec<TagToken> {
    let input = BufferQueue::default();
    input.push_back(StrTendril::from_slice(text));

    let tokenizer = Tokenizer::new(TagCollector::default(), TokenizerOpts::default());
    let _ = tokenizer.feed(&input);
    tokenizer.end();
    tokenizer.sink.tokens.take()
}

#[derive(Default)]
struct TagCollector {
    tokens: RefCell<Vec<TagToken>>,
}

impl TokenSink for TagCollector {
    type Handle = ();

    fn process_token(&self, token: Token, _line_number: u64) -> TokenSinkResult<()> {
        let Token::TagToken(tag) = token else {
            return TokenSinkResult::Continue;
        };
        let name = tag.name.to_string();
        let mut tokens = self.tokens.borrow_mut();

        match tag.kind {
            TagKind::StartTag => {
                let attrs = tag
                    .attrs
                    .iter()
                    .map(|attr| (attr.name.local.to_string(), attr.value.to_string()))
                    .collect();
                tokens.push(TagToken::Start(Tag {
                    name: name.clone(),
                    attrs,
                }));
                if tag.self_closing {
                    tokens.push(TagToken::End(name));
                    return TokenSinkResult::Continue;
                }
                // without a tree builder, the sink has to switch text modes
                match raw_kind(&name) {
                    Some(Some(kind)) => TokenSinkResult::RawData(kind),
                    Some(None) => TokenSinkResult::Plaintext,
                    None => TokenSinkResult::Continue,
                }
            }
            TagKind::EndTag => {
                tokens.push(TagToken::End(name));
                TokenSinkResult::Continue
            }
        }
    }
}

/// Elements whose content is text up to their end tag. `Some(None)` means
/// plaintext, which runs to the end of the input.
fn raw_kind(name: &str) -> Option<Option<RawKind>> {
    match name {
        "script" => Some(Some(RawKind::ScriptData)),
        "style" | "xmp" | "iframe" | "noembed" | "noframes" => Some(Some(RawKind::Rawtext)),
        "title" | "textarea" => Some(Some(RawKind::Rcdata)),
        "plaintext" => Some(None),
        _ => None,
    }
}
