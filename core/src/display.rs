//! Helpers for rendering display columns. Nothing here affects ranking.
//!
//! Genre columns usually arrive as a list literal such as
//! `['Action', 'Science Fiction']` or `["Drama"]`. [`parse_list`] accepts
//! exactly a bracketed, comma separated list of quoted strings and rejects
//! anything else; it never interprets the text beyond that grammar.

use crate::corpus::ItemRecord;
use crate::error::MalformedRecordError;

pub const PLACEHOLDER_POSTER: &str = "https://via.placeholder.com/200x300?text=No+Image";
pub const DISPLAY_GENRES: usize = 2;

/// Parse a list literal of single- or double-quoted strings.
pub fn parse_list(raw: &str) -> Result<Vec<String>, MalformedRecordError> {
    let mut p = ListParser { src: raw, chars: raw.char_indices().peekable() };
    p.skip_ws();
    p.expect('[', "expected `[`")?;
    let mut items = Vec::new();
    loop {
        p.skip_ws();
        match p.peek() {
            Some(']') => {
                p.bump();
                break;
            }
            Some('\'') | Some('"') => {
                items.push(p.quoted()?);
                p.skip_ws();
                match p.peek() {
                    Some(',') => { p.bump(); }
                    Some(']') => {}
                    _ => return Err(p.error("expected `,` or `]`")),
                }
            }
            _ => return Err(p.error("expected a quoted string")),
        }
    }
    p.skip_ws();
    if p.peek().is_some() {
        return Err(p.error("trailing characters after list"));
    }
    Ok(items)
}

/// Render a list-valued display field as its first `max` entries joined by
/// ", ". Values that do not look like a list, or fail to parse, are shown raw.
pub fn display_list(raw: &str, max: usize) -> String {
    if !raw.trim_start().starts_with('[') {
        return raw.to_string();
    }
    match parse_list(raw) {
        Ok(items) => items.into_iter().take(max).collect::<Vec<_>>().join(", "),
        Err(err) => {
            tracing::debug!(%err, "showing raw display field");
            raw.to_string()
        }
    }
}

pub fn poster_or_placeholder(record: &ItemRecord) -> &str {
    match record.field("poster_path") {
        Some(p) if !p.trim().is_empty() => p,
        _ => PLACEHOLDER_POSTER,
    }
}

pub fn genres(record: &ItemRecord) -> Option<String> {
    record.field("genres").map(|g| display_list(g, DISPLAY_GENRES))
}

struct ListParser<'a> {
    src: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
}

impl<'a> ListParser<'a> {
    fn peek(&mut self) -> Option<char> { self.chars.peek().map(|(_, c)| *c) }

    fn bump(&mut self) -> Option<char> { self.chars.next().map(|(_, c)| c) }

    fn offset(&mut self) -> usize {
        self.chars.peek().map(|(i, _)| *i).unwrap_or(self.src.len())
    }

    fn error(&mut self, reason: &'static str) -> MalformedRecordError {
        MalformedRecordError { offset: self.offset(), reason }
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.bump();
        }
    }

    fn expect(&mut self, want: char, reason: &'static str) -> Result<(), MalformedRecordError> {
        if self.peek() == Some(want) {
            self.bump();
            Ok(())
        } else {
            Err(self.error(reason))
        }
    }

    fn quoted(&mut self) -> Result<String, MalformedRecordError> {
        let quote = self.bump().ok_or_else(|| self.error("expected a quote"))?;
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(self.error("unterminated string")),
                Some(c) if c == quote => return Ok(out),
                Some('\\') => match self.bump() {
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some(c @ ('\\' | '\'' | '"')) => out.push(c),
                    _ => return Err(self.error("unsupported escape")),
                },
                Some(c) => out.push(c),
            }
        }
    }
}
