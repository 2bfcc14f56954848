//! Character categorization
//!
//! Every source character is tagged with a fixed category code, in the spirit
//! of TeX's catcode table. Unlike TeX the table cannot be changed at runtime.
//! Brackets and parentheses get their own codes so argument readers can tell
//! them apart from ordinary punctuation.

use std::fmt;

use super::token::Token;

use CategoryCode::*;

/// Category of a single source character.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub enum CategoryCode {
    /// Example: `\`.
    Escape,
    /// Example: `{`.
    GroupBegin,
    /// Example: `}`.
    GroupEnd,
    /// Example: `$`.
    MathSwitch,
    /// Example: `&`.
    Alignment,
    /// `\n` or `\r`.
    EndOfLine,
    /// Example: `#`.
    Parameter,
    /// Example: `^`.
    Superscript,
    /// Example: `_`.
    Subscript,
    /// ASCII null.
    Ignored,
    /// Space or tab.
    Spacer,
    /// `[a-zA-Z]`.
    Letter,
    /// Anything without a more specific category.
    #[default]
    Other,
    /// Example: `~`.
    Active,
    /// Example: `%`.
    Comment,
    /// ASCII delete.
    Invalid,
    /// `[`
    BracketBegin,
    /// `]`
    BracketEnd,
    /// `(`
    ParenBegin,
    /// `)`
    ParenEnd,
}

impl CategoryCode {
    /// Category of a single character.
    pub fn of(c: char) -> CategoryCode {
        match c {
            '\\' => Escape,
            '{' => GroupBegin,
            '}' => GroupEnd,
            '$' => MathSwitch,
            '&' => Alignment,
            '\n' | '\r' => EndOfLine,
            '#' => Parameter,
            '^' => Superscript,
            '_' => Subscript,
            '\0' => Ignored,
            ' ' | '\t' => Spacer,
            'a'..='z' | 'A'..='Z' => Letter,
            '~' => Active,
            '%' => Comment,
            '\u{7f}' => Invalid,
            '[' => BracketBegin,
            ']' => BracketEnd,
            '(' => ParenBegin,
            ')' => ParenEnd,
            _ => Other,
        }
    }

    /// Whitespace of either kind.
    pub fn is_whitespace(self) -> bool {
        matches!(self, Spacer | EndOfLine)
    }
}

impl fmt::Display for CategoryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// A single categorized source character.
pub type CharToken = Token<CategoryCode>;

/// Lazy, restartable categorizer over a borrowed source text.
#[derive(Debug, Clone)]
pub struct Categorizer<'a> {
    text: &'a str,
    offset: usize,
}

impl<'a> Categorizer<'a> {
    pub fn new(text: &'a str) -> Self {
        Self::starting_at(text, 0)
    }

    /// Start at byte offset `offset`; it is clamped to the text and must be a char boundary.
    pub fn starting_at(text: &'a str, offset: usize) -> Self {
        Self {
            text,
            offset: offset.min(text.len()),
        }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }
}

impl Iterator for Categorizer<'_> {
    type Item = CharToken;

    fn next(&mut self) -> Option<CharToken> {
        let c = self.text.get(self.offset..)?.chars().next()?;
        let position = self.offset;
        self.offset += c.len_utf8();
        let mut buf = [0u8; 4];
        Some(Token::new(
            &*c.encode_utf8(&mut buf),
            position,
            CategoryCode::of(c),
        ))
    }
}

/// Lazily categorize every character of `text`.
///
/// Calling `categorize` again restarts from the beginning.
pub fn categorize(text: &str) -> Categorizer<'_> {
    Categorizer::new(text)
}
