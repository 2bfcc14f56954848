//! Positioned source tokens
//!
//! A [`Token`] is a run of source text together with the byte offset where it
//! starts and a classification code. The same type is used at two levels:
//! single characters tagged with a [`CategoryCode`](super::category::CategoryCode)
//! and coarser tokens tagged with a [`TokenCode`].

use std::fmt;
use std::ops::{Add, AddAssign};

/// Token-level classification produced by the tokenizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TokenCode {
    /// Escape followed by a letter run (plus optional `*`), or a control symbol such as `\,`
    Command,
    /// Size prefix merged with its delimiter, e.g. `\left(`
    PunctuationCommand,
    /// Escaped structural character: `\\`, `\{`, `\}`, `\$`, `\%`
    EscapedSymbol,
    /// `%` up to (not including) the end of the line
    Comment,
    /// `$`
    MathSwitch,
    /// `$$`
    DisplayMathSwitch,
    /// `\(` or `\[`
    MathGroupBegin,
    /// `\)` or `\]`
    MathGroupEnd,
    /// `{`
    GroupBegin,
    /// `}`
    GroupEnd,
    /// `[`
    BracketBegin,
    /// `]`
    BracketEnd,
    /// Merged whitespace holding at most two line breaks
    Spacer,
    /// Anything else
    #[default]
    Text,
}

/// A run of source text and the offset of its first byte.
///
/// Equality compares text only, so two tokens at different positions with
/// the same text are equal.
#[derive(Debug, Clone, Default)]
pub struct Token<C = TokenCode> {
    text: String,
    position: usize,
    code: C,
}

impl<C: Copy> Token<C> {
    pub fn new(text: impl Into<String>, position: usize, code: C) -> Self {
        Self {
            text: text.into(),
            position,
            code,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn position(&self) -> usize {
        self.position
    }

    /// Offset one past the last byte.
    pub fn end(&self) -> usize {
        self.position + self.text.len()
    }

    pub fn code(&self) -> C {
        self.code
    }

    pub fn with_code<D: Copy>(self, code: D) -> Token<D> {
        Token {
            text: self.text,
            position: self.position,
            code,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Split at a byte index, keeping positions of both halves.
    ///
    /// Returns `None` if `at` is not a char boundary strictly inside the text.
    pub fn split_at(&self, at: usize) -> Option<(Token<C>, Token<C>)> {
        if at == 0 || at >= self.text.len() || !self.text.is_char_boundary(at) {
            return None;
        }
        let (head, tail) = self.text.split_at(at);
        Some((
            Token::new(head, self.position, self.code),
            Token::new(tail, self.position + at, self.code),
        ))
    }

    /// Concatenate tokens, keeping the position of the first one.
    pub fn join<'a, I>(tokens: I, position: usize, code: C) -> Token<C>
    where
        C: 'a,
        I: IntoIterator<Item = &'a Token<C>>,
    {
        let text: String = tokens.into_iter().map(|t| t.text.as_str()).collect();
        Token::new(text, position, code)
    }

    /// Number of line breaks, counting `\r\n` once.
    pub fn line_breaks(&self) -> usize {
        self.text.matches('\n').count() + self.text.matches('\r').count()
            - self.text.matches("\r\n").count()
    }
}

impl<C> PartialEq for Token<C> {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

impl<C> Eq for Token<C> {}

impl<C> PartialEq<str> for Token<C> {
    fn eq(&self, other: &str) -> bool {
        self.text == other
    }
}

impl<C> PartialEq<&str> for Token<C> {
    fn eq(&self, other: &&str) -> bool {
        self.text == *other
    }
}

impl<C> AsRef<str> for Token<C> {
    fn as_ref(&self) -> &str {
        &self.text
    }
}

impl<C> fmt::Display for Token<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl<C> AddAssign<&Token<C>> for Token<C> {
    fn add_assign(&mut self, rhs: &Token<C>) {
        self.text.push_str(&rhs.text);
    }
}

impl<C> AddAssign<&str> for Token<C> {
    fn add_assign(&mut self, rhs: &str) {
        self.text.push_str(rhs);
    }
}

impl<C> Add<&Token<C>> for Token<C> {
    type Output = Token<C>;

    fn add(mut self, rhs: &Token<C>) -> Token<C> {
        self += rhs;
        self
    }
}

impl<C> Token<C> {
    /// Whether the text contains a substring.
    pub fn contains(&self, needle: &str) -> bool {
        self.text.contains(needle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_keeps_leftmost_position() {
        let mut t = Token::new("as", 4, TokenCode::Text);
        t += &Token::new("df", 6, TokenCode::Text);
        assert_eq!(t.text(), "asdf");
        assert_eq!(t.position(), 4);

        let t2 = Token::new("x", 1, TokenCode::Text) + &Token::new("y", 2, TokenCode::Text);
        assert_eq!(t2.text(), "xy");
        assert_eq!(t2.position(), 1);
    }

    #[test]
    fn test_equality_ignores_position() {
        let a = Token::new("asdf", 0, TokenCode::Text);
        let b = Token::new("asdf", 2, TokenCode::Spacer);
        assert_eq!(a, b);
        assert_ne!(a, Token::new("asd", 0, TokenCode::Text));
        assert!(a == "asdf");
    }

    #[test]
    fn test_contains() {
        let t = Token::new("corgi", 0, TokenCode::Text);
        assert!(t.contains("rg"));
        assert!(!t.contains("reg"));
    }

    #[test]
    fn test_split_at() {
        let t = Token::new("12x", 10, TokenCode::Text);
        let (head, tail) = t.split_at(1).unwrap();
        assert_eq!((head.text(), head.position()), ("1", 10));
        assert_eq!((tail.text(), tail.position()), ("2x", 11));
        assert!(t.split_at(0).is_none());
        assert!(t.split_at(3).is_none());
    }

    #[test]
    fn test_join() {
        let tokens = vec![
            Token::new("a", 3, TokenCode::Text),
            Token::new(" ", 4, TokenCode::Spacer),
            Token::new("b", 5, TokenCode::Text),
        ];
        let joined = Token::join(&tokens, 3, TokenCode::Text);
        assert_eq!(joined.text(), "a b");
        assert_eq!(joined.end(), 6);
    }

    #[test]
    fn test_line_breaks_counts_crlf_once() {
        assert_eq!(Token::new("\r\n \n", 0, TokenCode::Spacer).line_breaks(), 2);
        assert_eq!(Token::new("  ", 0, TokenCode::Spacer).line_breaks(), 0);
    }
}
