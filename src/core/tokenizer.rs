//! Token assembly
//!
//! Converts the categorized character stream into coarser tokens. Recognition
//! is a fixed chain of rules tried in order; the first rule that matches at
//! the cursor produces the next token:
//!
//! 1. Punctuation commands (`\left(`, `\Bigg\rangle`, ...)
//! 2. Escaped structural symbols (`\\`, `\{`, `\}`, `\$`, `\%`)
//! 3. Bracket and paren math delimiters (`\[`, `\]`, `\(`, `\)`)
//! 4. Line comments
//! 5. Math switches (`$$` before `$`)
//! 6. Command names and control symbols
//! 7. Group and bracket delimiters
//! 8. Merged whitespace
//! 9. Text runs
//!
//! The tokenizer never fails: every character ends up in some token.

use crate::data::constants::PUNCTUATION_COMMANDS;

use super::buffer::Buffer;
use super::category::{CategoryCode, Categorizer, CharToken};
use super::token::{Token, TokenCode};

/// Characters that form an escaped-symbol token when preceded by the escape.
const ESCAPED_SYMBOLS: [char; 5] = ['\\', '{', '}', '$', '%'];

type Rule = fn(&mut Tokenizer<'_>) -> Option<Token>;

const RULES: [Rule; 9] = [
    punctuation_command,
    escaped_symbol,
    math_group,
    comment,
    math_switch,
    command,
    delimiter,
    spacer,
    text,
];

/// Lazy token stream over a source text.
#[derive(Debug)]
pub struct Tokenizer<'a> {
    text: &'a str,
    chars: Buffer<Categorizer<'a>>,
}

impl<'a> Tokenizer<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            text,
            chars: Buffer::new(Categorizer::new(text)),
        }
    }

    /// The full source text.
    pub fn source(&self) -> &'a str {
        self.text
    }

    /// Byte offset of the next unread character.
    pub fn offset(&mut self) -> usize {
        match self.chars.peek() {
            Some(c) => c.position(),
            None => self.text.len(),
        }
    }

    /// Continue tokenizing from byte offset `offset`.
    pub fn seek(&mut self, offset: usize) {
        *self.chars.discard_lookahead() = Categorizer::starting_at(self.text, offset);
    }

    fn peek_code(&mut self, at: isize) -> Option<CategoryCode> {
        self.chars.peek_at(at).map(CharToken::code)
    }

    fn peek_text(&mut self, at: isize) -> Option<&str> {
        self.chars.peek_at(at).map(CharToken::text)
    }

    /// Consume `n` characters into one token.
    fn take(&mut self, n: usize, code: TokenCode) -> Option<Token> {
        let chars = self.chars.forward(n);
        let first = chars.first()?;
        Some(Token::join(chars, first.position(), CategoryCode::Other).with_code(code))
    }

    /// Consume characters until `stop` holds for the next one.
    fn take_until<F>(&mut self, stop: F, code: TokenCode) -> Option<Token>
    where
        F: FnMut(&CharToken) -> bool,
    {
        let chars = self.chars.forward_until(stop);
        let first = chars.first()?;
        Some(Token::join(chars, first.position(), CategoryCode::Other).with_code(code))
    }
}

impl Iterator for Tokenizer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        if !self.chars.has_next() {
            return None;
        }
        RULES.iter().find_map(|rule| rule(self))
    }
}

/// Tokenize a whole string eagerly.
pub fn tokenize(text: &str) -> Vec<Token> {
    Tokenizer::new(text).collect()
}

fn punctuation_command(t: &mut Tokenizer<'_>) -> Option<Token> {
    if t.peek_code(0)? != CategoryCode::Escape {
        return None;
    }
    let start = t.chars.peek()?.position() + 1;
    let rest = t.text.get(start..)?;
    let matched = PUNCTUATION_COMMANDS
        .iter()
        .find(|cmd| rest.starts_with(cmd.as_str()))?;
    // Letter-ending delimiters such as `\langle` must not swallow a longer name.
    if matched.ends_with(|c: char| c.is_ascii_alphabetic())
        && rest[matched.len()..].starts_with(|c: char| c.is_ascii_alphabetic())
    {
        return None;
    }
    let n = 1 + matched.chars().count();
    t.take(n, TokenCode::PunctuationCommand)
}

fn escaped_symbol(t: &mut Tokenizer<'_>) -> Option<Token> {
    if t.peek_code(0)? != CategoryCode::Escape {
        return None;
    }
    let next = t.peek_text(1)?.chars().next()?;
    if !ESCAPED_SYMBOLS.contains(&next) {
        return None;
    }
    t.take(2, TokenCode::EscapedSymbol)
}

fn math_group(t: &mut Tokenizer<'_>) -> Option<Token> {
    if t.peek_code(0)? != CategoryCode::Escape {
        return None;
    }
    let code = match t.peek_text(1)? {
        "[" | "(" => TokenCode::MathGroupBegin,
        "]" | ")" => TokenCode::MathGroupEnd,
        _ => return None,
    };
    t.take(2, code)
}

fn comment(t: &mut Tokenizer<'_>) -> Option<Token> {
    if t.peek_code(0)? != CategoryCode::Comment {
        return None;
    }
    t.take_until(|c| c.code() == CategoryCode::EndOfLine, TokenCode::Comment)
}

fn math_switch(t: &mut Tokenizer<'_>) -> Option<Token> {
    if t.peek_code(0)? != CategoryCode::MathSwitch {
        return None;
    }
    if t.peek_code(1) == Some(CategoryCode::MathSwitch) {
        t.take(2, TokenCode::DisplayMathSwitch)
    } else {
        t.take(1, TokenCode::MathSwitch)
    }
}

fn command(t: &mut Tokenizer<'_>) -> Option<Token> {
    if t.peek_code(0)? != CategoryCode::Escape {
        return None;
    }
    let n = match t.peek_code(1) {
        None => return t.take(1, TokenCode::Text),
        Some(CategoryCode::Letter) => {
            let mut n = 1;
            while t.peek_code(n as isize) == Some(CategoryCode::Letter) {
                n += 1;
            }
            if t.peek_text(n as isize) == Some("*") {
                n += 1;
            }
            n
        }
        // Control symbol: `\,`, `\&`, `\ ` and the like.
        Some(_) => {
            if t.peek_text(1) == Some("\r") && t.peek_text(2) == Some("\n") {
                3
            } else {
                2
            }
        }
    };
    t.take(n, TokenCode::Command)
}

fn delimiter(t: &mut Tokenizer<'_>) -> Option<Token> {
    let code = match t.peek_code(0)? {
        CategoryCode::GroupBegin => TokenCode::GroupBegin,
        CategoryCode::GroupEnd => TokenCode::GroupEnd,
        CategoryCode::BracketBegin => TokenCode::BracketBegin,
        CategoryCode::BracketEnd => TokenCode::BracketEnd,
        _ => return None,
    };
    t.take(1, code)
}

fn spacer(t: &mut Tokenizer<'_>) -> Option<Token> {
    if !t.peek_code(0)?.is_whitespace() {
        return None;
    }
    let mut n = 0;
    let mut breaks = 0;
    while breaks < 2 {
        match t.peek_code(n) {
            Some(CategoryCode::Spacer) => n += 1,
            Some(CategoryCode::EndOfLine) => {
                if t.peek_text(n) == Some("\r") && t.peek_text(n + 1) == Some("\n") {
                    n += 1;
                }
                n += 1;
                breaks += 1;
            }
            _ => break,
        }
    }
    t.take(n as usize, TokenCode::Spacer)
}

fn text(t: &mut Tokenizer<'_>) -> Option<Token> {
    let mut first = true;
    t.take_until(
        |c| {
            if first {
                first = false;
                return false;
            }
            matches!(
                c.code(),
                CategoryCode::Escape
                    | CategoryCode::GroupBegin
                    | CategoryCode::GroupEnd
                    | CategoryCode::BracketBegin
                    | CategoryCode::BracketEnd
                    | CategoryCode::MathSwitch
                    | CategoryCode::Comment
                    | CategoryCode::Spacer
                    | CategoryCode::EndOfLine
            )
        },
        TokenCode::Text,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn texts(src: &str) -> Vec<String> {
        tokenize(src).iter().map(|t| t.text().to_string()).collect()
    }

    fn codes(src: &str) -> Vec<TokenCode> {
        tokenize(src).iter().map(Token::code).collect()
    }

    #[test]
    fn test_commands_and_groups() {
        assert_eq!(texts(r"\section{Hey}"), vec![r"\section", "{", "Hey", "}"]);
        assert_eq!(
            codes(r"\section{Hey}"),
            vec![
                TokenCode::Command,
                TokenCode::GroupBegin,
                TokenCode::Text,
                TokenCode::GroupEnd
            ]
        );
    }

    #[test]
    fn test_starred_command() {
        assert_eq!(texts(r"\section*{x}")[0], r"\section*");
    }

    #[test]
    fn test_escaped_symbols() {
        assert_eq!(texts(r"\$\{50\}"), vec![r"\$", r"\{", "50", r"\}"]);
        assert_eq!(codes(r"\\")[0], TokenCode::EscapedSymbol);
    }

    #[test]
    fn test_escaped_percent_is_not_comment() {
        assert_eq!(texts(r"50\% off"), vec!["50", r"\%", " ", "off"]);
    }

    #[test]
    fn test_comment_stops_before_newline() {
        assert_eq!(texts("a%note\nb"), vec!["a", "%note", "\n", "b"]);
        assert_eq!(codes("%x")[0], TokenCode::Comment);
    }

    #[test]
    fn test_math_switches() {
        assert_eq!(
            codes("$$x$"),
            vec![TokenCode::DisplayMathSwitch, TokenCode::Text, TokenCode::MathSwitch]
        );
        assert_eq!(
            codes(r"\[x\]"),
            vec![TokenCode::MathGroupBegin, TokenCode::Text, TokenCode::MathGroupEnd]
        );
        assert_eq!(texts(r"\(x\)"), vec![r"\(", "x", r"\)"]);
    }

    #[test]
    fn test_punctuation_commands_merge() {
        assert_eq!(texts(r"\left(x\right)"), vec![r"\left(", "x", r"\right)"]);
        assert_eq!(codes(r"\bigl[")[0], TokenCode::PunctuationCommand);
        assert_eq!(texts(r"\left\{"), vec![r"\left\{"]);
        assert_eq!(texts(r"\leftarrow"), vec![r"\leftarrow"]);
    }

    #[test]
    fn test_spacer_capped_after_second_break() {
        assert_eq!(texts("a \n \n\nb"), vec!["a", " \n \n", "\n", "b"]);
        assert_eq!(texts("a\r\n\r\nb"), vec!["a", "\r\n\r\n", "b"]);
        assert_eq!(texts("a  \n  b"), vec!["a", "  \n  ", "b"]);
    }

    #[test]
    fn test_control_symbols() {
        assert_eq!(texts(r"a\,b"), vec!["a", r"\,", "b"]);
        assert_eq!(codes(r"\&"), vec![TokenCode::Command]);
    }

    #[test]
    fn test_lone_trailing_escape_is_text() {
        assert_eq!(texts("a\\"), vec!["a", "\\"]);
        assert_eq!(codes("\\"), vec![TokenCode::Text]);
    }

    #[test]
    fn test_text_keeps_parens_and_punctuation() {
        assert_eq!(texts("f(x)=1, 2"), vec!["f(x)=1,", " ", "2"]);
    }

    #[test]
    fn test_positions_are_tracked() {
        let tokens = tokenize(r"ab \x{y}");
        let positions: Vec<_> = tokens.iter().map(Token::position).collect();
        assert_eq!(positions, vec![0, 2, 3, 5, 6, 7]);
    }

    #[test]
    fn test_tokens_cover_source() {
        let src = "\\begin{a}[b] %c\n $x$ \\\\ \\verb|q| \u{e9}\n\n\n}";
        let joined: String = tokenize(src).iter().map(Token::text).collect();
        assert_eq!(joined, src);
    }

    #[test]
    fn test_seek_restarts_stream() {
        let mut t = Tokenizer::new(r"\a{b}c");
        assert_eq!(t.next().map(|t| t.text().to_string()).as_deref(), Some(r"\a"));
        t.seek(5);
        assert_eq!(t.next().map(|t| t.text().to_string()).as_deref(), Some("c"));
        assert!(t.next().is_none());
    }
}
