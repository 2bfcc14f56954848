//! Recursive-descent reader
//!
//! Builds a [`TexTree`] from the token stream. Reading is driven by the kind
//! of the next token and by the construct currently being read (a [`Scope`]):
//! the scope decides which tokens end the current run of contents and which
//! stray delimiters are plain text.
//!
//! Submodules:
//! - `args`: argument lists and their whitespace rules
//! - `env`: named environments, opaque bodies and closing tags

mod args;
mod env;

use fxhash::FxHashSet;
use tracing::{debug, trace};

use crate::core::buffer::Buffer;
use crate::core::token::{Token, TokenCode};
use crate::core::tokenizer::Tokenizer;
use crate::core::tree::{EnvKind, Expr, GroupKind, NodeId, TexArgs, TexTree};
use crate::data::constants::{is_skip_env, BEGIN_KEYWORD, END_KEYWORD, ITEM_KEYWORD};
use crate::data::signatures::{command_signature, ITEM_SIGNATURE};
use crate::utils::error::{TexError, TexResult};
use crate::utils::position::Location;

// =============================================================================
// Parse Options
// =============================================================================

/// How the reader reacts to environments that are never closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tolerance {
    /// Fail on the first unterminated construct
    #[default]
    Strict,
    /// Keep partially read environments and record a warning
    Lenient,
}

impl Tolerance {
    /// Map a numeric tolerance level: `0` is strict, anything else lenient.
    pub fn from_level(level: u8) -> Self {
        if level == 0 {
            Tolerance::Strict
        } else {
            Tolerance::Lenient
        }
    }

    pub fn level(self) -> u8 {
        match self {
            Tolerance::Strict => 0,
            Tolerance::Lenient => 1,
        }
    }
}

/// Options for parsing LaTeX source
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    /// Reaction to unclosed environments
    /// Default: strict
    pub tolerance: Tolerance,

    /// Environments read as opaque text in addition to the built-in list
    /// (verbatim, math and alignment bodies)
    /// Default: empty
    pub skip_envs: FxHashSet<String>,
}

impl ParseOptions {
    /// Create new options with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail fast on any unterminated construct
    pub fn strict() -> Self {
        Self::default()
    }

    /// Best-effort parsing that returns partial environments
    pub fn lenient() -> Self {
        Self {
            tolerance: Tolerance::Lenient,
            ..Self::default()
        }
    }

    pub fn with_tolerance(mut self, tolerance: Tolerance) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Treat another environment's body as opaque text
    pub fn with_skip_env(mut self, name: impl Into<String>) -> Self {
        self.skip_envs.insert(name.into());
        self
    }

    pub fn is_lenient(&self) -> bool {
        self.tolerance == Tolerance::Lenient
    }

    pub fn is_skip_env(&self, name: &str) -> bool {
        is_skip_env(name) || self.skip_envs.contains(name)
    }
}

// =============================================================================
// Parser
// =============================================================================

/// The construct whose contents are being read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Scope {
    /// Whole document, ends at end of input
    Top,
    /// Named environment body, ends at any `\end`
    Env,
    /// `{...}`, ends at `}`
    Brace,
    /// `[...]`, ends at `]`; a `}` or `\end` makes the group invalid
    Bracket,
    /// `\item` body, ends at `\item`, `\end` or an unmatched `}`
    Item,
}

pub struct Parser<'a> {
    source: &'a str,
    tokens: Buffer<Tokenizer<'a>>,
    tree: TexTree,
    options: &'a ParseOptions,
    /// Source offsets of `[` tokens that no `]` closes
    unclosed_brackets: FxHashSet<usize>,
}

/// Whether `token` is the command `\name`.
pub(crate) fn is_command(token: &Token, name: &str) -> bool {
    token.code() == TokenCode::Command && token.text().strip_prefix('\\') == Some(name)
}

impl<'a> Parser<'a> {
    fn new(source: &'a str, options: &'a ParseOptions) -> Self {
        Self {
            source,
            tokens: Buffer::new(Tokenizer::new(source)),
            tree: TexTree::empty(source, options),
            options,
            unclosed_brackets: FxHashSet::default(),
        }
    }

    /// Parse a complete source text.
    pub fn parse(source: &str, options: &ParseOptions) -> TexResult<TexTree> {
        debug!(
            len = source.len(),
            tolerance = options.tolerance.level(),
            "parsing LaTeX source"
        );
        let mut parser = Parser::new(source, options);
        let contents = parser.read_contents(Scope::Top)?;
        parser.tree.finish(contents);
        debug!(
            nodes = parser.tree.node_count(),
            warnings = parser.tree.warnings().len(),
            "parse finished"
        );
        Ok(parser.tree)
    }

    /// Parse text that must be exactly one `{...}` or `[...]` group.
    pub(crate) fn parse_argument(source: &str, options: &ParseOptions) -> TexResult<TexTree> {
        let delimited = matches!(
            (source.chars().next(), source.chars().last()),
            (Some('{'), Some('}')) | (Some('['), Some(']'))
        );
        if !delimited || source.len() < 2 {
            return Err(TexError::malformed(source));
        }
        let mut parser = Parser::new(source, options);
        let open = parser
            .tokens
            .next()
            .ok_or_else(|| TexError::malformed(source))?;
        let group = match open.code() {
            TokenCode::GroupBegin => parser
                .read_brace_group(open)
                .map_err(|_| TexError::malformed(source))?,
            TokenCode::BracketBegin => parser
                .try_bracket_group(open)
                .map_err(|_| TexError::malformed(source))?
                .ok_or_else(|| TexError::malformed(source))?,
            _ => return Err(TexError::malformed(source)),
        };
        if parser.tokens.has_next() {
            return Err(TexError::malformed(source));
        }
        parser.tree.finish(vec![group]);
        Ok(parser.tree)
    }

    fn locate(&self, offset: usize) -> Location {
        self.tree.locate(offset)
    }

    fn alloc_text(&mut self, token: Token) -> NodeId {
        let position = token.position();
        self.tree.alloc(Expr::Text(token), Some(position))
    }

    fn alloc_command(&mut self, name: &str, args: TexArgs, position: usize) -> NodeId {
        self.tree.alloc(
            Expr::Command {
                name: name.to_string(),
                args,
                extra: Vec::new(),
            },
            Some(position),
        )
    }

    /// Read expressions until the scope ends or input runs out.
    ///
    /// The token that ends the scope is left unconsumed. Adjacent text,
    /// whitespace and stray delimiters merge into a single text leaf.
    pub(crate) fn read_contents(&mut self, scope: Scope) -> TexResult<Vec<NodeId>> {
        let mut contents = Vec::new();
        let mut pending: Option<Token> = None;

        loop {
            let Some((code, is_end, is_item)) = self.tokens.peek().map(|t| {
                (
                    t.code(),
                    is_command(t, END_KEYWORD),
                    is_command(t, ITEM_KEYWORD),
                )
            }) else {
                break;
            };

            match (scope, code) {
                (Scope::Brace | Scope::Bracket | Scope::Item, TokenCode::GroupEnd) => break,
                (Scope::Bracket, TokenCode::BracketEnd) => break,
                _ => {}
            }
            if is_end && matches!(scope, Scope::Env | Scope::Item | Scope::Bracket) {
                break;
            }
            if is_item && scope == Scope::Item {
                break;
            }
            if is_end && !self.options.is_lenient() {
                return Err(self.stray_end());
            }

            let Some(token) = self.tokens.next() else {
                break;
            };
            if is_textual(code) {
                match pending.as_mut() {
                    Some(text) => *text += &token,
                    None => pending = Some(token.with_code(TokenCode::Text)),
                }
                continue;
            }
            if let Some(text) = pending.take() {
                contents.push(self.alloc_text(text));
            }
            let node = self.read_expr(token)?;
            contents.push(node);
        }

        if let Some(text) = pending.take() {
            contents.push(self.alloc_text(text));
        }
        Ok(contents)
    }

    /// Read the expression starting with `token` (already consumed).
    fn read_expr(&mut self, token: Token) -> TexResult<NodeId> {
        match token.code() {
            TokenCode::MathSwitch | TokenCode::DisplayMathSwitch | TokenCode::MathGroupBegin => {
                self.read_math(token)
            }
            TokenCode::GroupBegin => self.read_brace_group(token),
            TokenCode::Command => self.read_command(token),
            TokenCode::PunctuationCommand => {
                let name = token.text().trim_start_matches('\\').to_string();
                let position = token.position();
                Ok(self.alloc_command(&name, TexArgs::new(), position))
            }
            _ => Ok(self.alloc_text(token)),
        }
    }

    fn read_command(&mut self, token: Token) -> TexResult<NodeId> {
        let name = token.text().strip_prefix('\\').unwrap_or_default().to_string();
        match name.as_str() {
            BEGIN_KEYWORD => self.read_env(token),
            ITEM_KEYWORD => {
                let args = self.read_args(Some(ITEM_SIGNATURE))?;
                let extra = self.read_contents(Scope::Item)?;
                Ok(self.tree.alloc(
                    Expr::Command { name, args, extra },
                    Some(token.position()),
                ))
            }
            _ => {
                let args = self.read_args(command_signature(&name))?;
                Ok(self.alloc_command(&name, args, token.position()))
            }
        }
    }

    /// Read a `{...}` group whose opening brace was consumed.
    fn read_brace_group(&mut self, open: Token) -> TexResult<NodeId> {
        let contents = self.read_contents(Scope::Brace)?;
        match self.tokens.next() {
            Some(close) if close.code() == TokenCode::GroupEnd => Ok(self.tree.alloc(
                Expr::Group {
                    kind: GroupKind::Brace,
                    contents,
                },
                Some(open.position()),
            )),
            other => Err(TexError::unterminated(
                "}",
                other.map(|t| t.text().to_string()),
                self.locate(open.position()),
            )),
        }
    }

    /// Read a `[...]` group whose opening bracket was consumed.
    ///
    /// Returns `None` when no matching `]` closes it; the caller rewinds.
    /// A bracket that failed once is not read again, so nested unclosed
    /// brackets do not multiply the work.
    fn try_bracket_group(&mut self, open: Token) -> TexResult<Option<NodeId>> {
        if self.unclosed_brackets.contains(&open.position()) {
            return Ok(None);
        }
        let contents = self.read_contents(Scope::Bracket)?;
        if self.tokens.peek().map(Token::code) != Some(TokenCode::BracketEnd) {
            self.unclosed_brackets.insert(open.position());
            return Ok(None);
        }
        self.tokens.next();
        Ok(Some(self.tree.alloc(
            Expr::Group {
                kind: GroupKind::Bracket,
                contents,
            },
            Some(open.position()),
        )))
    }

    /// Read an opaque math body up to the delimiter matching `open`.
    fn read_math(&mut self, open: Token) -> TexResult<NodeId> {
        // Halves of a split `$$` keep their token code, so go by text.
        let kind = match open.text() {
            "$" => EnvKind::InlineMath,
            "$$" => EnvKind::DisplayMath,
            r"\(" => EnvKind::ParenMath,
            _ => EnvKind::BracketMath,
        };
        let Some((name, _, end)) = kind.math_delimiters() else {
            return Ok(self.alloc_text(open));
        };

        enum Step {
            Close,
            Split,
            Take,
            Eof,
        }

        let mut body: Vec<Token> = Vec::new();
        let mut split = false;
        loop {
            let step = match self.tokens.peek() {
                None => Step::Eof,
                Some(t) if t.text() == end => Step::Close,
                Some(t) if kind == EnvKind::InlineMath && t.code() == TokenCode::DisplayMathSwitch => {
                    Step::Split
                }
                Some(_) => Step::Take,
            };
            match step {
                Step::Close => break,
                Step::Split => {
                    trace!("splitting $$ to close inline math");
                    split = self.tokens.split_next(1);
                }
                Step::Take => body.extend(self.tokens.next()),
                Step::Eof => {
                    return Err(TexError::unterminated(
                        end,
                        None,
                        self.locate(open.position()),
                    ))
                }
            }
        }
        let close = self.tokens.next().map(|t| t.text().to_string()).unwrap_or_default();
        if split {
            self.repair_display_switch();
        }

        let contents = match body.first() {
            Some(first) => {
                let text = Token::join(&body, first.position(), TokenCode::Text);
                vec![self.alloc_text(text)]
            }
            None => Vec::new(),
        };
        Ok(self.tree.alloc(
            Expr::Environment {
                name: name.to_string(),
                kind,
                begin: open.text().to_string(),
                end: close,
                args: TexArgs::new(),
                contents,
            },
            Some(open.position()),
        ))
    }

    /// After `$$` was split to close inline math, its leftover `$` pairs with
    /// a directly following `$` into a display switch, as in `$a$$$b$$`.
    fn repair_display_switch(&mut self) {
        let rest_end = match self.tokens.peek() {
            Some(rest) if rest.text() == "$" => rest.end(),
            _ => return,
        };
        let adjacent = self.tokens.peek_at(1).is_some_and(|next| {
            next.code() == TokenCode::MathSwitch && next.position() == rest_end
        });
        if adjacent {
            trace!("re-pairing $ $ into $$");
            self.tokens.join_next(2, TokenCode::DisplayMathSwitch);
        }
    }
}

/// Tokens that become part of a text leaf when they reach a body.
fn is_textual(code: TokenCode) -> bool {
    matches!(
        code,
        TokenCode::Text
            | TokenCode::Spacer
            | TokenCode::EscapedSymbol
            | TokenCode::BracketBegin
            | TokenCode::BracketEnd
            | TokenCode::GroupEnd
            | TokenCode::MathGroupEnd
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(source: &str) -> TexTree {
        Parser::parse(source, &ParseOptions::default()).unwrap()
    }

    fn top_names(tree: &TexTree) -> Vec<String> {
        tree.root()
            .contents()
            .map(|n| n.name().to_string())
            .collect()
    }

    #[test]
    fn test_tolerance_levels() {
        assert_eq!(Tolerance::from_level(0), Tolerance::Strict);
        assert_eq!(Tolerance::from_level(1), Tolerance::Lenient);
        assert_eq!(Tolerance::Lenient.level(), 1);
    }

    #[test]
    fn test_options_builders() {
        let opts = ParseOptions::lenient().with_skip_env("tikzpicture");
        assert!(opts.is_lenient());
        assert!(opts.is_skip_env("tikzpicture"));
        assert!(opts.is_skip_env("verbatim"));
        assert!(!ParseOptions::strict().is_lenient());
    }

    #[test]
    fn test_text_tokens_merge() {
        let tree = parse(r"Hello, world \$5 ] } more");
        assert_eq!(top_names(&tree), vec!["text"]);
    }

    #[test]
    fn test_comment_is_separate_leaf() {
        let tree = parse("a %c\nb");
        let texts: Vec<String> = tree.root().contents().map(|n| n.to_string()).collect();
        assert_eq!(texts, vec!["a ", "%c", "\nb"]);
    }

    #[test]
    fn test_inline_math_is_opaque() {
        let tree = parse(r"$\frac{a}{b}$");
        let math = tree.root().contents().next().unwrap();
        assert_eq!(math.name(), "$");
        let inner: Vec<String> = math.contents().map(|n| n.to_string()).collect();
        assert_eq!(inner, vec![r"\frac{a}{b}"]);
        assert_eq!(tree.count("frac", &[]), 0);
    }

    #[test]
    fn test_math_delimiter_names() {
        let tree = parse(r"\(x\) \[y\] $$z$$");
        let names: Vec<String> = tree.root().children().map(|n| n.name().to_string()).collect();
        assert_eq!(names, vec!["math", "displaymath", "$$"]);
        assert_eq!(tree.to_string(), r"\(x\) \[y\] $$z$$");
    }

    #[test]
    fn test_double_dollar_closes_inline_math() {
        let tree = parse("$a$$b$");
        let names: Vec<String> = tree.root().children().map(|n| n.name().to_string()).collect();
        assert_eq!(names, vec!["$", "$"]);
        assert_eq!(tree.to_string(), "$a$$b$");
    }

    #[test]
    fn test_leftover_dollar_opens_display_math() {
        let tree = parse("$a$$$b$$");
        let names: Vec<String> = tree.root().children().map(|n| n.name().to_string()).collect();
        assert_eq!(names, vec!["$", "$$"]);
        let display = tree.find("$$", &[]).unwrap();
        assert_eq!(display.to_string(), "$$b$$");
        assert_eq!(tree.to_string(), "$a$$$b$$");
    }

    #[test]
    fn test_unterminated_math_always_fails() {
        let err = Parser::parse("$x", &ParseOptions::lenient()).unwrap_err();
        assert!(matches!(err, TexError::Unterminated { ref expected, .. } if expected == "$"));
    }

    #[test]
    fn test_unclosed_brace_fails() {
        let err = Parser::parse(r"\textbf{x", &ParseOptions::lenient()).unwrap_err();
        match err {
            TexError::Unterminated {
                expected, location, ..
            } => {
                assert_eq!(expected, "}");
                assert_eq!(location.offset, 7);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_body_brace_group() {
        let tree = parse("{a}");
        assert_eq!(top_names(&tree), vec!["BraceGroup"]);
    }

    #[test]
    fn test_punctuation_command_node() {
        let tree = parse(r"\left(x\right)");
        let first = tree.root().contents().next().unwrap();
        assert_eq!(first.name(), "left(");
        assert_eq!(tree.to_string(), r"\left(x\right)");
    }

    #[test]
    fn test_parse_argument() {
        let tree = Parser::parse_argument("[opt]", &ParseOptions::default()).unwrap();
        assert_eq!(top_names(&tree), vec!["BracketGroup"]);
        assert!(Parser::parse_argument("{a}{b}", &ParseOptions::default()).is_err());
        assert!(Parser::parse_argument("{a]", &ParseOptions::default()).is_err());
        assert!(Parser::parse_argument("x", &ParseOptions::default()).is_err());
    }
}
