//! Named environments
//!
//! `\begin{name}` opens an environment whose body runs to the matching
//! `\end{name}`. Environments flagged as opaque (verbatim, math and alignment
//! bodies) are not tokenized at all: their end tag is located in the raw
//! source and the token stream resumes right after it.

use tracing::{trace, warn};

use crate::core::token::{Token, TokenCode};
use crate::core::tree::{EnvKind, Expr, NodeId, TexArgs};
use crate::data::constants::{BEGIN_KEYWORD, END_KEYWORD};
use crate::data::signatures::environment_signature;
use crate::utils::error::{ParseWarning, TexError, TexResult};
use crate::utils::position::Location;

use super::{is_command, Parser, Scope};

impl Parser<'_> {
    /// Read an environment; `begin` is the consumed `\begin` token.
    ///
    /// Without a following `{name}`, `\begin` is read as an ordinary command.
    pub(super) fn read_env(&mut self, begin: Token) -> TexResult<NodeId> {
        let mark = self.tokens.position();
        let Some((name, raw)) = self.read_env_name() else {
            self.tokens.rewind_to(mark)?;
            let args = self.read_args(None)?;
            return Ok(self.alloc_command(BEGIN_KEYWORD, args, begin.position()));
        };
        let begin_text = format!("{}{}", begin.text(), raw);

        if self.options.is_skip_env(&name) {
            return self.read_skip_env(begin, name, begin_text);
        }

        let args = self.read_args(environment_signature(&name))?;
        let contents = self.read_contents(Scope::Env)?;
        let end = self.read_env_end(&name, &begin)?;
        Ok(self.tree.alloc(
            Expr::Environment {
                name,
                kind: EnvKind::Named,
                begin: begin_text,
                end,
                args,
                contents,
            },
            Some(begin.position()),
        ))
    }

    /// Read `{name}` after `\begin` or `\end`, allowing a single spacer with
    /// at most one line break in between.
    ///
    /// Returns the trimmed name and the exact text consumed. On `None` the
    /// cursor is left wherever reading stopped; callers rewind.
    fn read_env_name(&mut self) -> Option<(String, String)> {
        let mut raw = String::new();
        if let Some(space) = self.take_spacer() {
            raw.push_str(space.text());
        }
        match self.tokens.next() {
            Some(open) if open.code() == TokenCode::GroupBegin => raw.push_str(open.text()),
            _ => return None,
        }

        let mut name = String::new();
        loop {
            let token = self.tokens.next()?;
            match token.code() {
                TokenCode::GroupEnd => {
                    raw.push_str(token.text());
                    break;
                }
                TokenCode::Text | TokenCode::Spacer => {
                    name.push_str(token.text());
                    raw.push_str(token.text());
                }
                _ => return None,
            }
        }

        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        Some((name.to_string(), raw))
    }

    /// Consume the `\end{name}` closing an environment.
    ///
    /// A missing or mismatched end tag is an error in strict mode. In
    /// lenient mode the environment is left unclosed, any mismatched tag
    /// stays in the stream for an enclosing environment, and a warning is
    /// recorded.
    fn read_env_end(&mut self, name: &str, begin: &Token) -> TexResult<String> {
        let mark = self.tokens.position();
        let found = match self.tokens.next() {
            Some(end) if is_command(&end, END_KEYWORD) => match self.read_env_name() {
                Some((other, raw)) if other == name => {
                    return Ok(format!("{}{}", end.text(), raw));
                }
                Some((_, raw)) => Some((format!("{}{}", end.text(), raw), end.position())),
                None => Some((end.text().to_string(), end.position())),
            },
            Some(other) => Some((other.text().to_string(), other.position())),
            None => None,
        };
        self.tokens.rewind_to(mark)?;

        let expected = format!("\\{}{{{}}}", END_KEYWORD, name);
        let location = match &found {
            Some((_, position)) => self.locate(*position),
            None => self.locate(begin.position()),
        };
        let found = found.map(|(text, _)| text);
        if !self.options.is_lenient() {
            return Err(TexError::unterminated(expected, found, location));
        }
        self.recover(name, found, location);
        Ok(String::new())
    }

    /// Read an opaque environment body straight from the source text.
    fn read_skip_env(&mut self, begin: Token, name: String, begin_text: String) -> TexResult<NodeId> {
        let source = self.source;
        let body_start = self
            .tokens
            .peek_at(-1)
            .map(Token::end)
            .unwrap_or_else(|| begin.end());
        let closing = format!("\\{}{{{}}}", END_KEYWORD, name);
        let rest = source.get(body_start..).unwrap_or_default();

        let (body, end, resume) = match rest.find(&closing) {
            Some(at) => (&rest[..at], closing.clone(), body_start + at + closing.len()),
            None => {
                let location = self.locate(begin.position());
                if !self.options.is_lenient() {
                    return Err(TexError::unterminated(closing, None, location));
                }
                self.recover(&name, None, location);
                (rest, String::new(), source.len())
            }
        };
        trace!(env = %name, resume, "skipped opaque environment body");
        self.tokens.discard_lookahead().seek(resume);

        let contents = if body.is_empty() {
            Vec::new()
        } else {
            vec![self.alloc_text(Token::new(body, body_start, TokenCode::Text))]
        };
        Ok(self.tree.alloc(
            Expr::Environment {
                name,
                kind: EnvKind::Named,
                begin: begin_text,
                end,
                args: TexArgs::new(),
                contents,
            },
            Some(begin.position()),
        ))
    }

    fn recover(&mut self, name: &str, found: Option<String>, location: Location) {
        let message = match &found {
            Some(other) => format!("environment `{}` closed by {}", name, other),
            None => format!("environment `{}` is never closed", name),
        };
        warn!(%location, "{}", message);
        self.tree.push_warning(ParseWarning { message, location });
    }

    /// The error for an `\end` that closes nothing.
    pub(super) fn stray_end(&mut self) -> TexError {
        let mark = self.tokens.position();
        let (name, position) = match self.tokens.next() {
            Some(end) => {
                let name = self
                    .read_env_name()
                    .map(|(name, _)| name)
                    .unwrap_or_default();
                (name, end.position())
            }
            None => (String::new(), self.source.len()),
        };
        // The cursor only moved forward from `mark`.
        let _ = self.tokens.rewind_to(mark);
        TexError::unexpected_end(name, self.locate(position))
    }
}
