//! Argument reading
//!
//! After a command name (or `\begin{name}`), argument groups are read while
//! the command's signature still expects them. Commands without a known
//! signature take every `{...}` and `[...]` group that follows.
//!
//! Whitespace rules: one whitespace run holding at most one line break may
//! precede each argument. A blank line ends the argument list, and so does
//! anything that is not an argument; the cursor is then rewound so that the
//! whitespace becomes ordinary body text.

use tracing::trace;

use crate::core::token::{Token, TokenCode};
use crate::core::tree::{Expr, GroupKind, NodeId, TexArgs};
use crate::data::constants::{BEGIN_KEYWORD, END_KEYWORD, ITEM_KEYWORD};
use crate::data::signatures::Signature;
use crate::utils::error::TexResult;

use super::{is_command, Parser};

impl Parser<'_> {
    /// Read the arguments following a command.
    ///
    /// With a signature, `[...]` groups count as optional arguments and are
    /// not accepted once every required argument has been read; a required
    /// argument may also be a single character or a bare command token
    /// written without braces (`\frac12`, `\frac\alpha\beta`).
    pub(super) fn read_args(&mut self, signature: Option<Signature>) -> TexResult<TexArgs> {
        let mut args = TexArgs::new();
        let constrained = signature.is_some();
        let (mut required, mut optional) = match signature {
            Some(sig) => (sig.required, sig.optional),
            None => (usize::MAX, usize::MAX),
        };
        let mut read_required = false;

        loop {
            if constrained && required == 0 && (optional == 0 || read_required) {
                break;
            }
            let mark = self.tokens.position();
            let spacer = self.take_spacer();
            let Some(next) = self.tokens.peek() else {
                self.rewind_args(mark, spacer.is_some())?;
                break;
            };
            let code = next.code();
            let implicit_command = code == TokenCode::Command
                && ![BEGIN_KEYWORD, END_KEYWORD, ITEM_KEYWORD]
                    .iter()
                    .any(|keyword| is_command(next, keyword));

            let arg = match code {
                TokenCode::BracketBegin if optional > 0 => {
                    let warnings = self.tree.warnings().len();
                    let Some(open) = self.tokens.next() else {
                        break;
                    };
                    match self.try_bracket_group(open)? {
                        Some(id) => {
                            optional = optional.saturating_sub(1);
                            Some(id)
                        }
                        None => {
                            trace!("unclosed optional argument re-read as text");
                            self.tree.truncate_warnings(warnings);
                            None
                        }
                    }
                }
                TokenCode::GroupBegin if required > 0 => {
                    let Some(open) = self.tokens.next() else {
                        break;
                    };
                    let id = self.read_brace_group(open)?;
                    required = required.saturating_sub(1);
                    read_required = true;
                    Some(id)
                }
                TokenCode::Text if constrained && required > 0 => {
                    let id = self.read_implicit_char();
                    required -= 1;
                    read_required = true;
                    id
                }
                TokenCode::Command if constrained && required > 0 && implicit_command => {
                    let Some(token) = self.tokens.next() else {
                        break;
                    };
                    // The command token alone is the argument, as in TeX.
                    let position = token.position();
                    let name = token.text().trim_start_matches('\\').to_string();
                    let command = self.alloc_command(&name, TexArgs::new(), position);
                    required -= 1;
                    read_required = true;
                    Some(self.tree.alloc(
                        Expr::Group {
                            kind: GroupKind::Implicit,
                            contents: vec![command],
                        },
                        Some(position),
                    ))
                }
                _ => None,
            };

            match arg {
                Some(id) => {
                    if let Some(space) = spacer {
                        args.push_raw(space);
                    }
                    args.push(id);
                }
                None => {
                    self.rewind_args(mark, true)?;
                    break;
                }
            }
        }
        Ok(args)
    }

    /// Consume a whitespace token if it holds at most one line break.
    pub(super) fn take_spacer(&mut self) -> Option<Token> {
        match self.tokens.peek() {
            Some(t) if t.code() == TokenCode::Spacer && t.line_breaks() <= 1 => self.tokens.next(),
            _ => None,
        }
    }

    /// Take the first character of the next text token as an argument.
    fn read_implicit_char(&mut self) -> Option<NodeId> {
        let first = self.tokens.peek()?.text().chars().next()?.len_utf8();
        self.tokens.split_next(first);
        let token = self.tokens.next()?;
        let position = token.position();
        let text = self.alloc_text(token);
        Some(self.tree.alloc(
            Expr::Group {
                kind: GroupKind::Implicit,
                contents: vec![text],
            },
            Some(position),
        ))
    }

    fn rewind_args(&mut self, mark: usize, traced: bool) -> TexResult<()> {
        if traced && self.tokens.position() > mark {
            trace!(to = mark, "argument reading rolled back");
        }
        self.tokens.rewind_to(mark)
    }
}

#[cfg(test)]
mod tests {
    use crate::core::reader::{ParseOptions, Parser};
    use crate::core::tree::TexTree;
    use pretty_assertions::assert_eq;

    fn parse(source: &str) -> TexTree {
        Parser::parse(source, &ParseOptions::default()).unwrap()
    }

    fn args_of(tree: &TexTree, name: &str) -> Vec<String> {
        tree.find(name, &[])
            .map(|n| n.args().map(|a| a.to_string()).collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_signed_command_stops_after_signature() {
        let tree = parse(r"\section{A}{B}");
        assert_eq!(args_of(&tree, "section"), vec!["{A}"]);
        assert_eq!(tree.root().contents().count(), 2);
    }

    #[test]
    fn test_optional_before_required() {
        let tree = parse(r"\section[Short]{Long title}");
        assert_eq!(args_of(&tree, "section"), vec!["[Short]", "{Long title}"]);
    }

    #[test]
    fn test_trailing_optional_not_taken() {
        let tree = parse(r"\section{Long}[x]");
        assert_eq!(args_of(&tree, "section"), vec!["{Long}"]);
        assert_eq!(tree.to_string(), r"\section{Long}[x]");
    }

    #[test]
    fn test_optional_between_required() {
        let tree = parse(r"\newcommand{\foo}[1]{#1!}");
        assert_eq!(args_of(&tree, "newcommand"), vec![r"{\foo}", "[1]", "{#1!}"]);
    }

    #[test]
    fn test_unsigned_takes_any_mix() {
        let tree = parse(r"\mycmd{a}[b]{c} d");
        assert_eq!(args_of(&tree, "mycmd"), vec!["{a}", "[b]", "{c}"]);
    }

    #[test]
    fn test_implicit_char_arguments() {
        let tree = parse(r"\frac12 rest");
        assert_eq!(args_of(&tree, "frac"), vec!["1", "2"]);
        assert_eq!(tree.to_string(), r"\frac12 rest");
    }

    #[test]
    fn test_implicit_command_argument() {
        let tree = parse(r"\frac\alpha{b}");
        assert_eq!(args_of(&tree, "frac"), vec![r"\alpha", "{b}"]);
    }

    #[test]
    fn test_unsigned_has_no_implicit_arguments() {
        let tree = parse(r"\mycmd ab");
        assert!(args_of(&tree, "mycmd").is_empty());
        assert_eq!(tree.to_string(), r"\mycmd ab");
    }

    #[test]
    fn test_single_line_break_tolerated() {
        let tree = parse("\\mytitle{Essay title}\n{Essay subheading.}");
        assert_eq!(args_of(&tree, "mytitle").len(), 2);
    }

    #[test]
    fn test_blank_line_breaks_association() {
        let src = "\\mytitle{Essay title}\n\n{Essay subheading.}";
        let tree = parse(src);
        assert_eq!(args_of(&tree, "mytitle").len(), 1);
        let names: Vec<String> = tree.root().contents().map(|n| n.name().to_string()).collect();
        assert_eq!(names, vec!["mytitle", "text", "BraceGroup"]);
        assert_eq!(tree.to_string(), src);
    }

    #[test]
    fn test_unclosed_optional_is_text() {
        let src = r"\item[oops \textbf{x}";
        let tree = parse(src);
        let item = tree.find("item", &[]).unwrap();
        assert_eq!(item.args().count(), 0);
        assert_eq!(tree.count("textbf", &[]), 1);
        assert_eq!(tree.to_string(), src);
    }

    #[test]
    fn test_unclosed_optional_stops_at_end() {
        let src = r"\begin{center}\mycmd [0,1) is half-open.\end{center}";
        let tree = parse(src);
        assert!(args_of(&tree, "mycmd").is_empty());
        assert_eq!(tree.find("center", &[]).unwrap().contents().count(), 2);
        assert_eq!(tree.to_string(), src);
    }

    #[test]
    fn test_item_interval_text() {
        let src = "\\begin{itemize}\\item [0,1) interval\n\\end{itemize}";
        let tree = parse(src);
        let item = tree.find("item", &[]).unwrap();
        assert_eq!(item.args().count(), 0);
        let body: String = item.extra().map(|n| n.to_string()).collect();
        assert_eq!(body, " [0,1) interval\n");
        assert_eq!(tree.to_string(), src);
    }

    #[test]
    fn test_nested_unclosed_optionals() {
        let src = r"\a[".repeat(40);
        let tree = parse(&src);
        assert_eq!(tree.count("a", &[]), 40);
        assert_eq!(tree.count("BracketGroup", &[]), 0);
        assert_eq!(tree.to_string(), src);
    }

    #[test]
    fn test_closed_optional_after_unclosed_one() {
        let src = r"\a[x \b[y] z";
        let tree = parse(src);
        assert!(args_of(&tree, "a").is_empty());
        assert_eq!(args_of(&tree, "b"), vec!["[y]"]);
        assert_eq!(tree.to_string(), src);
    }

    #[test]
    fn test_zero_argument_command_leaves_group() {
        let tree = parse(r"\noindent{x}");
        assert!(args_of(&tree, "noindent").is_empty());
        assert_eq!(tree.count("BraceGroup", &[]), 1);
    }

    #[test]
    fn test_whitespace_before_first_argument_kept() {
        let src = "\\textbf \n{x}";
        let tree = parse(src);
        assert_eq!(args_of(&tree, "textbf"), vec!["{x}"]);
        assert_eq!(tree.to_string(), src);
    }
}
