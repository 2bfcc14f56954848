//! # texloom
//!
//! Lossless LaTeX parser with a navigable, editable expression tree.
//!
//! ## Features
//!
//! - **Exact Round Trip**: writing a parsed tree back out reproduces the input
//!   byte for byte, whitespace and comments included
//! - **Argument Aware**: known commands read exactly their signature; unknown
//!   ones take every `{...}`/`[...]` group that follows
//! - **Opaque Bodies**: verbatim-like environments are kept as raw text
//! - **Search**: find commands and environments by name, argument or string
//! - **Editing**: insert, move, replace and delete nodes without disturbing
//!   the text around them
//! - **Tolerance**: strict parsing fails on unclosed environments; lenient
//!   parsing keeps a partial tree and records warnings
//!
//! ## Usage Examples
//!
//! ### Searching
//!
//! ```rust
//! use texloom::{parse, Attr};
//!
//! let tree = parse(r"\section{Intro}\label{sec:intro} See \ref{sec:intro}.").unwrap();
//! let section = tree.find("section", &[]).unwrap();
//! assert_eq!(section.string(), Some("Intro".to_string()));
//! assert_eq!(tree.count("ref", &[Attr::Arg("sec:intro")]), 1);
//! ```
//!
//! ### Editing
//!
//! ```rust
//! use texloom::parse;
//!
//! let mut tree = parse(r"\textit{X}\textbf{Y}\textit{Z}").unwrap();
//! let bold = tree.find("textbf", &[]).unwrap().id();
//! tree.node_mut(bold).unwrap().delete().unwrap();
//! assert_eq!(tree.to_string(), r"\textit{X}\textit{Z}");
//! ```

/// Core parsing modules
pub mod core;

/// Data layer - static tables
pub mod data;

/// Utility modules
pub mod utils;

pub use core::{
    categorize, tokenize, ArgSlot, Attr, CategoryCode, Child, EnvKind, Expr, GroupKind, NodeId,
    NodeKind, ParseOptions, Parser, TexArgs, TexNode, TexNodeMut, TexTree, Token, TokenCode,
    Tolerance,
};

// Re-export utilities
pub use utils::diagnostics;
pub use utils::diagnostics::{
    check_latex, check_latex_with_options, format_diagnostics, CheckResult,
};
pub use utils::error::{ParseWarning, TexError, TexResult};
pub use utils::position::Location;

/// Parse a LaTeX document in strict mode.
pub fn parse(source: &str) -> TexResult<TexTree> {
    Parser::parse(source, &ParseOptions::default())
}

/// Parse a LaTeX document with custom options
pub fn parse_with_options(source: &str, options: &ParseOptions) -> TexResult<TexTree> {
    Parser::parse(source, options)
}

/// Parse a document supplied as a sequence of lines
///
/// Lines are concatenated verbatim, so they must keep their own line
/// endings.
pub fn parse_lines<I, S>(lines: I, options: &ParseOptions) -> TexResult<TexTree>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let source: String = lines.into_iter().map(|line| line.as_ref().to_string()).collect();
    Parser::parse(&source, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_round_trip() {
        let src = "\\documentclass{article}\n\\begin{document}\nHi % note\n\\end{document}\n";
        assert_eq!(parse(src).unwrap().to_string(), src);
    }

    #[test]
    fn test_parse_with_options_lenient() {
        let src = r"\begin{itemize}\item a";
        assert!(parse(src).is_err());
        let tree = parse_with_options(src, &ParseOptions::lenient()).unwrap();
        assert_eq!(tree.warnings().len(), 1);
        assert_eq!(tree.to_string(), src);
    }

    #[test]
    fn test_parse_lines_concatenates_verbatim() {
        let lines = ["\\begin{center}\n", "x\n", "\\end{center}"];
        let tree = parse_lines(lines, &ParseOptions::default()).unwrap();
        assert_eq!(tree.to_string(), lines.concat());
        assert_eq!(tree.find("center", &[]).and_then(|n| n.line_col()), Some((0, 0)));
    }

    #[test]
    fn test_parse_lines_owned_strings() {
        let lines = vec![String::from("a "), String::from(r"\b")];
        let tree = parse_lines(lines, &ParseOptions::default()).unwrap();
        assert_eq!(tree.count("b", &[]), 1);
    }
}
