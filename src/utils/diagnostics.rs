//! Structural diagnostics for LaTeX sources
//!
//! This module reports problems the parser can see in a document:
//!
//! - Unclosed or mismatched environments and groups
//! - Stray `\end{..}` tags
//! - Known commands written with too few required arguments
//!
//! ## Example
//!
//! ```rust
//! use texloom::diagnostics::check_latex;
//!
//! let diagnostics = check_latex(r"\begin{foo}");
//! assert!(diagnostics.has_errors());
//! ```

use std::fmt;

use crate::core::node::{NodeKind, TexNode};
use crate::core::reader::{ParseOptions, Parser, Tolerance};
use crate::data::signatures::command_signature;
use crate::utils::error::TexError;
use crate::utils::position::Location;

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DiagnosticLevel {
    /// The document parses, but likely not as intended
    Warning,
    /// The document does not parse in strict mode
    Error,
}

impl DiagnosticLevel {
    fn label(self) -> &'static str {
        match self {
            DiagnosticLevel::Warning => "warning",
            DiagnosticLevel::Error => "error",
        }
    }

    /// ANSI color used by [`format_diagnostics`]
    fn color(self) -> &'static str {
        match self {
            DiagnosticLevel::Warning => "\x1b[33m",
            DiagnosticLevel::Error => "\x1b[31m",
        }
    }
}

impl fmt::Display for DiagnosticLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A problem found in the source, with where it sits and how to fix it
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub level: DiagnosticLevel,
    pub message: String,
    /// 1-indexed line
    pub line: Option<usize>,
    /// 1-indexed byte column
    pub column: Option<usize>,
    /// Byte range `(start, end)` of the offending text
    pub span: Option<(usize, usize)>,
    /// The full source line holding the problem
    pub source_text: Option<String>,
    pub suggestion: Option<String>,
}

impl Diagnostic {
    pub fn new(level: DiagnosticLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            line: None,
            column: None,
            span: None,
            source_text: None,
            suggestion: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(DiagnosticLevel::Error, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(DiagnosticLevel::Warning, message)
    }

    /// Point at `location`, keeping its source line for display
    pub fn at(mut self, input: &str, location: Location) -> Self {
        self.line = Some(location.line + 1);
        self.column = Some(location.column + 1);
        self.source_text = input.lines().nth(location.line).map(str::to_string);
        self
    }

    pub fn with_span(mut self, start: usize, end: usize) -> Self {
        self.span = Some((start, end.max(start)));
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Caret line under the span, clipped to the displayed source line
    fn underline(&self) -> Option<String> {
        let source = self.source_text.as_deref()?;
        let start = self.column? - 1;
        let (from, to) = self.span?;
        let marked = source.get(start..)?;
        let width = marked
            .char_indices()
            .take_while(|&(i, _)| i < to - from)
            .count()
            .max(1);
        let pad = source.get(..start)?.chars().count();
        Some(format!("{}{}", " ".repeat(pad), "^".repeat(width)))
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.level, self.message)?;
        if let (Some(line), Some(column)) = (self.line, self.column) {
            write!(f, "\n  --> line {}:{}", line, column)?;
        }
        if let Some(source) = &self.source_text {
            write!(f, "\n  |\n  | {}", source)?;
            if let Some(carets) = self.underline() {
                write!(f, "\n  | {}", carets)?;
            }
        }
        if let Some(suggestion) = &self.suggestion {
            write!(f, "\n  = help: {}", suggestion)?;
        }
        Ok(())
    }
}

/// Diagnostics of one check, with per-level counts
#[derive(Debug, Default)]
pub struct CheckResult {
    pub diagnostics: Vec<Diagnostic>,
    pub errors: usize,
    pub warnings: usize,
}

impl CheckResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, diag: Diagnostic) {
        match diag.level {
            DiagnosticLevel::Error => self.errors += 1,
            DiagnosticLevel::Warning => self.warnings += 1,
        }
        self.diagnostics.push(diag);
    }

    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// One-line count of errors and warnings
    pub fn summary(&self) -> String {
        let counts: Vec<String> = [(self.errors, "error"), (self.warnings, "warning")]
            .into_iter()
            .filter(|&(n, _)| n > 0)
            .map(|(n, word)| format!("{} {}{}", n, word, if n == 1 { "" } else { "s" }))
            .collect();
        if counts.is_empty() {
            "no issues found".to_string()
        } else {
            counts.join(", ")
        }
    }
}

/// Check LaTeX source for issues with the default options
pub fn check_latex(input: &str) -> CheckResult {
    check_latex_with_options(input, &ParseOptions::default())
}

/// Check LaTeX source for issues
///
/// The tolerance in `options` is ignored: the source is always parsed
/// strictly first, and leniently when that fails, so that both the first
/// error and the later problems are reported. Extra opaque environments in
/// `options` are honored by both passes.
pub fn check_latex_with_options(input: &str, options: &ParseOptions) -> CheckResult {
    let mut result = CheckResult::new();

    let strict = Parser::parse(input, &options.clone().with_tolerance(Tolerance::Strict));
    let error_at = match &strict {
        Ok(_) => None,
        Err(err) => {
            result.add(error_diagnostic(input, err));
            err.location().map(|location| location.offset)
        }
    };

    let tree = match strict {
        Ok(tree) => tree,
        // Unclosed groups and math fail in either mode.
        Err(_) => {
            let lenient = options.clone().with_tolerance(Tolerance::Lenient);
            match Parser::parse(input, &lenient) {
                Ok(tree) => tree,
                Err(_) => return result,
            }
        }
    };

    for warning in tree.warnings() {
        if Some(warning.location.offset) == error_at {
            continue;
        }
        result.add(Diagnostic::warning(warning.message.clone()).at(input, warning.location));
    }

    for node in tree.root().descendants() {
        check_arguments(input, node, &mut result);
    }

    result
}

fn error_diagnostic(input: &str, err: &TexError) -> Diagnostic {
    let diag = Diagnostic::error(err.to_string());
    match err {
        // The opener is never closed, so everything after it is suspect.
        TexError::Unterminated {
            expected, location, ..
        } => diag
            .at(input, *location)
            .with_span(location.offset, input.len())
            .with_suggestion(format!("Add {}", expected)),
        TexError::UnexpectedEnd { name, location } => {
            let tag_end = input
                .get(location.offset..)
                .and_then(|rest| rest.find('}'))
                .map_or(input.len(), |i| location.offset + i + 1);
            diag.at(input, *location)
                .with_span(location.offset, tag_end)
                .with_suggestion(format!(
                    "Remove the tag or add \\begin{{{}}} before it",
                    name
                ))
        }
        _ => diag,
    }
}

/// Warn about a known command written with fewer required arguments than
/// it takes.
fn check_arguments(input: &str, node: TexNode<'_>, result: &mut CheckResult) {
    if node.kind() != NodeKind::Command {
        return;
    }
    let Some(signature) = command_signature(node.name()) else {
        return;
    };
    let found = node
        .args()
        .filter(|arg| matches!(arg.kind(), NodeKind::Group(kind) if kind.is_required()))
        .count();
    if found >= signature.required {
        return;
    }

    let mut diag = Diagnostic::warning(format!(
        "\\{} expects {} required argument{}, found {}",
        node.name(),
        signature.required,
        if signature.required == 1 { "" } else { "s" },
        found
    ))
    .with_suggestion("Add the missing {...} argument");
    if let (Some(location), Some(start)) = (node.location(), node.position()) {
        let written = node.to_string().len();
        diag = diag.at(input, location).with_span(start, start + written);
    }
    result.add(diag);
}

/// Format check results for terminal output
pub fn format_diagnostics(result: &CheckResult, use_color: bool) -> String {
    const RESET: &str = "\x1b[0m";
    const GREEN: &str = "\x1b[32m";

    let mut blocks: Vec<String> = result
        .diagnostics
        .iter()
        .map(|diag| {
            if use_color {
                format!("{}{}{}", diag.level.color(), diag, RESET)
            } else {
                diag.to_string()
            }
        })
        .collect();

    let summary = format!("Summary: {}", result.summary());
    blocks.push(if use_color {
        let color = if result.has_errors() {
            DiagnosticLevel::Error.color()
        } else if result.warnings > 0 {
            DiagnosticLevel::Warning.color()
        } else {
            GREEN
        };
        format!("{}{}{}", color, summary, RESET)
    } else {
        summary
    });

    blocks.join("\n\n")
}
