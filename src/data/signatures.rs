//! Argument signatures for well-known commands and environments
//!
//! A signature says how many `[optional]` and `{required}` arguments a name
//! takes. Names missing from these tables consume every argument group that
//! is syntactically present.

use phf::phf_map;

/// Expected argument counts for a command or environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signature {
    pub required: usize,
    pub optional: usize,
}

impl Signature {
    pub const fn new(required: usize, optional: usize) -> Self {
        Self { required, optional }
    }

    /// A signature taking no arguments at all.
    pub const NONE: Signature = Signature::new(0, 0);

    pub fn takes_arguments(&self) -> bool {
        self.required > 0 || self.optional > 0
    }
}

/// Command signatures, keyed by name without the escape character.
pub static COMMAND_SIGNATURES: phf::Map<&'static str, Signature> = phf_map! {
    // Sectioning
    "part" => Signature::new(1, 1),
    "chapter" => Signature::new(1, 1),
    "section" => Signature::new(1, 1),
    "subsection" => Signature::new(1, 1),
    "subsubsection" => Signature::new(1, 1),
    "paragraph" => Signature::new(1, 1),
    "subparagraph" => Signature::new(1, 1),
    "part*" => Signature::new(1, 0),
    "chapter*" => Signature::new(1, 0),
    "section*" => Signature::new(1, 0),
    "subsection*" => Signature::new(1, 0),
    "subsubsection*" => Signature::new(1, 0),

    // Text formatting
    "textbf" => Signature::new(1, 0),
    "textit" => Signature::new(1, 0),
    "texttt" => Signature::new(1, 0),
    "textsc" => Signature::new(1, 0),
    "textsf" => Signature::new(1, 0),
    "textrm" => Signature::new(1, 0),
    "textsl" => Signature::new(1, 0),
    "textup" => Signature::new(1, 0),
    "emph" => Signature::new(1, 0),
    "underline" => Signature::new(1, 0),
    "mbox" => Signature::new(1, 0),
    "footnote" => Signature::new(1, 1),
    "caption" => Signature::new(1, 1),

    // Document metadata
    "title" => Signature::new(1, 1),
    "author" => Signature::new(1, 1),
    "date" => Signature::new(1, 0),
    "documentclass" => Signature::new(1, 1),
    "usepackage" => Signature::new(1, 1),

    // Cross references and includes
    "label" => Signature::new(1, 0),
    "ref" => Signature::new(1, 0),
    "eqref" => Signature::new(1, 0),
    "pageref" => Signature::new(1, 0),
    "cite" => Signature::new(1, 1),
    "url" => Signature::new(1, 0),
    "href" => Signature::new(2, 0),
    "input" => Signature::new(1, 0),
    "include" => Signature::new(1, 0),
    "includegraphics" => Signature::new(1, 1),
    "bibliography" => Signature::new(1, 0),
    "bibliographystyle" => Signature::new(1, 0),

    // Definitions
    "def" => Signature::new(2, 0),
    "newcommand" => Signature::new(2, 2),
    "renewcommand" => Signature::new(2, 2),
    "newenvironment" => Signature::new(3, 2),
    "setlength" => Signature::new(2, 0),

    // Math-ish commands usable in text
    "frac" => Signature::new(2, 0),
    "sqrt" => Signature::new(1, 1),
    "hspace" => Signature::new(1, 0),
    "hspace*" => Signature::new(1, 0),
    "vspace" => Signature::new(1, 0),
    "vspace*" => Signature::new(1, 0),

    // Declarations that never take arguments
    "noindent" => Signature::NONE,
    "newline" => Signature::NONE,
    "newpage" => Signature::NONE,
    "clearpage" => Signature::NONE,
    "maketitle" => Signature::NONE,
    "tableofcontents" => Signature::NONE,
    "centering" => Signature::NONE,
    "hline" => Signature::NONE,
    "hfill" => Signature::NONE,
    "vfill" => Signature::NONE,
    "par" => Signature::NONE,
    "bf" => Signature::NONE,
    "it" => Signature::NONE,
    "em" => Signature::NONE,
    "tt" => Signature::NONE,
    "small" => Signature::NONE,
    "large" => Signature::NONE,
    "Large" => Signature::NONE,
    "LaTeX" => Signature::NONE,
    "TeX" => Signature::NONE,
    "today" => Signature::NONE,
    "cup" => Signature::NONE,
    "cap" => Signature::NONE,
};

/// Signatures of arguments following `\begin{name}`.
pub static ENVIRONMENT_SIGNATURES: phf::Map<&'static str, Signature> = phf_map! {
    "document" => Signature::NONE,
    "center" => Signature::NONE,
    "flushleft" => Signature::NONE,
    "flushright" => Signature::NONE,
    "quote" => Signature::NONE,
    "abstract" => Signature::NONE,
    "itemize" => Signature::new(0, 1),
    "enumerate" => Signature::new(0, 1),
    "description" => Signature::new(0, 1),
    "figure" => Signature::new(0, 1),
    "figure*" => Signature::new(0, 1),
    "table" => Signature::new(0, 1),
    "table*" => Signature::new(0, 1),
    "tabular" => Signature::new(1, 1),
    "tabular*" => Signature::new(2, 1),
    "minipage" => Signature::new(1, 1),
    "thebibliography" => Signature::new(1, 0),
};

/// Signature of the argument list after `\item`.
pub const ITEM_SIGNATURE: Signature = Signature::new(0, 1);

/// Look up a command signature; control symbols such as `\,` never take arguments.
pub fn command_signature(name: &str) -> Option<Signature> {
    if let Some(sig) = COMMAND_SIGNATURES.get(name) {
        return Some(*sig);
    }
    match name.chars().next() {
        Some(c) if c.is_ascii_alphabetic() => None,
        _ => Some(Signature::NONE),
    }
}

pub fn environment_signature(name: &str) -> Option<Signature> {
    ENVIRONMENT_SIGNATURES.get(name).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_command() {
        assert_eq!(command_signature("section"), Some(Signature::new(1, 1)));
        assert_eq!(command_signature("frac"), Some(Signature::new(2, 0)));
    }

    #[test]
    fn test_unknown_command_is_unconstrained() {
        assert_eq!(command_signature("mytitle"), None);
    }

    #[test]
    fn test_control_symbols_take_nothing() {
        assert_eq!(command_signature(","), Some(Signature::NONE));
        assert_eq!(command_signature("&"), Some(Signature::NONE));
        assert!(!Signature::NONE.takes_arguments());
    }

    #[test]
    fn test_environment_lookup() {
        assert_eq!(environment_signature("tabular"), Some(Signature::new(1, 1)));
        assert_eq!(environment_signature("mystery"), None);
    }
}
