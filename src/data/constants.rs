//! Keyword and delimiter tables used by the tokenizer and reader
//!
//! - Opaque ("skip") environments whose bodies are never tokenized
//! - Size-prefixed punctuation commands such as `\left(` or `\Bigg\rangle`

use lazy_static::lazy_static;
use phf::phf_set;

/// Command that opens a named environment
pub const BEGIN_KEYWORD: &str = "begin";

/// Command that closes a named environment
pub const END_KEYWORD: &str = "end";

/// Command whose body extends to the next item or environment end
pub const ITEM_KEYWORD: &str = "item";

/// Name of the synthetic environment wrapping a whole document
pub const ROOT_NAME: &str = "[tex]";

/// Environments whose bodies are kept verbatim.
///
/// Verbatim-like bodies may contain unescaped backslashes and unmatched
/// braces; math and alignment bodies are kept opaque because their contents
/// follow different rules from text mode.
pub static SKIP_ENVS: phf::Set<&'static str> = phf_set! {
    "verbatim",
    "verbatim*",
    "lstlisting",
    "minted",
    "comment",
    "equation",
    "equation*",
    "align",
    "align*",
    "alignat",
    "alignat*",
    "math",
    "displaymath",
    "split",
    "array",
    "eqnarray",
    "eqnarray*",
    "multline",
    "multline*",
    "gather",
    "gather*",
    "flalign",
    "flalign*",
};

/// Prefixes that resize the delimiter following them.
pub const SIZE_PREFIXES: [&str; 14] = [
    "left", "right", "big", "Big", "bigg", "Bigg", "bigl", "bigr", "Bigl", "Bigr", "biggl",
    "biggr", "Biggl", "Biggr",
];

/// Delimiters that may follow a size prefix.
pub const BRACKET_DELIMITERS: [&str; 24] = [
    "(", ")", "<", ">", "[", "]", "{", "}", r"\{", r"\}", ".", "|", r"\|", "/", r"\langle",
    r"\rangle", r"\lfloor", r"\rfloor", r"\lceil", r"\rceil", r"\ulcorner", r"\urcorner",
    r"\lbrack", r"\rbrack",
];

lazy_static! {
    /// Every size prefix joined with every delimiter (without the escape),
    /// longest first so that `bigg(` wins over a shorter candidate.
    pub static ref PUNCTUATION_COMMANDS: Vec<String> = {
        let mut commands: Vec<String> = SIZE_PREFIXES
            .iter()
            .flat_map(|prefix| {
                BRACKET_DELIMITERS
                    .iter()
                    .map(move |delim| format!("{}{}", prefix, delim))
            })
            .collect();
        commands.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        commands
    };
}

/// Whether an environment body should be read as one opaque span.
pub fn is_skip_env(name: &str) -> bool {
    SKIP_ENVS.contains(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skip_envs() {
        assert!(is_skip_env("verbatim"));
        assert!(is_skip_env("align*"));
        assert!(!is_skip_env("itemize"));
    }

    #[test]
    fn test_punctuation_commands_longest_first() {
        let first = PUNCTUATION_COMMANDS.first().map(String::len).unwrap_or(0);
        let last = PUNCTUATION_COMMANDS.last().map(String::len).unwrap_or(0);
        assert!(first >= last);
        assert!(PUNCTUATION_COMMANDS.iter().any(|c| c == "right."));
        assert!(PUNCTUATION_COMMANDS.iter().any(|c| c == r"Bigg\rangle"));
        assert_eq!(
            PUNCTUATION_COMMANDS.len(),
            SIZE_PREFIXES.len() * BRACKET_DELIMITERS.len()
        );
    }
}
