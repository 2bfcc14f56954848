//! Error handling for texloom
//!
//! This module provides a unified error type and result type for parsing
//! and tree mutation.

use thiserror::Error;

use super::position::Location;

/// Parser and tree error type
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TexError {
    /// A construct was opened but its closing token never arrived
    #[error("expected {expected} at {location}, {}", found_or_eof(.found))]
    Unterminated {
        expected: String,
        found: Option<String>,
        location: Location,
    },
    /// An `\end{..}` that does not close any open environment
    #[error("unexpected \\end{{{name}}} at {location}")]
    UnexpectedEnd { name: String, location: Location },
    /// Argument text does not start and end with a matching delimiter pair
    #[error(
        "malformed argument {text:?}: first and last elements must be a matching \
         `{{}}` or `[]` pair"
    )]
    MalformedArgument { text: String },
    /// Content mutation on a node that cannot hold content
    #[error("cannot add content to {name}: only environments, items and groups hold content")]
    Capability { name: String },
    /// The node is not attached to any parent
    #[error("node is not attached to a parent")]
    Detached,
    /// A node would become its own ancestor
    #[error("cannot move a node into its own subtree")]
    CyclicMove,
    /// A node id that does not belong to the tree
    #[error("node #{id} does not belong to this tree")]
    UnknownNode { id: usize },
    /// The cursor was asked to move before the start of its input
    #[error("cannot move {requested} steps backward from position {position}")]
    Backtrack { requested: usize, position: usize },
}

fn found_or_eof(found: &Option<String>) -> String {
    match found {
        Some(token) => format!("instead got {:?}", token),
        None => "reached end of input".to_string(),
    }
}

/// Result type for parsing and mutation
pub type TexResult<T> = Result<T, TexError>;

/// A problem that lenient parsing recovered from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseWarning {
    pub message: String,
    pub location: Location,
}

impl std::fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Warning at {}: {}", self.location, self.message)
    }
}

// Convenience constructors for errors
impl TexError {
    pub fn unterminated(
        expected: impl Into<String>,
        found: Option<String>,
        location: Location,
    ) -> Self {
        TexError::Unterminated {
            expected: expected.into(),
            found,
            location,
        }
    }

    pub fn unexpected_end(name: impl Into<String>, location: Location) -> Self {
        TexError::UnexpectedEnd {
            name: name.into(),
            location,
        }
    }

    pub fn malformed(text: impl Into<String>) -> Self {
        TexError::MalformedArgument { text: text.into() }
    }

    pub fn capability(name: impl Into<String>) -> Self {
        TexError::Capability { name: name.into() }
    }

    /// Source location carried by the error, if any
    pub fn location(&self) -> Option<Location> {
        match self {
            TexError::Unterminated { location, .. } | TexError::UnexpectedEnd { location, .. } => {
                Some(*location)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(line: usize, column: usize) -> Location {
        Location {
            offset: 0,
            line,
            column,
        }
    }

    #[test]
    fn test_unterminated_display() {
        let err = TexError::unterminated(r"\end{itemize}", None, at(9, 4));
        let msg = err.to_string();
        assert!(msg.contains(r"\end{itemize}"));
        assert!(msg.contains("line 10, column 5"));
        assert!(msg.contains("end of input"));
    }

    #[test]
    fn test_unterminated_with_found_token() {
        let err = TexError::unterminated("$", Some("$$".to_string()), at(0, 0));
        assert!(err.to_string().contains("instead got \"$$\""));
    }

    #[test]
    fn test_malformed_argument_display() {
        let msg = TexError::malformed("{x]").to_string();
        assert!(msg.contains("malformed argument"));
        assert!(msg.contains("{x]"));
    }

    #[test]
    fn test_capability_names_command() {
        let msg = TexError::capability(r"\textbf").to_string();
        assert!(msg.contains(r"\textbf"));
    }

    #[test]
    fn test_location_accessor() {
        let err = TexError::unexpected_end("a", at(2, 1));
        assert_eq!(err.location(), Some(at(2, 1)));
        assert_eq!(TexError::Detached.location(), None);
    }
}
