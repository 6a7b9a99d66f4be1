//! Error types for docsite.
//!
//! Library crates use [`DocsiteError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all docsite operations.
#[derive(Debug, thiserror::Error)]
pub enum DocsiteError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error while talking to the search service.
    #[error("network error: {0}")]
    Network(String),

    /// XML, JSON or HTML parsing error.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (unexpected shape, invalid option, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// A TOC lookup needed exactly one child with `label` under `parent`.
    ///
    /// `siblings` holds every label that was looked through, so the operator
    /// can see what the tree actually contains.
    #[error("{}", describe_node_lookup(.label, .parent, .found, .siblings))]
    TocNode {
        label: String,
        parent: String,
        found: usize,
        siblings: Vec<String>,
    },

    /// Template resolution or rendering error.
    #[error("template error: {0}")]
    Template(String),

    /// The search service answered with something we cannot use.
    #[error("search service error: {0}")]
    Search(String),
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, DocsiteError>;

impl DocsiteError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

fn describe_node_lookup(label: &str, parent: &str, found: &usize, siblings: &[String]) -> String {
    let mut msg = format!("need a single '{label}' node under '{parent}' but ");
    if *found == 0 {
        msg.push_str("couldn't find it.");
    } else {
        msg.push_str(&format!("found {found} such nodes!"));
    }
    msg.push_str("\nHere's what I was looking through:\n");
    msg.push_str(parent);
    msg.push(':');
    for sibling in siblings {
        msg.push_str("\n    ");
        msg.push_str(sibling);
    }
    msg
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = DocsiteError::config("no such domain");
        assert_eq!(err.to_string(), "config error: no such domain");

        let err = DocsiteError::validation("children is neither a list nor an object");
        assert!(err.to_string().contains("neither a list"));
    }

    #[test]
    fn toc_node_error_lists_siblings() {
        let err = DocsiteError::TocNode {
            label: "Reference".into(),
            parent: "Legato".into(),
            found: 0,
            siblings: vec!["Build Apps".into(), "About".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("couldn't find it"));
        assert!(msg.contains("Legato:\n    Build Apps\n    About"));

        let err = DocsiteError::TocNode {
            label: "About".into(),
            parent: "Legato".into(),
            found: 2,
            siblings: vec!["About".into(), "About".into()],
        };
        assert!(err.to_string().contains("found 2 such nodes!"));
    }
}
