//! Error types for outline reconstruction.
//!
//! Only [`ConfigError`] ends a run. Everything that can go wrong while a
//! document is being processed is reported as a
//! [`Diagnostic`](crate::diagnostics::Diagnostic) instead.

use std::io;
use thiserror::Error;

/// Unusable rule configuration. Raised before any page is processed.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("division type '{0}' is not defined")]
    UnknownDivision(String),

    #[error("division '{division}' references undefined division search rule '{rule}'")]
    UnknownSearchRule { division: String, rule: String },

    #[error("division '{division}' references undefined numbering rule '{rule}'")]
    UnknownNumberingRule { division: String, rule: String },

    #[error("numbering rule '{rule}' references undefined parsing rules '{parsing_rules}'")]
    UnknownParsingRules { rule: String, parsing_rules: String },

    #[error("parsing rules '{set}' reference undefined regex group '{fragment}'")]
    UnknownFragment { set: String, fragment: String },

    #[error("division search rule '{rule}' names capture group '{group}' which its regex does not define")]
    UnknownCaptureGroup { rule: String, group: String },

    #[error("invalid regex in {context}: {source}")]
    InvalidPattern {
        context: String,
        #[source]
        source: regex::Error,
    },

    #[error("invalid page range '{0}'")]
    InvalidPageRange(String),

    #[error("invalid layout: {0}")]
    InvalidLayout(String),

    #[error("failed to read config: {0}")]
    Io(#[from] io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// A page whose geometry cannot be classified. The page is skipped.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PageError {
    #[error("page {page} has unusable height {height}")]
    InvalidHeight { page: u32, height: f64 },

    #[error("page {page} block {block} has a malformed bounding box")]
    MalformedBlock { page: u32, block: u32 },

    #[error("page {page} has a malformed {kind} region (doc index {doc_index})")]
    MalformedRegion {
        page: u32,
        kind: &'static str,
        doc_index: u32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ConfigError::UnknownNumberingRule {
            division: "annex".to_string(),
            rule: "lettered".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "division 'annex' references undefined numbering rule 'lettered'"
        );

        let err = PageError::MalformedBlock { page: 4, block: 7 };
        assert_eq!(err.to_string(), "page 4 block 7 has a malformed bounding box");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: ConfigError = io_err.into();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
