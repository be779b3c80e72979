// Docoutline Core Library
//
// Rebuilds a document's logical outline (sections, annexes, table of
// contents) from page blocks produced by an external text extractor.
// Main interface: OutlineProcessor.

pub mod types;
pub mod error;
pub mod config;
pub mod diagnostics;
pub mod geometry;
pub mod classifier;
pub mod segments;
pub mod numbering;
pub mod patterns;
pub mod rules;
pub mod sections;
pub mod pages;
pub mod toc;
pub mod processor;
pub mod serialization;

// Re-export main types and functions for easy use
pub use types::*;
pub use config::{ConfigOverrides, OutlineConfig};
pub use diagnostics::Diagnostic;
pub use error::{ConfigError, PageError};
pub use processor::OutlineProcessor;
pub use rules::RuleSet;
pub use sections::{SectionOutcome, SectionStateMachine};
