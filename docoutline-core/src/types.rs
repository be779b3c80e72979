use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;

use crate::diagnostics::Diagnostic;
use crate::segments::group_spans;
use crate::toc::TocEntry;

/// The schema version stamped on every outline output.
/// Bump this when the output shape changes.
pub const SCHEMA_VERSION: &str = "0.1.0";

// ===== PAGE GEOMETRY =====

/// Axis-aligned rectangle in page coordinates (origin top-left, y grows down).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "RectRepr")]
pub struct Rect {
    pub x0: f64,
    pub top: f64,
    pub x1: f64,
    pub bottom: f64,
}

impl Rect {
    pub fn new(x0: f64, top: f64, x1: f64, bottom: f64) -> Self {
        Self { x0, top, x1, bottom }
    }

    /// Finite coordinates with `x0 <= x1` and `top <= bottom`.
    pub fn is_well_formed(&self) -> bool {
        [self.x0, self.top, self.x1, self.bottom]
            .iter()
            .all(|v| v.is_finite())
            && self.x0 <= self.x1
            && self.top <= self.bottom
    }
}

/// Extractors hand out boxes as `{x0, top, x1, bottom}`, `{x0, y0, x1, y1}`
/// or a bare `[x0, top, x1, bottom]` tuple.
#[derive(Deserialize)]
#[serde(untagged)]
enum RectRepr {
    Tuple([f64; 4]),
    Named {
        x0: f64,
        #[serde(alias = "y0")]
        top: f64,
        x1: f64,
        #[serde(alias = "y1")]
        bottom: f64,
    },
}

impl From<RectRepr> for Rect {
    fn from(repr: RectRepr) -> Self {
        match repr {
            RectRepr::Tuple([x0, top, x1, bottom]) => Rect::new(x0, top, x1, bottom),
            RectRepr::Named { x0, top, x1, bottom } => Rect::new(x0, top, x1, bottom),
        }
    }
}

// ===== EXTRACTED CONTENT (upstream input) =====

/// Contiguous run of text sharing one font and size within a block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextSegment {
    pub text: String,
    #[serde(default)]
    pub font: Option<String>,
    #[serde(default)]
    pub font_size: Option<f32>,
}

/// Raw span as produced by the text extractor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Span {
    pub text: String,
    #[serde(default)]
    pub font: Option<String>,
    #[serde(default)]
    pub size: Option<f32>,
    /// Baseline origin `[x, y]`; the y value identifies the source line
    #[serde(default)]
    pub origin: [f64; 2],
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Line {
    pub spans: Vec<Span>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    #[serde(alias = "block_number")]
    pub id: u32,
    /// Extractor block type (0 = text, 1 = image)
    #[serde(rename = "type", default)]
    pub block_type: u32,
    pub bbox: Rect,
    #[serde(default)]
    pub text_segments: Vec<TextSegment>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lines: Vec<Line>,
}

impl Block {
    /// Ready segments if the extractor supplied them, otherwise segments
    /// grouped from the raw lines.
    pub fn segments(&self) -> Cow<'_, [TextSegment]> {
        if self.text_segments.is_empty() && !self.lines.is_empty() {
            Cow::Owned(group_spans(&self.lines))
        } else {
            Cow::Borrowed(&self.text_segments)
        }
    }
}

/// Image or table region located on a page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationRef {
    pub bbox: Rect,
    /// Document-wide, monotonically increasing index
    pub doc_index: u32,
    pub file: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageLocations {
    #[serde(default)]
    pub images: Vec<LocationRef>,
    #[serde(default)]
    pub tables: Vec<LocationRef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageInput {
    pub page_number: u32,
    pub height: f64,
    pub width: f64,
    #[serde(default)]
    pub blocks: Vec<Block>,
    /// Precomputed limits; derived from the layout fractions when absent
    #[serde(default)]
    pub header_limit: Option<f64>,
    #[serde(default)]
    pub footer_limit: Option<f64>,
    #[serde(default)]
    pub locations: PageLocations,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentInput {
    pub pages: Vec<PageInput>,
}

impl DocumentInput {
    pub fn load_from_file(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let document: DocumentInput = serde_json::from_str(&content)?;
        Ok(document)
    }
}

// ===== CLASSIFICATION =====

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClassificationLabel {
    Header,
    Footer,
    ImageOverlap,
    TableRef,
    Body,
}

/// How a page takes part in the run, decided by the page selection ranges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageRole {
    Main,
    Excluded,
    Toc,
    Skipped,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExcludedBlock {
    pub block_id: u32,
    pub label: ClassificationLabel,
    pub location: Option<LocationRef>,
}

/// Per-page record of where every block went
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageSummary {
    pub page_number: u32,
    pub role: PageRole,
    pub header_blocks: Vec<u32>,
    pub footer_blocks: Vec<u32>,
    pub excluded_blocks: Vec<ExcludedBlock>,
    pub body_blocks: Vec<u32>,
}

// ===== SECTIONS =====

/// One reconstructed section. Immutable once emitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub id: usize,
    pub division: String,
    pub number: String,
    pub prefix: Option<String>,
    pub title: Option<String>,
    pub start_page: u32,
    pub end_page: Option<u32>,
    pub body_text: String,
    /// Every named group the heading recognizer captured
    pub fields: BTreeMap<String, String>,
}

/// Table-of-contents line regenerated from an emitted section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TocLine {
    pub division: String,
    pub number: String,
    pub prefix: Option<String>,
    pub title: Option<String>,
    pub start_page: u32,
    pub end_page: Option<u32>,
}

impl From<&Section> for TocLine {
    fn from(section: &Section) -> Self {
        Self {
            division: section.division.clone(),
            number: section.number.clone(),
            prefix: section.prefix.clone(),
            title: section.title.clone(),
            start_page: section.start_page,
            end_page: section.end_page,
        }
    }
}

// ===== OUTPUT =====

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutlineMetadata {
    pub created_at: DateTime<Utc>,
    /// SHA-256 of the canonical configuration that produced this outline
    pub config_hash: String,
    pub page_count: usize,
    pub section_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Outline {
    pub schema_version: String,
    pub metadata: OutlineMetadata,
    pub sections: Vec<Section>,
    /// Entries parsed from the document's own table-of-contents pages
    pub toc_entries: Vec<TocEntry>,
    pub pages: Vec<PageSummary>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Outline {
    pub fn table_of_contents(&self) -> Vec<TocLine> {
        self.sections.iter().map(TocLine::from).collect()
    }
}
