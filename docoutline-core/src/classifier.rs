use crate::config::LayoutConfig;
use crate::diagnostics::Diagnostic;
use crate::error::PageError;
use crate::geometry::GeometryIndex;
use crate::types::*;
use log::{debug, warn};

/// Label for one block plus the region that decided it
#[derive(Debug, Clone, PartialEq)]
pub struct Classification<'a> {
    pub label: ClassificationLabel,
    /// Matched image or table for the overlap labels
    pub location: Option<&'a LocationRef>,
    /// Table the block also overlapped when an image won the tie
    pub shadowed_table: Option<&'a LocationRef>,
}

impl<'a> Classification<'a> {
    fn plain(label: ClassificationLabel) -> Self {
        Self {
            label,
            location: None,
            shadowed_table: None,
        }
    }
}

/// Result of classifying every block of one page
#[derive(Debug, Clone)]
pub struct ClassifiedPage {
    pub summary: PageSummary,
    /// Text segments of the body blocks, in block order
    pub body_segments: Vec<TextSegment>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Sorts blocks into header, footer, image, table and body buckets.
///
/// Checks run in a fixed order and the first hit wins: header band, footer
/// band, image overlap, table overlap. A block overlapping both an image and
/// a table is therefore always an image overlap.
#[derive(Debug, Clone)]
pub struct BlockClassifier {
    header_size: f64,
    footer_size: f64,
    tolerance: f64,
}

impl Default for BlockClassifier {
    fn default() -> Self {
        Self::new(&LayoutConfig::default())
    }
}

impl BlockClassifier {
    pub fn new(layout: &LayoutConfig) -> Self {
        Self {
            header_size: layout.header_size,
            footer_size: layout.footer_size,
            tolerance: layout.overlap_tolerance,
        }
    }

    pub fn classify<'a>(&self, block: &Block, index: &GeometryIndex<'a>) -> Classification<'a> {
        let bbox = &block.bbox;

        if bbox.top < index.limits.header_limit {
            return Classification::plain(ClassificationLabel::Header);
        }
        if bbox.bottom > index.limits.footer_limit {
            return Classification::plain(ClassificationLabel::Footer);
        }
        if let Some(image) = index.image_overlapping(bbox) {
            return Classification {
                label: ClassificationLabel::ImageOverlap,
                location: Some(image),
                shadowed_table: index.table_overlapping(bbox),
            };
        }
        if let Some(table) = index.table_overlapping(bbox) {
            return Classification {
                label: ClassificationLabel::TableRef,
                location: Some(table),
                shadowed_table: None,
            };
        }
        Classification::plain(ClassificationLabel::Body)
    }

    /// Classify a whole page. Body segments are only collected for roles
    /// whose text is consumed downstream.
    pub fn classify_page(&self, page: &PageInput, role: PageRole) -> Result<ClassifiedPage, PageError> {
        if let Some(bad) = page.blocks.iter().find(|b| !b.bbox.is_well_formed()) {
            return Err(PageError::MalformedBlock {
                page: page.page_number,
                block: bad.id,
            });
        }
        let index = GeometryIndex::for_page(page, self.header_size, self.footer_size, self.tolerance)?;

        let mut summary = PageSummary {
            page_number: page.page_number,
            role,
            header_blocks: Vec::new(),
            footer_blocks: Vec::new(),
            excluded_blocks: Vec::new(),
            body_blocks: Vec::new(),
        };
        let mut body_segments = Vec::new();
        let mut diagnostics = Vec::new();

        for block in &page.blocks {
            let classification = self.classify(block, &index);

            if let (Some(image), Some(table)) = (classification.location, classification.shadowed_table) {
                debug!(
                    "Page {} block {} overlaps image {} and table {}; image wins",
                    page.page_number, block.id, image.doc_index, table.doc_index
                );
                diagnostics.push(Diagnostic::GeometryAmbiguity {
                    page: page.page_number,
                    block_id: block.id,
                    image_index: image.doc_index,
                    table_index: table.doc_index,
                });
            }

            match classification.label {
                ClassificationLabel::Header => summary.header_blocks.push(block.id),
                ClassificationLabel::Footer => summary.footer_blocks.push(block.id),
                ClassificationLabel::ImageOverlap | ClassificationLabel::TableRef => {
                    summary.excluded_blocks.push(ExcludedBlock {
                        block_id: block.id,
                        label: classification.label,
                        location: classification.location.cloned(),
                    })
                }
                ClassificationLabel::Body => {
                    summary.body_blocks.push(block.id);
                    if matches!(role, PageRole::Main | PageRole::Toc) {
                        body_segments.extend(block.segments().iter().cloned());
                    }
                }
            }
        }

        debug!(
            "Page {}: {} header, {} footer, {} excluded, {} body blocks",
            page.page_number,
            summary.header_blocks.len(),
            summary.footer_blocks.len(),
            summary.excluded_blocks.len(),
            summary.body_blocks.len()
        );

        Ok(ClassifiedPage {
            summary,
            body_segments,
            diagnostics,
        })
    }

    /// Like [`classify_page`](Self::classify_page) but never fails: a page
    /// that cannot be classified comes back empty with a `PageSkipped`
    /// diagnostic.
    pub fn classify_page_or_skip(&self, page: &PageInput, role: PageRole) -> ClassifiedPage {
        if role == PageRole::Skipped {
            return ClassifiedPage {
                summary: empty_summary(page.page_number, role),
                body_segments: Vec::new(),
                diagnostics: Vec::new(),
            };
        }

        self.classify_page(page, role).unwrap_or_else(|err| {
            warn!("Skipping page {}: {}", page.page_number, err);
            ClassifiedPage {
                summary: empty_summary(page.page_number, PageRole::Skipped),
                body_segments: Vec::new(),
                diagnostics: vec![Diagnostic::PageSkipped {
                    page: page.page_number,
                    reason: err.to_string(),
                }],
            }
        })
    }
}

fn empty_summary(page_number: u32, role: PageRole) -> PageSummary {
    PageSummary {
        page_number,
        role,
        header_blocks: Vec::new(),
        footer_blocks: Vec::new(),
        excluded_blocks: Vec::new(),
        body_blocks: Vec::new(),
    }
}
