//! Page geometry: the overlap test and the per-page exclusion zones.

use crate::error::PageError;
use crate::types::{LocationRef, PageInput, Rect};

/// Absorbs coordinate jitter between the text extractor and the image/table
/// locators.
pub const DEFAULT_OVERLAP_TOLERANCE: f64 = 2.0;

/// True iff the two rectangles, each grown by `tolerance` on every side,
/// intersect on both axes. Touching edges count as overlap.
pub fn overlaps(a: &Rect, b: &Rect, tolerance: f64) -> bool {
    a.x1 + tolerance >= b.x0 - tolerance
        && b.x1 + tolerance >= a.x0 - tolerance
        && a.bottom + tolerance >= b.top - tolerance
        && b.bottom + tolerance >= a.top - tolerance
}

/// Header and footer boundary lines for one page
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageLimits {
    /// Blocks starting above this line are headers
    pub header_limit: f64,
    /// Blocks ending below this line are footers
    pub footer_limit: f64,
}

impl PageLimits {
    /// Limits from the page itself when supplied, else from the layout
    /// fractions applied to the page height.
    pub fn for_page(page: &PageInput, header_size: f64, footer_size: f64) -> Result<Self, PageError> {
        if !page.height.is_finite() || page.height <= 0.0 {
            return Err(PageError::InvalidHeight {
                page: page.page_number,
                height: page.height,
            });
        }
        Ok(Self {
            header_limit: page
                .header_limit
                .unwrap_or(header_size * page.height),
            footer_limit: page
                .footer_limit
                .unwrap_or((1.0 - footer_size) * page.height),
        })
    }
}

/// Read-only view of one page's image and table regions plus its limits
#[derive(Debug, Clone)]
pub struct GeometryIndex<'a> {
    pub page_number: u32,
    pub limits: PageLimits,
    images: &'a [LocationRef],
    tables: &'a [LocationRef],
    tolerance: f64,
}

impl<'a> GeometryIndex<'a> {
    pub fn new(
        page_number: u32,
        limits: PageLimits,
        images: &'a [LocationRef],
        tables: &'a [LocationRef],
        tolerance: f64,
    ) -> Result<Self, PageError> {
        for (kind, regions) in [("image", images), ("table", tables)] {
            if let Some(bad) = regions.iter().find(|r| !r.bbox.is_well_formed()) {
                return Err(PageError::MalformedRegion {
                    page: page_number,
                    kind,
                    doc_index: bad.doc_index,
                });
            }
        }
        Ok(Self {
            page_number,
            limits,
            images,
            tables,
            tolerance,
        })
    }

    pub fn for_page(
        page: &'a PageInput,
        header_size: f64,
        footer_size: f64,
        tolerance: f64,
    ) -> Result<Self, PageError> {
        let limits = PageLimits::for_page(page, header_size, footer_size)?;
        Self::new(
            page.page_number,
            limits,
            &page.locations.images,
            &page.locations.tables,
            tolerance,
        )
    }

    /// First image, in page order, overlapping `bbox`
    pub fn image_overlapping(&self, bbox: &Rect) -> Option<&'a LocationRef> {
        self.images
            .iter()
            .find(|image| overlaps(bbox, &image.bbox, self.tolerance))
    }

    /// First table, in page order, overlapping `bbox`
    pub fn table_overlapping(&self, bbox: &Rect) -> Option<&'a LocationRef> {
        self.tables
            .iter()
            .find(|table| overlaps(bbox, &table.bbox, self.tolerance))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn location(bbox: Rect, doc_index: u32) -> LocationRef {
        LocationRef {
            bbox,
            doc_index,
            file: format!("region_{}.png", doc_index),
        }
    }

    #[test]
    fn test_overlap_is_symmetric() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(5.0, 5.0, 20.0, 20.0);
        let c = Rect::new(50.0, 50.0, 60.0, 60.0);

        assert!(overlaps(&a, &b, 0.0));
        assert!(overlaps(&b, &a, 0.0));
        assert!(!overlaps(&a, &c, 0.0));
        assert!(!overlaps(&c, &a, 0.0));
    }

    #[test]
    fn test_tolerance_bridges_small_gaps() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(13.0, 0.0, 20.0, 10.0);

        // Gap of 3 is closed by expanding both sides by 2
        assert!(!overlaps(&a, &b, 0.0));
        assert!(overlaps(&a, &b, DEFAULT_OVERLAP_TOLERANCE));
        assert!(!overlaps(&a, &Rect::new(15.0, 0.0, 20.0, 10.0), DEFAULT_OVERLAP_TOLERANCE));
    }

    #[test]
    fn test_touching_edges_overlap() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(10.0, 10.0, 20.0, 20.0);
        assert!(overlaps(&a, &b, 0.0));
    }

    #[test]
    fn test_limits_default_to_layout_fractions() {
        let page = PageInput {
            page_number: 1,
            height: 1000.0,
            width: 600.0,
            blocks: Vec::new(),
            header_limit: None,
            footer_limit: Some(900.0),
            locations: Default::default(),
        };

        let limits = PageLimits::for_page(&page, 0.1, 0.05).unwrap();
        assert_eq!(limits.header_limit, 100.0);
        assert_eq!(limits.footer_limit, 900.0);
    }

    #[test]
    fn test_unusable_height_is_a_page_error() {
        let page = PageInput {
            page_number: 7,
            height: 0.0,
            width: 600.0,
            blocks: Vec::new(),
            header_limit: None,
            footer_limit: None,
            locations: Default::default(),
        };

        assert_eq!(
            PageLimits::for_page(&page, 0.07, 0.07),
            Err(PageError::InvalidHeight { page: 7, height: 0.0 })
        );
    }

    #[test]
    fn test_index_returns_first_overlapping_region() {
        let images = vec![
            location(Rect::new(0.0, 100.0, 50.0, 150.0), 4),
            location(Rect::new(0.0, 100.0, 200.0, 300.0), 5),
        ];
        let limits = PageLimits {
            header_limit: 50.0,
            footer_limit: 750.0,
        };
        let index = GeometryIndex::new(2, limits, &images, &[], 2.0).unwrap();

        let hit = index.image_overlapping(&Rect::new(10.0, 120.0, 40.0, 130.0));
        assert_eq!(hit.map(|r| r.doc_index), Some(4));
        assert!(index.table_overlapping(&Rect::new(10.0, 120.0, 40.0, 130.0)).is_none());
    }

    #[test]
    fn test_malformed_region_rejected() {
        let tables = vec![location(Rect::new(100.0, 0.0, 0.0, 10.0), 9)];
        let limits = PageLimits {
            header_limit: 50.0,
            footer_limit: 750.0,
        };

        let err = GeometryIndex::new(3, limits, &[], &tables, 2.0).unwrap_err();
        assert_eq!(
            err,
            PageError::MalformedRegion {
                page: 3,
                kind: "table",
                doc_index: 9
            }
        );
    }
}
