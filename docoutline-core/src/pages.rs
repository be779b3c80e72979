//! Page-range grammar (`"1-3,7,10-"`) and the role each page plays in a run.
//!
//! Ranges address 1-based page ordinals in input order, not the page numbers
//! printed in the document.

use crate::config::PageSelectionConfig;
use crate::error::ConfigError;
use crate::types::PageRole;
use std::str::FromStr;

/// Inclusive range of page ordinals; `end = None` runs to the last page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRange {
    pub start: usize,
    pub end: Option<usize>,
}

impl PageRange {
    pub fn contains(&self, ordinal: usize) -> bool {
        ordinal >= self.start && self.end.map_or(true, |end| ordinal <= end)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRanges {
    ranges: Vec<PageRange>,
}

impl PageRanges {
    pub fn contains(&self, ordinal: usize) -> bool {
        self.ranges.iter().any(|r| r.contains(ordinal))
    }

    pub fn ranges(&self) -> &[PageRange] {
        &self.ranges
    }
}

impl FromStr for PageRanges {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidPageRange(s.to_string());
        let page = |text: &str| -> Result<usize, ConfigError> {
            match text.trim().parse::<usize>() {
                Ok(n) if n >= 1 => Ok(n),
                _ => Err(invalid()),
            }
        };

        let mut ranges = Vec::new();
        for item in s.split(',').map(str::trim).filter(|i| !i.is_empty()) {
            let range = match item.split_once('-') {
                None => {
                    let n = page(item)?;
                    PageRange { start: n, end: Some(n) }
                }
                Some((start, end)) => {
                    let (start, end) = (start.trim(), end.trim());
                    if start.is_empty() && end.is_empty() {
                        return Err(invalid());
                    }
                    let start = if start.is_empty() { 1 } else { page(start)? };
                    let end = if end.is_empty() { None } else { Some(page(end)?) };
                    if end.map_or(false, |end| end < start) {
                        return Err(invalid());
                    }
                    PageRange { start, end }
                }
            };
            ranges.push(range);
        }

        if ranges.is_empty() {
            return Err(invalid());
        }
        Ok(Self { ranges })
    }
}

/// Parsed page selection; absent ranges take their defaults
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageSelection {
    main: Option<PageRanges>,
    exclude: Option<PageRanges>,
    toc: Option<PageRanges>,
}

impl PageSelection {
    pub fn from_config(config: &PageSelectionConfig) -> Result<Self, ConfigError> {
        let parse = |value: &Option<String>| -> Result<Option<PageRanges>, ConfigError> {
            value.as_deref().map(str::parse).transpose()
        };
        Ok(Self {
            main: parse(&config.main_pages)?,
            exclude: parse(&config.exclude_pages)?,
            toc: parse(&config.toc_pages)?,
        })
    }

    /// Role of the page at 1-based `ordinal`
    pub fn role(&self, ordinal: usize) -> PageRole {
        let listed = |ranges: &Option<PageRanges>| {
            ranges.as_ref().map_or(false, |r| r.contains(ordinal))
        };

        if listed(&self.toc) {
            PageRole::Toc
        } else if self.main.as_ref().map_or(false, |main| !main.contains(ordinal)) {
            PageRole::Skipped
        } else if listed(&self.exclude) {
            PageRole::Excluded
        } else {
            PageRole::Main
        }
    }
}
