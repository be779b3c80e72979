//! Section reconstruction over the document-ordered stream of body text.
//!
//! This is a left fold: each segment either switches division, opens a new
//! section, or lands in the body of the open one. It must see segments in
//! document order and is never run in parallel.

use crate::diagnostics::Diagnostic;
use crate::numbering::SectionNumber;
use crate::rules::RuleSet;
use crate::types::Section;
use log::{debug, info, warn};

/// What a single segment did to the state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentOutcome {
    /// Blank text
    Ignored,
    DivisionSwitch { to: String },
    /// A heading was accepted and a section with this id opened
    Opened(usize),
    /// Heading-shaped text with an out-of-sequence number
    Rejected { appended: bool },
    Appended,
    /// Text before the first heading
    Dropped,
}

/// Sections in document order plus every diagnostic raised on the way
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SectionOutcome {
    pub sections: Vec<Section>,
    pub diagnostics: Vec<Diagnostic>,
}

pub struct SectionStateMachine<'r> {
    rules: &'r RuleSet,
    division: usize,
    prefix: Option<String>,
    last_accepted: Option<SectionNumber>,
    open: Option<Section>,
    /// Last page that contributed text to the open section
    last_content_page: u32,
    next_id: usize,
    sections: Vec<Section>,
    diagnostics: Vec<Diagnostic>,
}

impl<'r> SectionStateMachine<'r> {
    pub fn new(rules: &'r RuleSet) -> Self {
        Self {
            rules,
            division: rules.initial_division(),
            prefix: None,
            last_accepted: None,
            open: None,
            last_content_page: 0,
            next_id: 0,
            sections: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Fold a whole `(page, text)` stream
    pub fn run<'t, I>(rules: &'r RuleSet, segments: I) -> SectionOutcome
    where
        I: IntoIterator<Item = (u32, &'t str)>,
    {
        let mut machine = Self::new(rules);
        for (page, text) in segments {
            machine.feed(page, text);
        }
        machine.finish()
    }

    pub fn active_division(&self) -> &str {
        &self.rules.division(self.division).name
    }

    pub fn open_section(&self) -> Option<&Section> {
        self.open.as_ref()
    }

    pub fn feed(&mut self, page: u32, text: &str) -> SegmentOutcome {
        let text = text.trim();
        if text.is_empty() {
            return SegmentOutcome::Ignored;
        }

        let rules = self.rules;
        let division = rules.division(self.division);

        // Structural markers win over any numbering verdict
        for compiled in &division.searches {
            if let Some(marker) = compiled.search.find(text) {
                let from = division.name.clone();
                let to = rules.division(compiled.target).name.clone();
                info!(
                    "Page {}: division switch {} -> {} on '{}'",
                    page, from, to, text
                );

                self.close_open();
                self.division = compiled.target;
                self.prefix = marker.prefix;
                self.last_accepted = marker.number.map(|number| {
                    match &rules.division(compiled.target).headings {
                        Some(headings) => headings.model.parse(&number),
                        None => SectionNumber::parse(&number, "."),
                    }
                });
                self.diagnostics.push(Diagnostic::DivisionSwitch {
                    page,
                    text: text.to_string(),
                    from,
                    to: to.clone(),
                });
                return SegmentOutcome::DivisionSwitch { to };
            }
        }

        if let Some(headings) = &division.headings {
            if let Some(heading) = headings.recognizer.recognize(text) {
                // A captured prefix must agree with the division's own
                let prefix_conflict = matches!(
                    (&heading.prefix, &self.prefix),
                    (Some(captured), Some(active)) if captured != active
                );
                let prefix = self.prefix.as_deref().or(heading.prefix.as_deref());
                let candidate = headings
                    .model
                    .qualify(headings.model.parse(&heading.number), prefix);
                let valid = !prefix_conflict
                    && headings.model.is_valid_successor(
                        self.last_accepted.as_ref(),
                        &candidate,
                        prefix,
                    );

                if valid {
                    self.close_open();
                    let id = self.next_id;
                    self.next_id += 1;

                    let number = candidate.render(&headings.model.separator);
                    info!("Page {}: section {} '{}'", page, id, number);
                    self.open = Some(Section {
                        id,
                        division: division.name.clone(),
                        number,
                        prefix: heading.prefix.or_else(|| self.prefix.clone()),
                        title: heading.title,
                        start_page: page,
                        end_page: None,
                        body_text: String::new(),
                        fields: heading.fields,
                    });
                    self.last_content_page = page;
                    self.last_accepted = Some(candidate);
                    return SegmentOutcome::Opened(id);
                }

                let previous = self
                    .last_accepted
                    .as_ref()
                    .map(|n| n.render(&headings.model.separator));
                let appended = self.append(page, text);
                warn!(
                    "Page {}: '{}' does not follow {} in division {}",
                    page,
                    heading.number,
                    previous.as_deref().unwrap_or("<start>"),
                    division.name
                );
                self.diagnostics.push(Diagnostic::SequencingRejection {
                    page,
                    text: text.to_string(),
                    candidate: heading.number,
                    previous,
                    division: division.name.clone(),
                    appended,
                });
                return SegmentOutcome::Rejected { appended };
            }
        }

        if self.append(page, text) {
            SegmentOutcome::Appended
        } else {
            debug!("Page {}: dropping text before first heading", page);
            self.diagnostics.push(Diagnostic::UnsectionedText {
                page,
                text: text.to_string(),
            });
            SegmentOutcome::Dropped
        }
    }

    /// Close the last open section and hand back everything emitted
    pub fn finish(mut self) -> SectionOutcome {
        self.close_open();
        SectionOutcome {
            sections: self.sections,
            diagnostics: self.diagnostics,
        }
    }

    fn append(&mut self, page: u32, text: &str) -> bool {
        match self.open.as_mut() {
            Some(section) => {
                section.body_text.push_str(text);
                section.body_text.push('\n');
                self.last_content_page = page;
                true
            }
            None => false,
        }
    }

    fn close_open(&mut self) {
        if let Some(mut section) = self.open.take() {
            section.end_page = Some(self.last_content_page.max(section.start_page));
            debug!(
                "Closing section {} '{}' (pages {}-{})",
                section.id,
                section.number,
                section.start_page,
                self.last_content_page
            );
            self.sections.push(section);
        }
    }
}
