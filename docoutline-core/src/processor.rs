use crate::classifier::{BlockClassifier, ClassifiedPage};
use crate::config::OutlineConfig;
use crate::error::ConfigError;
use crate::rules::RuleSet;
use crate::sections::SectionStateMachine;
use crate::toc::TocEntry;
use crate::types::*;
use anyhow::Result;
use chrono::Utc;
use log::info;
use rayon::prelude::*;
use std::time::{Duration, Instant};

/// Simple profiler that collects timings for pipeline steps
pub struct StepProfiler {
    enabled: bool,
    timings: Vec<(String, Duration)>,
}

impl StepProfiler {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            timings: Vec::new(),
        }
    }

    pub fn time_step<F, R>(&mut self, step_name: &str, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        if !self.enabled {
            return f();
        }

        let start = Instant::now();
        let result = f();
        let elapsed = start.elapsed();

        self.timings.push((step_name.to_string(), elapsed));
        info!("⏱️  {}: {:.0}ms", step_name, elapsed.as_millis());

        result
    }

    pub fn timings(&self) -> &[(String, Duration)] {
        &self.timings
    }

    pub fn log_summary(&self) {
        if !self.enabled || self.timings.is_empty() {
            return;
        }

        info!("📊 Performance Summary:");
        let total: Duration = self.timings.iter().map(|(_, d)| *d).sum();

        for (step, duration) in &self.timings {
            let percentage = if total.is_zero() {
                0.0
            } else {
                (duration.as_secs_f64() / total.as_secs_f64()) * 100.0
            };
            info!(
                "   {:.<35} {:.0}ms ({:.1}%)",
                step,
                duration.as_millis(),
                percentage
            );
        }
        info!("   {:.<35} {:.0}ms", "Total", total.as_millis());
    }
}

/// Extracted pages + rules → outline.
///
/// Construction resolves and compiles the whole configuration, so a
/// processor that exists can no longer fail on configuration grounds.
pub struct OutlineProcessor {
    config: OutlineConfig,
    rules: RuleSet,
    classifier: BlockClassifier,
    config_hash: String,
}

impl OutlineProcessor {
    pub fn new(config: OutlineConfig) -> Result<Self, ConfigError> {
        let rules = RuleSet::compile(&config)?;
        let classifier = BlockClassifier::new(&rules.layout);
        let config_hash = config.fingerprint()?;

        info!(
            "🔧 Rules ready: {} divisions, initial division '{}'",
            rules.divisions().len(),
            config.initial_division
        );

        Ok(Self {
            config,
            rules,
            classifier,
            config_hash,
        })
    }

    pub fn with_defaults() -> Result<Self, ConfigError> {
        Self::new(OutlineConfig::default())
    }

    pub fn config(&self) -> &OutlineConfig {
        &self.config
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn config_hash(&self) -> &str {
        &self.config_hash
    }

    pub fn process(&self, document: &DocumentInput) -> Outline {
        self.process_with_profiler(document, &mut StepProfiler::new(false))
    }

    pub fn process_with_profiling(&self, document: &DocumentInput) -> Outline {
        let mut profiler = StepProfiler::new(true);
        let outline = self.process_with_profiler(document, &mut profiler);
        profiler.log_summary();
        outline
    }

    /// Load an extracted-document JSON file and process it
    pub fn process_file(&self, input_path: &str, profile: bool) -> Result<Outline> {
        let document = DocumentInput::load_from_file(input_path)?;
        info!("📄 Processing {} ({} pages)", input_path, document.pages.len());
        Ok(if profile {
            self.process_with_profiling(&document)
        } else {
            self.process(&document)
        })
    }

    fn process_with_profiler(&self, document: &DocumentInput, profiler: &mut StepProfiler) -> Outline {
        let start_time = Instant::now();

        // Pages are independent here; collect keeps input order
        let classified: Vec<ClassifiedPage> = profiler.time_step("Page Classification", || {
            document
                .pages
                .par_iter()
                .enumerate()
                .map(|(i, page)| {
                    let role = self.rules.pages.role(i + 1);
                    self.classifier.classify_page_or_skip(page, role)
                })
                .collect()
        });

        let toc_entries: Vec<TocEntry> = profiler.time_step("TOC Parsing", || {
            classified
                .iter()
                .filter(|page| page.summary.role == PageRole::Toc)
                .flat_map(|page| {
                    page.body_segments
                        .iter()
                        .flat_map(move |segment| {
                            self.rules
                                .toc
                                .parse_segment(&segment.text, page.summary.page_number)
                        })
                })
                .collect()
        });

        let sections = profiler.time_step("Section Reconstruction", || {
            let stream = classified
                .iter()
                .filter(|page| page.summary.role == PageRole::Main)
                .flat_map(|page| {
                    page.body_segments
                        .iter()
                        .map(move |segment| (page.summary.page_number, segment.text.as_str()))
                });
            SectionStateMachine::run(&self.rules, stream)
        });

        let mut diagnostics = Vec::new();
        let mut pages = Vec::with_capacity(classified.len());
        for page in classified {
            diagnostics.extend(page.diagnostics);
            pages.push(page.summary);
        }
        diagnostics.extend(sections.diagnostics);

        info!(
            "✅ {} sections, {} TOC entries, {} diagnostics in {:.3}s",
            sections.sections.len(),
            toc_entries.len(),
            diagnostics.len(),
            start_time.elapsed().as_secs_f64()
        );

        Outline {
            schema_version: SCHEMA_VERSION.to_string(),
            metadata: OutlineMetadata {
                created_at: Utc::now(),
                config_hash: self.config_hash.clone(),
                page_count: document.pages.len(),
                section_count: sections.sections.len(),
            },
            sections: sections.sections,
            toc_entries,
            pages,
            diagnostics,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Diagnostic;

    fn body_page(page_number: u32, lines: &[&str]) -> PageInput {
        let blocks = lines
            .iter()
            .enumerate()
            .map(|(i, text)| {
                let top = 100.0 + 40.0 * i as f64;
                Block {
                    id: i as u32,
                    block_type: 0,
                    bbox: Rect::new(72.0, top, 500.0, top + 20.0),
                    text_segments: vec![TextSegment {
                        text: text.to_string(),
                        font: Some("Helvetica".to_string()),
                        font_size: Some(10.0),
                    }],
                    lines: Vec::new(),
                }
            })
            .collect();
        PageInput {
            page_number,
            height: 792.0,
            width: 612.0,
            blocks,
            header_limit: None,
            footer_limit: None,
            locations: PageLocations::default(),
        }
    }

    #[test]
    fn test_pipeline_keeps_page_order() {
        let document = DocumentInput {
            pages: vec![
                body_page(1, &["1 Introduction", "Some intro text."]),
                body_page(2, &["1.1 Background", "More text."]),
                body_page(3, &["2 Methods"]),
            ],
        };

        let processor = OutlineProcessor::with_defaults().unwrap();
        let outline = processor.process(&document);

        let numbers: Vec<_> = outline.sections.iter().map(|s| s.number.as_str()).collect();
        assert_eq!(numbers, vec!["1", "1.1", "2"]);
        assert_eq!(outline.metadata.page_count, 3);
        assert_eq!(outline.metadata.section_count, 3);
        assert_eq!(outline.metadata.config_hash, processor.config_hash());
        assert_eq!(outline.schema_version, SCHEMA_VERSION);
        assert_eq!(outline.pages.len(), 3);
    }

    #[test]
    fn test_bad_page_is_skipped_not_fatal() {
        let mut broken = body_page(2, &["stray"]);
        broken.height = f64::NAN;
        let document = DocumentInput {
            pages: vec![
                body_page(1, &["1 Scope", "Text."]),
                broken,
                body_page(3, &["2 Terms"]),
            ],
        };

        let outline = OutlineProcessor::with_defaults().unwrap().process(&document);
        assert_eq!(outline.sections.len(), 2);
        assert_eq!(outline.pages[1].role, PageRole::Skipped);
        assert!(matches!(
            outline.diagnostics.as_slice(),
            [Diagnostic::PageSkipped { page: 2, .. }]
        ));
    }

    #[test]
    fn test_toc_and_excluded_pages() {
        let mut config = OutlineConfig::default();
        config.pages.toc_pages = Some("1".to_string());
        config.pages.exclude_pages = Some("3".to_string());

        let document = DocumentInput {
            pages: vec![
                body_page(1, &["Contents", "1. Scope 2", "2. Terms 3"]),
                body_page(2, &["1 Scope", "Scope text."]),
                body_page(3, &["2 Not part of the outline"]),
            ],
        };

        let outline = OutlineProcessor::new(config).unwrap().process(&document);
        assert_eq!(outline.toc_entries.len(), 2);
        assert_eq!(outline.toc_entries[0].fields["title"], "Scope");
        assert_eq!(outline.toc_entries[0].toc_page, 1);

        assert_eq!(outline.sections.len(), 1);
        assert_eq!(outline.sections[0].body_text, "Scope text.\n");
        assert_eq!(outline.pages[2].role, PageRole::Excluded);
        assert_eq!(outline.pages[2].body_blocks, vec![0]);
    }

    #[test]
    fn test_config_errors_surface_from_new() {
        let mut config = OutlineConfig::default();
        config.initial_division = "preface".to_string();
        assert!(OutlineProcessor::new(config).is_err());
    }

    #[test]
    fn test_profiler_records_steps() {
        let mut profiler = StepProfiler::new(true);
        let value = profiler.time_step("Step", || 7);
        assert_eq!(value, 7);
        assert_eq!(profiler.timings().len(), 1);

        let mut disabled = StepProfiler::new(false);
        disabled.time_step("Step", || ());
        assert!(disabled.timings().is_empty());
    }
}
