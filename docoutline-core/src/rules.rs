//! Fully resolved rule configuration.
//!
//! Every name reference in [`OutlineConfig`] is looked up, every regex is
//! compiled and every page range parsed here, once, before a document is
//! touched. A [`RuleSet`] that exists is known to be consistent.

use crate::config::{LayoutConfig, OutlineConfig};
use crate::error::ConfigError;
use crate::numbering::NumberingModel;
use crate::pages::PageSelection;
use crate::patterns::{DivisionSearch, HeadingRecognizer};
use crate::toc::TocParser;
use log::debug;
use std::collections::BTreeMap;

/// Heading recognizer and the sequencing model its numbers are checked against
#[derive(Debug, Clone)]
pub struct NumberedHeadings {
    pub rule: String,
    pub recognizer: HeadingRecognizer,
    pub model: NumberingModel,
}

#[derive(Debug, Clone)]
pub struct CompiledSearch {
    pub search: DivisionSearch,
    /// Index of the division this search switches to
    pub target: usize,
}

#[derive(Debug, Clone)]
pub struct CompiledDivision {
    pub name: String,
    pub searches: Vec<CompiledSearch>,
    /// `None` for divisions without numbered headings
    pub headings: Option<NumberedHeadings>,
}

#[derive(Debug, Clone)]
pub struct RuleSet {
    divisions: Vec<CompiledDivision>,
    initial: usize,
    pub layout: LayoutConfig,
    pub pages: PageSelection,
    pub toc: TocParser,
}

impl RuleSet {
    pub fn compile(config: &OutlineConfig) -> Result<Self, ConfigError> {
        config.layout.validate()?;

        // Division order follows the map, so indices are stable across runs
        let index: BTreeMap<&str, usize> = config
            .division_types
            .keys()
            .enumerate()
            .map(|(i, name)| (name.as_str(), i))
            .collect();
        let resolve = |name: &str| {
            index
                .get(name)
                .copied()
                .ok_or_else(|| ConfigError::UnknownDivision(name.to_string()))
        };

        let mut divisions = Vec::with_capacity(config.division_types.len());
        for (name, division) in &config.division_types {
            let mut searches = Vec::new();
            for rule_name in &division.division_search_rules {
                let rule = config.division_search_rules.get(rule_name).ok_or_else(|| {
                    ConfigError::UnknownSearchRule {
                        division: name.clone(),
                        rule: rule_name.clone(),
                    }
                })?;
                let search = DivisionSearch::compile(rule_name, rule)?;
                let target = resolve(&search.target)?;
                searches.push(CompiledSearch { search, target });
            }

            let headings = match &division.numbering_rules {
                Some(rule_name) => {
                    let rule = config.numbering_rules.get(rule_name).ok_or_else(|| {
                        ConfigError::UnknownNumberingRule {
                            division: name.clone(),
                            rule: rule_name.clone(),
                        }
                    })?;
                    if !config.parsing_rules.contains_key(&rule.parsing_rules) {
                        return Err(ConfigError::UnknownParsingRules {
                            rule: rule_name.clone(),
                            parsing_rules: rule.parsing_rules.clone(),
                        });
                    }
                    let recognizer =
                        HeadingRecognizer::build(&rule.parsing_rules, &config.parsing_rules)?;
                    Some(NumberedHeadings {
                        rule: rule_name.clone(),
                        recognizer,
                        model: NumberingModel::from_rules(&rule.sequence_rules),
                    })
                }
                None => None,
            };

            debug!(
                "Compiled division '{}' ({} search rules, numbered: {})",
                name,
                searches.len(),
                headings.is_some()
            );
            divisions.push(CompiledDivision {
                name: name.clone(),
                searches,
                headings,
            });
        }

        let initial = resolve(&config.initial_division)?;

        Ok(Self {
            divisions,
            initial,
            layout: config.layout.clone(),
            pages: PageSelection::from_config(&config.pages)?,
            toc: TocParser::compile(&config.toc)?,
        })
    }

    pub fn initial_division(&self) -> usize {
        self.initial
    }

    pub fn division(&self, index: usize) -> &CompiledDivision {
        &self.divisions[index]
    }

    pub fn divisions(&self) -> &[CompiledDivision] {
        &self.divisions
    }
}
