//! Hierarchical section numbers and successor validation.
//!
//! A number such as `4.2.1` or `B.3` is split on the model's separator into
//! parts. Given the last accepted number, a candidate is a legal successor
//! when it either opens a sub-level (`4.2.1 -> 4.2.1.0`) or climbs back up
//! and increments (`4.2.1 -> 4.3`, `4.2.1 -> 5`, `4.2.1 -> 5.1`).

use crate::config::SequenceRules;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a single part advances to its successor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IncrementFn {
    /// Integers count up; letters have no successor
    Numeric,
    /// Letters advance `A -> B`, integers count up
    #[serde(alias = "letter")]
    Alphabetic,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NumberPart {
    Numeric(u64),
    Letter(char),
    /// Anything else (roman numerals, mixed tokens); compared, never incremented
    Other(String),
}

impl NumberPart {
    pub fn parse(text: &str) -> Self {
        if !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(value) = text.parse() {
                return NumberPart::Numeric(value);
            }
        }
        let mut chars = text.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if c.is_ascii_alphabetic() => NumberPart::Letter(c),
            _ => NumberPart::Other(text.to_string()),
        }
    }

    pub fn increment(&self, increment: IncrementFn) -> Option<Self> {
        match (self, increment) {
            (NumberPart::Numeric(n), _) => n.checked_add(1).map(NumberPart::Numeric),
            (NumberPart::Letter(c), IncrementFn::Alphabetic) => match c {
                'z' | 'Z' => None,
                _ => char::from_u32(*c as u32 + 1).map(NumberPart::Letter),
            },
            (NumberPart::Letter(_), IncrementFn::Numeric) => None,
            (NumberPart::Other(_), _) => None,
        }
    }

    pub fn is_letter(&self) -> bool {
        matches!(self, NumberPart::Letter(_))
    }
}

impl fmt::Display for NumberPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumberPart::Numeric(n) => write!(f, "{}", n),
            NumberPart::Letter(c) => write!(f, "{}", c),
            NumberPart::Other(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SectionNumber {
    parts: Vec<NumberPart>,
}

impl SectionNumber {
    /// Split `text` on `separator`. Surrounding whitespace and stray
    /// separators (`"3.1."`) are ignored.
    pub fn parse(text: &str, separator: &str) -> Self {
        let trimmed = trim_separators(text.trim(), separator);
        if trimmed.is_empty() {
            return Self::default();
        }
        let parts = if separator.is_empty() {
            vec![NumberPart::parse(trimmed)]
        } else {
            trimmed
                .split(separator)
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(NumberPart::parse)
                .collect()
        };
        Self { parts }
    }

    pub fn from_parts(parts: Vec<NumberPart>) -> Self {
        Self { parts }
    }

    pub fn parts(&self) -> &[NumberPart] {
        &self.parts
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn render(&self, separator: &str) -> String {
        self.parts
            .iter()
            .map(|p| p.to_string())
            .collect::<Vec<_>>()
            .join(separator)
    }
}

fn trim_separators<'a>(mut text: &'a str, separator: &str) -> &'a str {
    if separator.is_empty() {
        return text;
    }
    loop {
        let before = text.len();
        text = text.trim();
        if let Some(rest) = text.strip_prefix(separator) {
            text = rest;
        }
        if let Some(rest) = text.strip_suffix(separator) {
            text = rest;
        }
        if text.len() == before {
            return text;
        }
    }
}

/// Sequencing rules of one division, ready for validation
#[derive(Debug, Clone)]
pub struct NumberingModel {
    pub initial_numbers: Vec<SectionNumber>,
    pub level_starts: Vec<u64>,
    pub increment: IncrementFn,
    pub separator: String,
    /// Accept `1.2 -> 1.3` (same-depth sibling) in addition to the climb rule
    pub sibling_steps: bool,
}

impl NumberingModel {
    pub fn from_rules(rules: &SequenceRules) -> Self {
        Self {
            initial_numbers: rules
                .initial_section_number
                .iter()
                .map(|n| SectionNumber::parse(n, &rules.separator))
                .collect(),
            level_starts: rules.level_starts.iter().map(|&s| u64::from(s)).collect(),
            increment: rules.increment,
            separator: rules.separator.clone(),
            sibling_steps: rules.sibling_steps,
        }
    }

    pub fn parse(&self, text: &str) -> SectionNumber {
        SectionNumber::parse(text, &self.separator)
    }

    /// Put `prefix` in front of a number captured without it (`1` under
    /// prefix `B` becomes `B.1`). Numbers that already carry it are returned
    /// unchanged.
    pub fn qualify(&self, number: SectionNumber, prefix: Option<&str>) -> SectionNumber {
        let Some(prefix) = prefix
            .map(|p| SectionNumber::parse(p, &self.separator))
            .filter(|p| !p.is_empty())
        else {
            return number;
        };
        if number.parts.starts_with(&prefix.parts) {
            return number;
        }
        let mut parts = prefix.parts;
        parts.extend(number.parts);
        SectionNumber::from_parts(parts)
    }

    /// Decide whether `candidate` may follow `prev` in a division whose
    /// numbers carry `prefix` as their first part.
    pub fn is_valid_successor(
        &self,
        prev: Option<&SectionNumber>,
        candidate: &SectionNumber,
        prefix: Option<&str>,
    ) -> bool {
        let prefix = prefix
            .map(|p| SectionNumber::parse(p, &self.separator))
            .filter(|p| !p.is_empty());

        let candidate_parts = match &prefix {
            Some(prefix) => match candidate.parts.strip_prefix(prefix.parts.as_slice()) {
                Some(rest) => rest,
                None => return false,
            },
            None => candidate.parts.as_slice(),
        };

        match prev {
            None => self.initial_numbers.iter().any(|initial| {
                let template = match (&prefix, initial.parts.first()) {
                    (Some(_), Some(first)) if first.is_letter() => &initial.parts[1..],
                    _ => initial.parts.as_slice(),
                };
                template == candidate_parts
            }),
            Some(prev) => {
                let prev_parts = match &prefix {
                    Some(prefix) => prev
                        .parts
                        .strip_prefix(prefix.parts.as_slice())
                        .unwrap_or(prev.parts.as_slice()),
                    None => prev.parts.as_slice(),
                };
                self.successor_parts(prev_parts)
                    .iter()
                    .any(|next| next.as_slice() == candidate_parts)
            }
        }
    }

    /// Every legal successor of `prev`, descending first then climbing from
    /// the deepest level to the top.
    pub fn successors(&self, prev: &SectionNumber) -> Vec<SectionNumber> {
        self.successor_parts(&prev.parts)
            .into_iter()
            .map(SectionNumber::from_parts)
            .collect()
    }

    fn successor_parts(&self, parts: &[NumberPart]) -> Vec<Vec<NumberPart>> {
        let mut out = Vec::new();

        // descend: each child is built from its own copy of the parent
        for &start in &self.level_starts {
            let mut child = parts.to_vec();
            child.push(NumberPart::Numeric(start));
            out.push(child);
        }

        // ascend: the climbed prefix must drop a level unless it is the top
        let deepest = match parts.len() {
            0 => 0,
            1 => 1,
            n if self.sibling_steps => n,
            n => n - 1,
        };
        for len in (1..=deepest).rev() {
            let mut ascended = parts[..len].to_vec();
            let Some(next) = ascended[len - 1].increment(self.increment) else {
                continue;
            };
            ascended[len - 1] = next;

            if len == 1 {
                for &start in &self.level_starts {
                    let mut child = ascended.clone();
                    child.push(NumberPart::Numeric(start));
                    out.push(child);
                }
            }
            out.push(ascended);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn numeric_model() -> NumberingModel {
        NumberingModel::from_rules(&SequenceRules {
            initial_section_number: ["1", "1.0", "0", "0.0", "0.1"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            level_starts: vec![0, 1],
            increment: IncrementFn::Numeric,
            separator: ".".to_string(),
            sibling_steps: false,
        })
    }

    fn annex_model() -> NumberingModel {
        NumberingModel::from_rules(&SequenceRules {
            initial_section_number: ["A", "A.1", "A.0"].iter().map(|s| s.to_string()).collect(),
            level_starts: vec![0, 1],
            increment: IncrementFn::Alphabetic,
            separator: ".".to_string(),
            sibling_steps: false,
        })
    }

    fn valid(model: &NumberingModel, prev: Option<&str>, candidate: &str) -> bool {
        let prev = prev.map(|p| model.parse(p));
        model.is_valid_successor(prev.as_ref(), &model.parse(candidate), None)
    }

    fn successor_set(model: &NumberingModel, prev: &str) -> BTreeSet<String> {
        model
            .successors(&model.parse(prev))
            .iter()
            .map(|n| n.render("."))
            .collect()
    }

    #[test]
    fn test_part_parsing() {
        assert_eq!(NumberPart::parse("12"), NumberPart::Numeric(12));
        assert_eq!(NumberPart::parse("B"), NumberPart::Letter('B'));
        assert_eq!(NumberPart::parse("IV"), NumberPart::Other("IV".to_string()));
        assert_eq!(NumberPart::parse(""), NumberPart::Other(String::new()));
    }

    #[test]
    fn test_number_parsing_trims_separators() {
        let number = SectionNumber::parse(" 3.1. ", ".");
        assert_eq!(
            number.parts(),
            &[NumberPart::Numeric(3), NumberPart::Numeric(1)]
        );
        assert_eq!(number.render("."), "3.1");
        assert!(SectionNumber::parse(" . ", ".").is_empty());
    }

    #[test]
    fn test_increment_functions() {
        assert_eq!(
            NumberPart::Numeric(9).increment(IncrementFn::Numeric),
            Some(NumberPart::Numeric(10))
        );
        assert_eq!(
            NumberPart::Letter('A').increment(IncrementFn::Alphabetic),
            Some(NumberPart::Letter('B'))
        );
        assert_eq!(NumberPart::Letter('Z').increment(IncrementFn::Alphabetic), None);
        assert_eq!(NumberPart::Letter('A').increment(IncrementFn::Numeric), None);
        assert_eq!(NumberPart::Other("IV".into()).increment(IncrementFn::Numeric), None);
    }

    #[test]
    fn test_first_heading_must_be_initial() {
        let model = numeric_model();
        assert!(valid(&model, None, "1"));
        assert!(valid(&model, None, "0.1"));
        assert!(!valid(&model, None, "2"));
        assert!(!valid(&model, None, "1.1"));
    }

    #[test]
    fn test_successors_of_top_level() {
        let model = numeric_model();
        let expected: BTreeSet<String> = ["1.0", "1.1", "2", "2.0", "2.1"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(successor_set(&model, "1"), expected);

        assert!(!valid(&model, Some("1"), "3"));
        assert!(!valid(&model, Some("1"), "1.2"));
    }

    #[test]
    fn test_successors_of_second_level() {
        let model = numeric_model();
        for candidate in ["1.2.0", "1.2.1", "2", "2.0", "2.1"] {
            assert!(valid(&model, Some("1.2"), candidate), "{} should follow 1.2", candidate);
        }
        assert!(!valid(&model, Some("1.2"), "1.3"));
        assert!(!valid(&model, Some("1.2"), "1.2.2"));
    }

    #[test]
    fn test_deep_numbers_climb_one_level_at_a_time() {
        let model = numeric_model();
        assert!(valid(&model, Some("4.2.1"), "4.3"));
        assert!(valid(&model, Some("4.2.1"), "5"));
        assert!(!valid(&model, Some("4.2.1"), "4.2.2"));
        assert!(!valid(&model, Some("4.2.1"), "4.3.1"));
    }

    #[test]
    fn test_sibling_steps() {
        let mut model = numeric_model();
        model.sibling_steps = true;
        assert!(valid(&model, Some("1.2"), "1.3"));
        assert!(valid(&model, Some("4.2.1"), "4.2.2"));
        assert!(valid(&model, Some("1"), "2"));
        assert!(!valid(&model, Some("1.2"), "1.4"));
    }

    #[test]
    fn test_level_start_children_do_not_accumulate() {
        let model = numeric_model();
        let successors = successor_set(&model, "3");
        assert!(!successors.contains("3.0.1"));
        assert!(successors.iter().all(|s| s.split('.').count() <= 2));
    }

    #[test]
    fn test_annex_prefix() {
        let model = annex_model();
        let check = |prev: Option<&str>, candidate: &str| {
            let prev = prev.map(|p| model.parse(p));
            model.is_valid_successor(prev.as_ref(), &model.parse(candidate), Some("A"))
        };

        assert!(check(None, "A"));
        assert!(check(None, "A.1"));
        assert!(!check(None, "A.2"));
        assert!(check(Some("A.1"), "A.2"));
        assert!(check(Some("A.1"), "A.1.0"));
        assert!(!check(Some("A.1"), "B"));
        assert!(!check(Some("A.1"), "B.2"));
    }

    #[test]
    fn test_prefix_templates_follow_the_active_prefix() {
        let model = annex_model();
        let b1 = model.parse("B.1");
        assert!(model.is_valid_successor(None, &b1, Some("B")));
        assert!(!model.is_valid_successor(None, &b1, Some("C")));

        let prev = model.parse("B");
        assert!(model.is_valid_successor(Some(&prev), &model.parse("B.0"), Some("B")));
    }

    #[test]
    fn test_qualify_adds_missing_prefix() {
        let model = annex_model();
        assert_eq!(model.qualify(model.parse("1"), Some("B")).render("."), "B.1");
        assert_eq!(model.qualify(model.parse(".2"), Some("B")).render("."), "B.2");
        assert_eq!(model.qualify(model.parse("B.3"), Some("B")).render("."), "B.3");
        assert_eq!(model.qualify(model.parse("4"), None).render("."), "4");
    }

    #[test]
    fn test_letters_increment_without_prefix() {
        let model = annex_model();
        assert!(valid(&model, None, "A"));
        assert!(valid(&model, Some("A.3"), "B"));
        assert!(valid(&model, Some("A.3"), "B.1"));
        assert!(!valid(&model, Some("Z.1"), "AA"));
    }
}
