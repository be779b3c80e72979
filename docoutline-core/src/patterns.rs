use crate::config::{DivisionSearchRule, Fragment, FragmentSet};
use crate::error::ConfigError;
use log::debug;
use regex::{Captures, Regex};
use std::collections::BTreeMap;

/// Fragment set whose entries every other set may reference
pub const COMMON_FRAGMENTS: &str = "common";

/// Heading recognizer assembled from an ordered list of regex fragments.
///
/// The pattern is anchored at the start of the text; each fragment is
/// wrapped in a non-capturing group and made optional unless the fragment
/// is flagged `required`.
#[derive(Debug, Clone)]
pub struct HeadingRecognizer {
    name: String,
    regex: Regex,
}

/// Fields captured from one heading line
#[derive(Debug, Clone, PartialEq)]
pub struct HeadingMatch {
    pub number: String,
    pub prefix: Option<String>,
    pub title: Option<String>,
    /// Every named group that participated in the match
    pub fields: BTreeMap<String, String>,
}

impl HeadingRecognizer {
    pub fn build(set_name: &str, sets: &BTreeMap<String, FragmentSet>) -> Result<Self, ConfigError> {
        let set = sets
            .get(set_name)
            .ok_or_else(|| ConfigError::UnknownParsingRules {
                rule: set_name.to_string(),
                parsing_rules: set_name.to_string(),
            })?;
        let common = sets.get(COMMON_FRAGMENTS);

        let mut pattern = String::from("^");
        for group in &set.regex_groups {
            let fragment = set
                .fragments
                .get(group)
                .or_else(|| common.and_then(|c| c.fragments.get(group)))
                .ok_or_else(|| ConfigError::UnknownFragment {
                    set: set_name.to_string(),
                    fragment: group.clone(),
                })?;
            pattern.push_str(&wrap_fragment(fragment));
        }

        let regex = Regex::new(&pattern).map_err(|source| ConfigError::InvalidPattern {
            context: format!("parsing rules '{}'", set_name),
            source,
        })?;
        if !regex.capture_names().flatten().any(|n| n == "number") {
            return Err(ConfigError::UnknownCaptureGroup {
                rule: format!("parsing rules '{}'", set_name),
                group: "number".to_string(),
            });
        }
        debug!("Built heading recognizer '{}': {}", set_name, pattern);

        Ok(Self {
            name: set_name.to_string(),
            regex,
        })
    }

    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }

    /// `None` when the text does not match or the match exposes no `number`.
    pub fn recognize(&self, text: &str) -> Option<HeadingMatch> {
        let captures = self.regex.captures(text)?;
        let fields = named_fields(&self.regex, &captures);

        let Some(number) = fields.get("number").filter(|n| !n.trim().is_empty()) else {
            debug!(
                "Recognizer '{}' matched '{}' without a number group",
                self.name, text
            );
            return None;
        };

        Some(HeadingMatch {
            number: number.trim().to_string(),
            prefix: non_blank(fields.get("prefix")),
            title: non_blank(fields.get("title")),
            fields,
        })
    }
}

fn wrap_fragment(fragment: &Fragment) -> String {
    if fragment.is_required() {
        format!("(?:{})", fragment.regex())
    } else {
        format!("(?:{})?", fragment.regex())
    }
}

fn named_fields(regex: &Regex, captures: &Captures<'_>) -> BTreeMap<String, String> {
    regex
        .capture_names()
        .flatten()
        .filter_map(|name| {
            captures
                .name(name)
                .map(|m| (name.to_string(), m.as_str().to_string()))
        })
        .collect()
}

fn non_blank(value: Option<&String>) -> Option<String> {
    value
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Structural marker such as `Annex B` that switches the active division
#[derive(Debug, Clone)]
pub struct DivisionSearch {
    pub name: String,
    /// Division entered on a match
    pub target: String,
    regex: Regex,
    number_group: Option<String>,
    prefix_group: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DivisionMarker {
    /// Becomes the last accepted number of the new division
    pub number: Option<String>,
    pub prefix: Option<String>,
}

impl DivisionSearch {
    pub fn compile(name: &str, rule: &DivisionSearchRule) -> Result<Self, ConfigError> {
        let regex = Regex::new(&format!("^(?:{})", rule.regex)).map_err(|source| {
            ConfigError::InvalidPattern {
                context: format!("division search rule '{}'", name),
                source,
            }
        })?;

        for group in [&rule.number_match_group, &rule.prefix_match_group]
            .into_iter()
            .flatten()
        {
            if !regex.capture_names().flatten().any(|n| n == group) {
                return Err(ConfigError::UnknownCaptureGroup {
                    rule: name.to_string(),
                    group: group.clone(),
                });
            }
        }

        Ok(Self {
            name: name.to_string(),
            target: rule.division.clone().unwrap_or_else(|| name.to_string()),
            regex,
            number_group: rule.number_match_group.clone(),
            prefix_group: rule.prefix_match_group.clone(),
        })
    }

    pub fn find(&self, text: &str) -> Option<DivisionMarker> {
        let captures = self.regex.captures(text)?;
        let group = |name: &Option<String>| {
            name.as_deref()
                .and_then(|n| captures.name(n))
                .map(|m| m.as_str().trim().to_string())
                .filter(|v| !v.is_empty())
        };
        Some(DivisionMarker {
            number: group(&self.number_group),
            prefix: group(&self.prefix_group),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sets() -> BTreeMap<String, FragmentSet> {
        let mut sets = BTreeMap::new();
        sets.insert(
            COMMON_FRAGMENTS.to_string(),
            FragmentSet {
                regex_groups: Vec::new(),
                fragments: BTreeMap::from([(
                    "title".to_string(),
                    Fragment::Pattern(r"\s+(?P<title>.+)".to_string()),
                )]),
            },
        );
        sets.insert(
            "numbered".to_string(),
            FragmentSet {
                regex_groups: vec!["number".to_string(), "title".to_string()],
                fragments: BTreeMap::from([(
                    "number".to_string(),
                    Fragment::Detailed {
                        regex: r"(?P<number>\d+(?:\.\d+)*)\.?".to_string(),
                        required: true,
                    },
                )]),
            },
        );
        sets.insert(
            "annex".to_string(),
            FragmentSet {
                regex_groups: vec!["label".to_string(), "number".to_string(), "title".to_string()],
                fragments: BTreeMap::from([
                    (
                        "label".to_string(),
                        Fragment::Detailed {
                            regex: r"(?P<label>Annex)\s+".to_string(),
                            required: true,
                        },
                    ),
                    (
                        "number".to_string(),
                        Fragment::Detailed {
                            regex: r"(?P<prefix>[A-Z])(?P<number>(?:\.\d+)*)".to_string(),
                            required: true,
                        },
                    ),
                    (
                        "title".to_string(),
                        Fragment::Pattern(r"\s+[-:]\s+(?P<title>.+)".to_string()),
                    ),
                ]),
            },
        );
        sets
    }

    #[test]
    fn test_numbered_heading_recognized() {
        let recognizer = HeadingRecognizer::build("numbered", &sets()).unwrap();
        assert_eq!(recognizer.pattern(), r"^(?:(?P<number>\d+(?:\.\d+)*)\.?)(?:\s+(?P<title>.+))?");

        let heading = recognizer.recognize("3.2 Test Setup").unwrap();
        assert_eq!(heading.number, "3.2");
        assert_eq!(heading.title.as_deref(), Some("Test Setup"));
        assert!(heading.prefix.is_none());
        assert_eq!(heading.fields.len(), 2);
    }

    #[test]
    fn test_optional_fragment_may_be_absent() {
        let recognizer = HeadingRecognizer::build("numbered", &sets()).unwrap();
        let heading = recognizer.recognize("7").unwrap();
        assert_eq!(heading.number, "7");
        assert!(heading.title.is_none());
        assert!(!heading.fields.contains_key("title"));

        assert!(recognizer.recognize("Scope of work").is_none());
    }

    #[test]
    fn test_set_fragment_overrides_common() {
        let recognizer = HeadingRecognizer::build("annex", &sets()).unwrap();
        let heading = recognizer.recognize("Annex B.2 - Calibration").unwrap();
        assert_eq!(heading.prefix.as_deref(), Some("B"));
        assert_eq!(heading.number, ".2");
        assert_eq!(heading.title.as_deref(), Some("Calibration"));
        assert_eq!(heading.fields["label"], "Annex");
    }

    #[test]
    fn test_empty_number_group_is_no_match() {
        let recognizer = HeadingRecognizer::build("annex", &sets()).unwrap();
        assert!(recognizer.recognize("Annex C").is_none());
    }

    #[test]
    fn test_unknown_fragment_fails_at_build() {
        let mut sets = sets();
        if let Some(set) = sets.get_mut("numbered") {
            set.regex_groups.push("suffix".to_string());
        }
        let err = HeadingRecognizer::build("numbered", &sets).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::UnknownFragment { ref set, ref fragment } if set == "numbered" && fragment == "suffix"
        ));
    }

    #[test]
    fn test_invalid_fragment_regex() {
        let mut sets = sets();
        sets.insert(
            "broken".to_string(),
            FragmentSet {
                regex_groups: vec!["number".to_string()],
                fragments: BTreeMap::from([(
                    "number".to_string(),
                    Fragment::Pattern("(?P<number>[0-9".to_string()),
                )]),
            },
        );
        assert!(matches!(
            HeadingRecognizer::build("broken", &sets),
            Err(ConfigError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_recognizer_without_number_group_fails_at_build() {
        let mut sets = sets();
        sets.insert(
            "titles".to_string(),
            FragmentSet {
                regex_groups: vec!["title".to_string()],
                fragments: BTreeMap::new(),
            },
        );
        assert!(matches!(
            HeadingRecognizer::build("titles", &sets),
            Err(ConfigError::UnknownCaptureGroup { ref group, .. }) if group == "number"
        ));
    }

    #[test]
    fn test_division_search_extracts_prefix() {
        let rule = DivisionSearchRule {
            regex: r"Annex\s+(?P<letter>[A-Z])".to_string(),
            number_match_group: None,
            prefix_match_group: Some("letter".to_string()),
            division: Some("annex".to_string()),
        };
        let search = DivisionSearch::compile("annex_marker", &rule).unwrap();
        assert_eq!(search.target, "annex");

        let marker = search.find("Annex D (informative)").unwrap();
        assert_eq!(marker.prefix.as_deref(), Some("D"));
        assert!(marker.number.is_none());

        // anchored at the start of the text
        assert!(search.find("see Annex D").is_none());
    }

    #[test]
    fn test_division_search_group_must_exist() {
        let rule = DivisionSearchRule {
            regex: r"Appendix\s+\d+".to_string(),
            number_match_group: Some("num".to_string()),
            prefix_match_group: None,
            division: None,
        };
        assert!(matches!(
            DivisionSearch::compile("appendix", &rule),
            Err(ConfigError::UnknownCaptureGroup { .. })
        ));
    }
}
