use crate::error::ConfigError;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

fn default_entry_regex() -> String {
    r"^((?:\d+\.)+)\s+(.+)\s+(\d+)$".to_string()
}

fn default_entry_fields() -> Vec<TocField> {
    vec![
        TocField {
            name: "section_number".to_string(),
            group: GroupSpec::One(GroupRef::Index(1)),
        },
        TocField {
            name: "title".to_string(),
            group: GroupSpec::One(GroupRef::Index(2)),
        },
        TocField {
            name: "page_number".to_string(),
            group: GroupSpec::One(GroupRef::Index(3)),
        },
    ]
}

fn default_skip_prefixes() -> Vec<String> {
    vec!["Table of Contents".to_string(), "Contents".to_string()]
}

/// How lines on table-of-contents pages are turned into entries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TocConfig {
    #[serde(default = "default_entry_regex")]
    pub entry_regex: String,
    #[serde(default = "default_entry_fields")]
    pub entry_fields: Vec<TocField>,
    /// Lines starting with any of these are page headings, not entries
    #[serde(default = "default_skip_prefixes")]
    pub skip_prefixes: Vec<String>,
}

impl Default for TocConfig {
    fn default() -> Self {
        Self {
            entry_regex: default_entry_regex(),
            entry_fields: default_entry_fields(),
            skip_prefixes: default_skip_prefixes(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TocField {
    pub name: String,
    pub group: GroupSpec,
}

/// A capture group, or alternatives of which the first that participated wins
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GroupSpec {
    One(GroupRef),
    FirstOf(Vec<GroupRef>),
}

impl GroupSpec {
    fn refs(&self) -> &[GroupRef] {
        match self {
            GroupSpec::One(group) => std::slice::from_ref(group),
            GroupSpec::FirstOf(groups) => groups,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GroupRef {
    Index(usize),
    Name(String),
}

impl GroupRef {
    fn get<'t>(&self, captures: &Captures<'t>) -> Option<&'t str> {
        let m = match self {
            GroupRef::Index(i) => captures.get(*i),
            GroupRef::Name(name) => captures.name(name),
        };
        m.map(|m| m.as_str()).filter(|s| !s.is_empty())
    }

    fn exists_in(&self, regex: &Regex) -> bool {
        match self {
            GroupRef::Index(i) => *i < regex.captures_len(),
            GroupRef::Name(name) => regex.capture_names().flatten().any(|n| n == name),
        }
    }
}

impl std::fmt::Display for GroupRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GroupRef::Index(i) => write!(f, "{}", i),
            GroupRef::Name(name) => f.write_str(name),
        }
    }
}

/// One line parsed from the document's own table of contents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TocEntry {
    pub fields: BTreeMap<String, String>,
    /// Page the entry was printed on
    pub toc_page: u32,
}

#[derive(Debug, Clone)]
pub struct TocParser {
    entry_regex: Regex,
    fields: Vec<TocField>,
    skip_prefixes: Vec<String>,
}

impl TocParser {
    pub fn compile(config: &TocConfig) -> Result<Self, ConfigError> {
        let entry_regex =
            Regex::new(&config.entry_regex).map_err(|source| ConfigError::InvalidPattern {
                context: "toc entry_regex".to_string(),
                source,
            })?;

        for field in &config.entry_fields {
            if let Some(missing) = field.group.refs().iter().find(|g| !g.exists_in(&entry_regex)) {
                return Err(ConfigError::UnknownCaptureGroup {
                    rule: format!("toc field '{}'", field.name),
                    group: missing.to_string(),
                });
            }
        }

        Ok(Self {
            entry_regex,
            fields: config.entry_fields.clone(),
            skip_prefixes: config.skip_prefixes.clone(),
        })
    }

    /// Entries found in one body segment; a segment may span several lines
    pub fn parse_segment(&self, text: &str, toc_page: u32) -> Vec<TocEntry> {
        text.lines()
            .filter_map(|line| self.parse_line(line, toc_page))
            .collect()
    }

    pub fn parse_line(&self, line: &str, toc_page: u32) -> Option<TocEntry> {
        let line = line.trim();
        if line.is_empty() || self.skip_prefixes.iter().any(|p| line.starts_with(p.as_str())) {
            return None;
        }

        let captures = self.entry_regex.captures(line)?;
        let fields = self
            .fields
            .iter()
            .filter_map(|field| {
                field
                    .group
                    .refs()
                    .iter()
                    .find_map(|g| g.get(&captures))
                    .map(|value| (field.name.clone(), value.trim().to_string()))
            })
            .collect();

        Some(TocEntry { fields, toc_page })
    }
}
