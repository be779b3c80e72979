use crate::error::ConfigError;
use crate::numbering::IncrementFn;
use crate::toc::TocConfig;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

// Default value functions for serde
fn default_initial_division() -> String {
    "main".to_string()
}

fn default_separator() -> String {
    ".".to_string()
}

fn default_header_size() -> f64 {
    0.07
}

fn default_footer_size() -> f64 {
    0.07
}

fn default_overlap_tolerance() -> f64 {
    crate::geometry::DEFAULT_OVERLAP_TOLERANCE
}

/// Complete declarative configuration for one outline run.
///
/// Maps are ordered so the serialized form (and the fingerprint) is stable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutlineConfig {
    /// Division active when the document starts
    #[serde(default = "default_initial_division")]
    pub initial_division: String,
    #[serde(default)]
    pub layout: LayoutConfig,
    #[serde(default)]
    pub pages: PageSelectionConfig,
    #[serde(default)]
    pub toc: TocConfig,
    pub division_types: BTreeMap<String, DivisionType>,
    #[serde(default)]
    pub division_search_rules: BTreeMap<String, DivisionSearchRule>,
    #[serde(default)]
    pub numbering_rules: BTreeMap<String, NumberingRule>,
    #[serde(default)]
    pub parsing_rules: BTreeMap<String, FragmentSet>,
}

/// Header/footer bands and overlap jitter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Header band as a fraction of page height, measured from the top
    #[serde(default = "default_header_size")]
    pub header_size: f64,
    /// Footer band as a fraction of page height, measured from the bottom
    #[serde(default = "default_footer_size")]
    pub footer_size: f64,
    /// Expansion applied to both rectangles before testing overlap (points)
    #[serde(default = "default_overlap_tolerance")]
    pub overlap_tolerance: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            header_size: default_header_size(),
            footer_size: default_footer_size(),
            overlap_tolerance: default_overlap_tolerance(),
        }
    }
}

impl LayoutConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fraction = |v: f64| v.is_finite() && (0.0..1.0).contains(&v);
        if !fraction(self.header_size) || !fraction(self.footer_size) {
            return Err(ConfigError::InvalidLayout(format!(
                "header_size {} and footer_size {} must be fractions in [0, 1)",
                self.header_size, self.footer_size
            )));
        }
        if self.header_size + self.footer_size >= 1.0 {
            return Err(ConfigError::InvalidLayout(format!(
                "header_size {} and footer_size {} leave no body area",
                self.header_size, self.footer_size
            )));
        }
        if !self.overlap_tolerance.is_finite() || self.overlap_tolerance < 0.0 {
            return Err(ConfigError::InvalidLayout(format!(
                "overlap_tolerance {} must be a non-negative number",
                self.overlap_tolerance
            )));
        }
        Ok(())
    }
}

/// Page-range strings such as `"1-3,7,10-"`; `None` means the default
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageSelectionConfig {
    #[serde(default)]
    pub main_pages: Option<String>,
    #[serde(default)]
    pub exclude_pages: Option<String>,
    #[serde(default)]
    pub toc_pages: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DivisionType {
    /// Recognizers that force a switch to another division
    #[serde(default)]
    pub division_search_rules: Vec<String>,
    /// Numbering rule for headings in this division (none = no headings)
    #[serde(default)]
    pub numbering_rules: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DivisionSearchRule {
    pub regex: String,
    /// Group whose text becomes the last accepted number after the switch
    #[serde(default, alias = "number_match")]
    pub number_match_group: Option<String>,
    /// Group whose text becomes the division prefix (e.g. the annex letter)
    #[serde(default, alias = "prefix_match")]
    pub prefix_match_group: Option<String>,
    /// Division entered on a match; defaults to the rule's own name
    #[serde(default)]
    pub division: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NumberingRule {
    /// Name of the fragment set in `parsing_rules`
    pub parsing_rules: String,
    pub sequence_rules: SequenceRules,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequenceRules {
    /// Numbers allowed as the first heading of a division
    #[serde(alias = "initial_numbers")]
    pub initial_section_number: Vec<String>,
    /// Values a freshly opened sub-level may start with
    pub level_starts: Vec<u32>,
    pub increment: IncrementFn,
    #[serde(default = "default_separator")]
    pub separator: String,
    /// Also accept the next sibling at the same depth below the top level
    #[serde(default)]
    pub sibling_steps: bool,
}

/// Ordered regex fragments that together make one heading recognizer.
///
/// The set named `common` lends its fragments to every other set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FragmentSet {
    #[serde(default)]
    pub regex_groups: Vec<String>,
    #[serde(flatten)]
    pub fragments: BTreeMap<String, Fragment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Fragment {
    Detailed {
        regex: String,
        #[serde(default)]
        required: bool,
    },
    /// Bare pattern, always optional
    Pattern(String),
}

impl Fragment {
    pub fn regex(&self) -> &str {
        match self {
            Fragment::Detailed { regex, .. } => regex,
            Fragment::Pattern(regex) => regex,
        }
    }

    pub fn is_required(&self) -> bool {
        matches!(self, Fragment::Detailed { required: true, .. })
    }
}

/// Values supplied on the command line. Anything set here wins over the
/// rule file, which in turn wins over the built-in defaults.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub initial_division: Option<String>,
    pub header_size: Option<f64>,
    pub footer_size: Option<f64>,
    pub overlap_tolerance: Option<f64>,
    pub main_pages: Option<String>,
    pub exclude_pages: Option<String>,
    pub toc_pages: Option<String>,
}

impl OutlineConfig {
    /// Load config from a YAML rule file
    pub fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        let config: OutlineConfig = serde_yaml::from_str(content)?;
        Ok(config)
    }

    /// Rule file if given, built-in rules otherwise
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::load_from_file(p),
            None => Ok(Self::default()),
        }
    }

    /// Apply command-line overrides on top of this configuration
    pub fn merged(mut self, overrides: &ConfigOverrides) -> Self {
        if let Some(division) = &overrides.initial_division {
            self.initial_division = division.clone();
        }
        if let Some(header_size) = overrides.header_size {
            self.layout.header_size = header_size;
        }
        if let Some(footer_size) = overrides.footer_size {
            self.layout.footer_size = footer_size;
        }
        if let Some(tolerance) = overrides.overlap_tolerance {
            self.layout.overlap_tolerance = tolerance;
        }
        if overrides.main_pages.is_some() {
            self.pages.main_pages = overrides.main_pages.clone();
        }
        if overrides.exclude_pages.is_some() {
            self.pages.exclude_pages = overrides.exclude_pages.clone();
        }
        if overrides.toc_pages.is_some() {
            self.pages.toc_pages = overrides.toc_pages.clone();
        }
        self
    }

    /// SHA-256 over the canonical JSON form of this configuration
    pub fn fingerprint(&self) -> Result<String, ConfigError> {
        let config_json = serde_json::to_string(self)?;
        let mut hasher = Sha256::new();
        hasher.update(config_json.as_bytes());
        Ok(format!("{:x}", hasher.finalize()))
    }

    pub fn to_yaml_string(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }
}

impl Default for OutlineConfig {
    /// Numbered main body plus lettered annexes ("Annex B" ... "B.1 Scope")
    fn default() -> Self {
        let mut division_types = BTreeMap::new();
        division_types.insert(
            "main".to_string(),
            DivisionType {
                division_search_rules: vec!["annex".to_string()],
                numbering_rules: Some("numeric".to_string()),
            },
        );
        division_types.insert(
            "annex".to_string(),
            DivisionType {
                division_search_rules: vec!["annex".to_string()],
                numbering_rules: Some("annex_numeric".to_string()),
            },
        );

        let mut division_search_rules = BTreeMap::new();
        division_search_rules.insert(
            "annex".to_string(),
            DivisionSearchRule {
                regex: r"^(?:ANNEX|Annex)\s+(?P<letter>[A-Z])\b".to_string(),
                number_match_group: None,
                prefix_match_group: Some("letter".to_string()),
                division: None,
            },
        );

        let mut numbering_rules = BTreeMap::new();
        numbering_rules.insert(
            "numeric".to_string(),
            NumberingRule {
                parsing_rules: "numeric_heading".to_string(),
                sequence_rules: SequenceRules {
                    initial_section_number: ["1", "1.0", "0", "0.0", "0.1"]
                        .iter()
                        .map(|s| s.to_string())
                        .collect(),
                    level_starts: vec![0, 1],
                    increment: IncrementFn::Numeric,
                    separator: default_separator(),
                    sibling_steps: false,
                },
            },
        );
        numbering_rules.insert(
            "annex_numeric".to_string(),
            NumberingRule {
                parsing_rules: "annex_heading".to_string(),
                sequence_rules: SequenceRules {
                    initial_section_number: ["A", "A.1", "A.0"]
                        .iter()
                        .map(|s| s.to_string())
                        .collect(),
                    level_starts: vec![0, 1],
                    increment: IncrementFn::Alphabetic,
                    separator: default_separator(),
                    sibling_steps: false,
                },
            },
        );

        let mut parsing_rules = BTreeMap::new();
        parsing_rules.insert(
            "common".to_string(),
            FragmentSet {
                regex_groups: Vec::new(),
                fragments: BTreeMap::from([(
                    "title".to_string(),
                    Fragment::Detailed {
                        regex: r"\s+(?P<title>\S.*)".to_string(),
                        required: false,
                    },
                )]),
            },
        );
        parsing_rules.insert(
            "numeric_heading".to_string(),
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
        parsing_rules.insert(
            "annex_heading".to_string(),
            FragmentSet {
                regex_groups: vec!["number".to_string(), "title".to_string()],
                fragments: BTreeMap::from([(
                    "number".to_string(),
                    Fragment::Detailed {
                        regex: r"(?P<number>[A-Z](?:\.\d+)+)\.?".to_string(),
                        required: true,
                    },
                )]),
            },
        );

        Self {
            initial_division: default_initial_division(),
            layout: LayoutConfig::default(),
            pages: PageSelectionConfig::default(),
            toc: TocConfig::default(),
            division_types,
            division_search_rules,
            numbering_rules,
            parsing_rules,
        }
    }
}
