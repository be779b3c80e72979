use crate::types::*;
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// Regenerated table of contents
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TocDocument {
    pub format: String,
    pub entries: Vec<TocLine>,
}

/// One plain-text chunk per section: heading line, then body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlatDocument {
    pub format: String,
    pub chunks: Vec<String>,
}

impl Outline {
    pub fn to_toc_format(&self) -> TocDocument {
        TocDocument {
            format: "toc".to_string(),
            entries: self.table_of_contents(),
        }
    }

    pub fn to_flat_format(&self) -> FlatDocument {
        let chunks = self
            .sections
            .iter()
            .map(|section| {
                let mut heading = section.number.clone();
                if let Some(title) = &section.title {
                    heading.push(' ');
                    heading.push_str(title);
                }
                format!("{}\n{}", heading, section.body_text)
            })
            .collect();

        FlatDocument {
            format: "flat".to_string(),
            chunks,
        }
    }

    /// Pretty JSON in one of the output formats: `outline`, `toc` or `flat`
    pub fn to_json_with_format(&self, format: &str) -> Result<String> {
        let json = match format {
            "outline" => serde_json::to_string_pretty(self)?,
            "toc" => serde_json::to_string_pretty(&self.to_toc_format())?,
            "flat" => serde_json::to_string_pretty(&self.to_flat_format())?,
            other => bail!("unknown output format '{}' (expected outline, toc or flat)", other),
        };
        Ok(json)
    }

    pub fn save_with_format(&self, path: &str, format: &str) -> Result<()> {
        let json = self.to_json_with_format(format)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn load_from_json(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let outline: Outline = serde_json::from_str(&content)?;
        Ok(outline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::BTreeMap;

    fn outline() -> Outline {
        let section = |id: usize, number: &str, title: &str, page: u32, body: &str| Section {
            id,
            division: "main".to_string(),
            number: number.to_string(),
            prefix: None,
            title: Some(title.to_string()),
            start_page: page,
            end_page: Some(page),
            body_text: body.to_string(),
            fields: BTreeMap::new(),
        };
        Outline {
            schema_version: SCHEMA_VERSION.to_string(),
            metadata: OutlineMetadata {
                created_at: Utc::now(),
                config_hash: "abc".to_string(),
                page_count: 2,
                section_count: 2,
            },
            sections: vec![
                section(0, "1", "Scope", 1, "Applies to pumps.\n"),
                section(1, "2", "Terms", 2, ""),
            ],
            toc_entries: Vec::new(),
            pages: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    #[test]
    fn test_flat_chunks() {
        let flat = outline().to_flat_format();
        assert_eq!(flat.format, "flat");
        assert_eq!(flat.chunks, vec!["1 Scope\nApplies to pumps.\n", "2 Terms\n"]);
    }

    #[test]
    fn test_toc_entries() {
        let toc = outline().to_toc_format();
        assert_eq!(toc.entries.len(), 2);
        assert_eq!(toc.entries[1].number, "2");
        assert_eq!(toc.entries[1].title.as_deref(), Some("Terms"));
    }

    #[test]
    fn test_unknown_format_rejected() {
        assert!(outline().to_json_with_format("graph").is_err());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("outline.json");
        let path = path.to_str().unwrap();

        let saved = outline();
        saved.save_with_format(path, "outline").unwrap();
        let reloaded = Outline::load_from_json(path).unwrap();
        assert_eq!(reloaded.sections, saved.sections);
        assert_eq!(reloaded.metadata.config_hash, "abc");
    }
}
