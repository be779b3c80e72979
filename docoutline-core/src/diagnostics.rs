use serde::{Deserialize, Serialize};

/// Non-fatal condition met while building an outline, in emission order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// Body text seen before the first accepted heading; dropped
    UnsectionedText { page: u32, text: String },

    /// Heading-shaped text whose number is not a legal successor
    SequencingRejection {
        page: u32,
        text: String,
        candidate: String,
        previous: Option<String>,
        division: String,
        /// Whether the text went into the open section's body
        appended: bool,
    },

    DivisionSwitch {
        page: u32,
        text: String,
        from: String,
        to: String,
    },

    /// Block overlapped both an image and a table; the image won
    GeometryAmbiguity {
        page: u32,
        block_id: u32,
        image_index: u32,
        table_index: u32,
    },

    PageSkipped { page: u32, reason: String },
}

impl Diagnostic {
    pub fn page(&self) -> u32 {
        match self {
            Diagnostic::UnsectionedText { page, .. }
            | Diagnostic::SequencingRejection { page, .. }
            | Diagnostic::DivisionSwitch { page, .. }
            | Diagnostic::GeometryAmbiguity { page, .. }
            | Diagnostic::PageSkipped { page, .. } => *page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostics_serialize_with_kind_tag() {
        let diagnostic = Diagnostic::PageSkipped {
            page: 3,
            reason: "page 3 has unusable height 0".to_string(),
        };
        let json = serde_json::to_value(&diagnostic).unwrap();
        assert_eq!(json["kind"], "page_skipped");
        assert_eq!(json["page"], 3);
        assert_eq!(diagnostic.page(), 3);
    }
}
