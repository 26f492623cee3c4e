//! Taxonomy options served by the options service.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Verticals and the exams/subjects scoped to each
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaxonomyOptions {
    #[serde(default)]
    pub verticals: Vec<String>,

    /// Exams (second level) keyed by vertical
    #[serde(default)]
    pub categories_by_vertical: HashMap<String, Vec<String>>,

    /// Subjects (third level) keyed by vertical
    #[serde(default, alias = "subcategories_by_vertical")]
    pub subjects_by_vertical: HashMap<String, Vec<String>>,

    /// Allowed values for `contentSubcategory`
    #[serde(default)]
    pub content_subcategories: Vec<String>,
}

impl TaxonomyOptions {
    pub fn is_empty(&self) -> bool {
        self.verticals.is_empty()
    }

    /// Exams selectable under `vertical` (empty if unknown)
    pub fn exams_for(&self, vertical: &str) -> &[String] {
        self.categories_by_vertical
            .get(vertical)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Subjects selectable under `vertical` (empty if unknown)
    pub fn subjects_for(&self, vertical: &str) -> &[String] {
        self.subjects_by_vertical
            .get(vertical)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TaxonomyOptions {
        serde_json::from_str(
            r#"{
                "verticals": ["SSC", "Teaching"],
                "categories_by_vertical": {"SSC": ["CGL", "CHSL"], "Teaching": ["CTET"]},
                "subjects_by_vertical": {"SSC": ["Maths", "Reasoning"]},
                "content_subcategories": ["Tips", "Strategy"]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_scoped_lookups() {
        let options = sample();
        assert_eq!(options.exams_for("SSC"), ["CGL", "CHSL"]);
        assert_eq!(options.subjects_for("SSC"), ["Maths", "Reasoning"]);
        assert!(options.subjects_for("Teaching").is_empty());
        assert!(options.exams_for("UGC").is_empty());
    }

    #[test]
    fn test_accepts_subcategories_spelling() {
        let options: TaxonomyOptions = serde_json::from_str(
            r#"{"verticals": ["Bank Pre"], "subcategories_by_vertical": {"Bank Pre": ["Quants"]}}"#,
        )
        .unwrap();
        assert_eq!(options.subjects_for("Bank Pre"), ["Quants"]);
        assert!(options.content_subcategories.is_empty());
    }

    #[test]
    fn test_missing_fields_default_empty() {
        let options: TaxonomyOptions = serde_json::from_str("{}").unwrap();
        assert!(options.is_empty());
    }
}
