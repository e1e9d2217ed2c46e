//! Assessment catalog entry

use serde::{Deserialize, Serialize};

pub const UNKNOWN: &str = "Unknown";

/// One assessment product as produced by catalog ingestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub test_type: String,
    /// Free-form, e.g. "45 minutes"; may be empty or "Unknown".
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub remote_testing: Option<String>,
    #[serde(default)]
    pub adaptive_irt: Option<String>,
    #[serde(default)]
    pub job_level: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub job_family: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl Item {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            description: String::new(),
            test_type: String::new(),
            duration: String::new(),
            remote_testing: None,
            adaptive_irt: None,
            job_level: None,
            industry: None,
            language: None,
            job_family: None,
            keywords: Vec::new(),
        }
    }

    /// Duration for display; blank durations read as "Unknown".
    pub fn display_duration(&self) -> String {
        if self.duration.trim().is_empty() {
            UNKNOWN.to_string()
        } else {
            self.duration.clone()
        }
    }

    pub fn display_remote_testing(&self) -> String {
        flag_or_unknown(self.remote_testing.as_deref())
    }

    pub fn display_adaptive_irt(&self) -> String {
        flag_or_unknown(self.adaptive_irt.as_deref())
    }

    /// True when the duration string carries no ASCII digit, i.e. when the
    /// duration filter cannot judge it.
    pub fn has_unknown_duration(&self) -> bool {
        !self.duration.chars().any(|c| c.is_ascii_digit())
    }
}

fn flag_or_unknown(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v.to_string(),
        _ => UNKNOWN.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_default_on_deserialize() {
        let item: Item = serde_json::from_str(r#"{"name": "Verify G+", "url": "https://example.com/verify"}"#).unwrap();
        assert_eq!(item.description, "");
        assert!(item.remote_testing.is_none());
        assert!(item.keywords.is_empty());
    }

    #[test]
    fn test_display_defaults() {
        let mut item = Item::new("OPQ32", "https://example.com/opq");
        assert_eq!(item.display_duration(), "Unknown");
        assert_eq!(item.display_remote_testing(), "Unknown");
        assert_eq!(item.display_adaptive_irt(), "Unknown");

        item.duration = "25 minutes".to_string();
        item.remote_testing = Some("Yes".to_string());
        item.adaptive_irt = Some(String::new());
        assert_eq!(item.display_duration(), "25 minutes");
        assert_eq!(item.display_remote_testing(), "Yes");
        assert_eq!(item.display_adaptive_irt(), "Unknown");
    }

    #[test]
    fn test_unknown_duration() {
        let mut item = Item::new("A", "u");
        item.duration = "Unknown".to_string();
        assert!(item.has_unknown_duration());
        item.duration = "about 30 min".to_string();
        assert!(!item.has_unknown_duration());
        item.duration = "\u{669}\u{660} minutes".to_string();
        assert!(item.has_unknown_duration());
    }
}
