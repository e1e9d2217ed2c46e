//! Loading and validating the assessment catalog

use crate::catalog::item::Item;
use crate::error::{RecommenderError, Result};
use log::info;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use tokio::fs;

/// Read-only, ordered sequence of catalog items. Positions are stable for
/// the lifetime of the value.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    items: Vec<Item>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CatalogStats {
    pub item_count: usize,
    pub test_types: BTreeMap<String, usize>,
    pub unknown_duration: usize,
    pub remote_testing: usize,
    pub tagged_items: usize,
}

impl Catalog {
    /// Load a catalog from a JSON array of items.
    pub async fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(RecommenderError::Catalog(format!(
                "Catalog file does not exist: {}",
                path.display()
            )));
        }

        let content = fs::read_to_string(path).await?;
        let items: Vec<Item> = serde_json::from_str(&content).map_err(|e| {
            RecommenderError::Catalog(format!("Failed to parse catalog '{}': {}", path.display(), e))
        })?;

        let catalog = Self::from_items(items)?;
        info!("Loaded {} assessments from {}", catalog.len(), path.display());
        Ok(catalog)
    }

    /// Build a catalog from items, rejecting unnamed entries and duplicate URLs.
    pub fn from_items(items: Vec<Item>) -> Result<Self> {
        let mut seen = HashSet::new();

        for (position, item) in items.iter().enumerate() {
            if item.name.trim().is_empty() {
                return Err(RecommenderError::Catalog(format!(
                    "Item at position {} has an empty name",
                    position
                )));
            }
            if item.url.trim().is_empty() {
                return Err(RecommenderError::Catalog(format!(
                    "Item '{}' has an empty url",
                    item.name
                )));
            }
            if !seen.insert(item.url.as_str()) {
                return Err(RecommenderError::Catalog(format!(
                    "Duplicate url '{}' (item '{}')",
                    item.url, item.name
                )));
            }
        }

        Ok(Self { items })
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Item> {
        self.items.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Item> {
        self.items.iter()
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn find_by_url(&self, url: &str) -> Option<&Item> {
        self.items.iter().find(|item| item.url == url)
    }

    pub fn into_items(self) -> Vec<Item> {
        self.items
    }

    pub fn stats(&self) -> CatalogStats {
        let mut test_types = BTreeMap::new();
        for item in &self.items {
            let key = if item.test_type.trim().is_empty() {
                "(none)".to_string()
            } else {
                item.test_type.clone()
            };
            *test_types.entry(key).or_insert(0) += 1;
        }

        CatalogStats {
            item_count: self.items.len(),
            test_types,
            unknown_duration: self.items.iter().filter(|i| i.has_unknown_duration()).count(),
            remote_testing: self
                .items
                .iter()
                .filter(|i| i.remote_testing.as_deref() == Some("Yes"))
                .count(),
            tagged_items: self
                .items
                .iter()
                .filter(|i| {
                    i.job_level.is_some()
                        || i.industry.is_some()
                        || i.language.is_some()
                        || i.job_family.is_some()
                })
                .count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn item(name: &str, url: &str) -> Item {
        Item::new(name, url)
    }

    #[test]
    fn test_duplicate_url_rejected() {
        let result = Catalog::from_items(vec![item("A", "https://x/a"), item("B", "https://x/a")]);
        assert!(matches!(result, Err(RecommenderError::Catalog(_))));
    }

    #[test]
    fn test_empty_name_rejected() {
        let result = Catalog::from_items(vec![item(" ", "https://x/a")]);
        assert!(matches!(result, Err(RecommenderError::Catalog(_))));
    }

    #[test]
    fn test_order_is_preserved() {
        let catalog = Catalog::from_items(vec![
            item("First", "https://x/1"),
            item("Second", "https://x/2"),
            item("Third", "https://x/3"),
        ])
        .unwrap();

        let names: Vec<&str> = catalog.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["First", "Second", "Third"]);
        assert_eq!(catalog.get(1).unwrap().name, "Second");
        assert_eq!(catalog.find_by_url("https://x/3").unwrap().name, "Third");
    }

    #[test]
    fn test_stats() {
        let mut a = item("A", "https://x/a");
        a.test_type = "Cognitive".to_string();
        a.duration = "30 minutes".to_string();
        a.remote_testing = Some("Yes".to_string());
        let mut b = item("B", "https://x/b");
        b.test_type = "Cognitive".to_string();
        b.job_level = Some("senior".to_string());
        let c = item("C", "https://x/c");

        let stats = Catalog::from_items(vec![a, b, c]).unwrap().stats();
        assert_eq!(stats.item_count, 3);
        assert_eq!(stats.test_types.get("Cognitive"), Some(&2));
        assert_eq!(stats.test_types.get("(none)"), Some(&1));
        assert_eq!(stats.unknown_duration, 2);
        assert_eq!(stats.remote_testing, 1);
        assert_eq!(stats.tagged_items, 1);
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("catalog.json");
        std::fs::write(
            &path,
            r#"[{"name": "Verify", "url": "https://x/verify", "duration": "18 minutes"}]"#,
        )
        .unwrap();

        let catalog = Catalog::load(&path).await.unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get(0).unwrap().duration, "18 minutes");
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let result = Catalog::load(Path::new("does/not/exist.json")).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_load_malformed_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("catalog.json");
        std::fs::write(&path, "{not json").unwrap();

        assert!(matches!(Catalog::load(&path).await, Err(RecommenderError::Catalog(_))));
    }
}
