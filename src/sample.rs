use async_trait::async_trait;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, instrument};

/// One thing to guess: a track, its picture and its acceptable answers
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// Shown once the round is over
    pub track_title: String,
    /// Canonical answer
    pub title: String,
    /// Other accepted spellings of the answer
    pub aliases: Vec<String>,
    pub image_url: String,
    pub image_data: Vec<u8>,
}

impl Sample {
    /// Every string a guess is compared against, canonical title first
    pub fn solutions(&self) -> Vec<&str> {
        std::iter::once(self.title.as_str())
            .chain(self.aliases.iter().map(String::as_str))
            .filter(|solution| !solution.trim().is_empty())
            .collect()
    }

    pub fn has_solution(&self) -> bool {
        !self.solutions().is_empty()
    }

    /// File name of the image, taken from the last path segment of its URL
    pub fn image_filename(&self) -> &str {
        self.image_url
            .rsplit('/')
            .next()
            .filter(|name| !name.is_empty())
            .unwrap_or("sample")
    }
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("No sample available: {0}")]
    Unavailable(String),

    #[error("Failed to read catalog: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed catalog: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Source of samples for a game
#[async_trait]
pub trait SampleProvider: Send + Sync {
    /// Fetch a random sample. With `require_solution`, the sample is
    /// guaranteed to have at least one acceptable answer.
    async fn fetch_random_sample(&self, require_solution: bool) -> Result<Sample, ProviderError>;
}

/// Catalog file entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub track_title: String,
    pub title: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub image_url: String,
    /// Local image file, read when the entry is picked
    #[serde(default)]
    pub image_path: Option<PathBuf>,
}

impl CatalogEntry {
    fn has_solution(&self) -> bool {
        !self.title.trim().is_empty() || self.aliases.iter().any(|a| !a.trim().is_empty())
    }
}

/// Provider picking random entries from a fixed catalog
pub struct CatalogProvider {
    entries: Vec<CatalogEntry>,
}

impl CatalogProvider {
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }

    /// Load a catalog from a JSON array of entries
    #[instrument]
    pub async fn from_file(path: &Path) -> Result<Self, ProviderError> {
        let content = tokio::fs::read_to_string(path).await?;
        let entries: Vec<CatalogEntry> = serde_json::from_str(&content)?;
        info!(entries = entries.len(), "Loaded sample catalog");
        Ok(Self::new(entries))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn pick(&self, require_solution: bool) -> Option<CatalogEntry> {
        let candidates: Vec<&CatalogEntry> = self
            .entries
            .iter()
            .filter(|entry| !require_solution || entry.has_solution())
            .collect();

        candidates.choose(&mut rand::rng()).map(|entry| (*entry).clone())
    }
}

#[async_trait]
impl SampleProvider for CatalogProvider {
    async fn fetch_random_sample(&self, require_solution: bool) -> Result<Sample, ProviderError> {
        let entry = self.pick(require_solution).ok_or_else(|| {
            ProviderError::Unavailable(format!(
                "catalog has no entries (require_solution = {})",
                require_solution
            ))
        })?;

        let image_data = match &entry.image_path {
            Some(path) => tokio::fs::read(path).await?,
            None => Vec::new(),
        };

        debug!(track_title = %entry.track_title, "Picked sample from catalog");

        Ok(Sample {
            track_title: entry.track_title,
            title: entry.title,
            aliases: entry.aliases,
            image_url: entry.image_url,
            image_data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(track_title: &str, title: &str) -> CatalogEntry {
        CatalogEntry {
            track_title: track_title.to_string(),
            title: title.to_string(),
            aliases: vec![],
            image_url: "https://example.com/covers/abc.jpg".to_string(),
            image_path: None,
        }
    }

    #[test]
    fn solutions_include_aliases_and_skip_blank_ones() {
        let sample = Sample {
            track_title: "Queen - Bohemian Rhapsody".to_string(),
            title: "Bohemian Rhapsody".to_string(),
            aliases: vec!["Queen: Bohemian Rhapsody".to_string(), "  ".to_string()],
            image_url: String::new(),
            image_data: vec![],
        };

        assert_eq!(
            sample.solutions(),
            vec!["Bohemian Rhapsody", "Queen: Bohemian Rhapsody"]
        );
        assert!(sample.has_solution());
    }

    #[test]
    fn image_filename_uses_last_url_segment() {
        let sample = Sample {
            track_title: String::new(),
            title: String::new(),
            aliases: vec![],
            image_url: "https://example.com/covers/abc.jpg".to_string(),
            image_data: vec![],
        };
        assert_eq!(sample.image_filename(), "abc.jpg");
    }

    #[tokio::test]
    async fn require_solution_skips_entries_without_answers() {
        let provider = CatalogProvider::new(vec![
            entry("Unknown", ""),
            entry("Queen - Bohemian Rhapsody", "Bohemian Rhapsody"),
        ]);

        for _ in 0..20 {
            let sample = provider.fetch_random_sample(true).await.unwrap();
            assert_eq!(sample.title, "Bohemian Rhapsody");
        }
    }

    #[tokio::test]
    async fn empty_catalog_is_an_error() {
        let provider = CatalogProvider::new(vec![]);
        let result = provider.fetch_random_sample(false).await;
        assert!(matches!(result, Err(ProviderError::Unavailable(_))));
    }

    #[tokio::test]
    async fn catalog_loads_from_json_file() {
        let path = std::env::temp_dir().join(format!("catalog-{}.json", uuid::Uuid::new_v4()));
        let entries = vec![entry("Queen - Bohemian Rhapsody", "Bohemian Rhapsody")];
        tokio::fs::write(&path, serde_json::to_string(&entries).unwrap())
            .await
            .unwrap();

        let provider = CatalogProvider::from_file(&path).await.unwrap();
        assert!(!provider.is_empty());

        tokio::fs::remove_file(&path).await.unwrap();
    }
}
