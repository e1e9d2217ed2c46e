//! Configuration management for the assessment recommender

use crate::error::{RecommenderError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub models: ModelConfig,
    pub catalog: CatalogConfig,
    pub scoring: ScoringConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    pub models_dir: PathBuf,
    pub default_embedding_model: String,
    pub batch_size: usize,
    pub available_models: Vec<AvailableModel>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailableModel {
    pub name: String,
    pub repo_id: String,
    pub size_mb: u64,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    pub path: PathBuf,
    pub embedding_fields: EmbeddingFields,
}

/// Which item fields are concatenated into the text that gets embedded.
///
/// The choice is frozen into an index when it is built; a catalog must
/// never be embedded with a mix of both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingFields {
    /// name, description, test_type, duration, remote_testing, adaptive_irt
    Basic,
    /// `Basic` plus keywords, job_level, industry, language, job_family
    Full,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub job_level_boost: f32,
    pub industry_boost: f32,
    pub job_family_boost: f32,
    pub language_boost: f32,
    pub default_top_k: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub detailed: bool,
    pub color_output: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    Console,
    Json,
    Markdown,
    Html,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            job_level_boost: 0.5,
            industry_boost: 0.5,
            job_family_boost: 0.5,
            language_boost: 0.3,
            default_top_k: 10,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let base_dir = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".assessment-recommender");

        Self {
            models: ModelConfig {
                models_dir: base_dir.join("models"),
                default_embedding_model: "potion-base-8M".to_string(),
                batch_size: 64,
                available_models: vec![
                    AvailableModel {
                        name: "potion-base-8M".to_string(),
                        repo_id: "minishlab/potion-base-8M".to_string(),
                        size_mb: 33,
                        description: "Compact Model2Vec embeddings, good default for catalog search".to_string(),
                    },
                    AvailableModel {
                        name: "m2v-base".to_string(),
                        repo_id: "minishlab/M2V_base_output".to_string(),
                        size_mb: 90,
                        description: "Model2Vec base embeddings model".to_string(),
                    },
                    AvailableModel {
                        name: "m2v-large".to_string(),
                        repo_id: "minishlab/M2V_large_output".to_string(),
                        size_mb: 250,
                        description: "Higher-capacity Model2Vec embeddings model".to_string(),
                    },
                ],
            },
            catalog: CatalogConfig {
                path: base_dir.join("assessments.json"),
                embedding_fields: EmbeddingFields::Full,
            },
            scoring: ScoringConfig::default(),
            output: OutputConfig {
                format: OutputFormat::Console,
                detailed: false,
                color_output: true,
            },
        }
    }
}

impl Config {
    /// Load from the default location, writing defaults on first run.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)?;
            let config: Config = toml::from_str(&content)
                .map_err(|e| RecommenderError::Configuration(format!("Failed to parse config: {}", e)))?;
            config.validate()?;
            Ok(config)
        } else {
            let config = Self::default();
            config.save_to(config_path)?;
            Ok(config)
        }
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| RecommenderError::Configuration(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
            .join("assessment-recommender")
            .join("config.toml")
    }

    fn validate(&self) -> Result<()> {
        if self.models.batch_size == 0 {
            return Err(RecommenderError::Configuration(
                "models.batch_size must be at least 1".to_string(),
            ));
        }
        let boosts = [
            ("job_level_boost", self.scoring.job_level_boost),
            ("industry_boost", self.scoring.industry_boost),
            ("job_family_boost", self.scoring.job_family_boost),
            ("language_boost", self.scoring.language_boost),
        ];
        if let Some((name, value)) = boosts.iter().find(|(_, value)| !value.is_finite()) {
            return Err(RecommenderError::Configuration(format!(
                "scoring.{} must be a finite number, got {}",
                name, value
            )));
        }
        if self.scoring.default_top_k == 0 {
            return Err(RecommenderError::Configuration(
                "scoring.default_top_k must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn models_dir(&self) -> &PathBuf {
        &self.models.models_dir
    }

    pub fn get_model_by_name(&self, name: &str) -> Option<&AvailableModel> {
        self.models.available_models.iter().find(|m| m.name == name)
    }
}
