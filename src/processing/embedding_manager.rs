//! Local management of Model2Vec embedding models

use crate::config::AvailableModel;
use crate::error::{RecommenderError, Result};
use hf_hub::api::tokio::Api;
use log::{info, warn};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Files a Model2Vec model directory must contain to be loadable.
const REQUIRED_FILES: [&str; 3] = ["tokenizer.json", "model.safetensors", "config.json"];
const OPTIONAL_FILES: [&str; 1] = ["README.md"];

/// Downloads, lists and removes embedding models under one directory.
pub struct EmbeddingModelManager {
    models_dir: PathBuf,
    available_models: Vec<AvailableModel>,
    downloaded_models: BTreeSet<String>,
}

impl EmbeddingModelManager {
    pub async fn new(models_dir: PathBuf, available_models: Vec<AvailableModel>) -> Result<Self> {
        fs::create_dir_all(&models_dir).await.map_err(|e| {
            RecommenderError::ModelError(format!("Failed to create models directory: {}", e))
        })?;

        let mut manager = Self {
            models_dir,
            available_models,
            downloaded_models: BTreeSet::new(),
        };
        manager.scan_downloaded_models().await?;
        Ok(manager)
    }

    async fn scan_downloaded_models(&mut self) -> Result<()> {
        let mut entries = fs::read_dir(&self.models_dir).await.map_err(|e| {
            RecommenderError::ModelError(format!("Failed to scan models directory: {}", e))
        })?;

        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_dir() && Self::is_valid_model_directory(&entry.path()).await {
                self.downloaded_models
                    .insert(entry.file_name().to_string_lossy().to_string());
            }
        }

        Ok(())
    }

    async fn is_valid_model_directory(path: &Path) -> bool {
        for file in REQUIRED_FILES {
            if fs::metadata(path.join(file)).await.is_err() {
                return false;
            }
        }
        true
    }

    /// Fetch a model from the Hugging Face Hub into the models directory.
    pub async fn download_model(&mut self, model_id: &str, force: bool) -> Result<PathBuf> {
        let model_info = self
            .get_model_info(model_id)
            .cloned()
            .ok_or_else(|| RecommenderError::ModelNotFound(model_id.to_string()))?;

        let model_dir = self.models_dir.join(&model_info.name);
        if !force && self.is_model_downloaded(&model_info.name) {
            return Ok(model_dir);
        }

        info!(
            "Downloading embedding model {} ({} MB) from {}",
            model_info.name, model_info.size_mb, model_info.repo_id
        );
        fs::create_dir_all(&model_dir).await?;

        let api = Api::new()
            .map_err(|e| RecommenderError::ModelError(format!("Failed to initialize HF API: {}", e)))?;
        let repo = api.model(model_info.repo_id.clone());

        for file in REQUIRED_FILES {
            let cached = repo.get(file).await.map_err(|e| {
                RecommenderError::ModelError(format!("Failed to download required file {}: {}", file, e))
            })?;
            fs::copy(&cached, model_dir.join(file)).await?;
            info!("Downloaded {}", file);
        }

        for file in OPTIONAL_FILES {
            match repo.get(file).await {
                Ok(cached) => {
                    fs::copy(&cached, model_dir.join(file)).await?;
                }
                Err(e) => warn!("Optional file {} not available: {}", file, e),
            }
        }

        self.downloaded_models.insert(model_info.name.clone());
        Ok(model_dir)
    }

    pub async fn remove_model(&mut self, model_id: &str) -> Result<PathBuf> {
        let name = self
            .resolve_model_id(model_id)
            .unwrap_or_else(|| model_id.to_string());

        if !self.downloaded_models.contains(&name) {
            return Err(RecommenderError::ModelNotFound(format!("{} is not downloaded", model_id)));
        }

        let model_dir = self.models_dir.join(&name);
        fs::remove_dir_all(&model_dir).await.map_err(|e| {
            RecommenderError::ModelError(format!("Failed to remove model: {}", e))
        })?;
        self.downloaded_models.remove(&name);
        Ok(model_dir)
    }

    pub fn get_model_path(&self, model_id: &str) -> Option<PathBuf> {
        self.resolve_model_id(model_id)
            .or_else(|| Some(model_id.to_string()))
            .filter(|name| self.downloaded_models.contains(name))
            .map(|name| self.models_dir.join(name))
    }

    pub fn is_model_downloaded(&self, model_id: &str) -> bool {
        self.get_model_path(model_id).is_some()
    }

    pub fn list_available_models(&self) -> &[AvailableModel] {
        &self.available_models
    }

    /// Downloaded directories, including ones not in the configured list.
    pub fn list_downloaded_models(&self) -> Vec<String> {
        self.downloaded_models.iter().cloned().collect()
    }

    pub fn get_model_info(&self, model_id: &str) -> Option<&AvailableModel> {
        let name = self.resolve_model_id(model_id)?;
        self.available_models.iter().find(|m| m.name == name)
    }

    /// Accepts a configured name, a repo id, or a case-insensitive name.
    pub fn resolve_model_id(&self, input: &str) -> Option<String> {
        let input_lower = input.to_lowercase();
        self.available_models
            .iter()
            .find(|m| m.name == input)
            .or_else(|| self.available_models.iter().find(|m| m.repo_id == input))
            .or_else(|| self.available_models.iter().find(|m| m.name.to_lowercase() == input_lower))
            .map(|m| m.name.clone())
    }
}
