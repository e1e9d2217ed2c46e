//! Embedding providers

use crate::config::Config;
use crate::error::Result;
use anyhow::Context;
use log::info;
use model2vec_rs::model::StaticModel;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Text to vector capability. Implementations must be deterministic for
/// identical input and safe to share between threads.
pub trait Embedder: Send + Sync {
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }

    fn name(&self) -> &str;
}

/// Model2Vec static embeddings
pub struct Model2VecEmbedder {
    model: StaticModel,
    model_name: String,
}

impl Model2VecEmbedder {
    pub fn new(model_path: &Path, model_name: &str) -> Result<Self> {
        let start_time = Instant::now();
        info!("Loading Model2Vec embedding model from: {}", model_path.display());

        let model = StaticModel::from_pretrained(
            model_path,
            None, // token
            None, // normalize
            None, // subfolder
        )
        .with_context(|| format!("Failed to load model '{}'", model_name))?;

        info!("Model loaded in {:.2?}", start_time.elapsed());

        Ok(Self {
            model,
            model_name: model_name.to_string(),
        })
    }

    /// Load `model` (or the configured default) from the models directory,
    /// falling back to treating it as a Hugging Face repo id.
    pub fn from_config(config: &Config, model: Option<&str>) -> Result<Self> {
        let model_name = model.unwrap_or(&config.models.default_embedding_model);
        let model_path = Self::resolve_model_path(config, model_name);
        Self::new(&model_path, model_name)
    }

    fn resolve_model_path(config: &Config, model_name: &str) -> PathBuf {
        let local_path = config.models_dir().join(model_name);
        if local_path.exists() {
            return local_path;
        }

        match config.get_model_by_name(model_name) {
            Some(known) => PathBuf::from(&known.repo_id),
            None => PathBuf::from(model_name),
        }
    }
}

impl Embedder for Model2VecEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.model.encode_single(text))
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(self.model.encode(texts))
    }

    fn name(&self) -> &str {
        &self.model_name
    }
}
