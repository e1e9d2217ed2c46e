//! Precomputed catalog embeddings and batched cosine similarity

use crate::catalog::{Catalog, Item};
use crate::config::EmbeddingFields;
use crate::error::{RecommenderError, Result};
use crate::processing::embeddings::Embedder;
use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use ndarray::{Array1, Array2, ArrayView1};
use std::sync::Arc;
use std::time::Instant;

/// Catalog items paired with their unit-length embeddings.
///
/// Row `i` of the matrix is always the embedding of item `i`. Both are
/// filled in the same constructor and never resized afterwards, so there
/// is no way to reorder one without the other.
pub struct EmbeddingIndex {
    items: Vec<Item>,
    matrix: Array2<f32>,
    fields: EmbeddingFields,
    embedder: Arc<dyn Embedder>,
}

/// Options for [`EmbeddingIndex::build`].
#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub fields: EmbeddingFields,
    pub batch_size: usize,
    pub show_progress: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            fields: EmbeddingFields::Full,
            batch_size: 64,
            show_progress: false,
        }
    }
}

/// Text embedded for an item: fields joined by single spaces in a fixed
/// order. Missing fields contribute an empty string.
pub fn item_text(item: &Item, fields: EmbeddingFields) -> String {
    let keywords = item.keywords.join(" ");
    let mut parts: Vec<&str> = vec![
        item.name.as_str(),
        item.description.as_str(),
        item.test_type.as_str(),
        item.duration.as_str(),
        item.remote_testing.as_deref().unwrap_or(""),
        item.adaptive_irt.as_deref().unwrap_or(""),
    ];

    if fields == EmbeddingFields::Full {
        parts.push(keywords.as_str());
        parts.push(item.job_level.as_deref().unwrap_or(""));
        parts.push(item.industry.as_deref().unwrap_or(""));
        parts.push(item.language.as_deref().unwrap_or(""));
        parts.push(item.job_family.as_deref().unwrap_or(""));
    }

    parts.join(" ")
}

impl EmbeddingIndex {
    /// Embed every catalog item. Runs once at startup.
    pub fn build(catalog: Catalog, embedder: Arc<dyn Embedder>, options: &BuildOptions) -> Result<Self> {
        let start_time = Instant::now();
        let items = catalog.into_items();
        let texts: Vec<String> = items.iter().map(|item| item_text(item, options.fields)).collect();

        let progress = if options.show_progress {
            let bar = ProgressBar::new(texts.len() as u64);
            bar.set_style(
                ProgressStyle::with_template("{spinner} Embedding catalog [{bar:40}] {pos}/{len}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar()),
            );
            bar
        } else {
            ProgressBar::hidden()
        };

        let mut vectors = Vec::with_capacity(texts.len());
        for batch in texts.chunks(options.batch_size.max(1)) {
            let embedded = embedder.embed_batch(batch)?;
            if embedded.len() != batch.len() {
                return Err(RecommenderError::DataInconsistency(format!(
                    "Embedder returned {} vectors for a batch of {} items",
                    embedded.len(),
                    batch.len()
                )));
            }
            vectors.extend(embedded);
            progress.inc(batch.len() as u64);
        }
        progress.finish_and_clear();

        let matrix = Self::normalized_matrix(&vectors)?;
        info!(
            "Embedded {} assessments ({} dimensions, {:?} fields, model {}) in {:.2?}",
            items.len(),
            matrix.ncols(),
            options.fields,
            embedder.name(),
            start_time.elapsed()
        );

        Ok(Self {
            items,
            matrix,
            fields: options.fields,
            embedder,
        })
    }

    fn normalized_matrix(vectors: &[Vec<f32>]) -> Result<Array2<f32>> {
        let dimension = vectors.first().map(|v| v.len()).unwrap_or(0);
        let mut matrix = Array2::<f32>::zeros((vectors.len(), dimension));

        for (i, vector) in vectors.iter().enumerate() {
            if vector.len() != dimension {
                return Err(RecommenderError::DataInconsistency(format!(
                    "Item {} has a {}-dimensional embedding, expected {}",
                    i,
                    vector.len(),
                    dimension
                )));
            }

            let norm = l2_norm(vector);
            if norm > 0.0 {
                for (dst, src) in matrix.row_mut(i).iter_mut().zip(vector) {
                    *dst = src / norm;
                }
            }
        }

        Ok(matrix)
    }

    /// Cosine similarity of `query` against every item, in catalog order.
    pub fn similarities(&self, query: &str) -> Result<Vec<f32>> {
        let query_vector = self.embedder.embed(query)?;
        self.similarities_for_vector(&query_vector)
    }

    pub fn similarities_for_vector(&self, query_vector: &[f32]) -> Result<Vec<f32>> {
        if self.items.is_empty() {
            return Ok(Vec::new());
        }

        if query_vector.len() != self.dimension() {
            return Err(RecommenderError::DataInconsistency(format!(
                "Query embedding has {} dimensions, index has {}",
                query_vector.len(),
                self.dimension()
            )));
        }

        let norm = l2_norm(query_vector);
        if norm == 0.0 {
            return Ok(vec![0.0; self.items.len()]);
        }

        let query = Array1::from(query_vector.to_vec()) / norm;
        Ok(self.matrix.dot(&query).to_vec())
    }

    pub fn entries(&self) -> impl Iterator<Item = (&Item, ArrayView1<'_, f32>)> {
        self.items.iter().zip(self.matrix.rows())
    }

    pub fn item(&self, index: usize) -> Option<&Item> {
        self.items.get(index)
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.matrix.ncols()
    }

    pub fn fields(&self) -> EmbeddingFields {
        self.fields
    }

    pub fn embedder_name(&self) -> &str {
        self.embedder.name()
    }
}

fn l2_norm(vector: &[f32]) -> f32 {
    vector.iter().map(|x| x * x).sum::<f32>().sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// Returns fixed vectors per text, [0, 0] for anything unknown.
    struct TableEmbedder {
        table: HashMap<String, Vec<f32>>,
    }

    impl Embedder for TableEmbedder {
        fn embed(&self, text: &str) -> Result<Vec<f32>> {
            Ok(self.table.get(text).cloned().unwrap_or_else(|| vec![0.0, 0.0]))
        }

        fn name(&self) -> &str {
            "table"
        }
    }

    struct ShortBatchEmbedder;

    impl Embedder for ShortBatchEmbedder {
        fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![1.0])
        }

        fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(vec![vec![1.0]; texts.len().saturating_sub(1)])
        }

        fn name(&self) -> &str {
            "short"
        }
    }

    fn named(name: &str) -> Item {
        Item::new(name, format!("https://x/{}", name))
    }

    fn basic_text(name: &str) -> String {
        item_text(&named(name), EmbeddingFields::Basic)
    }

    fn basic_options() -> BuildOptions {
        BuildOptions {
            fields: EmbeddingFields::Basic,
            batch_size: 2,
            show_progress: false,
        }
    }

    #[test]
    fn test_item_text_field_sets() {
        let mut item = named("Verify");
        item.description = "Numerical reasoning".to_string();
        item.test_type = "Cognitive".to_string();
        item.duration = "18 minutes".to_string();
        item.remote_testing = Some("Yes".to_string());
        item.keywords = vec!["numbers".to_string(), "data".to_string()];
        item.industry = Some("finance".to_string());

        assert_eq!(
            item_text(&item, EmbeddingFields::Basic),
            "Verify Numerical reasoning Cognitive 18 minutes Yes "
        );
        assert_eq!(
            item_text(&item, EmbeddingFields::Full),
            "Verify Numerical reasoning Cognitive 18 minutes Yes  numbers data  finance  "
        );
    }

    #[test]
    fn test_similarities_aligned_with_items() {
        let mut table = HashMap::new();
        table.insert(basic_text("a"), vec![1.0, 0.0]);
        table.insert(basic_text("b"), vec![0.0, 2.0]);
        table.insert(basic_text("c"), vec![1.0, 1.0]);
        table.insert("query".to_string(), vec![3.0, 0.0]);

        let catalog = Catalog::from_items(vec![named("a"), named("b"), named("c")]).unwrap();
        let index = EmbeddingIndex::build(catalog, Arc::new(TableEmbedder { table }), &basic_options()).unwrap();

        assert_eq!(index.len(), 3);
        assert_eq!(index.dimension(), 2);
        assert_eq!(index.fields(), EmbeddingFields::Basic);

        let scores = index.similarities("query").unwrap();
        assert_eq!(scores.len(), 3);
        assert!((scores[0] - 1.0).abs() < 1e-6);
        assert!(scores[1].abs() < 1e-6);
        assert!((scores[2] - std::f32::consts::FRAC_1_SQRT_2).abs() < 1e-6);

        let names: Vec<&str> = index.entries().map(|(item, _)| item.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_zero_vectors_score_zero() {
        let mut table = HashMap::new();
        table.insert(basic_text("a"), vec![1.0, 0.0]);

        let catalog = Catalog::from_items(vec![named("a"), named("z")]).unwrap();
        let index = EmbeddingIndex::build(catalog, Arc::new(TableEmbedder { table }), &basic_options()).unwrap();

        assert_eq!(index.similarities("unknown query").unwrap(), vec![0.0, 0.0]);
        assert_eq!(index.similarities_for_vector(&[0.0, 5.0]).unwrap(), vec![0.0, 0.0]);
    }

    #[test]
    fn test_dimension_mismatch() {
        let catalog = Catalog::from_items(vec![named("a")]).unwrap();
        let index = EmbeddingIndex::build(
            catalog,
            Arc::new(TableEmbedder { table: HashMap::new() }),
            &basic_options(),
        )
        .unwrap();

        assert!(matches!(
            index.similarities_for_vector(&[1.0, 2.0, 3.0]),
            Err(RecommenderError::DataInconsistency(_))
        ));
    }

    #[test]
    fn test_short_batch_is_inconsistent() {
        let catalog = Catalog::from_items(vec![named("a"), named("b")]).unwrap();
        let result = EmbeddingIndex::build(catalog, Arc::new(ShortBatchEmbedder), &basic_options());
        assert!(matches!(result, Err(RecommenderError::DataInconsistency(_))));
    }

    #[test]
    fn test_empty_catalog() {
        let index = EmbeddingIndex::build(
            Catalog::default(),
            Arc::new(TableEmbedder { table: HashMap::new() }),
            &BuildOptions::default(),
        )
        .unwrap();

        assert!(index.is_empty());
        assert!(index.similarities("anything").unwrap().is_empty());
    }
}
