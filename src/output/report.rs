//! Request, response and report structures

use crate::config::EmbeddingFields;
use crate::processing::extractor::QueryConstraints;
use crate::processing::ranker::{Ranking, ScoredItem};
use serde::{Deserialize, Serialize};
use std::time::SystemTime;

pub const DEFAULT_TOP_K: usize = 10;

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendRequest {
    pub query: String,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

/// One recommended assessment as returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub name: String,
    pub url: String,
    pub remote_testing: String,
    pub adaptive_irt: String,
    pub duration: String,
    pub test_type: String,
    pub score: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendResponse {
    pub recommendations: Vec<Recommendation>,
}

impl From<&ScoredItem<'_>> for Recommendation {
    fn from(scored: &ScoredItem<'_>) -> Self {
        Self {
            name: scored.item.name.clone(),
            url: scored.item.url.clone(),
            remote_testing: scored.item.display_remote_testing(),
            adaptive_irt: scored.item.display_adaptive_irt(),
            duration: scored.item.display_duration(),
            test_type: scored.item.test_type.clone(),
            score: scored.score,
        }
    }
}

/// Everything the CLI renders for one query.
#[derive(Debug, Clone, Serialize)]
pub struct RecommendationReport {
    pub query: String,
    pub constraints: QueryConstraints,
    pub recommendations: Vec<Recommendation>,
    pub details: Vec<ScoreDetail>,
    pub excluded_count: usize,
    pub metadata: ReportMetadata,
}

/// Score breakdown, parallel to `recommendations`.
#[derive(Debug, Clone, Serialize)]
pub struct ScoreDetail {
    pub catalog_index: usize,
    pub semantic_score: f32,
    pub boost: f32,
    pub excluded: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    pub generated_at: SystemTime,
    pub recommender_version: String,
    pub query_source: String,
    pub embedding_model: String,
    pub embedding_fields: EmbeddingFields,
    pub catalog_size: usize,
    pub processing_time_ms: u64,
}

/// Inputs to [`RecommendationReport::from_ranking`] not carried by the ranking.
#[derive(Debug, Clone)]
pub struct ReportContext {
    pub query_source: String,
    pub embedding_model: String,
    pub embedding_fields: EmbeddingFields,
    pub catalog_size: usize,
    pub processing_time_ms: u64,
}

impl RecommendationReport {
    pub fn from_ranking(query: &str, ranking: &Ranking<'_>, context: ReportContext) -> Self {
        Self {
            query: query.to_string(),
            constraints: ranking.constraints.clone(),
            recommendations: ranking.items.iter().map(Recommendation::from).collect(),
            details: ranking
                .items
                .iter()
                .map(|scored| ScoreDetail {
                    catalog_index: scored.index,
                    semantic_score: scored.semantic_score,
                    boost: scored.boost,
                    excluded: scored.is_excluded(),
                })
                .collect(),
            excluded_count: ranking.excluded_count,
            metadata: ReportMetadata {
                generated_at: SystemTime::now(),
                recommender_version: env!("CARGO_PKG_VERSION").to_string(),
                query_source: context.query_source,
                embedding_model: context.embedding_model,
                embedding_fields: context.embedding_fields,
                catalog_size: context.catalog_size,
                processing_time_ms: context.processing_time_ms,
            },
        }
    }

    pub fn response(&self) -> RecommendResponse {
        RecommendResponse {
            recommendations: self.recommendations.clone(),
        }
    }
}
