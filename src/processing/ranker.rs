//! Combines semantic similarity, attribute boosts and the duration filter
//! into a final ranking

use crate::catalog::Item;
use crate::config::ScoringConfig;
use crate::error::{RecommenderError, Result};
use crate::output::report::{RecommendRequest, RecommendResponse, Recommendation};
use crate::processing::extractor::{AttributeExtractor, QueryConstraints};
use crate::processing::index::EmbeddingIndex;
use log::{debug, info};
use std::cmp::Ordering;
use std::sync::Arc;

/// Score reported for items removed by the duration filter. Only written
/// into results; ranking itself uses [`Eligibility`].
pub const EXCLUDED_SCORE: f32 = -1.0e6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eligibility {
    Eligible,
    /// Item duration exceeds the query's limit.
    Excluded { duration_minutes: u64 },
}

/// One ranked catalog item.
#[derive(Debug, Clone)]
pub struct ScoredItem<'a> {
    /// Position in the catalog.
    pub index: usize,
    pub item: &'a Item,
    /// Cosine similarity before boosts.
    pub semantic_score: f32,
    pub boost: f32,
    pub eligibility: Eligibility,
    pub score: f32,
}

impl ScoredItem<'_> {
    pub fn is_excluded(&self) -> bool {
        matches!(self.eligibility, Eligibility::Excluded { .. })
    }
}

/// Ranking plus the constraints that shaped it.
#[derive(Debug, Clone)]
pub struct Ranking<'a> {
    pub constraints: QueryConstraints,
    pub items: Vec<ScoredItem<'a>>,
    pub excluded_count: usize,
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    index: usize,
    semantic: f32,
    boost: f32,
    eligibility: Eligibility,
}

impl Candidate {
    fn combined(&self) -> f32 {
        self.semantic + self.boost
    }

    fn score(&self) -> f32 {
        match self.eligibility {
            Eligibility::Eligible => self.combined(),
            Eligibility::Excluded { .. } => EXCLUDED_SCORE,
        }
    }

    /// Eligible before excluded, then higher combined score first.
    fn rank_order(&self, other: &Self) -> Ordering {
        match (self.eligibility, other.eligibility) {
            (Eligibility::Eligible, Eligibility::Excluded { .. }) => Ordering::Less,
            (Eligibility::Excluded { .. }, Eligibility::Eligible) => Ordering::Greater,
            (Eligibility::Eligible, Eligibility::Eligible) => other.combined().total_cmp(&self.combined()),
            (Eligibility::Excluded { .. }, Eligibility::Excluded { .. }) => Ordering::Equal,
        }
    }
}

/// Query-time entry point. Holds only shared, read-only state, so one
/// instance can serve concurrent requests.
pub struct Recommender {
    index: Arc<EmbeddingIndex>,
    extractor: AttributeExtractor,
    scoring: ScoringConfig,
}

impl Recommender {
    pub fn new(index: Arc<EmbeddingIndex>, scoring: ScoringConfig) -> Self {
        Self {
            index,
            extractor: AttributeExtractor::new(),
            scoring,
        }
    }

    pub fn index(&self) -> &EmbeddingIndex {
        &self.index
    }

    pub fn extractor(&self) -> &AttributeExtractor {
        &self.extractor
    }

    pub fn scoring(&self) -> &ScoringConfig {
        &self.scoring
    }

    /// Top `top_k` items for `query`, best first.
    pub fn rank(&self, query: &str, top_k: usize) -> Result<Vec<ScoredItem<'_>>> {
        self.rank_detailed(query, top_k).map(|ranking| ranking.items)
    }

    pub fn rank_detailed(&self, query: &str, top_k: usize) -> Result<Ranking<'_>> {
        if query.trim().is_empty() {
            return Err(RecommenderError::InvalidRequest("Query cannot be empty".to_string()));
        }
        if top_k == 0 {
            return Err(RecommenderError::InvalidRequest("top_k must be at least 1".to_string()));
        }
        if self.index.is_empty() {
            return Err(RecommenderError::NotFound("No recommendations found".to_string()));
        }

        let constraints = self.extractor.extract(query);
        let semantic = self.index.similarities(query)?;
        if semantic.len() != self.index.len() {
            return Err(RecommenderError::DataInconsistency(format!(
                "{} similarity scores for {} catalog items",
                semantic.len(),
                self.index.len()
            )));
        }

        let mut candidates: Vec<Candidate> = self
            .index
            .items()
            .iter()
            .zip(&semantic)
            .enumerate()
            .map(|(index, (item, &similarity))| Candidate {
                index,
                semantic: similarity,
                boost: self.boost(&constraints, item),
                eligibility: self.eligibility(&constraints, item),
            })
            .collect();

        let excluded_count = candidates
            .iter()
            .filter(|c| c.eligibility != Eligibility::Eligible)
            .count();
        debug!(
            "Ranking {} items, {} excluded by duration limit {:?}",
            candidates.len(),
            excluded_count,
            constraints.max_duration_minutes
        );

        // Stable: equal scores keep catalog order.
        candidates.sort_by(Candidate::rank_order);
        candidates.truncate(top_k);

        let items: Vec<ScoredItem<'_>> = candidates
            .into_iter()
            .filter_map(|c| {
                self.index.item(c.index).map(|item| ScoredItem {
                    index: c.index,
                    item,
                    semantic_score: c.semantic,
                    boost: c.boost,
                    eligibility: c.eligibility,
                    score: c.score(),
                })
            })
            .collect();

        if items.is_empty() {
            return Err(RecommenderError::NotFound("No recommendations found".to_string()));
        }

        Ok(Ranking {
            constraints,
            items,
            excluded_count,
        })
    }

    /// Answer a request in the wire shape.
    pub fn recommend(&self, request: &RecommendRequest) -> Result<RecommendResponse> {
        let ranked = self.rank(&request.query, request.top_k)?;
        info!("Returning {} recommendations", ranked.len());

        Ok(RecommendResponse {
            recommendations: ranked.iter().map(Recommendation::from).collect(),
        })
    }

    fn boost(&self, constraints: &QueryConstraints, item: &Item) -> f32 {
        let mut boost = 0.0;
        if tag_matches(&constraints.job_level, &item.job_level) {
            boost += self.scoring.job_level_boost;
        }
        if tag_matches(&constraints.industry, &item.industry) {
            boost += self.scoring.industry_boost;
        }
        if tag_matches(&constraints.job_family, &item.job_family) {
            boost += self.scoring.job_family_boost;
        }
        if tag_matches(&constraints.language, &item.language) {
            boost += self.scoring.language_boost;
        }
        boost
    }

    /// Items without a number in their duration are never excluded.
    fn eligibility(&self, constraints: &QueryConstraints, item: &Item) -> Eligibility {
        let Some(max_minutes) = constraints.max_duration_minutes else {
            return Eligibility::Eligible;
        };

        match self.extractor.first_integer(&item.duration) {
            Some(minutes) if minutes > max_minutes => Eligibility::Excluded {
                duration_minutes: minutes,
            },
            _ => Eligibility::Eligible,
        }
    }
}

fn tag_matches(constraint: &Option<String>, tag: &Option<String>) -> bool {
    matches!((constraint, tag), (Some(wanted), Some(actual)) if wanted == actual)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::config::EmbeddingFields;
    use crate::processing::embeddings::Embedder;
    use crate::processing::index::BuildOptions;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

    /// Vectors keyed by item-name prefix; every other text (queries) gets
    /// the same fallback vector so semantic scores do not depend on wording.
    struct KeyedEmbedder {
        keys: Vec<(String, Vec<f32>)>,
        calls: AtomicUsize,
    }

    impl KeyedEmbedder {
        fn new(keys: &[(&str, [f32; 2])]) -> Self {
            Self {
                keys: keys.iter().map(|(k, v)| (k.to_string(), v.to_vec())).collect(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl Embedder for KeyedEmbedder {
        fn embed(&self, text: &str) -> Result<Vec<f32>> {
            self.calls.fetch_add(1, AtomicOrdering::SeqCst);
            Ok(self
                .keys
                .iter()
                .find(|(key, _)| text.starts_with(key.as_str()))
                .map(|(_, v)| v.clone())
                .unwrap_or_else(|| vec![1.0, 0.0]))
        }

        fn name(&self) -> &str {
            "keyed"
        }
    }

    fn item(name: &str, duration: &str) -> Item {
        let mut item = Item::new(name, format!("https://example.com/{}", name));
        item.duration = duration.to_string();
        item
    }

    fn recommender(items: Vec<Item>, embedder: Arc<KeyedEmbedder>) -> Recommender {
        let catalog = Catalog::from_items(items).unwrap();
        let options = BuildOptions {
            fields: EmbeddingFields::Full,
            batch_size: 8,
            show_progress: false,
        };
        let index = EmbeddingIndex::build(catalog, embedder, &options).unwrap();
        Recommender::new(Arc::new(index), ScoringConfig::default())
    }

    fn three_items() -> (Vec<Item>, Arc<KeyedEmbedder>) {
        let items = vec![item("alpha", "30 minutes"), item("beta", "90 minutes"), item("gamma", "Unknown")];
        let embedder = Arc::new(KeyedEmbedder::new(&[
            ("alpha", [1.0, 1.0]),
            ("beta", [1.0, 0.0]),
            ("gamma", [0.0, 1.0]),
        ]));
        (items, embedder)
    }

    #[test]
    fn test_empty_query_rejected_before_embedding() {
        let (items, embedder) = three_items();
        let recommender = recommender(items, embedder.clone());
        let calls_after_build = embedder.calls.load(AtomicOrdering::SeqCst);

        assert!(matches!(recommender.rank("", 5), Err(RecommenderError::InvalidRequest(_))));
        assert!(matches!(recommender.rank("  \n\t", 5), Err(RecommenderError::InvalidRequest(_))));
        assert_eq!(embedder.calls.load(AtomicOrdering::SeqCst), calls_after_build);
    }

    #[test]
    fn test_zero_top_k_rejected() {
        let (items, embedder) = three_items();
        let recommender = recommender(items, embedder);
        assert!(matches!(recommender.rank("anything", 0), Err(RecommenderError::InvalidRequest(_))));
    }

    #[test]
    fn test_empty_catalog_not_found() {
        let recommender = recommender(Vec::new(), Arc::new(KeyedEmbedder::new(&[])));
        assert!(matches!(recommender.rank("anything", 5), Err(RecommenderError::NotFound(_))));
    }

    #[test]
    fn test_semantic_order_and_length() {
        let (items, embedder) = three_items();
        let recommender = recommender(items, embedder);

        let ranked = recommender.rank("cognitive test", 2).unwrap();
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].item.name, "beta");
        assert_eq!(ranked[1].item.name, "alpha");

        let all = recommender.rank("cognitive test", 50).unwrap();
        assert_eq!(all.len(), 3);
        assert!(all.windows(2).all(|w| w[0].score >= w[1].score));
        let unique: HashSet<usize> = all.iter().map(|s| s.index).collect();
        assert_eq!(unique.len(), 3);
    }

    #[test]
    fn test_ties_keep_catalog_order() {
        let items = vec![item("one", ""), item("two", ""), item("three", ""), item("four", "")];
        let recommender = recommender(items, Arc::new(KeyedEmbedder::new(&[])));

        let ranked = recommender.rank("anything", 4).unwrap();
        let order: Vec<usize> = ranked.iter().map(|s| s.index).collect();
        assert_eq!(order, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_job_level_boost_is_exact() {
        let mut senior = item("alpha", "");
        senior.job_level = Some("senior".to_string());
        let recommender = recommender(vec![senior], Arc::new(KeyedEmbedder::new(&[("alpha", [1.0, 1.0])])));

        let plain = recommender.rank("analyst role", 1).unwrap();
        let boosted = recommender.rank("senior analyst role", 1).unwrap();

        assert_eq!(plain[0].semantic_score, boosted[0].semantic_score);
        assert_eq!(plain[0].boost, 0.0);
        assert!((boosted[0].score - plain[0].score - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_boosts_accumulate_and_promote() {
        let mut tagged = item("gamma", "");
        tagged.industry = Some("retail".to_string());
        tagged.language = Some("french".to_string());
        tagged.job_family = Some("sales".to_string());
        let untagged = item("beta", "");

        let embedder = Arc::new(KeyedEmbedder::new(&[("beta", [1.0, 0.0]), ("gamma", [0.0, 1.0])]));
        let recommender = recommender(vec![untagged, tagged], embedder);

        let ranked = recommender.rank("French speaking retail sales associate", 2).unwrap();
        assert_eq!(ranked[0].item.name, "gamma");
        assert!((ranked[0].boost - 1.3).abs() < 1e-6);
        assert_eq!(ranked[1].boost, 0.0);
    }

    #[test]
    fn test_boost_requires_exact_tag_equality() {
        let mut item_a = item("alpha", "");
        item_a.job_level = Some("Senior".to_string());
        let recommender = recommender(vec![item_a], Arc::new(KeyedEmbedder::new(&[])));

        let ranked = recommender.rank("senior engineer", 1).unwrap();
        // query terms are lower-case vocabulary entries, tags compare as-is
        assert_eq!(ranked[0].boost, 0.0);
    }

    #[test]
    fn test_duration_filter() {
        let (items, embedder) = three_items();
        let recommender = recommender(items, embedder);

        // beta (90 minutes) has the best semantic score but exceeds 60
        let ranked = recommender.rank_detailed("something under 1 hour", 2).unwrap();
        assert_eq!(ranked.constraints.max_duration_minutes, Some(60));
        assert_eq!(ranked.excluded_count, 1);
        let names: Vec<&str> = ranked.items.iter().map(|s| s.item.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "gamma"]);

        // still present, last, when every slot is requested
        let all = recommender.rank("something under 1 hour", 3).unwrap();
        assert_eq!(all[2].item.name, "beta");
        assert!(all[2].is_excluded());
        assert_eq!(all[2].score, EXCLUDED_SCORE);
        assert_eq!(all[2].eligibility, Eligibility::Excluded { duration_minutes: 90 });
        // no number in "Unknown", so gamma is never filtered
        assert_eq!(all[1].item.name, "gamma");
        assert_eq!(all[1].eligibility, Eligibility::Eligible);
    }

    #[test]
    fn test_oversized_duration_is_excluded() {
        let items = vec![
            item("alpha", "20 minutes"),
            item("beta", "99999999999999999999 minutes"),
            item("gamma", "\u{669}\u{660} minutes"),
        ];
        let embedder = Arc::new(KeyedEmbedder::new(&[
            ("alpha", [0.0, 1.0]),
            ("beta", [1.0, 0.0]),
            ("gamma", [1.0, 1.0]),
        ]));
        let recommender = recommender(items, embedder);

        let ranking = recommender.rank_detailed("assessment under 30 minutes", 3).unwrap();
        assert_eq!(ranking.excluded_count, 1);
        assert_eq!(ranking.items[2].item.name, "beta");
        assert_eq!(ranking.items[2].eligibility, Eligibility::Excluded { duration_minutes: u64::MAX });
        assert_eq!(ranking.items[2].score, EXCLUDED_SCORE);

        // non-ASCII digits read as an unknown duration, same as catalog stats
        let gamma = ranking.items.iter().find(|s| s.item.name == "gamma").unwrap();
        assert_eq!(gamma.eligibility, Eligibility::Eligible);
        assert!(gamma.item.has_unknown_duration());
    }

    #[test]
    fn test_ranking_is_idempotent() {
        let (items, embedder) = three_items();
        let recommender = recommender(items, embedder);

        let first: Vec<(usize, f32)> = recommender
            .rank("senior sales under 45 minutes", 3)
            .unwrap()
            .iter()
            .map(|s| (s.index, s.score))
            .collect();
        let second: Vec<(usize, f32)> = recommender
            .rank("senior sales under 45 minutes", 3)
            .unwrap()
            .iter()
            .map(|s| (s.index, s.score))
            .collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_recommend_fills_unknowns() {
        let items = vec![item("alpha", "")];
        let recommender = recommender(items, Arc::new(KeyedEmbedder::new(&[])));

        let response = recommender
            .recommend(&RecommendRequest {
                query: "anything".to_string(),
                top_k: 10,
            })
            .unwrap();

        assert_eq!(response.recommendations.len(), 1);
        let rec = &response.recommendations[0];
        assert_eq!(rec.duration, "Unknown");
        assert_eq!(rec.remote_testing, "Unknown");
        assert_eq!(rec.adaptive_irt, "Unknown");
        assert_eq!(rec.test_type, "");
    }

    #[test]
    fn test_recommender_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Recommender>();
    }
}
