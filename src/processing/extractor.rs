//! Structured constraint extraction from free-text queries

use aho_corasick::{AhoCorasick, MatchKind};
use log::debug;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub const JOB_LEVELS: &[&str] = &["entry-level", "mid-level", "senior", "manager", "director", "executive"];

pub const INDUSTRIES: &[&str] = &[
    "finance",
    "healthcare",
    "technology",
    "retail",
    "manufacturing",
    "education",
    "hospitality",
];

pub const LANGUAGES: &[&str] = &["english", "spanish", "french", "german", "chinese"];

pub const JOB_FAMILIES: &[&str] = &[
    "engineering",
    "sales",
    "marketing",
    "human resources",
    "operations",
    "customer service",
];

/// Duration patterns in priority order, paired with their minute multiplier.
/// Numbers are ASCII digits only.
const DURATION_PATTERNS: &[(&str, u64)] = &[
    (r"([0-9]+)\s*minutes", 1),
    (r"([0-9]+)\s*min", 1),
    (r"([0-9]+)\s*hour", 60),
    (r"([0-9]+)\s*hr", 60),
];

/// Constraints recovered from a query. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryConstraints {
    pub job_level: Option<String>,
    pub industry: Option<String>,
    pub language: Option<String>,
    pub job_family: Option<String>,
    pub max_duration_minutes: Option<u64>,
}

impl QueryConstraints {
    pub fn is_empty(&self) -> bool {
        self.job_level.is_none()
            && self.industry.is_none()
            && self.language.is_none()
            && self.job_family.is_none()
            && self.max_duration_minutes.is_none()
    }
}

/// One vocabulary, matched by plain substring search.
///
/// When several terms occur in a query the one declared first wins,
/// regardless of where it appears in the text.
struct Vocabulary {
    terms: &'static [&'static str],
    matcher: AhoCorasick,
}

impl Vocabulary {
    fn new(terms: &'static [&'static str]) -> Self {
        // Overlapping search needs the standard match semantics; the term
        // lists are fixed, so building cannot fail.
        let matcher = AhoCorasick::builder()
            .match_kind(MatchKind::Standard)
            .build(terms)
            .expect("static vocabulary must build");
        Self { terms, matcher }
    }

    fn first_declared_match(&self, lowered: &str) -> Option<String> {
        self.matcher
            .find_overlapping_iter(lowered)
            .map(|m| m.pattern().as_usize())
            .min()
            .map(|id| self.terms[id].to_string())
    }
}

/// Parses job level, industry, language, job family and a duration cap
/// out of free text. Never fails.
pub struct AttributeExtractor {
    job_levels: Vocabulary,
    industries: Vocabulary,
    languages: Vocabulary,
    job_families: Vocabulary,
    duration_patterns: Vec<(Regex, u64)>,
    integer_regex: Regex,
}

impl Default for AttributeExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl AttributeExtractor {
    pub fn new() -> Self {
        let duration_patterns = DURATION_PATTERNS
            .iter()
            .map(|(pattern, multiplier)| (Regex::new(pattern).expect("Invalid duration regex"), *multiplier))
            .collect();

        Self {
            job_levels: Vocabulary::new(JOB_LEVELS),
            industries: Vocabulary::new(INDUSTRIES),
            languages: Vocabulary::new(LANGUAGES),
            job_families: Vocabulary::new(JOB_FAMILIES),
            duration_patterns,
            integer_regex: Regex::new(r"[0-9]+").expect("Invalid integer regex"),
        }
    }

    pub fn extract(&self, query: &str) -> QueryConstraints {
        let lowered = query.to_lowercase();

        let constraints = QueryConstraints {
            job_level: self.job_levels.first_declared_match(&lowered),
            industry: self.industries.first_declared_match(&lowered),
            language: self.languages.first_declared_match(&lowered),
            job_family: self.job_families.first_declared_match(&lowered),
            max_duration_minutes: self.extract_duration(&lowered),
        };

        debug!("Extracted constraints: {:?}", constraints);
        constraints
    }

    /// The first pattern (in priority order) that matches anywhere decides;
    /// later patterns are not consulted even if its number is unusable.
    fn extract_duration(&self, lowered: &str) -> Option<u64> {
        let (captures, multiplier) = self
            .duration_patterns
            .iter()
            .find_map(|(regex, multiplier)| regex.captures(lowered).map(|c| (c, *multiplier)))?;

        let value: u64 = captures.get(1)?.as_str().parse().ok()?;
        value.checked_mul(multiplier).filter(|minutes| *minutes > 0)
    }

    /// First run of ASCII digits in `text`, e.g. 45 for "45-50 minutes".
    /// Runs too large for `u64` saturate to `u64::MAX`.
    pub fn first_integer(&self, text: &str) -> Option<u64> {
        self.integer_regex
            .find(text)
            .map(|m| m.as_str().parse().unwrap_or(u64::MAX))
    }
}
