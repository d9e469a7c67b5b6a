//! Noise filtering and ranking of search hits
//!
//! Scores live in three bands so the ordering between kinds of match never
//! depends on title length:
//!
//! | match                        | score                         |
//! |------------------------------|-------------------------------|
//! | bigram similarity only       | `0.0 ..= 1.0`                 |
//! | query is a prefix of title   | `1.25 .. 1.75`                |
//! | case-insensitive equality    | `2.0`                         |
//!
//! Folders get a bonus below the gap between bands, so it only reorders
//! matches of the same kind.
//!
//! Chrome phrases ("Parent Directory", "powered by", ...) are matched as
//! case-insensitive substrings. Column headers ("Name", "Size", ...) only
//! match a whole title, so "The Name of the Rose" is not noise.

use std::collections::HashMap;

use crate::config::{RelevanceConfig, TagMatch};
use crate::types::Entry;

/// Score of a case-insensitive exact match
pub const EXACT_MATCH_SCORE: f64 = 2.0;
/// Lowest score a prefix match can get
pub const PREFIX_SCORE_FLOOR: f64 = 1.25;
const PREFIX_SCORE_SPAN: f64 = 0.5;
/// Folder bonuses at or above this would let a folder jump a band
pub const MAX_FOLDER_BONUS: f64 = 0.25;

/// Character-bigram Dice coefficient
///
/// Bigrams are counted with multiplicity, so the result is symmetric and
/// within `[0, 1]`. Strings shorter than two characters score 0.
///
/// # Example
/// ```
/// use dhakaflix_core::relevance::dice;
/// assert_eq!(dice("night", "night"), 1.0);
/// assert_eq!(dice("abc", "xyz"), 0.0);
/// ```
pub fn dice(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.len() < 2 || b.len() < 2 {
        return 0.0;
    }

    let mut counts: HashMap<(char, char), usize> = HashMap::new();
    for pair in a.windows(2) {
        *counts.entry((pair[0], pair[1])).or_default() += 1;
    }

    let mut shared = 0usize;
    for pair in b.windows(2) {
        if let Some(count) = counts.get_mut(&(pair[0], pair[1]))
            && *count > 0
        {
            *count -= 1;
            shared += 1;
        }
    }

    (2 * shared) as f64 / (a.len() - 1 + b.len() - 1) as f64
}

/// Noise filter and scorer over a fixed [`RelevanceConfig`]
#[derive(Debug, Clone)]
pub struct Relevance {
    config: RelevanceConfig,
    chrome_phrases: Vec<String>,
    column_headers: Vec<String>,
    uploader_tags: Vec<String>,
}

impl Relevance {
    pub fn new(config: RelevanceConfig) -> Self {
        let lower = |items: &[String]| -> Vec<String> {
            items.iter().map(|s| s.to_lowercase()).collect()
        };
        Self {
            chrome_phrases: lower(&config.chrome_phrases),
            column_headers: lower(&config.column_headers),
            uploader_tags: lower(&config.uploader_tags),
            config,
        }
    }

    /// Whether a title is listing chrome or release-group clutter
    ///
    /// A title carrying an uploader tag is kept when the query is that tag
    /// (with or without its leading marker).
    pub fn is_noise(&self, title: &str, query: &str) -> bool {
        let lower = title.trim().to_lowercase();
        if lower.is_empty() || self.is_chrome(&lower) {
            return true;
        }

        let wanted = query.trim().trim_start_matches('-').to_lowercase();
        let mut tagged = false;
        for tag in self.uploader_tags.iter().filter(|t| self.has_tag(&lower, t)) {
            if !wanted.is_empty() && tag.trim_start_matches('-') == wanted {
                return false;
            }
            tagged = true;
        }
        tagged
    }

    /// Whether a title is listing chrome (server banners, column headers)
    pub fn is_chrome(&self, title: &str) -> bool {
        let lower = title.trim().to_lowercase();
        self.chrome_phrases.iter().any(|p| lower.contains(p.as_str()))
            || self.column_headers.iter().any(|h| lower == *h)
    }

    fn has_tag(&self, lower_title: &str, tag: &str) -> bool {
        match self.config.tag_match {
            TagMatch::Suffix => {
                lower_title.ends_with(tag)
                    || lower_title.contains(&format!("{}.", tag))
                    || lower_title.contains(&format!("{} ", tag))
            }
            TagMatch::Contains => lower_title.contains(tag),
        }
    }

    /// Similarity of a title to the query, banded as described in the
    /// module docs
    pub fn score(&self, title: &str, query: &str) -> f64 {
        let title = title.trim().to_lowercase();
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return 0.0;
        }
        if title == query {
            return EXACT_MATCH_SCORE;
        }

        let base = dice(&title, &query);
        if title.starts_with(&query) {
            PREFIX_SCORE_FLOOR + PREFIX_SCORE_SPAN * base
        } else {
            base
        }
    }

    /// Score used for ordering, including the folder bonus
    pub fn rank_score(&self, entry: &Entry, query: &str) -> f64 {
        let bonus = if entry.is_container() {
            self.config.folder_bonus
        } else {
            0.0
        };
        self.score(&entry.title, query) + bonus
    }

    /// Whether an entry survives noise filtering and the score cutoff
    pub fn accepts(&self, entry: &Entry, query: &str) -> bool {
        !self.is_noise(&entry.title, query) && self.score(&entry.title, query) >= self.config.min_score
    }

    /// Filters and orders entries for a query
    pub fn rank(&self, entries: Vec<Entry>, query: &str) -> Vec<Entry> {
        let accepted = entries
            .into_iter()
            .filter(|e| self.accepts(e, query))
            .collect();
        self.order(accepted, query)
    }

    /// Orders entries without filtering
    ///
    /// Descending rank score, then shorter title, then location, so the
    /// output does not depend on input order.
    pub fn order(&self, entries: Vec<Entry>, query: &str) -> Vec<Entry> {
        let mut scored: Vec<(f64, Entry)> = entries
            .into_iter()
            .map(|e| (self.rank_score(&e, query), e))
            .collect();

        scored.sort_by(|(score_a, a), (score_b, b)| {
            score_b
                .total_cmp(score_a)
                .then_with(|| a.title.chars().count().cmp(&b.title.chars().count()))
                .then_with(|| a.location.cmp(&b.location))
        });

        scored.into_iter().map(|(_, e)| e).collect()
    }
}

impl Default for Relevance {
    fn default() -> Self {
        Self::new(RelevanceConfig::default())
    }
}
