//! Description statistics, sentiment and curated keyword counts

use super::frame::FeatureFrame;
use super::schema::TEXT_COLUMNS;
use super::sentiment::SentimentAnalyzer;

/// Polarity above which a description counts as positive
pub const POSITIVE_SENTIMENT: f64 = 0.1;

/// Polarity below which a description counts as negative
pub const NEGATIVE_SENTIMENT: f64 = -0.1;

pub const LUXURY_KEYWORDS: [&str; 8] = [
    "luxury",
    "premium",
    "villa",
    "penthouse",
    "pool",
    "gym",
    "jacuzzi",
    "terrace",
];

pub const LOCATION_KEYWORDS: [&str; 7] = [
    "metro", "station", "hub", "mall", "park", "school", "hospital",
];

pub const CONDITION_KEYWORDS: [&str; 5] = ["renovated", "modern", "new", "furnished", "maintained"];

/// Number of keywords contained anywhere in the lowercased text
pub fn keyword_hits(lowercased: &str, keywords: &[&str]) -> usize {
    keywords.iter().filter(|k| lowercased.contains(*k)).count()
}

/// Per-description statistics
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStats {
    pub length: usize,
    pub words: usize,
    pub avg_word_length: f64,
}

impl TextStats {
    pub fn of(text: &str) -> Self {
        let words: Vec<&str> = text.split_whitespace().collect();
        let avg_word_length = if words.is_empty() {
            0.0
        } else {
            words.iter().map(|w| w.chars().count()).sum::<usize>() as f64 / words.len() as f64
        };
        Self {
            length: text.chars().count(),
            words: words.len(),
            avg_word_length,
        }
    }

    pub fn complexity(&self) -> f64 {
        self.words as f64 * self.avg_word_length
    }
}

pub(crate) fn add_text_features(
    frame: &mut FeatureFrame,
    descriptions: &[&str],
    analyzer: &SentimentAnalyzer,
) {
    let stats: Vec<TextStats> = descriptions.iter().map(|d| TextStats::of(d)).collect();
    let sentiment: Vec<f64> = descriptions.iter().map(|d| analyzer.polarity(d)).collect();
    let lowered: Vec<String> = descriptions.iter().map(|d| d.to_lowercase()).collect();
    let hits = |keywords: &[&str]| -> Vec<f64> {
        lowered
            .iter()
            .map(|t| keyword_hits(t, keywords) as f64)
            .collect()
    };

    let [len_col, words_col, avg_col, sent_col, pos_col, neg_col, lux_col, loc_col, cond_col, complexity_col] =
        TEXT_COLUMNS;
    frame.push_column(len_col, stats.iter().map(|s| s.length as f64).collect());
    frame.push_column(words_col, stats.iter().map(|s| s.words as f64).collect());
    frame.push_column(avg_col, stats.iter().map(|s| s.avg_word_length).collect());
    let positive: Vec<bool> = sentiment.iter().map(|&s| s > POSITIVE_SENTIMENT).collect();
    let negative: Vec<bool> = sentiment.iter().map(|&s| s < NEGATIVE_SENTIMENT).collect();
    frame.push_column(sent_col, sentiment);
    frame.push_flag(pos_col, positive.into_iter());
    frame.push_flag(neg_col, negative.into_iter());
    frame.push_column(lux_col, hits(&LUXURY_KEYWORDS));
    frame.push_column(loc_col, hits(&LOCATION_KEYWORDS));
    frame.push_column(cond_col, hits(&CONDITION_KEYWORDS));
    frame.push_column(complexity_col, stats.iter().map(TextStats::complexity).collect());
}
