//! TF-IDF text vectorization
//!
//! Fitting produces an immutable [`VectorizerState`]: an alphabetically
//! ordered vocabulary of at most `max_features` terms and one smoothed IDF
//! weight per term. Transforming a document yields raw term counts scaled
//! by IDF and L2-normalised.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::OnceLock;

/// Default vocabulary bound
pub const DEFAULT_MAX_FEATURES: usize = 50;

/// English stop words removed before counting
pub const ENGLISH_STOP_WORDS: &[&str] = &[
    "a", "about", "above", "across", "after", "afterwards", "again", "against", "all", "almost",
    "alone", "along", "already", "also", "although", "always", "am", "among", "amongst", "an",
    "and", "another", "any", "anyhow", "anyone", "anything", "anyway", "anywhere", "are",
    "around", "as", "at", "back", "be", "became", "because", "become", "becomes", "becoming",
    "been", "before", "beforehand", "behind", "being", "below", "beside", "besides", "between",
    "beyond", "both", "but", "by", "can", "cannot", "could", "did", "do", "does", "done", "down",
    "due", "during", "each", "eg", "either", "else", "elsewhere", "enough", "etc", "even",
    "ever", "every", "everyone", "everything", "everywhere", "except", "few", "for", "former",
    "formerly", "from", "further", "get", "give", "go", "had", "has", "have", "he", "hence",
    "her", "here", "hereafter", "hereby", "herein", "hers", "herself", "him", "himself", "his",
    "how", "however", "i", "ie", "if", "in", "inc", "indeed", "into", "is", "it", "its",
    "itself", "just", "keep", "last", "latter", "least", "less", "made", "many", "may", "me",
    "meanwhile", "might", "mine", "more", "moreover", "most", "mostly", "much", "must", "my",
    "myself", "namely", "neither", "never", "nevertheless", "next", "no", "nobody", "none",
    "noone", "nor", "not", "nothing", "now", "nowhere", "of", "off", "often", "on", "once",
    "one", "only", "onto", "or", "other", "others", "otherwise", "our", "ours", "ourselves",
    "out", "over", "own", "per", "perhaps", "please", "put", "rather", "re", "same", "see",
    "seem", "seemed", "seeming", "seems", "several", "she", "should", "since", "so", "some",
    "somehow", "someone", "something", "sometime", "sometimes", "somewhere", "still", "such",
    "than", "that", "the", "their", "them", "themselves", "then", "thence", "there",
    "thereafter", "thereby", "therefore", "therein", "thereupon", "these", "they", "this",
    "those", "though", "through", "throughout", "thru", "thus", "to", "together", "too",
    "toward", "towards", "under", "until", "up", "upon", "us", "very", "via", "was", "we",
    "well", "were", "what", "whatever", "when", "whence", "whenever", "where", "whereafter",
    "whereas", "whereby", "wherein", "whereupon", "wherever", "whether", "which", "while",
    "who", "whoever", "whole", "whom", "whose", "why", "will", "with", "within", "without",
    "would", "yet", "you", "your", "yours", "yourself", "yourselves",
];

static STOP_WORD_SET: OnceLock<HashSet<&'static str>> = OnceLock::new();

fn is_stop_word(token: &str) -> bool {
    STOP_WORD_SET
        .get_or_init(|| ENGLISH_STOP_WORDS.iter().copied().collect())
        .contains(token)
}

/// Lowercased word tokens of two or more characters, stop words removed
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|t| t.chars().count() >= 2 && !is_stop_word(t))
        .map(str::to_string)
        .collect()
}

/// Fitted vocabulary and IDF weights
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorizerState {
    vocabulary: Vec<String>,
    idf: Vec<f64>,
    #[serde(skip)]
    index: OnceLock<HashMap<String, usize>>,
}

impl PartialEq for VectorizerState {
    fn eq(&self, other: &Self) -> bool {
        self.vocabulary == other.vocabulary && self.idf == other.idf
    }
}

impl VectorizerState {
    fn new(vocabulary: Vec<String>, idf: Vec<f64>) -> Self {
        Self {
            vocabulary,
            idf,
            index: OnceLock::new(),
        }
    }

    pub fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }

    pub fn idf(&self) -> &[f64] {
        &self.idf
    }

    /// Number of output columns
    pub fn width(&self) -> usize {
        self.vocabulary.len()
    }

    fn term_index(&self) -> &HashMap<String, usize> {
        self.index.get_or_init(|| {
            self.vocabulary
                .iter()
                .enumerate()
                .map(|(i, t)| (t.clone(), i))
                .collect()
        })
    }

    /// TF-IDF row for one document
    pub fn transform_one(&self, document: &str) -> Vec<f64> {
        let index = self.term_index();
        let mut row = vec![0.0; self.width()];
        for token in tokenize(document) {
            if let Some(&i) = index.get(&token) {
                row[i] += 1.0;
            }
        }
        for (value, idf) in row.iter_mut().zip(&self.idf) {
            *value *= idf;
        }
        let norm = row.iter().map(|v| v * v).sum::<f64>().sqrt();
        if norm > 0.0 {
            for value in row.iter_mut() {
                *value /= norm;
            }
        }
        row
    }

    /// Row-major TF-IDF matrix for a batch of documents
    pub fn transform(&self, documents: &[&str]) -> Vec<Vec<f64>> {
        documents.iter().map(|d| self.transform_one(d)).collect()
    }
}

/// Builder for [`VectorizerState`]
#[derive(Debug, Clone)]
pub struct TfidfVectorizer {
    max_features: usize,
}

impl Default for TfidfVectorizer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FEATURES)
    }
}

impl TfidfVectorizer {
    pub fn new(max_features: usize) -> Self {
        Self { max_features }
    }

    /// Learn the vocabulary and IDF weights from a corpus
    ///
    /// Terms are ranked by total count across the corpus, ties broken
    /// alphabetically; the kept terms are then ordered alphabetically.
    pub fn fit(&self, documents: &[&str]) -> VectorizerState {
        let mut term_counts: BTreeMap<String, usize> = BTreeMap::new();
        let mut doc_freq: BTreeMap<String, usize> = BTreeMap::new();

        for document in documents {
            let tokens = tokenize(document);
            let mut seen: HashSet<&str> = HashSet::new();
            for token in &tokens {
                *term_counts.entry(token.clone()).or_default() += 1;
                if seen.insert(token.as_str()) {
                    *doc_freq.entry(token.clone()).or_default() += 1;
                }
            }
        }

        // BTreeMap iteration is alphabetical, so a stable sort keeps ties alphabetical
        let mut ranked: Vec<(String, usize)> = term_counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked.truncate(self.max_features);

        let mut vocabulary: Vec<String> = ranked.into_iter().map(|(t, _)| t).collect();
        vocabulary.sort();

        let n_docs = documents.len() as f64;
        let idf = vocabulary
            .iter()
            .map(|term| {
                let df = doc_freq.get(term).copied().unwrap_or(0) as f64;
                ((1.0 + n_docs) / (1.0 + df)).ln() + 1.0
            })
            .collect();

        VectorizerState::new(vocabulary, idf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_drops_short_and_stop_words() {
        assert_eq!(
            tokenize("A spacious 3BHK in the heart of the city!"),
            vec!["spacious", "3bhk", "heart", "city"]
        );
        assert!(tokenize("").is_empty());
    }

    #[test]
    fn test_vocabulary_bounded_and_alphabetical() {
        let docs = ["park park park metro", "metro mall", "school"];
        let state = TfidfVectorizer::new(2).fit(&docs);
        assert_eq!(state.vocabulary(), &["metro".to_string(), "park".to_string()]);
        assert_eq!(state.width(), 2);
    }

    #[test]
    fn test_ties_broken_alphabetically() {
        let docs = ["zebra apple mango"];
        let state = TfidfVectorizer::new(2).fit(&docs);
        assert_eq!(state.vocabulary(), &["apple".to_string(), "mango".to_string()]);
    }

    #[test]
    fn test_smoothed_idf() {
        let docs = ["garden pool", "garden"];
        let state = TfidfVectorizer::default().fit(&docs);
        // garden in both docs: ln(3/3) + 1 = 1; pool in one: ln(3/2) + 1
        assert_eq!(state.vocabulary(), &["garden".to_string(), "pool".to_string()]);
        assert!((state.idf()[0] - 1.0).abs() < 1e-12);
        assert!((state.idf()[1] - (1.5f64.ln() + 1.0)).abs() < 1e-12);
    }

    #[test]
    fn test_rows_are_l2_normalised() {
        let docs = ["modern flat near metro", "old villa with garden"];
        let state = TfidfVectorizer::default().fit(&docs);
        for row in state.transform(&docs) {
            let norm: f64 = row.iter().map(|v| v * v).sum::<f64>().sqrt();
            assert!((norm - 1.0).abs() < 1e-12);
        }
        let unseen = state.transform_one("completely unknown words");
        assert!(unseen.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_transform_is_deterministic() {
        let docs = ["bright corner apartment", "apartment near park"];
        let state = TfidfVectorizer::default().fit(&docs);
        assert_eq!(state.transform(&docs), state.transform(&docs));
    }

    #[test]
    fn test_state_serde_round_trip() {
        let docs = ["bright corner apartment", "apartment near park"];
        let state = TfidfVectorizer::default().fit(&docs);
        let json = serde_json::to_string(&state).unwrap();
        let restored: VectorizerState = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, state);
        assert_eq!(restored.transform(&docs), state.transform(&docs));
    }
}
