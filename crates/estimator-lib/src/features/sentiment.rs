//! Lexicon-based sentiment scoring
//!
//! VADER-style compound polarity: token valences from an embedded lexicon,
//! adjusted for boosters, negation, contrastive "but" and exclamation marks,
//! then squashed into [-1, 1].
//!
//! The lexicon is a curated subset of VADER's vocabulary, weighted toward
//! words that show up in property listings. Words outside it score 0, so
//! general-purpose text scores closer to neutral than full VADER would.

use std::collections::HashMap;
use std::sync::OnceLock;

/// Normalisation constant for the compound score
const ALPHA: f64 = 15.0;

/// Scalar applied to a valence preceded by a negation
const NEGATION_SCALAR: f64 = -0.74;

/// Increment contributed by a booster word
const BOOSTER_INCREMENT: f64 = 0.293;

/// Emphasis added per exclamation mark (capped at four)
const EXCLAMATION_EMPHASIS: f64 = 0.292;

/// Valences on the VADER -4..4 scale
const LEXICON: &[(&str, f64)] = &[
    ("abandoned", -1.9),
    ("adorable", 2.2),
    ("affordable", 1.2),
    ("airy", 1.2),
    ("amazing", 2.8),
    ("appealing", 1.8),
    ("attractive", 1.9),
    ("awesome", 3.1),
    ("awful", -2.0),
    ("bad", -2.5),
    ("bargain", 0.8),
    ("beautiful", 2.9),
    ("beautifully", 2.7),
    ("best", 3.2),
    ("better", 1.9),
    ("blessed", 2.3),
    ("bonus", 1.0),
    ("boring", -1.3),
    ("breathtaking", 3.0),
    ("bright", 1.9),
    ("broken", -2.1),
    ("bug", -0.9),
    ("bugs", -0.9),
    ("busy", -0.4),
    ("calm", 1.3),
    ("charming", 2.8),
    ("cheap", -0.5),
    ("cheerful", 2.5),
    ("classic", 1.2),
    ("clean", 1.7),
    ("cold", -0.7),
    ("comfortable", 2.3),
    ("comfy", 1.8),
    ("congested", -1.2),
    ("contemporary", 0.9),
    ("convenient", 1.7),
    ("cosy", 1.9),
    ("cozy", 1.9),
    ("cracked", -1.2),
    ("cramped", -1.6),
    ("crowded", -1.3),
    ("crumbling", -1.9),
    ("cute", 2.0),
    ("damaged", -1.9),
    ("damp", -1.2),
    ("dangerous", -2.1),
    ("dark", -0.9),
    ("dated", -0.8),
    ("decrepit", -2.0),
    ("delight", 2.9),
    ("delightful", 2.9),
    ("derelict", -2.1),
    ("desirable", 1.7),
    ("dilapidated", -2.2),
    ("dingy", -1.6),
    ("dirt", -1.4),
    ("dirty", -1.9),
    ("disappointing", -2.2),
    ("drafty", -0.9),
    ("draughty", -0.9),
    ("dream", 1.0),
    ("dull", -1.7),
    ("easy", 1.9),
    ("efficient", 1.5),
    ("elegance", 2.1),
    ("elegant", 2.1),
    ("enjoy", 2.2),
    ("excellent", 3.2),
    ("exceptional", 2.9),
    ("excited", 1.4),
    ("exclusive", 0.5),
    ("expensive", -0.9),
    ("fabulous", 2.4),
    ("fantastic", 2.6),
    ("filthy", -2.7),
    ("fine", 0.8),
    ("flooded", -1.5),
    ("flooding", -1.5),
    ("free", 2.3),
    ("fresh", 1.3),
    ("friendly", 2.2),
    ("generous", 2.3),
    ("gloomy", -1.9),
    ("good", 1.9),
    ("gorgeous", 3.0),
    ("grand", 1.4),
    ("great", 3.1),
    ("gross", -2.1),
    ("happy", 2.7),
    ("hazard", -1.6),
    ("hazardous", -1.8),
    ("hideous", -2.8),
    ("horrible", -2.5),
    ("ideal", 2.4),
    ("immaculate", 2.5),
    ("impressive", 2.3),
    ("infested", -2.1),
    ("inviting", 2.0),
    ("isolated", -1.3),
    ("leaking", -1.3),
    ("leaky", -1.3),
    ("like", 1.5),
    ("love", 3.2),
    ("loved", 2.9),
    ("lovely", 2.8),
    ("lush", 1.3),
    ("luxurious", 2.3),
    ("luxury", 2.0),
    ("magnificent", 3.3),
    ("mess", -1.5),
    ("messy", -1.5),
    ("modern", 1.1),
    ("moldy", -1.9),
    ("mould", -1.6),
    ("mouldy", -1.9),
    ("musty", -1.3),
    ("nasty", -2.6),
    ("neglected", -2.4),
    ("nice", 1.8),
    ("noisy", -0.7),
    ("old", -0.2),
    ("outdated", -1.2),
    ("overpriced", -1.5),
    ("peaceful", 2.2),
    ("perfect", 2.7),
    ("picturesque", 2.2),
    ("pleasant", 2.3),
    ("pleasing", 2.4),
    ("polished", 1.3),
    ("polluted", -1.9),
    ("poor", -2.1),
    ("premium", 1.1),
    ("pretty", 2.2),
    ("prime", 1.1),
    ("pristine", 2.3),
    ("private", 0.8),
    ("problem", -1.7),
    ("problems", -1.7),
    ("quaint", 1.3),
    ("quiet", 0.9),
    ("recommend", 1.5),
    ("recommended", 1.4),
    ("refurbished", 1.2),
    ("relaxing", 2.2),
    ("remodeled", 1.1),
    ("renovated", 1.3),
    ("restored", 1.1),
    ("roomy", 1.4),
    ("rotten", -2.3),
    ("rotting", -2.2),
    ("ruined", -2.5),
    ("run-down", -1.8),
    ("rundown", -1.8),
    ("rustic", 0.6),
    ("safe", 1.9),
    ("scenic", 1.9),
    ("secluded", 0.4),
    ("secure", 1.4),
    ("serene", 2.0),
    ("shabby", -1.8),
    ("sleek", 1.3),
    ("small", -0.2),
    ("smelly", -1.4),
    ("sought-after", 1.6),
    ("spacious", 1.6),
    ("splendid", 2.8),
    ("stained", -1.2),
    ("stunning", 2.9),
    ("stylish", 2.0),
    ("sunny", 1.9),
    ("superb", 3.1),
    ("terrible", -2.1),
    ("terrific", 2.9),
    ("tiny", -0.6),
    ("tired", -1.0),
    ("tranquil", 2.1),
    ("trouble", -1.7),
    ("ugly", -2.3),
    ("unfinished", -0.8),
    ("unpleasant", -2.1),
    ("unsafe", -2.2),
    ("upgraded", 1.2),
    ("upscale", 1.3),
    ("vibrant", 2.0),
    ("warm", 0.9),
    ("welcoming", 2.1),
    ("well-maintained", 1.8),
    ("wonderful", 2.7),
    ("worn", -1.0),
    ("worse", -2.1),
    ("worst", -3.1),
    ("wow", 2.8),
    ("wrecked", -2.3),
];

const BOOSTERS: &[&str] = &[
    "absolutely",
    "completely",
    "enormously",
    "especially",
    "exceptionally",
    "extremely",
    "highly",
    "incredibly",
    "most",
    "particularly",
    "really",
    "remarkably",
    "so",
    "super",
    "totally",
    "truly",
    "very",
];

const DAMPENERS: &[&str] = &["barely", "hardly", "kinda", "less", "little", "marginally", "slightly", "somewhat"];

const NEGATIONS: &[&str] = &[
    "ain't", "aint", "cannot", "cant", "didnt", "doesnt", "dont", "isnt", "neither", "never",
    "no", "nobody", "none", "nor", "not", "nothing", "nowhere", "wasnt", "without", "wont",
];

static LEXICON_MAP: OnceLock<HashMap<&'static str, f64>> = OnceLock::new();

fn lexicon() -> &'static HashMap<&'static str, f64> {
    LEXICON_MAP.get_or_init(|| LEXICON.iter().copied().collect())
}

fn normalize_token(raw: &str) -> String {
    raw.trim_matches(|c: char| !c.is_alphanumeric() && c != '\'' && c != '-')
        .to_lowercase()
}

fn is_negation(token: &str) -> bool {
    NEGATIONS.contains(&token) || token.ends_with("n't")
}

/// Lexicon-based sentiment analyzer
#[derive(Debug, Clone, Copy, Default)]
pub struct SentimentAnalyzer;

impl SentimentAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Compound polarity in [-1, 1]; 0 for text with no sentiment-bearing words
    pub fn polarity(&self, text: &str) -> f64 {
        let tokens: Vec<String> = text
            .split_whitespace()
            .map(normalize_token)
            .filter(|t| !t.is_empty())
            .collect();

        let mut valences: Vec<f64> = Vec::with_capacity(tokens.len());
        for (i, token) in tokens.iter().enumerate() {
            let Some(&base) = lexicon().get(token.as_str()) else {
                valences.push(0.0);
                continue;
            };
            let mut valence = base;

            if let Some(prev) = i.checked_sub(1).map(|p| tokens[p].as_str()) {
                let sign = base.signum();
                if BOOSTERS.contains(&prev) {
                    valence += sign * BOOSTER_INCREMENT;
                } else if DAMPENERS.contains(&prev) {
                    valence -= sign * BOOSTER_INCREMENT;
                }
            }

            if tokens[i.saturating_sub(3)..i].iter().any(|t| is_negation(t)) {
                valence *= NEGATION_SCALAR;
            }
            valences.push(valence);
        }

        // contrastive "but": damp what precedes, stress what follows
        if let Some(but_idx) = tokens.iter().position(|t| t == "but") {
            for (i, v) in valences.iter_mut().enumerate() {
                if i < but_idx {
                    *v *= 0.5;
                } else if i > but_idx {
                    *v *= 1.5;
                }
            }
        }

        let mut sum: f64 = valences.iter().sum();
        if sum != 0.0 {
            let bangs = text.matches('!').count().min(4) as f64;
            sum += sum.signum() * bangs * EXCLAMATION_EMPHASIS;
        }

        if sum == 0.0 {
            return 0.0;
        }
        (sum / (sum * sum + ALPHA).sqrt()).clamp(-1.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neutral_text() {
        let analyzer = SentimentAnalyzer::new();
        assert_eq!(analyzer.polarity(""), 0.0);
        assert_eq!(analyzer.polarity("2BHK flat near metro"), 0.0);
    }

    #[test]
    fn test_positive_and_negative() {
        let analyzer = SentimentAnalyzer::new();
        assert!(analyzer.polarity("Beautiful spacious villa with stunning views") > 0.5);
        assert!(analyzer.polarity("Dirty, cramped and neglected unit") < -0.5);
    }

    #[test]
    fn test_negation_flips() {
        let analyzer = SentimentAnalyzer::new();
        let plain = analyzer.polarity("a nice home");
        let negated = analyzer.polarity("not a nice home");
        assert!(plain > 0.0);
        assert!(negated < 0.0);
    }

    #[test]
    fn test_booster_and_exclamation_intensify() {
        let analyzer = SentimentAnalyzer::new();
        let base = analyzer.polarity("good location");
        let boosted = analyzer.polarity("very good location");
        let shouted = analyzer.polarity("good location!!");
        assert!(boosted > base);
        assert!(shouted > base);
    }

    #[test]
    fn test_but_shifts_weight() {
        let analyzer = SentimentAnalyzer::new();
        assert!(analyzer.polarity("nice garden but terrible plumbing") < 0.0);
    }

    #[test]
    fn test_listing_vocabulary_scores() {
        let analyzer = SentimentAnalyzer::new();
        assert!(analyzer.polarity("Sunny, airy and freshly renovated loft") > 0.3);
        assert!(analyzer.polarity("Immaculate home in a tranquil cul-de-sac") > 0.3);
        assert!(analyzer.polarity("Dilapidated cottage with musty rooms") < -0.3);
        assert!(analyzer.polarity("Overpriced flat, dated kitchen") < 0.0);
    }

    #[test]
    fn test_bounded() {
        let analyzer = SentimentAnalyzer::new();
        let text = "amazing ".repeat(200);
        let score = analyzer.polarity(&text);
        assert!(score <= 1.0 && score > 0.99);
    }
}
