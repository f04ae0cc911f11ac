use std::collections::HashSet;
use std::hash::Hash;

use cardsift_core::Card;
use once_cell::sync::Lazy;

use crate::error::MetricError;
use crate::normalize::normalize;

/// Edit distance is computed over at most this many leading characters.
pub const LEVENSHTEIN_MAX_CHARS: usize = 500;

const QUESTION_WEIGHT: f64 = 0.7;
const ANSWER_WEIGHT: f64 = 0.3;
const QUESTION_OVERLAP_BONUS: f64 = 0.3;

/// Words that say nothing about a card's subject: articles, auxiliaries,
/// pronouns, prepositions and generic prompt vocabulary.
pub static SUBJECT_STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        // articles, conjunctions, determiners
        "the", "and", "but", "nor", "yet", "any", "all", "each", "every", "some", "such",
        "this", "that", "these", "those", "than", "then", "also", "only", "very", "not",
        // auxiliary verbs
        "are", "was", "were", "been", "being", "has", "have", "had", "having", "does",
        "did", "doing", "done", "can", "could", "will", "would", "shall", "should", "may",
        "might", "must",
        // pronouns and question words
        "you", "your", "yours", "his", "her", "hers", "its", "our", "ours", "they",
        "them", "their", "theirs", "she", "him", "who", "whom", "whose", "what", "which",
        "when", "where", "why", "how", "there", "here",
        // prepositions
        "for", "from", "into", "onto", "with", "within", "without", "about", "above",
        "below", "over", "under", "between", "among", "through", "during", "before",
        "after", "against", "upon", "via", "per",
        // generic prompt vocabulary
        "define", "definition", "explain", "describe", "example", "examples",
        "difference", "differences", "differentiate", "compare", "contrast", "list",
        "name", "identify", "give", "state", "mean", "means", "meaning", "term",
    ]
    .into_iter()
    .collect()
});

/// A pairwise similarity in [0, 1] over pre-extracted card features.
///
/// Features are computed once per card before the all-pairs scan so the
/// quadratic part never re-normalizes text.
pub trait SimilarityMetric {
    type Features;

    fn features(&self, card: &Card) -> Self::Features;

    fn score(&self, left: &Self::Features, right: &Self::Features) -> Result<f64, MetricError>;
}

// ─── Text metrics ──────────────────────────────────────────

/// Jaccard similarity of the whitespace tokens longer than two characters.
pub fn word_jaccard(a: &str, b: &str) -> f64 {
    set_jaccard(&word_set(a), &word_set(b))
}

/// `1 - distance / longest`, on the first [`LEVENSHTEIN_MAX_CHARS`] characters of each side.
pub fn levenshtein_similarity(a: &str, b: &str) -> f64 {
    let a = truncate_chars(a, LEVENSHTEIN_MAX_CHARS);
    let b = truncate_chars(b, LEVENSHTEIN_MAX_CHARS);
    if a == b {
        return 1.0;
    }

    let longest = a.chars().count().max(b.chars().count());
    1.0 - strsim::levenshtein(a, b) as f64 / longest as f64
}

fn word_set(text: &str) -> HashSet<&str> {
    text.split_whitespace()
        .filter(|token| token.chars().count() > 2)
        .collect()
}

fn set_jaccard<T: Eq + Hash>(left: &HashSet<T>, right: &HashSet<T>) -> f64 {
    match (left.is_empty(), right.is_empty()) {
        (true, true) => 1.0,
        (true, false) | (false, true) => 0.0,
        (false, false) => {
            let shared = left.intersection(right).count();
            let union = left.len() + right.len() - shared;
            shared as f64 / union as f64
        }
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

// ─── Lexical (near-duplicate) metric ───────────────────────

#[derive(Debug, Clone, Copy, Default)]
pub struct LexicalMetric;

#[derive(Debug, Clone)]
pub struct LexicalFeatures {
    question: String,
    answer: String,
}

impl SimilarityMetric for LexicalMetric {
    type Features = LexicalFeatures;

    fn features(&self, card: &Card) -> LexicalFeatures {
        LexicalFeatures {
            question: normalize(&card.question),
            answer: normalize(&card.answer),
        }
    }

    fn score(&self, left: &LexicalFeatures, right: &LexicalFeatures) -> Result<f64, MetricError> {
        Ok(lexical_score(left, right))
    }
}

fn lexical_score(left: &LexicalFeatures, right: &LexicalFeatures) -> f64 {
    let question_jaccard = word_jaccard(&left.question, &right.question);
    let answer_jaccard = word_jaccard(&left.answer, &right.answer);
    let weighted = QUESTION_WEIGHT * question_jaccard + ANSWER_WEIGHT * answer_jaccard;

    // Edit distance catches rewordings that only differ in punctuation.
    let question_edit = levenshtein_similarity(&left.question, &right.question);
    weighted.max(question_edit)
}

/// Near-duplicate score of two cards: word overlap weighted towards the
/// question, or question edit similarity, whichever is higher.
pub fn card_similarity(a: &Card, b: &Card) -> f64 {
    lexical_score(&LexicalMetric.features(a), &LexicalMetric.features(b))
}

// ─── Concept metric ────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default)]
pub struct ConceptMetric;

#[derive(Debug, Clone)]
pub struct ConceptFeatures {
    terms: HashSet<String>,
    question_terms: HashSet<String>,
}

impl ConceptFeatures {
    pub fn terms(&self) -> &HashSet<String> {
        &self.terms
    }

    pub fn question_terms(&self) -> &HashSet<String> {
        &self.question_terms
    }
}

impl SimilarityMetric for ConceptMetric {
    type Features = ConceptFeatures;

    fn features(&self, card: &Card) -> ConceptFeatures {
        ConceptFeatures {
            terms: subject_terms(&format!("{} {}", card.question, card.answer)),
            question_terms: subject_terms(&card.question),
        }
    }

    fn score(&self, left: &ConceptFeatures, right: &ConceptFeatures) -> Result<f64, MetricError> {
        Ok(concept_score(left, right))
    }
}

fn subject_terms(text: &str) -> HashSet<String> {
    normalize(text)
        .split(|c: char| !c.is_alphanumeric())
        .filter(|term| term.chars().count() >= 3 && !SUBJECT_STOP_WORDS.contains(term))
        .map(str::to_string)
        .collect()
}

fn concept_score(left: &ConceptFeatures, right: &ConceptFeatures) -> f64 {
    if left.terms.is_empty() || right.terms.is_empty() {
        return 0.0;
    }

    let mut score = set_jaccard(&left.terms, &right.terms);

    if !left.question_terms.is_empty() && !right.question_terms.is_empty() {
        let shared = left.question_terms.intersection(&right.question_terms).count();
        let smaller = left.question_terms.len().min(right.question_terms.len());
        score += shared as f64 / smaller as f64 * QUESTION_OVERLAP_BONUS;
    }

    score.min(1.0)
}

/// Subject-term overlap of two cards, with a bonus for shared question terms.
pub fn concept_similarity(a: &Card, b: &Card) -> f64 {
    concept_score(&ConceptMetric.features(a), &ConceptMetric.features(b))
}
