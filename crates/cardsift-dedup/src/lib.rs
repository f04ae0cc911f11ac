//! cardsift dedup: duplicate and near-duplicate flashcard detection.

pub mod cluster;
pub mod error;
pub mod normalize;
pub mod progress;
pub mod quality;
pub mod scanner;
pub mod service;
pub mod similarity;
pub mod types;

pub use cluster::{ClusterBuilder, SeedGroup};
pub use error::{DedupError, MetricError, Result};
pub use normalize::normalize;
pub use progress::ScanProgress;
pub use quality::QualityScorer;
pub use scanner::{CooperativeScanner, ScanMode, ScanOptions};
pub use service::{
    DEFAULT_CONCEPT_THRESHOLD, DEFAULT_NEAR_DUPLICATE_THRESHOLD, DeduplicationService,
};
pub use similarity::{
    ConceptMetric, LexicalMetric, SimilarityMetric, card_similarity, concept_similarity,
    levenshtein_similarity, word_jaccard,
};
pub use types::{Cluster, ClusterMember, DedupResult};
