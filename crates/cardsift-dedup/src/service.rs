use cardsift_core::Card;
use chrono::Utc;
use tracing::{debug, info};

use crate::cluster::SeedGroup;
use crate::error::{DedupError, Result};
use crate::progress::ScanProgress;
use crate::quality::QualityScorer;
use crate::scanner::{CooperativeScanner, ScanMode, ScanOptions};
use crate::similarity::{ConceptMetric, LexicalMetric, SimilarityMetric};
use crate::types::{Cluster, ClusterMember, DedupResult};

pub const DEFAULT_NEAR_DUPLICATE_THRESHOLD: f64 = 0.7;
pub const DEFAULT_CONCEPT_THRESHOLD: f64 = 0.25;

/// Entry point for both detection modes. Holds no state between calls;
/// callers must not run two scans over the same deck concurrently.
#[derive(Debug, Clone, Default)]
pub struct DeduplicationService {
    options: ScanOptions,
}

impl DeduplicationService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ScanOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ScanOptions {
        &self.options
    }

    /// Lexical mode: word overlap or question edit distance at or above `threshold`.
    pub async fn find_near_duplicates<F>(
        &self,
        cards: &[Card],
        threshold: f64,
        on_progress: F,
    ) -> Result<DedupResult>
    where
        F: FnMut(f64),
    {
        self.find_with(cards, &LexicalMetric, ScanMode::NearDuplicate, threshold, on_progress)
            .await
    }

    /// Concept mode: shared subject terms at or above `threshold`. Groups are
    /// ordered by similarity to their seed and every member is annotated.
    pub async fn find_conceptually_similar<F>(
        &self,
        cards: &[Card],
        threshold: f64,
        on_progress: F,
    ) -> Result<DedupResult>
    where
        F: FnMut(f64),
    {
        self.find_with(cards, &ConceptMetric, ScanMode::Concept, threshold, on_progress)
            .await
    }

    pub async fn find_with<M, F>(
        &self,
        cards: &[Card],
        metric: &M,
        mode: ScanMode,
        threshold: f64,
        on_progress: F,
    ) -> Result<DedupResult>
    where
        M: SimilarityMetric,
        F: FnMut(f64),
    {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(DedupError::InvalidThreshold(threshold));
        }
        self.options.validate()?;

        debug!(
            "starting {} scan over {} cards at threshold {threshold}",
            mode.label(),
            cards.len()
        );

        let mut progress = ScanProgress::new(cards.len(), self.options.batch_size, on_progress);
        let groups = CooperativeScanner::new(&self.options)
            .scan(cards, metric, mode, threshold, &mut progress)
            .await?;

        let scorer = QualityScorer::new(
            self.options.default_category.clone(),
            self.options.reference_time.unwrap_or_else(Utc::now),
        );
        let result = assemble(cards, groups, mode, &scorer);
        progress.finish();

        info!(
            "{} scan finished: {} groups, keeping {}, deleting {} ({} comparisons)",
            mode.label(),
            result.groups.len(),
            result.keep.len(),
            result.delete.len(),
            progress.comparisons()
        );
        Ok(result)
    }
}

fn assemble(
    cards: &[Card],
    groups: Vec<SeedGroup>,
    mode: ScanMode,
    scorer: &QualityScorer,
) -> DedupResult {
    let mut result = DedupResult::default();

    for group in groups {
        let mut ranked: Vec<(usize, f64)> = group.members().collect();
        if mode.ranks_members() {
            ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        }

        let members: Vec<ClusterMember> = ranked
            .into_iter()
            .map(|(idx, similarity)| ClusterMember {
                card: cards[idx].clone(),
                similarity_to_seed: mode.ranks_members().then_some(similarity),
            })
            .collect();

        let representative = scorer.select_representative(&members).unwrap_or(0);
        for (pos, member) in members.iter().enumerate() {
            if pos == representative {
                result.keep.push(member.card.clone());
            } else {
                result.delete.push(member.card.clone());
            }
        }
        result.groups.push(Cluster { members });
    }

    result
}
