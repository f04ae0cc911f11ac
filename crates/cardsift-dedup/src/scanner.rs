use cardsift_core::{Card, DedupConfig};
use chrono::{DateTime, Utc};
use tracing::warn;

use crate::cluster::{ClusterBuilder, SeedGroup};
use crate::error::{DedupError, Result};
use crate::progress::ScanProgress;
use crate::similarity::SimilarityMetric;

/// The two detection modes differ in more than their metric; the asymmetries
/// live here so the scan loop reads the same for both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanMode {
    NearDuplicate,
    Concept,
}

impl ScanMode {
    /// Concept scans log and skip a failing pair; near-duplicate scans abort.
    pub fn isolates_pair_failures(self) -> bool {
        matches!(self, Self::Concept)
    }

    /// Concept scans also report progress after every outer iteration.
    pub fn reports_each_seed(self) -> bool {
        matches!(self, Self::Concept)
    }

    /// Concept groups are reordered by descending similarity to the seed and
    /// each member carries its score.
    pub fn ranks_members(self) -> bool {
        matches!(self, Self::Concept)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::NearDuplicate => "near-duplicate",
            Self::Concept => "concept",
        }
    }
}

/// Per-call knobs for a detection run.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Comparisons between two yields to the scheduler.
    pub batch_size: usize,
    /// Off in tests that want the scan to run straight through.
    pub yield_to_scheduler: bool,
    /// "Now" for recency scoring; `None` uses the wall clock at call time.
    pub reference_time: Option<DateTime<Utc>>,
    /// Category placeholder that earns no quality credit.
    pub default_category: String,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self::from(&DedupConfig::default())
    }
}

impl From<&DedupConfig> for ScanOptions {
    fn from(config: &DedupConfig) -> Self {
        Self {
            batch_size: config.batch_size,
            yield_to_scheduler: config.yield_to_scheduler,
            reference_time: None,
            default_category: config.default_category.clone(),
        }
    }
}

impl ScanOptions {
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(DedupError::InvalidOptions(
                "batch_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Runs the all-pairs seed scan on the current task, yielding to the
/// scheduler after every `batch_size` comparisons.
#[derive(Debug, Clone)]
pub struct CooperativeScanner {
    yield_to_scheduler: bool,
}

impl CooperativeScanner {
    pub fn new(options: &ScanOptions) -> Self {
        Self {
            yield_to_scheduler: options.yield_to_scheduler,
        }
    }

    pub async fn scan<M, F>(
        &self,
        cards: &[Card],
        metric: &M,
        mode: ScanMode,
        threshold: f64,
        progress: &mut ScanProgress<F>,
    ) -> Result<Vec<SeedGroup>>
    where
        M: SimilarityMetric,
        F: FnMut(f64),
    {
        let features: Vec<M::Features> = cards.iter().map(|card| metric.features(card)).collect();
        let mut builder = ClusterBuilder::new(cards, threshold);

        for i in 0..cards.len() {
            if builder.open_seed(i) {
                for j in (i + 1)..cards.len() {
                    if builder.is_processed(j) {
                        continue;
                    }

                    match compare(cards, &features, metric, i, j) {
                        Ok(similarity) => {
                            builder.offer(j, similarity);
                        }
                        Err(err) if mode.isolates_pair_failures() => {
                            warn!("skipping pair in {} scan: {}", mode.label(), err);
                        }
                        Err(err) => return Err(err),
                    }

                    if progress.record_comparison() {
                        progress.report_seed_position(i);
                        self.pause().await;
                    }
                }
                builder.close_seed();
            }

            if mode.reports_each_seed() {
                progress.report_seed_position(i + 1);
            }
        }

        Ok(builder.finish())
    }

    async fn pause(&self) {
        if self.yield_to_scheduler {
            tokio::task::yield_now().await;
        }
    }
}

fn compare<M: SimilarityMetric>(
    cards: &[Card],
    features: &[M::Features],
    metric: &M,
    i: usize,
    j: usize,
) -> Result<f64> {
    let similarity = metric
        .score(&features[i], &features[j])
        .map_err(|err| DedupError::Metric {
            left: cards[i].id.clone(),
            right: cards[j].id.clone(),
            message: err.to_string(),
        })?;

    if !(0.0..=1.0).contains(&similarity) {
        return Err(DedupError::InvalidScore {
            left: cards[i].id.clone(),
            right: cards[j].id.clone(),
            score: similarity,
        });
    }
    Ok(similarity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MetricError;
    use crate::similarity::LexicalMetric;

    /// Scores 1.0 for every pair except those involving `poisoned`.
    struct PoisonedMetric {
        poisoned: &'static str,
    }

    impl SimilarityMetric for PoisonedMetric {
        type Features = String;

        fn features(&self, card: &Card) -> String {
            card.id.clone()
        }

        fn score(&self, left: &String, right: &String) -> std::result::Result<f64, MetricError> {
            if left == self.poisoned || right == self.poisoned {
                return Err(MetricError(format!("cannot score {}", self.poisoned)));
            }
            Ok(1.0)
        }
    }

    struct NanMetric;

    impl SimilarityMetric for NanMetric {
        type Features = ();

        fn features(&self, _card: &Card) {}

        fn score(&self, _left: &(), _right: &()) -> std::result::Result<f64, MetricError> {
            Ok(f64::NAN)
        }
    }

    /// Cards whose questions share no tokens: "aaaaaa", "bababa", ...
    fn deck(n: usize) -> Vec<Card> {
        let letter = |k: usize| char::from(b'a' + (k % 26) as u8);
        (0..n)
            .map(|i| {
                let question = format!("{}{}", letter(i), letter(i / 26)).repeat(3);
                Card::new(format!("c{i}"), question, "")
            })
            .collect()
    }

    fn scanner() -> CooperativeScanner {
        CooperativeScanner::new(&ScanOptions {
            yield_to_scheduler: false,
            ..ScanOptions::default()
        })
    }

    #[tokio::test]
    async fn near_duplicate_scan_propagates_metric_errors() {
        let cards = deck(4);
        let metric = PoisonedMetric { poisoned: "c2" };
        let mut progress = ScanProgress::new(cards.len(), 50, |_| {});

        let err = scanner()
            .scan(&cards, &metric, ScanMode::NearDuplicate, 0.5, &mut progress)
            .await
            .unwrap_err();
        assert!(matches!(err, DedupError::Metric { ref right, .. } if right == "c2"));
    }

    #[tokio::test]
    async fn concept_scan_skips_failing_pairs() {
        let cards = deck(4);
        let metric = PoisonedMetric { poisoned: "c2" };
        let mut progress = ScanProgress::new(cards.len(), 50, |_| {});

        let groups = scanner()
            .scan(&cards, &metric, ScanMode::Concept, 0.5, &mut progress)
            .await
            .unwrap();
        // c0 absorbs c1 and c3; c2 never scores and is left on its own.
        assert_eq!(
            groups,
            vec![SeedGroup {
                seed: 0,
                matches: vec![(1, 1.0), (3, 1.0)],
            }]
        );
    }

    #[tokio::test]
    async fn out_of_range_scores_are_rejected() {
        let cards = deck(2);
        let mut progress = ScanProgress::new(cards.len(), 50, |_| {});
        let err = scanner()
            .scan(&cards, &NanMetric, ScanMode::NearDuplicate, 0.5, &mut progress)
            .await
            .unwrap_err();
        assert!(matches!(err, DedupError::InvalidScore { .. }));
    }

    #[tokio::test]
    async fn progress_reports_every_batch_from_seed_position() {
        let cards = deck(6);
        let mut seen = Vec::new();
        let mut progress = ScanProgress::new(cards.len(), 5, |f| seen.push(f));

        scanner()
            .scan(&cards, &LexicalMetric, ScanMode::NearDuplicate, 0.99, &mut progress)
            .await
            .unwrap();
        // 15 comparisons: batches close at seeds 0 (5th), 2 (10th) and 4 (15th).
        assert_eq!(progress.comparisons(), 15);
        drop(progress);
        assert_eq!(seen, vec![0.0, 2.0 / 6.0, 4.0 / 6.0]);
    }

    #[tokio::test]
    async fn concept_mode_also_reports_each_seed() {
        let cards = deck(3);
        let mut seen = Vec::new();
        let mut progress = ScanProgress::new(cards.len(), 50, |f| seen.push(f));

        scanner()
            .scan(&cards, &LexicalMetric, ScanMode::Concept, 0.99, &mut progress)
            .await
            .unwrap();
        drop(progress);
        assert_eq!(seen, vec![1.0 / 3.0, 2.0 / 3.0]);
    }

    #[tokio::test]
    async fn yielding_scan_matches_straight_scan() {
        let cards = deck(40);
        let yielding = CooperativeScanner::new(&ScanOptions::default());

        let mut p1 = ScanProgress::new(cards.len(), 7, |_| {});
        let mut p2 = ScanProgress::new(cards.len(), 7, |_| {});
        let a = yielding
            .scan(&cards, &LexicalMetric, ScanMode::NearDuplicate, 0.6, &mut p1)
            .await
            .unwrap();
        let b = scanner()
            .scan(&cards, &LexicalMetric, ScanMode::NearDuplicate, 0.6, &mut p2)
            .await
            .unwrap();
        assert_eq!(a, b);
    }
}
