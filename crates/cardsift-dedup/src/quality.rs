use cardsift_core::Card;
use chrono::{DateTime, Utc};

use crate::normalize::normalize;
use crate::types::ClusterMember;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Heuristic completeness/maturity score used to pick which card of a group
/// survives.
#[derive(Debug, Clone)]
pub struct QualityScorer {
    default_category: String,
    now: DateTime<Utc>,
}

impl QualityScorer {
    /// `now` is the reference point for recency.
    pub fn new(default_category: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            default_category: default_category.into(),
            now,
        }
    }

    pub fn score(&self, card: &Card) -> f64 {
        let mut score = 0.0;

        score += (normalize(&card.question).chars().count() as f64 / 100.0).min(3.0);
        score += (normalize(&card.answer).chars().count() as f64 / 200.0).min(3.0);

        if self.has_real_category(card) {
            score += 1.0;
        }
        if card
            .sub_category
            .as_deref()
            .is_some_and(|sub| !sub.trim().is_empty())
        {
            score += 0.5;
        }

        if let Some(quality) = card.quality.as_ref() {
            if quality.stability_present {
                score += 1.0;
            }
            if quality.difficulty_present {
                score += 0.5;
            }
            if let Some(updated) = quality.last_updated {
                score += self.recency(updated);
            }
        }

        score
    }

    /// Index of the highest-scoring member. Ties keep the earlier member.
    pub fn select_representative(&self, members: &[ClusterMember]) -> Option<usize> {
        let (first, rest) = members.split_first()?;
        let mut best_idx = 0;
        let mut best_score = self.score(&first.card);

        for (offset, member) in rest.iter().enumerate() {
            let score = self.score(&member.card);
            if score > best_score {
                best_score = score;
                best_idx = offset + 1;
            }
        }

        Some(best_idx)
    }

    fn has_real_category(&self, card: &Card) -> bool {
        card.category.as_deref().is_some_and(|category| {
            let category = category.trim();
            !category.is_empty() && !category.eq_ignore_ascii_case(&self.default_category)
        })
    }

    /// 1.0 for a card touched now, decaying linearly to 0 over a year.
    /// Timestamps in the future count as now.
    fn recency(&self, updated: DateTime<Utc>) -> f64 {
        let age_days = (self.now - updated).num_seconds().max(0) as f64 / SECONDS_PER_DAY;
        (1.0 - age_days / 365.0).max(0.0)
    }
}
