use std::collections::HashSet;

use cardsift_core::Card;

/// A seed card and every later card that scored at or above the threshold
/// against it, in discovery order. Indices point into the scanned slice.
#[derive(Debug, Clone, PartialEq)]
pub struct SeedGroup {
    pub seed: usize,
    pub matches: Vec<(usize, f64)>,
}

impl SeedGroup {
    pub fn member_count(&self) -> usize {
        self.matches.len() + 1
    }

    /// Seed first (similarity 1.0), then matches.
    pub fn members(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        std::iter::once((self.seed, 1.0)).chain(self.matches.iter().copied())
    }
}

/// Single-pass star clustering: every candidate is compared against the
/// group's seed only, never against other members, and a card joins at most
/// one group. Processing is keyed on card id.
///
/// The scanner drives it step by step so it can yield between comparisons;
/// [`ClusterBuilder::build`] runs the whole pass synchronously.
#[derive(Debug)]
pub struct ClusterBuilder<'a> {
    cards: &'a [Card],
    threshold: f64,
    processed: HashSet<&'a str>,
    current: Option<SeedGroup>,
    groups: Vec<SeedGroup>,
}

impl<'a> ClusterBuilder<'a> {
    pub fn new(cards: &'a [Card], threshold: f64) -> Self {
        Self {
            cards,
            threshold,
            processed: HashSet::with_capacity(cards.len()),
            current: None,
            groups: Vec::new(),
        }
    }

    pub fn is_processed(&self, idx: usize) -> bool {
        self.processed.contains(self.cards[idx].id.as_str())
    }

    /// Starts a group seeded at `idx`. Returns false if the card already
    /// belongs to an earlier group.
    pub fn open_seed(&mut self, idx: usize) -> bool {
        self.close_seed();
        if !self.processed.insert(self.cards[idx].id.as_str()) {
            return false;
        }
        self.current = Some(SeedGroup {
            seed: idx,
            matches: Vec::new(),
        });
        true
    }

    /// Offers the candidate's similarity to the open seed. Returns true if it joined.
    pub fn offer(&mut self, idx: usize, similarity: f64) -> bool {
        let Some(group) = self.current.as_mut() else {
            return false;
        };
        if similarity < self.threshold {
            return false;
        }
        if !self.processed.insert(self.cards[idx].id.as_str()) {
            return false;
        }
        group.matches.push((idx, similarity));
        true
    }

    /// Closes the open group, keeping it only if something matched the seed.
    pub fn close_seed(&mut self) {
        if let Some(group) = self.current.take()
            && !group.matches.is_empty()
        {
            self.groups.push(group);
        }
    }

    pub fn finish(mut self) -> Vec<SeedGroup> {
        self.close_seed();
        self.groups
    }

    pub fn build<F>(cards: &'a [Card], threshold: f64, mut similarity: F) -> Vec<SeedGroup>
    where
        F: FnMut(&Card, &Card) -> f64,
    {
        let mut builder = Self::new(cards, threshold);
        for i in 0..cards.len() {
            if !builder.open_seed(i) {
                continue;
            }
            for j in (i + 1)..cards.len() {
                if builder.is_processed(j) {
                    continue;
                }
                builder.offer(j, similarity(&cards[i], &cards[j]));
            }
            builder.close_seed();
        }
        builder.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cards(ids: &[&str]) -> Vec<Card> {
        ids.iter().map(|id| Card::new(*id, *id, "")).collect()
    }

    /// Similarity lookup over card ids; unlisted pairs score 0.
    fn table<'t>(pairs: &'t [(&'t str, &'t str, f64)]) -> impl FnMut(&Card, &Card) -> f64 + 't {
        move |a: &Card, b: &Card| {
            pairs
                .iter()
                .find(|(x, y, _)| (*x == a.id && *y == b.id) || (*x == b.id && *y == a.id))
                .map(|(_, _, s)| *s)
                .unwrap_or(0.0)
        }
    }

    #[test]
    fn groups_follow_discovery_order() {
        let deck = cards(&["a", "b", "c", "d", "e"]);
        let pairs = [("a", "c", 0.9), ("a", "e", 0.8), ("b", "d", 0.75)];
        let groups = ClusterBuilder::build(&deck, 0.7, table(&pairs));

        assert_eq!(
            groups,
            vec![
                SeedGroup {
                    seed: 0,
                    matches: vec![(2, 0.9), (4, 0.8)],
                },
                SeedGroup {
                    seed: 1,
                    matches: vec![(3, 0.75)],
                },
            ]
        );
    }

    #[test]
    fn members_are_compared_with_the_seed_only() {
        // b and c both match a but not each other: still one group.
        let deck = cards(&["a", "b", "c"]);
        let pairs = [("a", "b", 0.8), ("a", "c", 0.8), ("b", "c", 0.1)];
        let groups = ClusterBuilder::build(&deck, 0.7, table(&pairs));
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].member_count(), 3);
    }

    #[test]
    fn chains_are_not_followed_transitively() {
        // a~b and b~c, but a!~c: c is left alone once b is absorbed by a.
        let deck = cards(&["a", "b", "c"]);
        let pairs = [("a", "b", 0.8), ("b", "c", 0.8)];
        let groups = ClusterBuilder::build(&deck, 0.7, table(&pairs));
        assert_eq!(
            groups,
            vec![SeedGroup {
                seed: 0,
                matches: vec![(1, 0.8)],
            }]
        );
    }

    #[test]
    fn threshold_is_inclusive() {
        let deck = cards(&["a", "b"]);
        let pairs = [("a", "b", 0.7)];
        assert_eq!(ClusterBuilder::build(&deck, 0.7, table(&pairs)).len(), 1);
        assert!(ClusterBuilder::build(&deck, 0.71, table(&pairs)).is_empty());
    }

    #[test]
    fn singletons_are_not_emitted() {
        let deck = cards(&["a", "b", "c"]);
        assert!(ClusterBuilder::build(&deck, 0.5, |_, _| 0.0).is_empty());
        assert!(ClusterBuilder::build(&[], 0.5, |_, _| 1.0).is_empty());
    }

    #[test]
    fn no_card_lands_in_two_groups() {
        let deck = cards(&["a", "b", "c", "d"]);
        let groups = ClusterBuilder::build(&deck, 0.5, |_, _| 1.0);
        assert_eq!(groups.len(), 1);
        let members: Vec<usize> = groups[0].members().map(|(idx, _)| idx).collect();
        assert_eq!(members, vec![0, 1, 2, 3]);
    }
}
