use cardsift_core::Card;
use serde::Serialize;

/// A card inside a reported group, optionally annotated with its similarity
/// to the group's seed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterMember {
    pub card: Card,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity_to_seed: Option<f64>,
}

/// Two or more cards judged to be the same content.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cluster {
    pub members: Vec<ClusterMember>,
}

impl Cluster {
    pub fn cards(&self) -> impl Iterator<Item = &Card> {
        self.members.iter().map(|member| &member.card)
    }
}

/// Outcome of a detection run. `keep` holds one representative per group,
/// `delete` every other group member; cards outside all groups appear in neither.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DedupResult {
    pub keep: Vec<Card>,
    pub delete: Vec<Card>,
    pub groups: Vec<Cluster>,
}

impl DedupResult {
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn delete_ids(&self) -> impl Iterator<Item = &str> {
        self.delete.iter().map(|card| card.id.as_str())
    }

    pub fn keep_ids(&self) -> impl Iterator<Item = &str> {
        self.keep.iter().map(|card| card.id.as_str())
    }
}
