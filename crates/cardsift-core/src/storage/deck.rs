use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::error::{CardsiftError, Result};
use crate::models::Card;

/// Load a deck stored as a JSON array of cards.
pub fn load_deck(path: &Path) -> Result<Vec<Card>> {
    if !path.exists() {
        return Err(CardsiftError::DeckNotFound(path.display().to_string()));
    }
    let contents = fs::read_to_string(path)?;
    let cards: Vec<Card> = serde_json::from_str(&contents)?;
    Ok(cards)
}

/// Write a deck as a pretty-printed JSON array, creating parent directories.
pub fn save_deck(path: &Path, cards: &[Card]) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(cards)?;
    fs::write(path, json)?;
    Ok(())
}

/// Drop every card whose id is in `ids`, keeping the deck order.
/// Returns the remaining cards and how many were removed.
pub fn remove_cards<'a, I>(deck: Vec<Card>, ids: I) -> (Vec<Card>, usize)
where
    I: IntoIterator<Item = &'a str>,
{
    let doomed: HashSet<&str> = ids.into_iter().collect();
    let before = deck.len();
    let kept: Vec<Card> = deck
        .into_iter()
        .filter(|card| !doomed.contains(card.id.as_str()))
        .collect();
    let removed = before - kept.len();
    (kept, removed)
}
