//! Card placement across pipelines.
//!
//! Every function here is pure: it takes a snapshot of the card set and
//! returns a full replacement. Two invariants hold for every output:
//!
//! * positions of the cards owned by a pipeline are exactly `0..k`
//! * every card id appears exactly once, owned by exactly one pipeline
//!
//! Callers must apply one result before computing the next, since each call
//! replaces the whole snapshot.

use crate::domain::card::{Card, CardId};
use crate::domain::pipeline::PipelineId;
use crate::error::{CrmError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, warn};

/// Request to relocate a card, free of any drag-and-drop vocabulary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardMove {
    pub card_id: CardId,
    pub from_pipeline_id: PipelineId,
    pub to_pipeline_id: PipelineId,
    /// Clamped to the destination length, so an oversized index appends
    pub to_index: usize,
}

/// A card whose placement differs between two snapshots
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionChange {
    pub card_id: CardId,
    pub pipeline_id: PipelineId,
    pub position: usize,
}

/// Moves a card, returning the input unchanged if the card is unknown.
pub fn reorder(cards: &[Card], card_move: &CardMove) -> Vec<Card> {
    reorder_at(cards, card_move, Utc::now())
}

/// Like [`reorder`], stamping the moved card with `now`.
pub fn reorder_at(cards: &[Card], card_move: &CardMove, now: DateTime<Utc>) -> Vec<Card> {
    match try_reorder_at(cards, card_move, now) {
        Ok(reordered) => reordered,
        Err(err) => {
            warn!(card = %card_move.card_id, "Ignoring move: {}", err);
            cards.to_vec()
        }
    }
}

/// Moves a card, reporting an unknown card id as [`CrmError::CardNotFound`].
pub fn try_reorder(cards: &[Card], card_move: &CardMove) -> Result<Vec<Card>> {
    try_reorder_at(cards, card_move, Utc::now())
}

/// Moves a card and stamps it with `now`.
///
/// The card's current owner is authoritative for the source pipeline;
/// `from_pipeline_id` is only checked for consistency. The destination
/// pipeline is not validated against the board.
pub fn try_reorder_at(
    cards: &[Card],
    card_move: &CardMove,
    now: DateTime<Utc>,
) -> Result<Vec<Card>> {
    let moved = cards
        .iter()
        .find(|c| c.id == card_move.card_id)
        .ok_or_else(|| CrmError::CardNotFound(card_move.card_id.to_string()))?;

    let source_id = &moved.pipeline_id;
    let target_id = &card_move.to_pipeline_id;
    if source_id != &card_move.from_pipeline_id {
        debug!(
            card = %moved.id,
            reported = %card_move.from_pipeline_id,
            actual = %source_id,
            "Move reports a stale source pipeline"
        );
    }
    let same_pipeline = source_id == target_id;

    let mut untouched = Vec::new();
    let mut source = Vec::new();
    let mut destination = Vec::new();
    for card in cards.iter().filter(|c| c.id != moved.id) {
        if &card.pipeline_id == source_id {
            source.push(card.clone());
        } else if &card.pipeline_id == target_id {
            destination.push(card.clone());
        } else {
            untouched.push(card.clone());
        }
    }
    sort_by_position(&mut source);
    sort_by_position(&mut destination);

    let (mut target_list, remaining_source) = if same_pipeline {
        (source, Vec::new())
    } else {
        renumber(&mut source);
        (destination, source)
    };

    let target_index = card_move.to_index.min(target_list.len());
    if same_pipeline && current_rank(cards, moved) == target_index {
        debug!(card = %moved.id, index = target_index, "Move leaves card in place");
        return Ok(cards.to_vec());
    }

    let mut moved = moved.clone();
    moved.pipeline_id = target_id.clone();
    moved.updated_at = now;

    target_list.insert(target_index, moved);
    renumber(&mut target_list);
    let moved = target_list.remove(target_index);

    debug!(
        card = %moved.id,
        from = %source_id,
        to = %target_id,
        position = moved.position,
        "Card moved"
    );

    let mut result = untouched;
    result.reserve(remaining_source.len() + target_list.len() + 1);
    result.extend(remaining_source);
    result.extend(target_list);
    result.push(moved);
    Ok(result)
}

/// Whether a pipeline owns no cards and may therefore be deleted
pub fn can_delete_pipeline(pipeline_id: &PipelineId, cards: &[Card]) -> bool {
    !cards.iter().any(|c| &c.pipeline_id == pipeline_id)
}

/// Position a newly created card takes in `pipeline_id` (append at end)
pub fn next_position(cards: &[Card], pipeline_id: &PipelineId) -> usize {
    cards.iter().filter(|c| &c.pipeline_id == pipeline_id).count()
}

/// Cards owned by a pipeline, in display order
pub fn cards_in_pipeline<'a>(cards: &'a [Card], pipeline_id: &PipelineId) -> Vec<&'a Card> {
    let mut owned: Vec<&Card> = cards
        .iter()
        .filter(|c| &c.pipeline_id == pipeline_id)
        .collect();
    owned.sort_by_key(|c| c.position);
    owned
}

/// Removes a card and compacts the positions left behind in its pipeline.
pub fn remove_card(cards: &[Card], card_id: &CardId) -> Result<Vec<Card>> {
    let removed = cards
        .iter()
        .find(|c| &c.id == card_id)
        .ok_or_else(|| CrmError::CardNotFound(card_id.to_string()))?;

    let (mut owner, mut result): (Vec<Card>, Vec<Card>) = cards
        .iter()
        .filter(|c| &c.id != card_id)
        .cloned()
        .partition(|c| c.pipeline_id == removed.pipeline_id);

    sort_by_position(&mut owner);
    renumber(&mut owner);
    result.extend(owner);
    Ok(result)
}

/// Checks position contiguity per pipeline and uniqueness of card ids.
pub fn verify_invariants(cards: &[Card]) -> Result<()> {
    let mut seen = HashSet::with_capacity(cards.len());
    let mut positions: BTreeMap<&PipelineId, Vec<usize>> = BTreeMap::new();

    for card in cards {
        if !seen.insert(&card.id) {
            return Err(CrmError::InvariantViolation(format!(
                "card {} appears more than once",
                card.id
            )));
        }
        positions.entry(&card.pipeline_id).or_default().push(card.position);
    }

    for (pipeline_id, mut owned) in positions {
        owned.sort_unstable();
        if let Some((expected, found)) = owned
            .iter()
            .enumerate()
            .find(|(expected, found)| expected != *found)
        {
            return Err(CrmError::InvariantViolation(format!(
                "pipeline {} has position {} where {} was expected",
                pipeline_id, found, expected
            )));
        }
    }

    Ok(())
}

/// Cards of `after` whose pipeline or position differ from `before`.
///
/// Cards that only exist in `after` count as changed.
pub fn position_changes(before: &[Card], after: &[Card]) -> Vec<PositionChange> {
    let previous: HashMap<&CardId, (&PipelineId, usize)> = before
        .iter()
        .map(|c| (&c.id, (&c.pipeline_id, c.position)))
        .collect();

    after
        .iter()
        .filter(|c| previous.get(&c.id) != Some(&(&c.pipeline_id, c.position)))
        .map(|c| PositionChange {
            card_id: c.id.clone(),
            pipeline_id: c.pipeline_id.clone(),
            position: c.position,
        })
        .collect()
}

/// Rank of `card` within its pipeline's display order
fn current_rank(cards: &[Card], card: &Card) -> usize {
    cards_in_pipeline(cards, &card.pipeline_id)
        .iter()
        .position(|c| c.id == card.id)
        .unwrap_or(0)
}

// Stable, so cards sharing a position keep their snapshot order
fn sort_by_position(cards: &mut [Card]) {
    cards.sort_by_key(|c| c.position);
}

fn renumber(cards: &mut [Card]) {
    for (index, card) in cards.iter_mut().enumerate() {
        card.position = index;
    }
}
