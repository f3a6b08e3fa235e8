//! Property-based tests for the reorder engine
//!
//! These tests verify, for arbitrary boards and moves:
//! - positions stay contiguous per pipeline
//! - every card survives exactly once
//! - in-place moves and unknown cards leave the snapshot untouched

use crm_pipeline_core::domain::reorder::{cards_in_pipeline, verify_invariants};
use crm_pipeline_core::{reorder, Card, CardId, CardMove, ContactId, PipelineId};
use proptest::prelude::*;
use std::collections::HashMap;
use std::str::FromStr;

fn pipeline_id(index: usize) -> PipelineId {
    PipelineId::from_str(&format!("P{}", index)).unwrap()
}

/// Builds a consistent card set from per-pipeline card counts
fn build_cards(counts: &[usize]) -> Vec<Card> {
    let mut cards = Vec::new();
    for (pipeline, count) in counts.iter().enumerate() {
        for position in 0..*count {
            let mut card = Card::new(
                ContactId::from_str("contact").unwrap(),
                pipeline_id(pipeline),
                position,
            );
            card.id = CardId::from_str(&format!("c{}-{}", pipeline, position)).unwrap();
            cards.push(card);
        }
    }
    cards
}

/// Strategy for a non-empty board plus a move of one of its cards
fn board_and_move() -> impl Strategy<Value = (Vec<Card>, CardMove)> {
    prop::collection::vec(0usize..6, 1..5)
        .prop_filter("board needs at least one card", |counts| {
            counts.iter().sum::<usize>() > 0
        })
        .prop_flat_map(|counts| {
            let total: usize = counts.iter().sum();
            let pipelines = counts.len();
            (Just(counts), 0..total, 0..pipelines, 0usize..10)
        })
        .prop_map(|(counts, card_index, target, to_index)| {
            let cards = build_cards(&counts);
            let moved = &cards[card_index];
            let card_move = CardMove {
                card_id: moved.id.clone(),
                from_pipeline_id: moved.pipeline_id.clone(),
                to_pipeline_id: pipeline_id(target),
                to_index,
            };
            (cards, card_move)
        })
}

proptest! {
    /// Positions of every pipeline are exactly 0..k after a move
    #[test]
    fn positions_stay_contiguous((cards, card_move) in board_and_move()) {
        let result = reorder(&cards, &card_move);
        prop_assert!(verify_invariants(&result).is_ok());
    }

    /// Every input card appears exactly once in the output
    #[test]
    fn cards_are_neither_lost_nor_duplicated((cards, card_move) in board_and_move()) {
        let result = reorder(&cards, &card_move);
        prop_assert_eq!(result.len(), cards.len());

        let mut seen: HashMap<&CardId, usize> = HashMap::new();
        for card in &result {
            *seen.entry(&card.id).or_default() += 1;
        }
        for card in &cards {
            prop_assert_eq!(seen.get(&card.id), Some(&1));
        }
    }

    /// The moved card lands at the clamped index of the target pipeline
    #[test]
    fn moved_card_lands_at_clamped_index((cards, card_move) in board_and_move()) {
        let result = reorder(&cards, &card_move);
        let target = cards_in_pipeline(&result, &card_move.to_pipeline_id);
        let expected_index = card_move.to_index.min(target.len() - 1);

        prop_assert_eq!(&target[expected_index].id, &card_move.card_id);
    }

    /// Moving a card onto its own slot returns the input unchanged
    #[test]
    fn in_place_move_is_noop((cards, card_move) in board_and_move()) {
        let current = cards.iter().find(|c| c.id == card_move.card_id).unwrap();
        let in_place = CardMove {
            to_pipeline_id: current.pipeline_id.clone(),
            to_index: current.position,
            ..card_move
        };

        prop_assert_eq!(reorder(&cards, &in_place), cards);
    }

    /// A move naming an unknown card returns the input unchanged
    #[test]
    fn unknown_card_is_noop((cards, card_move) in board_and_move()) {
        let unknown = CardMove {
            card_id: CardId::from_str("does-not-exist").unwrap(),
            ..card_move
        };

        prop_assert_eq!(reorder(&cards, &unknown), cards);
    }

    /// Cards of pipelines the move does not touch keep their placement
    #[test]
    fn unrelated_pipelines_untouched((cards, card_move) in board_and_move()) {
        let result = reorder(&cards, &card_move);

        for card in cards.iter().filter(|c| {
            c.pipeline_id != card_move.from_pipeline_id && c.pipeline_id != card_move.to_pipeline_id
        }) {
            let after = result.iter().find(|c| c.id == card.id).unwrap();
            prop_assert_eq!(after, card);
        }
    }
}
