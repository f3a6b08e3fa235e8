use crate::domain::card::CardId;
use crate::domain::pipeline::PipelineId;
use crate::domain::reorder::CardMove;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::debug;

/// One end of a drag gesture as reported by the board UI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DropLocation {
    pub droppable_id: String,
    /// Raw index from the UI, may be negative or fractional
    pub index: f64,
}

/// Result of a finished drag gesture
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DropResult {
    pub draggable_id: String,
    pub source: DropLocation,
    /// `None` when the gesture was cancelled
    #[serde(default)]
    pub destination: Option<DropLocation>,
}

impl DropResult {
    /// Maps the gesture to a move request.
    ///
    /// Returns `None` for cancelled gestures and for gestures carrying blank
    /// ids, neither of which should reach the reorder engine.
    pub fn to_move(&self) -> Option<CardMove> {
        let Some(destination) = &self.destination else {
            debug!(card = %self.draggable_id, "Drag cancelled");
            return None;
        };

        let parsed = (
            CardId::from_str(&self.draggable_id),
            PipelineId::from_str(&self.source.droppable_id),
            PipelineId::from_str(&destination.droppable_id),
        );
        match parsed {
            (Ok(card_id), Ok(from_pipeline_id), Ok(to_pipeline_id)) => Some(CardMove {
                card_id,
                from_pipeline_id,
                to_pipeline_id,
                to_index: normalize_index(destination.index),
            }),
            _ => {
                debug!(card = %self.draggable_id, "Drop carries blank ids");
                None
            }
        }
    }
}

/// Floors the index and maps negative or NaN values to zero
fn normalize_index(index: f64) -> usize {
    if index.is_nan() || index <= 0.0 {
        0
    } else {
        // Saturating float-to-int cast
        index.floor() as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gesture(destination: Option<(&str, f64)>) -> DropResult {
        DropResult {
            draggable_id: "card-1".to_string(),
            source: DropLocation {
                droppable_id: "1".to_string(),
                index: 0.0,
            },
            destination: destination.map(|(id, index)| DropLocation {
                droppable_id: id.to_string(),
                index,
            }),
        }
    }

    #[test]
    fn test_cancelled_drop_yields_no_move() {
        assert!(gesture(None).to_move().is_none());
    }

    #[test]
    fn test_drop_maps_to_move() {
        let card_move = gesture(Some(("2", 3.0))).to_move().unwrap();
        assert_eq!(card_move.card_id.as_str(), "card-1");
        assert_eq!(card_move.from_pipeline_id.as_str(), "1");
        assert_eq!(card_move.to_pipeline_id.as_str(), "2");
        assert_eq!(card_move.to_index, 3);
    }

    #[test]
    fn test_index_normalization() {
        assert_eq!(normalize_index(-4.0), 0);
        assert_eq!(normalize_index(f64::NAN), 0);
        assert_eq!(normalize_index(2.9), 2);
        assert_eq!(normalize_index(f64::INFINITY), usize::MAX);
    }

    #[test]
    fn test_blank_destination_rejected() {
        assert!(gesture(Some(("  ", 0.0))).to_move().is_none());
    }

    #[test]
    fn test_deserialize_ui_payload() {
        let json = r#"{
            "draggableId": "card-3",
            "source": { "droppableId": "1", "index": 1 },
            "destination": null
        }"#;

        let result: DropResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.draggable_id, "card-3");
        assert_eq!(result.source.index, 1.0);
        assert!(result.destination.is_none());
    }
}
