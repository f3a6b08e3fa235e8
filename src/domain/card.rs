use crate::domain::pipeline::PipelineId;
use crate::domain::todo::TodoId;
use crate::error::{CrmError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

string_id!(
    /// Identifier of a kanban card
    CardId
);

string_id!(
    /// Foreign key into the contact store
    ContactId
);

/// A deal on the board: one contact, its to-dos, owned by exactly one pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub contact_id: ContactId,
    pub pipeline_id: PipelineId,
    /// Zero-based rank within the owning pipeline
    pub position: usize,
    /// Deal value in EUR
    #[serde(default)]
    pub value: f64,
    /// Closing probability in percent
    #[serde(default)]
    pub probability: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_close_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub todos: Vec<TodoId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Card {
    /// Creates a card at the given position. Use
    /// [`next_position`](crate::domain::reorder::next_position) to append.
    pub fn new(contact_id: ContactId, pipeline_id: PipelineId, position: usize) -> Self {
        let now = Utc::now();
        Self {
            id: CardId::generate(),
            contact_id,
            pipeline_id,
            position,
            value: 0.0,
            probability: 0,
            expected_close_date: None,
            notes: None,
            todos: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Sets the deal value; negative values are clamped to zero
    pub fn set_value(&mut self, value: f64) {
        self.value = if value.is_finite() { value.max(0.0) } else { 0.0 };
        self.updated_at = Utc::now();
    }

    pub fn set_probability(&mut self, probability: u8) -> Result<()> {
        if probability > 100 {
            return Err(CrmError::InvalidProbability(probability));
        }
        self.probability = probability;
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn set_expected_close_date(&mut self, date: Option<DateTime<Utc>>) {
        self.expected_close_date = date;
        self.updated_at = Utc::now();
    }

    pub fn set_notes(&mut self, notes: String) {
        self.notes = Some(notes);
        self.updated_at = Utc::now();
    }

    /// Links a to-do; linking twice is a no-op
    pub fn attach_todo(&mut self, todo_id: TodoId) {
        if !self.todos.contains(&todo_id) {
            self.todos.push(todo_id);
            self.updated_at = Utc::now();
        }
    }

    pub fn detach_todo(&mut self, todo_id: &TodoId) -> bool {
        let before = self.todos.len();
        self.todos.retain(|id| id != todo_id);
        let removed = self.todos.len() != before;
        if removed {
            self.updated_at = Utc::now();
        }
        removed
    }

    /// Probability-weighted deal value
    pub fn weighted_value(&self) -> f64 {
        self.value * f64::from(self.probability) / 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn card() -> Card {
        Card::new(
            ContactId::from_str("1").unwrap(),
            PipelineId::from_str("1").unwrap(),
            0,
        )
    }

    #[test]
    fn test_card_creation() {
        let card = card();
        assert_eq!(card.position, 0);
        assert_eq!(card.pipeline_id.as_str(), "1");
        assert!(card.todos.is_empty());
        assert_eq!(card.created_at, card.updated_at);
    }

    #[test]
    fn test_probability_bounds() {
        let mut card = card();
        assert!(card.set_probability(100).is_ok());
        assert!(matches!(
            card.set_probability(101),
            Err(CrmError::InvalidProbability(101))
        ));
        assert_eq!(card.probability, 100);
    }

    #[test]
    fn test_value_clamped() {
        let mut card = card();
        card.set_value(-50.0);
        assert_eq!(card.value, 0.0);
        card.set_value(f64::NAN);
        assert_eq!(card.value, 0.0);
        card.set_value(15000.0);
        assert_eq!(card.value, 15000.0);
    }

    #[test]
    fn test_weighted_value() {
        let mut card = card();
        card.set_value(75000.0);
        card.set_probability(60).unwrap();
        assert!((card.weighted_value() - 45000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_attach_and_detach_todo() {
        let mut card = card();
        let todo = TodoId::from_str("todo-1").unwrap();

        card.attach_todo(todo.clone());
        card.attach_todo(todo.clone());
        assert_eq!(card.todos.len(), 1);

        assert!(card.detach_todo(&todo));
        assert!(!card.detach_todo(&todo));
        assert!(card.todos.is_empty());
    }

    #[test]
    fn test_deserialization_defaults() {
        let json = r#"{
            "id": "card-1",
            "contact_id": "1",
            "pipeline_id": "1",
            "position": 0,
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        }"#;

        let card: Card = serde_json::from_str(json).unwrap();
        assert_eq!(card.id.as_str(), "card-1");
        assert_eq!(card.value, 0.0);
        assert!(card.todos.is_empty());
        assert!(card.notes.is_none());
    }
}
