use crate::domain::card::{Card, CardId};
use crate::domain::drag::DropResult;
use crate::domain::pipeline::{Pipeline, PipelineCreateRequest, PipelineId};
use crate::domain::reorder::{self, CardMove, PositionChange};
use crate::domain::stats::PipelineStats;
use crate::domain::todo::{Todo, TodoId};
use crate::error::{CrmError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Name and color of a pipeline created on a fresh board
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineTemplate {
    pub name: String,
    pub color: String,
}

impl PipelineTemplate {
    pub fn new(name: &str, color: &str) -> Self {
        Self {
            name: name.to_string(),
            color: color.to_string(),
        }
    }
}

/// Board configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardConfig {
    pub name: String,
    pub pipelines: Vec<PipelineTemplate>,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            name: "Vertriebspipeline".to_string(),
            pipelines: vec![
                PipelineTemplate::new("Neue Leads", "#3b82f6"),
                PipelineTemplate::new("Qualifiziert", "#8b5cf6"),
                PipelineTemplate::new("Angebot erstellt", "#f59e0b"),
                PipelineTemplate::new("Verhandlung", "#ef4444"),
                PipelineTemplate::new("Abgeschlossen", "#22c55e"),
            ],
        }
    }
}

impl BoardConfig {
    /// Instantiates the configured pipelines with orders `0..n`
    pub fn build_pipelines(&self) -> Result<Vec<Pipeline>> {
        self.pipelines
            .iter()
            .zip(0u32..)
            .map(|(template, order)| {
                let request = PipelineCreateRequest::new(template.name.clone())
                    .with_color(template.color.clone());
                Pipeline::new(request, order)
            })
            .collect()
    }
}

/// Kanban board state.
///
/// All mutations keep card positions contiguous per pipeline and every card
/// owned by a pipeline that exists on the board.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "BoardSnapshot")]
pub struct Board {
    pipelines: Vec<Pipeline>,
    cards: Vec<Card>,
    todos: Vec<Todo>,
}

/// Unchecked wire form of a [`Board`]
#[derive(Deserialize)]
struct BoardSnapshot {
    pipelines: Vec<Pipeline>,
    cards: Vec<Card>,
    #[serde(default)]
    todos: Vec<Todo>,
}

impl TryFrom<BoardSnapshot> for Board {
    type Error = CrmError;

    fn try_from(snapshot: BoardSnapshot) -> Result<Self> {
        Board::new(snapshot.pipelines, snapshot.cards, snapshot.todos)
    }
}

impl Board {
    /// Assembles a board from stored entities, rejecting inconsistent data
    pub fn new(pipelines: Vec<Pipeline>, cards: Vec<Card>, todos: Vec<Todo>) -> Result<Self> {
        let known: HashSet<&PipelineId> = pipelines.iter().map(|p| &p.id).collect();
        if let Some(orphan) = cards.iter().find(|c| !known.contains(&c.pipeline_id)) {
            return Err(CrmError::InvariantViolation(format!(
                "card {} belongs to unknown pipeline {}",
                orphan.id, orphan.pipeline_id
            )));
        }
        reorder::verify_invariants(&cards)?;

        Ok(Self {
            pipelines,
            cards,
            todos,
        })
    }

    pub fn from_config(config: &BoardConfig) -> Result<Self> {
        Ok(Self {
            pipelines: config.build_pipelines()?,
            cards: Vec::new(),
            todos: Vec::new(),
        })
    }

    pub fn pipelines(&self) -> &[Pipeline] {
        &self.pipelines
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn todos(&self) -> &[Todo] {
        &self.todos
    }

    /// Pipelines in left-to-right column order
    pub fn pipelines_in_order(&self) -> Vec<&Pipeline> {
        let mut ordered: Vec<&Pipeline> = self.pipelines.iter().collect();
        ordered.sort_by_key(|p| p.order);
        ordered
    }

    pub fn pipeline(&self, id: &PipelineId) -> Option<&Pipeline> {
        self.pipelines.iter().find(|p| &p.id == id)
    }

    pub fn card(&self, id: &CardId) -> Option<&Card> {
        self.cards.iter().find(|c| &c.id == id)
    }

    /// Appends a new column to the right of the existing ones
    pub fn create_pipeline(&mut self, request: PipelineCreateRequest) -> Result<&Pipeline> {
        let order = self
            .pipelines
            .iter()
            .map(|p| p.order + 1)
            .max()
            .unwrap_or(0);
        let pipeline = Pipeline::new(request, order)?;
        self.pipelines.push(pipeline);
        Ok(&self.pipelines[self.pipelines.len() - 1])
    }

    /// Renames or recolors a pipeline
    pub fn update_pipeline(
        &mut self,
        id: &PipelineId,
        request: &PipelineCreateRequest,
    ) -> Result<&Pipeline> {
        let pipeline = self
            .pipelines
            .iter_mut()
            .find(|p| &p.id == id)
            .ok_or_else(|| CrmError::PipelineNotFound(id.to_string()))?;
        pipeline.update(request)?;
        Ok(pipeline)
    }

    /// Deletes an empty pipeline
    pub fn delete_pipeline(&mut self, id: &PipelineId) -> Result<Pipeline> {
        let index = self
            .pipelines
            .iter()
            .position(|p| &p.id == id)
            .ok_or_else(|| CrmError::PipelineNotFound(id.to_string()))?;

        if !reorder::can_delete_pipeline(id, &self.cards) {
            return Err(CrmError::PipelineNotEmpty {
                id: id.to_string(),
                cards: reorder::next_position(&self.cards, id),
            });
        }

        Ok(self.pipelines.remove(index))
    }

    /// Adds a card at the end of its pipeline, overriding its position
    pub fn add_card(&mut self, mut card: Card) -> Result<&Card> {
        self.require_pipeline(&card.pipeline_id)?;
        if self.card(&card.id).is_some() {
            return Err(CrmError::InvariantViolation(format!(
                "card {} already exists",
                card.id
            )));
        }

        card.position = reorder::next_position(&self.cards, &card.pipeline_id);
        self.cards.push(card);
        Ok(&self.cards[self.cards.len() - 1])
    }

    /// Removes a card, compacting its former pipeline.
    ///
    /// To-dos linked only to this card are dropped with it; to-dos shared
    /// with another card stay.
    pub fn remove_card(&mut self, id: &CardId) -> Result<Card> {
        let removed = self
            .card(id)
            .cloned()
            .ok_or_else(|| CrmError::CardNotFound(id.to_string()))?;
        self.cards = reorder::remove_card(&self.cards, id)?;

        let cards = &self.cards;
        self.todos.retain(|todo| {
            !removed.todos.contains(&todo.id) || cards.iter().any(|c| c.todos.contains(&todo.id))
        });
        Ok(removed)
    }

    /// Applies a move and returns the placements that changed.
    ///
    /// An unknown card leaves the board untouched and yields no changes; an
    /// unknown destination pipeline is an error.
    pub fn move_card(&mut self, card_move: &CardMove) -> Result<Vec<PositionChange>> {
        self.require_pipeline(&card_move.to_pipeline_id)?;

        let reordered = reorder::reorder(&self.cards, card_move);
        let changes = reorder::position_changes(&self.cards, &reordered);
        if !changes.is_empty() {
            self.cards = reordered;
        }
        Ok(changes)
    }

    /// Applies a finished drag gesture; cancelled gestures change nothing
    pub fn apply_drop(&mut self, drop: &DropResult) -> Result<Vec<PositionChange>> {
        match drop.to_move() {
            Some(card_move) => self.move_card(&card_move),
            None => Ok(Vec::new()),
        }
    }

    pub fn cards_for_pipeline(&self, id: &PipelineId) -> Vec<&Card> {
        reorder::cards_in_pipeline(&self.cards, id)
    }

    pub fn stats_for_pipeline(&self, id: &PipelineId) -> PipelineStats {
        PipelineStats::for_pipeline(&self.cards, id)
    }

    /// Registers a to-do and links it to a card. A to-do already on the
    /// board is only linked.
    pub fn add_todo(&mut self, card_id: &CardId, todo: Todo) -> Result<()> {
        let known = self.todo(&todo.id).is_some();
        let card = self
            .cards
            .iter_mut()
            .find(|c| &c.id == card_id)
            .ok_or_else(|| CrmError::CardNotFound(card_id.to_string()))?;
        card.attach_todo(todo.id.clone());
        if !known {
            self.todos.push(todo);
        }
        Ok(())
    }

    pub fn todo(&self, id: &TodoId) -> Option<&Todo> {
        self.todos.iter().find(|t| &t.id == id)
    }

    /// Replaces a stored to-do, stamping it as modified
    pub fn update_todo(&mut self, mut todo: Todo) -> Result<&Todo> {
        let slot = self
            .todos
            .iter_mut()
            .find(|t| t.id == todo.id)
            .ok_or_else(|| CrmError::TodoNotFound(todo.id.to_string()))?;
        todo.created_at = slot.created_at;
        todo.updated_at = chrono::Utc::now();
        *slot = todo;
        Ok(slot)
    }

    pub fn todos_for_card(&self, card: &Card) -> Vec<&Todo> {
        self.todos
            .iter()
            .filter(|t| card.todos.contains(&t.id))
            .collect()
    }

    pub fn open_todos_for_card(&self, card: &Card) -> Vec<&Todo> {
        self.todos_for_card(card)
            .into_iter()
            .filter(|t| t.is_open())
            .collect()
    }

    fn require_pipeline(&self, id: &PipelineId) -> Result<()> {
        match self.pipeline(id) {
            Some(_) => Ok(()),
            None => Err(CrmError::PipelineNotFound(id.to_string())),
        }
    }
}
