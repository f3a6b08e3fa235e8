//! Board operations backed by a [`Storage`] implementation.

use crate::{
    domain::{
        Board, Card, CardId, CardMove, DropResult, Pipeline, PipelineCreateRequest, PipelineId,
        PositionChange, Todo, TodoId,
    },
    error::Result,
    storage::Storage,
};
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Applies board mutations against storage, one at a time.
///
/// Every mutation loads a fresh snapshot, applies the change to a [`Board`]
/// and writes back only the entities that changed. Mutations are serialized,
/// so two drags arriving back to back never both start from the same
/// snapshot.
pub struct KanbanService<S: Storage> {
    storage: S,
    writes: Mutex<()>,
}

impl<S: Storage> KanbanService<S> {
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            writes: Mutex::new(()),
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub async fn initialize(&self) -> Result<()> {
        let _guard = self.writes.lock().await;
        self.storage.initialize().await
    }

    /// Loads the current board snapshot
    pub async fn load_board(&self) -> Result<Board> {
        let pipelines = self.storage.list_pipelines().await?;
        let cards = self.storage.list_cards().await?;
        let todos = self.storage.list_todos().await?;
        Board::new(pipelines, cards, todos)
    }

    pub async fn create_pipeline(&self, request: PipelineCreateRequest) -> Result<Pipeline> {
        let _guard = self.writes.lock().await;
        let mut board = self.load_board().await?;

        let pipeline = board.create_pipeline(request)?.clone();
        self.storage.create_pipeline(&pipeline).await?;

        info!(pipeline = %pipeline.id, name = %pipeline.name, "Pipeline created");
        Ok(pipeline)
    }

    /// Renames or recolors a pipeline
    pub async fn update_pipeline(
        &self,
        id: &PipelineId,
        request: &PipelineCreateRequest,
    ) -> Result<Pipeline> {
        let _guard = self.writes.lock().await;
        let mut board = self.load_board().await?;

        let pipeline = board.update_pipeline(id, request)?.clone();
        self.storage.update_pipeline(&pipeline).await?;

        info!(pipeline = %pipeline.id, name = %pipeline.name, "Pipeline updated");
        Ok(pipeline)
    }

    /// Deletes a pipeline that no longer owns any card
    pub async fn delete_pipeline(&self, id: &PipelineId) -> Result<Pipeline> {
        let _guard = self.writes.lock().await;
        let mut board = self.load_board().await?;

        let pipeline = board.delete_pipeline(id)?;
        self.storage.delete_pipeline(id).await?;

        info!(pipeline = %pipeline.id, name = %pipeline.name, "Pipeline deleted");
        Ok(pipeline)
    }

    /// Appends a card to the end of its pipeline
    pub async fn add_card(&self, card: Card) -> Result<Card> {
        let _guard = self.writes.lock().await;
        let mut board = self.load_board().await?;

        let card = board.add_card(card)?.clone();
        self.storage.create_card(&card).await?;

        debug!(card = %card.id, pipeline = %card.pipeline_id, position = card.position, "Card added");
        Ok(card)
    }

    /// Removes a card together with the to-dos only it referenced, and
    /// persists the compacted positions of its pipeline
    pub async fn remove_card(&self, id: &CardId) -> Result<Card> {
        let _guard = self.writes.lock().await;
        let mut board = self.load_board().await?;
        let before = board.cards().to_vec();
        let todos_before: Vec<TodoId> = board.todos().iter().map(|t| t.id.clone()).collect();

        let removed = board.remove_card(id)?;
        self.storage.delete_card(id).await?;

        for todo_id in todos_before.iter().filter(|t| board.todo(t).is_none()) {
            self.storage.delete_todo(todo_id).await?;
        }

        let changes = crate::domain::position_changes(&before, board.cards());
        self.persist(&board, &changes).await?;

        debug!(card = %removed.id, compacted = changes.len(), "Card removed");
        Ok(removed)
    }

    /// Moves a card and persists every card whose placement changed
    pub async fn move_card(&self, card_move: &CardMove) -> Result<Vec<PositionChange>> {
        let _guard = self.writes.lock().await;
        let mut board = self.load_board().await?;

        let changes = board.move_card(card_move)?;
        self.persist(&board, &changes).await?;

        if let Some(pipeline) = board.pipeline(&card_move.to_pipeline_id) {
            if !changes.is_empty() {
                info!(card = %card_move.card_id, pipeline = %pipeline.name, "Card moved");
            }
        }
        Ok(changes)
    }

    /// Handles a finished drag gesture; cancelled gestures never reach the board
    pub async fn handle_drop(&self, drop: &DropResult) -> Result<Vec<PositionChange>> {
        match drop.to_move() {
            Some(card_move) => self.move_card(&card_move).await,
            None => Ok(Vec::new()),
        }
    }

    /// Links a to-do to a card, storing it first if it is new
    pub async fn add_todo(&self, card_id: &CardId, todo: Todo) -> Result<()> {
        let _guard = self.writes.lock().await;
        let mut board = self.load_board().await?;

        let known = board.todo(&todo.id).is_some();
        board.add_todo(card_id, todo.clone())?;
        if !known {
            self.storage.create_todo(&todo).await?;
        }
        if let Some(card) = board.card(card_id) {
            self.storage.update_card(card).await?;
        }
        Ok(())
    }

    /// Saves an edited to-do
    pub async fn update_todo(&self, todo: Todo) -> Result<Todo> {
        let _guard = self.writes.lock().await;
        let mut board = self.load_board().await?;

        let todo = board.update_todo(todo)?.clone();
        self.storage.update_todo(&todo).await?;

        debug!(todo = %todo.id, status = %todo.status, "Todo updated");
        Ok(todo)
    }

    async fn persist(&self, board: &Board, changes: &[PositionChange]) -> Result<()> {
        for change in changes {
            if let Some(card) = board.card(&change.card_id) {
                self.storage.update_card(card).await?;
            }
        }
        Ok(())
    }
}
