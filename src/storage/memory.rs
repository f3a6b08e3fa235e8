use crate::{
    domain::{BoardConfig, Card, CardId, Pipeline, PipelineId, Todo, TodoId},
    error::{CrmError, Result},
    storage::Storage,
};
use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

/// Rows of one entity type keyed by id
struct Table<T> {
    rows: BTreeMap<String, T>,
    not_found: fn(String) -> CrmError,
}

impl<T: Clone> Table<T> {
    fn new(not_found: fn(String) -> CrmError) -> Self {
        Self {
            rows: BTreeMap::new(),
            not_found,
        }
    }

    fn list(&self) -> Vec<T> {
        self.rows.values().cloned().collect()
    }

    fn get(&self, id: &str) -> Result<T> {
        self.rows
            .get(id)
            .cloned()
            .ok_or_else(|| (self.not_found)(id.to_string()))
    }

    fn create(&mut self, id: &str, row: &T) -> Result<()> {
        if self.rows.contains_key(id) {
            return Err(CrmError::StorageError(format!("{} already exists", id)));
        }
        self.rows.insert(id.to_string(), row.clone());
        Ok(())
    }

    fn update(&mut self, id: &str, row: &T) -> Result<()> {
        match self.rows.get_mut(id) {
            Some(existing) => {
                *existing = row.clone();
                Ok(())
            }
            None => Err((self.not_found)(id.to_string())),
        }
    }

    fn delete(&mut self, id: &str) -> Result<()> {
        self.rows
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| (self.not_found)(id.to_string()))
    }
}

struct State {
    initialized: bool,
    pipelines: Table<Pipeline>,
    cards: Table<Card>,
    todos: Table<Todo>,
}

/// Volatile storage for tests and demo boards
pub struct InMemoryStorage {
    config: BoardConfig,
    state: RwLock<State>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::with_config(BoardConfig::default())
    }

    pub fn with_config(config: BoardConfig) -> Self {
        Self {
            config,
            state: RwLock::new(State {
                initialized: false,
                pipelines: Table::new(CrmError::PipelineNotFound),
                cards: Table::new(CrmError::CardNotFound),
                todos: Table::new(CrmError::TodoNotFound),
            }),
        }
    }
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn initialize(&self) -> Result<()> {
        let mut state = self.state.write().await;
        if state.initialized {
            return Ok(());
        }

        for pipeline in self.config.build_pipelines()? {
            state.pipelines.create(pipeline.id.as_str(), &pipeline)?;
        }
        state.initialized = true;
        Ok(())
    }

    async fn is_initialized(&self) -> bool {
        self.state.read().await.initialized
    }

    async fn load_config(&self) -> Result<BoardConfig> {
        Ok(self.config.clone())
    }

    async fn list_pipelines(&self) -> Result<Vec<Pipeline>> {
        Ok(self.state.read().await.pipelines.list())
    }

    async fn get_pipeline(&self, id: &PipelineId) -> Result<Pipeline> {
        self.state.read().await.pipelines.get(id.as_str())
    }

    async fn create_pipeline(&self, pipeline: &Pipeline) -> Result<()> {
        let mut state = self.state.write().await;
        state.pipelines.create(pipeline.id.as_str(), pipeline)
    }

    async fn update_pipeline(&self, pipeline: &Pipeline) -> Result<()> {
        let mut state = self.state.write().await;
        state.pipelines.update(pipeline.id.as_str(), pipeline)
    }

    async fn delete_pipeline(&self, id: &PipelineId) -> Result<()> {
        self.state.write().await.pipelines.delete(id.as_str())
    }

    async fn list_cards(&self) -> Result<Vec<Card>> {
        Ok(self.state.read().await.cards.list())
    }

    async fn get_card(&self, id: &CardId) -> Result<Card> {
        self.state.read().await.cards.get(id.as_str())
    }

    async fn create_card(&self, card: &Card) -> Result<()> {
        let mut state = self.state.write().await;
        state.cards.create(card.id.as_str(), card)
    }

    async fn update_card(&self, card: &Card) -> Result<()> {
        let mut state = self.state.write().await;
        state.cards.update(card.id.as_str(), card)
    }

    async fn delete_card(&self, id: &CardId) -> Result<()> {
        self.state.write().await.cards.delete(id.as_str())
    }

    async fn list_todos(&self) -> Result<Vec<Todo>> {
        Ok(self.state.read().await.todos.list())
    }

    async fn get_todo(&self, id: &TodoId) -> Result<Todo> {
        self.state.read().await.todos.get(id.as_str())
    }

    async fn create_todo(&self, todo: &Todo) -> Result<()> {
        let mut state = self.state.write().await;
        state.todos.create(todo.id.as_str(), todo)
    }

    async fn update_todo(&self, todo: &Todo) -> Result<()> {
        let mut state = self.state.write().await;
        state.todos.update(todo.id.as_str(), todo)
    }

    async fn delete_todo(&self, id: &TodoId) -> Result<()> {
        self.state.write().await.todos.delete(id.as_str())
    }
}
