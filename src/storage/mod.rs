use crate::{
    domain::{BoardConfig, Card, CardId, Pipeline, PipelineId, Todo, TodoId},
    error::Result,
};
use async_trait::async_trait;

#[cfg(feature = "file-storage")]
pub mod file_storage;
pub mod memory;

#[cfg(feature = "file-storage")]
pub use file_storage::FileStorage;
pub use memory::InMemoryStorage;

/// Repository for pipelines, cards and to-dos.
///
/// Lookups of missing entities fail with the matching `*NotFound` error;
/// creating an entity whose id is taken fails with `StorageError`.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Creates the backing store and seeds the configured pipelines
    async fn initialize(&self) -> Result<()>;

    /// Checks if the board has been initialized
    async fn is_initialized(&self) -> bool;

    /// Loads the board configuration
    async fn load_config(&self) -> Result<BoardConfig>;

    async fn list_pipelines(&self) -> Result<Vec<Pipeline>>;

    async fn get_pipeline(&self, id: &PipelineId) -> Result<Pipeline>;

    async fn create_pipeline(&self, pipeline: &Pipeline) -> Result<()>;

    async fn update_pipeline(&self, pipeline: &Pipeline) -> Result<()>;

    async fn delete_pipeline(&self, id: &PipelineId) -> Result<()>;

    async fn list_cards(&self) -> Result<Vec<Card>>;

    async fn get_card(&self, id: &CardId) -> Result<Card>;

    async fn create_card(&self, card: &Card) -> Result<()>;

    async fn update_card(&self, card: &Card) -> Result<()>;

    async fn delete_card(&self, id: &CardId) -> Result<()>;

    async fn list_todos(&self) -> Result<Vec<Todo>>;

    async fn get_todo(&self, id: &TodoId) -> Result<Todo>;

    async fn create_todo(&self, todo: &Todo) -> Result<()>;

    async fn update_todo(&self, todo: &Todo) -> Result<()>;

    async fn delete_todo(&self, id: &TodoId) -> Result<()>;
}
