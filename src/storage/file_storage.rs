use crate::{
    domain::{BoardConfig, Card, CardId, Pipeline, PipelineId, Todo, TodoId},
    error::{CrmError, Result},
    storage::Storage,
};
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

/// File-based storage implementation, one JSON file per entity
pub struct FileStorage {
    root_path: PathBuf,
    default_config: BoardConfig,
}

impl FileStorage {
    const CRM_DIR: &'static str = ".crm";
    const PIPELINES_DIR: &'static str = "pipelines";
    const CARDS_DIR: &'static str = "cards";
    const TODOS_DIR: &'static str = "todos";
    const CONFIG_FILE: &'static str = "config.json";

    /// Creates a new FileStorage instance for the given project root
    pub fn new(project_root: impl AsRef<Path>) -> Self {
        Self::with_config(project_root, BoardConfig::default())
    }

    /// Uses `config` when the board is initialized for the first time
    pub fn with_config(project_root: impl AsRef<Path>, config: BoardConfig) -> Self {
        Self {
            root_path: project_root.as_ref().join(Self::CRM_DIR),
            default_config: config,
        }
    }

    fn pipelines_dir(&self) -> PathBuf {
        self.root_path.join(Self::PIPELINES_DIR)
    }

    fn cards_dir(&self) -> PathBuf {
        self.root_path.join(Self::CARDS_DIR)
    }

    fn todos_dir(&self) -> PathBuf {
        self.root_path.join(Self::TODOS_DIR)
    }

    fn config_file(&self) -> PathBuf {
        self.root_path.join(Self::CONFIG_FILE)
    }

    async fn ensure_directory_exists(&self, path: &Path) -> Result<()> {
        if !path.exists() {
            fs::create_dir_all(path).await?;
        }
        Ok(())
    }
}

fn entity_file(dir: &Path, id: &str) -> PathBuf {
    dir.join(format!("{}.json", id))
}

async fn read_entity<T: DeserializeOwned>(
    path: &Path,
    not_found: impl FnOnce() -> CrmError,
) -> Result<T> {
    if !path.exists() {
        return Err(not_found());
    }
    let contents = fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&contents)?)
}

async fn write_entity<T: Serialize>(path: &Path, entity: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(entity)?;
    fs::write(path, json).await?;
    Ok(())
}

async fn create_entity<T: Serialize>(dir: &Path, id: &str, entity: &T) -> Result<()> {
    if !dir.exists() {
        fs::create_dir_all(dir).await?;
    }
    let path = entity_file(dir, id);
    if path.exists() {
        return Err(CrmError::StorageError(format!("{} already exists", id)));
    }
    write_entity(&path, entity).await
}

async fn update_entity<T: Serialize>(
    dir: &Path,
    id: &str,
    entity: &T,
    not_found: impl FnOnce() -> CrmError,
) -> Result<()> {
    let path = entity_file(dir, id);
    if !path.exists() {
        return Err(not_found());
    }
    write_entity(&path, entity).await
}

async fn delete_entity(dir: &Path, id: &str, not_found: impl FnOnce() -> CrmError) -> Result<()> {
    let path = entity_file(dir, id);
    if !path.exists() {
        return Err(not_found());
    }
    fs::remove_file(path).await?;
    Ok(())
}

/// Reads every `*.json` file of a directory, skipping unreadable ones
async fn list_entities<T: DeserializeOwned>(dir: &Path) -> Result<Vec<T>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut paths = Vec::new();
    let mut entries = fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) == Some("json") {
            paths.push(path);
        }
    }
    paths.sort();

    let mut entities = Vec::with_capacity(paths.len());
    for path in paths {
        let contents = fs::read_to_string(&path).await?;
        match serde_json::from_str(&contents) {
            Ok(entity) => entities.push(entity),
            Err(err) => warn!(path = %path.display(), "Skipping malformed entity: {}", err),
        }
    }
    Ok(entities)
}

#[async_trait]
impl Storage for FileStorage {
    async fn initialize(&self) -> Result<()> {
        self.ensure_directory_exists(&self.root_path).await?;
        self.ensure_directory_exists(&self.pipelines_dir()).await?;
        self.ensure_directory_exists(&self.cards_dir()).await?;
        self.ensure_directory_exists(&self.todos_dir()).await?;

        if self.config_file().exists() {
            return Ok(());
        }

        // Pipelines left behind by an interrupted run are kept as they are
        if self.list_pipelines().await?.is_empty() {
            for pipeline in self.default_config.build_pipelines()? {
                self.create_pipeline(&pipeline).await?;
            }
        }
        // Written last: its presence marks a completed initialization
        write_entity(&self.config_file(), &self.default_config).await?;
        debug!(root = %self.root_path.display(), "Initialized board storage");

        Ok(())
    }

    async fn is_initialized(&self) -> bool {
        self.root_path.exists() && self.config_file().exists()
    }

    async fn load_config(&self) -> Result<BoardConfig> {
        let config_file = self.config_file();

        if !config_file.exists() {
            return Err(CrmError::BoardNotInitialized);
        }

        let contents = fs::read_to_string(&config_file).await?;
        serde_json::from_str(&contents)
            .map_err(|err| CrmError::ConfigError(format!("{}: {}", config_file.display(), err)))
    }

    async fn list_pipelines(&self) -> Result<Vec<Pipeline>> {
        list_entities(&self.pipelines_dir()).await
    }

    async fn get_pipeline(&self, id: &PipelineId) -> Result<Pipeline> {
        let path = entity_file(&self.pipelines_dir(), id.as_str());
        read_entity(&path, || CrmError::PipelineNotFound(id.to_string())).await
    }

    async fn create_pipeline(&self, pipeline: &Pipeline) -> Result<()> {
        create_entity(&self.pipelines_dir(), pipeline.id.as_str(), pipeline).await
    }

    async fn update_pipeline(&self, pipeline: &Pipeline) -> Result<()> {
        update_entity(&self.pipelines_dir(), pipeline.id.as_str(), pipeline, || {
            CrmError::PipelineNotFound(pipeline.id.to_string())
        })
        .await
    }

    async fn delete_pipeline(&self, id: &PipelineId) -> Result<()> {
        delete_entity(&self.pipelines_dir(), id.as_str(), || {
            CrmError::PipelineNotFound(id.to_string())
        })
        .await
    }

    async fn list_cards(&self) -> Result<Vec<Card>> {
        list_entities(&self.cards_dir()).await
    }

    async fn get_card(&self, id: &CardId) -> Result<Card> {
        let path = entity_file(&self.cards_dir(), id.as_str());
        read_entity(&path, || CrmError::CardNotFound(id.to_string())).await
    }

    async fn create_card(&self, card: &Card) -> Result<()> {
        create_entity(&self.cards_dir(), card.id.as_str(), card).await
    }

    async fn update_card(&self, card: &Card) -> Result<()> {
        update_entity(&self.cards_dir(), card.id.as_str(), card, || {
            CrmError::CardNotFound(card.id.to_string())
        })
        .await
    }

    async fn delete_card(&self, id: &CardId) -> Result<()> {
        delete_entity(&self.cards_dir(), id.as_str(), || {
            CrmError::CardNotFound(id.to_string())
        })
        .await
    }

    async fn list_todos(&self) -> Result<Vec<Todo>> {
        list_entities(&self.todos_dir()).await
    }

    async fn get_todo(&self, id: &TodoId) -> Result<Todo> {
        let path = entity_file(&self.todos_dir(), id.as_str());
        read_entity(&path, || CrmError::TodoNotFound(id.to_string())).await
    }

    async fn create_todo(&self, todo: &Todo) -> Result<()> {
        create_entity(&self.todos_dir(), todo.id.as_str(), todo).await
    }

    async fn update_todo(&self, todo: &Todo) -> Result<()> {
        update_entity(&self.todos_dir(), todo.id.as_str(), todo, || {
            CrmError::TodoNotFound(todo.id.to_string())
        })
        .await
    }

    async fn delete_todo(&self, id: &TodoId) -> Result<()> {
        delete_entity(&self.todos_dir(), id.as_str(), || {
            CrmError::TodoNotFound(id.to_string())
        })
        .await
    }
}
