//! # CRM Pipeline Core
//!
//! Domain logic for the sales pipeline kanban board of the CRM dashboard.
//!
//! This crate provides the pipeline and card types, the reordering engine
//! that keeps card positions consistent across drag-and-drop moves, and a
//! storage abstraction, without any dependency on a UI framework or a
//! particular database.

pub mod domain;
pub mod error;
pub mod service;
pub mod storage;

// Re-export commonly used types
pub use domain::{
    board::{Board, BoardConfig},
    card::{Card, CardId, ContactId},
    pipeline::{Pipeline, PipelineCreateRequest, PipelineId},
    reorder::{can_delete_pipeline, reorder, try_reorder, CardMove},
};
pub use error::{CrmError, Result};
pub use service::KanbanService;
pub use storage::Storage;
