use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

string_id!(
    /// Identifier of a to-do item
    TodoId
);

/// Progress of a to-do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TodoStatus {
    Open,
    InProgress,
    Completed,
}

impl fmt::Display for TodoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "Offen"),
            Self::InProgress => write!(f, "In Bearbeitung"),
            Self::Completed => write!(f, "Erledigt"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TodoPriority {
    Low,
    Medium,
    High,
}

impl fmt::Display for TodoPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "Niedrig"),
            Self::Medium => write!(f, "Mittel"),
            Self::High => write!(f, "Hoch"),
        }
    }
}

/// A to-do attached to one or more cards
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Todo {
    pub id: TodoId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: TodoStatus,
    pub priority: TodoPriority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Todo {
    pub fn new(title: String, priority: TodoPriority) -> Self {
        let now = Utc::now();
        Self {
            id: TodoId::generate(),
            title,
            description: None,
            status: TodoStatus::Open,
            priority,
            due_date: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_due_date(mut self, due_date: DateTime<Utc>) -> Self {
        self.due_date = Some(due_date);
        self
    }

    pub fn set_status(&mut self, status: TodoStatus) {
        self.status = status;
        self.updated_at = Utc::now();
    }

    pub fn is_open(&self) -> bool {
        self.status == TodoStatus::Open
    }

    /// Open and past its due date
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.status != TodoStatus::Completed && self.due_date.is_some_and(|due| due < now)
    }
}
