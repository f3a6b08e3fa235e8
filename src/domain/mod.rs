/// Declares an opaque string identifier.
///
/// Identifiers coming from storage or the UI are accepted as long as they
/// are non-blank and usable as a single file name; freshly created entities
/// get a v4 UUID. Deserialization applies the same check.
macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Generates a fresh random identifier
            pub fn generate() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }

            /// Returns the string representation
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::str::FromStr for $name {
            type Err = crate::error::CrmError;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                crate::domain::validate_id(s).map(|id| Self(id.to_string()))
            }
        }

        impl std::convert::TryFrom<String> for $name {
            type Error = crate::error::CrmError;

            fn try_from(s: String) -> std::result::Result<Self, Self::Error> {
                s.parse()
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> String {
                id.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

/// Trims an identifier and rejects blank ids and anything that is not a
/// single plain path component.
fn validate_id(s: &str) -> crate::error::Result<&str> {
    let trimmed = s.trim();
    let unsafe_path = trimmed.contains(['/', '\\', '\0']) || trimmed.contains("..");
    if trimmed.is_empty() || trimmed == "." || unsafe_path {
        return Err(crate::error::CrmError::InvalidId(s.to_string()));
    }
    Ok(trimmed)
}

pub mod board;
pub mod card;
pub mod drag;
pub mod pipeline;
pub mod reorder;
pub mod stats;
pub mod todo;

pub use board::{Board, BoardConfig, PipelineTemplate};
pub use card::{Card, CardId, ContactId};
pub use drag::{DropLocation, DropResult};
pub use pipeline::{Pipeline, PipelineCreateRequest, PipelineId};
pub use reorder::{
    can_delete_pipeline, cards_in_pipeline, next_position, position_changes, remove_card,
    reorder, reorder_at, try_reorder, try_reorder_at, verify_invariants, CardMove,
    PositionChange,
};
pub use stats::PipelineStats;
pub use todo::{Todo, TodoId, TodoPriority, TodoStatus};
