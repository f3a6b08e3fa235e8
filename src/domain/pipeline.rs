use crate::error::{CrmError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

string_id!(
    /// Identifier of a pipeline column
    PipelineId
);

/// A named sales stage, rendered as one kanban column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pipeline {
    pub id: PipelineId,
    pub name: String,
    pub color: String,
    /// Left-to-right column order, unique per board
    pub order: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Pipeline {
    pub const DEFAULT_COLOR: &'static str = "#3b82f6";

    /// Creates a pipeline from a validated request
    pub fn new(request: PipelineCreateRequest, order: u32) -> Result<Self> {
        let (name, color) = request.validate()?;
        let now = Utc::now();
        Ok(Self {
            id: PipelineId::generate(),
            name,
            color,
            order,
            created_at: now,
            updated_at: now,
        })
    }

    /// Applies a new name and color, leaving the pipeline untouched if
    /// either is invalid
    pub fn update(&mut self, request: &PipelineCreateRequest) -> Result<()> {
        let (name, color) = request.validate()?;
        self.name = name;
        self.color = color;
        self.updated_at = Utc::now();
        Ok(())
    }
}

/// Name and color of a column, used to create or edit it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineCreateRequest {
    pub name: String,
    #[serde(default = "default_color")]
    pub color: String,
}

impl PipelineCreateRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: default_color(),
        }
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    /// Returns the trimmed name and normalized color
    fn validate(&self) -> Result<(String, String)> {
        Ok((validate_name(&self.name)?, validate_color(&self.color)?))
    }
}

fn default_color() -> String {
    Pipeline::DEFAULT_COLOR.to_string()
}

fn validate_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CrmError::InvalidPipelineName(name.to_string()));
    }
    Ok(trimmed.to_string())
}

fn validate_color(color: &str) -> Result<String> {
    let hex = color
        .strip_prefix('#')
        .filter(|h| h.len() == 6 && h.chars().all(|c| c.is_ascii_hexdigit()));

    match hex {
        Some(hex) => Ok(format!("#{}", hex.to_ascii_lowercase())),
        None => Err(CrmError::InvalidColor(color.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_pipeline_creation() {
        let request = PipelineCreateRequest::new("  Neue Leads ").with_color("#3B82F6");
        let pipeline = Pipeline::new(request, 3).unwrap();

        assert_eq!(pipeline.name, "Neue Leads");
        assert_eq!(pipeline.color, "#3b82f6");
        assert_eq!(pipeline.order, 3);
        assert_eq!(pipeline.created_at, pipeline.updated_at);
    }

    #[test]
    fn test_blank_name_rejected() {
        let result = Pipeline::new(PipelineCreateRequest::new("   "), 0);
        assert!(matches!(result, Err(CrmError::InvalidPipelineName(_))));
    }

    #[test]
    fn test_invalid_colors_rejected() {
        for color in ["3b82f6", "#3b82f", "#zzzzzz", "#3b82f6ff", ""] {
            let request = PipelineCreateRequest::new("Test").with_color(color);
            assert!(
                matches!(Pipeline::new(request, 0), Err(CrmError::InvalidColor(_))),
                "color {color:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_request_defaults_color_when_missing() {
        let request: PipelineCreateRequest =
            serde_json::from_str(r#"{"name": "Verhandlung"}"#).unwrap();
        assert_eq!(request.color, Pipeline::DEFAULT_COLOR);
    }

    #[test]
    fn test_update_bumps_timestamp() {
        let mut pipeline = Pipeline::new(PipelineCreateRequest::new("Alt"), 0).unwrap();
        let before = pipeline.updated_at;

        std::thread::sleep(std::time::Duration::from_millis(10));
        pipeline
            .update(&PipelineCreateRequest::new("Neu").with_color("#22C55E"))
            .unwrap();

        assert_eq!(pipeline.name, "Neu");
        assert_eq!(pipeline.color, "#22c55e");
        assert!(pipeline.updated_at > before);
    }

    #[test]
    fn test_invalid_update_changes_nothing() {
        let mut pipeline = Pipeline::new(PipelineCreateRequest::new("Alt"), 0).unwrap();
        let original = pipeline.clone();

        assert!(pipeline.update(&PipelineCreateRequest::new("")).is_err());
        assert!(pipeline
            .update(&PipelineCreateRequest::new("Neu").with_color("red"))
            .is_err());
        assert_eq!(pipeline, original);
    }

    #[test]
    fn test_pipeline_id_parsing() {
        let id = PipelineId::from_str(" 1 ").unwrap();
        assert_eq!(id.as_str(), "1");
        assert!(PipelineId::from_str("").is_err());
        assert!(PipelineId::from_str("   ").is_err());
    }
}
