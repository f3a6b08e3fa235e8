use crate::domain::card::Card;
use crate::domain::pipeline::PipelineId;
use serde::{Deserialize, Serialize};

/// Summary shown in a pipeline column header
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PipelineStats {
    pub count: usize,
    /// Sum of deal values in EUR
    pub total_value: f64,
    /// Mean closing probability in percent, 0 for an empty pipeline
    pub average_probability: f64,
}

impl PipelineStats {
    pub fn for_pipeline(cards: &[Card], pipeline_id: &PipelineId) -> Self {
        let owned: Vec<&Card> = cards
            .iter()
            .filter(|c| &c.pipeline_id == pipeline_id)
            .collect();

        if owned.is_empty() {
            return Self::default();
        }

        let count = owned.len();
        let total_value = owned.iter().map(|c| c.value).sum();
        let probability_sum: f64 = owned.iter().map(|c| f64::from(c.probability)).sum();

        Self {
            count,
            total_value,
            average_probability: probability_sum / count as f64,
        }
    }
}
