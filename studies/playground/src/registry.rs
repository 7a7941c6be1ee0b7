//! Saved runs kept for side-by-side comparison. Session scoped, append only.

use chrono::{ DateTime, Utc };
use serde::{ Deserialize, Serialize };

use crate::controller::{ TrainingController, TrainingStatus };
use crate::error::{ PlaygroundError, PlaygroundResult };
use crate::metrics::Metrics;
use crate::params::Parameters;

pub const CURRENT_MODEL_NAME: &str = "Current Model";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelEntry {
    pub name: String,
    pub parameters: Parameters,
    pub metrics: Metrics,
    pub timestamp: DateTime<Utc>,
}

impl ModelEntry {
    pub fn is_current(&self) -> bool {
        self.name == CURRENT_MODEL_NAME
    }
}

#[derive(Debug, Default, Clone)]
pub struct ModelRegistry {
    entries: Vec<ModelEntry>,
}

impl ModelRegistry {
    pub fn new() -> ModelRegistry {
        ModelRegistry::default()
    }

    /// Snapshots the completed run held by `controller`.
    pub fn save(&mut self, controller: &TrainingController) -> PlaygroundResult<&ModelEntry> {
        let status = controller.status();
        if status != TrainingStatus::Complete {
            return Err(PlaygroundError::CannotSave { status });
        }

        let parameters = controller.run_parameters().clone();
        let name = format!(
            "Model {} ({} - {})",
            self.entries.len() + 1,
            parameters.model_type,
            parameters.dataset
        );
        tracing::info!(%name, "model saved for comparison");

        self.entries.push(ModelEntry {
            name,
            parameters,
            metrics: controller.state().metrics,
            timestamp: Utc::now(),
        });
        Ok(&self.entries[self.entries.len() - 1])
    }

    pub fn saved(&self) -> &[ModelEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Saved entries, preceded by the live run when it is complete.
    pub fn list(&self, controller: &TrainingController) -> Vec<ModelEntry> {
        let mut models = Vec::with_capacity(self.entries.len() + 1);
        if controller.status() == TrainingStatus::Complete {
            models.push(ModelEntry {
                name: CURRENT_MODEL_NAME.to_string(),
                parameters: controller.run_parameters().clone(),
                metrics: controller.state().metrics,
                timestamp: Utc::now(),
            });
        }
        models.extend(self.entries.iter().cloned());
        models
    }
}
