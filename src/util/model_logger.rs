use anyhow::Result;
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::constants::EXPERIMENT_FILE_NAME;
use crate::spam::step_6_train_model::{TrainingConfig, TrainingHistory};

/// Record of one training run, saved next to the model
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ModelExperiment {
    pub timestamp: String,
    pub dataset: String,
    pub config: TrainingConfig,
    pub vocabulary_size: usize,
    pub sequence_length: usize,
    pub train_loss: Option<f64>,
    pub train_accuracy: Option<f64>,
    pub val_loss: Option<f64>,
    pub val_accuracy: Option<f64>,
    pub training_time_seconds: Option<f64>,
    pub notes: String,
}

impl ModelExperiment {
    pub fn new(dataset: &str, config: &TrainingConfig, vocabulary_size: usize, sequence_length: usize) -> Self {
        Self {
            timestamp: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            dataset: dataset.to_string(),
            config: config.clone(),
            vocabulary_size,
            sequence_length,
            train_loss: None,
            train_accuracy: None,
            val_loss: None,
            val_accuracy: None,
            training_time_seconds: None,
            notes: String::new(),
        }
    }

    /// Copy the final epoch's metrics from the history
    pub fn set_final_metrics(&mut self, history: &TrainingHistory) {
        if let Some((train, val)) = history.last() {
            self.train_loss = Some(train.loss);
            self.train_accuracy = Some(train.accuracy);
            self.val_loss = Some(val.loss);
            self.val_accuracy = Some(val.accuracy);
        }
    }

    pub fn set_training_time(&mut self, seconds: f64) {
        self.training_time_seconds = Some(seconds);
    }

    pub fn add_note(&mut self, note: &str) {
        if !self.notes.is_empty() {
            self.notes.push('\n');
        }
        self.notes.push_str(note);
    }

    pub fn save(&self, experiment_dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(experiment_dir)?;
        let file_path = experiment_dir.join(EXPERIMENT_FILE_NAME);

        let json = serde_json::to_string_pretty(&self)?;
        let mut file = fs::File::create(&file_path)?;
        file.write_all(json.as_bytes())?;

        Ok(file_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spam::step_6_train_model::EpochMetrics;
    use tempfile::tempdir;

    #[test]
    fn test_experiment_save() -> Result<()> {
        let mut history = TrainingHistory::default();
        history.record(
            EpochMetrics { loss: 0.2, accuracy: 0.95 },
            EpochMetrics { loss: 0.25, accuracy: 0.93 },
        );

        let mut experiment = ModelExperiment::new("spam.csv", &TrainingConfig::default(), 7000, 189);
        experiment.set_final_metrics(&history);
        experiment.set_training_time(12.5);
        experiment.add_note("first run");
        experiment.add_note("seed 42");
        assert_eq!(experiment.notes, "first run\nseed 42");

        let dir = tempdir()?;
        let path = experiment.save(dir.path())?;
        let restored: ModelExperiment = serde_json::from_str(&fs::read_to_string(path)?)?;
        assert_eq!(restored, experiment);
        assert_eq!(restored.val_accuracy, Some(0.93));
        Ok(())
    }
}
