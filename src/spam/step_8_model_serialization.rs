use anyhow::{Context, Result};
use burn::module::Module;
use burn::record::{BinFileRecorder, FullPrecisionSettings};
use burn::tensor::backend::Backend;
use log::info;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use super::step_3_vectorizer::Vocabulary;
use super::step_5_model_arch::SpamLstm;
use super::step_7_prediction::TrainedClassifier;
use crate::build_info;
use crate::constants::{MODEL_FILE_NAME, VOCAB_FILE_NAME};
use crate::error::SpamError;

/// Everything needed to rebuild the model skeleton and preprocess input
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ModelMetadata {
    pub version: String,
    pub rustc_version: String,
    pub timestamp: u64,
    pub vocab_rows: usize,
    pub embedding_dim: usize,
    pub hidden_size: usize,
    pub sequence_length: usize,
    pub max_vocab_size: usize,
}

impl ModelMetadata {
    pub fn for_classifier<B: Backend>(classifier: &TrainedClassifier<B>) -> Self {
        let model = classifier.model();
        Self {
            version: build_info::PKG_VERSION.to_string(),
            rustc_version: build_info::RUSTC_VERSION.to_string(),
            timestamp: SystemTime::now()
                .duration_since(SystemTime::UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs(),
            vocab_rows: model.vocab_rows(),
            embedding_dim: model.embedding_dim(),
            hidden_size: model.hidden_size(),
            sequence_length: classifier.sequence_length(),
            max_vocab_size: classifier.vocabulary().max_words(),
        }
    }
}

fn model_base_path(dir: &Path) -> PathBuf {
    dir.join(MODEL_FILE_NAME)
}

/// Save a trained classifier into `dir`
///
/// Writes `model.bin` (burn binary record), `model.meta.json` and
/// `vocab.json`. Returns the directory.
pub fn save_classifier<B: Backend>(classifier: &TrainedClassifier<B>, dir: impl AsRef<Path>) -> Result<PathBuf> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir).context("Failed to create model directory")?;
    let base = model_base_path(dir);

    // Save model artifact
    let model_path = base.with_extension("bin");
    classifier
        .model()
        .clone()
        .save_file::<BinFileRecorder<FullPrecisionSettings>, _>(&model_path, &Default::default())
        .context("Failed to save model")?;

    // Save metadata
    let metadata = ModelMetadata::for_classifier(classifier);
    let metadata_json = serde_json::to_string_pretty(&metadata).context("Failed to serialize metadata")?;
    std::fs::write(base.with_extension("meta.json"), metadata_json).context("Failed to write metadata file")?;

    // Save vocabulary
    let vocab_json = serde_json::to_string(classifier.vocabulary()).context("Failed to serialize vocabulary")?;
    std::fs::write(dir.join(VOCAB_FILE_NAME), vocab_json).context("Failed to write vocabulary file")?;

    info!("Model saved successfully to: {}", dir.display());
    Ok(dir.to_path_buf())
}

/// Read the metadata written by [`save_classifier`]
pub fn load_metadata(dir: impl AsRef<Path>) -> Result<ModelMetadata> {
    let metadata_path = model_base_path(dir.as_ref()).with_extension("meta.json");
    let metadata_json = std::fs::read_to_string(&metadata_path).context("Failed to read metadata file")?;
    let metadata: ModelMetadata = serde_json::from_str(&metadata_json).context("Failed to parse metadata")?;
    Ok(metadata)
}

/// Load a classifier saved with [`save_classifier`]
///
/// Fails if the stored sequence width is zero or the vocabulary does not
/// match the stored embedding size.
pub fn load_classifier<B: Backend>(dir: impl AsRef<Path>, device: &B::Device) -> Result<TrainedClassifier<B>> {
    let dir = dir.as_ref();
    let metadata = load_metadata(dir)?;
    if metadata.sequence_length == 0 {
        return Err(SpamError::EmptySequences).context("Stored sequence width is zero");
    }

    let vocab_json = std::fs::read_to_string(dir.join(VOCAB_FILE_NAME)).context("Failed to read vocabulary file")?;
    let vocabulary: Vocabulary = serde_json::from_str(&vocab_json).context("Failed to parse vocabulary")?;
    if vocabulary.embedding_rows() != metadata.vocab_rows {
        return Err(SpamError::VocabularyMismatch {
            expected: metadata.vocab_rows,
            actual: vocabulary.embedding_rows(),
        }
        .into());
    }

    let model_path = model_base_path(dir).with_extension("bin");
    let skeleton = SpamLstm::<B>::new(metadata.vocab_rows, metadata.embedding_dim, metadata.hidden_size, device);
    let model = skeleton
        .load_file::<BinFileRecorder<FullPrecisionSettings>, _>(&model_path, &Default::default(), device)
        .context("Failed to load model")?;

    info!("Loaded model from: {}", dir.display());
    Ok(TrainedClassifier::new(model, vocabulary, metadata.sequence_length)?)
}

/// Check if a saved classifier exists and its metadata parses
pub fn verify_model(dir: impl AsRef<Path>) -> Result<bool> {
    let dir = dir.as_ref();
    let base = model_base_path(dir);
    if !base.with_extension("bin").exists()
        || !base.with_extension("meta.json").exists()
        || !dir.join(VOCAB_FILE_NAME).exists()
    {
        return Ok(false);
    }

    load_metadata(dir)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spam::step_7_prediction::predict_spam;
    use crate::util::test_utils::backend_rng_guard;
    use burn_ndarray::{NdArray, NdArrayDevice};
    use tempfile::tempdir;

    fn create_test_classifier(device: &NdArrayDevice) -> TrainedClassifier<NdArray> {
        let vocabulary = Vocabulary::fit(&["claim your free prize", "call me when home"], 100);
        let model = {
            let _guard = backend_rng_guard();
            SpamLstm::new(vocabulary.embedding_rows(), 6, 4, device)
        };
        TrainedClassifier::new(model, vocabulary, 7).unwrap()
    }

    #[test]
    fn test_classifier_serialization_round_trip() -> Result<()> {
        let temp_dir = tempdir()?;
        let device = NdArrayDevice::Cpu;
        let classifier = create_test_classifier(&device);

        save_classifier(&classifier, temp_dir.path())?;
        assert!(temp_dir.path().join("model.bin").exists());
        assert!(temp_dir.path().join("model.meta.json").exists());
        assert!(temp_dir.path().join("vocab.json").exists());
        assert!(verify_model(temp_dir.path())?);

        let loaded: TrainedClassifier<NdArray> = load_classifier(temp_dir.path(), &device)?;
        assert_eq!(loaded.sequence_length(), 7);
        assert_eq!(loaded.vocabulary(), classifier.vocabulary());
        assert_eq!(loaded.model().hidden_size(), 4);

        // Same weights, same probabilities
        let text = "claim your prize";
        let before = classifier.predict_probability(text, &device)?;
        let after = loaded.predict_probability(text, &device)?;
        assert!((before - after).abs() < 1e-6);
        assert_eq!(
            predict_spam(text, &classifier, &device)?,
            predict_spam(text, &loaded, &device)?
        );

        let metadata = load_metadata(temp_dir.path())?;
        assert_eq!(metadata.sequence_length, 7);
        assert_eq!(metadata.vocab_rows, classifier.vocabulary().embedding_rows());
        Ok(())
    }

    #[test]
    fn test_load_rejects_zero_sequence_width() -> Result<()> {
        let temp_dir = tempdir()?;
        let device = NdArrayDevice::Cpu;
        save_classifier(&create_test_classifier(&device), temp_dir.path())?;

        let mut metadata = load_metadata(temp_dir.path())?;
        metadata.sequence_length = 0;
        std::fs::write(
            temp_dir.path().join("model.meta.json"),
            serde_json::to_string(&metadata)?,
        )?;

        let result = load_classifier::<NdArray>(temp_dir.path(), &device);
        assert!(result.is_err());
        Ok(())
    }

    #[test]
    fn test_load_rejects_mismatched_vocabulary() -> Result<()> {
        let temp_dir = tempdir()?;
        let device = NdArrayDevice::Cpu;
        save_classifier(&create_test_classifier(&device), temp_dir.path())?;

        let other = Vocabulary::fit(&["just two"], 100);
        std::fs::write(temp_dir.path().join("vocab.json"), serde_json::to_string(&other)?)?;

        let err = load_classifier::<NdArray>(temp_dir.path(), &device).err().unwrap();
        assert!(matches!(
            err.downcast_ref::<SpamError>(),
            Some(SpamError::VocabularyMismatch { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_verify_missing_model() -> Result<()> {
        let temp_dir = tempdir()?;
        assert!(!verify_model(temp_dir.path())?);
        Ok(())
    }

    #[test]
    fn test_verify_incomplete_model_directory() -> Result<()> {
        let temp_dir = tempdir()?;
        let device = NdArrayDevice::Cpu;
        save_classifier(&create_test_classifier(&device), temp_dir.path())?;
        assert!(verify_model(temp_dir.path())?);

        std::fs::remove_file(temp_dir.path().join("vocab.json"))?;
        assert!(!verify_model(temp_dir.path())?);
        Ok(())
    }
}
