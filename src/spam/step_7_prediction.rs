// External imports
use burn::tensor::backend::Backend;
use log::debug;
use ndarray::Array2;

// Internal imports
use super::step_1_data_loader::Label;
use super::step_3_vectorizer::{pad_sequences, sequences_tensor, tensor_values, Vocabulary};
use super::step_5_model_arch::SpamLstm;
use crate::constants::SPAM_THRESHOLD;
use crate::error::{SpamError, SpamResult};

impl Label {
    /// Classify a spam probability. The threshold is inclusive, so exactly
    /// 0.5 is spam; NaN is ham.
    pub fn from_probability(probability: f64) -> Self {
        if probability >= SPAM_THRESHOLD {
            Label::Spam
        } else {
            Label::Ham
        }
    }
}

/// A trained model together with the vocabulary and sequence width it was
/// trained on. Immutable once built.
#[derive(Debug, Clone)]
pub struct TrainedClassifier<B: Backend> {
    model: SpamLstm<B>,
    vocabulary: Vocabulary,
    sequence_length: usize,
}

impl<B: Backend> TrainedClassifier<B> {
    /// Bundle a model with its preprocessing state
    ///
    /// Fails when the vocabulary does not match the model's embedding table
    /// or when the sequence width is zero.
    pub fn new(model: SpamLstm<B>, vocabulary: Vocabulary, sequence_length: usize) -> SpamResult<Self> {
        if model.vocab_rows() != vocabulary.embedding_rows() {
            return Err(SpamError::VocabularyMismatch {
                expected: model.vocab_rows(),
                actual: vocabulary.embedding_rows(),
            });
        }
        if sequence_length == 0 {
            return Err(SpamError::EmptySequences);
        }
        Ok(Self {
            model,
            vocabulary,
            sequence_length,
        })
    }

    pub fn model(&self) -> &SpamLstm<B> {
        &self.model
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn sequence_length(&self) -> usize {
        self.sequence_length
    }

    /// Tokenize and pad texts to the trained sequence width
    pub fn encode_texts<S: AsRef<str> + Sync>(&self, texts: &[S]) -> Array2<i64> {
        let sequences = self.vocabulary.texts_to_sequences(texts);
        pad_sequences(&sequences, self.sequence_length)
    }

    /// Spam probabilities for already padded sequences
    ///
    /// Fails fast if the matrix width differs from the trained width.
    pub fn predict_probabilities(&self, sequences: &Array2<i64>, device: &B::Device) -> SpamResult<Vec<f32>> {
        let (rows, width) = sequences.dim();
        if width != self.sequence_length {
            return Err(SpamError::SequenceWidthMismatch {
                expected: self.sequence_length,
                actual: width,
            });
        }
        if rows == 0 {
            return Ok(Vec::new());
        }

        let flat: Vec<i64> = sequences.iter().copied().collect();
        let inputs = sequences_tensor::<B>(flat, rows, width, device);
        tensor_values(self.model.forward(inputs))
    }

    /// Spam probability for one raw text
    pub fn predict_probability(&self, text: &str, device: &B::Device) -> SpamResult<f64> {
        let padded = self.encode_texts(&[text]);
        let probs = self.predict_probabilities(&padded, device)?;
        let probability = probs
            .first()
            .copied()
            .ok_or_else(|| SpamError::TensorData("model returned no prediction".to_string()))?;
        debug!("Spam probability {:.4} for {:?}", probability, text);
        Ok(probability as f64)
    }
}

/// Classify one raw text as spam or ham
///
/// The text goes through the same tokenize, pad and forward pipeline used in
/// training; out-of-vocabulary tokens are dropped.
pub fn predict_spam<B: Backend>(text: &str, classifier: &TrainedClassifier<B>, device: &B::Device) -> SpamResult<Label> {
    let probability = classifier.predict_probability(text, device)?;
    Ok(Label::from_probability(probability))
}
