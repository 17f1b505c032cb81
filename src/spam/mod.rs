/// # Spam Classifier Module
///
/// Trains and applies an LSTM spam/ham classifier for SMS messages.
///
/// ## Module Structure:
///
/// 1. **step_1_data_loader**: CSV loading and label parsing
/// 2. **step_2_train_test_split**: Seeded train/test partition
/// 3. **step_3_vectorizer**: Vocabulary fitting, encoding, padding and tensor building
/// 4. **step_4_lstm_cell**: LSTM layer returning every hidden state
/// 5. **step_5_model_arch**: Embedding, LSTM, max-pool over time, sigmoid output
/// 6. **step_6_train_model**: Training loop, evaluation and history
/// 7. **step_7_prediction**: Trained classifier bundle and `predict_spam`
/// 8. **step_8_model_serialization**: Saving and loading the bundle
///
use burn_autodiff::Autodiff;
use burn_ndarray::NdArray;

pub mod step_1_data_loader;
pub mod step_2_train_test_split;
pub mod step_3_vectorizer;
pub mod step_4_lstm_cell;
pub mod step_5_model_arch;
pub mod step_6_train_model;
pub mod step_7_prediction;
pub mod step_8_model_serialization;

/// Backend used for training
pub type TrainingBackend = Autodiff<NdArray<f32>>;
/// Backend used for inference on a trained classifier
pub type InferenceBackend = NdArray<f32>;
