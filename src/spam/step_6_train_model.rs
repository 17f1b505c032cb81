// External imports
use anyhow::{bail, Result};
use burn::module::AutodiffModule;
use burn::optim::{AdamConfig, GradientsParams, Optimizer};
use burn::tensor::backend::{AutodiffBackend, Backend};
use burn::tensor::cast::ToElement;
use burn::tensor::Tensor;
use log::{debug, info};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

// Internal imports
use super::step_1_data_loader::{Label, Message};
use super::step_2_train_test_split::train_test_split;
use super::step_3_vectorizer::{tensor_values, vectorize_splits, EncodedSplit, VectorizedData};
use super::step_5_model_arch::SpamLstm;
use super::step_7_prediction::TrainedClassifier;
use crate::constants;

/// Configuration for training the classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    pub learning_rate: f64,
    pub batch_size: usize,
    pub epochs: usize,
    pub test_split: f64,
    pub max_vocab_size: usize,
    pub embedding_dim: usize,
    pub hidden_size: usize,
    /// Seeds the split, the batch order and parameter initialisation
    pub seed: u64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            learning_rate: constants::LEARNING_RATE,
            batch_size: constants::BATCH_SIZE,
            epochs: constants::EPOCHS,
            test_split: constants::TEST_SPLIT_RATIO,
            max_vocab_size: constants::MAX_VOCAB_SIZE,
            embedding_dim: constants::EMBEDDING_DIM,
            hidden_size: constants::HIDDEN_SIZE,
            seed: constants::DEFAULT_SEED,
        }
    }
}

/// Loss and accuracy over one pass of a split
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    pub loss: f64,
    pub accuracy: f64,
}

/// Per-epoch metrics on the training and held-out splits
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingHistory {
    pub loss: Vec<f64>,
    pub accuracy: Vec<f64>,
    pub val_loss: Vec<f64>,
    pub val_accuracy: Vec<f64>,
}

impl TrainingHistory {
    pub fn record(&mut self, train: EpochMetrics, validation: EpochMetrics) {
        self.loss.push(train.loss);
        self.accuracy.push(train.accuracy);
        self.val_loss.push(validation.loss);
        self.val_accuracy.push(validation.accuracy);
    }

    pub fn epochs(&self) -> usize {
        self.loss.len()
    }

    /// Metrics of the final epoch as (train, validation)
    pub fn last(&self) -> Option<(EpochMetrics, EpochMetrics)> {
        let i = self.epochs().checked_sub(1)?;
        Some((
            EpochMetrics {
                loss: self.loss[i],
                accuracy: self.accuracy[i],
            },
            EpochMetrics {
                loss: self.val_loss[i],
                accuracy: self.val_accuracy[i],
            },
        ))
    }
}

/// Mean binary cross-entropy between probabilities and 0/1 targets
///
/// Probabilities are clamped to `[eps, 1 - eps]` so the loss stays finite.
pub fn binary_cross_entropy<B: Backend>(probs: Tensor<B, 2>, targets: Tensor<B, 2>) -> Tensor<B, 1> {
    let probs = probs.clamp(constants::BCE_EPSILON, 1.0 - constants::BCE_EPSILON);
    let positive = targets.clone() * probs.clone().log();
    let negative = targets.neg().add_scalar(1.0) * probs.neg().add_scalar(1.0).log();
    (positive + negative).neg().mean()
}

/// Number of probabilities whose thresholded class matches the target
pub fn count_correct(probs: &[f32], targets: impl IntoIterator<Item = f32>) -> usize {
    probs
        .iter()
        .zip(targets)
        .filter(|(p, t)| Label::from_probability(**p as f64).as_binary() as f32 == *t)
        .count()
}

/// Evaluate the model on a split without updating it
pub fn evaluate_model<B: Backend>(
    model: &SpamLstm<B>,
    split: &EncodedSplit,
    batch_size: usize,
    device: &B::Device,
) -> Result<EpochMetrics> {
    if split.is_empty() {
        bail!("Cannot evaluate on an empty split");
    }

    let indices: Vec<usize> = (0..split.len()).collect();
    let mut loss_sum = 0.0;
    let mut correct = 0;
    for batch in indices.chunks(batch_size.max(1)) {
        let (inputs, targets) = split.batch_tensors::<B>(batch, device);
        let probs = model.forward(inputs);
        let loss = binary_cross_entropy(probs.clone(), targets);
        loss_sum += loss.into_scalar().to_f64() * batch.len() as f64;
        correct += count_correct(&tensor_values(probs)?, batch.iter().map(|&i| split.labels[i]));
    }

    let n = split.len() as f64;
    Ok(EpochMetrics {
        loss: loss_sum / n,
        accuracy: correct as f64 / n,
    })
}

/// Train a fresh SpamLstm on the vectorized training split
///
/// Runs exactly `config.epochs` passes with Adam, shuffling mini-batches with
/// the configured seed, and evaluates the held-out split after every pass.
/// There is no early stopping and no checkpointing.
pub fn train_model<B: AutodiffBackend>(
    data: &VectorizedData,
    config: &TrainingConfig,
    device: &B::Device,
) -> Result<(SpamLstm<B>, TrainingHistory)> {
    if data.train.is_empty() {
        bail!("Cannot train on an empty split");
    }

    B::seed(config.seed);
    let mut model = SpamLstm::<B>::new(
        data.vocabulary.embedding_rows(),
        config.embedding_dim,
        config.hidden_size,
        device,
    );
    let mut optimizer = AdamConfig::new()
        .with_epsilon(constants::ADAM_EPSILON)
        .init::<B, SpamLstm<B>>();

    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut indices: Vec<usize> = (0..data.train.len()).collect();
    let mut history = TrainingHistory::default();
    let n_train = data.train.len() as f64;

    for epoch in 1..=config.epochs {
        indices.shuffle(&mut rng);

        let mut loss_sum = 0.0;
        let mut correct = 0;
        for batch in indices.chunks(config.batch_size.max(1)) {
            let (inputs, targets) = data.train.batch_tensors::<B>(batch, device);

            // Forward pass
            let probs = model.forward(inputs);
            let loss = binary_cross_entropy(probs.clone(), targets);
            loss_sum += loss.clone().into_scalar().to_f64() * batch.len() as f64;
            correct += count_correct(&tensor_values(probs)?, batch.iter().map(|&i| data.train.labels[i]));

            // Backward pass and optimizer step
            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optimizer.step(config.learning_rate, model, grads);
        }

        let train_metrics = EpochMetrics {
            loss: loss_sum / n_train,
            accuracy: correct as f64 / n_train,
        };
        let val_metrics = evaluate_model(&model.valid(), &data.test, config.batch_size, device)?;
        history.record(train_metrics, val_metrics);

        println!(
            "Epoch {}/{} - loss: {:.4} - accuracy: {:.4} - val_loss: {:.4} - val_accuracy: {:.4}",
            epoch,
            config.epochs,
            train_metrics.loss,
            train_metrics.accuracy,
            val_metrics.loss,
            val_metrics.accuracy
        );
    }

    Ok((model, history))
}

/// Everything produced by one training run
#[derive(Debug, Clone)]
pub struct TrainingOutcome<B: Backend> {
    pub classifier: TrainedClassifier<B>,
    pub history: TrainingHistory,
    pub train_shape: (usize, usize),
    pub test_shape: (usize, usize),
}

/// Split, vectorize and train, returning an inference-ready classifier
///
/// The classifier bundles the model with the vocabulary and sequence width
/// it was trained with; nothing is kept in shared state.
pub fn train_classifier<B: AutodiffBackend>(
    messages: Vec<Message>,
    config: &TrainingConfig,
    device: &B::Device,
) -> Result<TrainingOutcome<B::InnerBackend>> {
    let (train, test) = train_test_split(messages, config.test_split, config.seed)?;
    info!("Training dataset size: {} rows", train.len());
    info!("Testing dataset size: {} rows", test.len());

    let data = vectorize_splits(&train, &test, config.max_vocab_size)?;
    let train_shape = data.train.sequences.dim();
    let test_shape = data.test.sequences.dim();
    println!("Found {} unique tokens.", data.vocabulary.unique_tokens());
    println!("Shape of data train tensor: {:?}", train_shape);
    println!("Shape of data test tensor: {:?}", test_shape);
    debug!("Sequence width: {}", data.sequence_length);

    println!("Training model...");
    let (model, history) = train_model::<B>(&data, config, device)?;

    let classifier = TrainedClassifier::new(model.valid(), data.vocabulary, data.sequence_length)?;
    Ok(TrainingOutcome {
        classifier,
        history,
        train_shape,
        test_shape,
    })
}
