// External imports
use burn::module::Module;
use burn::nn::{Embedding, EmbeddingConfig, Linear, LinearConfig};
use burn::tensor::{activation, backend::Backend, Int, Tensor};

// Internal imports
use super::step_4_lstm_cell::SequenceLstm;

/// Spam classifier: embedding, LSTM, max-pool over time, sigmoid output
#[derive(Module, Debug)]
pub struct SpamLstm<B: Backend> {
    vocab_rows: usize,
    embedding_dim: usize,
    hidden_size: usize,
    embedding: Embedding<B>,
    lstm: SequenceLstm<B>,
    output: Linear<B>,
}

impl<B: Backend> SpamLstm<B> {
    /// Create a new SpamLstm model
    ///
    /// # Arguments
    ///
    /// * `vocab_rows` - Embedding table rows: vocabulary size plus one for padding
    /// * `embedding_dim` - Width of each token embedding
    /// * `hidden_size` - LSTM hidden state size
    /// * `device` - Device to place tensors on
    pub fn new(vocab_rows: usize, embedding_dim: usize, hidden_size: usize, device: &B::Device) -> Self {
        let embedding = EmbeddingConfig::new(vocab_rows, embedding_dim).init(device);
        let lstm = SequenceLstm::new(embedding_dim, hidden_size, device);
        let output = LinearConfig::new(hidden_size, 1).init(device);
        Self {
            vocab_rows,
            embedding_dim,
            hidden_size,
            embedding,
            lstm,
            output,
        }
    }

    pub fn vocab_rows(&self) -> usize {
        self.vocab_rows
    }

    pub fn embedding_dim(&self) -> usize {
        self.embedding_dim
    }

    pub fn hidden_size(&self) -> usize {
        self.hidden_size
    }

    /// Forward pass
    ///
    /// # Arguments
    ///
    /// * `x` - Token indices of shape [batch_size, sequence_length]
    ///
    /// # Returns
    ///
    /// Returns spam probabilities of shape [batch_size, 1]
    pub fn forward(&self, x: Tensor<B, 2, Int>) -> Tensor<B, 2> {
        let batch_size = x.dims()[0];

        // [batch, time, embedding_dim]
        let embedded = self.embedding.forward(x);
        // [batch, time, hidden]
        let hidden = self.lstm.forward(embedded);
        // Element-wise max across time. The ndarray backward pass only
        // scatters along the last axis, so time is moved there first.
        let pooled = hidden
            .swap_dims(1, 2)
            .max_dim(2)
            .reshape([batch_size, self.hidden_size]);

        activation::sigmoid(self.output.forward(pooled))
    }
}
