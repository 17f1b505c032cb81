// External imports
use burn::module::{Module, Param};
use burn::nn::{Linear, LinearConfig};
use burn::tensor::{activation, backend::Backend, Tensor};

/// Unidirectional LSTM that returns the hidden state at every time step
#[derive(Module, Debug)]
pub struct SequenceLstm<B: Backend> {
    input_size: usize,
    hidden_size: usize,

    // Input projections (carry the gate biases)
    input_gate: Linear<B>,
    forget_gate: Linear<B>,
    cell_gate: Linear<B>,
    output_gate: Linear<B>,

    // Recurrent projections
    input_recurrent: Linear<B>,
    forget_recurrent: Linear<B>,
    cell_recurrent: Linear<B>,
    output_recurrent: Linear<B>,
}

impl<B: Backend> SequenceLstm<B> {
    /// Create a new LSTM layer
    ///
    /// # Arguments
    ///
    /// * `input_size` - Width of each time step's input vector
    /// * `hidden_size` - Size of hidden state
    /// * `device` - Device to place tensors on
    pub fn new(input_size: usize, hidden_size: usize, device: &B::Device) -> Self {
        let gate = || LinearConfig::new(input_size, hidden_size).init(device);
        let recurrent = || {
            LinearConfig::new(hidden_size, hidden_size)
                .with_bias(false)
                .init(device)
        };

        // Forget gate bias starts at one
        let mut forget_gate = gate();
        forget_gate.bias = Some(Param::from_tensor(Tensor::ones([hidden_size], device)));

        Self {
            input_size,
            hidden_size,
            input_gate: gate(),
            forget_gate,
            cell_gate: gate(),
            output_gate: gate(),
            input_recurrent: recurrent(),
            forget_recurrent: recurrent(),
            cell_recurrent: recurrent(),
            output_recurrent: recurrent(),
        }
    }

    /// Forward pass through the sequence
    ///
    /// # Arguments
    ///
    /// * `x` - Input tensor of shape [batch_size, sequence_length, input_size]
    ///
    /// # Returns
    ///
    /// Returns the hidden states of shape [batch_size, sequence_length, hidden_size]
    pub fn forward(&self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        let device = x.device();
        let [batch_size, sequence_length, _] = x.dims();

        let mut h = Tensor::<B, 2>::zeros([batch_size, self.hidden_size], &device);
        let mut c = Tensor::<B, 2>::zeros([batch_size, self.hidden_size], &device);
        let mut outputs = Vec::with_capacity(sequence_length);

        for t in 0..sequence_length {
            // [batch_size, input_size]
            let x_t = x
                .clone()
                .narrow(1, t, 1)
                .reshape([batch_size, self.input_size]);

            let i_t = activation::sigmoid(
                self.input_gate.forward(x_t.clone()) + self.input_recurrent.forward(h.clone()),
            );
            let f_t = activation::sigmoid(
                self.forget_gate.forward(x_t.clone()) + self.forget_recurrent.forward(h.clone()),
            );
            let g_t = activation::tanh(
                self.cell_gate.forward(x_t.clone()) + self.cell_recurrent.forward(h.clone()),
            );
            let o_t = activation::sigmoid(
                self.output_gate.forward(x_t) + self.output_recurrent.forward(h.clone()),
            );

            c = f_t * c + i_t * g_t;
            h = o_t * activation::tanh(c.clone());
            outputs.push(h.clone());
        }

        Tensor::stack::<3>(outputs, 1)
    }

    pub fn input_size(&self) -> usize {
        self.input_size
    }

    pub fn hidden_size(&self) -> usize {
        self.hidden_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::test_utils::backend_rng_guard;
    use burn_ndarray::{NdArray, NdArrayDevice};

    fn new_lstm(input_size: usize, hidden_size: usize, device: &NdArrayDevice) -> SequenceLstm<NdArray> {
        let _guard = backend_rng_guard();
        SequenceLstm::new(input_size, hidden_size, device)
    }

    #[test]
    fn test_lstm_output_shape() {
        let device = NdArrayDevice::default();
        let lstm = new_lstm(20, 15, &device);

        let input = Tensor::<NdArray, 3>::ones([4, 7, 20], &device);
        let output = lstm.forward(input);
        assert_eq!(output.dims(), [4, 7, 15]);
    }

    #[test]
    fn test_hidden_states_are_bounded() {
        let device = NdArrayDevice::default();
        let lstm = new_lstm(3, 5, &device);

        let input = Tensor::<NdArray, 3>::ones([2, 6, 3], &device).mul_scalar(10.0);
        let values: Vec<f32> = lstm.forward(input).into_data().to_vec::<f32>().unwrap();
        // h = o * tanh(c) with o in (0, 1)
        assert!(values.iter().all(|v| v.abs() < 1.0));
    }

    #[test]
    fn test_recurrent_weights_have_no_bias() {
        let device = NdArrayDevice::default();
        let lstm = new_lstm(3, 5, &device);
        assert!(lstm.input_gate.bias.is_some());
        assert!(lstm.input_recurrent.bias.is_none());
        assert_eq!(lstm.forget_recurrent.weight.dims(), [5, 5]);
        assert_eq!(lstm.cell_gate.weight.dims(), [3, 5]);
    }

    #[test]
    fn test_forget_gate_bias_starts_at_one() {
        let device = NdArrayDevice::default();
        let lstm = new_lstm(3, 5, &device);

        let forget_bias = lstm.forget_gate.bias.as_ref().unwrap().val();
        let values: Vec<f32> = forget_bias.into_data().to_vec::<f32>().unwrap();
        assert_eq!(values, vec![1.0; 5]);

        let input_bias = lstm.input_gate.bias.as_ref().unwrap().val();
        assert_eq!(input_bias.dims(), [5]);
        assert!(input_bias.into_data().to_vec::<f32>().unwrap().iter().any(|v| *v != 1.0));
    }
}
