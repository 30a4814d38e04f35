// ============================================================
// Layer 5 — Bidirectional LSTM Encoder
// ============================================================
// Runs a BiLSTM over embedded tokens and exposes three views:
//
//   hidden  [N, J, 2h]  per-token states, zero at padded positions
//   summary [N, 2h]     forward state at the last real token
//                       concatenated with backward state at token 0
//   state   LstmState   final state of each direction, handed to
//                       the context encoder for conditional encoding
//
// Burn's BiLstm has no sequence-length argument, so `masked_bilstm`
// drives its two directions one timestep at a time. At a padded
// step the previous state is carried through unchanged:
//
//   state_t = m_t · lstm(x_t, state_{t-1}) + (1 - m_t) · state_{t-1}
//
// The forward pass therefore stops at the last real token and the
// backward pass starts there, whatever the padding width.
//
// Reference: Hochreiter & Schmidhuber (1997)
//            Burn Book §3 (Building Blocks)

use burn::{
    nn::{BiLstm, BiLstmConfig, Lstm, LstmState},
    prelude::*,
};

#[derive(Config, Debug)]
pub struct EncoderConfig {
    pub d_input:    usize,
    pub state_size: usize,
}

impl EncoderConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> Encoder<B> {
        Encoder {
            lstm:       BiLstmConfig::new(self.d_input, self.state_size, true).init(device),
            state_size: self.state_size,
        }
    }
}

#[derive(Module, Debug)]
pub struct Encoder<B: Backend> {
    pub lstm:       BiLstm<B>,
    pub state_size: usize,
}

/// Output of `Encoder::forward`
pub struct Encoding<B: Backend> {
    pub hidden:  Tensor<B, 3>,
    pub summary: Tensor<B, 2>,
    pub state:   LstmState<B, 3>,
}

/// Rows `dir` of a [2, N, h] bidirectional state
fn direction<B: Backend>(state: &LstmState<B, 3>, dir: usize) -> LstmState<B, 2> {
    let [_, n, h] = state.hidden.dims();
    LstmState::new(
        state.cell.clone().slice([dir..dir + 1, 0..n, 0..h]).reshape([n, h]),
        state.hidden.clone().slice([dir..dir + 1, 0..n, 0..h]).reshape([n, h]),
    )
}

/// Runs one direction of `lstm` over the real tokens of each row.
/// Outputs are zero at padded steps.
fn masked_pass<B: Backend>(
    lstm:     &Lstm<B>,
    inputs:   Tensor<B, 3>,
    mask:     Tensor<B, 2>,
    initial:  Option<LstmState<B, 2>>,
    backward: bool,
) -> (Tensor<B, 3>, LstmState<B, 2>) {
    let [n, len, d] = inputs.dims();
    let device = inputs.device();

    let mut state = initial.unwrap_or_else(|| {
        LstmState::new(
            Tensor::zeros([n, lstm.d_hidden], &device),
            Tensor::zeros([n, lstm.d_hidden], &device),
        )
    });

    let steps: Vec<usize> = if backward { (0..len).rev().collect() } else { (0..len).collect() };
    let mut outputs = Vec::with_capacity(len);

    for t in steps {
        let x_t = inputs.clone().slice([0..n, t..t + 1, 0..d]);
        let m_t = mask.clone().slice([0..n, t..t + 1]);
        let keep = m_t.clone().neg().add_scalar(1.0);

        let carried = LstmState::new(state.cell.clone(), state.hidden.clone());
        let (_, next) = lstm.forward(x_t, Some(carried));
        state = LstmState::new(
            next.cell * m_t.clone() + state.cell * keep.clone(),
            next.hidden.clone() * m_t.clone() + state.hidden * keep,
        );
        outputs.push((next.hidden * m_t).unsqueeze_dim::<3>(1));
    }
    if backward {
        outputs.reverse();
    }

    (Tensor::cat(outputs, 1), state)
}

/// BiLSTM over `inputs` [N, J, d] honouring the 0/1 prefix `mask` [N, J].
/// Returns per-token states [N, J, 2h] and the final [2, N, h] state.
pub fn masked_bilstm<B: Backend>(
    lstm:          &BiLstm<B>,
    inputs:        Tensor<B, 3>,
    mask:          Tensor<B, 2>,
    initial_state: Option<LstmState<B, 3>>,
) -> (Tensor<B, 3>, LstmState<B, 3>) {
    let (init_fwd, init_bwd) = match &initial_state {
        Some(state) => (Some(direction(state, 0)), Some(direction(state, 1))),
        None        => (None, None),
    };

    let (fwd_out, fwd) = masked_pass(&lstm.forward, inputs.clone(), mask.clone(), init_fwd, false);
    let (bwd_out, bwd) = masked_pass(&lstm.reverse, inputs, mask, init_bwd, true);

    let state = LstmState::new(
        Tensor::stack(vec![fwd.cell, bwd.cell], 0),
        Tensor::stack(vec![fwd.hidden, bwd.hidden], 0),
    );
    (Tensor::cat(vec![fwd_out, bwd_out], 2), state)
}

impl<B: Backend> Encoder<B> {
    /// `inputs`: [N, J, d_input], `mask`: float 0/1 [N, J]
    pub fn forward(
        &self,
        inputs:        Tensor<B, 3>,
        mask:          Tensor<B, 2>,
        initial_state: Option<LstmState<B, 3>>,
    ) -> Encoding<B> {
        let [n, _, _] = inputs.dims();
        let h = self.state_size;

        let (hidden, state) = masked_bilstm(&self.lstm, inputs, mask, initial_state);

        // Final forward state sits at the last real token, final
        // backward state at token 0
        let forward_last   = state.hidden.clone().slice([0..1, 0..n, 0..h]).reshape([n, h]);
        let backward_first = state.hidden.clone().slice([1..2, 0..n, 0..h]).reshape([n, h]);

        Encoding {
            hidden,
            summary: Tensor::cat(vec![forward_last, backward_first], 1),
            state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use burn::tensor::Distribution;

    type B = NdArray;

    fn mask(values: Vec<f32>, shape: [usize; 2]) -> Tensor<B, 2> {
        Tensor::from_data(TensorData::new(values, shape), &Default::default())
    }

    fn values<const D: usize>(t: Tensor<B, D>) -> Vec<f32> {
        t.into_data().convert::<f32>().to_vec().unwrap()
    }

    fn assert_close(a: &[f32], b: &[f32]) {
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b) {
            assert!((x - y).abs() < 1e-5, "{x} != {y}");
        }
    }

    #[test]
    fn test_shapes_and_padding_zeroed() {
        let device  = Default::default();
        let encoder = EncoderConfig::new(3, 4).init::<B>(&device);
        let inputs  = Tensor::<B, 3>::ones([2, 5, 3], &device);
        let m = mask(vec![1.0, 1.0, 1.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0, 1.0], [2, 5]);

        let out = encoder.forward(inputs, m, None);
        assert_eq!(out.hidden.dims(), [2, 5, 8]);
        assert_eq!(out.summary.dims(), [2, 8]);
        assert_eq!(out.state.hidden.dims(), [2, 2, 4]);

        let padded = values(out.hidden.slice([0..1, 3..5, 0..8]));
        assert!(padded.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_summary_takes_forward_state_at_last_real_token() {
        let device  = Default::default();
        let encoder = EncoderConfig::new(2, 3).init::<B>(&device);
        let inputs  = Tensor::<B, 3>::ones([1, 4, 2], &device);
        let out = encoder.forward(inputs, mask(vec![1.0, 1.0, 0.0, 0.0], [1, 4]), None);

        let forward_at_last  = values(out.hidden.clone().slice([0..1, 1..2, 0..3]));
        let backward_at_zero = values(out.hidden.slice([0..1, 0..1, 3..6]));
        let summary = values(out.summary);
        assert_close(&summary[..3], &forward_at_last);
        assert_close(&summary[3..], &backward_at_zero);
    }

    #[test]
    fn test_real_tokens_ignore_padding_width() {
        let device  = Default::default();
        let encoder = EncoderConfig::new(3, 3).init::<B>(&device);
        let real    = Tensor::<B, 3>::random([1, 2, 3], Distribution::Default, &device);

        // Same two tokens, followed by 1 or 4 padded steps of noise
        let short = Tensor::cat(
            vec![real.clone(), Tensor::random([1, 1, 3], Distribution::Default, &device)],
            1,
        );
        let long = Tensor::cat(
            vec![real, Tensor::random([1, 4, 3], Distribution::Default, &device)],
            1,
        );

        let a = encoder.forward(short, mask(vec![1.0, 1.0, 0.0], [1, 3]), None);
        let b = encoder.forward(long, mask(vec![1.0, 1.0, 0.0, 0.0, 0.0, 0.0], [1, 6]), None);

        assert_close(
            &values(a.hidden.slice([0..1, 0..2, 0..6])),
            &values(b.hidden.slice([0..1, 0..2, 0..6])),
        );
        assert_close(&values(a.summary), &values(b.summary));
        assert_close(&values(a.state.cell), &values(b.state.cell));
        assert_close(&values(a.state.hidden), &values(b.state.hidden));
    }

    #[test]
    fn test_initial_state_changes_the_encoding() {
        let device  = Default::default();
        let encoder = EncoderConfig::new(2, 3).init::<B>(&device);
        let inputs  = Tensor::<B, 3>::ones([1, 3, 2], &device);
        let m = || mask(vec![1.0, 1.0, 1.0], [1, 3]);

        let plain = encoder.forward(inputs.clone(), m(), None);
        let primed = LstmState::new(
            Tensor::<B, 3>::ones([2, 1, 3], &device),
            Tensor::<B, 3>::ones([2, 1, 3], &device),
        );
        let conditioned = encoder.forward(inputs, m(), Some(primed));

        let diff = values((plain.hidden - conditioned.hidden).abs().sum());
        assert!(diff[0] > 1e-4);
    }
}
