// ============================================================
// Layer 5 — Span Decoder
// ============================================================
// Reads the attention blend G [N, JX, 4d] and scores every context
// position as a possible answer start and end.
//
//   M     = BiLSTM(G) over real tokens      [N, JX, 2h]
//   start = Linear_start([G; M])            [N, JX]
//   end   = Linear_end([G; M])              [N, JX]
//
// The two heads are independent classifiers over positions.
// Padded positions get MASK_PENALTY so they never win.

use burn::{
    nn::{BiLstm, BiLstmConfig, Linear, LinearConfig},
    prelude::*,
};

use crate::ml::{attention::mask_penalty, encoder::masked_bilstm};

#[derive(Config, Debug)]
pub struct SpanDecoderConfig {
    /// Width of G (4 × encoder output width)
    pub d_blend:    usize,
    pub state_size: usize,
}

impl SpanDecoderConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> SpanDecoder<B> {
        let d_head = self.d_blend + 2 * self.state_size;
        SpanDecoder {
            modeling:   BiLstmConfig::new(self.d_blend, self.state_size, true).init(device),
            start_head: LinearConfig::new(d_head, 1).init(device),
            end_head:   LinearConfig::new(d_head, 1).init(device),
        }
    }
}

#[derive(Module, Debug)]
pub struct SpanDecoder<B: Backend> {
    pub modeling:   BiLstm<B>,
    pub start_head: Linear<B>,
    pub end_head:   Linear<B>,
}

/// Start and end logits over context positions, [N, JX] each
#[derive(Debug, Clone)]
pub struct SpanLogits<B: Backend> {
    pub start: Tensor<B, 2>,
    pub end:   Tensor<B, 2>,
}

impl<B: Backend> SpanDecoder<B> {
    /// `blend`: [N, JX, d_blend], `mask`: float 0/1 [N, JX]
    pub fn forward(&self, blend: Tensor<B, 3>, mask: Tensor<B, 2>) -> SpanLogits<B> {
        let [n, jx, _] = blend.dims();
        let (modeled, _) = masked_bilstm(&self.modeling, blend.clone(), mask.clone(), None);
        let features = Tensor::cat(vec![blend, modeled], 2);

        let penalty = mask_penalty(mask);
        let start = self.start_head.forward(features.clone()).reshape([n, jx]) + penalty.clone();
        let end   = self.end_head.forward(features).reshape([n, jx]) + penalty;

        SpanLogits { start, end }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type B = NdArray;

    #[test]
    fn test_logits_shape_and_masking() {
        let device  = Default::default();
        let decoder = SpanDecoderConfig::new(8, 3).init::<B>(&device);
        let blend   = Tensor::<B, 3>::random([2, 4, 8], burn::tensor::Distribution::Default, &device);
        let mask    = Tensor::<B, 2>::from_data(
            TensorData::new(vec![1.0f32, 1.0, 1.0, 0.0, 1.0, 1.0, 0.0, 0.0], [2, 4]),
            &device,
        );

        let logits = decoder.forward(blend, mask);
        assert_eq!(logits.start.dims(), [2, 4]);
        assert_eq!(logits.end.dims(), [2, 4]);

        let end: Vec<f32> = logits.end.into_data().convert::<f32>().to_vec().unwrap();
        assert!(end[3] < -1.0e29);
        assert!(end[6] < -1.0e29 && end[7] < -1.0e29);
        assert!(end[0] > -1.0e29);
    }
}
