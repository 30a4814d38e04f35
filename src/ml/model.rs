// ============================================================
// Layer 5 — Span QA Model
// ============================================================
// Assembles the reader:
//
//   question ids ─► embed ─► question BiLSTM ──┐ U, final state
//                                              │
//   context ids  ─► embed ─► context BiLSTM ◄──┘ (conditioned)
//                                   │ H
//                                   ▼
//                      attend(H, U) → blend G
//                                   │
//                                   ▼
//                      SpanDecoder → start / end logits
//
// One embedding table serves both inputs. Question and context
// encoders have independent weights.
//
// Reference: Wang & Jiang (2016) Match-LSTM
//            Seo et al. (2017) BiDAF

use anyhow::Result;
use burn::{
    module::Param,
    nn::{
        loss::CrossEntropyLossConfig,
        Dropout, DropoutConfig,
        Embedding, EmbeddingConfig, LstmState,
    },
    prelude::*,
    tensor::activation::softmax,
};

use crate::data::{batcher::QaBatch, embeddings::EmbeddingMatrix};
use crate::ml::{
    attention::{attend, blend},
    decoder::{SpanDecoder, SpanDecoderConfig, SpanLogits},
    encoder::{Encoder, EncoderConfig, Encoding},
};

#[derive(Config, Debug)]
pub struct SpanQaConfig {
    pub vocab_size:      usize,
    pub embedding_size:  usize,
    pub state_size:      usize,
    pub question_maxlen: usize,
    pub context_maxlen:  usize,
    #[config(default = 0.0)]
    pub dropout:         f64,
}

impl SpanQaConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> SpanQaModel<B> {
        let encoded = 2 * self.state_size;
        SpanQaModel {
            embedding:        EmbeddingConfig::new(self.vocab_size, self.embedding_size).init(device),
            question_encoder: EncoderConfig::new(self.embedding_size, self.state_size).init(device),
            context_encoder:  EncoderConfig::new(self.embedding_size, self.state_size).init(device),
            decoder:          SpanDecoderConfig::new(4 * encoded, self.state_size).init(device),
            dropout:          DropoutConfig::new(self.dropout).init(),
            question_maxlen:  self.question_maxlen,
            context_maxlen:   self.context_maxlen,
        }
    }

    /// Like `init`, with the embedding table copied from pretrained
    /// vectors. A frozen table receives no gradient.
    pub fn init_with_embeddings<B: Backend>(
        &self,
        device:    &B::Device,
        vectors:   &EmbeddingMatrix,
        trainable: bool,
    ) -> Result<SpanQaModel<B>> {
        if vectors.vocab_size != self.vocab_size || vectors.dim != self.embedding_size {
            anyhow::bail!(
                "Embedding matrix is {}x{} but the model expects {}x{}",
                vectors.vocab_size, vectors.dim, self.vocab_size, self.embedding_size
            );
        }

        let mut model = self.init(device);
        let weight = Tensor::<B, 2>::from_data(
            TensorData::new(vectors.values.clone(), [vectors.vocab_size, vectors.dim]),
            device,
        );
        model.embedding.weight = Param::from_tensor(weight);
        if !trainable {
            model.embedding = model.embedding.no_grad();
        }
        Ok(model)
    }
}

#[derive(Module, Debug)]
pub struct SpanQaModel<B: Backend> {
    pub embedding:        Embedding<B>,
    pub question_encoder: Encoder<B>,
    pub context_encoder:  Encoder<B>,
    pub decoder:          SpanDecoder<B>,
    pub dropout:          Dropout,
    pub question_maxlen:  usize,
    pub context_maxlen:   usize,
}

impl<B: Backend> SpanQaModel<B> {
    /// question_ids/mask: [N, JQ], context_ids/mask: [N, JX] → logits [N, JX]
    pub fn forward(
        &self,
        question_ids:  Tensor<B, 2, Int>,
        question_mask: Tensor<B, 2, Int>,
        context_ids:   Tensor<B, 2, Int>,
        context_mask:  Tensor<B, 2, Int>,
    ) -> SpanLogits<B> {
        debug_assert_eq!(question_ids.dims()[1], self.question_maxlen);
        debug_assert_eq!(context_ids.dims()[1], self.context_maxlen);

        let q_mask = question_mask.float();
        let c_mask = context_mask.float();

        let (question, context) = self.encode(question_ids, q_mask.clone(), context_ids, c_mask.clone());

        let attention = attend(context.hidden.clone(), question.hidden, c_mask.clone(), q_mask);
        let g = self.dropout.forward(blend(context.hidden, &attention));

        self.decoder.forward(g, c_mask)
    }

    /// Question encoding U, then context encoding H started from the
    /// question's final state. Masks are float 0/1.
    pub fn encode(
        &self,
        question_ids:  Tensor<B, 2, Int>,
        question_mask: Tensor<B, 2>,
        context_ids:   Tensor<B, 2, Int>,
        context_mask:  Tensor<B, 2>,
    ) -> (Encoding<B>, Encoding<B>) {
        let q = self.dropout.forward(self.embedding.forward(question_ids));
        let x = self.dropout.forward(self.embedding.forward(context_ids));

        let question = self.question_encoder.forward(q, question_mask, None);
        let initial  = LstmState::new(question.state.cell.clone(), question.state.hidden.clone());
        let context  = self.context_encoder.forward(x, context_mask, Some(initial));
        (question, context)
    }

    pub fn forward_batch(&self, batch: &QaBatch<B>) -> SpanLogits<B> {
        self.forward(
            batch.question_ids.clone(),
            batch.question_mask.clone(),
            batch.context_ids.clone(),
            batch.context_mask.clone(),
        )
    }

    /// (CE_start + CE_end) / 2, averaged over the batch
    pub fn loss(
        &self,
        logits:          &SpanLogits<B>,
        start_positions: Tensor<B, 1, Int>,
        end_positions:   Tensor<B, 1, Int>,
    ) -> Tensor<B, 1> {
        let ce = CrossEntropyLossConfig::new().init(&logits.start.device());
        (ce.forward(logits.start.clone(), start_positions)
            + ce.forward(logits.end.clone(), end_positions))
            / 2.0_f64
    }

    pub fn forward_loss(&self, batch: &QaBatch<B>) -> (Tensor<B, 1>, SpanLogits<B>) {
        let logits = self.forward_batch(batch);
        let loss   = self.loss(
            &logits,
            batch.start_positions.clone(),
            batch.end_positions.clone(),
        );
        (loss, logits)
    }
}

/// Row-major softmax probabilities for start and end, each N × JX
pub struct SpanProbabilities {
    pub start: Vec<f32>,
    pub end:   Vec<f32>,
    pub width: usize,
}

impl SpanProbabilities {
    pub fn from_logits<B: Backend>(logits: SpanLogits<B>) -> Result<Self> {
        let [_, width] = logits.start.dims();
        let start = softmax(logits.start, 1)
            .into_data()
            .convert::<f32>()
            .to_vec::<f32>()
            .map_err(|e| anyhow::anyhow!("Start probabilities: {e:?}"))?;
        let end = softmax(logits.end, 1)
            .into_data()
            .convert::<f32>()
            .to_vec::<f32>()
            .map_err(|e| anyhow::anyhow!("End probabilities: {e:?}"))?;
        Ok(Self { start, end, width })
    }

    pub fn row(&self, i: usize) -> (&[f32], &[f32]) {
        let range = i * self.width..(i + 1) * self.width;
        (&self.start[range.clone()], &self.end[range])
    }
}
