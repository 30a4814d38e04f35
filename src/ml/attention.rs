// ============================================================
// Layer 5 — Bidirectional Attention
// ============================================================
// Compares every context state with every question state.
//
//   S   = H · Uᵀ                         [N, JX, JQ]
//   a_x = softmax(S, over JQ)            context → question
//   Ũ   = a_x · U                        [N, JX, d]
//
//   b   = softmax(max_JQ S, over JX)     question → context
//   H̃   = b · H                          [N, 1, d]  (broadcasts over JX)
//
// Padded positions take MASK_PENALTY before each softmax so they
// receive zero weight.
//
// Attention has no parameters, so it is a pair of functions
// rather than a Module.
//
// Reference: Seo et al. (2017) BiDAF, §2.4

use burn::{prelude::*, tensor::activation::softmax};

/// Added to scores/logits at padded positions
pub const MASK_PENALTY: f32 = -1.0e30;

/// 0 where mask = 1, MASK_PENALTY where mask = 0
pub fn mask_penalty<B: Backend, const D: usize>(mask: Tensor<B, D>) -> Tensor<B, D> {
    mask.sub_scalar(1.0).mul_scalar(-MASK_PENALTY)
}

pub struct AttentionOutput<B: Backend> {
    /// Ũ — question summary for each context position, [N, JX, d]
    pub context_to_question: Tensor<B, 3>,
    /// H̃ — context summary weighted by the question, [N, 1, d]
    pub question_to_context: Tensor<B, 3>,
}

/// `h`: context encoding [N, JX, d], `u`: question encoding [N, JQ, d],
/// masks are float 0/1 of shape [N, JX] and [N, JQ].
pub fn attend<B: Backend>(
    h:      Tensor<B, 3>,
    u:      Tensor<B, 3>,
    h_mask: Tensor<B, 2>,
    u_mask: Tensor<B, 2>,
) -> AttentionOutput<B> {
    let [n, jx, d] = h.dims();
    let [_, jq, d_u] = u.dims();
    debug_assert_eq!(d, d_u, "context and question encodings differ in width");

    let scores = h.clone().matmul(u.clone().swap_dims(1, 2));
    let scores = scores + mask_penalty(u_mask).unsqueeze_dim::<3>(1);
    debug_assert_eq!(scores.dims(), [n, jx, jq]);

    let weights = softmax(scores.clone(), 2);
    let context_to_question = weights.matmul(u);

    let strongest = scores.max_dim(2).reshape([n, jx]);
    let b = softmax(strongest + mask_penalty(h_mask), 1);
    let question_to_context = b.unsqueeze_dim::<3>(1).matmul(h);

    AttentionOutput { context_to_question, question_to_context }
}

/// G = [H; Ũ; H∘Ũ; H∘H̃], [N, JX, 4d]
pub fn blend<B: Backend>(h: Tensor<B, 3>, attention: &AttentionOutput<B>) -> Tensor<B, 3> {
    let u_tilde = attention.context_to_question.clone();
    let h_tilde = attention.question_to_context.clone();
    Tensor::cat(
        vec![h.clone(), u_tilde.clone(), h.clone() * u_tilde, h * h_tilde],
        2,
    )
}
