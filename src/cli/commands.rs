// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the subcommands `train`, `evaluate` and `ask` and all
// their configurable flags.
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand};

use crate::application::{
    evaluate_use_case::EvaluateConfig,
    train_use_case::TrainConfig,
};
use crate::ml::optim::OptimizerKind;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the span QA model on a preprocessed SQuAD directory
    Train(TrainArgs),

    /// Report loss, accuracy, F1 and EM of a trained checkpoint
    Evaluate(EvaluateArgs),

    /// Ask a question about a passage or a folder of documents
    Ask(AskArgs),
}

/// Each field becomes a --flag on the command line.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Directory with vocab.dat and {train,val}.{ids.question,ids.context,span}
    #[arg(long, default_value = "data/squad")]
    pub data_dir: String,

    /// Directory to save checkpoints, config, tokenizer and metrics
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// GloVe-format text file with pretrained word vectors
    #[arg(long)]
    pub embed_path: Option<String>,

    /// Width of the word vectors (must match --embed-path)
    #[arg(long, default_value_t = 100)]
    pub embedding_size: usize,

    /// Hidden size of each LSTM direction
    #[arg(long, default_value_t = 100)]
    pub state_size: usize,

    #[arg(long, default_value_t = 30)]
    pub question_maxlen: usize,

    #[arg(long, default_value_t = 300)]
    pub context_maxlen: usize,

    #[arg(long, default_value_t = 32)]
    pub batch_size: usize,

    #[arg(long, default_value_t = 10)]
    pub epochs: usize,

    #[arg(long, default_value_t = 1e-3)]
    pub learning_rate: f64,

    /// adam or sgd
    #[arg(long, default_value = "adam")]
    pub optimizer: OptimizerKind,

    /// Clip gradients to this global norm; 0 disables clipping
    #[arg(long, default_value_t = 10.0)]
    pub max_grad_norm: f32,

    /// Learning rate multiplier per `decay_steps` batches (1.0 = constant)
    #[arg(long, default_value_t = 1.0)]
    pub decay_rate: f64,

    #[arg(long, default_value_t = 1000)]
    pub decay_steps: usize,

    /// Decay in discrete jumps instead of smoothly
    #[arg(long)]
    pub staircase: bool,

    #[arg(long, default_value_t = 0.15)]
    pub dropout: f64,

    /// Keep updating pretrained embeddings during training
    #[arg(long)]
    pub retrain_embeddings: bool,

    /// Longest answer span considered when decoding
    #[arg(long, default_value_t = 15)]
    pub max_answer_len: usize,

    /// Examples scored for F1 / EM after each epoch (0 = all)
    #[arg(long, default_value_t = 100)]
    pub eval_sample: usize,

    /// Log the running loss every N batches (0 = never)
    #[arg(long, default_value_t = 100)]
    pub print_every: usize,

    /// Stop after N epochs without validation F1 improvement (0 = never)
    #[arg(long, default_value_t = 0)]
    pub patience: usize,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

/// The application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            data_dir:           a.data_dir,
            checkpoint_dir:     a.checkpoint_dir,
            embed_path:         a.embed_path,
            embedding_size:     a.embedding_size,
            state_size:         a.state_size,
            question_maxlen:    a.question_maxlen,
            context_maxlen:     a.context_maxlen,
            batch_size:         a.batch_size,
            epochs:             a.epochs,
            learning_rate:      a.learning_rate,
            optimizer:          a.optimizer,
            max_grad_norm:      (a.max_grad_norm > 0.0).then_some(a.max_grad_norm),
            decay_rate:         a.decay_rate,
            decay_steps:        a.decay_steps,
            staircase:          a.staircase,
            dropout:            a.dropout,
            retrain_embeddings: a.retrain_embeddings,
            max_answer_len:     a.max_answer_len,
            eval_sample:        a.eval_sample,
            print_every:        a.print_every,
            patience:           a.patience,
            seed:               a.seed,
            vocab_size:         0,
        }
    }
}

#[derive(Args, Debug)]
pub struct EvaluateArgs {
    #[arg(long, default_value = "data/squad")]
    pub data_dir: String,

    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// Split to score, e.g. val or train
    #[arg(long, default_value = "val")]
    pub split: String,

    /// Examples scored for F1 / EM (0 = all)
    #[arg(long, default_value_t = 0)]
    pub sample: usize,
}

impl From<EvaluateArgs> for EvaluateConfig {
    fn from(a: EvaluateArgs) -> Self {
        EvaluateConfig {
            data_dir:       a.data_dir,
            checkpoint_dir: a.checkpoint_dir,
            split:          a.split,
            sample:         a.sample,
        }
    }
}

#[derive(Args, Debug)]
pub struct AskArgs {
    /// The natural language question to answer
    #[arg(long)]
    pub question: String,

    /// Passage to read the answer from
    #[arg(long, conflicts_with = "docs_dir")]
    pub context: Option<String>,

    /// Directory with .txt / .docx files to read instead
    #[arg(long, default_value = "data/docs")]
    pub docs_dir: String,

    /// Directory where checkpoints were saved during training
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,
}
