// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction, parsed with `clap`.
// All business logic is delegated to Layer 2 (application).
//
//   1. `train`    — trains the model on a SQuAD directory
//   2. `evaluate` — scores a checkpoint on a split
//   3. `ask`      — answers a question from text or documents

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{AskArgs, Commands, EvaluateArgs, TrainArgs};

#[derive(Parser, Debug)]
#[command(
    name = "span-qa",
    version,
    about = "Train a BiLSTM + attention span QA model on SQuAD, then ask questions."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Match on the subcommand and dispatch to the correct use case.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)    => run_train(args),
            Commands::Evaluate(args) => run_evaluate(args),
            Commands::Ask(args)      => run_ask(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!("Starting training on data in: {}", args.data_dir);
    let summary = TrainUseCase::new(args.into()).execute()?;

    println!(
        "Training complete after {} epochs. Best epoch {} (val F1 {:.2}).",
        summary.epochs_run, summary.best_epoch, summary.best_f1
    );
    Ok(())
}

fn run_evaluate(args: EvaluateArgs) -> Result<()> {
    use crate::application::evaluate_use_case::EvaluateUseCase;

    let split  = args.split.clone();
    let report = EvaluateUseCase::new(args.into()).execute()?;

    println!("Split: {split}");
    println!(
        "Loss: {:.4} | start_acc: {:.1}% | end_acc: {:.1}%",
        report.validation.loss,
        report.validation.start_acc * 100.0,
        report.validation.end_acc * 100.0,
    );
    println!(
        "F1: {:.2} | EM: {:.2} | samples: {}",
        report.scores.f1, report.scores.em, report.scores.samples
    );
    Ok(())
}

fn run_ask(args: AskArgs) -> Result<()> {
    use crate::application::ask_use_case::{AskUseCase, ContextSource};
    use crate::domain::traits::QuestionAnswerer;

    let source = match args.context {
        Some(text) => ContextSource::Text(text),
        None       => ContextSource::Directory(args.docs_dir),
    };
    let use_case = AskUseCase::from_checkpoint(&args.checkpoint_dir, source)?;

    let answer = use_case.answer(&args.question)?;
    println!("\nAnswer: {}", answer);
    Ok(())
}
