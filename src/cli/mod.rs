// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction. Arguments are parsed with
// `clap`; all work is delegated to Layer 2 (application).
//
// Three commands are supported:
//   1. `train`        — fit a classifier on TSV files
//   2. `train-corpus` — the same, driven by a corpus object
//   3. `predict`      — load a model directory and label texts

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, PredictArgs, TrainArgs};

use crate::application::{
    predict_use_case::PredictUseCase,
    train_use_case::{TrainConfig, TrainUseCase},
};
use crate::domain::{text_input::TextInput, traits::LabelPredictor};

#[derive(Parser, Debug)]
#[command(
    name = "text-classifier",
    version,
    about = "Train CNN / BiLSTM text classifiers and label texts with them."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Dispatch the subcommand to its use case.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)       => run_train(args, false),
            Commands::TrainCorpus(args) => run_train(args, true),
            Commands::Predict(args)     => run_predict(args),
        }
    }
}

fn run_train(args: TrainArgs, corpus: bool) -> Result<()> {
    tracing::info!("Training on examples in: {}", args.train_file);

    let config: TrainConfig = args.into();
    let output_dir = config.output_dir.clone();
    let use_case = TrainUseCase::new(config);
    if corpus {
        use_case.execute_corpus()?;
    } else {
        use_case.execute()?;
    }

    println!("Training complete. Model saved to '{output_dir}'.");
    Ok(())
}

fn run_predict(args: PredictArgs) -> Result<()> {
    let predictor = PredictUseCase::new(&args.model_dir)?;
    let inputs: Vec<TextInput> = args.texts.iter().map(|t| TextInput::from(t.as_str())).collect();

    let labels = predictor.predict(&inputs)?;
    for (text, label) in args.texts.iter().zip(labels) {
        println!("{label}\t{text}");
    }
    Ok(())
}
