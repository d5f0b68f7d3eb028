// ============================================================
// text_classifier
// ============================================================
// Embedding-based text classification on Burn.
//
//   domain      — TextInput, LabeledText, core traits
//   tokenizer   — vocabulary, labels, embedding source
//   data        — TSV loading, splitting, batch generators, corpus
//   ml          — architectures, trainer, ClassificationModel
//   infra       — checkpoints and metrics on disk
//   application — train / predict workflows
//   cli         — clap front end used by the binary

#![recursion_limit = "256"]

pub mod application;
pub mod cli;
pub mod data;
pub mod domain;
pub mod infra;
pub mod ml;
pub mod tokenizer;

pub use data::corpus::{Corpus, LabeledCorpus};
pub use domain::text_input::{LabeledText, TextInput};
pub use ml::{
    classification::ClassificationModel,
    model::{BiLstmClassifierConfig, CnnClassifierConfig, ModelBuilder},
    trainer::{FitOptions, TrainCallback},
};
pub use tokenizer::{EmbeddingSource, PretrainedEmbedding, Tokenizer, TokenizerConfig};
