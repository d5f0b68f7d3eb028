// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the three subcommands, `train`, `train-corpus` and
// `predict`, and all their configurable flags. The two training
// commands share one set of arguments.

use clap::{Args, Subcommand, ValueEnum};

use crate::application::train_use_case::{Architecture, TrainConfig};

/// The top-level subcommands available to the user
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train a classifier on a `label<TAB>text` file
    Train(TrainArgs),

    /// Train through a corpus object (the corpus batches its own data)
    TrainCorpus(TrainArgs),

    /// Label texts with a trained model
    Predict(PredictArgs),
}

/// Network placed on top of the embedding layer
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum ArchArg {
    /// 1-D convolution + global max pooling
    Cnn,
    /// Bidirectional LSTM
    Blstm,
}

impl From<ArchArg> for Architecture {
    fn from(a: ArchArg) -> Self {
        match a {
            ArchArg::Cnn => Architecture::Cnn,
            ArchArg::Blstm => Architecture::Blstm,
        }
    }
}

/// All arguments for the training commands.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Training examples, one `label<TAB>text` per line
    #[arg(long)]
    pub train_file: String,

    /// Validation examples in the same format
    #[arg(long)]
    pub valid_file: Option<String>,

    /// Hold out this fraction of the training file for validation
    /// (ignored when --valid-file is given)
    #[arg(long)]
    pub valid_fraction: Option<f64>,

    /// Directory for weights, tokenizer, configs and metrics
    #[arg(long, default_value = "model")]
    pub output_dir: String,

    #[arg(long, value_enum, default_value_t = ArchArg::Cnn)]
    pub architecture: ArchArg,

    #[command(flatten)]
    pub embedding: EmbeddingArgs,

    /// Samples per batch; shrinks to half the data when larger than it
    #[arg(long, default_value_t = 64)]
    pub batch_size: usize,

    /// Number of full passes through the training data
    #[arg(long, default_value_t = 5)]
    pub epochs: usize,

    /// Adam learning rate (train only; train-corpus uses the default)
    #[arg(long, default_value_t = 1e-3)]
    pub lr: f64,

    #[command(flatten)]
    pub model: ModelArgs,

    /// Seed for the validation split
    #[arg(long)]
    pub seed: Option<u64>,
}

/// Vocabulary and embedding flags.
#[derive(Args, Debug)]
pub struct EmbeddingArgs {
    /// Pretrained vectors in word2vec text format; frozen during training
    #[arg(long)]
    pub embedding_file: Option<String>,

    /// Size of a trainable embedding (ignored with --embedding-file)
    #[arg(long, default_value_t = 100)]
    pub embedding_size: usize,

    /// Fixed sequence length; by default the 95th percentile of text lengths
    #[arg(long)]
    pub sequence_length: Option<usize>,

    /// Drop words seen fewer times than this
    #[arg(long, default_value_t = 1)]
    pub min_count: usize,

    /// Keep at most this many words
    #[arg(long)]
    pub max_vocab_size: Option<usize>,
}

/// Architecture hyper-parameters.
#[derive(Args, Debug)]
pub struct ModelArgs {
    /// CNN: number of convolution filters
    #[arg(long, default_value_t = 128)]
    pub filters: usize,

    /// CNN: convolution window in tokens
    #[arg(long, default_value_t = 3)]
    pub kernel_size: usize,

    /// BiLSTM: hidden size per direction
    #[arg(long, default_value_t = 64)]
    pub hidden_size: usize,

    #[arg(long, default_value_t = 0.5)]
    pub dropout: f64,
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
/// The application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            train_file:      a.train_file,
            valid_file:      a.valid_file,
            valid_fraction:  a.valid_fraction,
            output_dir:      a.output_dir,
            architecture:    a.architecture.into(),
            embedding_file:  a.embedding.embedding_file,
            embedding_size:  a.embedding.embedding_size,
            sequence_length: a.embedding.sequence_length,
            min_count:       a.embedding.min_count,
            max_vocab_size:  a.embedding.max_vocab_size,
            batch_size:      a.batch_size,
            epochs:          a.epochs,
            lr:              a.lr,
            filters:         a.model.filters,
            kernel_size:     a.model.kernel_size,
            hidden_size:     a.model.hidden_size,
            dropout:         a.model.dropout,
            seed:            a.seed,
        }
    }
}

/// All arguments for the `predict` command
#[derive(Args, Debug)]
pub struct PredictArgs {
    /// Directory written by `train` or `train-corpus`
    #[arg(long, default_value = "model")]
    pub model_dir: String,

    /// Text to classify; repeat the flag for several texts
    #[arg(long = "text", required = true)]
    pub texts: Vec<String>,
}
