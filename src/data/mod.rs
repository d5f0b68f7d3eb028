// ============================================================
// Data Pipeline
// ============================================================
// Everything between a labelled file and a tensor batch:
//
//   .tsv file
//       │
//       ▼
//   TsvLoader          → reads `label<TAB>text` lines
//       │
//       ▼
//   split_train_val    → optional held-out validation set
//       │
//       ▼
//   BatchGenerator     → shuffled pages, tokenized, padded, one-hot
//       │
//       ▼
//   ClassificationBatcher → stacks a page into tensors
//
// LabeledCorpus bundles examples, tokenizer and generator for
// `fit_corpus`.

/// Reads labelled examples from TSV files
pub mod loader;

/// Shuffles and splits data into train/validation sets
pub mod splitter;

/// Endless shuffled page iterator with padding and one-hot labels
pub mod generator;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;

/// Corpus trait and the in-memory labelled corpus
pub mod corpus;
