// ============================================================
// Application — TrainUseCase
// ============================================================
// Orchestrates a training run from files on disk:
//
//   Step 1: Load labelled TSV examples      (data)
//   Step 2: Pick the validation set         (data)
//   Step 3: Build the tokenizer             (tokenizer)
//   Step 4: Save the run config             (infra)
//   Step 5: Fit the chosen architecture     (ml)
//   Step 6: Save weights + tokenizer        (infra)
//
// `execute_corpus` covers the same ground through a
// LabeledCorpus and `fit_corpus`.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::data::{corpus::LabeledCorpus, loader::TsvLoader, splitter::split_train_val};
use crate::domain::{
    text_input::{unzip_labeled, TextInput},
    traits::ExampleSource,
};
use crate::infra::{checkpoint::CheckpointManager, metrics::MetricsLogger};
use crate::ml::{
    classification::ClassificationModel,
    model::{BiLstmClassifierConfig, CnnClassifierConfig, ModelBuilder},
    trainer::FitOptions,
    DefaultBackend,
};
use crate::tokenizer::{EmbeddingSource, PretrainedEmbedding, Tokenizer, TokenizerConfig};

/// Which network sits on top of the embedding layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Architecture {
    Cnn,
    Blstm,
}

// ─── Training Configuration ──────────────────────────────────────────────────
// Everything a run needs. Saved next to the model so `predict`
// knows which architecture to rebuild.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub train_file:      String,
    pub valid_file:      Option<String>,
    pub valid_fraction:  Option<f64>,
    pub output_dir:      String,
    pub architecture:    Architecture,
    pub embedding_file:  Option<String>,
    pub embedding_size:  usize,
    pub sequence_length: Option<usize>,
    pub min_count:       usize,
    pub max_vocab_size:  Option<usize>,
    pub batch_size:      usize,
    pub epochs:          usize,
    pub lr:              f64,
    pub filters:         usize,
    pub kernel_size:     usize,
    pub hidden_size:     usize,
    pub dropout:         f64,
    pub seed:            Option<u64>,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            train_file:      "data/train.tsv".to_string(),
            valid_file:      None,
            valid_fraction:  None,
            output_dir:      "model".to_string(),
            architecture:    Architecture::Cnn,
            embedding_file:  None,
            embedding_size:  100,
            sequence_length: None,
            min_count:       1,
            max_vocab_size:  None,
            batch_size:      64,
            epochs:          5,
            lr:              1e-3,
            filters:         128,
            kernel_size:     3,
            hidden_size:     64,
            dropout:         0.5,
            seed:            None,
        }
    }
}

impl TrainConfig {
    /// Tokenizer settings; loads pretrained vectors when a file is given.
    pub fn tokenizer_config(&self) -> Result<TokenizerConfig> {
        let embedding = match &self.embedding_file {
            Some(path) => EmbeddingSource::Pretrained(PretrainedEmbedding::from_word2vec_file(path)?),
            None => EmbeddingSource::custom(self.embedding_size),
        };
        Ok(TokenizerConfig {
            sequence_length: self.sequence_length,
            min_count:       self.min_count,
            max_vocab_size:  self.max_vocab_size,
            embedding,
        })
    }

    pub fn cnn(&self) -> CnnClassifierConfig {
        CnnClassifierConfig::new()
            .with_filters(self.filters)
            .with_kernel_size(self.kernel_size)
            .with_dropout(self.dropout)
    }

    pub fn blstm(&self) -> BiLstmClassifierConfig {
        BiLstmClassifierConfig::new()
            .with_hidden_size(self.hidden_size)
            .with_dropout(self.dropout)
    }
}

/// Parallel inputs and labels.
struct Split {
    x: Vec<TextInput>,
    y: Vec<String>,
}

pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Train with `fit` on the train file plus optional validation data.
    pub fn execute(&self) -> Result<()> {
        let cfg = &self.config;

        // ── Step 1-2: examples and validation set ─────────────────────────────
        let examples = TsvLoader::new(&cfg.train_file).load_all()?;
        let (train, valid) = match (&cfg.valid_file, cfg.valid_fraction) {
            (Some(path), _) => (examples, TsvLoader::new(path).load_all()?),
            (None, Some(fraction)) => split_train_val(examples, fraction, cfg.seed),
            (None, None) => (examples, Vec::new()),
        };
        tracing::info!("{} training, {} validation examples", train.len(), valid.len());

        let (x, y) = unzip_labeled(train);
        let (x_val, y_val) = unzip_labeled(valid);
        let train = Split { x, y };
        let valid = Split { x: x_val, y: y_val };

        // ── Step 3: tokenizer over everything the model will see ──────────────
        let all_x = [train.x.as_slice(), valid.x.as_slice()].concat();
        let all_y = [train.y.as_slice(), valid.y.as_slice()].concat();
        let tokenizer = Tokenizer::build_with_corpus(&cfg.tokenizer_config()?, &all_x, &all_y)?;

        // ── Step 4: run config for `predict` ──────────────────────────────────
        CheckpointManager::create(&cfg.output_dir)?.save_config(cfg)?;

        // ── Step 5-6: fit and save ────────────────────────────────────────────
        match cfg.architecture {
            Architecture::Cnn => self.fit_and_save(cfg.cnn(), &train, &valid, tokenizer),
            Architecture::Blstm => self.fit_and_save(cfg.blstm(), &train, &valid, tokenizer),
        }
    }

    /// Train with `fit_corpus` on a corpus read from the train file.
    pub fn execute_corpus(&self) -> Result<()> {
        let cfg = &self.config;
        let corpus = LabeledCorpus::from_source(
            &TsvLoader::new(&cfg.train_file),
            &cfg.tokenizer_config()?,
            cfg.batch_size,
        )?;
        CheckpointManager::create(&cfg.output_dir)?.save_config(cfg)?;

        match cfg.architecture {
            Architecture::Cnn => self.fit_corpus_and_save(cfg.cnn(), &corpus),
            Architecture::Blstm => self.fit_corpus_and_save(cfg.blstm(), &corpus),
        }
    }

    fn fit_and_save<C: ModelBuilder<DefaultBackend>>(
        &self,
        builder:   C,
        train:     &Split,
        valid:     &Split,
        tokenizer: Tokenizer,
    ) -> Result<()> {
        let cfg = &self.config;
        let mut model = ClassificationModel::<DefaultBackend, C>::new(builder, Default::default());

        let validation = if valid.x.is_empty() {
            None
        } else {
            Some((valid.x.as_slice(), valid.y.as_slice()))
        };
        let options = FitOptions::default()
            .with_learning_rate(cfg.lr)
            .with_callback(MetricsLogger::new(&cfg.output_dir)?);

        model.fit(&train.x, &train.y, Some(tokenizer), cfg.batch_size, cfg.epochs, validation, options)?;
        model.save(&cfg.output_dir)
    }

    fn fit_corpus_and_save<C: ModelBuilder<DefaultBackend>>(
        &self,
        builder: C,
        corpus:  &LabeledCorpus,
    ) -> Result<()> {
        let cfg = &self.config;
        let mut model = ClassificationModel::<DefaultBackend, C>::new(builder, Default::default());
        let logger = MetricsLogger::new(&cfg.output_dir)?;

        model.fit_corpus(corpus, cfg.batch_size, cfg.epochs, vec![Box::new(logger)])?;
        model.save(&cfg.output_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_tsv(dir: &std::path::Path, name: &str, rows: usize) -> String {
        let mut text = String::new();
        for i in 0..rows {
            text.push_str(&format!("weather\train cloud {i}\n"));
            text.push_str(&format!("sport\tgoal team {i}\n"));
        }
        let path = dir.join(name);
        fs::write(&path, text).unwrap();
        path.to_string_lossy().into_owned()
    }

    fn config(dir: &std::path::Path) -> TrainConfig {
        TrainConfig {
            train_file: write_tsv(dir, "train.tsv", 5),
            output_dir: dir.join("model").to_string_lossy().into_owned(),
            batch_size: 4,
            epochs: 1,
            filters: 4,
            hidden_size: 4,
            embedding_size: 8,
            ..TrainConfig::default()
        }
    }

    #[test]
    fn test_execute_writes_model_directory() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = TrainConfig { valid_fraction: Some(0.2), seed: Some(3), ..config(dir.path()) };
        TrainUseCase::new(cfg.clone()).execute().unwrap();

        let out = std::path::Path::new(&cfg.output_dir);
        for file in ["train_config.json", "tokenizer.json", "model_config.json", "metrics.csv"] {
            assert!(out.join(file).exists(), "missing {file}");
        }
    }

    #[test]
    fn test_execute_corpus_with_blstm() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = TrainConfig { architecture: Architecture::Blstm, ..config(dir.path()) };
        TrainUseCase::new(cfg.clone()).execute_corpus().unwrap();

        let saved = CheckpointManager::open(&cfg.output_dir).unwrap().load_config().unwrap();
        assert_eq!(saved.architecture, Architecture::Blstm);
    }

    #[test]
    fn test_missing_train_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = TrainConfig { train_file: "/nope.tsv".to_string(), ..config(dir.path()) };
        assert!(TrainUseCase::new(cfg).execute().is_err());
    }
}
