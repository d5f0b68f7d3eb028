// ============================================================
// ML — Classification Model
// ============================================================
// The coordinator the rest of the crate talks to. It owns the
// active tokenizer and (once built) the network, and wires the
// pieces together:
//
//   tokenizer ──► embedding layer ──► ModelBuilder ──► network
//        │                                               │
//        └──► BatchGenerator (train / validation) ──► fit_generator
//
// The network is built lazily on the first `fit` and reused by
// later calls. `fit_corpus` always rebuilds it, because the
// corpus brings its own tokenizer.

use anyhow::{anyhow, ensure, Result};
use burn::{module::AutodiffModule, nn::Embedding, prelude::*, tensor::backend::AutodiffBackend};
use std::path::Path;

use crate::data::{
    batcher::stack_rows,
    corpus::Corpus,
    generator::{encode_text, BatchGenerator},
};
use crate::domain::text_input::TextInput;
use crate::infra::{checkpoint::CheckpointManager, metrics::EpochMetrics};
use crate::ml::{
    embedding::embedding_layer,
    model::{Classifier, ModelBuilder},
    trainer::{fit_generator, FitOptions, TrainCallback, Validation},
};
use crate::tokenizer::{Tokenizer, TokenizerConfig};

const PREDICT_BATCH_SIZE: usize = 256;

/// Batch size actually used for a dataset of `data_len` items.
/// A batch larger than the dataset shrinks to half of it.
pub fn effective_batch_size(data_len: usize, batch_size: usize) -> usize {
    if data_len < batch_size {
        (data_len / 2).max(1)
    } else {
        batch_size.max(1)
    }
}

pub struct ClassificationModel<B: AutodiffBackend, C: ModelBuilder<B>> {
    builder:   C,
    device:    B::Device,
    tokenizer: Option<Tokenizer>,
    model:     Option<C::Model>,
    /// `(word_num, class_num)` the current network was built for
    shape:     Option<(usize, usize)>,
    history:   Vec<EpochMetrics>,
}

impl<B: AutodiffBackend, C: ModelBuilder<B>> ClassificationModel<B, C> {
    pub fn new(builder: C, device: B::Device) -> Self {
        Self { builder, device, tokenizer: None, model: None, shape: None, history: Vec::new() }
    }

    pub fn tokenizer(&self) -> Option<&Tokenizer> {
        self.tokenizer.as_ref()
    }

    pub fn model(&self) -> Option<&C::Model> {
        self.model.as_ref()
    }

    pub fn builder(&self) -> &C {
        &self.builder
    }

    pub fn is_built(&self) -> bool {
        self.model.is_some()
    }

    /// Metrics of every epoch trained so far, across fits.
    pub fn history(&self) -> &[EpochMetrics] {
        &self.history
    }

    fn active_tokenizer(&self) -> Result<&Tokenizer> {
        self.tokenizer
            .as_ref()
            .ok_or_else(|| anyhow!("No tokenizer set; call fit or fit_corpus first"))
    }

    /// Embedding layer matching the active tokenizer.
    pub fn prepare_embedding_layer(&self) -> Result<Embedding<B>> {
        Ok(embedding_layer(self.active_tokenizer()?, &self.device))
    }

    /// (Re)build the network for the active tokenizer.
    pub fn build_model(&mut self) -> Result<()> {
        let embedding = self.prepare_embedding_layer()?;
        let tokenizer = self.active_tokenizer()?;
        let model = self.builder.build(embedding, tokenizer, &self.device);
        tracing::info!(
            "Built {} classifier with {} parameters",
            self.builder.name(),
            model.num_params()
        );
        self.shape = Some((tokenizer.word_num(), tokenizer.class_num()));
        self.model = Some(model);
        Ok(())
    }

    /// Endless shuffled pages over `(x, y)`, encoded with the active tokenizer.
    pub fn data_generator<'a>(
        &'a self,
        x:          &'a [TextInput],
        y:          &'a [String],
        batch_size: usize,
    ) -> Result<BatchGenerator<'a>> {
        BatchGenerator::new(self.active_tokenizer()?, x, y, batch_size)
    }

    /// Train on `(x_train, y_train)`.
    ///
    /// Without a `tokenizer`, one is built from the training and
    /// validation data with [`TokenizerConfig::recommended`].
    #[allow(clippy::too_many_arguments)]
    pub fn fit(
        &mut self,
        x_train:     &[TextInput],
        y_train:     &[String],
        tokenizer:   Option<Tokenizer>,
        batch_size:  usize,
        epochs:      usize,
        validation:  Option<(&[TextInput], &[String])>,
        mut options: FitOptions,
    ) -> Result<()> {
        ensure!(
            x_train.len() == y_train.len(),
            "x_train and y_train differ in length: {} vs {}",
            x_train.len(),
            y_train.len()
        );
        ensure!(!x_train.is_empty(), "Cannot fit on an empty dataset");
        if let Some((x_val, y_val)) = validation {
            ensure!(
                x_val.len() == y_val.len(),
                "x_validate and y_validate differ in length: {} vs {}",
                x_val.len(),
                y_val.len()
            );
        }

        let tokenizer = match tokenizer {
            Some(tokenizer) => tokenizer,
            None => {
                let mut x_data = x_train.to_vec();
                let mut y_data = y_train.to_vec();
                if let Some((x_val, y_val)) = validation {
                    x_data.extend_from_slice(x_val);
                    y_data.extend_from_slice(y_val);
                }
                Tokenizer::build_with_corpus(&TokenizerConfig::recommended(), &x_data, &y_data)?
            }
        };

        // A reused network only fits a tokenizer of the same shape.
        if let (Some(_), Some((word_num, class_num))) = (&self.model, self.shape) {
            ensure!(
                tokenizer.word_num() == word_num && tokenizer.class_num() == class_num,
                "The built model expects {} words and {} classes, but the tokenizer has {} words \
                 and {} classes; use fit_corpus or a new ClassificationModel to retrain",
                word_num,
                class_num,
                tokenizer.word_num(),
                tokenizer.class_num()
            );
        }

        let batch_size = effective_batch_size(x_train.len(), batch_size);
        self.tokenizer = Some(tokenizer);
        if self.model.is_none() {
            self.build_model()?;
        }

        // Borrow the field, not `self`: the model is taken out below.
        let tokenizer = self
            .tokenizer
            .as_ref()
            .ok_or_else(|| anyhow!("No tokenizer set"))?;
        let train = BatchGenerator::new(tokenizer, x_train, y_train, batch_size)?;
        let steps_per_epoch = x_train.len() / batch_size;

        let validation = match validation {
            Some((x_val, y_val)) if !x_val.is_empty() => Some(Validation {
                batches: Box::new(BatchGenerator::new(tokenizer, x_val, y_val, batch_size)?),
                steps:   (x_val.len() / batch_size).max(1),
            }),
            _ => None,
        };

        tracing::info!(
            "Fitting on {} samples: batch_size={}, steps_per_epoch={}, epochs={}",
            x_train.len(),
            batch_size,
            steps_per_epoch,
            epochs
        );

        let model = self.model.take().ok_or_else(|| anyhow!("Model was not built"))?;
        let (model, history) = fit_generator::<B, C::Model>(
            model,
            Box::new(train),
            steps_per_epoch,
            epochs,
            validation,
            &mut options,
            &self.device,
        )?;
        self.model = Some(model);
        self.history.extend(history);
        Ok(())
    }

    /// Train on a corpus's own batch stream. The corpus tokenizer
    /// replaces the active one and the network is rebuilt for it.
    pub fn fit_corpus(
        &mut self,
        corpus:     &dyn Corpus,
        batch_size: usize,
        epochs:     usize,
        callbacks:  Vec<Box<dyn TrainCallback>>,
    ) -> Result<()> {
        self.tokenizer = Some(corpus.tokenizer().clone());
        self.build_model()?;

        let train = corpus.fit_generator()?;
        let steps_per_epoch = (corpus.data_count() / batch_size.max(1)).max(1);
        let mut options = FitOptions { callbacks, ..FitOptions::default() };

        tracing::info!(
            "Fitting on corpus of {} samples: steps_per_epoch={}, epochs={}",
            corpus.data_count(),
            steps_per_epoch,
            epochs
        );

        let model = self.model.take().ok_or_else(|| anyhow!("Model was not built"))?;
        let (model, history) = fit_generator::<B, C::Model>(
            model,
            train,
            steps_per_epoch,
            epochs,
            None,
            &mut options,
            &self.device,
        )?;
        self.model = Some(model);
        self.history.extend(history);
        Ok(())
    }

    /// Most likely label for every input.
    pub fn predict(&self, x: &[TextInput]) -> Result<Vec<String>> {
        let model = self
            .model
            .as_ref()
            .ok_or_else(|| anyhow!("Model is not built; call fit first"))?;
        let tokenizer = self.active_tokenizer()?;
        let model = model.valid();

        let mut labels = Vec::with_capacity(x.len());
        for chunk in x.chunks(PREDICT_BATCH_SIZE) {
            let rows = chunk
                .iter()
                .map(|text| encode_text(tokenizer, text))
                .collect::<Result<Vec<_>>>()?;
            let tokens = stack_rows::<B::InnerBackend>(&rows, &self.device);

            let ids: Vec<i64> = model
                .forward(tokens)
                .argmax(1)
                .into_data()
                .convert::<i64>()
                .to_vec()
                .map_err(|e| anyhow!("Cannot read predictions: {e:?}"))?;

            for id in ids {
                let label = tokenizer
                    .token_to_label(id as usize)
                    .ok_or_else(|| anyhow!("Predicted class {id} has no label"))?;
                labels.push(label.to_string());
            }
        }
        Ok(labels)
    }

    /// Write weights, tokenizer and architecture to `dir`.
    pub fn save(&self, dir: impl AsRef<Path>) -> Result<()> {
        let model = self
            .model
            .as_ref()
            .ok_or_else(|| anyhow!("Nothing to save; the model is not built"))?;
        let ckpt = CheckpointManager::create(dir)?;
        ckpt.save_tokenizer(self.active_tokenizer()?)?;
        ckpt.save_model_config(&self.builder)?;
        ckpt.save_model::<B, _>(model)?;
        tracing::info!("Model saved to '{}'", ckpt.dir().display());
        Ok(())
    }

    /// Restore a model written by [`ClassificationModel::save`].
    pub fn load(dir: impl AsRef<Path>, device: B::Device) -> Result<Self> {
        let ckpt = CheckpointManager::open(dir)?;
        let builder: C = ckpt.load_model_config()?;

        let mut this = Self::new(builder, device);
        this.tokenizer = Some(ckpt.load_tokenizer()?);
        this.build_model()?;

        let model = this.model.take().ok_or_else(|| anyhow!("Model was not built"))?;
        this.model = Some(ckpt.load_model::<B, _>(model, &this.device)?);
        tracing::info!("Model loaded from '{}'", ckpt.dir().display());
        Ok(this)
    }
}
