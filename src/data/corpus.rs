// ============================================================
// Data — Corpus
// ============================================================
// A corpus owns its examples and the tokenizer built for them,
// and hands out its own batch stream. `fit_corpus` trains from
// any implementation of this trait.

use anyhow::{ensure, Result};

use crate::data::generator::{BatchGenerator, BatchStream};
use crate::domain::{
    text_input::{unzip_labeled, LabeledText, TextInput},
    traits::ExampleSource,
};
use crate::tokenizer::{Tokenizer, TokenizerConfig};

pub trait Corpus {
    /// The tokenizer the corpus encodes its examples with.
    fn tokenizer(&self) -> &Tokenizer;

    /// Number of examples in one full pass.
    fn data_count(&self) -> usize;

    /// Endless stream of encoded pages.
    fn fit_generator(&self) -> Result<BatchStream<'_>>;
}

/// A labelled corpus held in memory.
pub struct LabeledCorpus {
    x:          Vec<TextInput>,
    y:          Vec<String>,
    tokenizer:  Tokenizer,
    batch_size: usize,
}

impl LabeledCorpus {
    pub fn new(
        examples:   Vec<LabeledText>,
        config:     &TokenizerConfig,
        batch_size: usize,
    ) -> Result<Self> {
        ensure!(!examples.is_empty(), "A corpus needs at least one example");
        ensure!(batch_size > 0, "batch_size must be positive");

        let (x, y) = unzip_labeled(examples);
        let tokenizer = Tokenizer::build_with_corpus(config, &x, &y)?;
        Ok(Self { x, y, tokenizer, batch_size })
    }

    pub fn from_source(
        source:     &dyn ExampleSource,
        config:     &TokenizerConfig,
        batch_size: usize,
    ) -> Result<Self> {
        Self::new(source.load_all()?, config, batch_size)
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }
}

impl Corpus for LabeledCorpus {
    fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    fn data_count(&self) -> usize {
        self.x.len()
    }

    fn fit_generator(&self) -> Result<BatchStream<'_>> {
        let generator = BatchGenerator::new(&self.tokenizer, &self.x, &self.y, self.batch_size)?;
        Ok(Box::new(generator))
    }
}
