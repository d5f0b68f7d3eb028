// ============================================================
// Data — Batch Generator
// ============================================================
// Turns parallel (x, y) slices into an endless stream of encoded
// pages. Each full pass over the data visits every page exactly
// once, in a freshly shuffled order:
//
//   pass 1: page 2, page 0, page 1
//   pass 2: page 1, page 2, page 0
//   ...
//
// A page is `batch_size` consecutive items (the last page may be
// shorter). Every item is tokenized, padded to the tokenizer's
// sequence length, and its label one-hot encoded.
//
// The stream never ends on its own; the trainer decides how many
// pages make an epoch.

use anyhow::{ensure, Result};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

use crate::domain::text_input::TextInput;
use crate::tokenizer::{Tokenizer, PAD_ID};

/// Any stream of encoded pages the trainer can consume.
pub type BatchStream<'a> = Box<dyn Iterator<Item = Result<Vec<EncodedSample>>> + 'a>;

/// One tokenized, padded and one-hot labelled example.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedSample {
    /// Exactly `sequence_length` ids
    pub token_ids: Vec<u32>,

    /// Exactly `class_num` entries, a single 1
    pub one_hot: Vec<u32>,
}

/// Pad or truncate to `maxlen`. Padding is prepended and overlong
/// sequences lose their leading ids, so the end of a text is kept.
pub fn pad_sequence(ids: &[u32], maxlen: usize) -> Vec<u32> {
    if ids.len() >= maxlen {
        return ids[ids.len() - maxlen..].to_vec();
    }
    let mut padded = vec![PAD_ID; maxlen - ids.len()];
    padded.extend_from_slice(ids);
    padded
}

/// One-hot vector of width `num_classes` with a 1 at `class`.
pub fn to_categorical(class: usize, num_classes: usize) -> Vec<u32> {
    let mut row = vec![0u32; num_classes];
    if let Some(slot) = row.get_mut(class) {
        *slot = 1;
    }
    row
}

/// Token ids of `text`, padded for the model.
pub fn encode_text(tokenizer: &Tokenizer, text: &TextInput) -> Result<Vec<u32>> {
    let ids = tokenizer.word_to_token(text)?;
    Ok(pad_sequence(&ids, tokenizer.sequence_length()))
}

pub fn encode_sample(tokenizer: &Tokenizer, text: &TextInput, label: &str) -> Result<EncodedSample> {
    let class = tokenizer.label_to_token(label)?;
    Ok(EncodedSample {
        token_ids: encode_text(tokenizer, text)?,
        one_hot:   to_categorical(class, tokenizer.class_num()),
    })
}

/// Endless, shuffled page iterator over `(x, y)`.
pub struct BatchGenerator<'a> {
    tokenizer:  &'a Tokenizer,
    x:          &'a [TextInput],
    y:          &'a [String],
    batch_size: usize,
    pending:    Vec<usize>,
    rng:        StdRng,
}

impl<'a> BatchGenerator<'a> {
    pub fn new(
        tokenizer:  &'a Tokenizer,
        x:          &'a [TextInput],
        y:          &'a [String],
        batch_size: usize,
    ) -> Result<Self> {
        ensure!(
            x.len() == y.len(),
            "Inputs and labels differ in length: {} vs {}",
            x.len(),
            y.len()
        );
        ensure!(batch_size > 0, "batch_size must be positive");

        // Fail now rather than in the middle of an epoch.
        for label in y {
            tokenizer.label_to_token(label)?;
        }

        Ok(Self {
            tokenizer,
            x,
            y,
            batch_size,
            pending: Vec::new(),
            rng: StdRng::from_entropy(),
        })
    }

    /// Make the page order reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Pages per full pass.
    pub fn page_count(&self) -> usize {
        self.x.len().div_ceil(self.batch_size)
    }

    fn encode_page(&self, page: usize) -> Result<Vec<EncodedSample>> {
        let start = page * self.batch_size;
        let end   = (start + self.batch_size).min(self.x.len());
        self.x[start..end]
            .iter()
            .zip(&self.y[start..end])
            .map(|(text, label)| encode_sample(self.tokenizer, text, label))
            .collect()
    }
}

impl Iterator for BatchGenerator<'_> {
    type Item = Result<Vec<EncodedSample>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.x.is_empty() {
            return None;
        }
        if self.pending.is_empty() {
            self.pending = (0..self.page_count()).collect();
            self.pending.shuffle(&mut self.rng);
            tracing::trace!("Starting a new pass over {} pages", self.pending.len());
        }
        let page = self.pending.pop()?;
        Some(self.encode_page(page))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::TokenizerConfig;
    use std::collections::HashSet;

    fn dataset(n: usize) -> (Vec<TextInput>, Vec<String>) {
        let x = (0..n).map(|i| TextInput::from(format!("word{i} common"))).collect();
        let y = (0..n).map(|i| format!("label{}", i % 3)).collect();
        (x, y)
    }

    fn tokenizer(x: &[TextInput], y: &[String], len: usize) -> Tokenizer {
        let cfg = TokenizerConfig { sequence_length: Some(len), ..TokenizerConfig::recommended() };
        Tokenizer::build_with_corpus(&cfg, x, y).unwrap()
    }

    #[test]
    fn test_pad_sequence_prepends_zeros() {
        assert_eq!(pad_sequence(&[5, 6], 4), vec![0, 0, 5, 6]);
    }

    #[test]
    fn test_pad_sequence_keeps_tail_when_truncating() {
        assert_eq!(pad_sequence(&[1, 2, 3, 4, 5], 3), vec![3, 4, 5]);
        assert_eq!(pad_sequence(&[], 2), vec![0, 0]);
    }

    #[test]
    fn test_to_categorical() {
        assert_eq!(to_categorical(2, 4), vec![0, 0, 1, 0]);
    }

    #[test]
    fn test_full_pass_covers_every_item_once() {
        let (x, y) = dataset(23);
        let tok = tokenizer(&x, &y, 3);
        let mut gen = BatchGenerator::new(&tok, &x, &y, 5).unwrap().with_seed(7);
        assert_eq!(gen.page_count(), 5);

        let mut seen = HashSet::new();
        let mut total = 0;
        for _ in 0..gen.page_count() {
            let page = gen.next().unwrap().unwrap();
            total += page.len();
            for sample in page {
                seen.insert(sample.token_ids);
            }
        }
        assert_eq!(total, 23);
        assert_eq!(seen.len(), 23);
    }

    #[test]
    fn test_generator_is_endless() {
        let (x, y) = dataset(4);
        let tok = tokenizer(&x, &y, 3);
        let gen = BatchGenerator::new(&tok, &x, &y, 2).unwrap();
        let total: usize = gen.take(10).map(|page| page.unwrap().len()).sum();
        assert_eq!(total, 20);
    }

    #[test]
    fn test_shapes_follow_tokenizer() {
        let (x, y) = dataset(10);
        let tok = tokenizer(&x, &y, 6);
        let gen = BatchGenerator::new(&tok, &x, &y, 4).unwrap();
        for page in gen.take(6) {
            for sample in page.unwrap() {
                assert_eq!(sample.token_ids.len(), tok.sequence_length());
                assert_eq!(sample.one_hot.len(), tok.class_num());
                assert_eq!(sample.one_hot.iter().sum::<u32>(), 1);
            }
        }
    }

    #[test]
    fn test_empty_dataset_yields_nothing() {
        let (x, y) = dataset(3);
        let tok = tokenizer(&x, &y, 2);
        let mut gen = BatchGenerator::new(&tok, &[], &[], 4).unwrap();
        assert!(gen.next().is_none());
    }

    #[test]
    fn test_rejects_mismatched_lengths() {
        let (x, y) = dataset(3);
        let tok = tokenizer(&x, &y, 2);
        assert!(BatchGenerator::new(&tok, &x, &y[..2], 1).is_err());
    }

    #[test]
    fn test_rejects_unknown_labels() {
        let (x, y) = dataset(3);
        let tok = tokenizer(&x, &y, 2);
        let bad = vec!["label0".to_string(), "nope".to_string(), "label1".to_string()];
        assert!(BatchGenerator::new(&tok, &x, &bad, 1).is_err());
    }
}
