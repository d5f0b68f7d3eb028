// ============================================================
// Tokenizer
// ============================================================
// Maps text to token ids and labels to class ids, and describes
// the embedding layer the ids are looked up in.
//
// The word → id mapping itself is a HuggingFace `tokenizers`
// WordLevel model. We build its JSON directly from the corpus
// vocabulary and load it with `Tokenizer::from_bytes`, the same
// way a saved `tokenizer.json` would be loaded:
//
//   normalizer:    Lowercase
//   pre_tokenizer: WhitespaceSplit
//   model:         WordLevel, unk_token = [UNK]
//
// Vocabulary layout:
//   0      [PAD]
//   1      [UNK]
//   2..    words, most frequent first (or pretrained words in
//          file order when a pretrained embedding is used)

pub mod embedding;

use anyhow::{anyhow, ensure, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

use crate::domain::text_input::TextInput;
pub use embedding::{EmbeddingSource, PretrainedEmbedding};

pub const PAD_TOKEN: &str = "[PAD]";
pub const UNK_TOKEN: &str = "[UNK]";
pub const PAD_ID: u32 = 0;
pub const UNK_ID: u32 = 1;

/// Knobs used when building a tokenizer from a corpus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenizerConfig {
    /// Fixed sequence length; `None` derives it from the corpus
    pub sequence_length: Option<usize>,

    /// Words seen fewer times than this are mapped to [UNK]
    pub min_count: usize,

    /// Upper bound on the number of corpus words kept
    pub max_vocab_size: Option<usize>,

    pub embedding: EmbeddingSource,
}

impl TokenizerConfig {
    /// The defaults used when `fit` is called without a tokenizer.
    pub fn recommended() -> Self {
        Self {
            sequence_length: None,
            min_count:       1,
            max_vocab_size:  None,
            embedding:       EmbeddingSource::default(),
        }
    }
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self::recommended()
    }
}

/// A dense `(rows, dim)` matrix, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingMatrix {
    pub rows:   usize,
    pub dim:    usize,
    pub values: Vec<f32>,
}

/// Text ↔ id mapping plus label dictionary and embedding description.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    inner:           tokenizers::Tokenizer,
    vocab:           Vec<String>,
    labels:          Vec<String>,
    label2idx:       HashMap<String, usize>,
    sequence_length: usize,
    embedding:       EmbeddingSource,
}

impl Tokenizer {
    /// Build a tokenizer whose vocabulary and label set come from `x` and `y`.
    pub fn build_with_corpus(
        config: &TokenizerConfig,
        x:      &[TextInput],
        y:      &[String],
    ) -> Result<Self> {
        ensure!(!y.is_empty(), "Cannot build a tokenizer without labels");

        let vocab = match &config.embedding {
            EmbeddingSource::Pretrained(p) => p.words.clone(),
            EmbeddingSource::Custom { .. } => corpus_vocab(config, x),
        };

        let labels: Vec<String> = y.iter().cloned().collect::<BTreeSet<_>>().into_iter().collect();

        let sequence_length = match config.sequence_length {
            Some(len) => len,
            None => recommended_sequence_length(x),
        };

        let tokenizer = Self::from_state(TokenizerState {
            vocab,
            labels,
            sequence_length,
            embedding: config.embedding.clone(),
        })?;

        tracing::info!(
            "Tokenizer built: {} words, {} labels, sequence_length={}",
            tokenizer.word_num(),
            tokenizer.class_num(),
            tokenizer.sequence_length
        );
        Ok(tokenizer)
    }

    /// Rebuild a tokenizer from its serialisable state.
    /// `vocab` holds the words after the two reserved tokens.
    pub fn from_state(state: TokenizerState) -> Result<Self> {
        ensure!(state.sequence_length > 0, "sequence_length must be positive");

        let mut vocab = vec![PAD_TOKEN.to_string(), UNK_TOKEN.to_string()];
        vocab.extend(
            state.vocab.into_iter().filter(|w| w != PAD_TOKEN && w != UNK_TOKEN),
        );

        let inner = word_level_tokenizer(&vocab)?;
        let label2idx = state
            .labels
            .iter()
            .enumerate()
            .map(|(i, label)| (label.clone(), i))
            .collect();

        Ok(Self {
            inner,
            vocab,
            labels: state.labels,
            label2idx,
            sequence_length: state.sequence_length,
            embedding: state.embedding,
        })
    }

    pub fn to_state(&self) -> TokenizerState {
        TokenizerState {
            vocab:           self.vocab[2..].to_vec(),
            labels:          self.labels.clone(),
            sequence_length: self.sequence_length,
            embedding:       self.embedding.clone(),
        }
    }

    /// Token ids for one input, unpadded.
    pub fn word_to_token(&self, text: &TextInput) -> Result<Vec<u32>> {
        match text {
            TextInput::Raw(text) => {
                let encoding = self
                    .inner
                    .encode(text.as_str(), false)
                    .map_err(|e| anyhow!("Tokenisation error: {e}"))?;
                Ok(encoding.get_ids().to_vec())
            }
            // Segments skip the pre-tokenizer, so normalise them here.
            TextInput::Segmented(words) => Ok(words
                .iter()
                .map(|w| self.inner.token_to_id(&w.to_lowercase()).unwrap_or(UNK_ID))
                .collect()),
        }
    }

    /// Class id of a label.
    pub fn label_to_token(&self, label: &str) -> Result<usize> {
        self.label2idx
            .get(label)
            .copied()
            .ok_or_else(|| anyhow!("Unknown label '{label}'"))
    }

    pub fn token_to_label(&self, idx: usize) -> Option<&str> {
        self.labels.get(idx).map(String::as_str)
    }

    /// Vocabulary size, reserved tokens included.
    pub fn word_num(&self) -> usize {
        self.vocab.len()
    }

    pub fn class_num(&self) -> usize {
        self.labels.len()
    }

    pub fn sequence_length(&self) -> usize {
        self.sequence_length
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn embedding(&self) -> &EmbeddingSource {
        &self.embedding
    }

    pub fn word2idx(&self) -> HashMap<String, u32> {
        self.inner.get_vocab(false)
    }

    /// The frozen embedding table, one row per token id.
    /// `None` for a custom (trainable) embedding.
    pub fn get_embedding_matrix(&self) -> Option<EmbeddingMatrix> {
        let EmbeddingSource::Pretrained(pretrained) = &self.embedding else {
            return None;
        };
        let dim = pretrained.dim;

        // Reserved rows stay zero; every other row is a pretrained word.
        let mut values = vec![0.0f32; 2 * dim];
        for i in 0..pretrained.len() {
            if pretrained.words[i] != PAD_TOKEN && pretrained.words[i] != UNK_TOKEN {
                values.extend_from_slice(pretrained.vector(i));
            }
        }

        Some(EmbeddingMatrix { rows: self.word_num(), dim, values })
    }

    /// Save the underlying HuggingFace tokenizer, e.g. for inspection.
    pub fn save_word_level(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        let path = path.as_ref();
        self.inner
            .save(path, true)
            .map_err(|e| anyhow!("Cannot write tokenizer to '{}': {e}", path.display()))
    }
}

/// What gets persisted for a tokenizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenizerState {
    pub vocab:           Vec<String>,
    pub labels:          Vec<String>,
    pub sequence_length: usize,
    pub embedding:       EmbeddingSource,
}

/// Words of the corpus, most frequent first, ties broken alphabetically.
fn corpus_vocab(config: &TokenizerConfig, x: &[TextInput]) -> Vec<String> {
    let mut freq: HashMap<String, usize> = HashMap::new();
    for text in x {
        for word in normalized_words(text) {
            *freq.entry(word).or_insert(0) += 1;
        }
    }

    let mut words: Vec<(String, usize)> = freq
        .into_iter()
        .filter(|(_, count)| *count >= config.min_count)
        .collect();
    words.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    if let Some(max) = config.max_vocab_size {
        words.truncate(max);
    }
    words.into_iter().map(|(w, _)| w).collect()
}

fn normalized_words(text: &TextInput) -> Vec<String> {
    match text {
        TextInput::Raw(text) => text.to_lowercase().split_whitespace().map(str::to_string).collect(),
        TextInput::Segmented(words) => words.iter().map(|w| w.to_lowercase()).collect(),
    }
}

/// Length covering 95% of the corpus inputs.
fn recommended_sequence_length(x: &[TextInput]) -> usize {
    let mut lengths: Vec<usize> = x.iter().map(TextInput::word_count).collect();
    if lengths.is_empty() {
        return 1;
    }
    lengths.sort_unstable();
    let idx = ((lengths.len() as f64) * 0.95).ceil() as usize;
    lengths[idx.clamp(1, lengths.len()) - 1].max(1)
}

fn word_level_tokenizer(vocab: &[String]) -> Result<tokenizers::Tokenizer> {
    let vocab_json: serde_json::Map<String, serde_json::Value> = vocab
        .iter()
        .enumerate()
        .map(|(id, word)| (word.clone(), serde_json::json!(id)))
        .collect();

    let tokenizer_json = serde_json::json!({
        "version": "1.0",
        "truncation": null,
        "padding": null,
        "added_tokens": [
            {"id": PAD_ID, "content": PAD_TOKEN, "single_word": false, "lstrip": false, "rstrip": false, "normalized": false, "special": true},
            {"id": UNK_ID, "content": UNK_TOKEN, "single_word": false, "lstrip": false, "rstrip": false, "normalized": false, "special": true}
        ],
        "normalizer": { "type": "Lowercase" },
        "pre_tokenizer": { "type": "WhitespaceSplit" },
        "post_processor": null,
        "decoder": null,
        "model": {
            "type": "WordLevel",
            "vocab": vocab_json,
            "unk_token": UNK_TOKEN
        }
    });

    let bytes = serde_json::to_vec(&tokenizer_json).context("Cannot serialise tokenizer JSON")?;
    tokenizers::Tokenizer::from_bytes(bytes).map_err(|e| anyhow!("Cannot build tokenizer: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> (Vec<TextInput>, Vec<String>) {
        let x = vec![
            TextInput::from("the cat sat"),
            TextInput::from("The dog sat down"),
            TextInput::from(vec!["a", "cat"]),
        ];
        let y = vec!["pets".to_string(), "pets".to_string(), "other".to_string()];
        (x, y)
    }

    fn custom_config(len: usize) -> TokenizerConfig {
        TokenizerConfig { sequence_length: Some(len), ..TokenizerConfig::recommended() }
    }

    #[test]
    fn test_vocab_is_frequency_ordered() {
        let (x, y) = corpus();
        let tok = Tokenizer::build_with_corpus(&custom_config(4), &x, &y).unwrap();
        let vocab = tok.word2idx();
        assert_eq!(vocab[PAD_TOKEN], PAD_ID);
        assert_eq!(vocab[UNK_TOKEN], UNK_ID);
        // cat, sat and the appear twice; alphabetical among ties
        assert_eq!(vocab["cat"], 2);
        assert_eq!(vocab["sat"], 3);
        assert_eq!(vocab["the"], 4);
        assert_eq!(tok.word_num(), 8);
    }

    #[test]
    fn test_raw_and_segmented_agree() {
        let (x, y) = corpus();
        let tok = Tokenizer::build_with_corpus(&custom_config(4), &x, &y).unwrap();
        let raw = tok.word_to_token(&TextInput::from("The CAT sat")).unwrap();
        let seg = tok.word_to_token(&TextInput::from(vec!["the", "cat", "Sat"])).unwrap();
        assert_eq!(raw, seg);
    }

    #[test]
    fn test_unknown_words_map_to_unk() {
        let (x, y) = corpus();
        let tok = Tokenizer::build_with_corpus(&custom_config(4), &x, &y).unwrap();
        let ids = tok.word_to_token(&TextInput::from("zebra cat")).unwrap();
        assert_eq!(ids, vec![UNK_ID, 2]);
    }

    #[test]
    fn test_labels_are_sorted() {
        let (x, y) = corpus();
        let tok = Tokenizer::build_with_corpus(&custom_config(4), &x, &y).unwrap();
        assert_eq!(tok.class_num(), 2);
        assert_eq!(tok.label_to_token("other").unwrap(), 0);
        assert_eq!(tok.label_to_token("pets").unwrap(), 1);
        assert_eq!(tok.token_to_label(1), Some("pets"));
        assert!(tok.label_to_token("cars").is_err());
    }

    #[test]
    fn test_min_count_and_max_vocab() {
        let (x, y) = corpus();
        let cfg = TokenizerConfig { min_count: 2, ..custom_config(4) };
        let tok = Tokenizer::build_with_corpus(&cfg, &x, &y).unwrap();
        assert_eq!(tok.word_num(), 5);

        let cfg = TokenizerConfig { max_vocab_size: Some(1), ..custom_config(4) };
        let tok = Tokenizer::build_with_corpus(&cfg, &x, &y).unwrap();
        assert_eq!(tok.word_num(), 3);
    }

    #[test]
    fn test_recommended_sequence_length() {
        let (x, y) = corpus();
        let tok = Tokenizer::build_with_corpus(&TokenizerConfig::recommended(), &x, &y).unwrap();
        assert_eq!(tok.sequence_length(), 4);
    }

    #[test]
    fn test_custom_embedding_has_no_matrix() {
        let (x, y) = corpus();
        let tok = Tokenizer::build_with_corpus(&custom_config(4), &x, &y).unwrap();
        assert!(tok.get_embedding_matrix().is_none());
    }

    #[test]
    fn test_pretrained_embedding_matrix() {
        let (x, y) = corpus();
        let pretrained = PretrainedEmbedding::parse_word2vec("cat 1 2\ndog 3 4\n").unwrap();
        let cfg = TokenizerConfig {
            embedding: EmbeddingSource::Pretrained(pretrained),
            ..custom_config(4)
        };
        let tok = Tokenizer::build_with_corpus(&cfg, &x, &y).unwrap();
        assert_eq!(tok.word_num(), 4);
        assert_eq!(tok.word_to_token(&TextInput::from("dog sat")).unwrap(), vec![3, UNK_ID]);

        let matrix = tok.get_embedding_matrix().unwrap();
        assert_eq!((matrix.rows, matrix.dim), (4, 2));
        assert_eq!(matrix.values, vec![0.0, 0.0, 0.0, 0.0, 1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_state_round_trip_keeps_ids() {
        let (x, y) = corpus();
        let tok = Tokenizer::build_with_corpus(&custom_config(4), &x, &y).unwrap();
        let json = serde_json::to_string(&tok.to_state()).unwrap();
        let restored = Tokenizer::from_state(serde_json::from_str(&json).unwrap()).unwrap();
        assert_eq!(restored.word2idx(), tok.word2idx());
        assert_eq!(restored.labels(), tok.labels());
    }
}
