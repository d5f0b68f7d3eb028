// ============================================================
// Tokenizer — Embedding Sources
// ============================================================
// A tokenizer carries the description of the embedding layer its
// ids feed into. Either the model learns the table from scratch
// (Custom), or it looks ids up in a fixed table of pretrained word
// vectors (Pretrained).
//
// Pretrained vectors are read from the word2vec text format:
//
//   3 4                      <- optional header: word count, dim
//   the 0.1 0.2 0.3 0.4
//   cat 0.5 0.1 0.0 0.9
//   sat 0.2 0.2 0.7 0.1

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::{collections::HashSet, fs, path::Path};

/// Where the embedding layer's weights come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EmbeddingSource {
    /// A trainable table sized by the tokenizer's vocabulary
    Custom { embedding_size: usize },

    /// A frozen table initialised from pretrained vectors
    Pretrained(PretrainedEmbedding),
}

impl EmbeddingSource {
    pub fn custom(embedding_size: usize) -> Self {
        EmbeddingSource::Custom { embedding_size }
    }

    /// Width of one embedding vector.
    pub fn embedding_size(&self) -> usize {
        match self {
            EmbeddingSource::Custom { embedding_size } => *embedding_size,
            EmbeddingSource::Pretrained(p) => p.dim,
        }
    }

    pub fn is_trainable(&self) -> bool {
        matches!(self, EmbeddingSource::Custom { .. })
    }
}

impl Default for EmbeddingSource {
    fn default() -> Self {
        EmbeddingSource::custom(100)
    }
}

/// Pretrained word vectors, stored row-major: `vectors[i*dim..(i+1)*dim]`
/// belongs to `words[i]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PretrainedEmbedding {
    pub words:   Vec<String>,
    pub dim:     usize,
    pub vectors: Vec<f32>,
}

impl PretrainedEmbedding {
    /// Load vectors from a word2vec text file.
    pub fn from_word2vec_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("Cannot read embedding file '{}'", path.display()))?;
        let embedding = Self::parse_word2vec(&text)
            .with_context(|| format!("Malformed embedding file '{}'", path.display()))?;
        tracing::info!(
            "Loaded {} pretrained vectors (dim={}) from '{}'",
            embedding.len(),
            embedding.dim,
            path.display()
        );
        Ok(embedding)
    }

    /// Parse word2vec text. Words are lowercased to match the tokenizer's
    /// normalizer; the first occurrence of a duplicated word wins.
    pub fn parse_word2vec(text: &str) -> Result<Self> {
        let mut words   = Vec::new();
        let mut vectors = Vec::new();
        let mut seen    = HashSet::new();
        let mut dim     = None;

        for (line_no, line) in text.lines().enumerate() {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.is_empty() {
                continue;
            }
            if line_no == 0 && is_header(&fields) {
                continue;
            }
            if fields.len() < 2 {
                bail!("line {}: expected a word followed by its vector", line_no + 1);
            }

            let values = fields[1..]
                .iter()
                .map(|v| v.parse::<f32>())
                .collect::<Result<Vec<f32>, _>>()
                .with_context(|| format!("line {}: vector is not numeric", line_no + 1))?;

            match dim {
                None => dim = Some(values.len()),
                Some(d) if d != values.len() => bail!(
                    "line {}: expected {} values, found {}",
                    line_no + 1, d, values.len()
                ),
                Some(_) => {}
            }

            let word = fields[0].to_lowercase();
            if seen.insert(word.clone()) {
                words.push(word);
                vectors.extend(values);
            }
        }

        let Some(dim) = dim else {
            bail!("no vectors found");
        };
        Ok(Self { words, dim, vectors })
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// The vector of the `i`-th word.
    pub fn vector(&self, i: usize) -> &[f32] {
        &self.vectors[i * self.dim..(i + 1) * self.dim]
    }
}

fn is_header(fields: &[&str]) -> bool {
    fields.len() == 2 && fields.iter().all(|f| f.parse::<usize>().is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_header() {
        let e = PretrainedEmbedding::parse_word2vec("2 3\nthe 0.1 0.2 0.3\nCat 1 2 3\n").unwrap();
        assert_eq!(e.dim, 3);
        assert_eq!(e.words, vec!["the", "cat"]);
        assert_eq!(e.vector(1), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_parse_without_header_and_duplicates() {
        let e = PretrainedEmbedding::parse_word2vec("a 1 2\nb 3 4\na 5 6\n").unwrap();
        assert_eq!(e.len(), 2);
        assert_eq!(e.vector(0), &[1.0, 2.0]);
    }

    #[test]
    fn test_rejects_ragged_vectors() {
        let err = PretrainedEmbedding::parse_word2vec("a 1 2\nb 3\n").unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_rejects_empty_input() {
        assert!(PretrainedEmbedding::parse_word2vec("\n\n").is_err());
    }

    #[test]
    fn test_embedding_size() {
        assert_eq!(EmbeddingSource::custom(64).embedding_size(), 64);
        assert!(EmbeddingSource::default().is_trainable());
    }
}
