// ============================================================
// ML — Embedding Layer Selection
// ============================================================
// The first layer of every classifier is an embedding lookup.
// Which kind depends on the tokenizer's embedding source:
//
//   Custom      → fresh table [word_num, embedding_size], trained
//                 together with the rest of the network
//   Pretrained  → table initialised from the tokenizer's
//                 embedding matrix, excluded from gradient updates

use burn::{
    module::Param,
    nn::{Embedding, EmbeddingConfig},
    prelude::*,
};

use crate::tokenizer::Tokenizer;

pub fn embedding_layer<B: Backend>(tokenizer: &Tokenizer, device: &B::Device) -> Embedding<B> {
    match tokenizer.get_embedding_matrix() {
        None => {
            let size = tokenizer.embedding().embedding_size();
            tracing::debug!("Trainable embedding: [{}, {}]", tokenizer.word_num(), size);
            EmbeddingConfig::new(tokenizer.word_num(), size).init(device)
        }
        Some(matrix) => {
            tracing::debug!("Frozen embedding: [{}, {}]", matrix.rows, matrix.dim);
            let weight = Tensor::<B, 2>::from_data(
                TensorData::new(matrix.values, [matrix.rows, matrix.dim]),
                device,
            );
            let mut embedding = EmbeddingConfig::new(matrix.rows, matrix.dim).init(device);
            embedding.weight = Param::from_tensor(weight).set_require_grad(false);
            embedding
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::text_input::TextInput;
    use crate::tokenizer::{EmbeddingSource, PretrainedEmbedding, TokenizerConfig};
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    fn corpus() -> (Vec<TextInput>, Vec<String>) {
        (
            vec![TextInput::from("red apple"), TextInput::from("green pear")],
            vec!["fruit".to_string(), "fruit".to_string()],
        )
    }

    #[test]
    fn test_custom_embedding_is_sized_by_vocab() {
        let (x, y) = corpus();
        let cfg = TokenizerConfig {
            sequence_length: Some(3),
            embedding: EmbeddingSource::custom(7),
            ..TokenizerConfig::recommended()
        };
        let tok = Tokenizer::build_with_corpus(&cfg, &x, &y).unwrap();
        let layer = embedding_layer::<TestBackend>(&tok, &Default::default());
        assert_eq!(layer.weight.dims(), [6, 7]);
    }

    #[test]
    fn test_pretrained_embedding_uses_matrix() {
        let (x, y) = corpus();
        let pretrained = PretrainedEmbedding::parse_word2vec("apple 1 2 3\npear 4 5 6\n").unwrap();
        let cfg = TokenizerConfig {
            sequence_length: Some(3),
            embedding: EmbeddingSource::Pretrained(pretrained),
            ..TokenizerConfig::recommended()
        };
        let tok = Tokenizer::build_with_corpus(&cfg, &x, &y).unwrap();
        let layer = embedding_layer::<TestBackend>(&tok, &Default::default());

        assert_eq!(layer.weight.dims(), [4, 3]);
        let values: Vec<f32> = layer.weight.val().into_data().to_vec().unwrap();
        assert_eq!(&values[6..], &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }
}
