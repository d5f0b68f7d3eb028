// ============================================================
// ML — Classifier Architectures
// ============================================================
// Every classifier is an embedding layer followed by a small
// network that ends in a dense layer of `class_num` logits:
//
//   CNN:    embedding → conv1d → relu → max over time → dense
//   BiLSTM: embedding → bidirectional LSTM → mean over time → dense
//
// The architecture configs double as `ModelBuilder`s, so the
// coordinator can build either one around the tokenizer's
// embedding layer.

use burn::{
    module::AutodiffModule,
    nn::{
        conv::{Conv1d, Conv1dConfig},
        loss::CrossEntropyLossConfig,
        BiLstm, BiLstmConfig, Dropout, DropoutConfig, Embedding, Linear, LinearConfig,
        PaddingConfig1d,
    },
    prelude::*,
    tensor::{activation, backend::AutodiffBackend},
};

use crate::data::batcher::ClassificationBatch;
use crate::tokenizer::Tokenizer;

/// Loss and predictions for one batch.
pub struct ClassificationOutput<B: Backend> {
    pub loss:    Tensor<B, 1>,
    pub logits:  Tensor<B, 2>,
    pub targets: Tensor<B, 2, Int>,
}

/// A network mapping padded token ids to class logits.
pub trait Classifier<B: Backend>: Module<B> {
    /// tokens: [batch, seq_len] → logits: [batch, class_num]
    fn forward(&self, tokens: Tensor<B, 2, Int>) -> Tensor<B, 2>;

    fn forward_classification(&self, batch: ClassificationBatch<B>) -> ClassificationOutput<B> {
        let logits = self.forward(batch.tokens);
        let loss   = categorical_cross_entropy(logits.clone(), batch.targets.clone());
        ClassificationOutput { loss, logits, targets: batch.targets }
    }
}

/// Cross-entropy of `logits` against one-hot `targets`, averaged over the batch.
pub fn categorical_cross_entropy<B: Backend>(
    logits:  Tensor<B, 2>,
    targets: Tensor<B, 2, Int>,
) -> Tensor<B, 1> {
    let [batch, _] = targets.dims();
    let classes = targets.argmax(1).reshape([batch]);
    CrossEntropyLossConfig::new()
        .init(&logits.device())
        .forward(logits, classes)
}

/// Hyper-parameters that know how to assemble a classifier around an
/// embedding layer. Implemented by the architecture configs below.
pub trait ModelBuilder<B: AutodiffBackend>: Config {
    type Model: AutodiffModule<B, InnerModule = Self::Inner> + Classifier<B>;
    type Inner: Classifier<B::InnerBackend>;

    fn name(&self) -> &'static str;

    fn build(
        &self,
        embedding: Embedding<B>,
        tokenizer: &Tokenizer,
        device:    &B::Device,
    ) -> Self::Model;
}

// ─── CNN ──────────────────────────────────────────────────────────────────────

#[derive(Config, Debug)]
pub struct CnnClassifierConfig {
    #[config(default = 128)]
    pub filters: usize,
    #[config(default = 3)]
    pub kernel_size: usize,
    #[config(default = 0.5)]
    pub dropout: f64,
}

/// embedding → conv1d → relu → global max pool → dropout → dense
#[derive(Module, Debug)]
pub struct CnnClassifier<B: Backend> {
    pub embedding: Embedding<B>,
    pub conv:      Conv1d<B>,
    pub dropout:   Dropout,
    pub output:    Linear<B>,
}

impl<B: AutodiffBackend> ModelBuilder<B> for CnnClassifierConfig {
    type Model = CnnClassifier<B>;
    type Inner = CnnClassifier<B::InnerBackend>;

    fn name(&self) -> &'static str {
        "cnn"
    }

    fn build(&self, embedding: Embedding<B>, tokenizer: &Tokenizer, device: &B::Device) -> CnnClassifier<B> {
        let [_, embedding_size] = embedding.weight.dims();
        // Half-kernel padding on both sides keeps short sequences valid.
        let conv = Conv1dConfig::new(embedding_size, self.filters, self.kernel_size)
            .with_padding(PaddingConfig1d::Explicit(self.kernel_size / 2))
            .init(device);
        CnnClassifier {
            embedding,
            conv,
            dropout: DropoutConfig::new(self.dropout).init(),
            output:  LinearConfig::new(self.filters, tokenizer.class_num()).init(device),
        }
    }
}

impl<B: Backend> Classifier<B> for CnnClassifier<B> {
    fn forward(&self, tokens: Tensor<B, 2, Int>) -> Tensor<B, 2> {
        let x = self.embedding.forward(tokens);      // [batch, seq, emb]
        let x = x.swap_dims(1, 2);                   // [batch, emb, seq]
        let x = activation::relu(self.conv.forward(x));
        let [batch, filters, _] = x.dims();
        let x = x.max_dim(2).reshape([batch, filters]);
        self.output.forward(self.dropout.forward(x))
    }
}

// ─── BiLSTM ───────────────────────────────────────────────────────────────────

#[derive(Config, Debug)]
pub struct BiLstmClassifierConfig {
    #[config(default = 64)]
    pub hidden_size: usize,
    #[config(default = 0.5)]
    pub dropout: f64,
}

/// embedding → bidirectional LSTM → mean over time → dropout → dense
#[derive(Module, Debug)]
pub struct BiLstmClassifier<B: Backend> {
    pub embedding: Embedding<B>,
    pub lstm:      BiLstm<B>,
    pub dropout:   Dropout,
    pub output:    Linear<B>,
}

impl<B: AutodiffBackend> ModelBuilder<B> for BiLstmClassifierConfig {
    type Model = BiLstmClassifier<B>;
    type Inner = BiLstmClassifier<B::InnerBackend>;

    fn name(&self) -> &'static str {
        "blstm"
    }

    fn build(&self, embedding: Embedding<B>, tokenizer: &Tokenizer, device: &B::Device) -> BiLstmClassifier<B> {
        let [_, embedding_size] = embedding.weight.dims();
        BiLstmClassifier {
            embedding,
            lstm:    BiLstmConfig::new(embedding_size, self.hidden_size, true).init(device),
            dropout: DropoutConfig::new(self.dropout).init(),
            output:  LinearConfig::new(2 * self.hidden_size, tokenizer.class_num()).init(device),
        }
    }
}

impl<B: Backend> Classifier<B> for BiLstmClassifier<B> {
    fn forward(&self, tokens: Tensor<B, 2, Int>) -> Tensor<B, 2> {
        let x = self.embedding.forward(tokens);
        let (x, _) = self.lstm.forward(x, None);     // [batch, seq, 2 * hidden]
        let [batch, _, width] = x.dims();
        let x = x.mean_dim(1).reshape([batch, width]);
        self.output.forward(self.dropout.forward(x))
    }
}
