// ============================================================
// ML / Model Layer (Burn)
// ============================================================
// All Burn model code lives here:
//
//   embedding.rs      — picks a trainable or frozen embedding
//                       layer for the active tokenizer
//
//   model.rs          — Classifier / ModelBuilder traits and the
//                       CNN and BiLSTM architectures
//
//   trainer.rs        — generator-driven epoch loop with Adam,
//                       validation and per-epoch callbacks
//
//   classification.rs — ClassificationModel, which ties the
//                       tokenizer, batch generators, network and
//                       trainer together (fit / fit_corpus /
//                       predict / save / load)

/// Embedding layer selection
pub mod embedding;

/// Classifier architectures
pub mod model;

/// Training loop
pub mod trainer;

/// The fit orchestrator
pub mod classification;

/// Backend used by the command line tool.
#[cfg(not(feature = "wgpu"))]
pub type DefaultBackend = burn::backend::Autodiff<burn::backend::NdArray<f32>>;

/// Backend used by the command line tool.
#[cfg(feature = "wgpu")]
pub type DefaultBackend = burn::backend::Autodiff<burn::backend::Wgpu>;
