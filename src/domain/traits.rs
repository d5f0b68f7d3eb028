// ============================================================
// Domain — Core Traits
// ============================================================
// The application layer loads examples and serves predictions
// through these traits, so the CLI never needs to know which file
// format or which architecture is behind them.

use anyhow::Result;

use crate::domain::text_input::{LabeledText, TextInput};

// ─── ExampleSource ────────────────────────────────────────────────────────────
/// Any component that can produce labelled examples.
///
/// Implementations:
///   - TsvLoader → reads `label<TAB>text` lines from a file
pub trait ExampleSource {
    /// Load every available example, in source order.
    fn load_all(&self) -> Result<Vec<LabeledText>>;
}

// ─── LabelPredictor ───────────────────────────────────────────────────────────
/// Any component that can assign a label to each of several texts.
///
/// Implementations:
///   - PredictUseCase → a classifier restored from a model directory
pub trait LabelPredictor {
    /// One label per input, in input order.
    fn predict(&self, texts: &[TextInput]) -> Result<Vec<String>>;
}
