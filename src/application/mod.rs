// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Workflows that tie the other layers together:
//
//   train_use_case.rs   — TSV files → tokenizer → fit → model dir
//   predict_use_case.rs — model dir → classifier → labels
//
// No model math lives here and nothing is printed; the CLI
// layer decides what the user sees.

/// The training workflow
pub mod train_use_case;

/// The prediction workflow
pub mod predict_use_case;
