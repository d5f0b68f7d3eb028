// ============================================================
// Domain Layer
// ============================================================
// Plain Rust types and traits describing what the system works
// with: pieces of text, their labels, and the abstractions the
// training code is written against.
//
// Rules for this layer:
//   - NO Burn framework types
//   - NO file I/O
//   - Only plain structs, enums, and traits
//
// The `Corpus` trait lives in `data::corpus` instead, because it
// hands out a tokenizer and encoded batches.

// A single text input, raw or pre-segmented, plus labelled examples
pub mod text_input;

// Core abstractions (traits) that other layers implement
pub mod traits;
