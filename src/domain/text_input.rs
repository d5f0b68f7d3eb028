// ============================================================
// Domain — Text Inputs
// ============================================================
// A classifier input is either a raw string, which the tokenizer
// splits on whitespace, or a sequence of words that has already
// been segmented by the caller (useful for languages without
// whitespace between words).

use serde::{Deserialize, Serialize};

/// One piece of text to classify.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextInput {
    /// Unsegmented text, e.g. `"the movie was great"`
    Raw(String),

    /// Words produced by an external segmenter, e.g. `["the", "movie"]`
    Segmented(Vec<String>),
}

impl TextInput {
    /// Number of whitespace-separated words (or segments).
    pub fn word_count(&self) -> usize {
        match self {
            TextInput::Raw(text) => text.split_whitespace().count(),
            TextInput::Segmented(words) => words.len(),
        }
    }
}

impl From<&str> for TextInput {
    fn from(text: &str) -> Self {
        TextInput::Raw(text.to_string())
    }
}

impl From<String> for TextInput {
    fn from(text: String) -> Self {
        TextInput::Raw(text)
    }
}

impl From<Vec<String>> for TextInput {
    fn from(words: Vec<String>) -> Self {
        TextInput::Segmented(words)
    }
}

impl From<Vec<&str>> for TextInput {
    fn from(words: Vec<&str>) -> Self {
        TextInput::Segmented(words.into_iter().map(str::to_string).collect())
    }
}

/// A labelled example as read from disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledText {
    pub label: String,
    pub text:  TextInput,
}

impl LabeledText {
    pub fn new(label: impl Into<String>, text: impl Into<TextInput>) -> Self {
        Self { label: label.into(), text: text.into() }
    }
}

/// Split labelled examples into parallel `(x, y)` vectors.
pub fn unzip_labeled(examples: Vec<LabeledText>) -> (Vec<TextInput>, Vec<String>) {
    examples.into_iter().map(|e| (e.text, e.label)).unzip()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_count() {
        assert_eq!(TextInput::from("a b  c").word_count(), 3);
        assert_eq!(TextInput::from(vec!["x", "y"]).word_count(), 2);
    }

    #[test]
    fn test_unzip_keeps_pairs_aligned() {
        let (x, y) = unzip_labeled(vec![
            LabeledText::new("pos", "good"),
            LabeledText::new("neg", "bad"),
        ]);
        assert_eq!(x, vec![TextInput::from("good"), TextInput::from("bad")]);
        assert_eq!(y, vec!["pos".to_string(), "neg".to_string()]);
    }
}
