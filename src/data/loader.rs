// ============================================================
// Data — TSV Loader
// ============================================================
// Reads labelled examples from a tab-separated file:
//
//   # comment lines and blank lines are ignored
//   positive<TAB>what a lovely film
//   negative<TAB>the plot made no sense
//
// Everything before the first tab is the label, everything after
// it is the text.

use anyhow::{bail, Context, Result};
use std::{fs, path::PathBuf};

use crate::domain::text_input::LabeledText;
use crate::domain::traits::ExampleSource;

pub struct TsvLoader {
    path: PathBuf,
}

impl TsvLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ExampleSource for TsvLoader {
    fn load_all(&self) -> Result<Vec<LabeledText>> {
        let text = fs::read_to_string(&self.path)
            .with_context(|| format!("Cannot read '{}'", self.path.display()))?;
        let examples = parse_tsv(&text)
            .with_context(|| format!("Malformed TSV in '{}'", self.path.display()))?;

        tracing::info!("Loaded {} examples from '{}'", examples.len(), self.path.display());
        Ok(examples)
    }
}

pub fn parse_tsv(text: &str) -> Result<Vec<LabeledText>> {
    let mut examples = Vec::new();

    for (line_no, line) in text.lines().enumerate() {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((label, body)) = line.split_once('\t') else {
            bail!("line {}: expected 'label<TAB>text'", line_no + 1);
        };
        let label = label.trim();
        if label.is_empty() {
            bail!("line {}: empty label", line_no + 1);
        }

        examples.push(LabeledText::new(label, body.trim()));
    }

    Ok(examples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::text_input::TextInput;
    use std::io::Write;

    #[test]
    fn test_parses_labels_and_text() {
        let examples = parse_tsv("# header\npos\tgreat film\n\nneg\t awful \r\n").unwrap();
        assert_eq!(examples.len(), 2);
        assert_eq!(examples[0].label, "pos");
        assert_eq!(examples[1].text, TextInput::from("awful"));
    }

    #[test]
    fn test_missing_tab_reports_line() {
        let err = parse_tsv("pos\tok\nbroken line\n").unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_empty_label_is_rejected() {
        assert!(parse_tsv("\tno label\n").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "a\tfirst").unwrap();
        writeln!(file, "b\tsecond").unwrap();

        let examples = TsvLoader::new(file.path()).load_all().unwrap();
        assert_eq!(examples.len(), 2);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(TsvLoader::new("/definitely/not/here.tsv").load_all().is_err());
    }
}
