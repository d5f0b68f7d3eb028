// ============================================================
// Infra — Checkpoint Manager
// ============================================================
// Everything needed to bring a trained classifier back:
//
//   <dir>/
//     model.mpk.gz          ← weights (burn CompactRecorder)
//     model_config.json     ← architecture hyper-parameters
//     tokenizer.json        ← vocabulary, labels, sequence length,
//                             embedding source
//     word_level.json       ← the HuggingFace tokenizer, for inspection
//     train_config.json     ← the run's TrainConfig (CLI runs only)
//
// Weights are only loadable into a model of the same architecture,
// which is why the model config and tokenizer are stored alongside.

use anyhow::{anyhow, bail, Context, Result};
use burn::{
    prelude::*,
    record::{CompactRecorder, Recorder},
};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::application::train_use_case::TrainConfig;
use crate::tokenizer::{Tokenizer, TokenizerState};

const MODEL_FILE: &str = "model";
const MODEL_CONFIG_FILE: &str = "model_config.json";
const TOKENIZER_FILE: &str = "tokenizer.json";
const WORD_LEVEL_FILE: &str = "word_level.json";
const TRAIN_CONFIG_FILE: &str = "train_config.json";

pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Use `dir` for writing, creating it if needed.
    pub fn create(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create checkpoint directory '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    /// Use an existing `dir` for reading.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        if !dir.is_dir() {
            bail!("Model directory '{}' does not exist. Have you trained a model?", dir.display());
        }
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn save_model<B: Backend, M: Module<B>>(&self, model: &M) -> Result<()> {
        let path = self.dir.join(MODEL_FILE);
        CompactRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| format!("Failed to save weights to '{}'", path.display()))?;
        tracing::debug!("Saved weights to '{}'", path.display());
        Ok(())
    }

    /// Load saved weights into `model`, which must have the saved architecture.
    pub fn load_model<B: Backend, M: Module<B>>(&self, model: M, device: &B::Device) -> Result<M> {
        let path = self.dir.join(MODEL_FILE);
        let record = CompactRecorder::new()
            .load(path.clone(), device)
            .with_context(|| format!("Cannot load weights from '{}'", path.display()))?;
        Ok(model.load_record(record))
    }

    pub fn save_model_config<C: Config>(&self, config: &C) -> Result<()> {
        let path = self.dir.join(MODEL_CONFIG_FILE);
        config
            .save(&path)
            .with_context(|| format!("Cannot write '{}'", path.display()))
    }

    pub fn load_model_config<C: Config>(&self) -> Result<C> {
        let path = self.dir.join(MODEL_CONFIG_FILE);
        C::load(&path).map_err(|e| anyhow!("Cannot read '{}': {e:?}", path.display()))
    }

    pub fn save_tokenizer(&self, tokenizer: &Tokenizer) -> Result<()> {
        self.write_json(TOKENIZER_FILE, &tokenizer.to_state())?;
        tokenizer.save_word_level(self.dir.join(WORD_LEVEL_FILE))
    }

    pub fn load_tokenizer(&self) -> Result<Tokenizer> {
        let state: TokenizerState = self.read_json(TOKENIZER_FILE)?;
        Tokenizer::from_state(state)
    }

    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        self.write_json(TRAIN_CONFIG_FILE, cfg)
    }

    pub fn load_config(&self) -> Result<TrainConfig> {
        self.read_json(TRAIN_CONFIG_FILE)
    }

    fn write_json<T: serde::Serialize>(&self, name: &str, value: &T) -> Result<()> {
        let path = self.dir.join(name);
        let json = serde_json::to_string_pretty(value)?;
        fs::write(&path, json).with_context(|| format!("Cannot write '{}'", path.display()))?;
        tracing::debug!("Wrote '{}'", path.display());
        Ok(())
    }

    fn read_json<T: serde::de::DeserializeOwned>(&self, name: &str) -> Result<T> {
        let path = self.dir.join(name);
        let json = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read '{}'", path.display()))?;
        serde_json::from_str(&json).with_context(|| format!("Malformed JSON in '{}'", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::text_input::TextInput;
    use crate::ml::model::CnnClassifierConfig;
    use crate::tokenizer::TokenizerConfig;

    fn tokenizer() -> Tokenizer {
        let x = vec![TextInput::from("one two"), TextInput::from("three")];
        let y = vec!["odd".to_string(), "even".to_string()];
        Tokenizer::build_with_corpus(&TokenizerConfig::recommended(), &x, &y).unwrap()
    }

    #[test]
    fn test_tokenizer_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::create(dir.path()).unwrap();
        let tok = tokenizer();
        ckpt.save_tokenizer(&tok).unwrap();

        let loaded = ckpt.load_tokenizer().unwrap();
        assert_eq!(loaded.to_state(), tok.to_state());
        assert!(dir.path().join(WORD_LEVEL_FILE).exists());
    }

    #[test]
    fn test_model_config_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::create(dir.path()).unwrap();
        ckpt.save_model_config(&CnnClassifierConfig::new().with_filters(9)).unwrap();

        let loaded: CnnClassifierConfig = ckpt.load_model_config().unwrap();
        assert_eq!(loaded.filters, 9);
    }

    #[test]
    fn test_open_missing_dir_fails() {
        assert!(CheckpointManager::open("/no/such/model/dir").is_err());
    }
}
