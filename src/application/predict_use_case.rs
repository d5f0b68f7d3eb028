// ============================================================
// Application — PredictUseCase
// ============================================================
// Restores a model directory written by TrainUseCase and labels
// new texts with it.
//
//   Step 1: Read train_config.json to learn the architecture
//   Step 2: Rebuild that architecture and load its weights
//   Step 3: Predict one label per input

use anyhow::Result;
use std::path::Path;

use crate::application::train_use_case::Architecture;
use crate::domain::{text_input::TextInput, traits::LabelPredictor};
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::{
    classification::ClassificationModel,
    model::{BiLstmClassifierConfig, CnnClassifierConfig},
    DefaultBackend,
};

/// A restored classifier of either architecture.
enum LoadedModel {
    Cnn(ClassificationModel<DefaultBackend, CnnClassifierConfig>),
    Blstm(ClassificationModel<DefaultBackend, BiLstmClassifierConfig>),
}

pub struct PredictUseCase {
    model: LoadedModel,
}

impl PredictUseCase {
    pub fn new(model_dir: impl AsRef<Path>) -> Result<Self> {
        let model_dir = model_dir.as_ref();
        let config = CheckpointManager::open(model_dir)?.load_config()?;
        tracing::info!("Loading {:?} classifier from '{}'", config.architecture, model_dir.display());

        let device = Default::default();
        let model = match config.architecture {
            Architecture::Cnn => LoadedModel::Cnn(ClassificationModel::load(model_dir, device)?),
            Architecture::Blstm => LoadedModel::Blstm(ClassificationModel::load(model_dir, device)?),
        };
        Ok(Self { model })
    }
}

impl LabelPredictor for PredictUseCase {
    fn predict(&self, texts: &[TextInput]) -> Result<Vec<String>> {
        match &self.model {
            LoadedModel::Cnn(model) => model.predict(texts),
            LoadedModel::Blstm(model) => model.predict(texts),
        }
    }
}
