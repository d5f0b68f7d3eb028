// ============================================================
// ML — Training Loop
// ============================================================
// Generator-driven fitting: the caller hands over an endless
// stream of pages and says how many of them make an epoch.
//
// Per epoch:
//   1. `steps_per_epoch` pages → forward, loss, backward, Adam step
//   2. optional validation: `validation_steps` pages on
//      `model.valid()` (inner backend, dropout off, no autodiff)
//   3. EpochMetrics handed to every callback
//
// Reference: Burn Book §5 (custom training loop)

use anyhow::{anyhow, ensure, Result};
use burn::{
    data::dataloader::batcher::Batcher,
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::data::{batcher::ClassificationBatcher, generator::BatchStream};
use crate::infra::metrics::EpochMetrics;
use crate::ml::model::Classifier;

/// Hook called after every epoch.
pub trait TrainCallback {
    fn on_epoch_end(&mut self, metrics: &EpochMetrics) -> Result<()>;
}

/// Extra knobs for a fit.
pub struct FitOptions {
    pub learning_rate: f64,
    pub callbacks:     Vec<Box<dyn TrainCallback>>,
}

impl FitOptions {
    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn with_callback(mut self, callback: impl TrainCallback + 'static) -> Self {
        self.callbacks.push(Box::new(callback));
        self
    }
}

impl Default for FitOptions {
    fn default() -> Self {
        Self { learning_rate: 1e-3, callbacks: Vec::new() }
    }
}

/// Validation pages and how many of them to evaluate per epoch.
pub struct Validation<'a> {
    pub batches: BatchStream<'a>,
    pub steps:   usize,
}

/// Train `model` for `epochs` epochs and return it with the per-epoch
/// history.
pub fn fit_generator<B, M>(
    mut model:       M,
    mut train:       BatchStream<'_>,
    steps_per_epoch: usize,
    epochs:          usize,
    mut validation:  Option<Validation<'_>>,
    options:         &mut FitOptions,
    device:          &B::Device,
) -> Result<(M, Vec<EpochMetrics>)>
where
    B: AutodiffBackend,
    M: AutodiffModule<B> + Classifier<B>,
    M::InnerModule: Classifier<B::InnerBackend>,
{
    ensure!(steps_per_epoch > 0, "steps_per_epoch must be positive");

    let mut optim = AdamConfig::new().init::<B, M>();
    let train_batcher = ClassificationBatcher::<B>::new(device.clone());
    let valid_batcher = ClassificationBatcher::<B::InnerBackend>::new(device.clone());
    let mut history = Vec::with_capacity(epochs);

    for epoch in 1..=epochs {
        let mut loss_sum = 0.0f64;

        for step in 0..steps_per_epoch {
            let page = train
                .next()
                .ok_or_else(|| anyhow!("Training data ran out at epoch {epoch}, step {step}"))??;
            let output = model.forward_classification(train_batcher.batch(page));
            loss_sum += output.loss.clone().into_scalar().elem::<f64>();

            let grads = output.loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(options.learning_rate, model, grads);
        }
        let train_loss = loss_sum / steps_per_epoch as f64;

        let (val_loss, val_acc) = match validation.as_mut() {
            Some(v) => {
                let (loss, acc) = evaluate(&model.valid(), &mut v.batches, v.steps, &valid_batcher)?;
                (Some(loss), Some(acc))
            }
            None => (None, None),
        };

        let metrics = EpochMetrics::new(epoch, train_loss, val_loss, val_acc);
        match (val_loss, val_acc) {
            (Some(l), Some(a)) => println!(
                "Epoch {:>3}/{} | train_loss={:.4} | val_loss={:.4} | val_acc={:.1}%",
                epoch, epochs, train_loss, l, a * 100.0
            ),
            _ => println!("Epoch {:>3}/{} | train_loss={:.4}", epoch, epochs, train_loss),
        }

        for callback in options.callbacks.iter_mut() {
            callback.on_epoch_end(&metrics)?;
        }
        history.push(metrics);
    }

    tracing::info!("Training finished after {} epochs", epochs);
    Ok((model, history))
}

/// Mean loss and accuracy over `steps` pages.
fn evaluate<B, M>(
    model:   &M,
    batches: &mut BatchStream<'_>,
    steps:   usize,
    batcher: &ClassificationBatcher<B>,
) -> Result<(f64, f64)>
where
    B: Backend,
    M: Classifier<B>,
{
    let mut loss_sum = 0.0f64;
    let mut correct  = 0usize;
    let mut total    = 0usize;
    let mut pages    = 0usize;

    for _ in 0..steps {
        let Some(page) = batches.next() else { break };
        let output = model.forward_classification(batcher.batch(page?));

        loss_sum += output.loss.into_scalar().elem::<f64>();
        total    += output.targets.dims()[0];
        let hits: i64 = output
            .logits
            .argmax(1)
            .equal(output.targets.argmax(1))
            .int()
            .sum()
            .into_scalar()
            .elem();
        correct += hits as usize;
        pages   += 1;
    }

    let loss = if pages > 0 { loss_sum / pages as f64 } else { f64::NAN };
    let acc  = if total > 0 { correct as f64 / total as f64 } else { 0.0 };
    Ok((loss, acc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::generator::BatchGenerator;
    use crate::domain::text_input::TextInput;
    use crate::ml::{embedding::embedding_layer, model::{CnnClassifierConfig, ModelBuilder}};
    use crate::tokenizer::{Tokenizer, TokenizerConfig};
    use burn::backend::{Autodiff, NdArray};
    use std::{cell::RefCell, rc::Rc};

    type TestBackend = Autodiff<NdArray<f32>>;

    struct Recorder(Rc<RefCell<Vec<usize>>>);

    impl TrainCallback for Recorder {
        fn on_epoch_end(&mut self, metrics: &EpochMetrics) -> Result<()> {
            self.0.borrow_mut().push(metrics.epoch);
            Ok(())
        }
    }

    fn data() -> (Vec<TextInput>, Vec<String>) {
        let mut x = Vec::new();
        let mut y = Vec::new();
        for _ in 0..4 {
            x.push(TextInput::from("sunny warm bright"));
            y.push("weather".to_string());
            x.push(TextInput::from("goal match score"));
            y.push("sport".to_string());
        }
        (x, y)
    }

    #[test]
    fn test_fit_generator_runs_every_epoch_and_callback() {
        let device = Default::default();
        let (x, y) = data();
        let cfg = TokenizerConfig { sequence_length: Some(4), ..TokenizerConfig::recommended() };
        let tok = Tokenizer::build_with_corpus(&cfg, &x, &y).unwrap();
        let model = CnnClassifierConfig::new()
            .with_filters(4)
            .build(embedding_layer::<TestBackend>(&tok, &device), &tok, &device);

        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut options = FitOptions::default()
            .with_learning_rate(1e-2)
            .with_callback(Recorder(seen.clone()));

        let train = Box::new(BatchGenerator::new(&tok, &x, &y, 4).unwrap());
        let validation = Validation {
            batches: Box::new(BatchGenerator::new(&tok, &x, &y, 4).unwrap()),
            steps:   2,
        };

        let (_, history) = fit_generator::<TestBackend, _>(
            model, train, 2, 3, Some(validation), &mut options, &device,
        ).unwrap();

        assert_eq!(history.len(), 3);
        assert_eq!(*seen.borrow(), vec![1, 2, 3]);
        for m in &history {
            assert!(m.train_loss.is_finite());
            let acc = m.val_acc.unwrap();
            assert!((0.0..=1.0).contains(&acc));
        }
    }

    #[test]
    fn test_exhausted_stream_is_an_error() {
        let device = Default::default();
        let (x, y) = data();
        let cfg = TokenizerConfig { sequence_length: Some(4), ..TokenizerConfig::recommended() };
        let tok = Tokenizer::build_with_corpus(&cfg, &x, &y).unwrap();
        let model = CnnClassifierConfig::new()
            .with_filters(2)
            .build(embedding_layer::<TestBackend>(&tok, &device), &tok, &device);

        let train: BatchStream<'_> = Box::new(BatchGenerator::new(&tok, &x, &y, 4).unwrap().take(1));
        let result = fit_generator::<TestBackend, _>(
            model, train, 2, 1, None, &mut FitOptions::default(), &device,
        );
        assert!(result.is_err());
    }
}
