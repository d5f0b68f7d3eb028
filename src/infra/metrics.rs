// ============================================================
// Infra — Metrics Logger
// ============================================================
// Appends one CSV row per epoch:
//
//   epoch,train_loss,val_loss,val_acc
//   1,1.098612,1.054321,0.412500
//   2,0.953100,,                   <- no validation data
//
// The file survives across runs, so repeated training sessions
// in the same output directory build one long log.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use crate::ml::trainer::TrainCallback;

/// Summary of one training epoch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// Epoch number, starting at 1
    pub epoch: usize,

    /// Mean categorical cross-entropy over the epoch's training steps
    pub train_loss: f64,

    /// Mean loss over the validation steps, if validation data was given
    pub val_loss: Option<f64>,

    /// Fraction of validation samples whose arg-max class was right
    pub val_acc: Option<f64>,
}

impl EpochMetrics {
    pub fn new(epoch: usize, train_loss: f64, val_loss: Option<f64>, val_acc: Option<f64>) -> Self {
        Self { epoch, train_loss, val_loss, val_acc }
    }

    fn csv_row(&self) -> String {
        let opt = |v: Option<f64>| v.map(|v| format!("{v:.6}")).unwrap_or_default();
        format!("{},{:.6},{},{}", self.epoch, self.train_loss, opt(self.val_loss), opt(self.val_acc))
    }
}

/// Writes epoch metrics to `<dir>/metrics.csv`.
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)
            .with_context(|| format!("Cannot create '{}'", dir.display()))?;

        let csv_path = dir.join("metrics.csv");
        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)?;
            writeln!(f, "epoch,train_loss,val_loss,val_acc")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot open '{}'", self.csv_path.display()))?;
        writeln!(f, "{}", m.csv_row())?;
        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}

impl TrainCallback for MetricsLogger {
    fn on_epoch_end(&mut self, metrics: &EpochMetrics) -> Result<()> {
        self.log(metrics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_are_appended_after_header() {
        let dir = tempfile::tempdir().unwrap();
        let logger = MetricsLogger::new(dir.path()).unwrap();
        logger.log(&EpochMetrics::new(1, 0.5, Some(0.25), Some(0.75))).unwrap();
        logger.log(&EpochMetrics::new(2, 0.4, None, None)).unwrap();

        let csv = fs::read_to_string(logger.csv_path()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines, vec![
            "epoch,train_loss,val_loss,val_acc",
            "1,0.500000,0.250000,0.750000",
            "2,0.400000,,",
        ]);
    }

    #[test]
    fn test_existing_log_is_not_truncated() {
        let dir = tempfile::tempdir().unwrap();
        MetricsLogger::new(dir.path()).unwrap()
            .log(&EpochMetrics::new(1, 1.0, None, None)).unwrap();
        let logger = MetricsLogger::new(dir.path()).unwrap();

        let csv = fs::read_to_string(logger.csv_path()).unwrap();
        assert_eq!(csv.lines().count(), 2);
    }
}
