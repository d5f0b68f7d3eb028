// ============================================================
// Infrastructure Layer
// ============================================================
// Cross-cutting file handling:
//
//   checkpoint.rs — saving and loading weights (burn's
//                   CompactRecorder), model configs, tokenizers
//                   and the run's TrainConfig
//
//   metrics.rs    — per-epoch CSV log, plugged into the trainer
//                   as a TrainCallback

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Training metrics CSV logger
pub mod metrics;
