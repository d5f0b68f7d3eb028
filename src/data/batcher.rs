// ============================================================
// Data — Classification Batcher
// ============================================================
// Implements Burn's Batcher trait to stack a page of
// EncodedSamples into tensors.
//
//   Input:  N samples, each with S token ids and C one-hot slots
//   Output: tokens  [N, S]  (Int)
//           targets [N, C]  (Int)
//
// All samples are already padded to the same length by the
// generator, so stacking is a flatten + reshape.

use burn::{data::dataloader::batcher::Batcher, prelude::*};

use crate::data::generator::EncodedSample;

/// A page of samples on a device, ready for the forward pass.
#[derive(Debug, Clone)]
pub struct ClassificationBatch<B: Backend> {
    /// Padded token ids — shape: [batch_size, sequence_length]
    pub tokens: Tensor<B, 2, Int>,

    /// One-hot labels — shape: [batch_size, class_num]
    pub targets: Tensor<B, 2, Int>,
}

#[derive(Clone, Debug)]
pub struct ClassificationBatcher<B: Backend> {
    device: B::Device,
}

impl<B: Backend> ClassificationBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

/// Stack equal-length rows into a `[rows, width]` Int tensor.
pub fn stack_rows<B: Backend>(rows: &[Vec<u32>], device: &B::Device) -> Tensor<B, 2, Int> {
    let width = rows.first().map_or(0, Vec::len);
    let flat: Vec<i32> = rows
        .iter()
        .flat_map(|row| row.iter().map(|&v| v as i32))
        .collect();

    Tensor::<B, 2, Int>::from_data(TensorData::new(flat, [rows.len(), width]), device)
}

impl<B: Backend> Batcher<EncodedSample, ClassificationBatch<B>> for ClassificationBatcher<B> {
    fn batch(&self, items: Vec<EncodedSample>) -> ClassificationBatch<B> {
        let (tokens, targets): (Vec<Vec<u32>>, Vec<Vec<u32>>) = items
            .into_iter()
            .map(|s| (s.token_ids, s.one_hot))
            .unzip();

        ClassificationBatch {
            tokens:  stack_rows(&tokens, &self.device),
            targets: stack_rows(&targets, &self.device),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_batch_shapes_and_values() {
        let device = Default::default();
        let batcher = ClassificationBatcher::<TestBackend>::new(device);
        let batch = batcher.batch(vec![
            EncodedSample { token_ids: vec![0, 4, 5], one_hot: vec![1, 0] },
            EncodedSample { token_ids: vec![7, 8, 9], one_hot: vec![0, 1] },
        ]);

        assert_eq!(batch.tokens.dims(), [2, 3]);
        assert_eq!(batch.targets.dims(), [2, 2]);

        let tokens: Vec<i64> = batch.tokens.into_data().convert::<i64>().to_vec().unwrap();
        assert_eq!(tokens, vec![0, 4, 5, 7, 8, 9]);
    }
}
