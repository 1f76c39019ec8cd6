// ============================================================
// Layer 5 — Autoregressive Training Loop
// ============================================================
// Next-token training over corpus windows.
//
//   inputs  [batch, seq]          ─► model ─► logits [batch, seq, vocab]
//   targets [batch, seq]                         │
//      │                                         ▼
//      └──► flatten [batch*seq] ── CE ◄── flatten [batch*seq, vocab]
//
// Reports the mean training loss per epoch. There is no held-out
// split and no accuracy for this task.

use std::sync::Arc;

use burn::{
    data::dataloader::{DataLoader, DataLoaderBuilder},
    optim::{GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::data::{
    batcher::{SequenceBatch, SequenceBatcher},
    dataset::WindowDataset,
    vocabulary::TextCorpus,
};
use crate::domain::error::{EngineError, Result};
use crate::domain::report::SequenceReport;
use crate::domain::task::TaskKind;
use crate::ml::autoregressive::AutoregressiveModel;
use crate::ml::objective::Objective;
use crate::ml::trainer::SHUFFLE_SEED;

pub struct SequenceTrainer<B: AutodiffBackend, O> {
    model:     AutoregressiveModel<B>,
    optim:     O,
    lr:        f64,
    objective: Objective,
    loader:    Arc<dyn DataLoader<SequenceBatch<B>>>,
}

impl<B, O> SequenceTrainer<B, O>
where
    B: AutodiffBackend,
    O: Optimizer<AutoregressiveModel<B>, B>,
{
    pub fn new(
        model:      AutoregressiveModel<B>,
        optim:      O,
        lr:         f64,
        loss:       &str,
        corpus:     Arc<TextCorpus>,
        batch_size: usize,
        device:     &B::Device,
    ) -> Result<Self> {
        let objective = Objective::new(loss, TaskKind::Sequence)?;
        if corpus.sample_count() == 0 {
            return Err(EngineError::EmptyDataset(format!(
                "corpus of {} tokens is too short for windows of {}",
                corpus.token_count(),
                corpus.sequence_length()
            )));
        }

        let loader = DataLoaderBuilder::new(SequenceBatcher::<B>::new(device.clone()))
            .batch_size(batch_size)
            .shuffle(SHUFFLE_SEED)
            .num_workers(1)
            .build(WindowDataset::new(corpus));

        Ok(Self { model, optim, lr, objective, loader })
    }

    /// One pass over every window. Returns the mean batch loss.
    pub fn train_epoch(&mut self) -> Result<f64> {
        let mut loss_sum = 0.0f64;
        let mut batches  = 0usize;

        for batch in self.loader.iter() {
            let [b, s] = batch.inputs.dims();
            let logits = self.model.forward(batch.inputs)?;
            let [_, _, vocab] = logits.dims();

            let loss = self.objective.loss(
                logits.reshape([b * s, vocab]),
                batch.targets.reshape([b * s]),
            );
            loss_sum += loss.clone().into_scalar().elem::<f64>();
            batches  += 1;

            let grads = GradientsParams::from_grads(loss.backward(), &self.model);
            self.model = self.optim.step(self.lr, self.model.clone(), grads);
        }

        Ok(if batches == 0 { f64::NAN } else { loss_sum / batches as f64 })
    }

    pub fn train(&mut self, n_epochs: usize) -> Result<SequenceReport> {
        let mut train_loss = Vec::with_capacity(n_epochs);
        for epoch in 1..=n_epochs {
            let loss = self.train_epoch()?;
            tracing::info!("Epoch {:>3}/{} | loss={:.3}", epoch, n_epochs, loss);
            train_loss.push(loss);
        }
        Ok(SequenceReport { train_loss })
    }

    pub fn into_model(self) -> AutoregressiveModel<B> {
        self.model
    }
}
