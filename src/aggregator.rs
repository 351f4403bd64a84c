use crate::config::Config;
use crate::engine::Engine;
use crate::model::SimulationSummary;
use crate::stats::EstimateStats;
use anyhow::{Context, Result};
use rand::prelude::*;
use rand_chacha::ChaCha12Rng;
use std::sync::atomic::{AtomicBool, Ordering};

/// Runs the configured number of trials and folds them into one summary.
///
/// Trials are statistically independent: each gets its own ChaCha stream off
/// the master seed, so the run is reproducible and a parallel map over trials
/// would produce the same estimates.
pub struct Aggregator {
    engine: Engine,
}

impl Aggregator {
    pub fn new(cfg: Config) -> Self {
        Self {
            engine: Engine::new(cfg),
        }
    }

    /// Run all trials and build the [`SimulationSummary`].
    ///
    /// The cancel flag is checked between trials only; once raised, the run
    /// stops after the current trial and returns a partial, well-formed
    /// summary over the completed trials.
    pub fn run(&self, cancel: &AtomicBool) -> Result<SimulationSummary> {
        self.run_with_progress(cancel, |_| {})
    }

    /// Like [`Aggregator::run`], invoking `on_trial` with the number of
    /// completed trials after each one. The hook runs before the next cancel
    /// check, so a caller raising the flag from it stops the run at a known
    /// trial count.
    pub fn run_with_progress(
        &self,
        cancel: &AtomicBool,
        mut on_trial: impl FnMut(usize),
    ) -> Result<SimulationSummary> {
        let cfg = self.engine.cfg();
        let n_trials = cfg.trials.count;
        let master_seed = cfg.trials.seed.unwrap_or_else(|| rand::rng().random());
        log::debug!("master seed: {master_seed}");

        let mut trials = Vec::with_capacity(n_trials);
        let progress_stride = (n_trials / 20).max(1);

        for trial_idx in 0..n_trials {
            if cancel.load(Ordering::Relaxed) {
                log::info!("cancelled after {} of {n_trials} trials", trials.len());
                break;
            }

            let mut rng = ChaCha12Rng::seed_from_u64(master_seed);
            rng.set_stream(trial_idx as u64);

            let trial = self
                .engine
                .run_trial(&mut rng)
                .with_context(|| format!("failed to run trial {trial_idx}"))?;
            trials.push(trial);
            on_trial(trials.len());

            if (trial_idx + 1) % progress_stride == 0 {
                let progress = 100.0 * (trial_idx + 1) as f64 / n_trials as f64;
                log::info!("completed {progress:06.2}%");
            }
        }

        let estimates: Vec<f64> = trials.iter().map(|trial| trial.estimate).collect();

        Ok(SimulationSummary {
            n_trials: trials.len(),
            actual_population: cfg.population.size(),
            stats: EstimateStats::from_values(&estimates),
            description: cfg.describe(),
            trials,
        })
    }
}

/// In-memory session history of completed simulations, addressable by
/// sequence number in completion order.
#[derive(Default)]
pub struct History {
    summaries: Vec<SimulationSummary>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a summary and return its sequence number.
    pub fn push(&mut self, summary: SimulationSummary) -> usize {
        self.summaries.push(summary);
        self.summaries.len() - 1
    }

    pub fn get(&self, seq: usize) -> Option<&SimulationSummary> {
        self.summaries.get(seq)
    }

    pub fn len(&self) -> usize {
        self.summaries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.summaries.is_empty()
    }
}
