use crate::config::{Capture, Config, Population, Spatial};
use crate::estimator;
use crate::model::{CaptureOutcome, Individual, TagState, TrialResult};
use anyhow::Result;
use rand::prelude::*;
use rand_chacha::ChaCha12Rng;
use rand_distr::{Beta, Uniform};

/// Width of the core study reach. All positions and sub-reach bounds are
/// expressed on this scale.
pub const REACH_SIZE: f64 = 100.0;

/// Shape parameter of the symmetric Beta migration kernel.
const MIGRATION_SHAPE: f64 = 2.0;

/// Open populations extend the domain by this many reach widths on each side
/// (the downstream and upstream zone bands).
const DOMAIN_FACTOR: f64 = 2.0;

/// Capture pass index within a trial.
#[derive(Clone, Copy)]
enum Pass {
    One,
    Two,
}

/// Bounds of the capture window for a centered sub-reach of the given
/// fractional size.
pub fn sub_reach_bounds(fraction: f64) -> (f64, f64) {
    let half_window = REACH_SIZE * fraction / 2.0;
    (REACH_SIZE / 2.0 - half_window, REACH_SIZE / 2.0 + half_window)
}

/// Per-trial simulation engine.
///
/// Holds the validated configuration and runs one full two-pass trial at a
/// time. All randomness comes from the caller-owned RNG, so each trial can
/// run on its own stream.
pub struct Engine {
    cfg: Config,
}

impl Engine {
    pub fn new(cfg: Config) -> Self {
        Self { cfg }
    }

    pub fn cfg(&self) -> &Config {
        &self.cfg
    }

    /// Run one complete two-pass trial.
    ///
    /// The trial is a strictly ordered state machine: generate population,
    /// pass-1 capture and tagging, tag loss, pass-2 draws with mortality and
    /// migration, pass-2 capture, Chapman estimate.
    pub fn run_trial(&self, rng: &mut ChaCha12Rng) -> Result<TrialResult> {
        let unit = Uniform::new(0.0, 1.0)?;
        let window = self.capture_window();

        let mut individuals = self.generate_population(rng)?;

        // Pass 1: capture and tag.
        let mut first_pass_marked = 0;
        for ind in &mut individuals {
            if within(window, ind.pos_pass_one)
                && ind.draw_pass_one <= self.capture_threshold(Pass::One, &unit, rng)
            {
                ind.tag = TagState::Tagged;
                ind.outcome = CaptureOutcome::FirstPassMarked;
                first_pass_marked += 1;
            } else {
                ind.tag = TagState::Untagged;
            }
        }

        // Tag loss, evaluated once per tagged individual between passes.
        if self.cfg.tagging.tag_loss {
            for ind in individuals.iter_mut().filter(|ind| ind.tag == TagState::Tagged) {
                let roll = unit.sample(rng);
                ind.tag_loss_roll = Some(roll);
                if roll <= self.cfg.tagging.tag_loss_prob {
                    ind.tag_lost = true;
                    ind.tag = TagState::Untagged;
                }
            }
        }

        // Pass-2 draws; open populations also roll mortality and migrate.
        let beta = Beta::new(MIGRATION_SHAPE, MIGRATION_SHAPE)?;
        for ind in &mut individuals {
            ind.draw_pass_two = unit.sample(rng);

            if let Population::Open {
                migration_bias,
                migration_distance,
                mortality_prob,
                ..
            } = &self.cfg.population
            {
                if unit.sample(rng) <= *mortality_prob {
                    ind.alive = false;
                }
                ind.pos_pass_two =
                    migrate(ind.pos_pass_one, *migration_bias, *migration_distance, &beta, rng);
            }
        }

        // Pass 2: recapture. Dead or out-of-window individuals are never
        // eligible, whatever their draw.
        let mut second_pass_caught = 0;
        let mut recaptured_tagged = 0;
        for ind in &mut individuals {
            if !ind.alive || !within(window, ind.pos_pass_two) {
                continue;
            }
            if ind.draw_pass_two <= self.capture_threshold(Pass::Two, &unit, rng) {
                second_pass_caught += 1;
                if ind.tag == TagState::Tagged {
                    recaptured_tagged += 1;
                    ind.outcome = CaptureOutcome::RecapturedTagged;
                } else {
                    ind.outcome = CaptureOutcome::RecapturedUntagged;
                }
            }
        }

        let estimate =
            estimator::chapman_estimate(first_pass_marked, second_pass_caught, recaptured_tagged);

        Ok(TrialResult {
            actual_population: self.cfg.population.size(),
            estimate,
            first_pass_marked,
            second_pass_caught,
            recaptured_tagged,
            individuals,
        })
    }

    /// Generate the trial population with pass-1 capture draws and initial
    /// positions.
    fn generate_population(&self, rng: &mut ChaCha12Rng) -> Result<Vec<Individual>> {
        let size = self.cfg.population.size();
        let unit = Uniform::new(0.0, 1.0)?;

        let pos_dist = match (&self.cfg.population, &self.cfg.spatial) {
            // Everyone is always available; the position is bookkeeping only.
            (Population::Closed { .. }, Spatial::NotAFactor) => None,
            (Population::Closed { .. }, Spatial::BoundedSubReach { .. }) => {
                Some(Uniform::new(0.0, REACH_SIZE)?)
            }
            (Population::Open { .. }, _) => Some(Uniform::new(
                -DOMAIN_FACTOR * REACH_SIZE,
                (1.0 + DOMAIN_FACTOR) * REACH_SIZE,
            )?),
        };

        let mut individuals = Vec::with_capacity(size);
        for _ in 0..size {
            let draw = unit.sample(rng);
            let pos = match &pos_dist {
                Some(dist) => dist.sample(rng),
                None => REACH_SIZE / 2.0,
            };
            individuals.push(Individual::new(draw, pos));
        }

        Ok(individuals)
    }

    /// Capture window for both passes, or `None` when every position is
    /// eligible.
    fn capture_window(&self) -> Option<(f64, f64)> {
        match (&self.cfg.population, &self.cfg.spatial) {
            (Population::Closed { .. }, Spatial::NotAFactor) => None,
            // An open population without a configured sub-reach is still only
            // catchable inside the core reach.
            (Population::Open { .. }, Spatial::NotAFactor) => Some((0.0, REACH_SIZE)),
            (_, Spatial::BoundedSubReach { fraction }) => Some(sub_reach_bounds(*fraction)),
        }
    }

    /// Capture threshold for one individual in the given pass.
    fn capture_threshold(
        &self,
        pass: Pass,
        unit: &Uniform<f64>,
        rng: &mut ChaCha12Rng,
    ) -> f64 {
        match &self.cfg.capture {
            Capture::Equal { prob } => *prob,
            Capture::Vary {
                prob_pass_one,
                prob_pass_two,
            } => match pass {
                Pass::One => *prob_pass_one,
                Pass::Two => *prob_pass_two,
            },
            Capture::RandomPerIndividual => unit.sample(rng),
        }
    }
}

/// Whether a position falls inside the capture window. Bounds are inclusive.
fn within(window: Option<(f64, f64)>, pos: f64) -> bool {
    match window {
        None => true,
        Some((lower, upper)) => (lower..=upper).contains(&pos),
    }
}

/// Displace a position by one migration step.
///
/// The step is a symmetric Beta sample recentered to zero, shifted by the
/// configured bias and scaled by the migration distance fraction of the
/// maximum displacement. The displacement is clamped symmetrically on both
/// sides, and the result stays inside the extended domain.
fn migrate(
    pos: f64,
    bias: f64,
    distance: f64,
    beta: &Beta<f64>,
    rng: &mut ChaCha12Rng,
) -> f64 {
    let max_displacement = DOMAIN_FACTOR * REACH_SIZE;

    let step = beta.sample(rng) - 0.5 + bias;
    let displacement = (step * distance * max_displacement)
        .clamp(-max_displacement, max_displacement);

    (pos + displacement).clamp(
        -DOMAIN_FACTOR * REACH_SIZE,
        (1.0 + DOMAIN_FACTOR) * REACH_SIZE,
    )
}
