//! Simulation data types.

use serde::{Deserialize, Serialize};

use crate::stats::EstimateStats;

/// Tag state of an individual across the two capture passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TagState {
    /// Pass 1 has not decided yet.
    Undetermined,
    /// Tagged in pass 1 and the tag is still attached.
    Tagged,
    /// Never tagged, or the tag was shed between passes.
    Untagged,
}

impl TagState {
    pub fn label(&self) -> &'static str {
        match self {
            TagState::Undetermined => "undetermined",
            TagState::Tagged => "tagged",
            TagState::Untagged => "untagged",
        }
    }
}

/// Final capture outcome of an individual after both passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaptureOutcome {
    /// Captured and tagged in pass 1, not seen again.
    FirstPassMarked,
    /// Captured in neither pass.
    NotCaptured,
    /// Captured in pass 2 with its pass-1 tag still attached.
    RecapturedTagged,
    /// Captured in pass 2 without a tag (never tagged, or tag shed).
    RecapturedUntagged,
}

impl CaptureOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            CaptureOutcome::FirstPassMarked => "first-pass-marked",
            CaptureOutcome::NotCaptured => "not-captured",
            CaptureOutcome::RecapturedTagged => "recaptured-tagged",
            CaptureOutcome::RecapturedUntagged => "recaptured-untagged",
        }
    }
}

/// One simulated animal's state over a full two-pass trial.
///
/// Built up in trial order: generation fills the pass-1 fields, pass 1 decides
/// the tag state, the vital-rate step fills `tag_loss_roll` and `alive`, and
/// pass 2 fixes the final `outcome`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Individual {
    /// Uniform capture draw for pass 1.
    pub draw_pass_one: f64,
    /// Uniform capture draw for pass 2.
    pub draw_pass_two: f64,

    pub tag: TagState,
    /// Uniform tag-loss roll, if this individual was tagged and tag loss is on.
    pub tag_loss_roll: Option<f64>,
    /// The tag-loss roll succeeded and the tag was shed.
    pub tag_lost: bool,

    /// Continuous position at pass 1.
    pub pos_pass_one: f64,
    /// Continuous position at pass 2 (same as pass 1 for closed populations).
    pub pos_pass_two: f64,

    /// Closed populations never kill; open populations roll mortality before pass 2.
    pub alive: bool,

    pub outcome: CaptureOutcome,
}

impl Individual {
    /// Create an individual at the start of a trial, before any pass has run.
    pub fn new(draw_pass_one: f64, pos: f64) -> Self {
        Self {
            draw_pass_one,
            draw_pass_two: 0.0,
            tag: TagState::Undetermined,
            tag_loss_roll: None,
            tag_lost: false,
            pos_pass_one: pos,
            pos_pass_two: pos,
            alive: true,
            outcome: CaptureOutcome::NotCaptured,
        }
    }
}

/// Outcome of a single two-pass trial.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialResult {
    /// True population size the trial was generated with.
    pub actual_population: usize,

    /// Chapman estimate of the population size for this trial.
    pub estimate: f64,

    /// Number of individuals captured and tagged in pass 1.
    pub first_pass_marked: usize,
    /// Number of individuals captured in pass 2.
    pub second_pass_caught: usize,
    /// Number of pass-2 captures that still carried a pass-1 tag.
    pub recaptured_tagged: usize,

    /// Full population of this trial, retained for drill-down review.
    pub individuals: Vec<Individual>,
}

/// Aggregate result of a full simulation run.
///
/// Created once all trials complete (or the run is cancelled) and immutable
/// thereafter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationSummary {
    /// Number of trials that actually completed.
    pub n_trials: usize,

    /// True population size shared by all trials.
    pub actual_population: usize,

    /// Summary statistics of the per-trial Chapman estimates.
    pub stats: EstimateStats,

    /// Human-readable description of the active configuration.
    pub description: String,

    /// Per-trial results in execution order.
    pub trials: Vec<TrialResult>,
}
