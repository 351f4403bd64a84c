use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::{
    fmt::{Debug, Write},
    fs,
    ops::RangeBounds,
    path::Path,
};

/// Simulation configuration parameters.
///
/// Loaded from a TOML file and validated before use, so the simulation core
/// never re-checks ranges on access. See [`Config::from_file`] for loading.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Config {
    pub population: Population,
    pub capture: Capture,
    pub tagging: Tagging,
    pub spatial: Spatial,
    pub trials: Trials,
}

/// Population regime: closed, or open with mortality and migration.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Population {
    Closed {
        size: usize,
    },
    Open {
        size: usize,
        /// Migration bias in [-0.5, 0.5]: negative drifts downstream, zero is
        /// balanced, positive drifts upstream.
        migration_bias: f64,
        /// Fraction of the maximum displacement an individual migrates.
        migration_distance: f64,
        mortality_prob: f64,
    },
}

impl Population {
    pub fn size(&self) -> usize {
        match self {
            Population::Closed { size } | Population::Open { size, .. } => *size,
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, Population::Open { .. })
    }
}

/// Capture-probability policy, applied per individual per pass.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "kebab-case")]
pub enum Capture {
    /// Same capture probability in both passes.
    Equal { prob: f64 },
    /// Independently configured probabilities for the two passes.
    Vary { prob_pass_one: f64, prob_pass_two: f64 },
    /// The capture probability itself is drawn uniformly per individual per pass.
    RandomPerIndividual,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Tagging {
    pub tag_loss: bool,
    #[serde(default)]
    pub tag_loss_prob: f64,
}

/// Sub-reach policy: whether capture is restricted to a bounded window of the
/// study domain.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "kebab-case")]
pub enum Spatial {
    NotAFactor,
    /// A window of `fraction` of the reach, centered on the reach.
    BoundedSubReach { fraction: f64 },
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Trials {
    pub count: usize,
    /// Master seed for the per-trial random streams. Drawn from the OS if absent.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Config {
    /// Load a [`Config`] from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, deserialized, or if the
    /// configuration values are invalid.
    pub fn from_file<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        let contents =
            fs::read_to_string(file).with_context(|| format!("failed to read {file:?}"))?;

        let config: Config = toml::from_str(&contents).context("failed to deserialize config")?;

        config.validate().context("failed to validate config")?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        check_num(self.population.size(), 1..1_000_000).context("invalid population size")?;

        if let Population::Open {
            migration_bias,
            migration_distance,
            mortality_prob,
            ..
        } = &self.population
        {
            check_num(*migration_bias, -0.5..=0.5).context("invalid migration bias")?;
            check_num(*migration_distance, 0.0..=1.0).context("invalid migration distance")?;
            check_num(*mortality_prob, 0.0..=1.0).context("invalid mortality probability")?;
        }

        match &self.capture {
            Capture::Equal { prob } => {
                check_num(*prob, 0.0..=1.0).context("invalid capture probability")?;
            }
            Capture::Vary {
                prob_pass_one,
                prob_pass_two,
            } => {
                check_num(*prob_pass_one, 0.0..=1.0)
                    .context("invalid pass-1 capture probability")?;
                check_num(*prob_pass_two, 0.0..=1.0)
                    .context("invalid pass-2 capture probability")?;
            }
            Capture::RandomPerIndividual => {}
        }

        check_num(self.tagging.tag_loss_prob, 0.0..=1.0)
            .context("invalid tag loss probability")?;

        if let Spatial::BoundedSubReach { fraction } = &self.spatial {
            check_num(*fraction, 0.0..=1.0).context("invalid sub-reach fraction")?;
        }

        check_num(self.trials.count, 1..=1_000_000).context("invalid number of trials")?;

        Ok(())
    }

    /// Build the display text describing the active policies, carried on the
    /// simulation summary.
    pub fn describe(&self) -> String {
        let mut text = String::new();

        match &self.population {
            Population::Closed { size } => {
                let _ = write!(text, "closed population of {size}");
            }
            Population::Open {
                size,
                migration_bias,
                migration_distance,
                mortality_prob,
            } => {
                let _ = write!(
                    text,
                    "open population of {size} \
                     (migration bias {migration_bias}, distance {migration_distance}, \
                     mortality {mortality_prob})"
                );
            }
        }

        match &self.capture {
            Capture::Equal { prob } => {
                let _ = write!(text, "; capture probability {prob} in both passes");
            }
            Capture::Vary {
                prob_pass_one,
                prob_pass_two,
            } => {
                let _ = write!(
                    text,
                    "; capture probabilities {prob_pass_one} / {prob_pass_two}"
                );
            }
            Capture::RandomPerIndividual => {
                let _ = write!(text, "; capture probability randomized per individual");
            }
        }

        if self.tagging.tag_loss {
            let _ = write!(text, "; tag loss probability {}", self.tagging.tag_loss_prob);
        }

        match &self.spatial {
            Spatial::NotAFactor => {}
            Spatial::BoundedSubReach { fraction } => {
                let _ = write!(text, "; sub-reach fraction {fraction}");
            }
        }

        let _ = write!(text, "; {} trials", self.trials.count);

        text
    }
}

fn check_num<T, R>(num: T, range: R) -> Result<()>
where
    T: PartialOrd + Debug,
    R: RangeBounds<T> + Debug,
{
    if !range.contains(&num) {
        bail!("number must be in the range {range:?}, but is {num:?}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> Config {
        Config {
            population: Population::Closed { size: 100 },
            capture: Capture::Equal { prob: 0.3 },
            tagging: Tagging {
                tag_loss: false,
                tag_loss_prob: 0.0,
            },
            spatial: Spatial::NotAFactor,
            trials: Trials {
                count: 10,
                seed: Some(1),
            },
        }
    }

    #[test]
    fn base_config_is_valid() {
        base_config().validate().unwrap();
    }

    #[test]
    fn zero_population_is_rejected() {
        let mut cfg = base_config();
        cfg.population = Population::Closed { size: 0 };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn capture_probability_above_one_is_rejected() {
        let mut cfg = base_config();
        cfg.capture = Capture::Equal { prob: 1.5 };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn migration_bias_outside_band_is_rejected() {
        let mut cfg = base_config();
        cfg.population = Population::Open {
            size: 100,
            migration_bias: 0.7,
            migration_distance: 0.2,
            mortality_prob: 0.1,
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn zero_trials_is_rejected() {
        let mut cfg = base_config();
        cfg.trials.count = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn config_round_trips_through_toml() {
        let toml_str = r#"
            [population]
            kind = "open"
            size = 500
            migration_bias = -0.25
            migration_distance = 0.4
            mortality_prob = 0.05

            [capture]
            policy = "vary"
            prob_pass_one = 0.3
            prob_pass_two = 0.2

            [tagging]
            tag_loss = true
            tag_loss_prob = 0.1

            [spatial]
            mode = "bounded-sub-reach"
            fraction = 0.5

            [trials]
            count = 200
            seed = 7
        "#;

        let cfg: Config = toml::from_str(toml_str).unwrap();
        cfg.validate().unwrap();
        assert_eq!(cfg.population.size(), 500);
        assert!(cfg.population.is_open());
        assert_eq!(cfg.spatial, Spatial::BoundedSubReach { fraction: 0.5 });
        assert_eq!(cfg.trials.seed, Some(7));
    }

    #[test]
    fn describe_names_the_active_policies() {
        let text = base_config().describe();
        assert!(text.contains("closed population of 100"));
        assert!(text.contains("capture probability 0.3"));
        assert!(text.contains("10 trials"));
    }
}
