use crate::aggregator::{Aggregator, History};
use crate::config::Config;
use crate::model::SimulationSummary;
use anyhow::{Context, Result, bail};
use glob::glob;
use rmp_serde::{decode, encode};
use std::{
    fs::{self, File},
    io::{BufReader, BufWriter, Write},
    path::{Path, PathBuf},
    sync::atomic::AtomicBool,
};

/// Simulation-directory shell around the core.
///
/// A sim dir holds one `config.toml` plus the numbered results of every
/// completed simulation, so a session's history survives across invocations.
pub struct Manager {
    sim_dir: PathBuf,
    cfg: Config,
}

impl Manager {
    pub fn new<P: AsRef<Path>>(sim_dir: P) -> Result<Self> {
        let sim_dir = sim_dir.as_ref().to_path_buf();

        let cfg =
            Config::from_file(sim_dir.join("config.toml")).context("failed to construct cfg")?;
        log::info!("{cfg:#?}");

        Ok(Self { sim_dir, cfg })
    }

    /// Run a full simulation and save it under the next sequence number.
    pub fn run_simulation(&self) -> Result<()> {
        let seq = self.count_results_files().context("failed to count results files")?;

        let aggregator = Aggregator::new(self.cfg.clone());
        let summary = aggregator
            .run(&AtomicBool::new(false))
            .context("failed to run simulation")?;

        log_summary(seq, &summary);

        let results_file = self.results_file(seq);
        let file = File::create(&results_file)
            .with_context(|| format!("failed to create {results_file:?}"))?;
        let mut writer = BufWriter::new(file);
        encode::write(&mut writer, &summary).context("failed to serialize summary")?;
        writer.flush().context("failed to flush writer stream")?;
        log::info!("saved {results_file:?}");

        Ok(())
    }

    /// Print the summary of a saved simulation (the latest one by default).
    pub fn report(&self, seq: Option<usize>) -> Result<()> {
        let history = self.load_history()?;
        let (seq, summary) = select(&history, seq)?;
        log_summary(seq, summary);
        Ok(())
    }

    /// Export a saved simulation to tab-separated text, one file of trial
    /// rows and one of individual rows.
    pub fn export(&self, seq: Option<usize>) -> Result<()> {
        let history = self.load_history()?;
        let (seq, summary) = select(&history, seq)?;

        let trials_file = self.trials_file(seq);
        write_trials(&trials_file, summary)
            .with_context(|| format!("failed to write {trials_file:?}"))?;
        log::info!("saved {trials_file:?}");

        let individuals_file = self.individuals_file(seq);
        write_individuals(&individuals_file, summary)
            .with_context(|| format!("failed to write {individuals_file:?}"))?;
        log::info!("saved {individuals_file:?}");

        Ok(())
    }

    /// Delete all saved results and exports, keeping the config.
    pub fn clean(&self) -> Result<()> {
        for pattern in ["results-*.msgpack", "trials-*.tsv", "individuals-*.tsv"] {
            for path in self.glob_files(pattern)? {
                fs::remove_file(&path).with_context(|| format!("failed to remove {path:?}"))?;
                log::info!("removed {path:?}");
            }
        }
        Ok(())
    }

    fn load_summary(&self, seq: usize) -> Result<SimulationSummary> {
        let results_file = self.results_file(seq);
        let file = File::open(&results_file)
            .with_context(|| format!("failed to open {results_file:?}"))?;
        let mut reader = BufReader::new(file);
        decode::from_read(&mut reader).context("failed to deserialize summary")
    }

    /// Load every saved summary into the in-memory session history, in
    /// sequence order.
    fn load_history(&self) -> Result<History> {
        let n_results = self.count_results_files().context("failed to count results files")?;
        let mut history = History::new();
        for seq in 0..n_results {
            history.push(self.load_summary(seq)?);
        }
        Ok(history)
    }

    fn glob_files(&self, pattern: &str) -> Result<Vec<PathBuf>> {
        let pattern = self.sim_dir.join(pattern);
        let pattern = pattern.to_str().context("pattern is not valid UTF-8")?;
        let paths = glob(pattern)
            .context("failed to glob files")?
            .filter_map(Result::ok)
            .collect();
        Ok(paths)
    }

    fn count_results_files(&self) -> Result<usize> {
        Ok(self.glob_files("results-*.msgpack")?.len())
    }

    fn results_file(&self, seq: usize) -> PathBuf {
        self.sim_dir.join(format!("results-{seq:04}.msgpack"))
    }

    fn trials_file(&self, seq: usize) -> PathBuf {
        self.sim_dir.join(format!("trials-{seq:04}.tsv"))
    }

    fn individuals_file(&self, seq: usize) -> PathBuf {
        self.sim_dir.join(format!("individuals-{seq:04}.tsv"))
    }
}

/// Pick a summary from the session history by sequence number, defaulting to
/// the most recent.
fn select(history: &History, seq: Option<usize>) -> Result<(usize, &SimulationSummary)> {
    if history.is_empty() {
        bail!("no saved simulations");
    }
    let seq = seq.unwrap_or(history.len() - 1);
    let summary = history
        .get(seq)
        .with_context(|| format!("simulation {seq} does not exist ({} saved)", history.len()))?;
    Ok((seq, summary))
}

fn log_summary(seq: usize, summary: &SimulationSummary) {
    log::info!("simulation {seq}: {}", summary.description);
    log::info!("trials completed: {}", summary.n_trials);
    log::info!("actual population: {}", summary.actual_population);
    log::info!("mean estimate: {:.4}", summary.stats.mean);
    log::info!("median estimate: {:.4}", summary.stats.median);
    log::info!(
        "quartiles (0/25/50/75/100): {:.4} / {:.4} / {:.4} / {:.4} / {:.4}",
        summary.stats.quartiles[0],
        summary.stats.quartiles[1],
        summary.stats.quartiles[2],
        summary.stats.quartiles[3],
        summary.stats.quartiles[4],
    );
    log::info!("skewness: {:.4}", summary.stats.skewness);
}

fn write_trials(path: &Path, summary: &SimulationSummary) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    writeln!(
        writer,
        "trial\tactual_population\testimate\tfirst_pass_marked\tsecond_pass_caught\trecaptured_tagged"
    )?;
    for (trial_idx, trial) in summary.trials.iter().enumerate() {
        writeln!(
            writer,
            "{trial_idx}\t{}\t{}\t{}\t{}\t{}",
            trial.actual_population,
            trial.estimate,
            trial.first_pass_marked,
            trial.second_pass_caught,
            trial.recaptured_tagged,
        )?;
    }

    writer.flush()?;
    Ok(())
}

fn write_individuals(path: &Path, summary: &SimulationSummary) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    writeln!(
        writer,
        "trial\tdraw_pass_one\tdraw_pass_two\ttag\ttag_lost\tpos_pass_one\tpos_pass_two\talive\toutcome"
    )?;
    for (trial_idx, trial) in summary.trials.iter().enumerate() {
        for ind in &trial.individuals {
            writeln!(
                writer,
                "{trial_idx}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
                ind.draw_pass_one,
                ind.draw_pass_two,
                ind.tag.label(),
                ind.tag_lost,
                ind.pos_pass_one,
                ind.pos_pass_two,
                ind.alive,
                ind.outcome.label(),
            )?;
        }
    }

    writer.flush()?;
    Ok(())
}
