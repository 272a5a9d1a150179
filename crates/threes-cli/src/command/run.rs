use std::{
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicUsize, Ordering},
        mpsc,
    },
    thread,
};

use anyhow::{Context as _, bail};
use chrono::Utc;
use rand::SeedableRng as _;
use rand_pcg::Pcg32;
use threes_agent::{
    agent::{Agent, RandomPlacer, Role, SliderKind},
    config::AgentConfig,
    episode::play_episode,
    weights::WeightStore,
};
use threes_engine::face_value;

use crate::{
    schema::run_summary::{BestEpisode, RunSummary},
    statistics::{EpisodeSummary, Statistics},
    util::Output,
};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct RunArg {
    /// Number of episodes to play
    #[arg(long, default_value_t = 1000)]
    pub(crate) total: usize,
    /// Number of episodes per statistics block
    #[arg(long, default_value_t = 1000)]
    pub(crate) block: usize,
    /// Maximum number of slides per episode (0 for no limit)
    #[arg(long, default_value_t = 0)]
    pub(crate) limit: usize,
    /// Slider arguments, e.g. "name=six-tuple alpha=0.003 save=weights.bin"
    #[arg(long, default_value = "")]
    pub(crate) slide: AgentConfig,
    /// Placer arguments, e.g. "seed=42"
    #[arg(long, default_value = "")]
    pub(crate) place: AgentConfig,
    /// Number of worker threads sharing the slider's weights
    #[arg(long, default_value_t = 1)]
    pub(crate) threads: usize,
    /// Seed for agents whose arguments have no seed
    #[arg(long)]
    pub(crate) seed: Option<u64>,
    /// Write a JSON summary of the run to this path
    #[arg(long)]
    pub(crate) summary: Option<PathBuf>,
}

#[derive(Debug)]
struct Worker {
    slider: Box<dyn Agent>,
    placer: Box<dyn Agent>,
}

fn check_role(config: &AgentConfig, expected: Role) -> anyhow::Result<()> {
    match config.role.as_deref() {
        Some(role) if role != expected.to_string() => {
            bail!("{expected} arguments declare role {role:?}")
        }
        _ => Ok(()),
    }
}

pub(crate) fn run(arg: &RunArg) -> anyhow::Result<()> {
    let started_at = Utc::now();
    check_role(&arg.slide, Role::Slider)?;
    check_role(&arg.place, Role::Placer)?;

    let kind = SliderKind::from_config(&arg.slide)?;
    let weights = kind
        .load_weights(&arg.slide)
        .context("Failed to prepare slider weights")?;
    if arg.slide.save.is_some() && weights.is_none() {
        log::warn!("{kind} slider has no weights, ignoring save=");
    }

    let mut rng = match arg.seed {
        Some(seed) => Pcg32::seed_from_u64(seed),
        None => Pcg32::from_rng(&mut rand::rng()),
    };
    let threads = arg.threads.max(1);
    let workers = (0..threads)
        .map(|_| {
            let slider = kind.build(&arg.slide, weights.as_ref(), &mut rng)?;
            let placer: Box<dyn Agent> = Box::new(RandomPlacer::from_config(&arg.place, &mut rng));
            Ok(Worker { slider, placer })
        })
        .collect::<anyhow::Result<Vec<_>>>()?;
    let slider_name = workers[0].slider.name().to_owned();
    let placer_name = workers[0].placer.name().to_owned();

    log::info!(
        "playing {} episodes of {slider_name} against {placer_name} on {threads} thread(s)",
        arg.total
    );
    let stats = play_all(arg, workers)?;

    let saved_weights = match (&arg.slide.save, &weights) {
        (Some(path), Some(weights)) => {
            save_weights(weights, path)?;
            Some(path.clone())
        }
        _ => None,
    };

    log::info!(
        "finished {} episodes, mean score {:.1}",
        stats.episodes(),
        stats.mean_score()
    );

    if let Some(path) = &arg.summary {
        let summary = RunSummary {
            slider: slider_name,
            placer: placer_name,
            started_at,
            finished_at: Utc::now(),
            threads,
            episodes: stats.episodes(),
            mean_score: stats.mean_score(),
            best: stats.best().map(|best| BestEpisode {
                score: best.score,
                max_tile: face_value(best.max_tile),
                slides: best.slides,
                final_board: best.final_board,
            }),
            blocks: stats.blocks().to_vec(),
            weights: saved_weights,
        };
        Output::save_json(&summary, Some(path.clone()))?;
        log::info!("run summary saved to {}", path.display());
    }

    Ok(())
}

/// Plays `arg.total` episodes spread over the workers, printing each block of
/// statistics as it completes.
fn play_all(arg: &RunArg, workers: Vec<Worker>) -> anyhow::Result<Statistics> {
    let next_episode = AtomicUsize::new(0);
    let max_slides = (arg.limit > 0).then_some(arg.limit);
    let mut stats = Statistics::new(arg.block);

    thread::scope(|s| -> anyhow::Result<()> {
        let (tx, rx) = mpsc::channel();
        let handles: Vec<_> = workers
            .into_iter()
            .map(|mut worker| {
                let tx = tx.clone();
                let next_episode = &next_episode;
                s.spawn(move || -> anyhow::Result<()> {
                    while next_episode.fetch_add(1, Ordering::Relaxed) < arg.total {
                        let record = play_episode(
                            worker.slider.as_mut(),
                            worker.placer.as_mut(),
                            max_slides,
                        )?;
                        if tx.send(EpisodeSummary::from(&record)).is_err() {
                            break;
                        }
                    }
                    Ok(())
                })
            })
            .collect();
        drop(tx);

        for episode in rx {
            if let Some(block) = stats.push(episode) {
                print!("{block}");
            }
        }
        for handle in handles {
            match handle.join() {
                Ok(result) => result?,
                Err(panic) => std::panic::resume_unwind(panic),
            }
        }
        Ok(())
    })?;

    if let Some(block) = stats.finish() {
        print!("{block}");
    }
    Ok(stats)
}

fn save_weights(weights: &WeightStore, path: &Path) -> anyhow::Result<()> {
    weights
        .save(path)
        .with_context(|| format!("Failed to save weights to {}", path.display()))
}
