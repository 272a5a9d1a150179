use std::sync::Arc;

use threes_engine::{Action, Board, Direction};

use super::{Agent, Role};
use crate::{
    AgentError, ConfigurationError, ProtocolError,
    board::GameBoard,
    config::AgentConfig,
    n_tuple::NTupleNetwork,
    trajectory::{self, Trajectory, UpdateStats, ValueConvention},
    weights::WeightStore,
};

/// The two learning sliders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum TupleVariant {
    /// Rows and columns, recording `V(after) + reward` per decision.
    #[display("four-tuple")]
    FourTuple,
    /// Four 6-tuples over all symmetries, recording `V(after)` per decision.
    #[display("six-tuple")]
    SixTuple,
}

impl TupleVariant {
    #[must_use]
    pub fn network(self) -> NTupleNetwork {
        match self {
            Self::FourTuple => NTupleNetwork::four_tuple(),
            Self::SixTuple => NTupleNetwork::six_tuple(),
        }
    }

    #[must_use]
    pub fn convention(self) -> ValueConvention {
        match self {
            Self::FourTuple => ValueConvention::IncludeReward,
            Self::SixTuple => ValueConvention::ExcludeReward,
        }
    }
}

/// Builds the weight store described by `config` for `network`.
///
/// `init=` creates zeroed tables of the listed sizes. `load=` then reads a
/// weight file, replacing whatever `init=` created. With neither key the
/// store is shaped after the network. The result must match the network's
/// table layout.
pub fn load_weights(
    config: &AgentConfig,
    network: &NTupleNetwork,
) -> Result<WeightStore, AgentError> {
    let mut weights = WeightStore::new();
    if let Some(sizes) = &config.init {
        weights.initialize(sizes)?;
    }
    if let Some(path) = &config.load {
        weights = WeightStore::load(path)?;
    }
    if !weights.is_initialized() {
        weights.initialize(&network.table_sizes())?;
    }
    network.check_layout(&weights)?;
    Ok(weights)
}

/// The learning rate used when none is configured: 0.1 spread over the
/// network's tables.
#[must_use]
pub fn default_alpha(network: &NTupleNetwork) -> f32 {
    #[expect(clippy::cast_precision_loss)]
    let tables = network.table_count() as f32;
    0.1 / tables
}

/// A slider that picks the slide with the best `reward + V(afterstate)` and
/// learns `V` by backward TD(0) at the end of every episode.
///
/// Copies made with [`TdAgent::worker`] share the weight store, so several
/// threads can train one network.
#[derive(Debug)]
pub struct TdAgent<B = Board> {
    name: String,
    network: NTupleNetwork,
    convention: ValueConvention,
    weights: Arc<WeightStore>,
    alpha: f32,
    trajectory: Trajectory<B>,
    episode_open: bool,
}

impl<B> TdAgent<B>
where
    B: GameBoard,
{
    /// Creates an agent on an existing weight store.
    ///
    /// Fails if the store's tables do not match the network.
    pub fn new(
        name: impl Into<String>,
        network: NTupleNetwork,
        convention: ValueConvention,
        weights: Arc<WeightStore>,
        alpha: f32,
    ) -> Result<Self, ConfigurationError> {
        network.check_layout(&weights)?;
        Ok(Self {
            name: name.into(),
            network,
            convention,
            weights,
            alpha,
            trajectory: Trajectory::new(),
            episode_open: false,
        })
    }

    /// Creates a learning slider of `variant` with the name and learning rate
    /// from `config`.
    pub fn from_config(
        variant: TupleVariant,
        config: &AgentConfig,
        weights: Arc<WeightStore>,
    ) -> Result<Self, ConfigurationError> {
        let network = variant.network();
        let alpha = config.alpha.unwrap_or_else(|| default_alpha(&network));
        let name = config.name_or(&variant.to_string()).to_owned();
        log::debug!("{name}: alpha = {alpha}");
        Self::new(name, network, variant.convention(), weights, alpha)
    }

    /// Returns an agent with the same network and weights and an empty
    /// history.
    #[must_use]
    pub fn worker(&self) -> Self {
        Self {
            name: self.name.clone(),
            network: self.network.clone(),
            convention: self.convention,
            weights: Arc::clone(&self.weights),
            alpha: self.alpha,
            trajectory: Trajectory::new(),
            episode_open: false,
        }
    }

    #[must_use]
    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    #[must_use]
    pub fn network(&self) -> &NTupleNetwork {
        &self.network
    }

    #[must_use]
    pub fn weights(&self) -> &Arc<WeightStore> {
        &self.weights
    }

    #[must_use]
    pub fn trajectory(&self) -> &Trajectory<B> {
        &self.trajectory
    }

    #[must_use]
    pub fn is_episode_open(&self) -> bool {
        self.episode_open
    }

    /// Returns the network's estimate `V(board)`.
    #[must_use]
    pub fn evaluate(&self, board: &B) -> f32 {
        self.network.evaluate(&self.weights, board)
    }

    pub fn begin_episode(&mut self) -> Result<(), ProtocolError> {
        if self.episode_open {
            return Err(ProtocolError::EpisodeAlreadyOpen);
        }
        self.trajectory.clear();
        self.episode_open = true;
        Ok(())
    }

    /// Chooses a slide for `board` and records it.
    ///
    /// Directions are tried in opcode order and scored by
    /// `V(afterstate) + reward`. The first legal direction is taken as the
    /// initial best and only a strictly higher score replaces it, so ties go
    /// to the lowest opcode. Returns `None`, recording nothing, when no slide
    /// is legal.
    pub fn select(&mut self, board: &B) -> Result<Option<Direction>, ProtocolError> {
        if !self.episode_open {
            return Err(ProtocolError::EpisodeNotOpen);
        }

        let mut best: Option<Candidate<B>> = None;
        for direction in Direction::ALL {
            let Some((after, reward)) = board.slide(direction) else {
                continue;
            };
            #[expect(clippy::cast_precision_loss)]
            let reward = reward as f32;
            let candidate = Candidate {
                direction,
                after,
                reward,
                estimate: self.evaluate(&after),
            };
            if best.as_ref().is_none_or(|best| candidate.score() > best.score()) {
                best = Some(candidate);
            }
        }

        let Some(best) = best else {
            log::trace!("{}: no legal slide", self.name);
            return Ok(None);
        };
        log::trace!(
            "{}: slide {} (reward {}, estimate {:.3})",
            self.name,
            best.direction,
            best.reward,
            best.estimate
        );
        let value = self.convention.recorded_value(best.estimate, best.reward);
        self.trajectory.record(best.after, best.reward, value);
        Ok(Some(best.direction))
    }

    /// Trains on the finished episode and forgets it.
    pub fn end_episode(&mut self) -> Result<UpdateStats, ProtocolError> {
        if !self.episode_open {
            return Err(ProtocolError::EpisodeNotOpen);
        }
        self.episode_open = false;
        Ok(trajectory::backward_update(
            &mut self.trajectory,
            &self.network,
            &self.weights,
            self.alpha,
            self.convention,
        ))
    }
}

struct Candidate<B> {
    direction: Direction,
    after: B,
    reward: f32,
    estimate: f32,
}

impl<B> Candidate<B> {
    fn score(&self) -> f32 {
        self.estimate + self.reward
    }
}

impl Agent for TdAgent<Board> {
    fn name(&self) -> &str {
        &self.name
    }

    fn role(&self) -> Role {
        Role::Slider
    }

    fn open_episode(&mut self, flag: &str) -> Result<(), ProtocolError> {
        log::trace!("{}: open episode against {flag}", self.name);
        self.begin_episode()
    }

    fn close_episode(&mut self, flag: &str) -> Result<(), ProtocolError> {
        let stats = self.end_episode()?;
        log::debug!(
            "{}: closed episode (last move by {flag}), {} updates, mean |td| {:.3}, max |td| {:.3}",
            self.name,
            stats.steps,
            stats.mean_abs_error,
            stats.max_abs_error
        );
        Ok(())
    }

    fn take_action(&mut self, board: &Board) -> Result<Action, ProtocolError> {
        let direction = self.select(board)?;
        Ok(direction.map_or(Action::NoOp, Action::Slide))
    }
}
