//! Players of the game.
//!
//! Every player implements [`Agent`]. Sliders move the tiles; the placer plays
//! the environment, dropping a new tile after every slide.
//!
//! - [`TdAgent`] - Learning sliders (four-tuple and six-tuple networks)
//! - [`GreedySlider`] - Takes the slide with the largest immediate reward
//! - [`HeuristicSlider`] - Scores slides with a hand-written board heuristic
//! - [`RandomSlider`] - Slides in a random legal direction
//! - [`RandomPlacer`] - Places bag tiles on the edge opposite the last slide

use std::{fmt, str::FromStr, sync::Arc};

use rand::Rng;
use threes_engine::{Action, Board};

pub use self::{heuristic::*, random::*, td::*};
use crate::{
    AgentError, ConfigurationError, ProtocolError, config::AgentConfig, weights::WeightStore,
};

mod heuristic;
mod random;
mod td;

/// Which side of the game an agent plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum Role {
    #[display("slider")]
    Slider,
    #[display("placer")]
    Placer,
}

/// A participant in episodes.
///
/// An agent is driven through `open_episode`, any number of `take_action`
/// calls, and `close_episode`. Agents without per-episode state accept the
/// protocol calls in any order.
pub trait Agent: fmt::Debug + Send {
    fn name(&self) -> &str;

    fn role(&self) -> Role;

    /// Starts an episode. `flag` names the opponent.
    fn open_episode(&mut self, flag: &str) -> Result<(), ProtocolError> {
        let _ = flag;
        Ok(())
    }

    /// Ends the episode. `flag` names the agent that made the last move.
    fn close_episode(&mut self, flag: &str) -> Result<(), ProtocolError> {
        let _ = flag;
        Ok(())
    }

    /// Chooses the action to play on `board`, or [`Action::NoOp`] when there
    /// is nothing legal to do.
    fn take_action(&mut self, board: &Board) -> Result<Action, ProtocolError>;
}

/// The sliders that can be selected by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum SliderKind {
    #[display("random")]
    Random,
    #[display("greedy")]
    Greedy,
    #[display("heuristic")]
    Heuristic,
    #[display("{_0}")]
    Learning(TupleVariant),
}

impl FromStr for SliderKind {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "random" => Ok(Self::Random),
            "greedy" => Ok(Self::Greedy),
            "heuristic" => Ok(Self::Heuristic),
            "four-tuple" => Ok(Self::Learning(TupleVariant::FourTuple)),
            "six-tuple" => Ok(Self::Learning(TupleVariant::SixTuple)),
            _ => Err(ConfigurationError::UnknownAgent(s.to_owned())),
        }
    }
}

impl SliderKind {
    /// Selects the slider named in `config`, defaulting to the four-tuple
    /// learner.
    pub fn from_config(config: &AgentConfig) -> Result<Self, ConfigurationError> {
        config
            .name
            .as_deref()
            .map_or(Ok(Self::Learning(TupleVariant::FourTuple)), str::parse)
    }

    /// Builds the weight store a learning slider will share with its copies,
    /// or `None` for sliders that do not learn.
    pub fn load_weights(
        self,
        config: &AgentConfig,
    ) -> Result<Option<Arc<WeightStore>>, AgentError> {
        match self {
            Self::Learning(variant) => {
                let weights = load_weights(config, &variant.network())?;
                Ok(Some(Arc::new(weights)))
            }
            Self::Random | Self::Greedy | Self::Heuristic => Ok(None),
        }
    }

    /// Builds one slider.
    ///
    /// Learning sliders share `weights`, normally the store returned by
    /// [`SliderKind::load_weights`], and load their own when it is `None`.
    /// Randomized sliders without a `seed` key draw their seed from `rng`.
    pub fn build<R>(
        self,
        config: &AgentConfig,
        weights: Option<&Arc<WeightStore>>,
        rng: &mut R,
    ) -> Result<Box<dyn Agent>, AgentError>
    where
        R: Rng,
    {
        let agent: Box<dyn Agent> = match self {
            Self::Random => Box::new(RandomSlider::from_config(config, rng)),
            Self::Greedy => Box::new(GreedySlider::from_config(config)),
            Self::Heuristic => Box::new(HeuristicSlider::from_config(config)?),
            Self::Learning(variant) => {
                let weights = match weights {
                    Some(weights) => Arc::clone(weights),
                    None => Arc::new(load_weights(config, &variant.network())?),
                };
                Box::new(TdAgent::<Board>::from_config(variant, config, weights)?)
            }
        };
        Ok(agent)
    }
}
