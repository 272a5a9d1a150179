use arrayvec::ArrayVec;
use rand::{
    Rng, SeedableRng as _,
    seq::{IndexedRandom as _, SliceRandom as _},
};
use rand_pcg::Pcg32;
use threes_engine::{Action, Board, CELL_COUNT, Direction, SIDE};

use super::{Agent, Role};
use crate::{ProtocolError, config::AgentConfig};

/// Seeds an agent's generator from the `seed` key, or from `rng` when the
/// key is absent.
fn agent_rng<R>(config: &AgentConfig, rng: &mut R) -> Pcg32
where
    R: Rng,
{
    let seed = config.seed.unwrap_or_else(|| rng.random());
    Pcg32::seed_from_u64(seed)
}

/// A slider that picks uniformly among the legal directions.
#[derive(Debug)]
pub struct RandomSlider {
    name: String,
    rng: Pcg32,
}

impl RandomSlider {
    #[must_use]
    pub fn new(name: impl Into<String>, rng: Pcg32) -> Self {
        Self {
            name: name.into(),
            rng,
        }
    }

    pub fn from_config<R>(config: &AgentConfig, rng: &mut R) -> Self
    where
        R: Rng,
    {
        Self::new(config.name_or("random"), agent_rng(config, rng))
    }
}

impl Agent for RandomSlider {
    fn name(&self) -> &str {
        &self.name
    }

    fn role(&self) -> Role {
        Role::Slider
    }

    fn take_action(&mut self, board: &Board) -> Result<Action, ProtocolError> {
        let mut directions = Direction::ALL;
        directions.shuffle(&mut self.rng);
        let direction = directions
            .into_iter()
            .find(|&direction| board.slide(direction).is_some());
        Ok(direction.map_or(Action::NoOp, Action::Slide))
    }
}

/// The environment: places the announced tile on a random empty cell of the
/// edge the tiles just slid away from, and draws the next hint from the bag.
///
/// | last slide | candidate cells      |
/// |------------|----------------------|
/// | none       | any                  |
/// | up         | bottom row (12-15)   |
/// | right      | left column (0, 4, 8, 12) |
/// | down       | top row (0-3)        |
/// | left       | right column (3, 7, 11, 15) |
#[derive(Debug)]
pub struct RandomPlacer {
    name: String,
    rng: Pcg32,
}

impl RandomPlacer {
    #[must_use]
    pub fn new(name: impl Into<String>, rng: Pcg32) -> Self {
        Self {
            name: name.into(),
            rng,
        }
    }

    pub fn from_config<R>(config: &AgentConfig, rng: &mut R) -> Self
    where
        R: Rng,
    {
        Self::new(config.name_or("random-placer"), agent_rng(config, rng))
    }
}

/// Returns the cells a tile may enter after a slide in `last_slide`.
#[must_use]
pub fn entry_cells(last_slide: Option<Direction>) -> ArrayVec<usize, CELL_COUNT> {
    let edge = |index: usize| match last_slide {
        None => true,
        Some(Direction::Up) => index / SIDE == SIDE - 1,
        Some(Direction::Right) => index % SIDE == 0,
        Some(Direction::Down) => index / SIDE == 0,
        Some(Direction::Left) => index % SIDE == SIDE - 1,
    };
    (0..CELL_COUNT).filter(|&index| edge(index)).collect()
}

impl Agent for RandomPlacer {
    fn name(&self) -> &str {
        &self.name
    }

    fn role(&self) -> Role {
        Role::Placer
    }

    fn take_action(&mut self, board: &Board) -> Result<Action, ProtocolError> {
        let mut cells = entry_cells(board.last_slide());
        cells.retain(|&mut index| board.cell_at(index) == 0);
        let Some(&position) = cells.choose(&mut self.rng) else {
            return Ok(Action::NoOp);
        };

        let mut bag = board.bag().tiles();
        bag.shuffle(&mut self.rng);
        let tile = match board.hint() {
            0 => bag.pop(),
            hint => Some(hint),
        };
        let (Some(tile), Some(hint)) = (tile, bag.pop()) else {
            return Ok(Action::NoOp);
        };
        Ok(Action::Place {
            position,
            tile,
            hint,
        })
    }
}
