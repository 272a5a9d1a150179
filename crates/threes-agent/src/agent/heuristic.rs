use threes_engine::{Action, Board, CELL_COUNT, Direction, Reward, SIDE};

use super::{Agent, Role};
use crate::{ConfigurationError, ProtocolError, config::AgentConfig};

/// Picks the legal slide with the largest `score`; ties go to the lowest
/// opcode.
fn best_slide<F>(board: &Board, mut score: F) -> Option<Direction>
where
    F: FnMut(&Board, Reward) -> f32,
{
    let mut best: Option<(Direction, f32)> = None;
    for direction in Direction::ALL {
        let Some((after, reward)) = board.slide(direction) else {
            continue;
        };
        let value = score(&after, reward);
        if best.is_none_or(|(_, best_value)| value > best_value) {
            best = Some((direction, value));
        }
    }
    best.map(|(direction, _)| direction)
}

/// A slider that maximizes the immediate reward.
#[derive(Debug)]
pub struct GreedySlider {
    name: String,
}

impl GreedySlider {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    #[must_use]
    pub fn from_config(config: &AgentConfig) -> Self {
        Self::new(config.name_or("greedy"))
    }
}

impl Agent for GreedySlider {
    fn name(&self) -> &str {
        &self.name
    }

    fn role(&self) -> Role {
        Role::Slider
    }

    fn take_action(&mut self, board: &Board) -> Result<Action, ProtocolError> {
        #[expect(clippy::cast_precision_loss)]
        let direction = best_slide(board, |_, reward| reward as f32);
        Ok(direction.map_or(Action::NoOp, Action::Slide))
    }
}

/// Weights of the terms [`HeuristicSlider`] adds to the reward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeuristicCoefficients {
    /// Per empty cell of the afterstate (`empty_square_coef`).
    pub empty_cell: f32,
    /// Per tile in the longest chain of strictly decreasing neighbours
    /// (`monotonic_structure_coef`).
    pub monotonic_chain: f32,
    /// Bonus for the largest tile sitting on an edge, doubled in a corner
    /// (`largest_placement_value_multiplier`).
    pub largest_placement: f32,
}

impl Default for HeuristicCoefficients {
    fn default() -> Self {
        Self {
            empty_cell: 5.0,
            monotonic_chain: 1.0,
            largest_placement: 2.0,
        }
    }
}

/// A slider that scores each afterstate by reward plus a weighted board
/// heuristic.
#[derive(Debug)]
pub struct HeuristicSlider {
    name: String,
    coefficients: HeuristicCoefficients,
}

impl HeuristicSlider {
    #[must_use]
    pub fn new(name: impl Into<String>, coefficients: HeuristicCoefficients) -> Self {
        Self {
            name: name.into(),
            coefficients,
        }
    }

    pub fn from_config(config: &AgentConfig) -> Result<Self, ConfigurationError> {
        let defaults = HeuristicCoefficients::default();
        let coefficients = HeuristicCoefficients {
            empty_cell: config
                .extra_parsed("empty_square_coef")?
                .unwrap_or(defaults.empty_cell),
            monotonic_chain: config
                .extra_parsed("monotonic_structure_coef")?
                .unwrap_or(defaults.monotonic_chain),
            largest_placement: config
                .extra_parsed("largest_placement_value_multiplier")?
                .unwrap_or(defaults.largest_placement),
        };
        Ok(Self::new(config.name_or("heuristic"), coefficients))
    }

    #[must_use]
    pub fn coefficients(&self) -> &HeuristicCoefficients {
        &self.coefficients
    }

    /// Returns the heuristic value of an afterstate, excluding the reward.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn evaluate(&self, board: &Board) -> f32 {
        let c = &self.coefficients;
        c.empty_cell * board.count_empty() as f32
            + c.monotonic_chain * longest_decreasing_chain(board) as f32
            + c.largest_placement * f32::from(edge_count(largest_tile_position(board)))
    }
}

impl Agent for HeuristicSlider {
    fn name(&self) -> &str {
        &self.name
    }

    fn role(&self) -> Role {
        Role::Slider
    }

    fn take_action(&mut self, board: &Board) -> Result<Action, ProtocolError> {
        #[expect(clippy::cast_precision_loss)]
        let direction = best_slide(board, |after, reward| {
            reward as f32 + self.evaluate(after)
        });
        Ok(direction.map_or(Action::NoOp, Action::Slide))
    }
}

/// Number of board edges cell `index` touches (0, 1 or 2).
fn edge_count(index: usize) -> u8 {
    let on_edge = |i: usize| u8::from(i == 0 || i == SIDE - 1);
    on_edge(index / SIDE) + on_edge(index % SIDE)
}

/// Position of the largest tile, the first one in row-major order on ties.
fn largest_tile_position(board: &Board) -> usize {
    let max = board.max_tile();
    (0..CELL_COUNT)
        .find(|&i| board.cell_at(i) == max)
        .unwrap_or(0)
}

/// Length of the longest path of orthogonally adjacent tiles whose ranks
/// strictly decrease along the path.
fn longest_decreasing_chain(board: &Board) -> usize {
    let cells = board.cells();
    let mut order: Vec<usize> = (0..CELL_COUNT).filter(|&i| cells[i] != 0).collect();
    order.sort_by_key(|&i| cells[i]);

    let mut chain = [0usize; CELL_COUNT];
    for &i in &order {
        let (row, col) = (i / SIDE, i % SIDE);
        let neighbours = [
            (row > 0).then(|| i - SIDE),
            (row + 1 < SIDE).then(|| i + SIDE),
            (col > 0).then(|| i - 1),
            (col + 1 < SIDE).then(|| i + 1),
        ];
        let longest_below = neighbours
            .into_iter()
            .flatten()
            .filter(|&j| cells[j] != 0 && cells[j] < cells[i])
            .map(|j| chain[j])
            .max()
            .unwrap_or(0);
        chain[i] = longest_below + 1;
    }
    chain.into_iter().max().unwrap_or(0)
}
