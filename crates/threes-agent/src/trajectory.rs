//! Episode history and the backward TD(0) update.
//!
//! During an episode a learning agent records, for every slide it makes, the
//! afterstate it chose, the reward of that slide and the value it estimated.
//! When the episode closes a terminal sentinel (reward 0, value 0) is appended
//! and the history is replayed from the last decision to the first:
//!
//! ```text
//! afterstates:  a0   a1   ...  a(n-1)
//! rewards:      r0   r1   ...  r(n-1)  0
//! values:       v0   v1   ...  v(n-1)  0
//! ```
//!
//! Decision `i` is moved toward the one-step target
//! `r(i+1) + V(a(i+1))`, i.e. the reward earned from afterstate `a(i)` by the
//! next slide plus the estimated value of the next afterstate.

use crate::{board::GameBoard, n_tuple::NTupleNetwork, weights::WeightStore};

/// What the value recorded with each decision contains.
///
/// Both conventions lead to the same TD error; they differ in how it is
/// recovered from the recorded numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueConvention {
    /// The recorded value is `V(after) + reward`, the score the move was
    /// chosen by.
    IncludeReward,
    /// The recorded value is the network's estimate `V(after)` alone.
    ExcludeReward,
}

impl ValueConvention {
    /// Returns the number to record for a decision.
    #[must_use]
    pub fn recorded_value(self, estimate: f32, reward: f32) -> f32 {
        match self {
            Self::IncludeReward => estimate + reward,
            Self::ExcludeReward => estimate,
        }
    }

    /// Returns the TD error of decision `i` from a terminated history.
    fn td_error(self, rewards: &[f32], values: &[f32], i: usize) -> f32 {
        match self {
            Self::IncludeReward => values[i + 1] - (values[i] - rewards[i]),
            Self::ExcludeReward => values[i + 1] + rewards[i + 1] - values[i],
        }
    }
}

/// Decisions made so far in the current episode.
#[derive(Debug, Clone)]
pub struct Trajectory<B> {
    afterstates: Vec<B>,
    rewards: Vec<f32>,
    values: Vec<f32>,
}

impl<B> Default for Trajectory<B> {
    fn default() -> Self {
        Self {
            afterstates: Vec::new(),
            rewards: Vec::new(),
            values: Vec::new(),
        }
    }
}

impl<B> Trajectory<B> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one decision.
    ///
    /// # Panics
    ///
    /// Panics if the trajectory was already terminated.
    pub fn record(&mut self, afterstate: B, reward: f32, value: f32) {
        assert!(!self.is_terminated(), "recording into a terminated trajectory");
        self.afterstates.push(afterstate);
        self.rewards.push(reward);
        self.values.push(value);
    }

    /// Appends the terminal sentinel (reward 0, value 0).
    ///
    /// Does nothing if the sentinel is already present.
    pub fn terminate(&mut self) {
        if !self.is_terminated() {
            self.rewards.push(0.0);
            self.values.push(0.0);
        }
    }

    #[must_use]
    pub fn is_terminated(&self) -> bool {
        self.rewards.len() > self.afterstates.len()
    }

    /// Number of recorded decisions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.afterstates.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.afterstates.is_empty()
    }

    #[must_use]
    pub fn afterstates(&self) -> &[B] {
        &self.afterstates
    }

    #[must_use]
    pub fn rewards(&self) -> &[f32] {
        &self.rewards
    }

    #[must_use]
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn clear(&mut self) {
        self.afterstates.clear();
        self.rewards.clear();
        self.values.clear();
    }
}

/// Summary of one backward pass.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct UpdateStats {
    pub steps: usize,
    pub mean_abs_error: f32,
    pub max_abs_error: f32,
}

/// Replays a finished episode backward and trains `weights` on it, then
/// empties the trajectory.
///
/// For `i` from the last decision down to the first, `alpha · td(i)` is added
/// to every feature of `afterstates[i]`, where `td(i)` is computed from the
/// values recorded during play. The sentinel is appended first if missing.
pub fn backward_update<B>(
    trajectory: &mut Trajectory<B>,
    network: &NTupleNetwork,
    weights: &WeightStore,
    alpha: f32,
    convention: ValueConvention,
) -> UpdateStats
where
    B: GameBoard,
{
    trajectory.terminate();
    let steps = trajectory.len();
    let mut total_abs_error = 0.0;
    let mut max_abs_error: f32 = 0.0;
    for i in (0..steps).rev() {
        let td = convention.td_error(&trajectory.rewards, &trajectory.values, i);
        network.update(weights, &trajectory.afterstates[i], alpha * td);
        total_abs_error += td.abs();
        max_abs_error = max_abs_error.max(td.abs());
    }
    trajectory.clear();

    #[expect(clippy::cast_precision_loss)]
    let mean_abs_error = if steps == 0 {
        0.0
    } else {
        total_abs_error / steps as f32
    };
    UpdateStats {
        steps,
        mean_abs_error,
        max_abs_error,
    }
}
