//! One game between a slider and a placer.
//!
//! The placer opens the game with [`INITIAL_PLACEMENTS`] tiles; afterwards the
//! two sides alternate, slider first. The game ends as soon as an agent
//! answers with an action that cannot be applied, normally a
//! [`Action::NoOp`] from a slider that has no legal slide left.

use std::time::{Duration, Instant};

use threes_engine::{Action, Board, Reward, Tile};

use crate::{AgentError, agent::Agent};

/// Number of tiles placed before the first slide.
pub const INITIAL_PLACEMENTS: usize = 9;

/// Outcome of a finished episode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodeRecord {
    /// Total reward earned by the slider.
    pub score: Reward,
    /// Largest tile rank on the final board.
    pub max_tile: Tile,
    pub slides: usize,
    pub placements: usize,
    /// Time spent in the slider's `take_action`.
    pub slide_time: Duration,
    /// Time spent in the placer's `take_action`.
    pub place_time: Duration,
    pub final_board: Board,
    /// Every applied action in order.
    pub actions: Vec<Action>,
}

/// Plays one episode, opening and closing both agents around it.
///
/// Agents are opened with the opponent's name and closed with the name of the
/// agent that made the final (rejected) move. When `max_slides` is given, the
/// game is cut short after that many slides.
pub fn play_episode(
    slider: &mut dyn Agent,
    placer: &mut dyn Agent,
    max_slides: Option<usize>,
) -> Result<EpisodeRecord, AgentError> {
    let placer_name = placer.name().to_owned();
    let slider_name = slider.name().to_owned();
    slider.open_episode(&format!("~:{placer_name}"))?;
    placer.open_episode(&format!("{slider_name}:~"))?;

    let mut board = Board::new();
    let mut record = EpisodeRecord {
        score: 0,
        max_tile: 0,
        slides: 0,
        placements: 0,
        slide_time: Duration::ZERO,
        place_time: Duration::ZERO,
        final_board: board,
        actions: Vec::new(),
    };

    let last_mover = loop {
        let step = record.actions.len();
        let slider_turn = step >= INITIAL_PLACEMENTS && (step - INITIAL_PLACEMENTS) % 2 == 0;
        if slider_turn && max_slides.is_some_and(|max| record.slides >= max) {
            break slider_name.as_str();
        }

        let (agent, elapsed): (&mut dyn Agent, &mut Duration) = if slider_turn {
            (&mut *slider, &mut record.slide_time)
        } else {
            (&mut *placer, &mut record.place_time)
        };
        let start = Instant::now();
        let action = agent.take_action(&board)?;
        *elapsed += start.elapsed();

        let Ok(reward) = action.apply(&mut board) else {
            log::trace!("{} ended the episode with {action}", agent.name());
            break if slider_turn {
                slider_name.as_str()
            } else {
                placer_name.as_str()
            };
        };
        if slider_turn {
            record.slides += 1;
            record.score += reward;
        } else {
            record.placements += 1;
        }
        record.actions.push(action);
    };

    slider.close_episode(last_mover)?;
    placer.close_episode(last_mover)?;

    record.max_tile = board.max_tile();
    record.final_board = board;
    Ok(record)
}
