use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use threes_engine::{Board, Reward};

use crate::statistics::BlockSummary;

/// JSON record of one `threes run`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RunSummary {
    pub slider: String,
    pub placer: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub threads: usize,
    pub episodes: usize,
    pub mean_score: f64,
    pub best: Option<BestEpisode>,
    pub blocks: Vec<BlockSummary>,
    /// Where the slider's weights were written, if they were.
    pub weights: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BestEpisode {
    pub score: Reward,
    pub max_tile: u32,
    pub slides: usize,
    pub final_board: Board,
}
