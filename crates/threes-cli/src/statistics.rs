use std::{fmt, time::Duration};

use serde::{Deserialize, Serialize};
use threes_agent::episode::EpisodeRecord;
use threes_engine::{Board, MAX_RANK, Reward, Tile, face_value};

/// The parts of an [`EpisodeRecord`] the statistics need.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EpisodeSummary {
    pub score: Reward,
    pub max_tile: Tile,
    pub slides: usize,
    pub placements: usize,
    pub slide_time: Duration,
    pub place_time: Duration,
    pub final_board: Board,
}

impl From<&EpisodeRecord> for EpisodeSummary {
    fn from(record: &EpisodeRecord) -> Self {
        Self {
            score: record.score,
            max_tile: record.max_tile,
            slides: record.slides,
            placements: record.placements,
            slide_time: record.slide_time,
            place_time: record.place_time,
            final_board: record.final_board,
        }
    }
}

/// Share of a block's episodes that ended with a given maximum tile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileReach {
    /// Face value of the tile.
    pub tile: u32,
    /// Share of episodes whose maximum tile is at least this one.
    pub reached: f64,
    /// Share of episodes whose maximum tile is exactly this one.
    pub exact: f64,
}

/// Aggregate of one block of consecutive episodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockSummary {
    /// Number of episodes finished when the block closed.
    pub episodes_done: usize,
    pub episodes: usize,
    pub mean_score: f64,
    pub max_score: Reward,
    /// Actions per second of agent time, both sides together.
    pub ops_per_sec: f64,
    pub slides_per_sec: f64,
    pub placements_per_sec: f64,
    /// Reach rates for every maximum tile seen in the block, smallest first.
    pub tiles: Vec<TileReach>,
}

impl fmt::Display for BlockSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{}\tavg = {:.0}, max = {}, ops = {:.0} (slide {:.0} | place {:.0})",
            self.episodes_done,
            self.mean_score,
            self.max_score,
            self.ops_per_sec,
            self.slides_per_sec,
            self.placements_per_sec,
        )?;
        for reach in &self.tiles {
            writeln!(
                f,
                "\t{}\t{:.1}%\t({:.1}%)",
                reach.tile,
                reach.reached * 100.0,
                reach.exact * 100.0
            )?;
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct BlockAccumulator {
    episodes: usize,
    total_score: u64,
    max_score: Reward,
    slides: usize,
    placements: usize,
    slide_time: Duration,
    place_time: Duration,
    max_tiles: [usize; MAX_RANK as usize + 1],
}

impl BlockAccumulator {
    fn push(&mut self, episode: &EpisodeSummary) {
        self.episodes += 1;
        self.total_score += u64::from(episode.score);
        self.max_score = self.max_score.max(episode.score);
        self.slides += episode.slides;
        self.placements += episode.placements;
        self.slide_time += episode.slide_time;
        self.place_time += episode.place_time;
        self.max_tiles[usize::from(episode.max_tile)] += 1;
    }

    #[expect(clippy::cast_precision_loss)]
    fn summarize(&self, episodes_done: usize) -> BlockSummary {
        let episodes = self.episodes as f64;
        let rate = |count: usize, time: Duration| {
            let secs = time.as_secs_f64();
            if secs > 0.0 { count as f64 / secs } else { 0.0 }
        };

        let mut tiles = Vec::new();
        let mut at_least = self.episodes;
        for (rank, &count) in self.max_tiles.iter().enumerate() {
            if count > 0 {
                #[expect(clippy::cast_possible_truncation)]
                let tile = face_value(rank as Tile);
                tiles.push(TileReach {
                    tile,
                    reached: at_least as f64 / episodes,
                    exact: count as f64 / episodes,
                });
            }
            at_least -= count;
        }

        BlockSummary {
            episodes_done,
            episodes: self.episodes,
            mean_score: self.total_score as f64 / episodes,
            max_score: self.max_score,
            ops_per_sec: rate(
                self.slides + self.placements,
                self.slide_time + self.place_time,
            ),
            slides_per_sec: rate(self.slides, self.slide_time),
            placements_per_sec: rate(self.placements, self.place_time),
            tiles,
        }
    }
}

/// Collects episodes into blocks of a fixed size.
#[derive(Debug)]
pub struct Statistics {
    block_size: usize,
    episodes: usize,
    total_score: u64,
    best: Option<EpisodeSummary>,
    current: BlockAccumulator,
    blocks: Vec<BlockSummary>,
}

impl Statistics {
    /// Creates an empty collector; a `block_size` of 0 is treated as 1.
    pub fn new(block_size: usize) -> Self {
        Self {
            block_size: block_size.max(1),
            episodes: 0,
            total_score: 0,
            best: None,
            current: BlockAccumulator::default(),
            blocks: Vec::new(),
        }
    }

    /// Adds an episode, returning the block it completes, if any.
    pub fn push(&mut self, episode: EpisodeSummary) -> Option<&BlockSummary> {
        self.episodes += 1;
        self.total_score += u64::from(episode.score);
        if self.best.is_none_or(|best| episode.score > best.score) {
            self.best = Some(episode);
        }
        self.current.push(&episode);
        if self.current.episodes < self.block_size {
            return None;
        }
        self.close_block()
    }

    /// Closes the partially filled block, if any.
    pub fn finish(&mut self) -> Option<&BlockSummary> {
        if self.current.episodes == 0 {
            return None;
        }
        self.close_block()
    }

    fn close_block(&mut self) -> Option<&BlockSummary> {
        let block = std::mem::take(&mut self.current).summarize(self.episodes);
        self.blocks.push(block);
        self.blocks.last()
    }

    pub fn episodes(&self) -> usize {
        self.episodes
    }

    #[expect(clippy::cast_precision_loss)]
    pub fn mean_score(&self) -> f64 {
        if self.episodes == 0 {
            0.0
        } else {
            self.total_score as f64 / self.episodes as f64
        }
    }

    /// The highest-scoring episode, the earliest one on ties.
    pub fn best(&self) -> Option<&EpisodeSummary> {
        self.best.as_ref()
    }

    pub fn blocks(&self) -> &[BlockSummary] {
        &self.blocks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn episode(score: Reward, max_tile: Tile) -> EpisodeSummary {
        EpisodeSummary {
            score,
            max_tile,
            slides: 10,
            placements: 20,
            slide_time: Duration::from_millis(10),
            place_time: Duration::from_millis(10),
            final_board: Board::new(),
        }
    }

    #[test]
    fn test_blocks_close_at_block_size() {
        let mut stats = Statistics::new(2);
        assert!(stats.push(episode(10, 4)).is_none());
        let block = stats.push(episode(30, 6)).unwrap();
        assert_eq!(block.episodes_done, 2);
        assert_eq!(block.episodes, 2);
        assert_eq!(block.mean_score, 20.0);
        assert_eq!(block.max_score, 30);
        assert!(stats.push(episode(5, 3)).is_none());
        assert_eq!(stats.finish().map(|b| b.episodes), Some(1));
        assert!(stats.finish().is_none());
        assert_eq!(stats.blocks().len(), 2);
        assert_eq!(stats.episodes(), 3);
        assert_eq!(stats.mean_score(), 15.0);
        assert_eq!(stats.best().map(|b| b.score), Some(30));
    }

    #[test]
    fn test_tile_reach_rates() {
        let mut stats = Statistics::new(4);
        for max_tile in [4, 5, 5, 7] {
            stats.push(episode(0, max_tile));
        }
        let block = &stats.blocks()[0];
        let tiles: Vec<(u32, f64, f64)> = block
            .tiles
            .iter()
            .map(|t| (t.tile, t.reached, t.exact))
            .collect();
        assert_eq!(
            tiles,
            [(6, 1.0, 0.25), (12, 0.75, 0.5), (48, 0.25, 0.25)]
        );
    }

    #[test]
    fn test_operation_rates() {
        let mut stats = Statistics::new(1);
        let block = stats.push(episode(0, 3)).unwrap();
        assert_eq!(block.slides_per_sec, 1000.0);
        assert_eq!(block.placements_per_sec, 2000.0);
        assert_eq!(block.ops_per_sec, 1500.0);
    }

    #[test]
    fn test_display() {
        let mut stats = Statistics::new(1);
        let block = stats.push(episode(42, 4)).unwrap();
        let text = block.to_string();
        assert!(text.starts_with("1\tavg = 42, max = 42"));
        assert!(text.contains("\t6\t100.0%\t(100.0%)"));
    }
}
