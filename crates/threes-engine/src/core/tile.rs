/// Tile rank stored in one board cell.
///
/// - `0`: empty cell
/// - `1`, `2`: the basic tiles
/// - `r >= 3`: the tile with face value `3 · 2^(r-3)` (3, 6, 12, 24, ...)
///
/// Ranks are packed into 4 bits, so the largest representable rank is
/// [`MAX_RANK`].
pub type Tile = u8;

/// Points gained by a single slide.
pub type Reward = u32;

/// Largest rank a cell can hold (face value 12288).
pub const MAX_RANK: Tile = 15;

/// Returns the printed face value of a tile rank.
///
/// ```
/// use threes_engine::face_value;
///
/// assert_eq!(face_value(0), 0);
/// assert_eq!(face_value(2), 2);
/// assert_eq!(face_value(3), 3);
/// assert_eq!(face_value(5), 12);
/// ```
#[must_use]
pub const fn face_value(tile: Tile) -> u32 {
    match tile {
        0..=2 => tile as u32,
        _ => 3 << (tile - 3),
    }
}

/// Returns the score contributed by a tile: `3^(rank-2)` for ranks of 3 and
/// above, nothing for the basic tiles.
#[must_use]
pub const fn tile_score(tile: Tile) -> Reward {
    match tile {
        0..=2 => 0,
        _ => 3u32.pow((tile - 2) as u32),
    }
}

/// Returns the rank produced by merging `target` with `incoming`, if the two
/// tiles can merge.
///
/// A 1 and a 2 combine into a 3; two equal tiles of rank 3 or more combine into
/// the next rank. Merges that would exceed [`MAX_RANK`] are refused.
#[must_use]
pub const fn merge(target: Tile, incoming: Tile) -> Option<Tile> {
    match (target, incoming) {
        (1, 2) | (2, 1) => Some(3),
        (a, b) if a == b && a >= 3 && a < MAX_RANK => Some(a + 1),
        _ => None,
    }
}
