use serde::{Deserialize, Serialize};

/// Slide direction.
///
/// The discriminants are the opcodes used throughout the agents: candidate moves
/// are always enumerated in this order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, derive_more::Display,
)]
#[repr(u8)]
pub enum Direction {
    #[display("up")]
    Up = 0,
    #[display("right")]
    Right = 1,
    #[display("down")]
    Down = 2,
    #[display("left")]
    Left = 3,
}

impl Direction {
    /// All directions in opcode order.
    pub const ALL: [Self; 4] = [Self::Up, Self::Right, Self::Down, Self::Left];

    /// Returns the opcode of this direction (`0..4`).
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Returns the direction for an opcode, or `None` if `index >= 4`.
    #[must_use]
    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::Up),
            1 => Some(Self::Right),
            2 => Some(Self::Down),
            3 => Some(Self::Left),
            _ => None,
        }
    }

    /// Returns the direction pointing the other way.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Right => Self::Left,
            Self::Down => Self::Up,
            Self::Left => Self::Right,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opcode_round_trip() {
        for (i, dir) in Direction::ALL.into_iter().enumerate() {
            assert_eq!(dir.index(), i);
            assert_eq!(Direction::from_index(i), Some(dir));
        }
        assert_eq!(Direction::from_index(4), None);
    }

    #[test]
    fn test_opposite() {
        for dir in Direction::ALL {
            assert_ne!(dir.opposite(), dir);
            assert_eq!(dir.opposite().opposite(), dir);
        }
    }
}
