use crate::{
    IllegalActionError,
    core::{
        board::Board,
        direction::Direction,
        tile::{Reward, Tile},
    },
};

/// An agent's decision for one turn.
///
/// Sliders answer with [`Action::Slide`], the environment with
/// [`Action::Place`]. Either side answers [`Action::NoOp`] when it has nothing
/// legal to do, which ends the episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::IsVariant)]
pub enum Action {
    #[display("slide {_0}")]
    Slide(Direction),
    #[display("place {tile} at {position} (next {hint})")]
    Place {
        position: usize,
        tile: Tile,
        hint: Tile,
    },
    #[display("no-op")]
    NoOp,
}

impl Action {
    /// Applies this action to `board`, returning the points gained.
    ///
    /// The board is left unchanged when the action is illegal.
    ///
    /// ```
    /// use threes_engine::{Action, Board, Direction};
    ///
    /// let mut board = Board::new();
    /// Action::Place { position: 0, tile: 1, hint: 2 }.apply(&mut board).unwrap();
    /// Action::Place { position: 1, tile: 2, hint: 3 }.apply(&mut board).unwrap();
    /// assert_eq!(Action::Slide(Direction::Left).apply(&mut board), Ok(3));
    /// assert!(Action::Slide(Direction::Up).apply(&mut board).is_err());
    /// ```
    pub fn apply(self, board: &mut Board) -> Result<Reward, IllegalActionError> {
        match self {
            Self::Slide(direction) => {
                let (next, reward) = board
                    .slide(direction)
                    .ok_or(IllegalActionError::Slide(direction))?;
                *board = next;
                Ok(reward)
            }
            Self::Place {
                position,
                tile,
                hint,
            } => {
                board.place(position, tile, hint)?;
                Ok(0)
            }
            Self::NoOp => Err(IllegalActionError::NoOp),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_illegal_slide_leaves_board_unchanged() {
        let mut board = Board::from_cells([0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1, 2, 1, 2]);
        let before = board;
        assert_eq!(
            Action::Slide(Direction::Down).apply(&mut board),
            Err(IllegalActionError::Slide(Direction::Down))
        );
        assert_eq!(board, before);
    }

    #[test]
    fn test_noop_cannot_be_applied() {
        let mut board = Board::new();
        assert_eq!(Action::NoOp.apply(&mut board), Err(IllegalActionError::NoOp));
        assert!(Action::NoOp.is_no_op());
    }

    #[test]
    fn test_display() {
        assert_eq!(Action::Slide(Direction::Left).to_string(), "slide left");
        assert_eq!(
            Action::Place {
                position: 3,
                tile: 2,
                hint: 1
            }
            .to_string(),
            "place 2 at 3 (next 1)"
        );
    }
}
