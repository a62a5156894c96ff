use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    pub fn is_horizontal(self) -> bool { matches!(self, Direction::Left | Direction::Right) }

    /// Moves `i` one cell in this direction on a grid of `len` cells laid out
    /// in `columns` x `rows`.
    ///
    /// Horizontal moves wrap around the whole list. Vertical moves wrap within
    /// `columns * rows` and clamp onto the last cell when they land in the
    /// ragged part of the final row. Returns `None` if there is nothing to
    /// move over.
    pub fn step(self, i: usize, len: usize, columns: usize, rows: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        match self {
            Direction::Left => Some(wrap(i as isize - 1, len)),
            Direction::Right => Some(wrap(i as isize + 1, len)),
            Direction::Up | Direction::Down => {
                let cells = columns * rows;
                if cells == 0 {
                    return None;
                }
                let delta = if self == Direction::Up {
                    -(columns as isize)
                } else {
                    columns as isize
                };
                Some(wrap(i as isize + delta, cells).min(len - 1))
            }
        }
    }
}

fn wrap(i: isize, len: usize) -> usize { i.rem_euclid(len as isize) as usize }

/// Horizontal flow of the grid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextDirection {
    #[default]
    Ltr,
    Rtl,
}
