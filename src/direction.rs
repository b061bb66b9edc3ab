//! Cardinal directions for moving around a row-major grid.

/// A cardinal direction, where north decreases the row and west decreases the column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Direction {
    North,
    East,
    South,
    West,
}

impl Direction {
    /// All directions, clockwise from north.
    pub const ALL: [Self; 4] = [Self::North, Self::East, Self::South, Self::West];

    /// Get the direction when turning left.
    pub fn to_left(self) -> Self {
        match self {
            Self::North => Self::West,
            Self::East => Self::North,
            Self::South => Self::East,
            Self::West => Self::South,
        }
    }

    /// Get the direction when turning right.
    pub fn to_right(self) -> Self {
        match self {
            Self::North => Self::East,
            Self::East => Self::South,
            Self::South => Self::West,
            Self::West => Self::North,
        }
    }

    /// Step from `(row, col)` one cell in this direction, staying within a grid of `rows` by
    /// `cols`. Returns `None` when the step would leave the grid.
    pub fn step_within(
        self,
        (row, col): (usize, usize),
        (rows, cols): (usize, usize),
    ) -> Option<(usize, usize)> {
        let (row, col) = match self {
            Self::North => (row.checked_sub(1)?, col),
            Self::East => (row, col.checked_add(1)?),
            Self::South => (row.checked_add(1)?, col),
            Self::West => (row, col.checked_sub(1)?),
        };
        (row < rows && col < cols).then_some((row, col))
    }
}
