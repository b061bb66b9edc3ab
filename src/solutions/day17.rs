use aoc_framework::parsing::parse_input_lines;
use aoc_framework::runner::solution_runner;
use aoc_framework::{DynamicResult, ParseData, PartOne, PartTwo, Solution};
use nalgebra::DMatrix;
use tracing::debug;

use crate::direction::Direction;
use crate::search::{SearchError, shortest_path};

#[solution_runner(
    name = "Day 17: Clumsy Crucible",
    parsed = City,
    part_one = Day17,
    part_two = Day17
)]
impl super::AdventOfCode2023<17> {}

/*
Input is a character grid for heat loss moving through city blocks, represented with digits.
*/

#[derive(Debug)]
struct City(DMatrix<u8>);

#[derive(thiserror::Error, Debug)]
enum ParseCityError {
    #[error("invalid digit character: {0:?}")]
    InvalidDigit(char),

    #[error("expected grid width to be {expected} across rows, but found row width {found}")]
    UnequalGridWidth { expected: usize, found: usize },

    #[error("expected at least one block in the city grid")]
    EmptyGrid,
}

impl ParseData for City {
    fn parse(input: &str) -> DynamicResult<Self>
    where
        Self: Sized,
    {
        let mut expected_width = None;
        let city_rows = parse_input_lines(input, |_, line| {
            let row = line
                .chars()
                .map(|ch| {
                    ch.to_digit(10)
                        .and_then(|digit| u8::try_from(digit).ok())
                        .ok_or(ParseCityError::InvalidDigit(ch))
                })
                .collect::<Result<Vec<_>, _>>()?;

            if let Some(width) = expected_width {
                if row.len() != width {
                    return Err(ParseCityError::UnequalGridWidth {
                        expected: width,
                        found: row.len(),
                    });
                }
            } else {
                expected_width = Some(row.len());
            }

            Ok(row)
        })
        .collect::<Result<Vec<_>, _>>()?;

        let rows = city_rows.len();
        let cols = expected_width.unwrap_or_default();
        if rows == 0 || cols == 0 {
            return Err(ParseCityError::EmptyGrid.into());
        }
        debug!(rows, cols, "parsed city grid");

        let city_matrix = DMatrix::from_row_iterator(rows, cols, city_rows.into_iter().flatten());
        Ok(Self(city_matrix))
    }
}

/*
The crucible starts at the top left block and ends at the bottom right. Heat loss is incurred when
moving into a block, so the start does not count the heat loss of its block. Reversing direction is
not allowed.

The crucible must travel straight for a minimum number of blocks before turning or stopping at the
end, and may travel straight at most a maximum number of blocks before it has to turn.
*/

/// Bounds on how many blocks the crucible travels in a straight line.
#[derive(Debug, Clone, Copy)]
struct StraightLimits {
    /// Blocks to travel straight before a turn or stopping.
    min: u8,
    /// Blocks that may be traveled straight before turning.
    max: u8,
}

impl StraightLimits {
    const CRUCIBLE: Self = Self { min: 1, max: 3 };
    const ULTRA_CRUCIBLE: Self = Self { min: 4, max: 10 };
}

/// A position of the crucible, with the movement history its limits depend on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct CrucibleState {
    /// The (row, column) of the block.
    block: (usize, usize),
    /// From which direction the block was traversed to, `None` before the first move.
    from_direction: Option<Direction>,
    /// How many blocks in a straight line were traversed to this block.
    straight_len: u8,
}

impl City {
    fn size(&self) -> (usize, usize) {
        self.0.shape()
    }

    fn start() -> CrucibleState {
        CrucibleState {
            block: (0, 0),
            from_direction: None,
            straight_len: 0,
        }
    }

    fn is_end(&self, state: &CrucibleState, limits: StraightLimits) -> bool {
        let (rows, cols) = self.size();
        state.block == (rows - 1, cols - 1)
            && (state.from_direction.is_none() || state.straight_len >= limits.min)
    }

    /// Candidate moves from a state. Moves going straight past the maximum are still produced, to
    /// be rejected by [`Self::within_limits`].
    fn moves(&self, state: &CrucibleState, limits: StraightLimits) -> Vec<CrucibleState> {
        let turns: Vec<(Direction, u8)> = match state.from_direction {
            // travel in any direction
            None => Direction::ALL.iter().map(|&d| (d, 1)).collect(),
            // need to continue forward until min straight length met
            Some(direction) if state.straight_len < limits.min => {
                vec![(direction, state.straight_len.saturating_add(1))]
            }
            // continue forward or turn, never reversing
            Some(direction) => vec![
                (direction, state.straight_len.saturating_add(1)),
                (direction.to_left(), 1),
                (direction.to_right(), 1),
            ],
        };

        turns
            .into_iter()
            .filter_map(|(direction, straight_len)| {
                direction
                    .step_within(state.block, self.size())
                    .map(|block| CrucibleState {
                        block,
                        from_direction: Some(direction),
                        straight_len,
                    })
            })
            .collect()
    }

    fn within_limits(next: &CrucibleState, limits: StraightLimits) -> bool {
        next.straight_len <= limits.max
    }

    fn heat_loss(&self, state: &CrucibleState) -> u32 {
        self.0[state.block].into()
    }

    /// Find minimal heat loss traveling from the top left to bottom right, or `None` if the limits
    /// allow no route.
    fn min_heat_loss(&self, limits: StraightLimits) -> Result<Option<u32>, SearchError> {
        shortest_path(
            Self::start(),
            |state| self.is_end(state, limits),
            |state| self.moves(state, limits),
            |_, next| Self::within_limits(next, limits),
            |state| self.heat_loss(state),
        )
    }
}

#[derive(thiserror::Error, Debug)]
#[error("no route to the end block satisfies the straight line limits {limits:?}")]
struct NoRouteError {
    limits: StraightLimits,
}

fn solve_with_limits(city: &City, limits: StraightLimits) -> DynamicResult<u32> {
    let min_heat_loss = city
        .min_heat_loss(limits)?
        .ok_or(NoRouteError { limits })?;
    Ok(min_heat_loss)
}

struct Day17;

impl Solution<PartOne> for Day17 {
    type Input = City;
    type Output = u32;

    fn solve(input: &Self::Input) -> DynamicResult<Self::Output> {
        solve_with_limits(input, StraightLimits::CRUCIBLE)
    }
}

/*
For part 2, ultra crucibles move a minimum of 4 blocks and maximum 10 blocks in a straight line
before turning or ending.
*/

impl Solution<PartTwo> for Day17 {
    type Input = City;
    type Output = u32;

    fn solve(input: &Self::Input) -> DynamicResult<Self::Output> {
        solve_with_limits(input, StraightLimits::ULTRA_CRUCIBLE)
    }
}
