//! Traits and runners shared by the puzzle solutions.
//!
//! A puzzle is solved in two steps: the raw input text is parsed once into a structure implementing
//! [`ParseData`], then each part implements [`Solution`] against that structure.
//!
//! ```
//! use aoc_framework::{DynamicResult, ParseData, PartOne, Solution};
//!
//! struct Weights(Vec<u32>);
//!
//! impl ParseData for Weights {
//!     fn parse(input: &str) -> DynamicResult<Self> {
//!         let values = input
//!             .lines()
//!             .map(str::parse)
//!             .collect::<Result<Vec<_>, _>>()?;
//!         Ok(Self(values))
//!     }
//! }
//!
//! struct Heaviest;
//!
//! impl Solution<PartOne> for Heaviest {
//!     type Input = Weights;
//!     type Output = u32;
//!
//!     fn solve(input: &Weights) -> DynamicResult<u32> {
//!         Ok(input.0.iter().copied().max().unwrap_or_default())
//!     }
//! }
//!
//! let weights = Weights::parse("4\n9\n2").unwrap();
//! assert_eq!(Heaviest::solve(&weights).unwrap(), 9);
//! ```
//!
//! The [`runner`] module drives both steps and reports through an
//! [`OutputHandler`][runner::OutputHandler].

#![warn(clippy::pedantic)]
#![warn(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    clippy::branches_sharing_code,
    clippy::equatable_if_let,
    clippy::needless_collect,
    clippy::option_if_let_else,
    clippy::use_self,
    clippy::useless_let_if_seq
)]
#![deny(
    clippy::expect_used,
    clippy::print_stderr,
    clippy::print_stdout,
    clippy::unwrap_used
)]

use std::error::Error;
use std::fmt::Display;

pub mod parsing;
pub mod runner;

mod private {
    /// Seals [`Part`][super::Part] so only the two puzzle parts exist.
    pub trait Sealed {}
}

/// A dynamically dispatched error, wrapped in a [`Box`].
pub type DynamicError = Box<dyn Error + Send + Sync + 'static>;
/// A result that can return a [`DynamicError`] as an error.
pub type DynamicResult<T> = Result<T, DynamicError>;

/// Identifies one of the two answers of a puzzle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartKind {
    One,
    Two,
}

impl Display for PartKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::One => write!(f, "Part 1"),
            Self::Two => write!(f, "Part 2"),
        }
    }
}

/// Marker for the part a [`Solution`] answers.
pub trait Part: private::Sealed {
    /// Get the related [`PartKind`] for this part.
    fn kind() -> PartKind;
}

/// Marks a [`Solution`] for the first answer.
pub struct PartOne;
impl private::Sealed for PartOne {}
impl Part for PartOne {
    fn kind() -> PartKind {
        PartKind::One
    }
}

/// Marks a [`Solution`] for the second answer.
pub struct PartTwo;
impl private::Sealed for PartTwo {}
impl Part for PartTwo {
    fn kind() -> PartKind {
        PartKind::Two
    }
}

/// Computes the answer of one puzzle [`Part`] from parsed input.
pub trait Solution<P: Part> {
    /// The parsed input passed by reference to [`Solution::solve`].
    type Input: ?Sized;

    /// The answer, printed through the runner's output handler.
    type Output: Display;

    /// Solve with the given input.
    ///
    /// # Errors
    ///
    /// Any failure while solving, such as input that violates a structural assumption of the
    /// puzzle, is returned as a dynamically dispatched error.
    fn solve(input: &Self::Input) -> DynamicResult<Self::Output>;
}

/// A structure built by parsing puzzle input text.
pub trait ParseData {
    /// Parse an input string into an instance of self.
    ///
    /// # Errors
    ///
    /// Malformed input is returned as a dynamically dispatched error naming the offending token.
    fn parse(input: &str) -> DynamicResult<Self>
    where
        Self: Sized;
}
