//! Solutions implemented for Advent of Code 2023 days 17, 19 and 20.
//!
//! This module provides [`run_day`] to dynamically run a solution by its day.
//!
//! Steps to make a solution available to run:
//! 1. Make a submodule to hold the solution implementation.
//! 2. Have the submodule implement [`AdventOfCode2023<DAY>`] for its day as a [`SolutionRunner`].
//! 3. Import the submodule below `IMPORT SUBMODULES HERE`
//! 4. Add a match case to run [`AdventOfCode2023<DAY>`] for a day, below `MATCH SOLUTIONS HERE`:
//!
//! ```ignore
//! // matching for day 17
//! 17 => AdventOfCode2023::<17>::run(input, handler, timed),
//! ```

#![warn(clippy::dbg_macro, clippy::print_stderr, clippy::print_stdout)]

use aoc_framework::DynamicResult;
use aoc_framework::runner::{OutputHandler, SolutionRunner};
use thiserror::Error;

// --- IMPORT SUBMODULES HERE ---
mod day17;
mod day19;
mod day20;

/// A structure collecting solutions by day.
///
/// In a submodule, implement this as a [`SolutionRunner`] for the day.
///
/// Use [`#[solution_runner]`][aoc_framework::runner::solution_runner] for convenience:
///
/// ```ignore
/// // in a submodule "day17.rs"
/// use aoc_framework::runner::solution_runner;
/// use aoc_framework::{PartOne, PartTwo, Solution};
///
/// struct Day17;
/// impl Solution<PartOne> for Day17 {
///     /* ... */
/// }
/// impl Solution<PartTwo> for Day17 {
///     /* ... */
/// }
///
/// #[solution_runner(name = "Day 17", parsed = City, part_one = Day17, part_two = Day17)]
/// impl super::AdventOfCode2023<17> {}
/// ```
struct AdventOfCode2023<const DAY: u8>;

/// A solution for a day is not available.
#[derive(Error, Debug)]
#[error("no solution available for day {0}")]
pub struct DayNotAvailable(u8);

/// Run a solution based on the day.
///
/// # Errors
///
/// If the solution for the given day is not available, a [`DayNotAvailable`] error is returned.
///
/// Any dynamically dispatched error from running the solution is propagated.
pub fn run_day(
    day: u8,
    input: &str,
    handler: &mut dyn OutputHandler,
    timed: bool,
) -> DynamicResult<()> {
    match day {
        // --- MATCH SOLUTIONS HERE ---
        17 => AdventOfCode2023::<17>::run(input, handler, timed),
        19 => AdventOfCode2023::<19>::run(input, handler, timed),
        20 => AdventOfCode2023::<20>::run(input, handler, timed),
        _ => Err(DayNotAvailable(day).into()),
    }
}

#[cfg(test)]
mod tests {
    use std::fmt::Display;
    use std::time::Duration;

    use aoc_framework::PartKind;
    use aoc_framework::runner::PartsFailed;

    use super::*;

    #[derive(Default)]
    struct Answers(Vec<String>);

    impl OutputHandler for Answers {
        fn solution_name(&mut self, _name: &str) {}

        fn parse_end(&mut self, _duration_opt: Option<Duration>) {}

        fn part_start(&mut self, _part: PartKind) {}

        fn part_output(
            &mut self,
            _part: PartKind,
            output: &dyn Display,
            _duration_opt: Option<Duration>,
        ) {
            self.0.push(output.to_string());
        }

        fn part_failed(&mut self, _part: PartKind, error: &(dyn std::error::Error + 'static)) {
            self.0.push(format!("failed: {error}"));
        }
    }

    #[test]
    fn runs_available_day() -> DynamicResult<()> {
        let mut answers = Answers::default();
        run_day(17, &"11111\n".repeat(5), &mut answers, false)?;
        assert_eq!(answers.0, ["8", "8"]);
        Ok(())
    }

    #[test]
    fn unavailable_day_is_an_error() {
        let mut answers = Answers::default();
        let Err(error) = run_day(1, "", &mut answers, false) else {
            panic!("day 1 should not be available");
        };
        assert!(error.downcast_ref::<DayNotAvailable>().is_some());
        assert!(answers.0.is_empty());
    }

    #[test]
    fn failed_part_still_runs_the_other() {
        let mut answers = Answers::default();
        // part two needs a module sending to "rx"
        let Err(error) = run_day(20, "broadcaster -> a\n%a -> b\n", &mut answers, false) else {
            panic!("part two should fail without an rx module");
        };
        assert_eq!(
            error.downcast_ref::<PartsFailed>(),
            Some(&PartsFailed(vec![PartKind::Two]))
        );
        assert_eq!(answers.0, ["1250000", "failed: no module sends to \"rx\""]);
    }
}
