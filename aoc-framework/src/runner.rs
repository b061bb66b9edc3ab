//! Running a parsed, two-part solution and reporting its progress.
//!
//! Solutions are made runnable with the [`#[solution_runner]`][solution_runner] attribute:
//!
//! ```ignore
//! #[solution_runner(name = "Day 17", parsed = City, part_one = Day17, part_two = Day17)]
//! impl super::AdventOfCode2023<17> {}
//! ```

use std::error::Error;
use std::fmt::Display;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::{DynamicResult, ParseData, Part, PartKind, PartOne, PartTwo, Solution};

// re-export procedural macro
pub use aoc_framework_macros::solution_runner;

/// Receives the events of running a solution, to present answers and timings.
pub trait OutputHandler {
    /// Called with the name of the solution before anything else.
    fn solution_name(&mut self, name: &str);

    /// Called when parsing input is finished, optionally with the time it took.
    fn parse_end(&mut self, duration_opt: Option<Duration>);

    /// Called when a part starts solving.
    fn part_start(&mut self, part: PartKind);

    /// Called with the answer of a part, optionally with the time it took.
    fn part_output(&mut self, part: PartKind, output: &dyn Display, duration_opt: Option<Duration>);

    /// Called instead of [`Self::part_output`] when a part fails to solve.
    fn part_failed(&mut self, part: PartKind, error: &(dyn Error + 'static));
}

/// One or both parts of a solution failed, after each failure was reported to the handler.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error("failed to solve {}", .0.iter().map(ToString::to_string).collect::<Vec<_>>().join(" and "))]
pub struct PartsFailed(pub Vec<PartKind>);

/// Evaluate `f`, also returning its elapsed time when `timed` is set.
fn timed_call<T>(timed: bool, f: impl FnOnce() -> T) -> (T, Option<Duration>) {
    if timed {
        let start = Instant::now();
        let result = f();
        (result, Some(start.elapsed()))
    } else {
        (f(), None)
    }
}

/// Solve one part and report its answer or its failure. Returns the part if it failed.
fn run_part<S, P>(
    input: &S::Input,
    handler: &mut dyn OutputHandler,
    timed: bool,
) -> Option<PartKind>
where
    P: Part,
    S: Solution<P>,
{
    let part = P::kind();
    handler.part_start(part);
    let (result, duration_opt) = timed_call(timed, || S::solve(input));
    match result {
        Ok(output) => {
            debug!(%part, %output, "part solved");
            handler.part_output(part, &output, duration_opt);
            None
        }
        Err(error) => {
            warn!(%part, %error, "part failed");
            handler.part_failed(part, &*error);
            Some(part)
        }
    }
}

/// Parse the input once, then solve both parts against the parsed data.
///
/// # Arguments
///
/// - `name` - The solution's name to output.
/// - `input` - The raw input text.
/// - `handler` - Receives the answers, failures and timings.
/// - `timed` - Measure parsing and each part.
///
/// # Errors
///
/// A parsing error is propagated without attempting either part. A failing part does not stop the
/// other; if any failed, a [`PartsFailed`] naming them is returned.
pub fn solve_parsed_solution<D, S1, S2>(
    name: &str,
    input: &str,
    handler: &mut dyn OutputHandler,
    timed: bool,
) -> DynamicResult<()>
where
    D: ParseData,
    S1: Solution<PartOne, Input = D>,
    S2: Solution<PartTwo, Input = D>,
{
    let span = tracing::info_span!("solution", name);
    let _entered = span.enter();

    handler.solution_name(name);
    let (parsed, duration_opt) = timed_call(timed, || D::parse(input));
    let parsed = parsed?;
    debug!(bytes = input.len(), "input parsed");
    handler.parse_end(duration_opt);

    let failed: Vec<PartKind> = [
        run_part::<S1, PartOne>(&parsed, handler, timed),
        run_part::<S2, PartTwo>(&parsed, handler, timed),
    ]
    .into_iter()
    .flatten()
    .collect();

    if failed.is_empty() {
        Ok(())
    } else {
        Err(PartsFailed(failed).into())
    }
}

/// A solution that can be run from raw input text.
///
/// Implemented through the [`solution_runner`] attribute macro.
pub trait SolutionRunner {
    /// Run the solution.
    ///
    /// # Errors
    ///
    /// Any dynamically dispatched error from running the solution is propagated.
    fn run(input: &str, handler: &mut dyn OutputHandler, timed: bool) -> DynamicResult<()>;
}
