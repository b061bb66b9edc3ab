//! Minimum-cost search over a state space whose moves are restricted by the states themselves.
//!
//! States carry whatever history a move restriction needs (for example the direction of travel and
//! how many steps were taken in it), so states differing only in that history are searched as
//! distinct states. Costs are paid on *entering* a state.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};
use std::hash::Hash;

use num_traits::{CheckedAdd, Zero};
use tracing::{debug, trace};

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum SearchError {
    #[error("accumulated cost overflowed the cost type")]
    CostOverflow,
}

/// A frontier entry, ordered so [`BinaryHeap`] pops the lowest cost first.
struct Frontier<S, C> {
    cost: C,
    state: S,
}

impl<S, C: Ord> PartialEq for Frontier<S, C> {
    fn eq(&self, other: &Self) -> bool {
        self.cost == other.cost
    }
}

impl<S, C: Ord> Eq for Frontier<S, C> {}

impl<S, C: Ord> Ord for Frontier<S, C> {
    fn cmp(&self, other: &Self) -> Ordering {
        // flip cost comparison for min-heap on it
        other.cost.cmp(&self.cost)
    }
}

impl<S, C: Ord> PartialOrd for Frontier<S, C> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Find the minimum cost of reaching any goal state from `start`.
///
/// # Arguments
///
/// - `start` - The initial state, reached at zero cost.
/// - `is_goal` - Whether a state ends the search.
/// - `neighbors` - Candidate states reachable in one move from a state.
/// - `can_move` - Whether the move from the first state to the second is allowed.
/// - `cost` - The non-negative cost of entering a state.
///
/// # Returns
///
/// `Ok(Some(cost))` with the minimum cost of the first goal state settled, or `Ok(None)` when no
/// goal state is reachable.
///
/// # Errors
///
/// Returns [`SearchError::CostOverflow`] if an accumulated cost does not fit in `C`.
pub fn shortest_path<S, C, I>(
    start: S,
    mut is_goal: impl FnMut(&S) -> bool,
    mut neighbors: impl FnMut(&S) -> I,
    mut can_move: impl FnMut(&S, &S) -> bool,
    mut cost: impl FnMut(&S) -> C,
) -> Result<Option<C>, SearchError>
where
    S: Clone + Eq + Hash,
    C: Copy + Ord + Zero + CheckedAdd,
    I: IntoIterator<Item = S>,
{
    let mut distances: HashMap<S, C> = HashMap::new();
    let mut frontier = BinaryHeap::new();

    distances.insert(start.clone(), C::zero());
    frontier.push(Frontier {
        cost: C::zero(),
        state: start,
    });

    let mut settled: usize = 0;
    while let Some(Frontier {
        cost: current_cost,
        state,
    }) = frontier.pop()
    {
        // a cheaper entry for this state was already pushed, skip the stale one
        if distances
            .get(&state)
            .is_some_and(|&best| current_cost > best)
        {
            continue;
        }

        if is_goal(&state) {
            debug!(settled, "goal state reached");
            return Ok(Some(current_cost));
        }
        settled += 1;

        for next in neighbors(&state) {
            if !can_move(&state, &next) {
                continue;
            }

            let next_cost = current_cost
                .checked_add(&cost(&next))
                .ok_or(SearchError::CostOverflow)?;

            if distances
                .get(&next)
                .is_none_or(|&best| next_cost < best)
            {
                distances.insert(next.clone(), next_cost);
                frontier.push(Frontier {
                    cost: next_cost,
                    state: next,
                });
            }
        }
    }

    trace!(seen = distances.len(), "frontier exhausted");
    debug!(settled, "no goal state reachable");
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_cheaper_longer_path() {
        // 0 -> 1 -> 4 costs 5 + 1, 0 -> 2 -> 3 -> 4 costs 1 + 1 + 1
        let edges: HashMap<u8, Vec<u8>> = HashMap::from([
            (0, vec![1, 2]),
            (1, vec![4]),
            (2, vec![3]),
            (3, vec![4]),
            (4, vec![]),
        ]);
        let weights = [0u32, 5, 1, 1, 1];

        let result = shortest_path(
            0u8,
            |&s| s == 4,
            |s| edges[s].clone(),
            |_, _| true,
            |&s| weights[usize::from(s)],
        );
        assert_eq!(result, Ok(Some(3)));

        // forbid the last step of the long route
        let result = shortest_path(
            0u8,
            |&s| s == 4,
            |s| edges[s].clone(),
            |&from, &to| !(from == 3 && to == 4),
            |&s| weights[usize::from(s)],
        );
        assert_eq!(result, Ok(Some(6)));
    }

    #[test]
    fn start_can_be_goal() {
        let result = shortest_path(7u32, |_| true, |_| Vec::new(), |_, _| true, |_| 100u32);
        assert_eq!(result, Ok(Some(0)));
    }

    #[test]
    fn unreachable_goal_is_none() {
        // walk a line 0..=5 looking for 10
        let result = shortest_path(
            0i32,
            |&s| s == 10,
            |&s| (s < 5).then_some(s + 1),
            |_, _| true,
            |_| 1u32,
        );
        assert_eq!(result, Ok(None));
    }

    #[test]
    fn move_restriction_can_block_goal() {
        let result = shortest_path(
            0i32,
            |&s| s == 3,
            |&s| [s + 1, s - 1],
            |_, &to| (-2..=2).contains(&to),
            |_| 1u32,
        );
        assert_eq!(result, Ok(None));
    }

    #[test]
    fn zero_cost_moves_are_free() {
        let result = shortest_path(
            0u8,
            |&s| s == 4,
            |&s| [s.saturating_add(1)],
            |_, _| true,
            |_| 0u64,
        );
        assert_eq!(result, Ok(Some(0)));
    }

    #[test]
    fn overflow_is_an_error() {
        let result = shortest_path(0u8, |&s| s == 2, |&s| [s + 1], |_, _| true, |_| 200u8);
        assert_eq!(result, Err(SearchError::CostOverflow));
    }
}
