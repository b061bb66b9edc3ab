use std::collections::HashMap;
use std::num::ParseIntError;

use aoc_framework::parsing::{InputScanner, ParseContextError, parse_with_context};
use aoc_framework::runner::solution_runner;
use aoc_framework::{DynamicResult, ParseData, PartOne, PartTwo, Solution};
use checked_sum::CheckedSum;
use regex::Regex;
use tracing::{debug, trace};

use crate::checked_product::CheckedProduct;

#[solution_runner(name = "Day 19: Aplenty", parsed = System, part_one = Day19, part_two = Day19)]
impl super::AdventOfCode2023<19> {}

/*
Input is a system described with a collection of workflows for evaluating parts, an empty line, and
a collection of parts' ratings.

Ratings for a part are defined in a line, with curly braces wrapping a comma-separated list of
key-value pairs separated with `=`. Keys are a part category (`x`, `m`, `a`, `s`), and values are
number ratings in that category.

A workflow is defined in a single line, with a name followed by curly braces wrapping its
comma-separated rules. A conditional rule is a category, a comparison operator (`>` or `<`), a
threshold, `:`, and the name of a workflow to redirect to, or one of the reserved names `A` or `R`
to accept or reject. A rule without a condition only names where to go.
*/

// -- Structures --

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Category {
    X,
    M,
    A,
    S,
}

impl Category {
    const ALL: [Self; 4] = [Self::X, Self::M, Self::A, Self::S];

    fn index(self) -> usize {
        match self {
            Self::X => 0,
            Self::M => 1,
            Self::A => 2,
            Self::S => 3,
        }
    }
}

/// A value for every category of a part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct Ratings<T>([T; 4]);

impl<T: Copy> Ratings<T> {
    fn get(&self, category: Category) -> T {
        self.0[category.index()]
    }

    /// Construct a copy of self with the `category` set to `value`.
    fn with_category(mut self, category: Category, value: T) -> Self {
        self.0[category.index()] = value;
        self
    }
}

/// A concrete part, with one rating per category.
type PartRatings = Ratings<u32>;

/// An inclusive, non-empty interval of ratings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct RatingInterval {
    min: u32,
    max: u32,
}

impl RatingInterval {
    /// Ratings are confirmed to be between 1 and 4000.
    const DOMAIN: Self = Self { min: 1, max: 4000 };

    /// Construct an interval, or `None` if it would be empty.
    fn new(min: u32, max: u32) -> Option<Self> {
        (min <= max).then_some(Self { min, max })
    }

    fn len(self) -> u64 {
        u64::from(self.max - self.min) + 1
    }
}

/// Every part whose ratings fall in the interval of each category.
type PartRange = Ratings<RatingInterval>;

impl PartRange {
    fn full_domain() -> Self {
        Self([RatingInterval::DOMAIN; 4])
    }

    /// Count distinct parts within this range. Returns `None` on overflow.
    fn count_distinct(&self) -> Option<u64> {
        self.0.iter().map(|interval| interval.len()).checked_product()
    }
}

/// Where a rule sends a part.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Outcome {
    Accepted,
    Rejected,
    /// Redirect to another workflow to continue. Contains the name of the workflow.
    Redirect(String),
}

/// A final outcome of evaluating a part through workflows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verdict {
    Accepted,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Rule {
    /// Matches when the category's rating is below the threshold.
    LessThan {
        category: Category,
        threshold: u32,
        next: Outcome,
    },
    /// Matches when the category's rating is above the threshold.
    GreaterThan {
        category: Category,
        threshold: u32,
        next: Outcome,
    },
    /// Always matches.
    Unconditional(Outcome),
}

#[derive(Debug)]
struct Workflow {
    /// Rules in evaluation order; the first match decides the outcome.
    rules: Vec<Rule>,
}

#[derive(Debug, Default)]
struct Workflows(HashMap<String, Workflow>);

#[derive(Debug)]
struct System {
    workflows: Workflows,
    parts_ratings: Vec<PartRatings>,
}

// -- Parsing --

#[derive(thiserror::Error, Debug)]
enum ParseOutcomeError {
    #[error("expected alphabetic characters in workflow name: {0:?}")]
    ExpectedAlphabetic(String),
}

impl TryFrom<&str> for Outcome {
    type Error = ParseOutcomeError;

    /// Converts a string to a rule outcome.
    ///
    /// Expects one of the special names (`A` or `R`), or an alphabetic workflow name for
    /// redirection.
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "A" => Ok(Self::Accepted),
            "R" => Ok(Self::Rejected),
            name if !name.is_empty() && name.chars().all(char::is_alphabetic) => {
                Ok(Self::Redirect(name.to_owned()))
            }
            name => Err(ParseOutcomeError::ExpectedAlphabetic(name.to_owned())),
        }
    }
}

#[derive(thiserror::Error, Debug)]
enum ParseRuleError {
    #[error("unknown part category {0:?}, expected one of `x`, `m`, `a` or `s`")]
    UnknownCategory(char),

    #[error("unknown comparison operator {0:?}, expected `<` or `>`")]
    UnknownComparator(char),

    #[error("invalid threshold")]
    InvalidThreshold(#[from] ParseContextError<ParseIntError>),

    #[error(
        "string not in valid format for a conditional rule: {0:?}\nexpected category, operation, threshold, `:`, and a result name"
    )]
    InvalidFormat(String),

    #[error("invalid rule result")]
    InvalidOutcome(#[from] ParseOutcomeError),
}

impl TryFrom<char> for Category {
    type Error = ParseRuleError;

    fn try_from(value: char) -> Result<Self, Self::Error> {
        match value {
            'x' => Ok(Self::X),
            'm' => Ok(Self::M),
            'a' => Ok(Self::A),
            's' => Ok(Self::S),
            other => Err(ParseRuleError::UnknownCategory(other)),
        }
    }
}

#[derive(thiserror::Error, Debug)]
enum ParseWorkflowError {
    #[error("expected workflow rules starting with a curly brace ({:?})", '{')]
    MissingRulesStart,

    #[error("expected curly braces wrapping the workflow rules")]
    ExpectedWrappingCurlyBraces,

    #[error("invalid workflow name")]
    InvalidName(#[from] ParseOutcomeError),

    #[error("expected workflow name to not match a special result name: {0:?}")]
    ReservedName(String),

    #[error("failed to parse a rule in the workflow")]
    InvalidRule(#[from] ParseContextError<ParseRuleError>),
}

struct RuleParser {
    conditional: Regex,
}

impl RuleParser {
    fn new() -> Self {
        let conditional =
            Regex::new(r"^(.)(.)([^:]*):(.*)$").expect("regex should successfully build");
        Self { conditional }
    }

    /// Parse a single rule, conditional (`a<2006:qkq`) or unconditional (`rfg`).
    fn parse_rule(&self, s: &str) -> Result<Rule, ParseRuleError> {
        if !s.contains(':') {
            return Ok(Rule::Unconditional(Outcome::try_from(s)?));
        }

        let (_, [category_str, comparator_str, threshold_str, next_str]) = self
            .conditional
            .captures(s)
            .ok_or_else(|| ParseRuleError::InvalidFormat(s.to_owned()))?
            .extract();

        // each of the first two groups captures exactly one character
        let first_char = |group: &str| group.chars().next().unwrap_or_default();
        let category = Category::try_from(first_char(category_str))?;
        let threshold: u32 = parse_with_context(threshold_str)?;
        let next = Outcome::try_from(next_str)?;

        match first_char(comparator_str) {
            '<' => Ok(Rule::LessThan {
                category,
                threshold,
                next,
            }),
            '>' => Ok(Rule::GreaterThan {
                category,
                threshold,
                next,
            }),
            other => Err(ParseRuleError::UnknownComparator(other)),
        }
    }

    /// Parse a workflow line, e.g. `px{a<2006:qkq,m>2090:A,rfg}`, into its name and rules.
    fn parse_workflow(&self, line: &str) -> Result<(String, Workflow), ParseWorkflowError> {
        let rules_start_idx = line
            .find('{')
            .ok_or(ParseWorkflowError::MissingRulesStart)?;
        let (name_str, rules_str) = line.split_at(rules_start_idx);

        let name = match Outcome::try_from(name_str)? {
            Outcome::Redirect(name) => name,
            Outcome::Accepted | Outcome::Rejected => {
                return Err(ParseWorkflowError::ReservedName(name_str.to_owned()));
            }
        };

        let rules_list = rules_str
            .strip_prefix('{')
            .and_then(|s| s.strip_suffix('}'))
            .ok_or(ParseWorkflowError::ExpectedWrappingCurlyBraces)?;

        let rules: Vec<Rule> = rules_list
            .split(',')
            .map(|rule| {
                self.parse_rule(rule)
                    .map_err(|source| ParseContextError::new(source, rule))
            })
            .collect::<Result<_, _>>()?;

        Ok((name, Workflow { rules }))
    }
}

#[derive(thiserror::Error, Debug)]
enum ParsePartRatingsError {
    #[error("expected curly braces wrapping the ratings")]
    ExpectedWrappingCurlyBraces,

    #[error("expected equals sign to separate a key-value pair: {0:?}")]
    ExpectedEqualsDelimiter(String),

    #[error("expected a single character category key: {0:?}")]
    InvalidKey(String),

    #[error("invalid category key")]
    UnknownCategory(#[from] ParseRuleError),

    #[error("category {0:?} is rated more than once")]
    DuplicateCategory(Category),

    #[error("expected a rating for category {0:?}")]
    MissingCategory(Category),

    #[error("failed to parse value")]
    ParseValueError(#[from] ParseContextError<ParseIntError>),
}

impl std::str::FromStr for PartRatings {
    type Err = ParsePartRatingsError;

    /// Parse a string format of part ratings, e.g. `{x=787,m=2655,a=1222,s=2876}`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let ratings = s
            .strip_prefix('{')
            .and_then(|s| s.strip_suffix('}'))
            .ok_or(ParsePartRatingsError::ExpectedWrappingCurlyBraces)?;

        let mut values: [Option<u32>; 4] = [None; 4];
        for pair in ratings.split(',') {
            let (key, value) = pair
                .split_once('=')
                .ok_or_else(|| ParsePartRatingsError::ExpectedEqualsDelimiter(pair.to_owned()))?;

            let mut key_chars = key.chars();
            let (Some(key_char), None) = (key_chars.next(), key_chars.next()) else {
                return Err(ParsePartRatingsError::InvalidKey(key.to_owned()));
            };
            let category = Category::try_from(key_char)?;

            let slot = &mut values[category.index()];
            if slot.is_some() {
                return Err(ParsePartRatingsError::DuplicateCategory(category));
            }
            *slot = Some(parse_with_context(value)?);
        }

        let mut part = Self([0u32; 4]);
        for category in Category::ALL {
            let value = values[category.index()]
                .ok_or(ParsePartRatingsError::MissingCategory(category))?;
            part = part.with_category(category, value);
        }
        Ok(part)
    }
}

#[derive(thiserror::Error, Debug)]
enum ParseSystemError {
    #[error("workflow {0:?} is defined more than once")]
    DuplicateWorkflow(String),

    #[error("expected an entry workflow named {:?}", Workflows::ENTRY)]
    MissingEntryWorkflow,

    #[error("workflow {from:?} redirects to workflow {to:?}, which does not exist")]
    UnknownWorkflowReference { from: String, to: String },

    #[error("expected the input to end after the parts' ratings")]
    TrailingInput,
}

impl Workflows {
    /// Check the entry workflow exists and every redirect names an existing workflow.
    fn validate(&self) -> Result<(), ParseSystemError> {
        if !self.0.contains_key(Self::ENTRY) {
            return Err(ParseSystemError::MissingEntryWorkflow);
        }

        for (name, workflow) in &self.0 {
            for rule in &workflow.rules {
                if let Outcome::Redirect(to) = rule.next()
                    && !self.0.contains_key(to)
                {
                    return Err(ParseSystemError::UnknownWorkflowReference {
                        from: name.clone(),
                        to: to.clone(),
                    });
                }
            }
        }

        Ok(())
    }
}

impl ParseData for System {
    fn parse(input: &str) -> DynamicResult<Self>
    where
        Self: Sized,
    {
        let mut scanner = InputScanner::new(input);
        let rule_parser = RuleParser::new();

        let mut workflows = Workflows::default();
        for (name, workflow) in
            scanner.collect_sequence(|_, line| rule_parser.parse_workflow(line))?
        {
            if workflows.0.contains_key(&name) {
                return Err(ParseSystemError::DuplicateWorkflow(name).into());
            }
            workflows.0.insert(name, workflow);
        }
        workflows.validate()?;

        let parts_ratings = if scanner.skip_empty().is_some() {
            scanner.collect_sequence(|_, line| line.parse::<PartRatings>())?
        } else {
            Vec::new()
        };
        if scanner.skip_empty().is_some() {
            return Err(ParseSystemError::TrailingInput.into());
        }

        debug!(
            workflows = workflows.0.len(),
            parts = parts_ratings.len(),
            "parsed system"
        );
        Ok(Self {
            workflows,
            parts_ratings,
        })
    }
}

// -- Evaluation --

/// The result of splitting a range of parts by a rule.
#[derive(Debug, PartialEq, Eq)]
struct RuleSplit {
    /// Parts satisfying the rule, to continue with the rule's outcome.
    matched: Option<PartRange>,
    /// Parts failing the rule, to continue with the next rule of the workflow.
    unmatched: Option<PartRange>,
}

impl Rule {
    fn next(&self) -> &Outcome {
        match self {
            Self::LessThan { next, .. }
            | Self::GreaterThan { next, .. }
            | Self::Unconditional(next) => next,
        }
    }

    /// Whether a concrete part satisfies this rule.
    fn matches(&self, part: &PartRatings) -> bool {
        match *self {
            Self::LessThan {
                category,
                threshold,
                ..
            } => part.get(category) < threshold,
            Self::GreaterThan {
                category,
                threshold,
                ..
            } => part.get(category) > threshold,
            Self::Unconditional(_) => true,
        }
    }

    /// Split a range of parts into those that match this rule and those that don't. A side is
    /// `None` when no part in the range falls on it.
    fn split(&self, range: PartRange) -> RuleSplit {
        let split_category = |category: Category, matched, unmatched| {
            let with = |interval: Option<RatingInterval>| {
                interval.map(|interval| range.with_category(category, interval))
            };
            RuleSplit {
                matched: with(matched),
                unmatched: with(unmatched),
            }
        };

        match *self {
            Self::LessThan {
                category,
                threshold,
                ..
            } => {
                let RatingInterval { min, max } = range.get(category);
                split_category(
                    category,
                    threshold
                        .checked_sub(1)
                        .and_then(|below| RatingInterval::new(min, max.min(below))),
                    RatingInterval::new(min.max(threshold), max),
                )
            }
            Self::GreaterThan {
                category,
                threshold,
                ..
            } => {
                let RatingInterval { min, max } = range.get(category);
                split_category(
                    category,
                    threshold
                        .checked_add(1)
                        .and_then(|above| RatingInterval::new(min.max(above), max)),
                    RatingInterval::new(min, max.min(threshold)),
                )
            }
            Self::Unconditional(_) => RuleSplit {
                matched: Some(range),
                unmatched: None,
            },
        }
    }
}

impl Workflow {
    /// The outcome of the first rule a part matches, or `None` if no rule matches.
    fn evaluate_point(&self, part: &PartRatings) -> Option<&Outcome> {
        self.rules
            .iter()
            .find(|rule| rule.matches(part))
            .map(Rule::next)
    }

    /// Route a range of parts through the rules, returning each matched sub-range with the outcome
    /// of the rule that matched it. Parts matching no rule are dropped.
    fn evaluate_range(&self, range: PartRange) -> Vec<(PartRange, &Outcome)> {
        let mut routed = Vec::new();
        let mut remaining = Some(range);

        for rule in &self.rules {
            let Some(current) = remaining else {
                break;
            };
            let RuleSplit { matched, unmatched } = rule.split(current);
            if let Some(matched_range) = matched {
                routed.push((matched_range, rule.next()));
            }
            remaining = unmatched;
        }

        if let Some(unrouted) = remaining {
            trace!(?unrouted, "range left unmatched by every rule");
        }
        routed
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
enum EvaluateError {
    #[error("no workflow named {0:?}")]
    UnknownWorkflow(String),

    #[error("no rule of workflow {0:?} matched the part")]
    NoMatchingRule(String),

    #[error("workflow {0:?} was redirected to in a cycle")]
    RedirectCycle(String),

    #[error("counting parts overflowed")]
    CountOverflow,
}

impl Workflows {
    /// The name of the workflow every part starts in.
    const ENTRY: &str = "in";

    fn get(&self, name: &str) -> Result<&Workflow, EvaluateError> {
        self.0
            .get(name)
            .ok_or_else(|| EvaluateError::UnknownWorkflow(name.to_owned()))
    }

    /// Evaluate a concrete part from the entry workflow until it is accepted or rejected.
    fn evaluate_point(&self, part: &PartRatings) -> Result<Verdict, EvaluateError> {
        let mut current_name: &str = Self::ENTRY;
        // a redirect chain longer than the number of workflows must revisit one
        for _ in 0..=self.0.len() {
            let outcome = self
                .get(current_name)?
                .evaluate_point(part)
                .ok_or_else(|| EvaluateError::NoMatchingRule(current_name.to_owned()))?;
            match outcome {
                Outcome::Accepted => return Ok(Verdict::Accepted),
                Outcome::Rejected => return Ok(Verdict::Rejected),
                Outcome::Redirect(name) => current_name = name.as_str(),
            }
        }
        Err(EvaluateError::RedirectCycle(current_name.to_owned()))
    }

    /// Partition a range of parts from the entry workflow into sub-ranges that are each wholly
    /// accepted or rejected.
    fn evaluate_range(&self, range: PartRange) -> Result<Vec<(PartRange, Verdict)>, EvaluateError> {
        let mut resolved = Vec::new();
        // pending ranges, the workflow to evaluate each in, and how many workflows each went through
        let mut pending: Vec<(PartRange, &str, usize)> = vec![(range, Self::ENTRY, 1)];

        while let Some((current, name, visited)) = pending.pop() {
            if visited > self.0.len() {
                return Err(EvaluateError::RedirectCycle(name.to_owned()));
            }

            for (sub_range, outcome) in self.get(name)?.evaluate_range(current) {
                match outcome {
                    Outcome::Accepted => resolved.push((sub_range, Verdict::Accepted)),
                    Outcome::Rejected => resolved.push((sub_range, Verdict::Rejected)),
                    Outcome::Redirect(next) => {
                        pending.push((sub_range, next.as_str(), visited + 1));
                    }
                }
            }
        }

        debug!(partitions = resolved.len(), "range fully resolved");
        Ok(resolved)
    }

    /// Count the distinct parts within a range that end up accepted.
    fn count_accepted(&self, range: PartRange) -> Result<u64, EvaluateError> {
        self.evaluate_range(range)?
            .into_iter()
            .filter(|&(_, verdict)| verdict == Verdict::Accepted)
            .map(|(accepted, _)| accepted.count_distinct())
            .collect::<Option<Vec<_>>>()
            .and_then(|counts| counts.into_iter().checked_sum())
            .ok_or(EvaluateError::CountOverflow)
    }
}

/*
For part 1, process each part starting with the workflow named `in`, sum the ratings of every
accepted part.
*/

impl PartRatings {
    /// Calculate the sum of all ratings, or `None` on overflow.
    fn sum(&self) -> Option<u32> {
        self.0.into_iter().checked_sum()
    }
}

#[derive(thiserror::Error, Debug)]
#[error("sum of accepted part ratings overflowed")]
struct RatingSumOverflow;

struct Day19;

impl Solution<PartOne> for Day19 {
    type Input = System;
    type Output = u32;

    fn solve(input: &Self::Input) -> DynamicResult<Self::Output> {
        let mut accepted_sums = Vec::new();
        for part in &input.parts_ratings {
            if input.workflows.evaluate_point(part)? == Verdict::Accepted {
                accepted_sums.push(part.sum().ok_or(RatingSumOverflow)?);
            }
        }
        let sum = accepted_sums
            .into_iter()
            .checked_sum()
            .ok_or(RatingSumOverflow)?;
        Ok(sum)
    }
}

/*
For part 2, ratings are confirmed to be in the range 1 to 4000 (inclusive). Calculate across all
distinct combinations of ratings how many would be accepted by the workflows.
*/

impl Solution<PartTwo> for Day19 {
    type Input = System;
    type Output = u64;

    fn solve(input: &Self::Input) -> DynamicResult<Self::Output> {
        Ok(input.workflows.count_accepted(PartRange::full_domain())?)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    const EXAMPLE_INPUT: &str = r"px{a<2006:qkq,m>2090:A,rfg}
pv{a>1716:R,A}
lnx{m>1548:A,A}
rfg{s<537:gd,x>2440:R,A}
qs{s>3448:A,lnx}
qkq{x<1416:A,crn}
crn{x>2662:A,R}
in{s<1351:px,qqz}
qqz{s>2770:qs,m<1801:hdj,R}
gd{a>3333:R,R}
hdj{m>838:A,pv}

{x=787,m=2655,a=1222,s=2876}
{x=1679,m=44,a=2067,s=496}
{x=2036,m=264,a=79,s=2244}
{x=2461,m=1339,a=466,s=291}
{x=2127,m=1623,a=2188,s=1013}
";

    fn range(intervals: [(u32, u32); 4]) -> PartRange {
        Ratings(intervals.map(|(min, max)| RatingInterval { min, max }))
    }

    impl PartRange {
        fn contains(&self, part: &PartRatings) -> bool {
            Category::ALL.iter().all(|&category| {
                let RatingInterval { min, max } = self.get(category);
                (min..=max).contains(&part.get(category))
            })
        }
    }

    #[test]
    fn part_one_solves_example() -> DynamicResult<()> {
        let parsed = System::parse(EXAMPLE_INPUT)?;
        let result = <Day19 as Solution<PartOne>>::solve(&parsed)?;
        assert_eq!(result, 19114);
        Ok(())
    }

    #[test]
    fn part_two_solves_example() -> DynamicResult<()> {
        let parsed = System::parse(EXAMPLE_INPUT)?;
        let result = <Day19 as Solution<PartTwo>>::solve(&parsed)?;
        assert_eq!(result, 167_409_079_868_000);
        Ok(())
    }

    #[test]
    fn first_example_part_is_accepted() -> DynamicResult<()> {
        let parsed = System::parse(EXAMPLE_INPUT)?;
        let part: PartRatings = "{x=787,m=2655,a=1222,s=2876}".parse()?;
        assert_eq!(part, Ratings([787, 2655, 1222, 2876]));
        assert_eq!(parsed.workflows.evaluate_point(&part)?, Verdict::Accepted);

        let rejected = &parsed.parts_ratings[1];
        assert_eq!(parsed.workflows.evaluate_point(rejected)?, Verdict::Rejected);
        Ok(())
    }

    #[test]
    fn parses_rule_variants() {
        let parser = RuleParser::new();
        let Ok((name, workflow)) = parser.parse_workflow("px{a<2006:qkq,m>2090:A,rfg}") else {
            panic!("expected workflow to parse");
        };
        assert_eq!(name, "px");
        assert_eq!(
            workflow.rules,
            [
                Rule::LessThan {
                    category: Category::A,
                    threshold: 2006,
                    next: Outcome::Redirect("qkq".to_owned()),
                },
                Rule::GreaterThan {
                    category: Category::M,
                    threshold: 2090,
                    next: Outcome::Accepted,
                },
                Rule::Unconditional(Outcome::Redirect("rfg".to_owned())),
            ]
        );
    }

    #[test]
    fn rule_errors_name_the_offending_token() {
        let parser = RuleParser::new();
        assert!(matches!(
            parser.parse_rule("q<10:A"),
            Err(ParseRuleError::UnknownCategory('q'))
        ));
        assert!(matches!(
            parser.parse_rule("x=10:A"),
            Err(ParseRuleError::UnknownComparator('='))
        ));
        assert!(matches!(
            parser.parse_rule("x<ten:A"),
            Err(ParseRuleError::InvalidThreshold(_))
        ));
        assert!(matches!(
            parser.parse_rule("x<10:A1"),
            Err(ParseRuleError::InvalidOutcome(_))
        ));
        assert!(matches!(
            parser.parse_workflow("A{x<10:R,R}"),
            Err(ParseWorkflowError::ReservedName(_))
        ));
    }

    #[test]
    fn rejects_invalid_systems() {
        // unknown workflow reference
        assert!(System::parse("in{x<10:px,A}\n").is_err());
        // missing entry workflow
        assert!(System::parse("px{x<10:R,A}\n").is_err());
        // duplicate workflow
        assert!(System::parse("in{A}\nin{R}\n").is_err());
        // part missing a category
        assert!(System::parse("in{A}\n\n{x=1,m=2,a=3}\n").is_err());
        // part with an unknown category
        assert!(System::parse("in{A}\n\n{x=1,m=2,a=3,q=4}\n").is_err());
    }

    #[test]
    fn rejects_input_after_parts() {
        let Err(error) = System::parse("in{A}\n\n{x=1,m=2,a=3,s=4}\n\n{x=5,m=6,a=7,s=8}\n") else {
            panic!("expected a second block of parts to be rejected");
        };
        assert!(matches!(
            error.downcast_ref::<ParseSystemError>(),
            Some(ParseSystemError::TrailingInput)
        ));
    }

    #[test]
    fn parses_system_without_parts() -> DynamicResult<()> {
        let parsed = System::parse("in{x>2000:A,R}\n")?;
        assert!(parsed.parts_ratings.is_empty());
        assert_eq!(
            parsed.workflows.count_accepted(PartRange::full_domain())?,
            2000 * 4000 * 4000 * 4000
        );
        Ok(())
    }

    #[test]
    fn splits_at_threshold_boundaries() {
        let full = PartRange::full_domain();
        let less = Rule::LessThan {
            category: Category::M,
            threshold: 1801,
            next: Outcome::Accepted,
        };
        assert_eq!(
            less.split(full),
            RuleSplit {
                matched: Some(range([(1, 4000), (1, 1800), (1, 4000), (1, 4000)])),
                unmatched: Some(range([(1, 4000), (1801, 4000), (1, 4000), (1, 4000)])),
            }
        );

        let greater = Rule::GreaterThan {
            category: Category::S,
            threshold: 2770,
            next: Outcome::Rejected,
        };
        assert_eq!(
            greater.split(full),
            RuleSplit {
                matched: Some(range([(1, 4000), (1, 4000), (1, 4000), (2771, 4000)])),
                unmatched: Some(range([(1, 4000), (1, 4000), (1, 4000), (1, 2770)])),
            }
        );
    }

    #[test]
    fn whole_range_routed_when_threshold_outside() {
        let narrow = range([(10, 20), (1, 4000), (1, 4000), (1, 4000)]);
        let all_below = Rule::LessThan {
            category: Category::X,
            threshold: 21,
            next: Outcome::Accepted,
        };
        assert_eq!(
            all_below.split(narrow),
            RuleSplit {
                matched: Some(narrow),
                unmatched: None,
            }
        );

        let none_above = Rule::GreaterThan {
            category: Category::X,
            threshold: 20,
            next: Outcome::Accepted,
        };
        assert_eq!(
            none_above.split(narrow),
            RuleSplit {
                matched: None,
                unmatched: Some(narrow),
            }
        );

        let nothing_below_zero = Rule::LessThan {
            category: Category::X,
            threshold: 0,
            next: Outcome::Accepted,
        };
        assert_eq!(nothing_below_zero.split(narrow).matched, None);
    }

    #[test]
    fn redirect_cycles_are_errors() -> DynamicResult<()> {
        let parsed = System::parse("in{x<10:A,loop}\nloop{in}\n")?;
        let part = Ratings([20, 1, 1, 1]);
        assert!(matches!(
            parsed.workflows.evaluate_point(&part),
            Err(EvaluateError::RedirectCycle(_))
        ));
        assert!(matches!(
            parsed.workflows.evaluate_range(PartRange::full_domain()),
            Err(EvaluateError::RedirectCycle(_))
        ));
        Ok(())
    }

    #[test]
    fn unmatched_point_is_an_error() -> DynamicResult<()> {
        let parsed = System::parse("in{x<10:A}\n")?;
        assert_eq!(
            parsed.workflows.evaluate_point(&Ratings([20, 1, 1, 1])),
            Err(EvaluateError::NoMatchingRule("in".to_owned()))
        );
        // the unmatched remainder of a range is dropped instead
        assert_eq!(
            parsed.workflows.count_accepted(PartRange::full_domain())?,
            9 * 4000 * 4000 * 4000
        );
        Ok(())
    }

    fn interval() -> impl Strategy<Value = (u32, u32)> {
        (1u32..=4000, 1u32..=4000).prop_map(|(a, b)| (a.min(b), a.max(b)))
    }

    fn part_range() -> impl Strategy<Value = PartRange> {
        [interval(), interval(), interval(), interval()].prop_map(range)
    }

    fn category() -> impl Strategy<Value = Category> {
        prop::sample::select(Category::ALL.to_vec())
    }

    fn comparison_rule() -> impl Strategy<Value = Rule> {
        (category(), 0u32..=4001, any::<bool>()).prop_map(|(category, threshold, less)| {
            let next = Outcome::Accepted;
            if less {
                Rule::LessThan {
                    category,
                    threshold,
                    next,
                }
            } else {
                Rule::GreaterThan {
                    category,
                    threshold,
                    next,
                }
            }
        })
    }

    /// A concrete part inside `range`, chosen by a per-category offset in thousandths.
    fn point_in(range: &PartRange, permille: [u32; 4]) -> PartRatings {
        let mut part = Ratings([0u32; 4]);
        for category in Category::ALL {
            let RatingInterval { min, max } = range.get(category);
            let offset = (max - min) * permille[category.index()] / 1000;
            part = part.with_category(category, min + offset);
        }
        part
    }

    /// Workflow names in order; a workflow only redirects to names after its own.
    const WORKFLOW_NAMES: [&str; 5] = ["in", "qa", "qb", "qc", "qd"];

    /// Where a generated rule of workflow `from` goes: accept, reject, or redirect to a later
    /// workflow when there is one.
    fn generated_outcome(
        kind: u8,
        later: prop::sample::Index,
        from: usize,
        count: usize,
    ) -> Outcome {
        let remaining = count - from - 1;
        match kind {
            0 => Outcome::Accepted,
            2 if remaining > 0 => {
                Outcome::Redirect(WORKFLOW_NAMES[from + 1 + later.index(remaining)].to_owned())
            }
            _ => Outcome::Rejected,
        }
    }

    /// Workflows without redirect cycles, each ending in an unconditional rule.
    fn acyclic_workflows() -> impl Strategy<Value = Workflows> {
        let rule_seed = (
            category(),
            0u32..=4001,
            any::<bool>(),
            0u8..3,
            any::<prop::sample::Index>(),
        );
        let workflow_seed = (
            prop::collection::vec(rule_seed, 0..=4),
            0u8..3,
            any::<prop::sample::Index>(),
        );

        prop::collection::vec(workflow_seed, 1..=WORKFLOW_NAMES.len()).prop_map(|seeds| {
            let count = seeds.len();
            let workflows = seeds
                .into_iter()
                .enumerate()
                .map(|(from, (rule_seeds, fallback_kind, fallback_later))| {
                    let mut rules: Vec<Rule> = rule_seeds
                        .into_iter()
                        .map(|(category, threshold, less, kind, later)| {
                            let next = generated_outcome(kind, later, from, count);
                            if less {
                                Rule::LessThan {
                                    category,
                                    threshold,
                                    next,
                                }
                            } else {
                                Rule::GreaterThan {
                                    category,
                                    threshold,
                                    next,
                                }
                            }
                        })
                        .collect();
                    rules.push(Rule::Unconditional(generated_outcome(
                        fallback_kind,
                        fallback_later,
                        from,
                        count,
                    )));
                    (WORKFLOW_NAMES[from].to_owned(), Workflow { rules })
                })
                .collect();
            Workflows(workflows)
        })
    }

    /// Check the range partitions cover every part of the domain once, and that each sampled part
    /// lies in exactly one partition whose verdict matches evaluating the part directly.
    fn check_partitions(
        workflows: &Workflows,
        samples: &[[u32; 4]],
    ) -> Result<(), TestCaseError> {
        let partitions = workflows
            .evaluate_range(PartRange::full_domain())
            .map_err(|e| TestCaseError::fail(e.to_string()))?;

        let covered = partitions
            .iter()
            .map(|(range, _)| range.count_distinct())
            .sum::<Option<u64>>();
        prop_assert_eq!(covered, PartRange::full_domain().count_distinct());

        for &values in samples {
            let part = Ratings(values);
            let containing: Vec<_> = partitions
                .iter()
                .filter(|(range, _)| range.contains(&part))
                .collect();
            prop_assert_eq!(containing.len(), 1);
            prop_assert_eq!(Ok(containing[0].1), workflows.evaluate_point(&part));
        }
        Ok(())
    }

    proptest! {
        #[test]
        fn split_preserves_every_part(
            rule in comparison_rule(),
            input in part_range(),
            samples in prop::collection::vec([0u32..=1000, 0..=1000, 0..=1000, 0..=1000], 16),
        ) {
            let RuleSplit { matched, unmatched } = rule.split(input);

            let counts = [matched, unmatched]
                .iter()
                .flatten()
                .map(|r| r.count_distinct().unwrap_or(u64::MAX))
                .sum::<u64>();
            prop_assert_eq!(Some(counts), input.count_distinct());

            for permille in samples {
                let part = point_in(&input, permille);
                let in_matched = matched.is_some_and(|r| r.contains(&part));
                let in_unmatched = unmatched.is_some_and(|r| r.contains(&part));
                prop_assert!(in_matched != in_unmatched);
                prop_assert_eq!(in_matched, rule.matches(&part));
            }
        }

        #[test]
        fn range_evaluation_agrees_with_points(
            samples in prop::collection::vec([1u32..=4000, 1u32..=4000, 1u32..=4000, 1u32..=4000], 32),
        ) {
            let parsed = System::parse(EXAMPLE_INPUT).map_err(|e| TestCaseError::fail(e.to_string()))?;
            check_partitions(&parsed.workflows, &samples)?;
        }

        #[test]
        fn acyclic_workflows_partition_every_part(
            workflows in acyclic_workflows(),
            samples in prop::collection::vec([1u32..=4000, 1u32..=4000, 1u32..=4000, 1u32..=4000], 32),
        ) {
            check_partitions(&workflows, &samples)?;
        }
    }
}
