use std::collections::{BTreeMap, HashMap, VecDeque};

use aoc_framework::parsing::parse_input_lines;
use aoc_framework::runner::solution_runner;
use aoc_framework::{DynamicResult, ParseData, PartOne, PartTwo, Solution};
use tracing::{debug, warn};

#[solution_runner(
    name = "Day 20: Pulse Propagation",
    parsed = ModuleGraph,
    part_one = Day20,
    part_two = Day20
)]
impl super::AdventOfCode2023<20> {}

/*
Modules can pulse *high* or *low* to destination modules.

A flip-flop module stores an on/off state, starting off. It ignores high pulses, but on a low pulse
toggles its state. If it toggles on it sends a high pulse, and off a low pulse.

A conjunction module remembers pulses received from all connections to it, initializing with low
pulses. It sends a pulse after receiving & updating the stored value: if all inputs are high then it
sends low, otherwise sends high.

A single untyped module with name "broadcaster" is expected as a broadcast module, propagating any
pulse received.

Input is a configuration of modules. Each line defines a module name, an arrow (" -> "), and a
comma-space-separated list of destination module names. The module name before the arrow is preceded
by a symbol for a module type if applicable:

- `%` - a flip-flop module
- `&` - a conjunction module
*/

/// A pulse sent from one module to another.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Pulse {
    source: String,
    destination: String,
    /// `true` for a high pulse, `false` for a low pulse.
    high: bool,
}

/// The behavior and state of a module by type.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ModuleKind {
    /// Tracks an on/off state.
    FlipFlop { on: bool },
    /// Tracks the last pulse received from each of its inputs.
    Conjunction { memory: BTreeMap<String, bool> },
    /// Re-sends every pulse it receives.
    Broadcast,
}

impl ModuleKind {
    /// Receive a pulse from a source module by name, returning the pulse this module sends to all
    /// its destinations in response, if any.
    fn receive_pulse(&mut self, high: bool, source: &str) -> Option<bool> {
        match self {
            Self::FlipFlop { on } => {
                // do nothing on high pulse
                if high {
                    return None;
                }
                *on = !*on;
                Some(*on)
            }
            Self::Conjunction { memory } => {
                if let Some(remembered) = memory.get_mut(source) {
                    *remembered = high;
                } else {
                    warn!(source, "conjunction received a pulse from an unconnected module");
                }
                // low only when every input is remembered high, like a NAND gate
                Some(!memory.values().all(|&remembered| remembered))
            }
            Self::Broadcast => Some(high),
        }
    }

    /// Return to the initial state: flip-flops off, conjunctions remembering low pulses.
    fn reset(&mut self) {
        match self {
            Self::FlipFlop { on } => *on = false,
            Self::Conjunction { memory } => memory.values_mut().for_each(|value| *value = false),
            Self::Broadcast => {}
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Module {
    kind: ModuleKind,
    destinations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ModuleGraph {
    modules: HashMap<String, Module>,
}

impl ModuleGraph {
    /// The expected name of the broadcaster module.
    const BROADCASTER_NAME: &str = "broadcaster";
    /// The source name of the pulse sent into the broadcaster by pressing the button.
    const BUTTON_NAME: &str = "button";

    /// Names of every module with `name` as a destination.
    fn inputs_of(&self, name: &str) -> Vec<String> {
        let mut inputs: Vec<_> = self
            .modules
            .iter()
            .filter(|(_, module)| module.destinations.iter().any(|d| d == name))
            .map(|(source, _)| source.clone())
            .collect();
        inputs.sort_unstable();
        inputs
    }

    /// Set every conjunction module to remember a low pulse from each of its inputs.
    fn connect_conjunction_inputs(&mut self) {
        let conjunction_inputs: Vec<(String, Vec<String>)> = self
            .modules
            .iter()
            .filter(|(_, module)| matches!(module.kind, ModuleKind::Conjunction { .. }))
            .map(|(name, _)| (name.clone(), self.inputs_of(name)))
            .collect();

        for (name, inputs) in conjunction_inputs {
            if let Some(Module {
                kind: ModuleKind::Conjunction { memory },
                ..
            }) = self.modules.get_mut(&name)
            {
                *memory = inputs.into_iter().map(|input| (input, false)).collect();
            }
        }
    }

    /// Return every module to its initial state.
    fn reset(&mut self) {
        for module in self.modules.values_mut() {
            module.kind.reset();
        }
    }
}

#[derive(thiserror::Error, Debug)]
enum ParseModuleGraphError {
    #[error("expected arrow delimiter (\" -> \") separating module name and destination modules")]
    MissingArrowDelimiter,

    #[error(
        "unrecognized module {0:?}, expected a `%` or `&` prefix or the name \"broadcaster\""
    )]
    UnrecognizedModule(String),

    #[error("expected a non-empty module name")]
    EmptyName,

    #[error("module {0:?} is defined more than once")]
    DuplicateModule(String),

    #[error("expected a module named \"broadcaster\"")]
    MissingBroadcaster,
}

impl ParseData for ModuleGraph {
    fn parse(input: &str) -> DynamicResult<Self>
    where
        Self: Sized,
    {
        let definitions =
            parse_input_lines(input, |_, line| -> Result<_, ParseModuleGraphError> {
                let (name, destinations_list) = line
                    .split_once(" -> ")
                    .ok_or(ParseModuleGraphError::MissingArrowDelimiter)?;

                let destinations = destinations_list
                    .split(", ")
                    .map(|destination| {
                        if destination.is_empty() {
                            Err(ParseModuleGraphError::EmptyName)
                        } else {
                            Ok(destination.to_owned())
                        }
                    })
                    .collect::<Result<Vec<_>, _>>()?;

                let (name, kind) = if let Some(flip_flop_name) = name.strip_prefix('%') {
                    (flip_flop_name, ModuleKind::FlipFlop { on: false })
                } else if let Some(conjunction_name) = name.strip_prefix('&') {
                    (
                        conjunction_name,
                        ModuleKind::Conjunction {
                            memory: BTreeMap::new(),
                        },
                    )
                } else if name == Self::BROADCASTER_NAME {
                    (name, ModuleKind::Broadcast)
                } else {
                    return Err(ParseModuleGraphError::UnrecognizedModule(name.to_owned()));
                };
                if name.is_empty() {
                    return Err(ParseModuleGraphError::EmptyName);
                }

                Ok((name.to_owned(), Module { kind, destinations }))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut modules = HashMap::new();
        for (name, module) in definitions {
            if modules.contains_key(&name) {
                return Err(ParseModuleGraphError::DuplicateModule(name).into());
            }
            modules.insert(name, module);
        }
        if !modules.contains_key(Self::BROADCASTER_NAME) {
            return Err(ParseModuleGraphError::MissingBroadcaster.into());
        }

        let mut graph = Self { modules };
        graph.connect_conjunction_inputs();
        debug!(modules = graph.modules.len(), "parsed module graph");

        Ok(graph)
    }
}

/*
A button is connected to send a low pulse to the broadcaster module. Pulses must finish processing
before pressing the button again. Pulses are processed in the order they are sent.
*/

impl ModuleGraph {
    /// Press the button, sending a low pulse into the broadcaster and processing pulses in the
    /// order they were sent until none remain. Returns every pulse in processing order, including
    /// the button's pulse.
    fn press_button(&mut self) -> Vec<Pulse> {
        let mut pulses_processed = Vec::new();

        let mut queue = VecDeque::from([Pulse {
            source: Self::BUTTON_NAME.to_owned(),
            destination: Self::BROADCASTER_NAME.to_owned(),
            high: false,
        }]);

        while let Some(pulse) = queue.pop_front() {
            // destinations without a module definition receive the pulse but go no further
            if let Some(module) = self.modules.get_mut(&pulse.destination)
                && let Some(output) = module.kind.receive_pulse(pulse.high, &pulse.source)
            {
                for destination in &module.destinations {
                    queue.push_back(Pulse {
                        source: pulse.destination.clone(),
                        destination: destination.clone(),
                        high: output,
                    });
                }
            }
            pulses_processed.push(pulse);
        }

        pulses_processed
    }

    /// Press the button until `name` sends a pulse of the given level, returning the number of
    /// presses. Gives up with `None` after `max_presses`.
    fn first_press_emitting(&mut self, name: &str, high: bool, max_presses: u32) -> Option<u32> {
        (1..=max_presses).find(|_| {
            self.press_button()
                .iter()
                .any(|pulse| pulse.source == name && pulse.high == high)
        })
    }
}

/// Totals of low and high pulses sent.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct PulseCounts {
    low: u64,
    high: u64,
}

impl PulseCounts {
    fn tally(&mut self, pulses: &[Pulse]) {
        for pulse in pulses {
            if pulse.high {
                self.high += 1;
            } else {
                self.low += 1;
            }
        }
    }
}

impl ModuleGraph {
    /// Press the button `presses` times, counting all pulses sent.
    fn count_pulses(&mut self, presses: u32) -> PulseCounts {
        let mut counts = PulseCounts::default();
        for _ in 0..presses {
            counts.tally(&self.press_button());
        }
        counts
    }
}

/*
For part 1, push the button 1000 times and multiply the counts of low and high pulses sent.
*/

#[derive(thiserror::Error, Debug)]
#[error("product of pulse counts overflowed: {0:?}")]
struct PulseProductOverflow(PulseCounts);

struct Day20;

impl Solution<PartOne> for Day20 {
    type Input = ModuleGraph;
    type Output = u64;

    fn solve(input: &Self::Input) -> DynamicResult<Self::Output> {
        let mut graph = input.clone();
        graph.reset();
        let counts = graph.count_pulses(1000);
        let product = counts
            .low
            .checked_mul(counts.high)
            .ok_or(PulseProductOverflow(counts))?;
        Ok(product)
    }
}

/*
For part 2, find the minimum button presses needed to have the module "rx" receive a low pulse.

The input is structured so a single conjunction module sends to "rx", so it has to remember a high
pulse from each of its inputs (feeders) in the same press. Each feeder is driven by an isolated
subgraph that first sends a high pulse after some number of presses and then repeats on that cycle.
The answer is the least common multiple of those cycle lengths.
*/

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
enum FeederAnalysisError {
    #[error("no module sends to \"rx\"")]
    NoRxSource,

    #[error("multiple modules send to \"rx\": {0:?}")]
    MultipleRxSources(Vec<String>),

    #[error("module {0:?} sending to rx is not a conjunction module")]
    RxSourceNotConjunction(String),

    #[error("conjunction module {0:?} sending to rx has no inputs")]
    NoFeeders(String),

    #[error("feeder {name:?} sent no high pulse within {presses} presses")]
    NoCycleFound { name: String, presses: u32 },

    #[error("least common multiple of cycle lengths overflowed: {0:?}")]
    CycleOverflow(Vec<u32>),
}

impl ModuleGraph {
    /// The expected name of the "rx" module.
    const RX_NAME: &str = "rx";
    /// Presses to try per feeder before giving up on finding its cycle.
    const MAX_CYCLE_PRESSES: u32 = 100_000;

    /// Find the inputs of the single conjunction module sending to "rx".
    fn rx_feeders(&self) -> Result<Vec<String>, FeederAnalysisError> {
        let mut sources = self.inputs_of(Self::RX_NAME);
        let source = match sources.len() {
            0 => return Err(FeederAnalysisError::NoRxSource),
            1 => sources.remove(0),
            _ => return Err(FeederAnalysisError::MultipleRxSources(sources)),
        };

        match self.modules.get(&source).map(|module| &module.kind) {
            Some(ModuleKind::Conjunction { memory }) if memory.is_empty() => {
                Err(FeederAnalysisError::NoFeeders(source))
            }
            Some(ModuleKind::Conjunction { memory }) => Ok(memory.keys().cloned().collect()),
            _ => Err(FeederAnalysisError::RxSourceNotConjunction(source)),
        }
    }

    /// Press count until each feeder of "rx" first sends a high pulse, each measured from a reset
    /// graph.
    fn feeder_cycle_lengths(&mut self) -> Result<Vec<u32>, FeederAnalysisError> {
        self.rx_feeders()?
            .into_iter()
            .map(|name| {
                self.reset();
                let presses = self
                    .first_press_emitting(&name, true, Self::MAX_CYCLE_PRESSES)
                    .ok_or_else(|| FeederAnalysisError::NoCycleFound {
                        name: name.clone(),
                        presses: Self::MAX_CYCLE_PRESSES,
                    })?;
                debug!(feeder = %name, presses, "found feeder cycle");
                Ok(presses)
            })
            .collect()
    }
}

/// Least common multiple of all numbers, or `None` on overflow. Empty input yields one.
fn least_common_multiple(numbers: &[u32]) -> Option<u64> {
    fn greatest_common_divisor(a: u64, b: u64) -> u64 {
        if b == 0 {
            a
        } else {
            greatest_common_divisor(b, a % b)
        }
    }

    numbers
        .iter()
        .map(|&num| u64::from(num))
        .try_fold(1u64, |result, num| {
            let divisor = greatest_common_divisor(result, num);
            if divisor == 0 {
                return Some(0);
            }
            (result / divisor).checked_mul(num)
        })
}

impl Solution<PartTwo> for Day20 {
    type Input = ModuleGraph;
    type Output = u64;

    fn solve(input: &Self::Input) -> DynamicResult<Self::Output> {
        let mut graph = input.clone();
        let cycle_lengths = graph.feeder_cycle_lengths()?;
        let presses = least_common_multiple(&cycle_lengths)
            .ok_or(FeederAnalysisError::CycleOverflow(cycle_lengths))?;
        Ok(presses)
    }
}
