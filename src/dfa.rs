use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::convert::TryFrom;
use std::fmt;

use bit_set::BitSet;
use log::{debug, trace};
use vec_map::VecMap;

use crate::automaton::{Automaton, StateId, Symbol};
use crate::error::{Error, Result};

/// A deterministic finite automaton.
///
/// Unlike a plain `Automaton`, a `Dfa` is known to have an initial state, no
/// epsilon transitions, and at most one transition per state and symbol. It
/// can only be obtained from `Dfa::determinize`, `Dfa::minimize`, or by
/// validating an automaton with `Dfa::try_from`.
#[derive(Debug, Clone)]
pub struct Dfa {
    automaton: Automaton,
    initial: StateId,
}

impl TryFrom<Automaton> for Dfa {
    type Error = Error;

    /// Check that `automaton` is deterministic.
    fn try_from(automaton: Automaton) -> Result<Dfa> {
        let initial = automaton.initial_state()?;
        for state in automaton.states() {
            let mut seen = BTreeSet::new();
            for &(symbol, _) in automaton.edges(state)? {
                if symbol.is_epsilon() {
                    return Err(Error::TypeMismatch(format!(
                        "state {} has an epsilon transition", state)));
                }
                if !seen.insert(symbol) {
                    return Err(Error::TypeMismatch(format!(
                        "state {} has more than one transition on {}", state, symbol)));
                }
            }
        }
        Ok(Dfa { automaton: automaton, initial: initial })
    }
}

impl Dfa {
    /// Construct a DFA from an epsilon-free automaton by subset construction.
    ///
    /// Each DFA state stands for a set of `nfa` states. Only sets reachable from
    /// `{initial}` are ever created. With `max_states` set, creating more than
    /// that many of them is an error.
    pub fn determinize(nfa: &Automaton, max_states: Option<usize>) -> Result<Dfa> {
        type Worklist = (BTreeMap<BitSet, StateId>, VecDeque<(BitSet, StateId)>);

        fn index(nfa: &Automaton, result: &mut Automaton, worklist: &mut Worklist,
                 set: BitSet, max_states: Option<usize>) -> Result<StateId> {
            if let Some(&ix) = worklist.0.get(&set) {
                return Ok(ix);
            }
            if let Some(limit) = max_states {
                if result.num_states() >= limit {
                    return Err(Error::StateLimitExceeded { limit: limit });
                }
            }
            let ix = result.add_state();
            for state in set.iter() {
                if nfa.is_terminal(state)? {
                    result.add_terminal_state(ix)?;
                    break;
                }
            }
            worklist.0.insert(set.clone(), ix);
            worklist.1.push_back((set, ix));
            Ok(ix)
        }

        if nfa.has_epsilon_transitions() {
            return Err(Error::TypeMismatch(
                "subset construction needs an automaton without epsilon transitions".to_string()));
        }

        let mut result = Automaton::new();
        let mut worklist = (BTreeMap::new(), VecDeque::new());

        let mut start = BitSet::new();
        start.insert(nfa.initial_state()?);
        let initial = index(nfa, &mut result, &mut worklist, start, max_states)?;
        result.set_initial_state(initial)?;

        while let Some((set, source)) = worklist.1.pop_front() {
            let mut by_symbol: BTreeMap<Symbol, BitSet> = BTreeMap::new();
            for t in nfa.transitions_from(set.iter())? {
                by_symbol.entry(t.symbol).or_insert_with(BitSet::new).insert(t.target);
            }
            for (symbol, targets) in by_symbol {
                let target = index(nfa, &mut result, &mut worklist, targets, max_states)?;
                result.add_transition(source, target, symbol)?;
            }
        }

        debug!("determinized: {} NFA states -> {} DFA states",
               nfa.num_states(), result.num_states());
        Ok(Dfa { automaton: result, initial: initial })
    }

    pub fn as_automaton(&self) -> &Automaton {
        &self.automaton
    }

    pub fn into_automaton(self) -> Automaton {
        self.automaton
    }

    pub fn initial_state(&self) -> StateId {
        self.initial
    }

    pub fn num_states(&self) -> usize {
        self.automaton.num_states()
    }

    pub fn is_terminal(&self, state: StateId) -> bool {
        self.automaton.is_terminal(state).unwrap_or(false)
    }

    fn edges(&self, state: StateId) -> &[(Symbol, StateId)] {
        self.automaton.edges(state).unwrap_or(&[])
    }

    fn next(&self, state: StateId, symbol: Symbol) -> Option<StateId> {
        self.edges(state).iter()
            .find(|&&(by, _)| by == symbol)
            .map(|&(_, to)| to)
    }

    /// The state entered from `state` on `c`, if there is one.
    pub fn next_state(&self, state: StateId, c: char) -> Option<StateId> {
        self.next(state, Symbol::Char(c))
    }

    /// Run `input` from the initial state. A missing transition rejects at
    /// once; otherwise the input is accepted iff the last state is terminal.
    pub fn accepts(&self, input: &str) -> bool {
        let mut state = self.initial;
        for c in input.chars() {
            match self.next_state(state, c) {
                Some(next) => state = next,
                None => return false,
            }
        }
        self.is_terminal(state)
    }

    /// Calculate the initial partition: terminal and non-terminal states.
    /// Only states reachable from the initial state are considered, so the
    /// automaton is traversed to find them. Either side may be absent.
    fn initial_partitions(&self) -> (Vec<BitSet>, Vec<bool>) {
        let mut partitions: Vec<BitSet> = vec![];
        let mut terminal: Vec<bool> = vec![];

        let mut by_flavour = BTreeMap::new();
        let mut worklist = VecDeque::new();
        let mut seen = BitSet::new();

        worklist.push_back(self.initial);
        seen.insert(self.initial);

        while let Some(state) = worklist.pop_front() {
            let flavour = self.is_terminal(state);
            let part = *by_flavour.entry(flavour)
                .or_insert_with(|| {
                    partitions.push(BitSet::new());
                    terminal.push(flavour);
                    partitions.len() - 1
                });
            partitions[part].insert(state);
            for &(_, next) in self.edges(state) {
                if seen.insert(next) {
                    worklist.push_back(next);
                }
            }
        }

        (partitions, terminal)
    }

    /// The `(symbol, block)` pairs a state's transitions lead to.
    fn signature(&self, state: StateId, block_of: &VecMap<usize>) -> Vec<(Symbol, usize)> {
        let mut sig: Vec<_> = self.edges(state).iter()
            .map(|&(symbol, to)| (symbol, block_of[to]))
            .collect();
        sig.sort();
        sig
    }

    /// Minimize a DFA; i.e. find a DFA with the fewest states that accepts the
    /// same language.
    ///
    /// Blocks of states are split by comparing each member's signature against
    /// a representative's, sweeping over all blocks until a sweep changes
    /// nothing. Each sweep costs O(n²) signature comparisons in the worst case.
    pub fn minimize(&self) -> Dfa {
        let (mut blocks, mut terminal) = self.initial_partitions();
        let mut block_of: VecMap<usize> = VecMap::new();
        let mut sweeps = 0;

        loop {
            // Signatures must use the indices as of the start of the sweep:
            // splits made below would otherwise leave them stale.
            block_of.clear();
            for (ix, block) in blocks.iter().enumerate() {
                for state in block.iter() {
                    block_of.insert(state, ix);
                }
            }
            sweeps += 1;
            trace!("sweep {}: {} blocks", sweeps, blocks.len());

            let mut changed = false;
            for ix in 0..blocks.len() {
                let mut current = ix;
                loop {
                    let representative = match blocks[current].iter().next() {
                        Some(state) => state,
                        None => break,
                    };
                    let expected = self.signature(representative, &block_of);
                    let distinct: BitSet = blocks[current].iter()
                        .filter(|&state| self.signature(state, &block_of) != expected)
                        .collect();
                    if distinct.is_empty() {
                        break;
                    }
                    trace!("sweep {}: split {} states off block {}", sweeps, distinct.len(), current);
                    changed = true;
                    blocks[current].difference_with(&distinct);
                    blocks.push(distinct);
                    terminal.push(terminal[current]);
                    current = blocks.len() - 1;
                }
            }
            if !changed {
                break;
            }
        }

        // The last sweep split nothing, so `block_of` is current.
        let rows: Vec<(bool, Vec<(Symbol, StateId)>)> = blocks.iter().zip(terminal.iter()).map(|(block, &flavour)| {
            let out: Vec<(Symbol, StateId)> = block.iter().next()
                .map(|representative| self.edges(representative).iter()
                     .map(|&(symbol, to)| (symbol, block_of[to]))
                     .collect::<Vec<_>>())
                .unwrap_or_default();
            (flavour, out)
        }).collect();
        let initial = block_of[self.initial];

        debug!("minimized: {} states -> {} states in {} sweeps", self.num_states(), blocks.len(), sweeps);
        Dfa {
            automaton: Automaton::from_rows(rows, initial),
            initial: initial,
        }
    }

    /// Compare DFAs by language equality.
    pub fn equiv(&self, other: &Dfa) -> bool {
        self.minimize() == other.minimize()
    }
}

/// Compare DFAs by graph isomorphism.
impl PartialEq for Dfa {
    fn eq(&self, other: &Dfa) -> bool {
        if self.num_states() != other.num_states() {
            return false;
        }
        let mut mapping = VecMap::with_capacity(self.num_states());
        let mut worklist = VecDeque::new();
        mapping.insert(self.initial, other.initial);
        worklist.push_back(self.initial);
        while let Some(ix) = worklist.pop_front() {
            let other_ix = mapping[ix];
            if self.is_terminal(ix) != other.is_terminal(other_ix) {
                return false;
            }
            let a = self.edges(ix);
            if a.len() != other.edges(other_ix).len() {
                return false;
            }
            for &(symbol, to) in a {
                if let Some(other_to) = other.next(other_ix, symbol) {
                    if let Some(old_mapping) = mapping.insert(to, other_to) {
                        // make sure the replaced element was the same
                        if old_mapping != other_to {
                            return false;
                        }
                    } else {
                        // new mapping
                        worklist.push_back(to);
                    }
                } else {
                    return false;
                }
            }
        }
        true
    }
}

impl Eq for Dfa {
}

impl fmt::Display for Dfa {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&self.automaton, f)
    }
}
