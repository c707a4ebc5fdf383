use std::collections::VecDeque;
use std::fmt;

use bit_set::BitSet;
use vec_map::VecMap;

use crate::error::{Error, Result};

/// Identifies a state within one `Automaton`.
pub type StateId = usize;

/// The largest id `Automaton::add_state_with_id` accepts. States are stored
/// densely by id, so an id costs memory for every id below it.
pub const MAX_STATE_ID: StateId = (1 << 24) - 1;

/// The label on a transition.
#[derive(PartialOrd, Ord, PartialEq, Eq, Hash, Debug, Clone, Copy)]
pub enum Symbol {
    /// A move that consumes no input. Being its own variant, it can never
    /// compare equal to a literal, escaped or not.
    Epsilon,
    /// A move that consumes exactly this character.
    Char(char),
}

impl Symbol {
    pub fn is_epsilon(&self) -> bool {
        *self == Symbol::Epsilon
    }
}

impl From<char> for Symbol {
    fn from(c: char) -> Symbol {
        Symbol::Char(c)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Symbol::Epsilon => write!(f, "ε"),
            Symbol::Char(c) => write!(f, "{:?}", c),
        }
    }
}

/// A directed edge `source --symbol--> target`.
#[derive(PartialOrd, Ord, PartialEq, Eq, Hash, Debug, Clone, Copy)]
pub struct Transition {
    pub source: StateId,
    pub target: StateId,
    pub symbol: Symbol,
}

#[derive(Debug, Clone, Default)]
struct StateData {
    label: Option<String>,
    /// Outgoing edges as `(symbol, target)`, in insertion order. Duplicates
    /// are allowed: transitions form a multiset.
    out: Vec<(Symbol, StateId)>,
}

/// A finite automaton, possibly nondeterministic and possibly containing
/// epsilon transitions.
///
/// States live in an arena keyed by small integers. Ids handed out by
/// `add_state` come from a counter that only ever grows, so removing a state
/// never causes its id to be reused.
#[derive(Debug, Clone, Default)]
pub struct Automaton {
    states: VecMap<StateData>,
    next_id: StateId,
    initial: Option<StateId>,
    terminals: BitSet,
}

impl Automaton {
    pub fn new() -> Automaton {
        Automaton::default()
    }

    /// Assemble an automaton whose states are `0..rows.len()`; row `i` holds
    /// state `i`'s terminal flag and outgoing edges. Every edge target must be
    /// a row index.
    pub(crate) fn from_rows(rows: Vec<(bool, Vec<(Symbol, StateId)>)>, initial: StateId) -> Automaton {
        debug_assert!(initial < rows.len());
        debug_assert!(rows.iter().all(|&(_, ref out)| out.iter().all(|&(_, to)| to < rows.len())));

        let mut automaton = Automaton {
            next_id: rows.len(),
            initial: Some(initial),
            ..Automaton::default()
        };
        for (id, (terminal, out)) in rows.into_iter().enumerate() {
            if terminal {
                automaton.terminals.insert(id);
            }
            automaton.states.insert(id, StateData { label: None, out: out });
        }
        automaton
    }

    /// Create a state with the next free id.
    pub fn add_state(&mut self) -> StateId {
        let id = self.next_id;
        self.next_id += 1;
        self.states.insert(id, StateData::default());
        id
    }

    /// Create a state with a caller-chosen id, which must not exceed
    /// `MAX_STATE_ID`.
    pub fn add_state_with_id(&mut self, id: StateId) -> Result<StateId> {
        if id > MAX_STATE_ID {
            return Err(Error::StateIdOutOfRange { id: id, max: MAX_STATE_ID });
        }
        if self.states.contains_key(id) {
            return Err(Error::DuplicateState(id));
        }
        self.states.insert(id, StateData::default());
        if id >= self.next_id {
            self.next_id = id + 1;
        }
        Ok(id)
    }

    pub fn add_labeled_state<S: Into<String>>(&mut self, label: S) -> StateId {
        let id = self.add_state();
        self.states[id].label = Some(label.into());
        id
    }

    pub fn label(&self, id: StateId) -> Result<Option<&str>> {
        Ok(self.data(id)?.label.as_deref())
    }

    pub fn set_label<S: Into<String>>(&mut self, id: StateId, label: S) -> Result<()> {
        self.data_mut(id)?.label = Some(label.into());
        Ok(())
    }

    fn data(&self, id: StateId) -> Result<&StateData> {
        self.states.get(id).ok_or(Error::UnknownState(id))
    }

    fn data_mut(&mut self, id: StateId) -> Result<&mut StateData> {
        self.states.get_mut(id).ok_or(Error::UnknownState(id))
    }

    fn check(&self, id: StateId) -> Result<()> {
        self.data(id).map(|_| ())
    }

    pub fn contains_state(&self, id: StateId) -> bool {
        self.states.contains_key(id)
    }

    pub fn num_states(&self) -> usize {
        self.states.len()
    }

    pub fn num_transitions(&self) -> usize {
        self.states.values().map(|data| data.out.len()).sum()
    }

    /// All state ids, in increasing order.
    pub fn states(&self) -> impl Iterator<Item = StateId> + '_ {
        self.states.keys()
    }

    pub fn set_initial_state(&mut self, id: StateId) -> Result<()> {
        self.check(id)?;
        self.initial = Some(id);
        Ok(())
    }

    pub fn initial_state(&self) -> Result<StateId> {
        self.initial.ok_or(Error::UninitializedInitialState)
    }

    pub fn add_terminal_state(&mut self, id: StateId) -> Result<()> {
        self.check(id)?;
        self.terminals.insert(id);
        Ok(())
    }

    pub fn add_terminal_states<I>(&mut self, ids: I) -> Result<()>
        where I: IntoIterator<Item = StateId> {

        for id in ids {
            self.add_terminal_state(id)?;
        }
        Ok(())
    }

    /// Replace the terminal set. Nothing changes if any id is unknown.
    pub fn set_terminal_states<I>(&mut self, ids: I) -> Result<()>
        where I: IntoIterator<Item = StateId> {

        let mut terminals = BitSet::new();
        for id in ids {
            self.check(id)?;
            terminals.insert(id);
        }
        self.terminals = terminals;
        Ok(())
    }

    pub fn is_terminal(&self, id: StateId) -> Result<bool> {
        self.check(id)?;
        Ok(self.terminals.contains(id))
    }

    pub fn terminal_states(&self) -> impl Iterator<Item = StateId> + '_ {
        self.terminals.iter()
    }

    pub fn add_transition(&mut self, source: StateId, target: StateId, symbol: Symbol) -> Result<()> {
        self.check(target)?;
        self.data_mut(source)?.out.push((symbol, target));
        Ok(())
    }

    /// The outgoing edges of one state as `(symbol, target)` pairs.
    pub(crate) fn edges(&self, id: StateId) -> Result<&[(Symbol, StateId)]> {
        Ok(&self.data(id)?.out)
    }

    /// All transitions leaving any of `sources`.
    pub fn transitions_from<I>(&self, sources: I) -> Result<Vec<Transition>>
        where I: IntoIterator<Item = StateId> {

        let mut result = Vec::new();
        for source in sources {
            for &(symbol, target) in self.edges(source)? {
                result.push(Transition { source, target, symbol });
            }
        }
        Ok(result)
    }

    pub fn transitions(&self) -> impl Iterator<Item = Transition> + '_ {
        self.states.iter().flat_map(|(source, data)| {
            data.out.iter().map(move |&(symbol, target)| Transition { source, target, symbol })
        })
    }

    pub fn has_epsilon_transitions(&self) -> bool {
        self.states.values().any(|data| data.out.iter().any(|&(symbol, _)| symbol.is_epsilon()))
    }

    /// Remove a state and every transition into or out of it.
    pub fn remove_state(&mut self, id: StateId) -> Result<()> {
        self.states.remove(id).ok_or(Error::UnknownState(id))?;
        for data in self.states.values_mut() {
            data.out.retain(|&(_, target)| target != id);
        }
        self.terminals.remove(id);
        if self.initial == Some(id) {
            self.initial = None;
        }
        Ok(())
    }

    /// Remove one occurrence of the given transition.
    pub fn remove_transition(&mut self, source: StateId, target: StateId, symbol: Symbol) -> Result<()> {
        self.check(target)?;
        let out = &mut self.data_mut(source)?.out;
        match out.iter().position(|&edge| edge == (symbol, target)) {
            Some(ix) => {
                out.remove(ix);
                Ok(())
            }
            None => Err(Error::UnknownTransition { from: source, to: target, symbol: symbol }),
        }
    }

    /// The states reachable from the initial state, following every kind of
    /// transition.
    pub fn reachable_states(&self) -> Result<BitSet> {
        let initial = self.initial_state()?;
        let mut seen = BitSet::with_capacity(self.next_id);
        let mut worklist = VecDeque::new();

        seen.insert(initial);
        worklist.push_back(initial);

        while let Some(state) = worklist.pop_front() {
            for &(_, next) in &self.states[state].out {
                if seen.insert(next) {
                    worklist.push_back(next);
                }
            }
        }
        Ok(seen)
    }

    pub fn unreachable_states(&self) -> Result<Vec<StateId>> {
        let reachable = self.reachable_states()?;
        Ok(self.states().filter(|&id| !reachable.contains(id)).collect())
    }

    /// Delete all unreachable states, returning how many were removed.
    pub fn remove_unreachable_states(&mut self) -> Result<usize> {
        let unreachable = self.unreachable_states()?;
        for &id in &unreachable {
            self.remove_state(id)?;
        }
        Ok(unreachable.len())
    }
}

impl fmt::Display for Automaton {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Automaton({} states, {} transitions)", self.num_states(), self.num_transitions())?;
        for (id, data) in self.states.iter() {
            let initial = if self.initial == Some(id) { "S" } else { " " };
            let terminal = if self.terminals.contains(id) { "*" } else { " " };
            write!(f, "\n[{}{}{}]", initial, terminal, id)?;
            if let Some(ref label) = data.label {
                write!(f, " ({})", label)?;
            }
            for &(symbol, target) in &data.out {
                write!(f, " {}→{}", symbol, target)?;
            }
        }
        Ok(())
    }
}
