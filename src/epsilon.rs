//! Removal of epsilon transitions.

use std::collections::BTreeSet;

use bit_set::BitSet;
use log::debug;
use vec_map::VecMap;

use crate::automaton::{Automaton, StateId, Symbol};
use crate::error::Result;

/// What a state can do once its epsilon closure is taken into account.
#[derive(Debug, Clone, Default)]
pub struct Closure {
    /// The states reachable through zero or more epsilon moves.
    pub states: BitSet,
    /// Every non-epsilon edge leaving one of `states`, as `(symbol, target)`.
    pub edges: BTreeSet<(Symbol, StateId)>,
    /// Whether any state in `states` is terminal.
    pub terminal: bool,
}

/// Compute the epsilon closure of `state`.
///
/// The traversal is depth-first with an explicit stack; the visited set makes
/// epsilon cycles harmless.
pub fn epsilon_closure(automaton: &Automaton, state: StateId) -> Result<Closure> {
    let mut closure = Closure::default();
    let mut stack = vec![state];

    while let Some(s) = stack.pop() {
        if !closure.states.insert(s) {
            continue;
        }
        if automaton.is_terminal(s)? {
            closure.terminal = true;
        }
        for &(symbol, target) in automaton.edges(s)? {
            match symbol {
                Symbol::Epsilon => {
                    if !closure.states.contains(target) {
                        stack.push(target);
                    }
                }
                _ => {
                    closure.edges.insert((symbol, target));
                }
            }
        }
    }

    Ok(closure)
}

/// Build an equivalent automaton without epsilon transitions.
///
/// Every state of `nfa` gets exactly one image, whose outgoing edges and
/// terminal flag come from the original state's closure. Images that cannot be
/// reached from the new initial state are deleted afterwards.
pub fn eliminate_epsilons(nfa: &Automaton) -> Result<Automaton> {
    let initial = nfa.initial_state()?;
    let mut result = Automaton::new();

    let mut images = VecMap::with_capacity(nfa.num_states());
    for state in nfa.states() {
        let image = result.add_state();
        if let Some(label) = nfa.label(state)? {
            result.set_label(image, label)?;
        }
        images.insert(state, image);
    }
    result.set_initial_state(images[initial])?;

    for state in nfa.states() {
        let closure = epsilon_closure(nfa, state)?;
        let source = images[state];
        if closure.terminal {
            result.add_terminal_state(source)?;
        }
        for (symbol, target) in closure.edges {
            result.add_transition(source, images[target], symbol)?;
        }
    }

    let removed = result.remove_unreachable_states()?;
    debug!("eliminated epsilons: {} states in, {} out ({} unreachable), {} transitions",
           nfa.num_states(), result.num_states(), removed, result.num_transitions());
    Ok(result)
}
