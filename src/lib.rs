extern crate bit_set;
extern crate log;
extern crate thiserror;
extern crate vec_map;

pub use automaton::{Automaton, StateId, Symbol, Transition, MAX_STATE_ID};
pub use dfa::Dfa;
pub use error::{Error, Result};
pub use pipeline::{
    build_nfa, determinize, determinize_and_minimize, eliminate_epsilons, minimize,
    minimize_automaton, nfa_to_min_dfa, regex_to_min_dfa, Config, Pipeline,
};

/// The state/transition graph shared by every stage.
pub mod automaton;
/// Deterministic Finite Automata (dfa) module: subset construction and
/// minimization.
pub mod dfa;
/// Epsilon closures and epsilon elimination.
pub mod epsilon;
pub mod error;
pub mod pipeline;
/// Parsing regular expressions into epsilon-NFAs.
pub mod regex;
