//! The regex → NFA-ε → NFA → DFA → minimal DFA pipeline, one function per stage.

use std::convert::TryFrom;
use std::str;

use log::debug;

use crate::automaton::Automaton;
use crate::dfa::Dfa;
use crate::epsilon;
use crate::error::{Error, Result};
use crate::regex;

/// Limits applied while compiling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Maximum nesting of groups and alternations in a regex.
    pub max_nesting_depth: usize,
    /// Maximum number of states subset construction may create, if any.
    pub max_dfa_states: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            max_nesting_depth: 500,
            max_dfa_states: None,
        }
    }
}

/// Runs the stages with a given `Config`.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    config: Config,
}

impl Pipeline {
    pub fn new(config: Config) -> Pipeline {
        Pipeline { config: config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn build_nfa(&self, regex: &str) -> Result<Automaton> {
        regex::build_nfa(regex, self.config.max_nesting_depth)
    }

    pub fn eliminate_epsilons(&self, nfa: &Automaton) -> Result<Automaton> {
        epsilon::eliminate_epsilons(nfa)
    }

    pub fn determinize(&self, nfa: &Automaton) -> Result<Dfa> {
        Dfa::determinize(nfa, self.config.max_dfa_states)
    }

    pub fn minimize(&self, dfa: &Dfa) -> Dfa {
        dfa.minimize()
    }

    /// Validate `automaton` as a DFA, then minimize it.
    pub fn minimize_automaton(&self, automaton: Automaton) -> Result<Dfa> {
        Ok(Dfa::try_from(automaton)?.minimize())
    }

    pub fn determinize_and_minimize(&self, nfa: &Automaton) -> Result<Dfa> {
        Ok(self.determinize(nfa)?.minimize())
    }

    /// Eliminate epsilons, determinize and minimize.
    pub fn nfa_to_min_dfa(&self, nfa: &Automaton) -> Result<Dfa> {
        let nfa = self.eliminate_epsilons(nfa)?;
        self.determinize_and_minimize(&nfa)
    }

    pub fn regex_to_min_dfa(&self, regex: &str) -> Result<Dfa> {
        let nfa = self.build_nfa(regex)?;
        let dfa = self.nfa_to_min_dfa(&nfa)?;
        debug!("compiled {:?} to a {}-state minimal DFA", regex, dfa.num_states());
        Ok(dfa)
    }
}

/// Build an epsilon-NFA from `regex` with the default configuration.
pub fn build_nfa(regex: &str) -> Result<Automaton> {
    Pipeline::default().build_nfa(regex)
}

/// Remove the epsilon transitions (and unreachable states) of `nfa`.
pub fn eliminate_epsilons(nfa: &Automaton) -> Result<Automaton> {
    Pipeline::default().eliminate_epsilons(nfa)
}

/// Subset construction on an epsilon-free automaton.
pub fn determinize(nfa: &Automaton) -> Result<Dfa> {
    Pipeline::default().determinize(nfa)
}

pub fn minimize(dfa: &Dfa) -> Dfa {
    dfa.minimize()
}

/// Minimize a plain automaton, failing with `Error::TypeMismatch` unless it is
/// deterministic.
pub fn minimize_automaton(automaton: Automaton) -> Result<Dfa> {
    Pipeline::default().minimize_automaton(automaton)
}

pub fn determinize_and_minimize(nfa: &Automaton) -> Result<Dfa> {
    Pipeline::default().determinize_and_minimize(nfa)
}

pub fn nfa_to_min_dfa(nfa: &Automaton) -> Result<Dfa> {
    Pipeline::default().nfa_to_min_dfa(nfa)
}

/// Compile `regex` all the way to a minimal DFA.
pub fn regex_to_min_dfa(regex: &str) -> Result<Dfa> {
    Pipeline::default().regex_to_min_dfa(regex)
}

impl str::FromStr for Dfa {
    type Err = Error;
    /// Compile a regular expression into a minimal DFA.
    fn from_str(s: &str) -> Result<Dfa> {
        regex_to_min_dfa(s)
    }
}
