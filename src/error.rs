use thiserror::Error;

use crate::automaton::{StateId, Symbol};

/// Errors produced while building, transforming or querying automata.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A `(` in the regex was never closed.
    #[error("missing closing bracket for '(' at position {position}")]
    MissingClosingBracket { position: usize },

    /// A `)` in the regex has no matching `(`.
    #[error("unmatched ')' at position {position}")]
    UnmatchedClosingBracket { position: usize },

    /// The regex ends with an unfollowed `\`.
    #[error("unfollowed '\\' at end of regex")]
    TrailingEscape,

    /// Groups and alternations are nested deeper than the configured limit.
    #[error("regex nesting exceeds the limit of {limit}")]
    NestingTooDeep { limit: usize },

    /// Duplicating a quantified fragment for `+` did not yield exactly one
    /// terminal state. This indicates a bug in the builder.
    #[error("duplicated fragment has {terminals} terminal states, expected exactly one")]
    InternalConsistency { terminals: usize },

    /// An algorithm needing a deterministic (or epsilon-free) automaton was
    /// handed something else.
    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    #[error("unknown state {0}")]
    UnknownState(StateId),

    #[error("state {0} already exists")]
    DuplicateState(StateId),

    /// A caller-chosen state id is larger than `automaton::MAX_STATE_ID`.
    #[error("state id {id} exceeds the maximum of {max}")]
    StateIdOutOfRange { id: StateId, max: StateId },

    #[error("no transition {from} -> {to} on {symbol}")]
    UnknownTransition {
        from: StateId,
        to: StateId,
        symbol: Symbol,
    },

    #[error("the automaton has no initial state")]
    UninitializedInitialState,

    /// Subset construction produced more states than the configured budget.
    #[error("DFA state limit of {limit} exceeded")]
    StateLimitExceeded { limit: usize },
}

/// Result type used throughout the crate.
pub type Result<T> = ::std::result::Result<T, Error>;
