//! Construction of epsilon-NFAs from regular expressions.
//!
//! The grammar, from tightest to loosest binding:
//!
//! ```text
//! Atom  : CHAR
//!       : '\' CHAR
//!       : '(' Alt ')'
//! Quant : Atom
//!       : Atom '?' | Atom '*' | Atom '+'
//! Cat   :
//!       : Quant Cat
//! Alt   : Cat
//!       : Cat '|' Alt
//! ```
//!
//! A leading `^` and a trailing `$` are stripped before parsing; anywhere else
//! they are ordinary characters.

use std::collections::BTreeMap;

use log::{debug, trace};

use crate::automaton::{Automaton, StateId, Symbol};
use crate::error::{Error, Result};

/// Strip a single leading `^` and a single unescaped trailing `$`.
pub fn strip_anchors(text: &[char]) -> &[char] {
    let text = match text.first() {
        Some(&'^') => &text[1..],
        _ => text,
    };
    match text.last() {
        Some(&'$') => {
            let escapes = text[..text.len() - 1].iter().rev().take_while(|&&c| c == '\\').count();
            if escapes % 2 == 0 {
                &text[..text.len() - 1]
            } else {
                text
            }
        }
        _ => text,
    }
}

/// Find the first `|` at or after `start` that sits at the nesting depth of
/// `start`. Escaped characters are skipped. Returns `None` if the text runs out
/// or the enclosing group closes first.
pub fn locate_union(text: &[char], start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut pos = start;
    while pos < text.len() {
        match text[pos] {
            '\\' => pos += 1,
            '(' => depth += 1,
            ')' => {
                if depth == 0 {
                    return None;
                }
                depth -= 1;
            }
            '|' if depth == 0 => return Some(pos),
            _ => {}
        }
        pos += 1;
    }
    None
}

/// Threads one automaton through the recursive descent.
struct Builder {
    automaton: Automaton,
    max_depth: usize,
    /// Characters stripped from the front, for error positions.
    offset: usize,
}

impl Builder {
    fn epsilon(&mut self, from: StateId, to: StateId) -> Result<()> {
        self.automaton.add_transition(from, to, Symbol::Epsilon)
    }

    /// Build the alternation starting at `pos` from state `current`. Stops at
    /// the end of `text` or on a `)` (which is left unconsumed). Returns the
    /// stop position and the state the alternation ends in.
    ///
    /// Only groups count towards the nesting limit: the branches of one
    /// alternation are built in a loop at the same depth.
    fn alternation(&mut self, text: &[char], pos: usize, current: StateId, depth: usize)
        -> Result<(usize, StateId)> {

        if depth > self.max_depth {
            return Err(Error::NestingTooDeep { limit: self.max_depth });
        }

        let mut union = locate_union(text, pos);
        if union.is_none() {
            return self.sequence(text, pos, current, depth);
        }
        let mut start = pos;
        let mut ends = Vec::new();
        loop {
            let branch = self.automaton.add_state();
            self.epsilon(current, branch)?;
            match union {
                Some(union_pos) => {
                    let (_, end) = self.sequence(&text[..union_pos], start, branch, depth)?;
                    ends.push(end);
                    start = union_pos + 1;
                    union = locate_union(text, start);
                }
                None => {
                    // the last branch runs up to the enclosing `)` or the end
                    let (stop, end) = self.sequence(text, start, branch, depth)?;
                    ends.push(end);
                    let join = self.automaton.add_state();
                    for end in ends {
                        self.epsilon(end, join)?;
                    }
                    return Ok((stop, join));
                }
            }
        }
    }

    /// Build the concatenation starting at `pos` from state `current`, stopping
    /// at the end of `text` or on a `)`.
    fn sequence(&mut self, text: &[char], mut pos: usize, mut current: StateId, depth: usize)
        -> Result<(usize, StateId)> {

        while pos < text.len() && text[pos] != ')' {
            // Each atom gets a private entry state, so that a looping quantifier
            // can never walk back into the preceding atom.
            let atom_start = self.automaton.add_state();
            self.epsilon(current, atom_start)?;

            let atom_end = match text[pos] {
                '(' => {
                    let (close, body_end) = self.alternation(text, pos + 1, atom_start, depth + 1)?;
                    if close >= text.len() {
                        return Err(Error::MissingClosingBracket { position: pos + self.offset });
                    }
                    pos = close;
                    let exit = self.automaton.add_state();
                    self.epsilon(body_end, exit)?;
                    exit
                }
                c => {
                    let c = if c == '\\' {
                        pos += 1;
                        *text.get(pos).ok_or(Error::TrailingEscape)?
                    } else {
                        c
                    };
                    let end = self.automaton.add_state();
                    self.automaton.add_transition(atom_start, end, Symbol::Char(c))?;
                    end
                }
            };

            current = match text.get(pos + 1) {
                Some(&'?') => {
                    pos += 1;
                    self.epsilon(atom_start, atom_end)?;
                    atom_end
                }
                Some(&'*') => {
                    pos += 1;
                    self.epsilon(atom_start, atom_end)?;
                    self.epsilon(atom_end, atom_start)?;
                    atom_end
                }
                Some(&'+') => {
                    pos += 1;
                    let (clone_start, clone_end) = self.duplicate(atom_start)?;
                    self.epsilon(atom_end, clone_start)?;
                    self.epsilon(clone_start, clone_end)?;
                    self.epsilon(clone_end, clone_start)?;
                    clone_end
                }
                _ => atom_end,
            };
            pos += 1;
        }
        Ok((pos, current))
    }

    /// Copy the fragment reachable from `start`. Returns the copy's start and
    /// its single terminal state, i.e. the one copied state without outgoing
    /// transitions.
    fn duplicate(&mut self, start: StateId) -> Result<(StateId, StateId)> {
        let mut images = BTreeMap::new();
        let mut terminals = Vec::new();
        let mut worklist = vec![start];

        let clone_start = self.automaton.add_state();
        images.insert(start, clone_start);

        while let Some(original) = worklist.pop() {
            let image = images[&original];
            let edges = self.automaton.edges(original)?.to_vec();
            if edges.is_empty() {
                terminals.push(image);
            }
            for (symbol, target) in edges {
                let target_image = match images.get(&target) {
                    Some(&ix) => ix,
                    None => {
                        let ix = self.automaton.add_state();
                        images.insert(target, ix);
                        worklist.push(target);
                        ix
                    }
                };
                self.automaton.add_transition(image, target_image, symbol)?;
            }
        }

        trace!("duplicated {} states for '+'", images.len());
        match terminals.as_slice() {
            &[end] => Ok((clone_start, end)),
            _ => Err(Error::InternalConsistency { terminals: terminals.len() }),
        }
    }
}

/// Build an epsilon-NFA for `regex`, refusing to nest groups deeper than
/// `max_depth`.
pub fn build_nfa(regex: &str, max_depth: usize) -> Result<Automaton> {
    let chars: Vec<char> = regex.chars().collect();
    let text = strip_anchors(&chars);

    let mut builder = Builder {
        automaton: Automaton::new(),
        max_depth: max_depth,
        offset: (chars.first() == Some(&'^')) as usize,
    };
    let initial = builder.automaton.add_state();
    builder.automaton.set_initial_state(initial)?;

    let (pos, terminal) = builder.alternation(text, 0, initial, 0)?;
    if pos < text.len() {
        return Err(Error::UnmatchedClosingBracket { position: pos + builder.offset });
    }
    builder.automaton.set_terminal_states(Some(terminal))?;

    debug!("built NFA for {:?}: {} states, {} transitions",
           regex, builder.automaton.num_states(), builder.automaton.num_transitions());
    Ok(builder.automaton)
}
