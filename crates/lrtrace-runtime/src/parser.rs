//! The table-driven shift-reduce parser.

use crate::definition::{ParseAction, ParseTable};

/// The parser driven based on the provided parse table.
///
/// The parser owns nothing but its private state stack, so any number of
/// instances may share one table (for example through `&T` or `Arc<T>`).
#[derive(Debug)]
pub struct Parser<TDef>
where
    TDef: ParseTable,
{
    definition: TDef,
    state_stack: Vec<TDef::State>,
    parser_state: ParserState,
}

#[derive(Debug, Copy, Clone)]
enum ParserState {
    Running,
    Accepted,
    Rejected,
}

impl<TDef> Parser<TDef>
where
    TDef: ParseTable,
{
    /// Create an instance of `Parser` using the specified parse table.
    pub fn new(definition: TDef) -> Self {
        let initial_state = definition.initial_state();
        Self {
            definition,
            state_stack: vec![initial_state],
            parser_state: ParserState::Running,
        }
    }

    /// Return the current contents of the state stack, bottom first.
    pub fn states(&self) -> &[TDef::State] {
        &self.state_stack
    }

    /// Drive the automaton by exactly one step on the given lookahead.
    ///
    /// `None` stands for the end of input. A `Shift` event means the caller
    /// must advance its input cursor; a `Reduce` event already includes the
    /// GOTO push for the reduced nonterminal. `Accept` and `Reject` are
    /// terminal events; stepping again afterwards is a caller bug.
    pub fn next_event(
        &mut self,
        lookahead: Option<TDef::Symbol>,
    ) -> Result<ParseEvent<TDef>, ParseError> {
        match self.parser_state {
            ParserState::Accepted => return Err(ParseError::AlreadyAccepted),
            ParserState::Rejected => return Err(ParseError::AlreadyRejected),
            ParserState::Running => (),
        }

        let current = *self
            .state_stack
            .last()
            .ok_or(ParseError::EmptyStateStack)?;

        match self.definition.action(current, lookahead) {
            ParseAction::Shift(next) => {
                self.state_stack.push(next);
                Ok(ParseEvent::Shift(next))
            }

            ParseAction::Reduce(reduce, lhs, n) => {
                if self.state_stack.len() <= n {
                    return Err(ParseError::EmptyStateStack);
                }
                self.state_stack.truncate(self.state_stack.len() - n);

                // A correctly built table always has a GOTO entry here; its
                // absence rejects the parse instead of panicking.
                let top = *self
                    .state_stack
                    .last()
                    .ok_or(ParseError::EmptyStateStack)?;
                match self.definition.action(top, Some(lhs)) {
                    ParseAction::Shift(next) => {
                        self.state_stack.push(next);
                        Ok(ParseEvent::Reduce(reduce))
                    }
                    _ => {
                        self.parser_state = ParserState::Rejected;
                        Ok(ParseEvent::Reject(RejectReason::MissingGoto))
                    }
                }
            }

            ParseAction::Accept => {
                self.parser_state = ParserState::Accepted;
                Ok(ParseEvent::Accept)
            }

            ParseAction::Error(_) => {
                self.parser_state = ParserState::Rejected;
                Ok(ParseEvent::Reject(RejectReason::NoAction))
            }
        }
    }
}

#[derive(Debug)]
pub enum ParseEvent<TDef>
where
    TDef: ParseTable,
{
    Shift(TDef::State),
    Reduce(TDef::Reduce),
    Accept,
    Reject(RejectReason),
}

/// Why a parse was rejected.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// No ACTION entry for the current state and lookahead: an ordinary
    /// syntax error in the input.
    NoAction,

    /// A reduction found no GOTO entry for its left-hand symbol. This
    /// indicates a malformed table, not bad input.
    MissingGoto,
}

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("the parse has already been accepted")]
    AlreadyAccepted,

    #[error("the parse has already been rejected")]
    AlreadyRejected,

    #[error("empty state stack")]
    EmptyStateStack,
}
