//! Runs a token sequence through a built parse table, recording a trace.

use crate::{
    grammar::{RuleID, SymbolID, TerminalID},
    lr1::StateID,
    table::ParseTable,
};
use lrtrace_runtime::parser::{ParseError, ParseEvent, Parser, RejectReason};

/// One observable step of the parse: the state stack and the remaining input
/// as they were before the action was taken, plus the action itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceStep {
    pub stack: Vec<StateID>,
    pub remaining: Vec<TerminalID>,
    pub action: TraceAction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceAction {
    Shift(StateID),
    Reduce(RuleID),
    Accept,
    Error(RejectReason),
}

/// The full observable output of one parse.
#[derive(Debug)]
pub struct ParseTrace {
    pub steps: Vec<TraceStep>,
    pub accepted: bool,
}

/// Drive `input` through the table until accept or error. The end marker is
/// appended automatically; the driver looks at one token at a time and never
/// backtracks.
pub fn run(table: &ParseTable, input: &[TerminalID]) -> Result<ParseTrace, ParseError> {
    let mut tokens = input.to_vec();
    if tokens.last() != Some(&TerminalID::EOI) {
        tokens.push(TerminalID::EOI);
    }

    let mut parser = Parser::new(table);
    let mut steps = Vec::new();
    let mut cursor = 0;

    loop {
        let stack = parser.states().to_vec();
        let remaining = tokens[cursor..].to_vec();

        let token = tokens[cursor];
        let lookahead = (token != TerminalID::EOI).then_some(SymbolID::T(token));

        match parser.next_event(lookahead)? {
            ParseEvent::Shift(next) => {
                cursor += 1;
                steps.push(TraceStep {
                    stack,
                    remaining,
                    action: TraceAction::Shift(next),
                });
            }
            ParseEvent::Reduce(rule) => {
                steps.push(TraceStep {
                    stack,
                    remaining,
                    action: TraceAction::Reduce(rule),
                });
            }
            ParseEvent::Accept => {
                steps.push(TraceStep {
                    stack,
                    remaining,
                    action: TraceAction::Accept,
                });
                return Ok(ParseTrace {
                    steps,
                    accepted: true,
                });
            }
            ParseEvent::Reject(reason) => {
                steps.push(TraceStep {
                    stack,
                    remaining,
                    action: TraceAction::Error(reason),
                });
                return Ok(ParseTrace {
                    steps,
                    accepted: false,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        grammar::{Grammar, SymbolID::*},
        lr1::Automaton,
    };

    fn sample_setup() -> (Grammar, ParseTable, TerminalID, TerminalID) {
        let mut ids = None;
        let grammar = Grammar::define(|g| {
            let c = g.terminal("c")?;
            let d = g.terminal("d")?;
            let s = g.nonterminal("S")?;
            let cc = g.nonterminal("C")?;
            g.start_symbol(s)?;
            g.rule(s, [N(cc), N(cc)])?;
            g.rule(cc, [T(c), N(cc)])?;
            g.rule(cc, [T(d)])?;
            ids = Some((c, d));
            Ok(())
        })
        .unwrap();
        let (c, d) = ids.unwrap();
        let automaton = Automaton::generate(&grammar);
        let table = ParseTable::build(&grammar, &automaton);
        (grammar, table, c, d)
    }

    #[test]
    fn ccdd_trace_shape() {
        let (_grammar, table, c, d) = sample_setup();
        let trace = run(&table, &[c, c, d, d]).unwrap();
        assert!(trace.accepted);

        let kinds: Vec<_> = trace
            .steps
            .iter()
            .map(|step| match step.action {
                TraceAction::Shift(_) => "shift",
                TraceAction::Reduce(rule) => {
                    // rule indices: 1 = S -> C C, 2 = C -> c C, 3 = C -> d
                    match rule.index() {
                        1 => "reduce S -> C C",
                        2 => "reduce C -> c C",
                        3 => "reduce C -> d",
                        _ => "reduce ?",
                    }
                }
                TraceAction::Accept => "accept",
                TraceAction::Error(_) => "error",
            })
            .collect();

        assert_eq!(
            kinds,
            [
                "shift",
                "shift",
                "shift",
                "reduce C -> d",
                "reduce C -> c C",
                "reduce C -> c C",
                "shift",
                "reduce C -> d",
                "reduce S -> C C",
                "accept",
            ],
        );
    }

    #[test]
    fn stack_snapshots_include_goto_pushes() {
        let (_grammar, table, c, d) = sample_setup();
        let trace = run(&table, &[c, d, d]).unwrap();
        assert!(trace.accepted);

        // each step records the stack before its action; stack depth after a
        // reduce reflects both the pops and the goto push
        for pair in trace.steps.windows(2) {
            let depth_before = pair[0].stack.len();
            let depth_after = pair[1].stack.len();
            match pair[0].action {
                TraceAction::Shift(_) => assert_eq!(depth_after, depth_before + 1),
                TraceAction::Reduce(rule) => {
                    let pops = match rule.index() {
                        1 | 2 => 2,
                        3 => 1,
                        _ => unreachable!(),
                    };
                    assert_eq!(depth_after, depth_before - pops + 1);
                }
                _ => {}
            }
        }
    }

    #[test]
    fn underivable_input_is_rejected() {
        let (_grammar, table, c, _d) = sample_setup();
        let trace = run(&table, &[c, c]).unwrap();
        assert!(!trace.accepted);
        assert!(matches!(
            trace.steps.last().map(|s| s.action),
            Some(TraceAction::Error(RejectReason::NoAction))
        ));
    }

    #[test]
    fn explicit_end_marker_is_not_duplicated() {
        let (_grammar, table, _c, d) = sample_setup();
        let trace = run(&table, &[d, d, TerminalID::EOI]).unwrap();
        assert!(trace.accepted);
        assert_eq!(trace.steps[0].remaining.len(), 3);
    }
}
