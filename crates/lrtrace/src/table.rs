//! ACTION/GOTO table assembly with conflict detection.

use crate::{
    grammar::{Grammar, NonterminalID, RuleID, SymbolID, TerminalID},
    lr1::{Automaton, StateID},
    types::Map,
};
use lrtrace_runtime::definition::{ParseAction, ParseActionError, ParseTable as ParseTableDef};

/// A single ACTION cell.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Action {
    Shift(StateID),
    Reduce(RuleID),
    Accept,
}

/// A detected table conflict. Conflicts never abort construction; the table
/// keeps the documented tie-break so a parse can still be attempted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    pub state: StateID,
    pub symbol: TerminalID,
    pub kind: ConflictKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictKind {
    /// Resolved in favor of the shift.
    ShiftReduce { shift: StateID, reduce: RuleID },

    /// Resolved in favor of the production with the lowest index.
    ReduceReduce { chosen: RuleID, discarded: RuleID },
}

/// The ACTION/GOTO tables derived from an automaton.
///
/// Both mappings are partial; a missing entry is a syntax error at that
/// (state, symbol) pair. The table is immutable once built and may be shared
/// by any number of parser instances.
#[derive(Debug)]
pub struct ParseTable {
    actions: Map<StateID, Map<TerminalID, Action>>,
    gotos: Map<StateID, Map<NonterminalID, StateID>>,
    // RuleID -> (left-hand symbol, |rhs|), precomputed for the runtime.
    rule_info: Map<RuleID, (NonterminalID, usize)>,
    conflicts: Vec<Conflict>,
}

impl ParseTable {
    pub fn build(grammar: &Grammar, automaton: &Automaton) -> Self {
        let mut actions: Map<StateID, Map<TerminalID, Action>> = Map::default();
        let mut gotos: Map<StateID, Map<NonterminalID, StateID>> = Map::default();
        let mut conflicts = Vec::new();

        for state in automaton.states() {
            #[derive(Default)]
            struct PendingAction {
                shift: Option<StateID>,
                reduces: Vec<RuleID>,
            }
            let mut pending: Map<TerminalID, PendingAction> = Map::default();
            let state_gotos = gotos.entry(state.id()).or_default();

            for (symbol, target) in automaton.transitions_from(state.id()) {
                match symbol {
                    SymbolID::T(t) => {
                        pending.entry(t).or_default().shift.replace(target);
                    }
                    SymbolID::N(n) => {
                        state_gotos.insert(n, target);
                    }
                }
            }

            for (core, lookaheads) in state.items() {
                let rule = &grammar.rules[&core.rule];
                if core.marker < rule.right().len() {
                    continue;
                }
                for lookahead in lookaheads {
                    pending.entry(*lookahead).or_default().reduces.push(core.rule);
                }
            }

            let state_actions = actions.entry(state.id()).or_default();
            for (symbol, mut action) in pending {
                action.reduces.sort_unstable();

                let resolved = match (action.shift, &action.reduces[..]) {
                    (Some(next), []) => Action::Shift(next),

                    (None, [reduce, rest @ ..]) => {
                        for discarded in rest {
                            conflicts.push(Conflict {
                                state: state.id(),
                                symbol,
                                kind: ConflictKind::ReduceReduce {
                                    chosen: *reduce,
                                    discarded: *discarded,
                                },
                            });
                        }
                        if *reduce == RuleID::ACCEPT && symbol == TerminalID::EOI {
                            Action::Accept
                        } else {
                            Action::Reduce(*reduce)
                        }
                    }

                    (Some(next), reduces) => {
                        for reduce in reduces {
                            conflicts.push(Conflict {
                                state: state.id(),
                                symbol,
                                kind: ConflictKind::ShiftReduce {
                                    shift: next,
                                    reduce: *reduce,
                                },
                            });
                        }
                        Action::Shift(next)
                    }

                    // no pending entry is created without a shift or a reduce
                    (None, []) => continue,
                };

                state_actions.insert(symbol, resolved);
            }
        }

        let mut rule_info = Map::default();
        for rule in grammar.rules.values() {
            rule_info.insert(rule.id(), (rule.left(), rule.right().len()));
        }

        Self {
            actions,
            gotos,
            rule_info,
            conflicts,
        }
    }

    pub fn action(&self, state: StateID, symbol: TerminalID) -> Option<Action> {
        self.actions.get(&state)?.get(&symbol).copied()
    }

    pub fn goto(&self, state: StateID, symbol: NonterminalID) -> Option<StateID> {
        self.gotos.get(&state)?.get(&symbol).copied()
    }

    pub fn states(&self) -> impl Iterator<Item = StateID> + '_ {
        self.actions.keys().copied()
    }

    pub fn conflicts(&self) -> &[Conflict] {
        &self.conflicts
    }

    pub fn has_conflicts(&self) -> bool {
        !self.conflicts.is_empty()
    }
}

impl ParseTableDef for ParseTable {
    type State = StateID;
    type Symbol = SymbolID;
    type Reduce = RuleID;

    fn initial_state(&self) -> Self::State {
        StateID::START
    }

    fn action(
        &self,
        current: Self::State,
        lookahead: Option<Self::Symbol>,
    ) -> ParseAction<Self::State, Self::Symbol, Self::Reduce> {
        let symbol = lookahead.unwrap_or(SymbolID::T(TerminalID::EOI));
        match symbol {
            SymbolID::T(t) => {
                let Some(state_actions) = self.actions.get(&current) else {
                    return ParseAction::Error(ParseActionError::IncorrectState);
                };
                match state_actions.get(&t) {
                    Some(Action::Shift(next)) => ParseAction::Shift(*next),
                    Some(Action::Reduce(rule)) => {
                        let (left, len) = self.rule_info[rule];
                        ParseAction::Reduce(*rule, SymbolID::N(left), len)
                    }
                    Some(Action::Accept) => ParseAction::Accept,
                    None => ParseAction::Error(ParseActionError::NoAction),
                }
            }
            SymbolID::N(n) => {
                let Some(state_gotos) = self.gotos.get(&current) else {
                    return ParseAction::Error(ParseActionError::IncorrectState);
                };
                match state_gotos.get(&n) {
                    Some(next) => ParseAction::Shift(*next),
                    None => ParseAction::Error(ParseActionError::NoAction),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::SymbolID::*;

    // E -> E + T | T ; T -> T * F | F ; F -> ( E ) | id
    fn expr_grammar() -> Grammar {
        Grammar::define(|g| {
            let plus = g.terminal("+")?;
            let star = g.terminal("*")?;
            let lparen = g.terminal("(")?;
            let rparen = g.terminal(")")?;
            let id = g.terminal("id")?;

            let e = g.nonterminal("E")?;
            let t = g.nonterminal("T")?;
            let fa = g.nonterminal("F")?;
            g.start_symbol(e)?;

            g.rule(e, [N(e), T(plus), N(t)])?;
            g.rule(e, [N(t)])?;
            g.rule(t, [N(t), T(star), N(fa)])?;
            g.rule(t, [N(fa)])?;
            g.rule(fa, [T(lparen), N(e), T(rparen)])?;
            g.rule(fa, [T(id)])?;
            Ok(())
        })
        .unwrap()
    }

    // stmt -> if stmt | if stmt else stmt | other  (dangling else)
    fn dangling_else_grammar() -> Grammar {
        Grammar::define(|g| {
            let tif = g.terminal("if")?;
            let telse = g.terminal("else")?;
            let other = g.terminal("other")?;

            let stmt = g.nonterminal("stmt")?;
            g.start_symbol(stmt)?;

            g.rule(stmt, [T(tif), N(stmt)])?;
            g.rule(stmt, [T(tif), N(stmt), T(telse), N(stmt)])?;
            g.rule(stmt, [T(other)])?;
            Ok(())
        })
        .unwrap()
    }

    #[test]
    fn expression_grammar_is_conflict_free() {
        let grammar = expr_grammar();
        let automaton = Automaton::generate(&grammar);
        let table = ParseTable::build(&grammar, &automaton);
        assert!(!table.has_conflicts(), "{:?}", table.conflicts());
    }

    #[test]
    fn dangling_else_reports_shift_reduce_conflict() {
        let grammar = dangling_else_grammar();
        let automaton = Automaton::generate(&grammar);
        let table = ParseTable::build(&grammar, &automaton);

        assert!(table
            .conflicts()
            .iter()
            .any(|c| matches!(c.kind, ConflictKind::ShiftReduce { .. })));

        // the documented tie-break keeps the shift, so the table is complete
        for conflict in table.conflicts() {
            if let ConflictKind::ShiftReduce { shift, .. } = conflict.kind {
                assert_eq!(
                    table.action(conflict.state, conflict.symbol),
                    Some(Action::Shift(shift))
                );
            }
        }
    }

    #[test]
    fn accept_entry_sits_on_eoi() {
        let grammar = expr_grammar();
        let automaton = Automaton::generate(&grammar);
        let table = ParseTable::build(&grammar, &automaton);

        let accepting: Vec<_> = table
            .states()
            .filter(|s| table.action(*s, TerminalID::EOI) == Some(Action::Accept))
            .collect();
        assert_eq!(accepting.len(), 1);
    }
}
