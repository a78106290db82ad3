//! Rendering of the structured report: states, tables, conflicts, trace.

use crate::{
    driver::{ParseTrace, TraceAction},
    grammar::{Grammar, NonterminalID, TerminalID},
    lalr::Mode,
    lr1::Automaton,
    table::{Action, Conflict, ConflictKind, ParseTable},
};
use lrtrace_runtime::parser::RejectReason;
use std::fmt;

const CELL_WIDTH: usize = 8;

/// The complete report for one generator/parse run.
pub struct Report<'a> {
    grammar: &'a Grammar,
    automaton: &'a Automaton,
    table: &'a ParseTable,
    trace: &'a ParseTrace,
    mode: Mode,
}

impl<'a> Report<'a> {
    pub fn new(
        grammar: &'a Grammar,
        automaton: &'a Automaton,
        table: &'a ParseTable,
        trace: &'a ParseTrace,
        mode: Mode,
    ) -> Self {
        Self {
            grammar,
            automaton,
            table,
            trace,
            mode,
        }
    }

    // terminal columns in declaration order, end marker last
    fn terminal_columns(&self) -> Vec<TerminalID> {
        let mut columns: Vec<_> = self
            .grammar
            .terminals
            .keys()
            .copied()
            .filter(|t| *t != TerminalID::EOI)
            .collect();
        columns.push(TerminalID::EOI);
        columns
    }

    // nonterminal columns, augmented start symbol excluded
    fn nonterminal_columns(&self) -> Vec<NonterminalID> {
        self.grammar
            .nonterminals
            .keys()
            .copied()
            .filter(|n| *n != NonterminalID::START)
            .collect()
    }

    fn write_states(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.mode {
            Mode::Canonical => writeln!(f, "=== LR(1) (CLR) states ===")?,
            Mode::Lalr => writeln!(f, "=== LALR(1) merged states ===")?,
        }
        writeln!(f, "{}", self.automaton.display(self.grammar))
    }

    fn write_action_table(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let columns = self.terminal_columns();

        writeln!(f, "=== ACTION table ===")?;
        write!(f, "{:<8} | ", "State")?;
        for t in &columns {
            write!(f, "{:<CELL_WIDTH$}", format!("{}", self.grammar.terminals[t]))?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{}-+-{}",
            "-".repeat(8),
            "-".repeat(CELL_WIDTH * columns.len())
        )?;

        for state in self.automaton.states() {
            write!(f, "{:<8} | ", format!("{}", state.id()))?;
            for t in &columns {
                let cell = match self.table.action(state.id(), *t) {
                    Some(Action::Shift(next)) => format!("s{}", next),
                    Some(Action::Reduce(rule)) => format!("r{}", rule),
                    Some(Action::Accept) => "acc".to_owned(),
                    None => String::new(),
                };
                write!(f, "{:<CELL_WIDTH$}", cell)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }

    fn write_goto_table(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let columns = self.nonterminal_columns();

        writeln!(f, "\n=== GOTO table ===")?;
        write!(f, "{:<8} | ", "State")?;
        for n in &columns {
            write!(
                f,
                "{:<CELL_WIDTH$}",
                format!("{}", self.grammar.nonterminals[n])
            )?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{}-+-{}",
            "-".repeat(8),
            "-".repeat(CELL_WIDTH * columns.len())
        )?;

        for state in self.automaton.states() {
            write!(f, "{:<8} | ", format!("{}", state.id()))?;
            for n in &columns {
                let cell = match self.table.goto(state.id(), *n) {
                    Some(target) => format!("{}", target),
                    None => String::new(),
                };
                write!(f, "{:<CELL_WIDTH$}", cell)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }

    fn write_conflicts(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "\n=== Conflicts ===")?;
        if self.table.conflicts().is_empty() {
            return writeln!(f, "(none)");
        }
        for conflict in self.table.conflicts() {
            writeln!(f, "{}", display_conflict(self.grammar, conflict))?;
        }
        Ok(())
    }

    fn write_trace(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "\n=== Parsing steps ===")?;

        let rows: Vec<[String; 3]> = self
            .trace
            .steps
            .iter()
            .map(|step| {
                let stack = step
                    .stack
                    .iter()
                    .map(|id| id.to_string())
                    .collect::<Vec<_>>()
                    .join(" ");
                let remaining = step
                    .remaining
                    .iter()
                    .map(|t| self.grammar.terminals[t].to_string())
                    .collect::<Vec<_>>()
                    .join(" ");
                let action = match step.action {
                    TraceAction::Shift(next) => format!("shift {}", next),
                    TraceAction::Reduce(rule) => {
                        format!(
                            "reduce by ({}) {}",
                            rule,
                            self.grammar.rules[&rule].display(self.grammar)
                        )
                    }
                    TraceAction::Accept => "accept".to_owned(),
                    TraceAction::Error(RejectReason::NoAction) => {
                        "ERROR: no action".to_owned()
                    }
                    TraceAction::Error(RejectReason::MissingGoto) => {
                        "ERROR: missing GOTO".to_owned()
                    }
                };
                [stack, remaining, action]
            })
            .collect();

        let mut widths = [5usize, 5, 6]; // "Stack", "Input", "Action"
        for row in &rows {
            for (w, cell) in widths.iter_mut().zip(row) {
                *w = (*w).max(cell.len());
            }
        }

        writeln!(
            f,
            "{:<sw$} | {:<iw$} | {:<aw$}",
            "Stack",
            "Input",
            "Action",
            sw = widths[0],
            iw = widths[1],
            aw = widths[2],
        )?;
        writeln!(
            f,
            "{}-+-{}-+-{}",
            "-".repeat(widths[0]),
            "-".repeat(widths[1]),
            "-".repeat(widths[2])
        )?;
        for row in &rows {
            writeln!(
                f,
                "{:<sw$} | {:<iw$} | {:<aw$}",
                row[0],
                row[1],
                row[2],
                sw = widths[0],
                iw = widths[1],
                aw = widths[2],
            )?;
        }
        Ok(())
    }
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_states(f)?;
        self.write_action_table(f)?;
        self.write_goto_table(f)?;
        self.write_conflicts(f)?;
        self.write_trace(f)?;
        writeln!(
            f,
            "\nResult: {}",
            if self.trace.accepted {
                "accepted"
            } else {
                "rejected"
            }
        )
    }
}

fn display_conflict(grammar: &Grammar, conflict: &Conflict) -> String {
    let symbol = &grammar.terminals[&conflict.symbol];
    match &conflict.kind {
        ConflictKind::ShiftReduce { shift, reduce } => format!(
            "state {}, symbol `{}': shift/reduce (kept shift {}, dropped reduce ({}) {})",
            conflict.state,
            symbol,
            shift,
            reduce,
            grammar.rules[reduce].display(grammar),
        ),
        ConflictKind::ReduceReduce { chosen, discarded } => format!(
            "state {}, symbol `{}': reduce/reduce (kept ({}) {}, dropped ({}) {})",
            conflict.state,
            symbol,
            chosen,
            grammar.rules[chosen].display(grammar),
            discarded,
            grammar.rules[discarded].display(grammar),
        ),
    }
}
