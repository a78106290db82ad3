//! Construction of the canonical LR(1) automaton.

use crate::{
    first_sets::FirstSets,
    grammar::{Grammar, RuleID, SymbolID, TerminalID},
    types::Map,
    util::display_fn,
};
use std::{
    collections::{BTreeMap, BTreeSet, VecDeque},
    fmt,
};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct StateID {
    raw: u32,
}

impl StateID {
    pub const START: Self = Self::new(0);

    pub(crate) const fn new(raw: u32) -> Self {
        Self { raw }
    }

    pub fn index(&self) -> usize {
        self.raw as usize
    }
}

impl fmt::Display for StateID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.raw, f)
    }
}

/// LR(1) item stripped of its lookahead: a production rule and the marker
/// position inside it. Used as-is for LALR state merging.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemCore {
    pub rule: RuleID,
    pub marker: usize,
}

impl ItemCore {
    // `"(1) S -> C . C"`
    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(|f| {
            let rule = &g.rules[&self.rule];
            write!(f, "({}) {} ->", self.rule, g.nonterminals[&rule.left()])?;
            for (i, symbol) in rule.right().iter().enumerate() {
                if i == self.marker {
                    f.write_str(" .")?;
                }
                write!(f, " {}", g.symbol(*symbol))?;
            }
            if self.marker == rule.right().len() {
                f.write_str(" .")?;
            }
            Ok(())
        })
    }
}

/// A closed set of LR(1) items. Lookaheads are grouped per core; the BTree
/// encoding is order independent, so the value doubles as the canonical
/// fingerprint used for state deduplication.
pub type ItemSet = BTreeMap<ItemCore, BTreeSet<TerminalID>>;

/// The cores of an item set, lookaheads stripped.
pub type ItemCores = BTreeSet<ItemCore>;

#[derive(Debug)]
pub struct State {
    id: StateID,
    pub(crate) item_set: ItemSet,
}

impl State {
    pub(crate) fn new_empty(id: StateID) -> Self {
        Self {
            id,
            item_set: ItemSet::new(),
        }
    }

    pub fn id(&self) -> StateID {
        self.id
    }

    pub fn items(&self) -> impl Iterator<Item = (&ItemCore, &BTreeSet<TerminalID>)> + '_ {
        self.item_set.iter()
    }

    pub fn cores(&self) -> ItemCores {
        self.item_set.keys().copied().collect()
    }

    /// The lookahead set recorded for the given core, if the core is present.
    pub fn lookaheads(&self, core: &ItemCore) -> Option<&BTreeSet<TerminalID>> {
        self.item_set.get(core)
    }
}

/// The canonical collection of LR(1) states plus the transition function.
///
/// States are append-only and insertion ordered; state 0 is always the
/// closure of `{($start -> . S, $)}`.
#[derive(Debug)]
pub struct Automaton {
    pub(crate) states: Vec<State>,
    pub(crate) transitions: Map<(StateID, SymbolID), StateID>,
}

impl Automaton {
    pub fn generate(grammar: &Grammar) -> Self {
        let builder = AutomatonBuilder {
            grammar,
            first_sets: FirstSets::new(grammar),
        };

        let mut initial: ItemSet = BTreeMap::new();
        initial.insert(
            ItemCore {
                rule: RuleID::ACCEPT,
                marker: 0,
            },
            Some(TerminalID::EOI).into_iter().collect(),
        );
        builder.closure(&mut initial);

        let mut states = Vec::new();
        let mut transitions = Map::default();
        // Canonical item set -> state index, for O(1) amortized dedup.
        let mut known: Map<ItemSet, StateID> = Map::default();
        let mut pending = VecDeque::new();

        states.push(State {
            id: StateID::START,
            item_set: initial.clone(),
        });
        known.insert(initial, StateID::START);
        pending.push_back(StateID::START);

        while let Some(id) = pending.pop_front() {
            let kernels = builder.kernels(&states[id.index()].item_set);
            for (symbol, mut item_set) in kernels {
                builder.closure(&mut item_set);

                let target = match known.get(&item_set) {
                    Some(&target) => target,
                    None => {
                        let target = StateID::new(states.len() as u32);
                        states.push(State {
                            id: target,
                            item_set: item_set.clone(),
                        });
                        known.insert(item_set, target);
                        pending.push_back(target);
                        target
                    }
                };
                transitions.insert((id, symbol), target);
            }
        }

        Self {
            states,
            transitions,
        }
    }

    pub fn states(&self) -> impl Iterator<Item = &State> + '_ {
        self.states.iter()
    }

    pub fn state(&self, id: StateID) -> &State {
        &self.states[id.index()]
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    pub fn transition(&self, from: StateID, symbol: SymbolID) -> Option<StateID> {
        self.transitions.get(&(from, symbol)).copied()
    }

    pub fn transitions_from(
        &self,
        from: StateID,
    ) -> impl Iterator<Item = (SymbolID, StateID)> + '_ {
        self.transitions
            .iter()
            .filter(move |((f, _), _)| *f == from)
            .map(|((_, symbol), target)| (*symbol, *target))
    }

    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(|f| {
            for (i, state) in self.states().enumerate() {
                if i > 0 {
                    writeln!(f)?;
                }
                writeln!(f, "State {}:", state.id())?;
                for (core, lookaheads) in state.items() {
                    write!(f, "  {} , ", core.display(g))?;
                    for (i, lookahead) in lookaheads.iter().enumerate() {
                        if i > 0 {
                            f.write_str("/")?;
                        }
                        write!(f, "{}", g.terminals[lookahead])?;
                    }
                    writeln!(f)?;
                }
            }
            Ok(())
        })
    }
}

struct AutomatonBuilder<'g> {
    grammar: &'g Grammar,
    first_sets: FirstSets,
}

impl AutomatonBuilder<'_> {
    /// Expand the item set to its closure, in place.
    fn closure(&self, items: &mut ItemSet) {
        let mut changed = true;
        while changed {
            changed = false;

            let mut added: Map<ItemCore, BTreeSet<TerminalID>> = Map::default();
            for (core, lookaheads) in &*items {
                let rule = &self.grammar.rules[&core.rule];

                // [X -> ... . Y beta]
                //  Y: one nonterminal symbol
                let (y_symbol, beta) = match &rule.right()[core.marker..] {
                    [SymbolID::N(y_symbol), beta @ ..] => (*y_symbol, beta),
                    _ => continue,
                };

                // With lookaheads {x1,...,xk}, the spawned items carry every
                // terminal in First(beta x1) \cup ... \cup First(beta xk).
                let x = self
                    .first_sets
                    .first_of_sequence(beta, lookaheads.iter().copied());
                for rule in self.grammar.rules.values() {
                    if rule.left() != y_symbol {
                        continue;
                    }

                    added
                        .entry(ItemCore {
                            rule: rule.id(),
                            marker: 0,
                        })
                        .or_default()
                        .extend(x.iter().copied());
                }
            }

            for (core, lookaheads) in added {
                let ctx = items.entry(core).or_insert_with(|| {
                    changed = true;
                    BTreeSet::new()
                });
                for l in lookaheads {
                    changed |= ctx.insert(l);
                }
            }
        }
    }

    /// Extract the unexpanded goto kernels of the item set, keyed by the
    /// transition symbol.
    fn kernels(&self, items: &ItemSet) -> Map<SymbolID, ItemSet> {
        let mut kernels: Map<SymbolID, ItemSet> = Map::default();
        for (core, lookaheads) in items {
            let rule = &self.grammar.rules[&core.rule];

            if core.marker >= rule.right().len() {
                continue;
            }

            let label = rule.right()[core.marker];
            kernels.entry(label).or_default().insert(
                ItemCore {
                    marker: core.marker + 1,
                    ..*core
                },
                lookaheads.clone(),
            );
        }
        kernels
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::SymbolID::*;

    // S -> C C ; C -> c C | d
    fn sample_grammar() -> Grammar {
        Grammar::define(|g| {
            let c = g.terminal("c")?;
            let d = g.terminal("d")?;
            let s = g.nonterminal("S")?;
            let cc = g.nonterminal("C")?;
            g.start_symbol(s)?;
            g.rule(s, [N(cc), N(cc)])?;
            g.rule(cc, [T(c), N(cc)])?;
            g.rule(cc, [T(d)])?;
            Ok(())
        })
        .unwrap()
    }

    #[test]
    fn initial_state_is_closure_of_accept_item() {
        let grammar = sample_grammar();
        let automaton = Automaton::generate(&grammar);

        let state0 = automaton.state(StateID::START);
        let accept = ItemCore {
            rule: RuleID::ACCEPT,
            marker: 0,
        };
        let lookaheads = state0.lookaheads(&accept).unwrap();
        assert_eq!(lookaheads.len(), 1);
        assert!(lookaheads.contains(&TerminalID::EOI));

        // every user production appears with marker 0 in the closure
        for rule in grammar.rules.values() {
            if rule.id() == RuleID::ACCEPT {
                continue;
            }
            let core = ItemCore {
                rule: rule.id(),
                marker: 0,
            };
            // S and C are both reachable from the dot in state 0
            assert!(
                state0.lookaheads(&core).is_some(),
                "missing closure item for rule {}",
                rule.id()
            );
        }
    }

    #[test]
    fn canonical_collection_has_ten_states() {
        let grammar = sample_grammar();
        let automaton = Automaton::generate(&grammar);
        assert_eq!(automaton.state_count(), 10);
    }

    #[test]
    fn no_duplicate_states() {
        let grammar = sample_grammar();
        let automaton = Automaton::generate(&grammar);
        for a in automaton.states() {
            for b in automaton.states() {
                if a.id() != b.id() {
                    assert_ne!(a.item_set, b.item_set);
                }
            }
        }
    }

    #[test]
    fn every_state_is_reachable_from_start() {
        let grammar = sample_grammar();
        let automaton = Automaton::generate(&grammar);

        let mut seen = vec![false; automaton.state_count()];
        seen[0] = true;
        let mut stack = vec![StateID::START];
        while let Some(id) = stack.pop() {
            for (_, target) in automaton.transitions_from(id) {
                if !seen[target.index()] {
                    seen[target.index()] = true;
                    stack.push(target);
                }
            }
        }
        assert!(seen.iter().all(|s| *s));
    }
}
