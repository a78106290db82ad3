//! Calculation of the FIRST set function.

use crate::{
    grammar::{Grammar, NonterminalID, SymbolID, TerminalID},
    types::{Map, Set},
};

#[derive(Debug)]
pub struct FirstSets {
    nulls: Set<NonterminalID>,
    map: Map<SymbolID, Set<TerminalID>>,
}

impl FirstSets {
    pub fn new(grammar: &Grammar) -> Self {
        let nulls = nulls_set(grammar);

        // First(T) = {T}, First(A) = {}
        let mut map: Map<SymbolID, Set<TerminalID>> = Map::default();
        for terminal in grammar.terminals.values() {
            map.insert(
                SymbolID::T(terminal.id()),
                Some(terminal.id()).into_iter().collect(),
            );
        }
        for nonterminal in grammar.nonterminals.values() {
            map.insert(SymbolID::N(nonterminal.id()), Set::default());
        }

        // For a production X -> Y1 Y2 ... Yn, let Yk be the first
        // non-nullable symbol; each Yi (i <= k) contributes the constraint
        // First(X) \supseteq First(Yi).
        #[derive(Debug)]
        struct Constraint {
            sup: SymbolID,
            sub: SymbolID,
        }
        let mut constraints = vec![];
        for rule in grammar.rules.values() {
            for symbol in rule.right() {
                if !matches!(symbol, SymbolID::N(n) if rule.left() == *n) {
                    constraints.push(Constraint {
                        sup: SymbolID::N(rule.left()),
                        sub: *symbol,
                    });
                }
                if !matches!(symbol, SymbolID::N(n) if nulls.contains(n)) {
                    break;
                }
            }
        }

        // Iterate all constraints to a fixed point.
        let mut changed = true;
        while changed {
            changed = false;

            for Constraint { sup, sub } in &constraints {
                let subset = map[sub].clone();
                let superset = map.get_mut(sup).expect("symbol not registered");
                for tok in subset {
                    if superset.insert(tok) {
                        changed = true;
                    }
                }
            }
        }

        Self { nulls, map }
    }

    /// Whether the symbol derives the empty sequence.
    pub fn is_nullable(&self, symbol: SymbolID) -> bool {
        matches!(symbol, SymbolID::N(n) if self.nulls.contains(&n))
    }

    /// `First(symbol)`, epsilon excluded (nullability is tracked separately).
    pub fn first(&self, symbol: SymbolID) -> &Set<TerminalID> {
        &self.map[&symbol]
    }

    /// `First(prefix x1) \cup ... \cup First(prefix xk)` for the lookahead
    /// symbols `{x1,...,xk}`: the lookaheads take part only when the whole
    /// prefix is nullable (including the empty prefix).
    pub fn first_of_sequence<L>(&self, prefix: &[SymbolID], lookaheads: L) -> Set<TerminalID>
    where
        L: IntoIterator<Item = TerminalID>,
    {
        let mut res = Set::default();

        let mut nullable_prefix = true;
        for symbol in prefix {
            res.extend(self.map[symbol].iter().copied());
            if !self.is_nullable(*symbol) {
                nullable_prefix = false;
                break;
            }
        }

        if nullable_prefix {
            res.extend(lookaheads);
        }

        res
    }
}

/// Calculate the set of nullable symbols in this grammar.
fn nulls_set(grammar: &Grammar) -> Set<NonterminalID> {
    let mut nulls: Set<NonterminalID> = grammar
        .rules
        .values()
        .filter_map(|rule| rule.right().is_empty().then(|| rule.left()))
        .collect();

    let mut changed = true;
    while changed {
        changed = false;
        for rule in grammar.rules.values() {
            if nulls.contains(&rule.left()) {
                continue;
            }
            let is_rhs_nullable = rule
                .right()
                .iter()
                .all(|symbol| matches!(symbol, SymbolID::N(n) if nulls.contains(n)));
            if is_rhs_nullable {
                changed = true;
                nulls.insert(rule.left());
                continue;
            }
        }
    }

    nulls
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::SymbolID::*;

    // S -> A B c ; A -> a | eps ; B -> b | eps
    fn nullable_grammar() -> (Grammar, [TerminalID; 3], [NonterminalID; 3]) {
        let mut ids = None;
        let grammar = Grammar::define(|g| {
            let a = g.terminal("a")?;
            let b = g.terminal("b")?;
            let c = g.terminal("c")?;
            let s = g.nonterminal("S")?;
            let na = g.nonterminal("A")?;
            let nb = g.nonterminal("B")?;
            g.start_symbol(s)?;
            g.rule(s, [N(na), N(nb), T(c)])?;
            g.rule(na, [T(a)])?;
            g.rule(na, [])?;
            g.rule(nb, [T(b)])?;
            g.rule(nb, [])?;
            ids = Some(([a, b, c], [s, na, nb]));
            Ok(())
        })
        .unwrap();
        let (terminals, nonterminals) = ids.unwrap();
        (grammar, terminals, nonterminals)
    }

    #[test]
    fn nullable_propagation() {
        let (grammar, _, [s, na, nb]) = nullable_grammar();
        let first = FirstSets::new(&grammar);
        assert!(first.is_nullable(N(na)));
        assert!(first.is_nullable(N(nb)));
        assert!(!first.is_nullable(N(s)));
    }

    #[test]
    fn first_skips_nullable_symbols() {
        let (grammar, [a, b, c], [s, ..]) = nullable_grammar();
        let first = FirstSets::new(&grammar);
        let f = first.first(N(s));
        assert!(f.contains(&a));
        assert!(f.contains(&b));
        assert!(f.contains(&c));
    }

    #[test]
    fn sequence_falls_through_to_lookahead() {
        let (grammar, [a, _, _], [_, na, nb]) = nullable_grammar();
        let first = FirstSets::new(&grammar);

        let la = TerminalID::EOI;
        let f = first.first_of_sequence(&[N(na), N(nb)], [la]);
        assert!(f.contains(&a));
        assert!(f.contains(&la), "whole prefix nullable, lookahead joins");

        let f = first.first_of_sequence(&[T(a), N(nb)], [la]);
        assert!(!f.contains(&la), "non-nullable head stops the scan");

        let f = first.first_of_sequence(&[], [la]);
        assert_eq!(f.len(), 1);
    }
}
