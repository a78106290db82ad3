//! LALR(1) reduction of a canonical LR(1) automaton.

use crate::{
    grammar::SymbolID,
    lr1::{Automaton, ItemCores, State, StateID},
    types::Map,
};

/// How the generated automaton treats states with equal cores.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum Mode {
    /// Knuth's canonical LR(1) method: states are distinct unless their
    /// lookaheads match exactly.
    #[default]
    Canonical,

    /// DeRemer's LALR(1) method: states sharing an item core are merged and
    /// their lookaheads unioned.
    Lalr,
}

#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    /// Two states of one core group transition to different merged states on
    /// the same symbol. The goto sets of equal-core states share a core by
    /// construction, so this indicates a defect in the canonical automaton,
    /// not a property of the grammar.
    #[error(
        "internal error: goto target core mismatch while merging state {} on symbol {:?}",
        state,
        symbol
    )]
    LostGotoTarget { state: StateID, symbol: SymbolID },
}

/// Merge all states sharing an identical item core, unioning their
/// lookaheads per core and remapping the transition function.
///
/// Returns the merged automaton and the mapping from each original state
/// index to its merged state. Merged indices follow the first-encountered
/// order of the original states, so state 0 stays state 0 and the merge of
/// an already merged automaton is the identity.
pub fn merge(automaton: &Automaton) -> Result<(Automaton, Vec<StateID>), MergeError> {
    let mut groups: Map<ItemCores, StateID> = Map::default();
    let mut merged: Vec<State> = Vec::new();
    let mut mapping = Vec::with_capacity(automaton.state_count());

    for state in automaton.states() {
        let merged_id = *groups.entry(state.cores()).or_insert_with(|| {
            let id = StateID::new(merged.len() as u32);
            merged.push(State::new_empty(id));
            id
        });

        let group = &mut merged[merged_id.index()];
        for (core, lookaheads) in state.items() {
            group
                .item_set
                .entry(*core)
                .or_default()
                .extend(lookaheads.iter().copied());
        }
        mapping.push(merged_id);
    }

    let mut transitions = Map::default();
    for (&(from, symbol), &target) in automaton.transitions.iter() {
        let from = mapping[from.index()];
        let target = mapping[target.index()];
        if let Some(previous) = transitions.insert((from, symbol), target) {
            if previous != target {
                return Err(MergeError::LostGotoTarget {
                    state: from,
                    symbol,
                });
            }
        }
    }

    Ok((
        Automaton {
            states: merged,
            transitions,
        },
        mapping,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{Grammar, SymbolID::*};

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
    fn sample_grammar_merges_to_seven_states() {
        let grammar = sample_grammar();
        let canonical = Automaton::generate(&grammar);
        assert_eq!(canonical.state_count(), 10);

        let (merged, mapping) = merge(&canonical).unwrap();
        assert_eq!(merged.state_count(), 7);
        assert_eq!(mapping.len(), 10);
        assert_eq!(mapping[0], StateID::START);
    }

    #[test]
    fn merging_is_idempotent() {
        let grammar = sample_grammar();
        let canonical = Automaton::generate(&grammar);
        let (merged, _) = merge(&canonical).unwrap();
        let (merged_again, mapping) = merge(&merged).unwrap();

        assert_eq!(merged.state_count(), merged_again.state_count());
        for (a, b) in merged.states().zip(merged_again.states()) {
            assert_eq!(a.item_set, b.item_set);
        }
        for (i, id) in mapping.iter().enumerate() {
            assert_eq!(id.index(), i);
        }
    }

    #[test]
    fn original_lookaheads_are_subsets_of_merged_group() {
        let grammar = sample_grammar();
        let canonical = Automaton::generate(&grammar);
        let (merged, mapping) = merge(&canonical).unwrap();

        for state in canonical.states() {
            let group = merged.state(mapping[state.id().index()]);
            for (core, lookaheads) in state.items() {
                let merged_lookaheads = group.lookaheads(core).unwrap();
                assert!(lookaheads.is_subset(merged_lookaheads));
            }
        }
    }

    #[test]
    fn merged_groups_share_cores() {
        let grammar = sample_grammar();
        let canonical = Automaton::generate(&grammar);
        let (merged, mapping) = merge(&canonical).unwrap();

        for state in canonical.states() {
            let group = merged.state(mapping[state.id().index()]);
            assert_eq!(state.cores(), group.cores());
        }
    }
}
