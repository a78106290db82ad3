//! The textual grammar/input protocol.
//!
//! ```text
//! 3
//! S -> C C
//! C -> c C | d
//! c c d d
//! ```
//!
//! The first line is the number of user productions (alternatives written
//! with `|` count once per production line contributed). Every left-hand
//! symbol is a nonterminal, every other right-hand symbol a terminal; a
//! right-hand side of exactly `eps` is the empty production, while an `eps`
//! mixed with other symbols is an ordinary terminal named `eps`. The `|`
//! separator is structural in production lines, so a grammar using `|`
//! itself as a terminal cannot be written in this form.
//!
//! The final non-blank line holds the token sequence to parse; a trailing
//! `$` is optional. Input tokens are not validated against the grammar:
//! a token that names no declared symbol becomes a fresh terminal, so the
//! parse still runs and the mismatch surfaces as a missing ACTION entry in
//! the trace rather than aborting the report.

use crate::{
    grammar::{Grammar, GrammarDefError, NonterminalID, SymbolID, TerminalID},
    types::Map,
};

/// A parsed source file: the grammar and the token sequence to drive
/// through it.
#[derive(Debug)]
pub struct SourceSpec {
    pub grammar: Grammar,
    pub input: Vec<TerminalID>,
}

#[derive(Debug, thiserror::Error)]
pub enum SyntaxError {
    #[error("missing production count")]
    MissingCount,

    #[error("invalid production count: `{0}'")]
    InvalidCount(String),

    #[error("missing `->' in production line: `{0}'")]
    MissingArrow(String),

    #[error("empty alternative in production line: `{0}'")]
    EmptyAlternative(String),

    #[error("the end marker `$' cannot appear in a production body: `{0}'")]
    EndMarkerInRule(String),

    #[error("expected {expected} production lines, found {found}")]
    NotEnoughProductions { expected: usize, found: usize },

    #[error("missing input token line")]
    MissingInput,

    #[error(transparent)]
    Grammar(#[from] GrammarDefError),
}

#[derive(Debug)]
struct RawProduction {
    left: String,
    // one entry per `|`-separated alternative; empty vec = epsilon
    alternatives: Vec<Vec<String>>,
}

pub fn parse(source: &str) -> Result<SourceSpec, SyntaxError> {
    let mut lines = source.lines().filter(|line| !line.trim().is_empty());

    let count_line = lines.next().ok_or(SyntaxError::MissingCount)?.trim();
    let count: usize = count_line
        .parse()
        .map_err(|_| SyntaxError::InvalidCount(count_line.to_owned()))?;

    let mut productions = Vec::with_capacity(count);
    for found in 0..count {
        let line = lines
            .next()
            .ok_or(SyntaxError::NotEnoughProductions {
                expected: count,
                found,
            })?
            .trim();
        productions.push(parse_production(line)?);
    }

    let input_line = lines.next().ok_or(SyntaxError::MissingInput)?;
    let input_tokens: Vec<&str> = input_line.split_whitespace().collect();

    build_spec(&productions, &input_tokens)
}

fn parse_production(line: &str) -> Result<RawProduction, SyntaxError> {
    let mut tokens = line.split_whitespace();
    let left = tokens
        .next()
        .ok_or_else(|| SyntaxError::MissingArrow(line.to_owned()))?
        .to_owned();
    if tokens.next() != Some("->") {
        return Err(SyntaxError::MissingArrow(line.to_owned()));
    }

    let mut alternatives = Vec::new();
    let mut current: Vec<String> = Vec::new();
    for token in tokens {
        if token == "|" {
            if current.is_empty() {
                return Err(SyntaxError::EmptyAlternative(line.to_owned()));
            }
            alternatives.push(std::mem::take(&mut current));
            continue;
        }
        if token == "$" {
            return Err(SyntaxError::EndMarkerInRule(line.to_owned()));
        }
        current.push(token.to_owned());
    }
    if current.is_empty() {
        return Err(SyntaxError::EmptyAlternative(line.to_owned()));
    }
    alternatives.push(current);

    // a sole `eps` is the empty production; anywhere else it is an ordinary
    // terminal named `eps`
    for alternative in &mut alternatives {
        if alternative.len() == 1 && alternative[0] == "eps" {
            alternative.clear();
        }
    }

    Ok(RawProduction {
        left,
        alternatives,
    })
}

fn build_spec(
    productions: &[RawProduction],
    input_tokens: &[&str],
) -> Result<SourceSpec, SyntaxError> {
    let mut terminal_ids: Map<String, TerminalID> = Map::default();
    let mut nonterminal_ids: Map<String, NonterminalID> = Map::default();
    let mut input = Vec::with_capacity(input_tokens.len());

    let grammar = Grammar::define(|g| {
        // every left-hand symbol is a nonterminal; the first one is the
        // start symbol
        for production in productions {
            if !nonterminal_ids.contains_key(&production.left) {
                let id = g.nonterminal(&production.left)?;
                nonterminal_ids.insert(production.left.clone(), id);
            }
        }
        if let Some(first) = productions.first() {
            g.start_symbol(nonterminal_ids[&first.left])?;
        }

        for production in productions {
            let left = nonterminal_ids[&production.left];
            for alternative in &production.alternatives {
                let mut right = Vec::with_capacity(alternative.len());
                for name in alternative {
                    let symbol = match nonterminal_ids.get(name) {
                        Some(n) => SymbolID::N(*n),
                        None => {
                            let t = match terminal_ids.get(name) {
                                Some(t) => *t,
                                None => {
                                    let t = g.terminal(name)?;
                                    terminal_ids.insert(name.clone(), t);
                                    t
                                }
                            };
                            SymbolID::T(t)
                        }
                    };
                    right.push(symbol);
                }
                g.rule(left, right)?;
            }
        }

        // input tokens are not validated: a token naming no declared symbol
        // (a typo, or a nonterminal name) becomes a fresh terminal, so the
        // parse runs into a missing ACTION entry instead of aborting here
        for token in input_tokens {
            if *token == "$" {
                input.push(TerminalID::EOI);
                continue;
            }
            let id = match terminal_ids.get(*token) {
                Some(t) => *t,
                None => {
                    let t = g.terminal(token)?;
                    terminal_ids.insert((*token).to_owned(), t);
                    t
                }
            };
            input.push(id);
        }

        Ok(())
    })?;

    Ok(SourceSpec { grammar, input })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_SOURCE: &str = "\
3
S -> C C
C -> c C
C -> d
c c d d
";

    #[test]
    fn parses_the_protocol() {
        let spec = parse(SAMPLE_SOURCE).unwrap();
        // augmented rule + 3 user rules
        assert_eq!(spec.grammar.rules.len(), 4);
        assert_eq!(spec.input.len(), 4);
    }

    #[test]
    fn alternatives_expand_to_separate_rules() {
        let spec = parse("2\nS -> C C\nC -> c C | d\nd d\n").unwrap();
        assert_eq!(spec.grammar.rules.len(), 4);
    }

    #[test]
    fn eps_denotes_the_empty_production() {
        let spec = parse("2\nS -> a S\nS -> eps\na a\n").unwrap();
        let epsilon_rules = spec
            .grammar
            .rules
            .values()
            .filter(|rule| rule.right().is_empty())
            .count();
        assert_eq!(epsilon_rules, 1);
    }

    #[test]
    fn blank_lines_are_skipped() {
        let spec = parse("1\n\nS -> a\n\na\n").unwrap();
        assert_eq!(spec.grammar.rules.len(), 2);
    }

    #[test]
    fn trailing_end_marker_is_accepted() {
        let spec = parse("1\nS -> a\na $\n").unwrap();
        assert_eq!(spec.input.last(), Some(&TerminalID::EOI));
    }

    #[test]
    fn missing_arrow_is_an_error() {
        assert!(matches!(
            parse("1\nS C C\nd d\n"),
            Err(SyntaxError::MissingArrow(_))
        ));
    }

    #[test]
    fn bad_count_is_an_error() {
        assert!(matches!(
            parse("three\nS -> a\na\n"),
            Err(SyntaxError::InvalidCount(_))
        ));
        assert!(matches!(parse(""), Err(SyntaxError::MissingCount)));
    }

    #[test]
    fn short_grammar_is_an_error() {
        assert!(matches!(
            parse("3\nS -> C C\nC -> d\n"),
            Err(SyntaxError::NotEnoughProductions { .. })
        ));
    }

    #[test]
    fn unknown_input_token_becomes_a_fresh_terminal() {
        let spec = parse("1\nS -> a\nb\n").unwrap();
        assert_eq!(spec.input.len(), 1);
        // `b' is declared on the fly and is distinct from the grammar's `a'
        let names: Vec<_> = spec
            .grammar
            .terminals
            .values()
            .filter_map(|t| t.name())
            .collect();
        assert_eq!(names, ["a", "b"]);
    }

    #[test]
    fn eps_amid_other_symbols_is_an_ordinary_terminal() {
        let spec = parse("1\nS -> a eps b\na eps b\n").unwrap();
        assert!(spec
            .grammar
            .rules
            .values()
            .any(|rule| rule.right().len() == 3));
        assert!(spec
            .grammar
            .terminals
            .values()
            .any(|t| t.name() == Some("eps")));
        assert_eq!(spec.input.len(), 3);
    }

    #[test]
    fn end_marker_rejected_inside_production() {
        assert!(matches!(
            parse("1\nS -> a $\na\n"),
            Err(SyntaxError::EndMarkerInRule(_))
        ));
    }
}
