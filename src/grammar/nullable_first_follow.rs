use std::collections::{BTreeMap, BTreeSet};

use log::debug;
use serde::Serialize;

use super::{grammar::Symbol, Grammar};

/// FIRST set of every non-terminal; members are terminals and possibly ε.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FirstSets(BTreeMap<String, BTreeSet<Symbol>>);

/// FOLLOW set of every non-terminal; members are terminals and possibly `$`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FollowSets(BTreeMap<String, BTreeSet<Symbol>>);

impl FirstSets {
    pub fn get(&self, non_terminal: &str) -> Option<&BTreeSet<Symbol>> {
        self.0.get(non_terminal)
    }

    pub fn is_nullable(&self, non_terminal: &str) -> bool {
        self.get(non_terminal)
            .map_or(false, |first| first.contains(&Symbol::Epsilon))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BTreeSet<Symbol>)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// FIRST of a symbol string; contains ε iff the whole string is nullable,
    /// which includes the empty string.
    pub fn calculate_first_for_sequence(&self, symbols: &[Symbol]) -> BTreeSet<Symbol> {
        first_of_sequence(&self.0, symbols)
    }
}

impl FollowSets {
    pub fn get(&self, non_terminal: &str) -> Option<&BTreeSet<Symbol>> {
        self.0.get(non_terminal)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BTreeSet<Symbol>)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

fn first_of_sequence(
    sets: &BTreeMap<String, BTreeSet<Symbol>>,
    symbols: &[Symbol],
) -> BTreeSet<Symbol> {
    let mut first: BTreeSet<Symbol> = BTreeSet::new();
    for symbol in symbols {
        match symbol {
            Symbol::Terminal(_) | Symbol::EndOfInput => {
                first.insert(symbol.clone());
                return first;
            }
            Symbol::Epsilon => continue,
            Symbol::NonTerminal(name) => {
                let mut nullable = false;
                for s in sets.get(name).into_iter().flatten() {
                    if *s == Symbol::Epsilon {
                        nullable = true;
                    } else {
                        first.insert(s.clone());
                    }
                }
                if !nullable {
                    return first;
                }
            }
        }
    }
    first.insert(Symbol::Epsilon);
    first
}

fn extend(set: &mut BTreeSet<Symbol>, symbols: impl IntoIterator<Item = Symbol>) -> bool {
    let mut changed = false;
    for s in symbols {
        changed |= set.insert(s);
    }
    changed
}

impl Grammar {
    pub fn calculate_first_sets(&self) -> FirstSets {
        let mut sets: BTreeMap<String, BTreeSet<Symbol>> = self
            .non_terminal_iter()
            .map(|nt| (nt.to_string(), BTreeSet::new()))
            .collect();

        let mut passes = 0;
        let mut changed = true;
        while changed {
            changed = false;
            passes += 1;
            for (left, productions) in self.rule_iter() {
                for production in productions {
                    let first = first_of_sequence(&sets, &production.right);
                    if let Some(set) = sets.get_mut(left) {
                        changed |= extend(set, first);
                    }
                }
            }
        }

        debug!("first sets converged after {} passes", passes);
        FirstSets(sets)
    }

    pub fn calculate_follow_sets(&self, first: &FirstSets) -> FollowSets {
        let mut sets: BTreeMap<String, BTreeSet<Symbol>> = self
            .non_terminal_iter()
            .map(|nt| (nt.to_string(), BTreeSet::new()))
            .collect();
        if let Some(set) = sets.get_mut(self.start_symbol()) {
            set.insert(Symbol::EndOfInput);
        }

        let mut passes = 0;
        let mut changed = true;
        while changed {
            changed = false;
            passes += 1;
            for (left, productions) in self.rule_iter() {
                for production in productions {
                    for (i, symbol) in production.right.iter().enumerate() {
                        let Symbol::NonTerminal(name) = symbol else {
                            continue;
                        };

                        let beta = first.calculate_first_for_sequence(&production.right[i + 1..]);
                        let mut follow: Vec<Symbol> = beta
                            .iter()
                            .filter(|s| **s != Symbol::Epsilon)
                            .cloned()
                            .collect();
                        if beta.contains(&Symbol::Epsilon) {
                            follow.extend(sets.get(left).into_iter().flatten().cloned());
                        }

                        if let Some(set) = sets.get_mut(name) {
                            changed |= extend(set, follow);
                        }
                    }
                }
            }
        }

        debug!("follow sets converged after {} passes", passes);
        FollowSets(sets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{GrammarBuilder, EPSILON};
    use crate::lexer::{DIV, ID, LPAREN, MINUS, MOD, MUL, NUM, PLUS, RPAREN};
    use pretty_assertions::assert_eq;

    fn set(symbols: &[Symbol]) -> BTreeSet<Symbol> {
        symbols.iter().cloned().collect()
    }

    fn t(name: &str) -> Symbol {
        Symbol::terminal(name)
    }

    #[test]
    fn arithmetic_first_sets() {
        let g = Grammar::arithmetic();
        let first = g.calculate_first_sets();

        let f = set(&[t(LPAREN), t(NUM), t(ID)]);
        assert_eq!(first.get("E"), Some(&f));
        assert_eq!(first.get("T"), Some(&f));
        assert_eq!(first.get("F"), Some(&f));
        assert_eq!(
            first.get("E'"),
            Some(&set(&[t(PLUS), t(MINUS), Symbol::Epsilon]))
        );
        assert_eq!(
            first.get("T'"),
            Some(&set(&[t(MUL), t(DIV), t(MOD), Symbol::Epsilon]))
        );
    }

    #[test]
    fn arithmetic_follow_sets() {
        let g = Grammar::arithmetic();
        let first = g.calculate_first_sets();
        let follow = g.calculate_follow_sets(&first);

        let e = set(&[t(RPAREN), Symbol::EndOfInput]);
        let t_ = set(&[t(PLUS), t(MINUS), t(RPAREN), Symbol::EndOfInput]);
        let f = set(&[
            t(PLUS),
            t(MINUS),
            t(MUL),
            t(DIV),
            t(MOD),
            t(RPAREN),
            Symbol::EndOfInput,
        ]);
        assert_eq!(follow.get("E"), Some(&e));
        assert_eq!(follow.get("E'"), Some(&e));
        assert_eq!(follow.get("T"), Some(&t_));
        assert_eq!(follow.get("T'"), Some(&t_));
        assert_eq!(follow.get("F"), Some(&f));
    }

    #[test]
    fn recomputation_is_identical() {
        let g = Grammar::arithmetic();
        let first = g.calculate_first_sets();
        assert_eq!(first, g.calculate_first_sets());
        assert_eq!(g.calculate_follow_sets(&first), g.calculate_follow_sets(&first));
    }

    // S -> A B c | B
    // A -> a | ε
    // B -> A b | ε
    fn nullable_chain() -> Grammar {
        GrammarBuilder::new()
            .non_terminal("S")
            .non_terminal("A")
            .non_terminal("B")
            .terminal("a")
            .terminal("b")
            .terminal("c")
            .production("S", &["A", "B", "c"])
            .production("S", &["B"])
            .production("A", &["a"])
            .production("A", &[EPSILON])
            .production("B", &["A", "b"])
            .production("B", &[EPSILON])
            .build()
            .unwrap()
    }

    #[test]
    fn nullability_propagates() {
        let g = nullable_chain();
        let first = g.calculate_first_sets();

        assert!(first.is_nullable("A"));
        assert!(first.is_nullable("B"));
        assert!(first.is_nullable("S"));
        assert_eq!(
            first.get("S"),
            Some(&set(&[t("a"), t("b"), t("c"), Symbol::Epsilon]))
        );
        assert_eq!(first.get("B"), Some(&set(&[t("a"), t("b"), Symbol::Epsilon])));
    }

    #[test]
    fn follow_through_nullable_suffix() {
        let g = nullable_chain();
        let first = g.calculate_first_sets();
        let follow = g.calculate_follow_sets(&first);

        assert_eq!(follow.get("S"), Some(&set(&[Symbol::EndOfInput])));
        // A is followed by B (nullable) then c, and by b inside B.
        assert_eq!(follow.get("A"), Some(&set(&[t("a"), t("b"), t("c")])));
        // B ends S -> B, so it inherits FOLLOW(S).
        assert_eq!(follow.get("B"), Some(&set(&[t("c"), Symbol::EndOfInput])));
    }

    #[test]
    fn empty_body_is_nullable() {
        let g = GrammarBuilder::new()
            .non_terminal("S")
            .non_terminal("N")
            .terminal("x")
            .production("S", &["N", "x"])
            .production("N", &[])
            .build()
            .unwrap();
        let first = g.calculate_first_sets();
        assert_eq!(first.get("N"), Some(&set(&[Symbol::Epsilon])));
        assert_eq!(first.get("S"), Some(&set(&[t("x")])));
        assert!(!first.is_nullable("S"));

        let follow = g.calculate_follow_sets(&first);
        assert_eq!(follow.get("N"), Some(&set(&[t("x")])));
    }

    #[test]
    fn non_nullable_recursion_never_gains_epsilon() {
        // L -> x L | y, terminates only through y
        let g = GrammarBuilder::new()
            .non_terminal("L")
            .terminal("x")
            .terminal("y")
            .production("L", &["x", "L"])
            .production("L", &["y"])
            .build()
            .unwrap();
        let first = g.calculate_first_sets();
        assert_eq!(first.get("L"), Some(&set(&[t("x"), t("y")])));
        assert!(!first.is_nullable("L"));
    }

    #[test]
    fn sequence_first() {
        let first = Grammar::arithmetic().calculate_first_sets();
        assert_eq!(first.calculate_first_for_sequence(&[]), set(&[Symbol::Epsilon]));
        assert_eq!(
            first.calculate_first_for_sequence(&[Symbol::non_terminal("T'"), t(RPAREN)]),
            set(&[t(MUL), t(DIV), t(MOD), t(RPAREN)])
        );
    }

    #[test]
    fn sets_serialize_as_sorted_lists() {
        let first = Grammar::arithmetic().calculate_first_sets();
        let json = serde_json::to_value(&first).unwrap();
        assert_eq!(json["E'"], serde_json::json!(["MINUS", "PLUS", "ε"]));
    }
}
