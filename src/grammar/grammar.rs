use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Serialize, Serializer};

use super::{END_MARK, EPSILON};
use crate::error::{Error, Result};
use crate::lexer::{DIV, ID, LPAREN, MINUS, MOD, MUL, NUM, PLUS, RPAREN};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Symbol {
    Terminal(String),
    NonTerminal(String),
    Epsilon,
    EndOfInput,
}

impl Symbol {
    pub fn terminal(name: &str) -> Self {
        Symbol::Terminal(name.to_string())
    }

    pub fn non_terminal(name: &str) -> Self {
        Symbol::NonTerminal(name.to_string())
    }

    pub fn name(&self) -> &str {
        match self {
            Symbol::Terminal(name) | Symbol::NonTerminal(name) => name.as_str(),
            Symbol::Epsilon => EPSILON,
            Symbol::EndOfInput => END_MARK,
        }
    }

    /// Terminals and the end marker are matched against input; everything
    /// else is expanded or skipped.
    pub fn is_input(&self) -> bool {
        matches!(self, Symbol::Terminal(_) | Symbol::EndOfInput)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for Symbol {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Production {
    pub left: String,
    pub right: Vec<Symbol>,
}

impl Production {
    pub fn new(left: &str, right: Vec<Symbol>) -> Self {
        Self {
            left: left.to_string(),
            right,
        }
    }

    /// `A -> ε`, the only body that pushes nothing when applied.
    pub fn is_epsilon(&self) -> bool {
        matches!(self.right.as_slice(), [Symbol::Epsilon])
    }

    pub fn right_names(&self) -> Vec<&str> {
        self.right.iter().map(|s| s.name()).collect()
    }
}

impl fmt::Display for Production {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.right.is_empty() {
            write!(f, "{} -> {}", self.left, EPSILON)
        } else {
            write!(f, "{} -> {}", self.left, self.right_names().join(" "))
        }
    }
}

impl Serialize for Production {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(self.right.iter())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Grammar {
    non_terminals: Vec<String>,
    terminals: Vec<String>,
    productions: HashMap<String, Vec<Production>>,
    start_symbol: String,
}

impl Grammar {
    /// E  -> T E'
    /// E' -> PLUS T E' | MINUS T E' | ε
    /// T  -> F T'
    /// T' -> MUL F T' | DIV F T' | MOD F T' | ε
    /// F  -> LPAREN E RPAREN | NUM | ID
    pub fn arithmetic() -> Self {
        let t = Symbol::terminal;
        let n = Symbol::non_terminal;
        let rules: Vec<(&str, Vec<Vec<Symbol>>)> = vec![
            ("E", vec![vec![n("T"), n("E'")]]),
            (
                "E'",
                vec![
                    vec![t(PLUS), n("T"), n("E'")],
                    vec![t(MINUS), n("T"), n("E'")],
                    vec![Symbol::Epsilon],
                ],
            ),
            ("T", vec![vec![n("F"), n("T'")]]),
            (
                "T'",
                vec![
                    vec![t(MUL), n("F"), n("T'")],
                    vec![t(DIV), n("F"), n("T'")],
                    vec![t(MOD), n("F"), n("T'")],
                    vec![Symbol::Epsilon],
                ],
            ),
            (
                "F",
                vec![vec![t(LPAREN), n("E"), t(RPAREN)], vec![t(NUM)], vec![t(ID)]],
            ),
        ];

        let mut g = Self {
            non_terminals: Vec::new(),
            terminals: [NUM, ID, PLUS, MINUS, MUL, DIV, MOD, LPAREN, RPAREN]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            productions: HashMap::new(),
            start_symbol: "E".to_string(),
        };
        for (left, rights) in rules {
            g.non_terminals.push(left.to_string());
            g.productions.insert(
                left.to_string(),
                rights
                    .into_iter()
                    .map(|right| Production::new(left, right))
                    .collect(),
            );
        }
        g
    }

    pub fn start_symbol(&self) -> &str {
        self.start_symbol.as_str()
    }

    pub fn non_terminal_iter(&self) -> impl Iterator<Item = &str> {
        self.non_terminals.iter().map(|s| s.as_str())
    }

    pub fn terminal_iter(&self) -> impl Iterator<Item = &str> {
        self.terminals.iter().map(|s| s.as_str())
    }

    pub fn productions(&self, non_terminal: &str) -> &[Production] {
        self.productions
            .get(non_terminal)
            .map(|p| p.as_slice())
            .unwrap_or(&[])
    }

    /// Every non-terminal with its alternatives, in declaration order.
    pub fn rule_iter(&self) -> impl Iterator<Item = (&str, &[Production])> {
        self.non_terminal_iter()
            .map(move |nt| (nt, self.productions(nt)))
    }

    pub fn is_terminal(&self, name: &str) -> bool {
        self.terminals.iter().any(|t| t == name)
    }

    pub fn is_non_terminal(&self, name: &str) -> bool {
        self.productions.contains_key(name)
    }
}

/// Collects declarations and productions by name, then resolves and checks
/// them all at once in [`GrammarBuilder::build`].
#[derive(Debug, Clone, Default)]
pub struct GrammarBuilder {
    non_terminals: Vec<String>,
    terminals: Vec<String>,
    raw_productions: Vec<(String, Vec<String>)>,
    start_symbol: Option<String>,
}

impl GrammarBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn non_terminal(&mut self, name: &str) -> &mut Self {
        if !self.non_terminals.iter().any(|nt| nt == name) {
            self.non_terminals.push(name.to_string());
        }
        self
    }

    pub fn terminal(&mut self, name: &str) -> &mut Self {
        if !self.terminals.iter().any(|t| t == name) {
            self.terminals.push(name.to_string());
        }
        self
    }

    pub fn production(&mut self, left: &str, right: &[&str]) -> &mut Self {
        self.raw_productions.push((
            left.to_string(),
            right.iter().map(|s| s.to_string()).collect(),
        ));
        self
    }

    /// Defaults to the first declared non-terminal.
    pub fn start(&mut self, name: &str) -> &mut Self {
        self.start_symbol = Some(name.to_string());
        self
    }

    pub fn build(&self) -> Result<Grammar> {
        let terminal_set: HashSet<&str> = self.terminals.iter().map(|s| s.as_str()).collect();
        let non_terminal_set: HashSet<&str> =
            self.non_terminals.iter().map(|s| s.as_str()).collect();

        if let Some(name) = self
            .non_terminals
            .iter()
            .find(|nt| terminal_set.contains(nt.as_str()))
        {
            return Err(Error::DuplicateSymbol(name.clone()));
        }
        if let Some(name) = self
            .non_terminals
            .iter()
            .chain(self.terminals.iter())
            .find(|s| s.as_str() == EPSILON || s.as_str() == END_MARK)
        {
            return Err(Error::DuplicateSymbol(name.clone()));
        }

        let start_symbol = match &self.start_symbol {
            Some(name) => name.clone(),
            None => self.non_terminals.first().cloned().ok_or(Error::EmptyGrammar)?,
        };
        if !non_terminal_set.contains(start_symbol.as_str()) {
            return Err(Error::UnknownStartSymbol(start_symbol));
        }

        let mut productions: HashMap<String, Vec<Production>> = HashMap::new();
        for (left, right) in &self.raw_productions {
            let rule = format!("{} -> {}", left, right.join(" "));
            if !non_terminal_set.contains(left.as_str()) {
                return Err(Error::UndeclaredSymbol {
                    rule,
                    symbol: left.clone(),
                });
            }

            let mut symbols = Vec::with_capacity(right.len());
            for name in right {
                let symbol = if terminal_set.contains(name.as_str()) {
                    Symbol::Terminal(name.clone())
                } else if non_terminal_set.contains(name.as_str()) {
                    Symbol::NonTerminal(name.clone())
                } else if name == EPSILON {
                    Symbol::Epsilon
                } else {
                    return Err(Error::UndeclaredSymbol {
                        rule,
                        symbol: name.clone(),
                    });
                };
                symbols.push(symbol);
            }
            if symbols.len() > 1 && symbols.contains(&Symbol::Epsilon) {
                return Err(Error::EpsilonNotAlone(rule));
            }

            productions
                .entry(left.clone())
                .or_default()
                .push(Production::new(left, symbols));
        }

        if let Some(nt) = self
            .non_terminals
            .iter()
            .find(|nt| !productions.contains_key(nt.as_str()))
        {
            return Err(Error::NoProductions(nt.clone()));
        }

        Ok(Grammar {
            non_terminals: self.non_terminals.clone(),
            terminals: self.terminals.clone(),
            productions,
            start_symbol,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn arithmetic_builder() -> GrammarBuilder {
        let mut b = GrammarBuilder::new();
        for nt in ["E", "E'", "T", "T'", "F"] {
            b.non_terminal(nt);
        }
        for t in [NUM, ID, PLUS, MINUS, MUL, DIV, MOD, LPAREN, RPAREN] {
            b.terminal(t);
        }
        b.production("E", &["T", "E'"])
            .production("E'", &[PLUS, "T", "E'"])
            .production("E'", &[MINUS, "T", "E'"])
            .production("E'", &[EPSILON])
            .production("T", &["F", "T'"])
            .production("T'", &[MUL, "F", "T'"])
            .production("T'", &[DIV, "F", "T'"])
            .production("T'", &[MOD, "F", "T'"])
            .production("T'", &[EPSILON])
            .production("F", &[LPAREN, "E", RPAREN])
            .production("F", &[NUM])
            .production("F", &[ID]);
        b
    }

    #[test]
    fn builder_matches_fixed_grammar() {
        assert_eq!(arithmetic_builder().build().unwrap(), Grammar::arithmetic());
    }

    #[test]
    fn fixed_grammar_shape() {
        let g = Grammar::arithmetic();
        assert_eq!(g.start_symbol(), "E");
        assert_eq!(
            g.non_terminal_iter().collect::<Vec<_>>(),
            vec!["E", "E'", "T", "T'", "F"]
        );
        assert_eq!(g.terminal_iter().count(), 9);
        assert_eq!(g.productions("T'").len(), 4);
        assert!(g.productions("T'")[3].is_epsilon());
        assert_eq!(g.productions("F")[0].to_string(), "F -> LPAREN E RPAREN");
        assert!(g.productions("X").is_empty());
    }

    #[test]
    fn undeclared_symbol_is_rejected() {
        let mut b = arithmetic_builder();
        b.production("F", &["POW"]);
        match b.build() {
            Err(Error::UndeclaredSymbol { symbol, .. }) => assert_eq!(symbol, "POW"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn undeclared_left_side_is_rejected() {
        let mut b = arithmetic_builder();
        b.production("G", &[NUM]);
        assert!(matches!(b.build(), Err(Error::UndeclaredSymbol { .. })));
    }

    #[test]
    fn unknown_start_symbol_is_rejected() {
        let mut b = arithmetic_builder();
        b.start("S");
        assert!(matches!(b.build(), Err(Error::UnknownStartSymbol(s)) if s == "S"));
    }

    #[test]
    fn epsilon_must_stand_alone() {
        let mut b = arithmetic_builder();
        b.production("F", &[EPSILON, NUM]);
        assert!(matches!(b.build(), Err(Error::EpsilonNotAlone(_))));
    }

    #[test]
    fn non_terminal_without_productions() {
        let mut b = arithmetic_builder();
        b.non_terminal("G");
        assert!(matches!(b.build(), Err(Error::NoProductions(s)) if s == "G"));
    }

    #[test]
    fn terminal_and_non_terminal_must_be_disjoint() {
        let mut b = arithmetic_builder();
        b.terminal("E");
        assert!(matches!(b.build(), Err(Error::DuplicateSymbol(s)) if s == "E"));
    }

    #[test]
    fn empty_grammar() {
        assert!(matches!(GrammarBuilder::new().build(), Err(Error::EmptyGrammar)));
    }

    #[test]
    fn symbol_names() {
        assert_eq!(Symbol::Epsilon.to_string(), EPSILON);
        assert_eq!(Symbol::EndOfInput.to_string(), END_MARK);
        assert!(Symbol::EndOfInput.is_input());
        assert!(!Symbol::non_terminal("E").is_input());
        assert_eq!(
            serde_json::to_string(&Symbol::terminal(NUM)).unwrap(),
            "\"NUM\""
        );
    }
}
