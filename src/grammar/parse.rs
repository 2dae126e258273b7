use crate::error::{Error, Result};
use crate::Grammar;

use super::{GrammarBuilder, END_MARK, EPSILON};

fn text_error(line: usize, message: &str) -> Error {
    Error::GrammarText {
        line,
        message: message.to_string(),
    }
}

impl Grammar {
    /// Reads a grammar written as `A -> x B | ε`, with `| ...` continuation
    /// lines. Names on a left side are non-terminals, every other name is a
    /// terminal, and the first left side is the start symbol.
    pub fn parse(grammar: &str) -> Result<Self> {
        let mut b = GrammarBuilder::new();

        let mut raw_productions: Vec<(usize, &str, &str)> = Vec::new();

        let mut previous_left: Option<&str> = None;
        for (i, line) in grammar.lines().enumerate() {
            if line.chars().all(|c| c.is_whitespace()) {
                continue;
            }
            let parts: Vec<&str> = line.split("->").collect();
            if parts.len() > 2 {
                return Err(text_error(i + 1, "too many \"->\""));
            }
            let (left, rights): (&str, &str) = if parts.len() == 2 {
                let left = parts[0].trim();
                if left.is_empty() {
                    return Err(text_error(i + 1, "empty left side"));
                } else if left.split_whitespace().count() != 1 {
                    return Err(text_error(i + 1, "left side contains whitespace"));
                }
                b.non_terminal(left);
                (left, parts[1].trim())
            } else {
                match (previous_left, parts[0].trim().strip_prefix('|')) {
                    (Some(left), Some(rights)) => (left, rights.trim()),
                    (None, _) => return Err(text_error(i + 1, "cannot find left side")),
                    (Some(_), None) => {
                        return Err(text_error(i + 1, "expected \"->\" or \"|\""))
                    }
                }
            };

            previous_left = Some(left);

            raw_productions.push((i + 1, left, rights));
        }

        let non_terminals: Vec<&str> = raw_productions.iter().map(|(_, left, _)| *left).collect();
        for (line, left, rights) in raw_productions {
            for right in rights.split('|') {
                let mut symbols: Vec<&str> = Vec::new();
                for s in right.split_whitespace() {
                    if s == END_MARK {
                        return Err(text_error(line, "\"$\" is reserved for the end of input"));
                    }
                    if s == EPSILON || s == "epsilon" {
                        symbols.push(EPSILON);
                        continue;
                    }
                    if !non_terminals.contains(&s) {
                        b.terminal(s);
                    }
                    symbols.push(s);
                }
                b.production(left, &symbols);
            }
        }

        b.build()
    }
}

#[cfg(test)]
mod tests {
    use crate::error::Error;
    use crate::grammar::{Grammar, Symbol};
    use pretty_assertions::assert_eq;

    const ARITHMETIC: &str = "
E  -> T E'
E' -> PLUS T E'
    | MINUS T E'
    | ε
T  -> F T'
T' -> MUL F T' | DIV F T' | MOD F T' | epsilon
F  -> LPAREN E RPAREN | NUM | ID
";

    #[test]
    fn reads_arithmetic_grammar() {
        let g = Grammar::parse(ARITHMETIC).unwrap();
        assert_eq!(g.start_symbol(), "E");
        assert_eq!(
            g.non_terminal_iter().collect::<Vec<_>>(),
            vec!["E", "E'", "T", "T'", "F"]
        );
        let mut terminals: Vec<&str> = g.terminal_iter().collect();
        terminals.sort();
        assert_eq!(
            terminals,
            vec!["DIV", "ID", "LPAREN", "MINUS", "MOD", "MUL", "NUM", "PLUS", "RPAREN"]
        );
        for nt in g.non_terminal_iter() {
            assert_eq!(g.productions(nt), Grammar::arithmetic().productions(nt));
        }
    }

    #[test]
    fn simple_parse_with_space() {
        let g = Grammar::parse("  S -> a ").unwrap();
        assert_eq!(g.productions("S")[0].right, vec![Symbol::terminal("a")]);
    }

    #[test]
    fn left_side_used_before_definition() {
        let g = Grammar::parse("S -> A b\nA -> a").unwrap();
        assert_eq!(
            g.productions("S")[0].right,
            vec![Symbol::non_terminal("A"), Symbol::terminal("b")]
        );
    }

    #[test]
    fn empty_alternative() {
        let g = Grammar::parse("S -> a S |").unwrap();
        assert!(g.productions("S")[1].right.is_empty());
    }

    fn line_of(text: &str) -> usize {
        match Grammar::parse(text) {
            Err(Error::GrammarText { line, .. }) => line,
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn two_rightarrows_parse() {
        assert_eq!(line_of("S -> a -> b"), 1);
    }

    #[test]
    fn no_left_parse() {
        assert_eq!(line_of("-> a"), 1);
    }

    #[test]
    fn no_previous_left_parse() {
        assert_eq!(line_of("| a b\n S -> a"), 1);
    }

    #[test]
    fn left_contain_space() {
        assert_eq!(line_of("S a S -> x"), 1);
    }

    #[test]
    fn dangling_line() {
        assert_eq!(line_of("S -> a\n\nb c"), 3);
    }

    #[test]
    fn end_mark_is_reserved() {
        assert_eq!(line_of("S -> a $"), 1);
    }

    #[test]
    fn empty_grammar() {
        assert!(matches!(Grammar::parse("  \n  "), Err(Error::EmptyGrammar)));
    }

    #[test]
    fn epsilon_with_other_symbols() {
        assert!(matches!(
            Grammar::parse("S -> a ε"),
            Err(Error::EpsilonNotAlone(_))
        ));
    }
}
