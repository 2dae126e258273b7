extern crate wasm_bindgen;

use serde_json::json;
use wasm_bindgen::prelude::*;

pub mod analysis;
pub mod error;
pub mod grammar;
pub mod lexer;
pub mod parser;

pub use analysis::Analysis;
pub use error::{Error, Result};
pub use grammar::Grammar;
pub use parser::{parse, ParseReport, Verdict};

fn error_json(e: &Error) -> String {
    json!({ "error": e.to_string() }).to_string()
}

/// Nullable, FIRST, FOLLOW and the LL(1) table of a grammar in arrow
/// notation; the arithmetic grammar when `grammar` is blank.
#[wasm_bindgen]
pub fn analyze_to_json(grammar: &str) -> String {
    let g = if grammar.trim().is_empty() {
        Ok(Grammar::arithmetic())
    } else {
        Grammar::parse(grammar)
    };
    match g {
        Ok(g) => {
            let analysis = Analysis::new(g);
            let g = analysis.grammar();
            json!({
                "grammar": g.to_production_output_vec(),
                "nff": g.to_non_terminal_output_vec(analysis.first_sets(), analysis.follow_sets()),
                "table": analysis.table(),
                "conflicts": analysis.table().conflicts(),
            })
            .to_string()
        }
        Err(e) => error_json(&e),
    }
}

/// Parses an arithmetic expression and returns the verdict with its trace.
#[wasm_bindgen]
pub fn parse_to_json(input: &str) -> String {
    let report = Analysis::arithmetic().parse_str(input);
    match serde_json::to_string(&report) {
        Ok(s) => s,
        Err(e) => error_json(&Error::from(e)),
    }
}


/// A method-per-non-terminal recognizer for the arithmetic grammar, used only
/// to cross-check the table-driven parser.
#[cfg(test)]
mod oracle_tests {
    use crate::grammar::Symbol;
    use crate::lexer::{Lexer, DIV, ID, LPAREN, MINUS, MOD, MUL, NUM, PLUS, RPAREN};
    use crate::Analysis;

    struct Recognizer {
        tokens: Vec<Symbol>,
        pos: usize,
    }

    impl Recognizer {
        fn accepts(input: &str) -> bool {
            let tokens = match Lexer::new(input).tokenize() {
                Ok(tokens) => tokens.into_iter().map(|t| t.kind).collect(),
                Err(_) => return false,
            };
            let mut r = Recognizer { tokens, pos: 0 };
            r.e() && r.eat(&Symbol::EndOfInput)
        }

        fn peek(&self) -> &Symbol {
            &self.tokens[self.pos.min(self.tokens.len() - 1)]
        }

        fn peek_is(&self, names: &[&str]) -> bool {
            names.iter().any(|n| *self.peek() == Symbol::terminal(n))
        }

        fn eat(&mut self, symbol: &Symbol) -> bool {
            if self.peek() == symbol {
                self.pos += 1;
                true
            } else {
                false
            }
        }

        fn e(&mut self) -> bool {
            self.t() && self.e_prime()
        }

        fn e_prime(&mut self) -> bool {
            while self.peek_is(&[PLUS, MINUS]) {
                self.pos += 1;
                if !self.t() {
                    return false;
                }
            }
            true
        }

        fn t(&mut self) -> bool {
            self.f() && self.t_prime()
        }

        fn t_prime(&mut self) -> bool {
            while self.peek_is(&[MUL, DIV, MOD]) {
                self.pos += 1;
                if !self.f() {
                    return false;
                }
            }
            true
        }

        fn f(&mut self) -> bool {
            if self.peek_is(&[NUM, ID]) {
                self.pos += 1;
                true
            } else if self.eat(&Symbol::terminal(LPAREN)) {
                self.e() && self.eat(&Symbol::terminal(RPAREN))
            } else {
                false
            }
        }
    }

    #[test]
    fn table_parser_agrees_with_recursive_descent() {
        let analysis = Analysis::arithmetic();
        let inputs = [
            "(a + 100) * 2 % 5 - b / 3",
            "a + * 5",
            "(1 + 2",
            "1 + 2)",
            "",
            "x",
            "((((y))))",
            "a b",
            "-1",
            "1 - - 2",
            "a % (b / (c * d)) + e - f",
            "()",
            "a +",
            "valor1 + 100 * 2 % 5 - otra_variable / 3",
            "3.5 * (x_1 - 2)",
            "a # b",
        ];
        for input in inputs {
            assert_eq!(
                analysis.parse_str(input).is_accepted(),
                Recognizer::accepts(input),
                "{:?}",
                input
            );
        }
    }
}
