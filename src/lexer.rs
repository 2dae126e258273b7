use std::iter::Peekable;
use std::str::CharIndices;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::grammar::Symbol;

pub const NUM: &str = "NUM";
pub const ID: &str = "ID";
pub const PLUS: &str = "PLUS";
pub const MINUS: &str = "MINUS";
pub const MUL: &str = "MUL";
pub const DIV: &str = "DIV";
pub const MOD: &str = "MOD";
pub const LPAREN: &str = "LPAREN";
pub const RPAREN: &str = "RPAREN";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Literal {
    Num(f64),
    Id(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Token {
    /// A terminal, or [`Symbol::EndOfInput`] for the final token.
    pub kind: Symbol,
    pub value: Option<Literal>,
    pub position: usize,
}

impl Token {
    pub fn new(kind: Symbol, position: usize) -> Self {
        Self {
            kind,
            value: None,
            position,
        }
    }

    pub fn end(position: usize) -> Self {
        Self::new(Symbol::EndOfInput, position)
    }
}

/// Pull-based supply of tokens for the parser. A source is finite and ends
/// with exactly one end-of-input token.
pub trait TokenSource {
    fn next_token(&mut self) -> Result<Token>;
}

/// A pre-tokenized stream; yields end-of-input once the tokens run out.
impl TokenSource for std::vec::IntoIter<Token> {
    fn next_token(&mut self) -> Result<Token> {
        Ok(self.next().unwrap_or_else(|| Token::end(0)))
    }
}

/// Tokenizer for arithmetic expressions.
pub struct Lexer<'a> {
    input: &'a str,
    chars: Peekable<CharIndices<'a>>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.char_indices().peekable(),
        }
    }

    fn take_while(&mut self, start: usize, f: impl Fn(char) -> bool) -> &'a str {
        let input = self.input;
        let mut end = start;
        while let Some(&(i, c)) = self.chars.peek() {
            if !f(c) {
                break;
            }
            end = i + c.len_utf8();
            self.chars.next();
        }
        &input[start..end]
    }

    /// Lexes the whole input, including the trailing end-of-input token.
    pub fn tokenize(mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token.kind == Symbol::EndOfInput;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }
}

impl TokenSource for Lexer<'_> {
    fn next_token(&mut self) -> Result<Token> {
        while let Some(&(position, c)) = self.chars.peek() {
            if c.is_whitespace() {
                self.chars.next();
                continue;
            }

            if c.is_alphabetic() || c == '_' {
                let text = self.take_while(position, |c| c.is_alphanumeric() || c == '_');
                return Ok(Token {
                    kind: Symbol::terminal(ID),
                    value: Some(Literal::Id(text.to_string())),
                    position,
                });
            }

            if c.is_ascii_digit() {
                let text = self.take_while(position, |c| c.is_ascii_digit() || c == '.');
                let value = text.parse::<f64>().map_err(|_| Error::InvalidNumber {
                    position,
                    text: text.to_string(),
                })?;
                return Ok(Token {
                    kind: Symbol::terminal(NUM),
                    value: Some(Literal::Num(value)),
                    position,
                });
            }

            let kind = match c {
                '+' => PLUS,
                '-' => MINUS,
                '*' => MUL,
                '/' => DIV,
                '%' => MOD,
                '(' => LPAREN,
                ')' => RPAREN,
                _ => {
                    return Err(Error::Lexical {
                        position,
                        character: c,
                    })
                }
            };
            self.chars.next();
            return Ok(Token::new(Symbol::terminal(kind), position));
        }

        Ok(Token::end(self.input.len()))
    }
}
