use thiserror::Error;

use crate::grammar::{ll1_parsing_table::Conflict, Symbol};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("rule {rule} uses undeclared symbol \"{symbol}\"")]
    UndeclaredSymbol { rule: String, symbol: String },

    #[error("grammar has no non-terminals")]
    EmptyGrammar,

    #[error("start symbol \"{0}\" is not a declared non-terminal")]
    UnknownStartSymbol(String),

    #[error("no productions found for non-terminal \"{0}\"")]
    NoProductions(String),

    #[error("rule {0}: ε-productions may not contain other symbols")]
    EpsilonNotAlone(String),

    #[error("\"{0}\" is declared both as terminal and non-terminal")]
    DuplicateSymbol(String),

    #[error("line {line}: {message}")]
    GrammarText { line: usize, message: String },

    #[error("lexical error at {position}: unexpected character '{character}'")]
    Lexical { position: usize, character: char },

    #[error("lexical error at {position}: invalid number \"{text}\"")]
    InvalidNumber { position: usize, text: String },

    #[error("syntax error: expected {expected}, found {found}")]
    UnexpectedSymbol { expected: Symbol, found: Symbol },

    #[error("syntax error: no rule for [{non_terminal}, {lookahead}]")]
    NoRule { non_terminal: String, lookahead: Symbol },

    #[error("syntax error: ε on the parse stack")]
    StrayEpsilon,

    #[error("grammar is not LL(1): {} conflicting cell(s)", .0.len())]
    NotLL1(Vec<Conflict>),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Whether the error is a parse-time rejection of the input.
    pub fn is_syntax_error(&self) -> bool {
        matches!(
            self,
            Error::UnexpectedSymbol { .. } | Error::NoRule { .. } | Error::StrayEpsilon
        )
    }
}
