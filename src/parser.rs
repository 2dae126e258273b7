//! Table-driven predictive parser.
//!
//! The derivation is simulated on an explicit stack: `$` at the bottom, the
//! start symbol on top. Terminals on top are matched against the lookahead,
//! non-terminals are replaced by the right side chosen from the table.

use std::fmt;

use crowbook_text_processing::escape;
use log::trace;
use serde::{Serialize, Serializer};

use crate::error::{Error, Result};
use crate::grammar::{ll1_parsing_table::ParseTable, Production, Symbol};
use crate::lexer::{Token, TokenSource};

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Match(Symbol),
    Apply(Production),
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Match(symbol) => write!(f, "Match: {}", symbol),
            Action::Apply(production) => write!(f, "Rule: {}", production),
        }
    }
}

impl Serialize for Action {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// State before one step: the stack (bottom first), the lookahead and what
/// was done with them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraceStep {
    pub stack: Vec<Symbol>,
    pub lookahead: Symbol,
    pub action: Action,
}

#[derive(Debug)]
pub enum Verdict {
    Accepted,
    Rejected(Error),
}

#[derive(Debug)]
pub struct ParseReport {
    pub trace: Vec<TraceStep>,
    pub verdict: Verdict,
}

impl ParseReport {
    pub fn is_accepted(&self) -> bool {
        matches!(self.verdict, Verdict::Accepted)
    }

    pub fn error(&self) -> Option<&Error> {
        match &self.verdict {
            Verdict::Accepted => None,
            Verdict::Rejected(e) => Some(e),
        }
    }

    pub fn into_result(self) -> Result<Vec<TraceStep>> {
        match self.verdict {
            Verdict::Accepted => Ok(self.trace),
            Verdict::Rejected(e) => Err(e),
        }
    }

    pub fn to_plaintext(&self) -> String {
        let stacks: Vec<String> = self
            .trace
            .iter()
            .map(|step| {
                step.stack
                    .iter()
                    .map(|s| s.name())
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect();
        let width = stacks.iter().map(|s| s.len()).max().unwrap_or(0).max(5);

        let mut lines = vec![format!(
            "{:<width$} | {:<9} | ACTION",
            "STACK",
            "LOOKAHEAD",
            width = width
        )];
        lines.push("-".repeat(width + 22));
        for (stack, step) in stacks.iter().zip(self.trace.iter()) {
            lines.push(format!(
                "{:<width$} | {:<9} | {}",
                stack,
                step.lookahead.name(),
                step.action,
                width = width
            ));
        }
        lines.push(match &self.verdict {
            Verdict::Accepted => "accepted".to_string(),
            Verdict::Rejected(e) => format!("rejected: {}", e),
        });
        lines.join("\n")
    }

    pub fn to_latex(&self) -> String {
        let content = self
            .trace
            .iter()
            .map(|step| {
                format!(
                    "{} & {} & {}",
                    step.stack
                        .iter()
                        .map(|s| escape::tex(s.name()))
                        .collect::<Vec<_>>()
                        .join(r"\ "),
                    escape::tex(step.lookahead.name()),
                    escape::tex(step.action.to_string())
                )
            })
            .collect::<Vec<_>>()
            .join("\\\\\n");

        "\\begin{tabular}{l|l|l}\n".to_string()
            + "Stack & Lookahead & Action\\\\\\hline\n"
            + &content
            + "\\\\\n\\end{tabular}"
    }
}

#[derive(Serialize)]
struct ParseReportOutput<'a> {
    accepted: bool,
    error: Option<String>,
    trace: &'a [TraceStep],
}

impl Serialize for ParseReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        ParseReportOutput {
            accepted: self.is_accepted(),
            error: self.error().map(|e| e.to_string()),
            trace: &self.trace,
        }
        .serialize(serializer)
    }
}

/// The mutable part of one parse.
#[derive(Debug)]
pub struct ParserState {
    stack: Vec<Symbol>,
    lookahead: Token,
}

impl ParserState {
    pub fn new(start_symbol: &str, lookahead: Token) -> Self {
        Self {
            stack: vec![Symbol::EndOfInput, Symbol::non_terminal(start_symbol)],
            lookahead,
        }
    }

    pub fn stack(&self) -> &[Symbol] {
        &self.stack
    }

    pub fn lookahead(&self) -> &Token {
        &self.lookahead
    }

    pub fn is_done(&self) -> bool {
        self.stack.is_empty()
    }

    /// Performs one match or expansion. A terminal is only consumed from
    /// `source` while `$` has not been matched yet.
    pub fn step(
        &mut self,
        table: &ParseTable,
        source: &mut impl TokenSource,
    ) -> Result<TraceStep> {
        let top = match self.stack.last() {
            Some(top) => top.clone(),
            None => {
                return Err(Error::UnexpectedSymbol {
                    expected: Symbol::EndOfInput,
                    found: self.lookahead.kind.clone(),
                })
            }
        };
        let lookahead = self.lookahead.kind.clone();

        let action = match &top {
            Symbol::Terminal(_) | Symbol::EndOfInput => {
                if top != lookahead {
                    return Err(Error::UnexpectedSymbol {
                        expected: top.clone(),
                        found: lookahead,
                    });
                }
                Action::Match(top.clone())
            }
            Symbol::NonTerminal(name) => match table.get(name, &lookahead) {
                Some(production) => Action::Apply(production.clone()),
                None => {
                    return Err(Error::NoRule {
                        non_terminal: name.clone(),
                        lookahead,
                    })
                }
            },
            Symbol::Epsilon => return Err(Error::StrayEpsilon),
        };

        let step = TraceStep {
            stack: self.stack.clone(),
            lookahead,
            action,
        };
        trace!("{}", step.action);

        self.stack.pop();
        match &step.action {
            Action::Match(Symbol::EndOfInput) => {}
            Action::Match(_) => self.lookahead = source.next_token()?,
            Action::Apply(production) => {
                if !production.is_epsilon() {
                    self.stack.extend(production.right.iter().rev().cloned());
                }
            }
        }

        Ok(step)
    }
}

/// Runs the parser to completion, stopping at the first error.
pub fn parse(
    table: &ParseTable,
    source: &mut impl TokenSource,
    start_symbol: &str,
) -> ParseReport {
    let mut trace = Vec::new();
    let verdict = match run(table, source, start_symbol, &mut trace) {
        Ok(()) => Verdict::Accepted,
        Err(e) => Verdict::Rejected(e),
    };
    ParseReport { trace, verdict }
}

fn run(
    table: &ParseTable,
    source: &mut impl TokenSource,
    start_symbol: &str,
    trace: &mut Vec<TraceStep>,
) -> Result<()> {
    let mut state = ParserState::new(start_symbol, source.next_token()?);
    while !state.is_done() {
        trace.push(state.step(table, source)?);
    }
    Ok(())
}
