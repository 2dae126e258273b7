use crowbook_text_processing::escape::tex as escape_tex;
use log::warn;
use serde::{Serialize, Serializer};
use std::collections::{BTreeMap, HashSet};

use crate::error::{Error, Result};
use crate::Grammar;

use super::{
    grammar::{Production, Symbol},
    nullable_first_follow::{FirstSets, FollowSets},
    pretty_print::ProductionOutput,
};

/// Two productions of one non-terminal claimed the same cell; `chosen`
/// replaced `previous`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Conflict {
    pub non_terminal: String,
    pub lookahead: Symbol,
    pub previous: Production,
    pub chosen: Production,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParseTable {
    terminals: Vec<Symbol>,
    rows: Vec<(String, BTreeMap<Symbol, Production>)>,
    conflicts: Vec<Conflict>,
}

impl ParseTable {
    pub fn get(&self, non_terminal: &str, lookahead: &Symbol) -> Option<&Production> {
        self.rows
            .iter()
            .find(|(left, _)| left == non_terminal)
            .and_then(|(_, row)| row.get(lookahead))
    }

    /// Columns: the grammar's terminals followed by `$`.
    pub fn terminals(&self) -> &[Symbol] {
        &self.terminals
    }

    pub fn row_iter(&self) -> impl Iterator<Item = (&str, &BTreeMap<Symbol, Production>)> {
        self.rows.iter().map(|(left, row)| (left.as_str(), row))
    }

    pub fn cell_count(&self) -> usize {
        self.rows.iter().map(|(_, row)| row.len()).sum()
    }

    pub fn conflicts(&self) -> &[Conflict] {
        &self.conflicts
    }

    pub fn ensure_ll1(&self) -> Result<()> {
        if self.conflicts.is_empty() {
            Ok(())
        } else {
            Err(Error::NotLL1(self.conflicts.clone()))
        }
    }

    fn insert(&mut self, row: usize, lookahead: &Symbol, production: &Production) {
        let (left, cells) = &mut self.rows[row];
        if let Some(previous) = cells.insert(lookahead.clone(), production.clone()) {
            if previous != *production {
                warn!(
                    "conflict in table [{}, {}]: {} replaced by {}",
                    left, lookahead, previous, production
                );
                self.conflicts.push(Conflict {
                    non_terminal: left.clone(),
                    lookahead: lookahead.clone(),
                    previous,
                    chosen: production.clone(),
                });
            }
        }
    }

    pub fn to_plaintext(&self) -> String {
        let mut header: Vec<String> = vec![String::new()];
        header.extend(self.terminals.iter().map(|t| t.to_string()));
        let mut output: Vec<Vec<String>> = vec![header];
        for (left, row) in &self.rows {
            let mut line: Vec<String> = vec![left.to_string()];
            line.extend(self.terminals.iter().map(|t| match row.get(t) {
                Some(production) => ProductionOutput::from(production).to_plaintext(left.len(), false),
                None => String::new(),
            }));
            output.push(line);
        }

        let width: Vec<usize> = (0..output[0].len())
            .map(|j| output.iter().map(|line| line[j].len()).max().unwrap_or(0))
            .collect();
        output
            .iter()
            .map(|line| {
                line.iter()
                    .enumerate()
                    .map(|(i, s)| format!("{:>width$}", s, width = width[i]))
                    .collect::<Vec<_>>()
                    .join(" | ")
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn to_latex(&self) -> String {
        let mut header: Vec<String> = vec![format!(
            "\\[\\begin{{array}}{{c{}}}\n",
            "|l".repeat(self.terminals.len()),
        )];
        header.extend(
            self.terminals
                .iter()
                .map(|t| format!("\\text{{{}}}", escape_tex(t.name()))),
        );
        let header = header.join(" & ");

        let terminal_set: HashSet<&str> = self.terminals.iter().map(|t| t.name()).collect();
        let mut output: Vec<String> = Vec::new();
        for (left, row) in &self.rows {
            let mut line: Vec<String> = vec![escape_tex(left.as_str()).to_string()];
            line.extend(self.terminals.iter().map(|t| match row.get(t) {
                Some(production) => ProductionOutput::from(production).to_latex(false, &terminal_set),
                None => String::new(),
            }));
            output.push(line.join(" & "));
        }

        let output = output.join("\\\\\n");

        header + "\\\\\\hline\n" + &output + "\n\\end{array}\\]"
    }
}

/// Exported as `{non_terminal: {lookahead: [right side...]}}`.
impl Serialize for ParseTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_map(self.rows.iter().map(|(left, row)| (left, row)))
    }
}

impl Grammar {
    pub fn build_ll1_table(&self, first: &FirstSets, follow: &FollowSets) -> ParseTable {
        let mut terminals: Vec<Symbol> = self.terminal_iter().map(Symbol::terminal).collect();
        terminals.push(Symbol::EndOfInput);

        let mut table = ParseTable {
            terminals,
            rows: self
                .non_terminal_iter()
                .map(|nt| (nt.to_string(), BTreeMap::new()))
                .collect(),
            conflicts: Vec::new(),
        };

        for (row, (left, productions)) in self.rule_iter().enumerate() {
            for production in productions {
                let first_of_production = first.calculate_first_for_sequence(&production.right);

                for lookahead in first_of_production.iter().filter(|s| **s != Symbol::Epsilon) {
                    table.insert(row, lookahead, production);
                }

                if first_of_production.contains(&Symbol::Epsilon) {
                    for lookahead in follow.get(left).into_iter().flatten() {
                        table.insert(row, lookahead, production);
                    }
                }
            }
        }

        table
    }
}
