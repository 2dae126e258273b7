use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use log::info;
use serde::Serialize;

use crate::error::Result;
use crate::grammar::{
    ll1_parsing_table::ParseTable,
    nullable_first_follow::{FirstSets, FollowSets},
    Grammar,
};
use crate::lexer::{Lexer, TokenSource};
use crate::parser::{self, ParseReport};

/// A grammar together with everything computed from it. Built once and
/// shared read-only by any number of parses.
#[derive(Debug, Clone)]
pub struct Analysis {
    grammar: Grammar,
    first: FirstSets,
    follow: FollowSets,
    table: ParseTable,
}

impl Analysis {
    pub fn new(grammar: Grammar) -> Self {
        let first = grammar.calculate_first_sets();
        let follow = grammar.calculate_follow_sets(&first);
        let table = grammar.build_ll1_table(&first, &follow);
        Self {
            grammar,
            first,
            follow,
            table,
        }
    }

    pub fn arithmetic() -> Self {
        Self::new(Grammar::arithmetic())
    }

    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    pub fn first_sets(&self) -> &FirstSets {
        &self.first
    }

    pub fn follow_sets(&self) -> &FollowSets {
        &self.follow
    }

    pub fn table(&self) -> &ParseTable {
        &self.table
    }

    pub fn parse(&self, source: &mut impl TokenSource) -> ParseReport {
        parser::parse(&self.table, source, self.grammar.start_symbol())
    }

    pub fn parse_str(&self, input: &str) -> ParseReport {
        self.parse(&mut Lexer::new(input))
    }

    /// Writes `grammar.json`, `first.json`, `follow.json` and `table.json`
    /// into `dir`, creating it if needed.
    pub fn persist(&self, dir: &Path) -> Result<()> {
        std::fs::create_dir_all(dir)?;
        write_json(&dir.join("grammar.json"), &self.grammar.to_production_output_vec())?;
        write_json(&dir.join("first.json"), &self.first)?;
        write_json(&dir.join("follow.json"), &self.follow)?;
        write_json(&dir.join("table.json"), &self.table)?;
        Ok(())
    }
}

fn write_json(path: &Path, value: &impl Serialize) -> Result<()> {
    info!("writing {}", path.display());
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, value)?;
    Ok(())
}
