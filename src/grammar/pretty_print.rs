use std::collections::{BTreeSet, HashSet};

use crowbook_text_processing::escape;
use serde::{Serialize, Serializer};

use super::{
    grammar::{Production, Symbol},
    nullable_first_follow::{FirstSets, FollowSets},
    Grammar, EPSILON,
};

#[derive(Debug, Clone)]
pub struct ProductionOutput<'a> {
    pub left: &'a str,
    pub rights: Vec<Vec<&'a str>>,
}

fn right_names(production: &Production) -> Vec<&str> {
    if production.right.is_empty() {
        vec![EPSILON]
    } else {
        production.right_names()
    }
}

impl<'a> From<&'a Production> for ProductionOutput<'a> {
    fn from(production: &'a Production) -> Self {
        Self {
            left: production.left.as_str(),
            rights: vec![right_names(production)],
        }
    }
}

impl ProductionOutput<'_> {
    pub fn to_plaintext(&self, left_width: usize, multiline: bool) -> String {
        self.rights
            .iter()
            .map(|right| right.join(" "))
            .enumerate()
            .map(|(i, right)| {
                if i == 0 {
                    format!("{:>width$} -> {}", self.left, right, width = left_width)
                } else if multiline {
                    format!("{:>width$}  | {}", "", right, width = left_width)
                } else {
                    format!(" | {}", right)
                }
            })
            .collect::<Vec<_>>()
            .join(if multiline { "\n" } else { "" })
    }

    pub fn to_latex(&self, and_sign: bool, terminal_set: &HashSet<&str>) -> String {
        if self.rights.is_empty() {
            return String::new();
        }

        let left = if and_sign {
            format!("{} & \\rightarrow &", escape::tex(self.left))
        } else {
            format!("{} \\rightarrow ", escape::tex(self.left))
        };
        let right = self
            .rights
            .iter()
            .map(|right| {
                right
                    .iter()
                    .map(|s| {
                        if terminal_set.contains(s) {
                            format!("\\text{{{}}}", escape::tex(*s))
                        } else {
                            escape::tex(*s).to_string()
                        }
                    })
                    .collect::<Vec<_>>()
                    .join(" \\ ")
            })
            .collect::<Vec<_>>()
            .join(" \\mid ");

        let output = left + &right;
        output.replace(EPSILON, "\\epsilon")
    }
}

pub struct ProductionOutputVec<'a> {
    productions: Vec<ProductionOutput<'a>>,
    terminal_set: HashSet<&'a str>,
}

impl ProductionOutputVec<'_> {
    pub fn to_plaintext(&self) -> String {
        let left_max_len = self
            .productions
            .iter()
            .map(|p| p.left.len())
            .max()
            .unwrap_or(0);
        self.productions
            .iter()
            .map(|s| s.to_plaintext(left_max_len, true))
            .collect::<Vec<String>>()
            .join("\n")
    }

    pub fn to_latex(&self) -> String {
        std::iter::once("\\[\\begin{array}{cll}".to_string())
            .chain(
                self.productions
                    .iter()
                    .map(|s| s.to_latex(true, &self.terminal_set)),
            )
            .chain(std::iter::once("\\end{array}\\]".to_string()))
            .collect::<Vec<String>>()
            .join("\\\\\n")
    }
}

/// Exported as `{non_terminal: [[symbol...], ...]}` in declaration order.
impl Serialize for ProductionOutputVec<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.productions.iter().map(|p| (p.left, &p.rights)))
    }
}

impl Grammar {
    pub fn to_production_output_vec(&self) -> ProductionOutputVec {
        let productions = self
            .rule_iter()
            .map(|(left, productions)| ProductionOutput {
                left,
                rights: productions.iter().map(right_names).collect(),
            })
            .collect();
        ProductionOutputVec {
            productions,
            terminal_set: self.terminal_iter().collect(),
        }
    }
}

#[derive(Serialize)]
struct NonTerminalOutput<'a> {
    name: &'a str,
    nullable: bool,
    first: Vec<&'a str>,
    follow: Vec<&'a str>,
}

impl NonTerminalOutput<'_> {
    fn to_plaintext(&self, name_width: usize) -> String {
        format!(
            "{:<width$} | {:<5} | {} | {}",
            self.name,
            self.nullable,
            self.first.join(", "),
            self.follow.join(", "),
            width = name_width
        )
    }

    fn to_latex(&self) -> String {
        fn f(a: &[&str]) -> String {
            a.iter()
                .map(|s| escape::tex(*s))
                .collect::<Vec<_>>()
                .join(r"\ ")
                .replace(EPSILON, r"$\epsilon$")
        }

        format!(
            "{} & {} & {} & {}",
            escape::tex(self.name),
            self.nullable,
            f(&self.first),
            f(&self.follow)
        )
    }
}

#[derive(Serialize)]
pub struct NonTerminalOutputVec<'a> {
    data: Vec<NonTerminalOutput<'a>>,
}

impl NonTerminalOutputVec<'_> {
    pub fn to_plaintext(&self) -> String {
        let width = self.data.iter().map(|s| s.name.len()).max().unwrap_or(0);
        self.data
            .iter()
            .map(|s| s.to_plaintext(width))
            .collect::<Vec<String>>()
            .join("\n")
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn to_latex(&self) -> String {
        let content = self
            .data
            .iter()
            .map(|e| e.to_latex())
            .collect::<Vec<_>>()
            .join("\\\\\n ");

        "\\begin{tabular}{c|c|c|c}\n".to_string()
            + "Symbol & Nullable & First & Follow\\\\\\hline\n"
            + &content
            + "\\\\\n\\end{tabular}"
    }
}

impl Grammar {
    pub fn to_non_terminal_output_vec<'a>(
        &'a self,
        first: &'a FirstSets,
        follow: &'a FollowSets,
    ) -> NonTerminalOutputVec<'a> {
        let names = |set: Option<&'a BTreeSet<Symbol>>| -> Vec<&'a str> {
            set.into_iter().flatten().map(|s| s.name()).collect()
        };

        let data = self
            .non_terminal_iter()
            .map(|name| NonTerminalOutput {
                name,
                nullable: first.is_nullable(name),
                first: names(first.get(name)),
                follow: names(follow.get(name)),
            })
            .collect();
        NonTerminalOutputVec { data }
    }
}

/// One named set per non-terminal, for the separate FIRST and FOLLOW views.
pub fn sets_to_plaintext<'a>(
    sets: impl Iterator<Item = (&'a str, &'a BTreeSet<Symbol>)>,
    title: &str,
) -> String {
    let sets: Vec<_> = sets.collect();
    let width = sets.iter().map(|(name, _)| name.len()).max().unwrap_or(0);
    sets.iter()
        .map(|(name, set)| {
            format!(
                "{}({:<width$}) = {{ {} }}",
                title,
                name,
                set.iter().map(|s| s.name()).collect::<Vec<_>>().join(", "),
                width = width
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
