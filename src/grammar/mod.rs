pub mod grammar;
pub mod ll1_parsing_table;
pub mod nullable_first_follow;
pub mod parse;
pub mod pretty_print;
pub use grammar::{Grammar, GrammarBuilder, Production, Symbol};

pub const EPSILON: &str = "ε";
pub const END_MARK: &str = "$";
