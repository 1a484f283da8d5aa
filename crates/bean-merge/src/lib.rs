//! Rule-driven deep merge for configuration trees.
//!
//! Two JSON trees are combined key by key. At every path the applicable
//! [`Strategy`] is looked up in a [`StrategyTable`]:
//!
//! - `replace`: the right value supersedes the left
//! - `append`: sequences are concatenated, left then right
//! - `merge`: mappings are merged recursively with the same table
//! - `match-then-replace`: sequences of records are paired by a match key
//!
//! Paths with no table entry fall back to `merge` for two mappings and
//! `replace` for everything else.

mod engine;
mod strategy;

pub use engine::{merge, merge_with_report, MergeOutcome, ShapeMismatch};
pub use strategy::{MatchRule, PathPattern, Strategy, StrategyTable};
