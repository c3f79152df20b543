//! Language-identification heuristics (C2).

pub mod heuristics;

pub use heuristics::{correct, score, table, LangEntry, LanguageHeuristicTable, ScoreResult};
