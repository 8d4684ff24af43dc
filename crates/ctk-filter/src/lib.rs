//! ctk output filter: four ordered phases over a fully captured buffer.
//!
//! Phases:
//! 1. Preprocess (ANSI/control stripping, decoration removal, whitespace)
//! 2. Skip (per-category noise lines)
//! 3. Compact (per-category restructuring)
//! 4. Dedup (streak collapse of similar consecutive lines)
//!
//! An unrecognized command only gets phase 1.

pub mod compact_git;
pub mod compact_tests;
pub mod phase1_preprocess;
pub mod phase2_skip;
pub mod phase3_compact;
pub mod phase4_dedup;
pub mod pipeline;

pub use pipeline::{FilterPipeline, FilterResult, Phase, PhaseOutcome, PhaseReport, PhaseStatus};
