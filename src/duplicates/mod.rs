//! Duplicate detection module.
//!
//! This module provides functionality for:
//! - Running a scan with one of four strategies ([`finder`])
//! - Collecting hash results on a single consumer thread ([`aggregator`])
//! - Digest-keyed grouping and duplicate extraction ([`groups`])

pub mod aggregator;
mod fanout;
pub mod finder;
pub mod groups;
mod multiwalker;
mod pipeline;
mod sequential;

pub use aggregator::{Aggregate, Aggregator, HashOutcome};
pub use finder::{DuplicateFinder, FinderConfig, FinderError, Phase, ScanSummary, Strategy};
pub use groups::{DuplicateGroup, DuplicateGroups, PathDigestPair};
