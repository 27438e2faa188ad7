//! Sequential strategy: walk and hash on the calling thread.

use std::path::Path;

use super::aggregator::{Aggregate, HashOutcome};
use super::finder::{FinderError, Phase, StrategyRun};
use crate::scanner::{Hasher, Walker};

pub(crate) fn run(root: &Path, walker: &Walker, hasher: &Hasher) -> Result<StrategyRun, FinderError> {
    Phase::Traversing.enter(root);
    let mut aggregate = Aggregate::default();
    for entry in walker.walk(root) {
        let file = entry?;
        aggregate.record(HashOutcome::compute(hasher, file));
    }

    Phase::Aggregating.enter(root);
    let touched = aggregate.files_hashed() + aggregate.skipped.len();
    Ok(StrategyRun::new(aggregate, usize::from(touched > 0), 0))
}
