use std::collections::BTreeMap;

use crate::model::{ConflictRecord, MergeSummary, OutputBucket, RoutingTally};

/// Compute summary statistics from merged buckets and recorded conflicts.
pub fn compute_summary(
    buckets: &[OutputBucket],
    conflicts: &[ConflictRecord],
    tally: &RoutingTally,
    sources: usize,
) -> MergeSummary {
    let keys_per_bucket: BTreeMap<String, usize> =
        buckets.iter().map(|b| (b.name.clone(), b.len())).collect();

    let mut conflicts_per_bucket: BTreeMap<String, usize> = BTreeMap::new();
    for c in conflicts {
        *conflicts_per_bucket.entry(c.bucket.clone()).or_insert(0) += 1;
    }

    MergeSummary {
        sources,
        total_keys: keys_per_bucket.values().sum(),
        keys_per_bucket,
        conflicts: conflicts.len(),
        conflicts_per_bucket,
        unrouted_keys: tally.unrouted_keys,
        unknown_collections: tally.unknown_collections.iter().cloned().collect(),
        remapped_names: tally.remapped_names,
        unmatched_names: tally.unmatched_names,
    }
}
