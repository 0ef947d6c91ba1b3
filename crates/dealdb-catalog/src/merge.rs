use std::collections::HashSet;

use dealdb_core::ProductRecord;

/// Result of merging per-source product lists.
#[derive(Debug, Default)]
pub struct MergeOutcome {
    pub products: Vec<ProductRecord>,
    /// Records discarded because an earlier record had the same item name.
    pub duplicates_dropped: usize,
}

/// Concatenates `lists` in the order given and keeps the first record seen
/// for each item name.
///
/// Callers pass lists in source-registration order, never completion order,
/// so the winner of a name collision does not depend on network timing.
/// Prices are not compared: a later, cheaper duplicate is still dropped.
pub fn merge_sources<I>(lists: I) -> MergeOutcome
where
    I: IntoIterator<Item = Vec<ProductRecord>>,
{
    let mut seen: HashSet<String> = HashSet::new();
    let mut outcome = MergeOutcome::default();

    for record in lists.into_iter().flatten() {
        if seen.contains(&record.item_name) {
            outcome.duplicates_dropped += 1;
            continue;
        }
        seen.insert(record.item_name.clone());
        outcome.products.push(record);
    }

    outcome
}
