use crate::core::model::ResultEntry;
use std::cmp::Ordering;

fn by_count_desc(a: &ResultEntry, b: &ResultEntry) -> Ordering {
    b.count
        .cmp(&a.count)
        .then_with(|| a.position.cmp(&b.position))
}

/// Sorts entries by descending count; equal counts keep ascending position.
pub fn rank(entries: &mut [ResultEntry]) {
    entries.sort_unstable_by(by_count_desc);
}
