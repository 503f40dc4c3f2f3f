use crate::core::model::ResultEntry;

/// Positions in `[0, max_possible_count)` whose count reaches `min_count`,
/// in ascending position order.
pub fn select(counts: &[u32], max_possible_count: usize, min_count: u32) -> Vec<ResultEntry> {
    let end = max_possible_count.min(counts.len());
    counts[..end]
        .iter()
        .enumerate()
        .filter(|&(_, &count)| count >= min_count && count > 0)
        .map(|(position, &count)| ResultEntry { position, count })
        .collect()
}
