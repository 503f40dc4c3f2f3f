pub const MIN_K: usize = 2;
pub const MAX_K: usize = 100;
pub const MAX_SEQUENCE_LEN: usize = 100_000_000;

/// A selected k-mer, identified by its first occurrence in the sequence.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ResultEntry {
    pub position: usize,
    pub count: u32,
}

impl ResultEntry {
    pub fn frequency(&self, max_possible_count: usize) -> f64 {
        self.count as f64 / max_possible_count as f64
    }
}

/// Number of k-length windows in a sequence of `len` bytes.
pub fn max_possible_count(len: usize, k: usize) -> usize {
    (len + 1).saturating_sub(k)
}

/// Absolute count threshold for a frequency fraction, rounded half up and
/// never below 1. A frequency of 0 reports everything.
pub fn min_count(frequency: f64, max_possible_count: usize) -> u32 {
    let mut min = 0u32;
    if frequency > 0.0 {
        min = (frequency * max_possible_count as f64 + 0.5).floor() as u32;
    }
    min.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn windows_per_length() {
        assert_eq!(max_possible_count(10, 3), 8);
        assert_eq!(max_possible_count(4, 4), 1);
        assert_eq!(max_possible_count(2, 3), 0);
    }

    #[test]
    fn threshold_rounds_half_up_and_floors_at_one() {
        assert_eq!(min_count(0.0, 8), 1);
        assert_eq!(min_count(0.5, 8), 4);
        assert_eq!(min_count(1.0, 1), 1);
        assert_eq!(min_count(0.01, 10), 1);
        assert_eq!(min_count(0.25, 10), 3);
        assert_eq!(min_count(1.0, 4), 4);
    }

    #[test]
    fn frequency_is_fraction_of_windows() {
        let e = ResultEntry {
            position: 0,
            count: 2,
        };
        assert_eq!(e.frequency(4), 0.5);
    }
}
