use std::ops::Range;

/// Polynomial base; prime and larger than the byte alphabet.
pub const BASE: u64 = 257;

/// `BASE^k mod modulus`, the weight of the byte leaving the window.
pub fn top_one(k: usize, mask: u64) -> u64 {
    let mut top = 1u64;
    for _ in 0..k {
        top = top.wrapping_mul(BASE) & mask;
    }
    top
}

/// Direct evaluation of the window hash, `sum(b_i * BASE^(k-1-i)) mod modulus`.
pub fn hash_window(window: &[u8], mask: u64) -> u64 {
    let mut h = 0u64;
    for &b in window {
        h = h.wrapping_mul(BASE).wrapping_add(b as u64) & mask;
    }
    h
}

/// Karp-Rabin hash over every k-length window of a sequence.
///
/// Yields `(position, hash)` in ascending position order. The first window of
/// the range is hashed directly; every later one is rolled in O(1):
///
/// `h' = h * BASE + entering - leaving * BASE^k  (mod modulus)`
///
/// The modulus is a power of two, so wrapping `u64` arithmetic followed by the
/// mask yields the exact residue even when the subtraction underflows.
#[derive(Clone, Debug)]
pub struct RollingHasher<'a> {
    seq: &'a [u8],
    k: usize,
    mask: u64,
    top_one: u64,
    hash: u64,
    next: usize,
    end: usize,
}

impl<'a> RollingHasher<'a> {
    /// Hasher over all `seq.len() - k + 1` windows. `seq.len() >= k` and a
    /// power-of-two `modulus` are the caller's preconditions.
    pub fn new(seq: &'a [u8], k: usize, modulus: u64) -> Self {
        debug_assert!(seq.len() >= k);
        let windows = seq.len() + 1 - k;
        Self::over(seq, k, modulus, 0..windows)
    }

    /// Hasher restricted to window starts in `positions`.
    pub fn over(seq: &'a [u8], k: usize, modulus: u64, positions: Range<usize>) -> Self {
        debug_assert!(modulus.is_power_of_two());
        debug_assert!(positions.end + k <= seq.len() + 1);
        let mask = modulus - 1;
        let hash = if positions.start < positions.end {
            hash_window(&seq[positions.start..positions.start + k], mask)
        } else {
            0
        };
        Self {
            seq,
            k,
            mask,
            top_one: top_one(k, mask),
            hash,
            next: positions.start,
            end: positions.end,
        }
    }
}

impl Iterator for RollingHasher<'_> {
    type Item = (usize, u64);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.end {
            return None;
        }
        let pos = self.next;
        let out = (pos, self.hash);
        self.next += 1;
        if self.next < self.end {
            let entering = self.seq[pos + self.k] as u64;
            let leaving = self.seq[pos] as u64;
            self.hash = self
                .hash
                .wrapping_mul(BASE)
                .wrapping_add(entering)
                .wrapping_sub(leaving.wrapping_mul(self.top_one))
                & self.mask;
        }
        Some(out)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.end.saturating_sub(self.next);
        (n, Some(n))
    }
}

impl ExactSizeIterator for RollingHasher<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn top_one_is_base_power() {
        let mask = (1u64 << 20) - 1;
        assert_eq!(top_one(0, mask), 1);
        assert_eq!(top_one(1, mask), BASE);
        assert_eq!(top_one(2, mask), (BASE * BASE) & mask);
    }

    #[test]
    fn yields_one_hash_per_window() {
        let seq = b"ABCABC";
        let hashes: Vec<_> = RollingHasher::new(seq, 3, 64).collect();
        assert_eq!(hashes.len(), 4);
        assert_eq!(hashes[0].1, hashes[3].1);
        let positions: Vec<usize> = hashes.iter().map(|&(p, _)| p).collect();
        assert_eq!(positions, vec![0, 1, 2, 3]);
    }

    #[test]
    fn single_window_sequence() {
        let mut h = RollingHasher::new(b"AAAA", 4, 16);
        assert_eq!(h.len(), 1);
        assert_eq!(h.next(), Some((0, hash_window(b"AAAA", 15))));
        assert_eq!(h.next(), None);
    }

    #[test]
    fn sub_range_matches_full_pass() {
        let seq = b"the quick brown fox jumps over the lazy dog";
        let full: Vec<_> = RollingHasher::new(seq, 5, 256).collect();
        let part: Vec<_> = RollingHasher::over(seq, 5, 256, 10..20).collect();
        assert_eq!(part, full[10..20].to_vec());
        assert_eq!(RollingHasher::over(seq, 5, 256, 7..7).count(), 0);
    }

    #[test]
    fn underflow_wraps_to_correct_residue() {
        // High leaving byte against low entering byte forces the subtraction below zero.
        let seq = [0xffu8, 0x00, 0x00, 0xff, 0x01, 0x00];
        let modulus = 1u64 << 4;
        for (pos, h) in RollingHasher::new(&seq, 3, modulus) {
            assert_eq!(h, hash_window(&seq[pos..pos + 3], modulus - 1));
        }
    }

    proptest! {
        #[test]
        fn rolling_equals_direct(
            seq in proptest::collection::vec(any::<u8>(), 2..300),
            k in 2usize..40,
            bits in 1u32..40,
        ) {
            prop_assume!(seq.len() >= k);
            let modulus = 1u64 << bits;
            for (pos, h) in RollingHasher::new(&seq, k, modulus) {
                prop_assert!(h < modulus);
                prop_assert_eq!(h, hash_window(&seq[pos..pos + k], modulus - 1));
            }
        }
    }
}
