//! Frequent k-mer counting engine.
//!
//! One forward pass feeds every window's Karp-Rabin hash into an
//! open-addressed table that maps each distinct k-mer to its first
//! occurrence; counts accumulate on that representative position. The pass
//! state is owned by a [`CountingPass`] and frozen into [`KmerCounts`] when
//! the pass completes.

use crate::core::model::{MAX_K, MAX_SEQUENCE_LEN, MIN_K, ResultEntry, max_possible_count};
use crossbeam_channel as channel;
use std::collections::BTreeMap;
use std::thread;

mod counter;
mod rank;
mod rolling;
mod select;
mod table;

use counter::CountArray;
use rank::rank;
#[cfg(test)]
use rolling::hash_window;
use rolling::RollingHasher;
use select::select;
use table::{OpenAddressTable, table_modulus};

pub const DEFAULT_TABLE_FACTOR: usize = 3;
/// Windows hashed per work item on the parallel path.
const HASH_CHUNK: usize = 1 << 20;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CountError {
    #[error("k-mer size {k} is outside [2, 100]")]
    InvalidK { k: usize },

    #[error("sequence length ({len}) < k ({k})")]
    SequenceTooShort { len: usize, k: usize },

    #[error("sequence length ({len}) exceeds the supported maximum ({max})")]
    SequenceTooLong { len: usize, max: usize },

    #[error("no usable table modulus for length {len} with factor {factor}")]
    InvalidModulus { len: usize, factor: usize },

    #[error("failed to allocate {bytes} bytes for the {what}")]
    Allocation { what: &'static str, bytes: usize },
}

#[derive(Clone, Copy, Debug)]
pub struct CountParams {
    pub k: usize,
    pub table_factor: usize,
}

impl CountParams {
    pub fn new(k: usize) -> Self {
        Self {
            k,
            table_factor: DEFAULT_TABLE_FACTOR,
        }
    }
}

/// State of one counting pass over a borrowed sequence.
pub struct CountingPass<'a> {
    seq: &'a [u8],
    k: usize,
    modulus: u64,
    table: OpenAddressTable,
    counts: CountArray,
}

impl<'a> CountingPass<'a> {
    /// Validates the preconditions and allocates the table and counters.
    pub fn new(seq: &'a [u8], params: CountParams) -> Result<Self, CountError> {
        let k = params.k;
        if !(MIN_K..=MAX_K).contains(&k) {
            return Err(CountError::InvalidK { k });
        }
        if seq.len() > MAX_SEQUENCE_LEN {
            return Err(CountError::SequenceTooLong {
                len: seq.len(),
                max: MAX_SEQUENCE_LEN,
            });
        }
        if seq.len() < k {
            return Err(CountError::SequenceTooShort { len: seq.len(), k });
        }
        let modulus = table_modulus(seq.len(), params.table_factor)?;
        // Probing terminates only if some slot stays empty.
        if (modulus as usize) <= max_possible_count(seq.len(), k) {
            return Err(CountError::InvalidModulus {
                len: seq.len(),
                factor: params.table_factor,
            });
        }
        let table = OpenAddressTable::with_modulus(modulus)?;
        let counts = CountArray::zeroed(seq.len())?;
        Ok(Self {
            seq,
            k,
            modulus,
            table,
            counts,
        })
    }

    pub fn modulus(&self) -> u64 {
        self.modulus
    }

    #[inline]
    fn insert(&mut self, position: usize, hash: u64) {
        let rep = self.table.lookup_or_insert(self.seq, self.k, hash, position);
        self.counts.increment(rep);
    }

    /// Single-threaded pass.
    pub fn run(mut self) -> KmerCounts<'a> {
        for (position, hash) in RollingHasher::new(self.seq, self.k, self.modulus) {
            self.insert(position, hash);
        }
        self.freeze()
    }

    /// Hashes chunks of windows on `threads` workers while this thread
    /// inserts them in position order. Produces exactly what [`run`] does.
    ///
    /// [`run`]: CountingPass::run
    pub fn run_parallel(self, threads: usize) -> KmerCounts<'a> {
        self.run_chunked(threads, HASH_CHUNK)
    }

    fn run_chunked(mut self, threads: usize, chunk: usize) -> KmerCounts<'a> {
        let windows = max_possible_count(self.seq.len(), self.k);
        if threads <= 1 || windows <= chunk {
            return self.run();
        }
        let chunks = windows.div_ceil(chunk);
        let (seq, k, modulus) = (self.seq, self.k, self.modulus);
        let (job_tx, job_rx) = channel::bounded::<usize>(threads * 2);
        let (hash_tx, hash_rx) = channel::bounded::<(usize, Vec<u64>)>(threads * 2);

        thread::scope(|s| {
            s.spawn(move || {
                for index in 0..chunks {
                    if job_tx.send(index).is_err() {
                        return;
                    }
                }
            });
            for _ in 0..threads {
                let rx = job_rx.clone();
                let tx = hash_tx.clone();
                s.spawn(move || {
                    for index in rx.iter() {
                        let start = index * chunk;
                        let end = (start + chunk).min(windows);
                        let hashes = RollingHasher::over(seq, k, modulus, start..end)
                            .map(|(_, h)| h)
                            .collect();
                        if tx.send((index, hashes)).is_err() {
                            return;
                        }
                    }
                });
            }
            drop(job_rx);
            drop(hash_tx);

            let mut pending: BTreeMap<usize, Vec<u64>> = BTreeMap::new();
            let mut next = 0usize;
            for (index, hashes) in hash_rx.iter() {
                pending.insert(index, hashes);
                while let Some(hashes) = pending.remove(&next) {
                    let start = next * chunk;
                    for (offset, hash) in hashes.into_iter().enumerate() {
                        self.insert(start + offset, hash);
                    }
                    next += 1;
                }
            }
            debug_assert_eq!(next, chunks);
        });
        self.freeze()
    }

    fn freeze(self) -> KmerCounts<'a> {
        KmerCounts {
            seq: self.seq,
            k: self.k,
            #[cfg(test)]
            modulus: self.modulus,
            table: self.table,
            counts: self.counts,
        }
    }
}

/// Completed, read-only result of a counting pass.
pub struct KmerCounts<'a> {
    seq: &'a [u8],
    k: usize,
    #[cfg(test)]
    modulus: u64,
    table: OpenAddressTable,
    counts: CountArray,
}

impl<'a> KmerCounts<'a> {
    pub fn k(&self) -> usize {
        self.k
    }

    pub fn max_possible_count(&self) -> usize {
        max_possible_count(self.seq.len(), self.k)
    }

    /// Number of distinct k-mers.
    pub fn distinct(&self) -> usize {
        self.table.len()
    }

    pub fn counts(&self) -> &[u32] {
        self.counts.as_slice()
    }

    /// The k bytes starting at `position`.
    pub fn kmer(&self, position: usize) -> &'a [u8] {
        &self.seq[position..position + self.k]
    }

    /// First occurrence of the k-mer starting at `position`.
    #[cfg(test)]
    pub fn representative(&self, position: usize) -> Option<usize> {
        if position >= self.max_possible_count() {
            return None;
        }
        let hash = hash_window(self.kmer(position), self.modulus - 1);
        self.table.find(self.seq, self.k, hash, position)
    }

    /// Occurrences of the k-mer starting at `position`.
    #[cfg(test)]
    pub fn count_of(&self, position: usize) -> u32 {
        self.representative(position)
            .map_or(0, |rep| self.counts.get(rep))
    }

    #[cfg(test)]
    pub fn representatives(&self) -> impl Iterator<Item = usize> + '_ {
        self.table.representatives()
    }

    /// Representatives with at least `min_count` occurrences, by position.
    pub fn select(&self, min_count: u32) -> Vec<ResultEntry> {
        select(self.counts(), self.max_possible_count(), min_count)
    }

    /// [`select`](KmerCounts::select) ordered most frequent first.
    pub fn ranked(&self, min_count: u32) -> Vec<ResultEntry> {
        let mut entries = self.select(min_count);
        rank(&mut entries);
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn count(seq: &[u8], k: usize) -> KmerCounts<'_> {
        CountingPass::new(seq, CountParams::new(k)).unwrap().run()
    }

    fn brute_force(seq: &[u8], k: usize, p: usize) -> u32 {
        let kmer = &seq[p..p + k];
        (0..=seq.len() - k)
            .filter(|&q| &seq[q..q + k] == kmer)
            .count() as u32
    }

    #[test]
    fn homopolymer_collapses_to_one_kmer() {
        let c = count(b"AAAAA", 2);
        assert_eq!(c.distinct(), 1);
        assert_eq!(c.ranked(1), vec![ResultEntry { position: 0, count: 4 }]);
        assert_eq!(c.max_possible_count(), 4);
    }

    #[test]
    fn repeated_triplet() {
        let c = count(b"ABCABC", 3);
        let r = c.ranked(1);
        assert_eq!(r.len(), 3);
        assert_eq!(c.kmer(r[0].position), b"ABC");
        assert_eq!(r[0].count, 2);
        assert!(r[1..].iter().all(|e| e.count == 1));
        assert_eq!(c.count_of(3), 2);
        assert_eq!(c.representative(3), Some(0));
    }

    #[test]
    fn kmer_text_recovered_from_ranked_positions() {
        let seq = b"GATTACAGATTACA";
        let c = count(seq, 4);
        let top = c.ranked(2);
        let texts: Vec<&[u8]> = top.iter().map(|e| c.kmer(e.position)).collect();
        assert_eq!(texts, vec![&b"GATT"[..], b"ATTA", b"TTAC", b"TACA"]);
        assert!(top.iter().all(|e| e.count == 2));
        assert_eq!(c.kmer(c.max_possible_count() - 1), b"TACA");
    }

    #[test]
    fn whole_sequence_is_one_window() {
        let c = count(b"AAAA", 4);
        assert_eq!(c.max_possible_count(), 1);
        assert_eq!(c.ranked(1), vec![ResultEntry { position: 0, count: 1 }]);
    }

    #[test]
    fn alternating_pair() {
        let c = count(b"XYXY", 2);
        let r = c.ranked(1);
        assert_eq!(r, vec![
            ResultEntry { position: 0, count: 2 },
            ResultEntry { position: 1, count: 1 },
        ]);
    }

    #[test]
    fn rejects_bad_preconditions() {
        let short = CountingPass::new(b"AB", CountParams::new(3)).err();
        assert_eq!(short, Some(CountError::SequenceTooShort { len: 2, k: 3 }));
        let small_k = CountingPass::new(b"ABCD", CountParams::new(1)).err();
        assert_eq!(small_k, Some(CountError::InvalidK { k: 1 }));
        let big_k = CountingPass::new(b"ABCD", CountParams::new(101)).err();
        assert_eq!(big_k, Some(CountError::InvalidK { k: 101 }));
        let params = CountParams {
            k: 2,
            table_factor: 0,
        };
        assert!(matches!(
            CountingPass::new(b"ABCD", params).err(),
            Some(CountError::InvalidModulus { .. })
        ));
    }

    #[test]
    fn tight_table_still_counts_correctly() {
        let seq = b"abracadabra abracadabra";
        let params = CountParams {
            k: 3,
            table_factor: 1,
        };
        let pass = CountingPass::new(seq, params).unwrap();
        assert_eq!(pass.modulus(), 32);
        let c = pass.run();
        for p in 0..c.max_possible_count() {
            assert_eq!(c.count_of(p), brute_force(seq, 3, p));
        }
    }

    #[test]
    fn chunked_pass_matches_serial() {
        let seq: Vec<u8> = (0..5000u32).map(|i| b"ACGT"[(i * i % 7 % 4) as usize]).collect();
        let serial = count(&seq, 5);
        let chunked = CountingPass::new(&seq, CountParams::new(5))
            .unwrap()
            .run_chunked(4, 97);
        assert_eq!(serial.counts(), chunked.counts());
        assert_eq!(serial.ranked(1), chunked.ranked(1));
    }

    proptest! {
        #[test]
        fn counts_match_brute_force(
            seq in proptest::collection::vec(prop_oneof![Just(b'A'), Just(b'C'), any::<u8>()], 2..400),
            k in 2usize..8,
        ) {
            prop_assume!(seq.len() >= k);
            let c = count(&seq, k);
            let total: u64 = c.counts().iter().map(|&n| n as u64).sum();
            prop_assert_eq!(total, c.max_possible_count() as u64);
            for p in 0..c.max_possible_count() {
                let rep = c.representative(p).unwrap();
                prop_assert!(rep <= p);
                prop_assert_eq!(c.kmer(rep), c.kmer(p));
                prop_assert_eq!(c.counts()[rep], brute_force(&seq, k, p));
            }
        }

        #[test]
        fn representatives_are_unique(
            seq in proptest::collection::vec(0u8..3, 2..400),
            k in 2usize..6,
        ) {
            prop_assume!(seq.len() >= k);
            let c = count(&seq, k);
            let mut seen = HashSet::new();
            for rep in c.representatives() {
                prop_assert!(seen.insert(c.kmer(rep)));
            }
            prop_assert_eq!(seen.len(), c.distinct());
        }

        #[test]
        fn repeated_runs_agree(
            seq in proptest::collection::vec(0u8..4, 2..300),
            k in 2usize..6,
            threads in 2usize..5,
            chunk in 1usize..40,
        ) {
            prop_assume!(seq.len() >= k);
            let first = count(&seq, k);
            let second = count(&seq, k);
            let parallel = CountingPass::new(&seq, CountParams::new(k))
                .unwrap()
                .run_chunked(threads, chunk);
            prop_assert_eq!(first.ranked(1), second.ranked(1));
            prop_assert_eq!(first.counts(), parallel.counts());
        }
    }
}
