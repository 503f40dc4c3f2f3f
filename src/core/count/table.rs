use super::CountError;
use std::num::NonZeroU32;

/// A table slot: empty, or the first-seen position of one distinct k-mer.
///
/// Stored as `position + 1` so the empty case costs no extra space.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Slot(Option<NonZeroU32>);

impl Slot {
    pub const EMPTY: Slot = Slot(None);

    fn occupied(position: usize) -> Self {
        // Positions are bounded by MAX_SEQUENCE_LEN, well below u32::MAX.
        Slot(NonZeroU32::new(position as u32 + 1))
    }

    pub fn position(self) -> Option<usize> {
        self.0.map(|p| p.get() as usize - 1)
    }
}

/// Smallest power of two that is at least `factor * len`.
pub fn table_modulus(len: usize, factor: usize) -> Result<u64, CountError> {
    let invalid = || CountError::InvalidModulus { len, factor };
    if factor == 0 {
        return Err(invalid());
    }
    let target = len.checked_mul(factor).ok_or_else(invalid)?.max(1);
    let m = target.checked_next_power_of_two().ok_or_else(invalid)?;
    if m as u64 > 1u64 << 32 {
        return Err(invalid());
    }
    Ok(m as u64)
}

/// Fixed-capacity open-addressed table mapping hash buckets to representative
/// positions, probing linearly with wraparound.
#[derive(Clone, Debug)]
pub struct OpenAddressTable {
    slots: Vec<Slot>,
    mask: usize,
    occupied: usize,
}

impl OpenAddressTable {
    pub fn with_modulus(modulus: u64) -> Result<Self, CountError> {
        debug_assert!(modulus.is_power_of_two());
        let capacity = modulus as usize;
        let mut slots = Vec::new();
        slots
            .try_reserve_exact(capacity)
            .map_err(|_| CountError::Allocation {
                what: "hash table",
                bytes: capacity.saturating_mul(size_of::<Slot>()),
            })?;
        slots.resize(capacity, Slot::EMPTY);
        Ok(Self {
            slots,
            mask: capacity - 1,
            occupied: 0,
        })
    }

    /// Returns the representative position of the k-mer at `position`,
    /// claiming an empty slot for it when it has not been seen before.
    ///
    /// `seq[position..position + k]` must be in bounds for every position
    /// ever passed in; the counting pass checks this once up front.
    #[inline]
    pub fn lookup_or_insert(&mut self, seq: &[u8], k: usize, hash: u64, position: usize) -> usize {
        let kmer = &seq[position..position + k];
        let mut slot = hash as usize & self.mask;
        loop {
            match self.slots[slot].position() {
                None => {
                    self.slots[slot] = Slot::occupied(position);
                    self.occupied += 1;
                    return position;
                }
                Some(rep) if &seq[rep..rep + k] == kmer => return rep,
                Some(_) => slot = (slot + 1) & self.mask,
            }
        }
    }

    /// Probes like `lookup_or_insert` without modifying the table.
    #[cfg(test)]
    pub fn find(&self, seq: &[u8], k: usize, hash: u64, position: usize) -> Option<usize> {
        let kmer = &seq[position..position + k];
        let mut slot = hash as usize & self.mask;
        for _ in 0..self.slots.len() {
            match self.slots[slot].position() {
                None => return None,
                Some(rep) if &seq[rep..rep + k] == kmer => return Some(rep),
                Some(_) => slot = (slot + 1) & self.mask,
            }
        }
        None
    }

    /// Occupied slots' positions, in slot order.
    #[cfg(test)]
    pub fn representatives(&self) -> impl Iterator<Item = usize> + '_ {
        self.slots.iter().filter_map(|s| s.position())
    }

    /// Number of distinct k-mers inserted.
    pub fn len(&self) -> usize {
        self.occupied
    }
}
