use super::CountError;

/// One counter per sequence position. Only representative positions ever
/// receive increments; every other entry stays zero.
#[derive(Clone, Debug)]
pub struct CountArray {
    counts: Vec<u32>,
}

impl CountArray {
    pub fn zeroed(len: usize) -> Result<Self, CountError> {
        let mut counts = Vec::new();
        counts
            .try_reserve_exact(len)
            .map_err(|_| CountError::Allocation {
                what: "count array",
                bytes: len.saturating_mul(size_of::<u32>()),
            })?;
        counts.resize(len, 0);
        Ok(Self { counts })
    }

    #[inline]
    pub fn increment(&mut self, representative: usize) {
        self.counts[representative] += 1;
    }

    #[cfg(test)]
    pub fn get(&self, position: usize) -> u32 {
        self.counts[position]
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn increments_accumulate_on_one_index() {
        let mut c = CountArray::zeroed(5).unwrap();
        c.increment(2);
        c.increment(2);
        c.increment(0);
        assert_eq!(c.as_slice(), &[1, 0, 2, 0, 0]);
        assert_eq!(c.get(2), 2);
    }

    #[test]
    fn empty_array() {
        let c = CountArray::zeroed(0).unwrap();
        assert!(c.as_slice().is_empty());
    }
}
