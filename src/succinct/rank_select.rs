use bitvec::prelude::*;

/// Default number of bits between checkpoints.
pub const CHECKPOINT_STRIDE: usize = 256;

/// Bit storage used by every succinct structure in the crate.
pub type Bits = BitVec<u64, Lsb0>;

/// Rank/select index built over an owned bit vector.
///
/// Rank is answered from a prefix-count checkpoint plus a popcount of the
/// remainder; select binary-searches the checkpoints and scans one stride.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankSelect {
    bits: Bits,
    stride: usize,
    /// `checkpoints[k]` = number of ones in `bits[..k * stride]`.
    checkpoints: Vec<u64>,
    ones: usize,
}

impl Default for RankSelect {
    fn default() -> Self {
        Self::build(Bits::new())
    }
}

impl RankSelect {
    /// Construct an index with the default stride.
    pub fn build(bits: Bits) -> Self {
        Self::build_with_stride(bits, CHECKPOINT_STRIDE)
    }

    /// Construct an index with the provided stride.
    pub fn build_with_stride(bits: Bits, stride: usize) -> Self {
        assert!(stride > 0, "stride must be greater than zero");

        let mut checkpoints = Vec::with_capacity(bits.len() / stride + 2);
        let mut ones = 0usize;
        checkpoints.push(0);
        for chunk in bits.chunks(stride) {
            ones += chunk.count_ones();
            checkpoints.push(ones as u64);
        }

        Self {
            bits,
            stride,
            checkpoints,
            ones,
        }
    }

    /// Number of bits indexed.
    #[inline]
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    /// True when no bits are indexed.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Total number of set bits.
    #[inline]
    pub fn count_ones(&self) -> usize {
        self.ones
    }

    /// Bit at `position`, `false` past the end.
    #[inline]
    pub fn get(&self, position: usize) -> bool {
        self.bits.get(position).map(|bit| *bit).unwrap_or(false)
    }

    /// Underlying bits.
    pub fn bits(&self) -> &BitSlice<u64, Lsb0> {
        &self.bits
    }

    /// Rank query: number of ones in `bits[..position)`.
    pub fn rank1(&self, position: usize) -> usize {
        let bounded = position.min(self.bits.len());
        let checkpoint_idx = bounded / self.stride;
        let remainder_start = checkpoint_idx * self.stride;
        self.checkpoints[checkpoint_idx] as usize
            + self.bits[remainder_start..bounded].count_ones()
    }

    /// Rank query: number of zeros in `bits[..position)`.
    #[inline]
    pub fn rank0(&self, position: usize) -> usize {
        position.min(self.bits.len()) - self.rank1(position)
    }

    /// Select query: position of the `k`-th one (0-based).
    pub fn select1(&self, k: usize) -> Option<usize> {
        if k >= self.ones {
            return None;
        }
        let target = k as u64;
        let block = self.checkpoints.partition_point(|&count| count <= target) - 1;
        let start = block * self.stride;
        let end = (start + self.stride).min(self.bits.len());
        let skip = (target - self.checkpoints[block]) as usize;
        self.bits[start..end]
            .iter_ones()
            .nth(skip)
            .map(|offset| start + offset)
    }

    /// Approximate heap footprint in bytes.
    pub fn memory(&self) -> usize {
        self.bits.as_raw_slice().len() * std::mem::size_of::<u64>()
            + self.checkpoints.len() * std::mem::size_of::<u64>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Bits {
        bitvec![u64, Lsb0; 1, 0, 0, 1, 1, 0, 1, 0, 0, 0, 1, 1, 0, 1]
    }

    #[test]
    fn rank_queries_match_naive_counts() {
        let bits = sample();
        let index = RankSelect::build_with_stride(bits.clone(), 4);

        for pos in 0..=bits.len() {
            let naive = bits[..pos].iter().filter(|bit| **bit).count();
            assert_eq!(index.rank1(pos), naive);
            assert_eq!(index.rank0(pos), pos - naive);
        }
    }

    #[test]
    fn select_inverts_rank() {
        let bits = sample();
        let index = RankSelect::build_with_stride(bits.clone(), 3);
        let ones: Vec<usize> = bits.iter_ones().collect();

        for (k, &pos) in ones.iter().enumerate() {
            assert_eq!(index.select1(k), Some(pos));
            assert_eq!(index.rank1(pos), k);
        }
        assert_eq!(index.select1(ones.len()), None);
    }

    #[test]
    fn stride_boundaries_are_exact() {
        let mut bits = Bits::new();
        for i in 0..1024 {
            bits.push(i % 3 == 0);
        }
        let index = RankSelect::build(bits.clone());
        assert_eq!(index.count_ones(), bits.count_ones());
        assert_eq!(index.rank1(256), bits[..256].count_ones());
        assert_eq!(index.rank1(1024), bits.count_ones());
        assert_eq!(index.select1(index.count_ones() - 1), Some(1023));
    }

    #[test]
    fn empty_index_answers_queries() {
        let index = RankSelect::default();
        assert!(index.is_empty());
        assert_eq!(index.rank1(10), 0);
        assert_eq!(index.select1(0), None);
        assert!(!index.get(0));
    }
}
