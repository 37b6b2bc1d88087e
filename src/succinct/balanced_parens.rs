use super::rank_select::{Bits, RankSelect};

/// Bits summarised per excess block.
const BLOCK_BITS: usize = 64;

/// Excess summary of one block, with `1 = +1` and `0 = -1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BlockExcess {
    /// Excess of the whole block.
    total: i16,
    /// Minimum excess over the non-empty prefixes of the block.
    min_prefix: i16,
    /// Maximum excess over the non-empty suffixes of the block.
    max_suffix: i16,
}

impl BlockExcess {
    fn summarise(block: &bitvec::slice::BitSlice<u64, bitvec::order::Lsb0>) -> Self {
        let mut running = 0i16;
        let mut min_prefix = i16::MAX;
        for bit in block.iter() {
            running += if *bit { 1 } else { -1 };
            min_prefix = min_prefix.min(running);
        }

        let mut suffix = 0i16;
        let mut max_suffix = i16::MIN;
        for bit in block.iter().rev() {
            suffix += if *bit { 1 } else { -1 };
            max_suffix = max_suffix.max(suffix);
        }

        Self {
            total: running,
            min_prefix,
            max_suffix,
        }
    }
}

/// Balanced-parenthesis sequence with matching-parenthesis queries.
///
/// `1` opens and `0` closes. Matching scans bit by bit inside the first and
/// last block and skips whole blocks using their excess summaries. The
/// structure is immutable; callers rebuild it after any change.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BalancedParens {
    index: RankSelect,
    blocks: Vec<BlockExcess>,
}

impl BalancedParens {
    /// Build navigation support over `bits`. Balance is not checked here.
    pub fn build(bits: Bits) -> Self {
        let blocks = bits.chunks(BLOCK_BITS).map(BlockExcess::summarise).collect();
        Self {
            index: RankSelect::build(bits),
            blocks,
        }
    }

    /// Length of the sequence in bits.
    #[inline]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// True for the empty sequence.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// True when `position` holds an opening parenthesis.
    #[inline]
    pub fn is_open(&self, position: usize) -> bool {
        self.index.get(position)
    }

    /// Rank/select support over the raw bits.
    #[inline]
    pub fn rank_select(&self) -> &RankSelect {
        &self.index
    }

    /// Excess (opens minus closes) in `bits[..position)`.
    pub fn excess(&self, position: usize) -> isize {
        let bounded = position.min(self.len());
        2 * self.index.rank1(bounded) as isize - bounded as isize
    }

    /// Position of the parenthesis closing the one opened at `open`.
    pub fn find_close(&self, open: usize) -> Option<usize> {
        if !self.is_open(open) {
            return None;
        }
        let bits = self.index.bits();
        let mut need: i32 = 1;
        let mut position = open + 1;

        let first_block_end = ((open / BLOCK_BITS) + 1) * BLOCK_BITS;
        while position < first_block_end.min(bits.len()) {
            need += if bits[position] { 1 } else { -1 };
            if need == 0 {
                return Some(position);
            }
            position += 1;
        }

        let mut block = first_block_end / BLOCK_BITS;
        while block < self.blocks.len() {
            let summary = self.blocks[block];
            if i32::from(summary.min_prefix) <= -need {
                let start = block * BLOCK_BITS;
                let end = (start + BLOCK_BITS).min(bits.len());
                for position in start..end {
                    need += if bits[position] { 1 } else { -1 };
                    if need == 0 {
                        return Some(position);
                    }
                }
                return None;
            }
            need += i32::from(summary.total);
            block += 1;
        }
        None
    }

    /// Position of the parenthesis opening the one closed at `close`.
    pub fn find_open(&self, close: usize) -> Option<usize> {
        if close >= self.len() || self.is_open(close) {
            return None;
        }
        let bits = self.index.bits();
        let mut need: i32 = 1;

        let first_block_start = (close / BLOCK_BITS) * BLOCK_BITS;
        let mut position = close;
        while position > first_block_start {
            position -= 1;
            need += if bits[position] { -1 } else { 1 };
            if need == 0 {
                return Some(position);
            }
        }

        let mut block = first_block_start / BLOCK_BITS;
        while block > 0 {
            block -= 1;
            let summary = self.blocks[block];
            if i32::from(summary.max_suffix) >= need {
                let start = block * BLOCK_BITS;
                let mut position = start + BLOCK_BITS;
                while position > start {
                    position -= 1;
                    need += if bits[position] { -1 } else { 1 };
                    if need == 0 {
                        return Some(position);
                    }
                }
                return None;
            }
            need -= i32::from(summary.total);
        }
        None
    }

    /// Approximate heap footprint in bytes.
    pub fn memory(&self) -> usize {
        self.index.memory() + self.blocks.len() * std::mem::size_of::<BlockExcess>()
    }
}
