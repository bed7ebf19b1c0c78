use std::num::NonZeroU64;

use crate::contract::{Block, Job};

pub const DEFAULT_BLOCK_SIZE: u64 = 100_000;

/// Number of seeds handed to a worker in one block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockSize(NonZeroU64);

impl Default for BlockSize {
    fn default() -> Self {
        Self::new(DEFAULT_BLOCK_SIZE).unwrap_or(Self(NonZeroU64::MIN))
    }
}

impl BlockSize {
    pub fn new(size: u64) -> Option<Self> {
        NonZeroU64::new(size).map(Self)
    }

    /// Parses a configured override, falling back to the default when the
    /// value is absent, not an integer, or not positive.
    pub fn from_setting(raw: Option<&str>) -> Self {
        raw.and_then(|value| value.trim().parse::<u64>().ok())
            .and_then(Self::new)
            .unwrap_or_default()
    }

    pub fn get(self) -> u64 {
        self.0.get()
    }
}

/// Lazily carves `[0, bound)` into consecutive blocks of `block_size` seeds.
///
/// The last block is not clamped and may extend past `bound`. Cloning the
/// iterator before it is advanced restarts the identical sequence.
#[derive(Debug, Clone)]
pub struct Partition<'a> {
    job: &'a Job,
    bound: u64,
    block_size: u64,
    next_min: u64,
}

pub fn partition(job: &Job, bound: u64, block_size: BlockSize) -> Partition<'_> {
    Partition {
        job,
        bound,
        block_size: block_size.get(),
        next_min: 0,
    }
}

/// Number of blocks `partition` yields for `bound`.
pub fn block_count(bound: u64, block_size: BlockSize) -> u64 {
    bound.div_ceil(block_size.get())
}

impl<'a> Iterator for Partition<'a> {
    type Item = Block<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next_min >= self.bound {
            return None;
        }

        let min_seed = self.next_min;
        let max_seed = min_seed.saturating_add(self.block_size);
        self.next_min = max_seed;

        Some(Block {
            job: self.job,
            min_seed,
            max_seed,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self
            .bound
            .saturating_sub(self.next_min)
            .div_ceil(self.block_size);
        match usize::try_from(remaining) {
            Ok(count) => (count, Some(count)),
            Err(_) => (usize::MAX, None),
        }
    }
}

impl std::iter::FusedIterator for Partition<'_> {}
