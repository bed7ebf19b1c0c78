use std::collections::BTreeMap;

use crate::error::DispatchError;

pub const GLIBC_RAND: &str = "glibc-rand";
pub const JAVA: &str = "java";
pub const MT19937: &str = "mt19937";
pub const PHP_MT_RAND: &str = "php-mt_rand";
pub const RUBY_RAND: &str = "ruby-rand";

/// Largest seed of a generator with 32 bits of seed state.
pub const UINT_MAX: u64 = 0xffff_ffff;
/// Largest seed of a generator seeded from a signed 64-bit value.
pub const LLONG_MAX: u64 = 0x7fff_ffff_ffff_ffff;

/// Maps a PRNG family name to the largest seed value it can take.
///
/// Partitioning covers `[0, max)`, matching how the seed range is searched.
///
/// Built once at process start and shared read-only between jobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedSpaceModel {
    bounds: BTreeMap<String, u64>,
}

impl Default for SeedSpaceModel {
    fn default() -> Self {
        Self::from_entries([
            (GLIBC_RAND, UINT_MAX),
            (JAVA, LLONG_MAX),
            (MT19937, UINT_MAX),
            (PHP_MT_RAND, UINT_MAX),
            (RUBY_RAND, UINT_MAX),
        ])
    }
}

impl SeedSpaceModel {
    pub fn from_entries<'a>(entries: impl IntoIterator<Item = (&'a str, u64)>) -> Self {
        Self {
            bounds: entries
                .into_iter()
                .map(|(name, bound)| (name.to_string(), bound))
                .collect(),
        }
    }

    pub fn bound_for(&self, prng: &str) -> Result<u64, DispatchError> {
        self.bounds
            .get(prng)
            .copied()
            .ok_or_else(|| DispatchError::UnsupportedPrng(prng.to_string()))
    }

    pub fn is_supported(&self, prng: &str) -> bool {
        self.bounds.contains_key(prng)
    }

    pub fn families(&self) -> impl Iterator<Item = &str> {
        self.bounds.keys().map(String::as_str)
    }
}
