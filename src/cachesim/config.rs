//! Cache geometry configuration.

use std::fmt;

/// 32KB cache
pub const DEFAULT_C: u32 = 15;
/// 32-byte blocks
pub const DEFAULT_B: u32 = 5;
/// 8 blocks per set
pub const DEFAULT_S: u32 = 3;
/// 4 victim blocks
pub const DEFAULT_V: usize = 4;
/// Prefetch distance of 2 blocks
pub const DEFAULT_K: u32 = 2;

/// Largest supported `C - B`, i.e. at most 2^24 L1 blocks.
pub const MAX_BLOCK_BITS: u32 = 24;
/// Largest supported victim cache.
pub const MAX_VICTIM_BLOCKS: usize = 1 << 16;

/// Cycles added per level of associativity to the base hit time.
pub const HIT_TIME_PER_WAY_BIT: f64 = 0.2;
/// Base L1 hit time in cycles.
pub const BASE_HIT_TIME: f64 = 2.0;
/// Cycles to service a miss from main memory.
pub const MISS_PENALTY: u64 = 200;

/// Cache geometry, expressed the way the trace tooling has always taken it:
/// sizes as powers of two, victim blocks and prefetch distance as counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// Total data storage is 2^C bytes.
    pub c: u32,
    /// Block size is 2^B bytes.
    pub b: u32,
    /// Each set holds 2^S blocks.
    pub s: u32,
    /// Number of blocks in the victim cache (0 disables it).
    pub v: usize,
    /// Prefetch distance in blocks (0 disables prefetching).
    pub k: u32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            c: DEFAULT_C,
            b: DEFAULT_B,
            s: DEFAULT_S,
            v: DEFAULT_V,
            k: DEFAULT_K,
        }
    }
}

/// Invalid cache geometry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheConfigError {
    /// C is too large to address.
    CacheTooLarge { c: u32 },
    /// A set of 2^S blocks of 2^B bytes does not fit in 2^C bytes.
    SetLargerThanCache { c: u32, b: u32, s: u32 },
    /// 2^(C-B) blocks is more than the simulator will allocate.
    TooManyBlocks { c: u32, b: u32 },
    /// The victim cache is larger than the simulator will allocate.
    TooManyVictimBlocks { v: usize },
    /// The prefetch distance exceeds the number of L1 blocks.
    PrefetchTooFar { k: u32, blocks: usize },
}

impl fmt::Display for CacheConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheConfigError::CacheTooLarge { c } => {
                write!(f, "C={c} is too large, must be at most 63")
            }
            CacheConfigError::SetLargerThanCache { c, b, s } => {
                write!(f, "B+S ({b}+{s}) must not exceed C ({c})")
            }
            CacheConfigError::TooManyBlocks { c, b } => {
                write!(f, "C-B ({c}-{b}) must be at most {MAX_BLOCK_BITS}")
            }
            CacheConfigError::TooManyVictimBlocks { v } => {
                write!(f, "V={v} is too large, must be at most {MAX_VICTIM_BLOCKS}")
            }
            CacheConfigError::PrefetchTooFar { k, blocks } => {
                write!(f, "K={k} must not exceed the {blocks} L1 blocks")
            }
        }
    }
}

impl std::error::Error for CacheConfigError {}

impl CacheConfig {
    pub fn validate(&self) -> Result<(), CacheConfigError> {
        if self.c > 63 {
            return Err(CacheConfigError::CacheTooLarge { c: self.c });
        }
        match self.b.checked_add(self.s) {
            Some(bits) if bits <= self.c => {}
            _ => {
                return Err(CacheConfigError::SetLargerThanCache {
                    c: self.c,
                    b: self.b,
                    s: self.s,
                })
            }
        }
        if self.c - self.b > MAX_BLOCK_BITS {
            return Err(CacheConfigError::TooManyBlocks {
                c: self.c,
                b: self.b,
            });
        }
        if self.v > MAX_VICTIM_BLOCKS {
            return Err(CacheConfigError::TooManyVictimBlocks { v: self.v });
        }
        if self.k as usize > self.num_blocks() {
            return Err(CacheConfigError::PrefetchTooFar {
                k: self.k,
                blocks: self.num_blocks(),
            });
        }
        Ok(())
    }

    pub fn block_size(&self) -> u64 {
        1 << self.b
    }

    pub fn num_blocks(&self) -> usize {
        1 << (self.c - self.b)
    }

    pub fn blocks_per_set(&self) -> usize {
        1 << self.s
    }

    pub fn num_sets(&self) -> usize {
        1 << (self.c - self.b - self.s)
    }

    pub fn hit_time(&self) -> f64 {
        BASE_HIT_TIME + HIT_TIME_PER_WAY_BIT * self.s as f64
    }
}
