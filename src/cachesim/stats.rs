//! Cache simulation statistics.

use std::fmt;

use serde::Serialize;

/// Counters collected while replaying a trace, plus the derived timing
/// figures filled in by [`crate::cachesim::CacheSimulator::complete`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    pub accesses: u64,
    pub reads: u64,
    /// Reads that missed L1.
    pub read_misses: u64,
    /// Reads that missed L1 and the victim cache.
    pub read_misses_combined: u64,
    pub writes: u64,
    /// Writes that missed L1.
    pub write_misses: u64,
    /// Writes that missed L1 and the victim cache.
    pub write_misses_combined: u64,
    /// All L1 misses.
    pub misses: u64,
    pub write_backs: u64,
    /// Accesses that missed every cache level and went to memory.
    pub vc_misses: u64,
    pub prefetched_blocks: u64,
    /// Prefetched blocks later hit by a demand access.
    pub useful_prefetches: u64,
    pub bytes_transferred: u64,

    pub hit_time: f64,
    pub miss_penalty: u64,
    /// L1 misses over accesses.
    pub miss_rate: f64,
    /// Accesses that went to memory over accesses.
    pub vc_miss_rate: f64,
    pub avg_access_time: f64,
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Cache Statistics")?;
        writeln!(f, "Accesses: {}", self.accesses)?;
        writeln!(f, "Reads: {}", self.reads)?;
        writeln!(f, "Read misses: {}", self.read_misses)?;
        writeln!(f, "Read misses combined: {}", self.read_misses_combined)?;
        writeln!(f, "Writes: {}", self.writes)?;
        writeln!(f, "Write misses: {}", self.write_misses)?;
        writeln!(f, "Write misses combined: {}", self.write_misses_combined)?;
        writeln!(f, "Misses: {}", self.misses)?;
        writeln!(f, "Writebacks: {}", self.write_backs)?;
        writeln!(f, "Victim cache misses: {}", self.vc_misses)?;
        writeln!(f, "Prefetched blocks: {}", self.prefetched_blocks)?;
        writeln!(f, "Useful prefetches: {}", self.useful_prefetches)?;
        writeln!(f, "Bytes transferred to/from memory: {}", self.bytes_transferred)?;
        writeln!(f, "Hit Time: {:.6}", self.hit_time)?;
        writeln!(f, "Miss Penalty: {}", self.miss_penalty)?;
        writeln!(f, "Miss rate: {:.6}", self.miss_rate)?;
        writeln!(f, "Victim cache miss rate: {:.6}", self.vc_miss_rate)?;
        write!(f, "Average access time (AAT): {:.6}", self.avg_access_time)
    }
}
