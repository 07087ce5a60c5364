//! L1 + victim cache model with a strided prefetcher.
//!
//! L1 is set-associative, write-back/write-allocate with LRU replacement.
//! The victim cache is fully associative and FIFO. Both are keyed by block
//! address (`addr` with the offset bits cleared).

use std::collections::VecDeque;

use super::config::{CacheConfig, CacheConfigError, MISS_PENALTY};
use super::stats::CacheStats;
use crate::trace::AccessKind;

#[derive(Debug, Clone, Copy, Default)]
struct Block {
    tag: u64,
    valid: bool,
    dirty: bool,
    /// Logical time of the last use; the smallest in a set is evicted first.
    last_used: i64,
    /// Brought in by the prefetcher and not yet touched by a demand access.
    prefetched: bool,
}

impl Block {
    fn new(tag: u64) -> Self {
        Self {
            tag,
            valid: true,
            ..Block::default()
        }
    }
}

/// Replays accesses one at a time and accumulates [`CacheStats`].
#[derive(Debug)]
pub struct CacheSimulator {
    config: CacheConfig,
    /// `num_sets * blocks_per_set` blocks, set-major.
    l1: Vec<Block>,
    victim: VecDeque<Block>,
    stats: CacheStats,
    clock: i64,
    last_miss_block: Option<i128>,
    pending_stride: i128,
}

impl CacheSimulator {
    pub fn new(config: CacheConfig) -> Result<Self, CacheConfigError> {
        config.validate()?;
        Ok(Self {
            l1: vec![Block::default(); config.num_blocks()],
            victim: VecDeque::with_capacity(config.v),
            stats: CacheStats::default(),
            clock: 0,
            last_miss_block: None,
            pending_stride: 0,
            config,
        })
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    fn block_addr(&self, addr: u64) -> u64 {
        addr & !(self.config.block_size() - 1)
    }

    fn set_range(&self, tag: u64) -> std::ops::Range<usize> {
        let set = ((tag >> self.config.b) as usize) & (self.config.num_sets() - 1);
        let ways = self.config.blocks_per_set();
        set * ways..(set + 1) * ways
    }

    fn find_in_l1(&self, tag: u64) -> Option<usize> {
        self.set_range(tag)
            .find(|&idx| self.l1[idx].valid && self.l1[idx].tag == tag)
    }

    /// Slot to fill in `tag`'s set: the first invalid block, else the LRU one.
    fn evict_choice(&self, tag: u64) -> usize {
        let range = self.set_range(tag);
        if let Some(idx) = range.clone().find(|&idx| !self.l1[idx].valid) {
            return idx;
        }
        range
            .min_by_key(|&idx| self.l1[idx].last_used)
            .unwrap_or_default()
    }

    /// Place `block` in L1, pushing whatever it displaces into the victim cache.
    fn install(&mut self, block: Block) {
        let idx = self.evict_choice(block.tag);
        let displaced = std::mem::replace(&mut self.l1[idx], block);
        if displaced.valid {
            self.retire(displaced);
        }
    }

    /// Hand a block evicted from L1 to the victim cache, or to memory.
    fn retire(&mut self, block: Block) {
        if self.config.v == 0 {
            self.write_back_if_dirty(&block);
            return;
        }
        if self.victim.len() == self.config.v {
            if let Some(oldest) = self.victim.pop_front() {
                self.write_back_if_dirty(&oldest);
            }
        }
        self.victim.push_back(block);
    }

    fn write_back_if_dirty(&mut self, block: &Block) {
        if block.dirty {
            self.stats.write_backs += 1;
            self.stats.bytes_transferred += self.config.block_size();
        }
    }

    fn take_from_victim(&mut self, tag: u64) -> Option<Block> {
        let pos = self.victim.iter().position(|b| b.tag == tag)?;
        self.victim.remove(pos)
    }

    /// Simulate one demand access.
    pub fn access(&mut self, kind: AccessKind, addr: u64) {
        self.clock += 1;
        match kind {
            AccessKind::Read => self.stats.reads += 1,
            AccessKind::Write => self.stats.writes += 1,
        }

        let tag = self.block_addr(addr);
        if let Some(idx) = self.find_in_l1(tag) {
            let block = &mut self.l1[idx];
            if block.prefetched {
                block.prefetched = false;
                self.stats.useful_prefetches += 1;
            }
            block.last_used = self.clock;
            if kind == AccessKind::Write {
                block.dirty = true;
            }
            return;
        }

        self.stats.misses += 1;
        match kind {
            AccessKind::Read => self.stats.read_misses += 1,
            AccessKind::Write => self.stats.write_misses += 1,
        }

        let mut block = match self.take_from_victim(tag) {
            Some(mut block) => {
                if block.prefetched {
                    block.prefetched = false;
                    self.stats.useful_prefetches += 1;
                }
                block
            }
            None => {
                self.stats.vc_misses += 1;
                match kind {
                    AccessKind::Read => self.stats.read_misses_combined += 1,
                    AccessKind::Write => self.stats.write_misses_combined += 1,
                }
                self.stats.bytes_transferred += self.config.block_size();
                Block::new(tag)
            }
        };
        block.last_used = self.clock;
        if kind == AccessKind::Write {
            block.dirty = true;
        }
        self.install(block);

        self.prefetch_on_miss(tag);
    }

    /// Strided prefetch: when two consecutive misses are the same number of
    /// blocks apart, fetch the next `k` blocks along that stride.
    fn prefetch_on_miss(&mut self, tag: u64) {
        let block_num = (tag >> self.config.b) as i128;
        if let Some(last) = self.last_miss_block {
            let stride = block_num - last;
            if self.config.k > 0 && stride != 0 && stride == self.pending_stride {
                let max_block = (u64::MAX >> self.config.b) as i128;
                for step in 1..=self.config.k as i128 {
                    let target = block_num + step * stride;
                    if !(0..=max_block).contains(&target) {
                        break;
                    }
                    self.prefetch((target as u64) << self.config.b);
                }
            }
            self.pending_stride = stride;
        }
        self.last_miss_block = Some(block_num);
    }

    fn prefetch(&mut self, tag: u64) {
        if self.find_in_l1(tag).is_some() {
            return;
        }

        let mut block = match self.take_from_victim(tag) {
            Some(block) => block,
            None => {
                self.stats.bytes_transferred += self.config.block_size();
                Block::new(tag)
            }
        };
        self.stats.prefetched_blocks += 1;
        block.prefetched = true;
        // Insert at the LRU position of its set
        let oldest = self
            .set_range(tag)
            .filter(|&idx| self.l1[idx].valid)
            .map(|idx| self.l1[idx].last_used)
            .min()
            .unwrap_or(self.clock);
        block.last_used = oldest - 1;
        self.install(block);
    }

    /// Fill in the derived figures and return the final statistics.
    pub fn complete(mut self) -> CacheStats {
        let stats = &mut self.stats;
        stats.accesses = stats.reads + stats.writes;
        stats.hit_time = self.config.hit_time();
        stats.miss_penalty = MISS_PENALTY;
        if stats.accesses > 0 {
            stats.miss_rate = stats.misses as f64 / stats.accesses as f64;
            stats.vc_miss_rate = stats.vc_misses as f64 / stats.accesses as f64;
        }
        stats.avg_access_time = stats.hit_time + stats.miss_rate * stats.miss_penalty as f64;
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::AccessKind::{Read, Write};

    /// 64 bytes, 16-byte blocks, 2 sets of 2 ways.
    fn small(v: usize, k: u32) -> CacheSimulator {
        CacheSimulator::new(CacheConfig {
            c: 6,
            b: 4,
            s: 1,
            v,
            k,
        })
        .unwrap()
    }

    fn run(sim: &mut CacheSimulator, accesses: &[(AccessKind, u64)]) {
        for &(kind, addr) in accesses {
            sim.access(kind, addr);
        }
    }

    #[test]
    fn test_lru_and_write_back() {
        let mut sim = small(0, 0);
        run(
            &mut sim,
            &[
                (Read, 0x00),  // miss
                (Read, 0x08),  // hit, same block
                (Write, 0x20), // miss, set 0
                (Read, 0x40),  // miss, evicts block 0x00 (clean)
                (Read, 0x00),  // miss, evicts dirty 0x20
            ],
        );
        let stats = sim.complete();

        assert_eq!(stats.accesses, 5);
        assert_eq!(stats.reads, 4);
        assert_eq!(stats.writes, 1);
        assert_eq!(stats.misses, 4);
        assert_eq!(stats.read_misses, 3);
        assert_eq!(stats.write_misses, 1);
        assert_eq!(stats.vc_misses, 4);
        assert_eq!(stats.read_misses_combined, 3);
        assert_eq!(stats.write_misses_combined, 1);
        assert_eq!(stats.write_backs, 1);
        assert_eq!(stats.bytes_transferred, 5 * 16);
    }

    #[test]
    fn test_sets_do_not_conflict() {
        let mut sim = small(0, 0);
        // 0x00/0x20/0x40 map to set 0, 0x10/0x30 to set 1
        run(
            &mut sim,
            &[(Read, 0x00), (Read, 0x10), (Read, 0x20), (Read, 0x30)],
        );
        run(
            &mut sim,
            &[(Read, 0x00), (Read, 0x10), (Read, 0x20), (Read, 0x30)],
        );
        let stats = sim.complete();
        assert_eq!(stats.misses, 4);
    }

    #[test]
    fn test_victim_cache_swap() {
        let mut sim = small(1, 0);
        run(
            &mut sim,
            &[
                (Read, 0x00),
                (Read, 0x08),
                (Write, 0x20),
                (Read, 0x40), // 0x00 -> victim cache
                (Read, 0x00), // victim hit, dirty 0x20 -> victim cache
                (Read, 0x20), // victim hit, 0x40 -> victim cache
            ],
        );
        let stats = sim.complete();

        assert_eq!(stats.misses, 5);
        assert_eq!(stats.vc_misses, 3);
        assert_eq!(stats.write_backs, 0);
        assert_eq!(stats.bytes_transferred, 3 * 16);
    }

    #[test]
    fn test_victim_cache_fifo_write_back() {
        // One L1 block, one victim block
        let mut sim = CacheSimulator::new(CacheConfig {
            c: 4,
            b: 4,
            s: 0,
            v: 1,
            k: 0,
        })
        .unwrap();
        run(
            &mut sim,
            &[
                (Write, 0x00), // dirty in L1
                (Read, 0x10),  // 0x00 -> victim cache
                (Read, 0x20),  // 0x10 -> victim cache, dirty 0x00 written back
            ],
        );
        let stats = sim.complete();

        assert_eq!(stats.vc_misses, 3);
        assert_eq!(stats.write_backs, 1);
        assert_eq!(stats.bytes_transferred, 4 * 16);
    }

    #[test]
    fn test_stride_prefetch() {
        let mut sim = CacheSimulator::new(CacheConfig {
            c: 10,
            b: 4,
            s: 2,
            v: 0,
            k: 2,
        })
        .unwrap();
        run(
            &mut sim,
            &[
                (Read, 0x00), // miss, block 0
                (Read, 0x10), // miss, stride 1 seen once
                (Read, 0x20), // miss, stride confirmed: prefetch blocks 3 and 4
                (Read, 0x30),
                (Read, 0x40),
                (Read, 0x30),
            ],
        );
        let stats = sim.complete();

        assert_eq!(stats.misses, 3);
        assert_eq!(stats.prefetched_blocks, 2);
        assert_eq!(stats.useful_prefetches, 2);
        assert_eq!(stats.bytes_transferred, 5 * 16);
    }

    #[test]
    fn test_no_prefetch_when_disabled() {
        let mut sim = CacheSimulator::new(CacheConfig {
            c: 10,
            b: 4,
            s: 2,
            v: 0,
            k: 0,
        })
        .unwrap();
        run(
            &mut sim,
            &[(Read, 0x00), (Read, 0x10), (Read, 0x20), (Read, 0x30)],
        );
        let stats = sim.complete();
        assert_eq!(stats.misses, 4);
        assert_eq!(stats.prefetched_blocks, 0);
    }

    #[test]
    fn test_prefetch_inserted_as_lru() {
        // Fully associative, 2 ways: the prefetched block is evicted first
        let mut sim = CacheSimulator::new(CacheConfig {
            c: 5,
            b: 4,
            s: 1,
            v: 0,
            k: 1,
        })
        .unwrap();
        run(
            &mut sim,
            &[
                (Read, 0x00),
                (Read, 0x10),
                (Read, 0x20), // stride 1 twice: prefetch 0x30, evicting LRU 0x10
                (Read, 0x50), // miss, evicts prefetched 0x30 rather than 0x20
                (Read, 0x20), // hit
            ],
        );
        let stats = sim.complete();
        assert_eq!(stats.prefetched_blocks, 1);
        assert_eq!(stats.useful_prefetches, 0);
        assert_eq!(stats.misses, 4);
    }

    #[test]
    fn test_average_access_time() {
        let mut sim = small(0, 0);
        run(&mut sim, &[(Read, 0x00), (Read, 0x00), (Read, 0x00), (Read, 0x00)]);
        let stats = sim.complete();

        assert!((stats.hit_time - 2.2).abs() < 1e-9);
        assert_eq!(stats.miss_penalty, 200);
        assert!((stats.miss_rate - 0.25).abs() < 1e-9);
        assert!((stats.avg_access_time - 52.2).abs() < 1e-9);
    }

    #[test]
    fn test_miss_rate_counts_l1_misses_with_victim_cache() {
        let mut sim = small(1, 0);
        run(
            &mut sim,
            &[
                (Read, 0x00),
                (Read, 0x08),
                (Write, 0x20),
                (Read, 0x40),
                (Read, 0x00), // victim hit still counts as a miss
                (Read, 0x20),
            ],
        );
        let stats = sim.complete();

        assert_eq!(stats.misses, 5);
        assert_eq!(stats.vc_misses, 3);
        assert!((stats.miss_rate - 5.0 / 6.0).abs() < 1e-9);
        assert!((stats.vc_miss_rate - 0.5).abs() < 1e-9);
        assert!((stats.avg_access_time - (2.2 + 5.0 / 6.0 * 200.0)).abs() < 1e-9);
    }

    #[test]
    fn test_empty_trace() {
        let stats = small(0, 0).complete();
        assert_eq!(stats.accesses, 0);
        assert_eq!(stats.miss_rate, 0.0);
        assert_eq!(stats.vc_miss_rate, 0.0);
    }
}
