//! Trace-driven cache simulator.
//!
//! Replays a `<rw> <hex-address>` trace through an L1 cache backed by an
//! optional victim cache and a strided prefetcher, then reports hit/miss
//! counts, memory traffic and average access time.
//!
//! # Module Organization
//!
//! - [`config`]: Cache geometry and timing constants
//! - [`cache`]: The simulator itself
//! - [`stats`]: Collected statistics

pub mod cache;
pub mod config;
pub mod stats;

pub use cache::CacheSimulator;
pub use config::{CacheConfig, CacheConfigError};
pub use stats::CacheStats;

use std::io::BufRead;

use anyhow::{Context, Result};

use crate::trace::{parse_line, AccessKind};

/// Replay every line of `reader` and return the completed statistics.
///
/// Any malformed line, including an access kind other than r/w, aborts the
/// simulation.
pub fn simulate_trace<R: BufRead>(reader: R, config: &CacheConfig) -> Result<CacheStats> {
    let mut sim = CacheSimulator::new(*config).context("Invalid cache configuration")?;
    tracing::debug!("Simulating with {:?}", sim.config());

    for (i, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read trace line {i}"))?;
        let record = parse_line(&line).with_context(|| format!("Malformed trace line {i}"))?;
        let kind: AccessKind = record
            .rw
            .parse()
            .with_context(|| format!("Malformed trace line {i}"))?;
        sim.access(kind, record.addr);
    }

    let stats = sim.complete();
    tracing::info!(
        "Simulated {} accesses, miss rate {:.4}",
        stats.accesses,
        stats.miss_rate
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_simulate_trace() {
        let trace = "r 0\nw 8\nR 1000\nW 1000\n";
        let stats = simulate_trace(Cursor::new(trace), &CacheConfig::default()).unwrap();
        assert_eq!(stats.accesses, 4);
        assert_eq!(stats.reads, 2);
        assert_eq!(stats.writes, 2);
        assert_eq!(stats.misses, 2);
    }

    #[test]
    fn test_unknown_access_kind() {
        let err = simulate_trace(Cursor::new("r 0\nx 10\n"), &CacheConfig::default()).unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("line 1"), "{msg}");
        assert!(msg.contains("unknown access kind 'x'"), "{msg}");
    }

    #[test]
    fn test_invalid_config() {
        let config = CacheConfig {
            c: 4,
            b: 5,
            ..CacheConfig::default()
        };
        assert!(simulate_trace(Cursor::new("r 0\n"), &config).is_err());
    }

    #[test]
    fn test_stats_serialize() {
        let stats = simulate_trace(Cursor::new("r 0\n"), &CacheConfig::default()).unwrap();
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["accesses"], 1);
        assert_eq!(json["miss_penalty"], 200);
    }
}
