//! memtrace library - shared modules for the `memtrace` binary.
//!
//! This library reads `<rw> <hex-address>` memory-access traces and provides
//! three tools on top of them:
//!
//! - [`merge`] - Filter and combine several trace files into one `accesses.tsv`
//! - [`validate`] - Check a merged `accesses.tsv` against the merge invariants
//! - [`cachesim`] - Replay a trace through an L1 cache with a victim cache and
//!   a strided prefetcher
//!
//! # Example
//!
//! ```no_run
//! use memtrace::{merge_traces, MergeConfig};
//!
//! let summary = merge_traces(&MergeConfig::default()).expect("merge failed");
//! println!("{} rows written", summary.total_accepted());
//! ```

pub mod cachesim;
pub mod logger;
pub mod merge;
pub mod output;
pub mod trace;
pub mod validate;

// Re-export for convenience
pub use cachesim::{simulate_trace, CacheConfig, CacheStats};
pub use merge::{merge_file, merge_into, merge_traces, FileSummary, MergeConfig, MergeSummary};
pub use validate::{validate_accesses, ValidationError, ValidationResult, ValidationWarning};
