//! Shared trace data types and line parsing.
//!
//! Both the merger and the cache simulator consume the same line-oriented
//! `<rw> <hex-address>` format, so the record type and its parser live here.
//!
//! # Module Organization
//!
//! - [`models`]: Record structs for parsed trace lines and merged rows
//! - [`parser`]: Line parser and its error type
//! - [`constants`]: Default file list, limits and output header

pub mod constants;
pub mod models;
pub mod parser;

// Re-export commonly used types
pub use constants::*;
pub use models::*;
pub use parser::{parse_line, ParseError};
