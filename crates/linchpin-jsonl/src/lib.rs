//! JSON Lines persistence primitives for the linchpin dependency engine.
//!
//! This crate provides buffered async reading and writing of JSONL data,
//! resilient loading that skips malformed lines while collecting warnings,
//! and crash-safe atomic file replacement.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod atomic;
pub mod error;
pub mod reader;
pub mod warning;
pub mod writer;

pub use atomic::{write_jsonl_atomic, write_jsonl_atomic_iter};
pub use error::{Error, Result};
pub use reader::{read_jsonl_resilient, JsonlReader};
pub use warning::{Warning, WarningCollector};
pub use writer::JsonlWriter;
