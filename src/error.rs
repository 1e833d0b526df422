//! The error surface.
//!
//! The map itself never fails except at construction time. `get`/`contains_key`/`remove` report
//! key-absence through `Option`/`bool`, as ordinary control flow, not as errors.

use thiserror::Error;

/// Construction-time validation failure.
#[derive(Debug, Error, PartialEq)]
pub enum Error {
    /// `init_size` was zero or not a power of two.
    #[error("init_size must be a nonzero power of two, got {0}")]
    InvalidInitSize(usize),
    /// `max_load_factor` was not a positive, finite number.
    #[error("max_load_factor must be positive, got {0}")]
    InvalidLoadFactor(f64),
}
