//! State module for tracking source reliability
//!
//! - `SourcePerformanceStat`: attempt counts, latency and suppression window for one source

mod source_state;

// Re-export main types
pub use source_state::{
    skip_cooldown, SourcePerformanceStat, SKIP_MAX_SUCCESS_RATE, SKIP_MIN_ATTEMPTS,
};
