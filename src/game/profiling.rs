//! Performance profiling utilities
//!
//! `#[profile(ms)]` logs at info level when the annotated function runs longer
//! than `ms` milliseconds. Only active with the `perf_stats` feature.

pub use terranav_macros::profile;
