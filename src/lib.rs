pub mod game;

// ============================================================================
// Profiling Macros
// ============================================================================

/// Log a message every 100 ticks when the `perf_stats` feature is enabled.
///
/// `$tick` is any expression evaluating to a `u64` tick counter. Without the
/// feature the macro expands to nothing and its arguments are never evaluated.
///
/// # Example
/// ```ignore
/// profile_log!(clusters.tick_count(), "[CLUSTERS] {} dirty", dirty.len());
/// ```
#[macro_export]
#[cfg(feature = "perf_stats")]
macro_rules! profile_log {
    ($tick:expr, $($arg:tt)*) => {
        if $tick % 100 == 0 {
            bevy::prelude::info!($($arg)*);
        }
    };
}

#[macro_export]
#[cfg(not(feature = "perf_stats"))]
macro_rules! profile_log {
    ($tick:expr, $($arg:tt)*) => {};
}
