// SPDX-License-Identifier: MIT OR Apache-2.0

//! File/line-tagged debug logging, compiled out unless `debug-print` is set.
//!
//! A no-op unless the feature gate is enabled, so instrumenting a hot path
//! (replacement decisions, swap I/O, mailbox wakeups) costs nothing in a
//! default build.

#[cfg(feature = "debug-print")]
#[macro_export]
macro_rules! klog {
    ($fmt:expr) => {
        eprintln!(concat!("[{}:{}] ", $fmt), file!(), line!())
    };
    ($fmt:expr, $($args:tt)+) => {
        eprintln!(concat!("[{}:{}] ", $fmt), file!(), line!(), $($args)+)
    };
}

#[cfg(not(feature = "debug-print"))]
#[macro_export]
macro_rules! klog {
    ($($args:tt)+) => {{}};
}
