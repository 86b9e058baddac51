//! Bindings to the Windows Performance Data Helper (PDH).
//!
//! [`pdh`] wraps the native query/counter calls one to one. [`localize`]
//! holds a process-wide query and resolves wildcard counter paths into
//! concrete instances. Status codes, format flags and counter path parsing
//! are plain Rust and available on every platform.

pub mod counter_path;
pub mod error;
pub mod format;
pub mod multi_sz;
pub mod status;

#[cfg(windows)]
pub mod localize;
#[cfg(windows)]
pub mod pdh;
#[cfg(windows)]
pub mod perf;

pub use counter_path::{CounterPath, ExpandedCounter};
pub use error::{Error, Result};
pub use format::{CounterItem, CounterValue, FormatFlags, ValueKind};
pub use status::PdhStatus;

#[cfg(windows)]
pub use localize::localize_and_expand_counter;
