//! Common utilities for the comparison binaries.
//!
//! Currently a single submodule:
//!
//! - **`perf`**: platform-specific helpers for performance analysis, namely
//!   reading the process's peak resident set size on Linux, used by the
//!   comparison runner to report memory alongside timing.

pub mod perf;
