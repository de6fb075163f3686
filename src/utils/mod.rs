//! Utility functions
//!
//! Logging, console output and progress reporting shared by the library and
//! the binary.

pub mod logging;
