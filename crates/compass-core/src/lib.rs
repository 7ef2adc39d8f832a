//! Foundational low-level utilities shared across ClauseCompass crates.
//!
//! Provides atomic file-write helpers and time utilities used by session
//! persistence.

pub mod atomic_io;
pub mod time_utils;

pub use atomic_io::{remove_file_if_exists, write_text_atomic, write_text_atomic_private};
pub use time_utils::current_unix_timestamp_ms;
