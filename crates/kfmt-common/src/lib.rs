//! Shared foundation types for the Kotlin formatter.
//!
//! Everything position-related in the formatter is tracked as byte offsets
//! into the original UTF-8 source. Line/column pairs are computed on demand
//! for error reporting via [`span::LineIndex`].

pub mod error;
pub mod span;
pub mod token;
