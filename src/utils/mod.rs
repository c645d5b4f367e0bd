//! Shared utilities.

pub mod bootstrap;
pub mod completion;
