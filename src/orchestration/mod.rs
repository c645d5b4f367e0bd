//! Orchestration pipeline.
//!
//! Each stage of a navigation lives in its own module:
//! - `gate`: protection precondition
//! - `resolver`: target resolution through the destination cache
//! - `data`: data promise resolution
//! - `executor`: the state machine tying the stages together
//! - `queue`: single-worker FIFO serializing safe navigations

pub mod data;
pub mod executor;
pub mod gate;
pub mod queue;
pub mod resolver;
