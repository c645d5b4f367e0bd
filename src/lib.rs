//! corenav - Navigation Orchestration Engine
//!
//! Resolves "go to screen X" requests into transitions: an optional
//! protection gate, target resolution through a destination cache, data
//! injection, and presentation through an external surface. Safe requests
//! run strictly one at a time, in submission order.

pub mod cache;
pub mod config;
pub mod error;
pub mod history;
pub mod interfaces;
pub mod navigator;
pub mod orchestration;
pub mod request;
pub mod routing;
pub mod utils;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use cache::{DestinationCache, Lifetime};
pub use crate::config::NavigatorConfig;
pub use error::{NavigationError, Result};
pub use history::{HistoryItem, HistoryStack};
pub use navigator::{NavigationHandle, Navigator};
pub use orchestration::executor::{NavigationOutcome, NavigationResult, TransitionState};
pub use request::{DataPassing, NavigationRequest, TargetSpec};
pub use routing::RouteTable;
