//! Abstract interfaces for corenav collaborators.
//!
//! These traits define the contracts for:
//! - Destinations (what is navigated to, optionally receiving data)
//! - Presentation surface (displays destinations, reports completion)
//! - Protection spaces (asynchronous preconditions)
//! - Routing lookup (path to destination)

pub mod destination;
pub mod presenter;
pub mod protection;
pub mod router;

pub use destination::{
    same_destination, DataReceiver, Destination, DestinationRef, DestinationType, EventBindings,
    EventCallback, Payload,
};
pub use presenter::{Presenter, TransitionKind};
pub use protection::{ProtectionHandler, ProtectionOutcome, ProtectionSpace};
pub use router::{Route, Router};
