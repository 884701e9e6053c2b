//! Resource services: one per entity, mapping REST endpoints to typed calls.
//!
//! Reads (list/get) hand transport failures to an injected [`ReadFallback`];
//! writes (create/update/delete) never degrade and always propagate errors.

mod bootcamp;
mod fallback;
mod lead;

pub use bootcamp::{BootcampApi, BootcampService};
pub use fallback::{FailClosed, MockFallback, ReadFallback};
pub use lead::{LeadApi, LeadService};
