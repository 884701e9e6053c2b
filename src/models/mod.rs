//! Wire types for the bootcamp API.
//!
//! Field names follow the API's JSON (camelCase for resources, snake_case
//! for the token pair returned by the auth endpoints).

pub mod admin;
pub mod bootcamp;
pub mod envelope;
pub mod lead;

pub use admin::*;
pub use bootcamp::*;
pub use envelope::*;
pub use lead::*;
