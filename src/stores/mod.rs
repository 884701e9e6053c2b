//! UI-facing state containers.
//!
//! Each store owns its state behind a lock that is never held across an
//! `.await`, so overlapping actions interleave and whichever response lands
//! last wins. Actions return a snapshot of the state after they settle.
//!
//! Reconciliation differs by action: create refetches the whole list,
//! update and delete splice the single record in place.

mod auth;
mod bootcamp;
mod lead;

pub use auth::{AuthState, AuthStore};
pub use bootcamp::{BootcampState, BootcampStore};
pub use lead::{LeadState, LeadStore};

/// Request lifecycle of a store: `Idle -> Loading -> Ready | Failed`,
/// re-entering `Loading` on every new action.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoadStatus {
    #[default]
    Idle,
    Loading,
    Ready,
    Failed,
}

impl std::fmt::Display for LoadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Loading => write!(f, "loading"),
            Self::Ready => write!(f, "ready"),
            Self::Failed => write!(f, "failed"),
        }
    }
}
