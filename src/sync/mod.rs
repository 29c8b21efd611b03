//! Device-side synchronization: a pure view reconciler plus the poll loop
//! that feeds it.

mod agent;
mod view;

pub use agent::{Command, SyncAgent};
pub use view::{
    reconcile, reconcile_pulse, ObserverPhase, SideEffect, SubmitterPhase, ViewState, VoteOutcome,
};
