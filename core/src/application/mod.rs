//! Application layer - Use case services.
//!
//! This module contains application services that orchestrate
//! domain logic and adapter interactions.
//!
//! Services are designed to be thin orchestrators that:
//! - Accept domain types as inputs
//! - Use ports (traits) for external dependencies
//! - Return domain types as outputs

pub(crate) mod poll_loop;
mod view;

pub use poll_loop::{CycleOutcome, ErrorStatus, PagingMode, Phase, PollLoop, PollOptions, PollState};
pub use view::{DashboardView, ServiceRow};
