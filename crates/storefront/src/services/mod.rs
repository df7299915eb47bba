//! Business services.
//!
//! - [`checkout`] - The checkout orchestrator: multi-provider quote fan-out
//!   and the multi-phase checkout commit
//! - [`cleanup`] - The abandonment sweeper for stale draft-stage orders

pub mod checkout;
pub mod cleanup;

pub use checkout::{CheckoutError, CheckoutOutcome, CheckoutRequest, CheckoutService};
pub use cleanup::{DraftSweeper, SweepError, SweepReport};
