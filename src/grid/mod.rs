//! Toroidal board storage and the B3/S23 transition rule.
//!
//! The board is double-buffered: workers only ever see an immutable
//! [`Snapshot`] frozen at the start of a turn, while the control loop writes
//! results into the live buffer of [`Grid`].

pub mod board;
pub mod patterns;
pub mod rules;

pub use board::{Cell, Grid, Snapshot, ALIVE, DEAD};
pub use patterns::{random_soup, Pattern, PATTERNS};
pub use rules::{neighbor_count, next_state, step};
