//! Mixed Combat - fraction arithmetic battles
//!
//! Mixed-number arithmetic, the operation model the player fills in, and
//! the attack/defense state machine of a turn-based battle where every hit
//! and every block is an answered sum.

pub mod core;
pub mod game;
pub mod loader;
pub mod simulate;
pub mod error;

pub use error::{CombatError, Result};
