//! Core value types: mixed numbers, operations and combatants

pub mod character;
pub mod mixed_number;
pub mod notation;
pub mod ops;

pub use character::{Action, ActionTimings, Combatant};
pub use mixed_number::{gcf, MixedNumber};
pub use notation::{parse_mixed_number, parse_operation};
pub use ops::{CandidateFilter, GroupRotation, MixedNumberOps, NumberGroup, Operand, Operator};
