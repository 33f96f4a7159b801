//! Battle configuration loaders

pub mod config;

pub use config::{BattleConfig, CharacterConfig, ConfigLoader, DEFAULT_BATTLE};
