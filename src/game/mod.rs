//! Combat turn state machine, its widgets and answer controllers

pub mod agent;
pub mod arena;
pub mod attack;
pub mod battle;
pub mod collaborators;
pub mod defense;
pub mod events;
pub mod headless;
pub mod interactive_controller;
pub mod logger;
pub mod phase;
pub mod random_controller;
pub mod scoring;
pub mod scripted_controller;
pub mod signal;
pub mod wait;

pub use agent::{AnswerController, AnswerView, Submission, ZeroController};
pub use arena::{Arena, BattleResult};
pub use attack::{AttackPhase, AttackSettings};
pub use battle::{Battle, BattleStatus};
pub use collaborators::{
    Counter, NumberDeck, OperationDisplay, PhaseWidgets, Timer, VictoryReporter,
};
pub use defense::{DefensePhase, DefenseSettings};
pub use events::{BattleEndReason, CombatEvent, PhaseKind};
pub use headless::{HeadlessPhase, UiConfig};
pub use interactive_controller::InteractiveController;
pub use logger::{CombatLogger, OutputFormat, OutputMode, VerbosityLevel};
pub use phase::{PhaseContext, PhaseStatus};
pub use random_controller::RandomController;
pub use scoring::{ScoreBreakdown, ScoreTable, VictoryInfo, VictoryStatFlags};
pub use scripted_controller::ScriptedController;
pub use signal::{Signal, Subscription};
pub use wait::{Busy, Wait};
