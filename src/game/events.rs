//! Combat event log
//!
//! Every observable step of a battle is recorded as a `CombatEvent`. The log
//! drives text/JSON output and is what tests inspect for ordering.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::MixedNumber;

/// Which half of a round an event belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PhaseKind {
    Attack,
    Defense,
}

impl fmt::Display for PhaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhaseKind::Attack => write!(f, "attack"),
            PhaseKind::Defense => write!(f, "defense"),
        }
    }
}

/// Why a battle stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BattleEndReason {
    /// The enemy reached 0 HP
    EnemyDefeated,
    /// `max_rounds` rounds were played without a winner
    RoundLimit,
    /// The battle was stopped from outside
    Stopped,
}

impl fmt::Display for BattleEndReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BattleEndReason::EnemyDefeated => write!(f, "enemy defeated"),
            BattleEndReason::RoundLimit => write!(f, "round limit"),
            BattleEndReason::Stopped => write!(f, "stopped"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum CombatEvent {
    RoundStarted {
        round: u32,
    },
    PhaseStarted {
        phase: PhaseKind,
        round: u32,
    },
    /// Defense phase drew the incoming damage
    IncomingDamage {
        amount: MixedNumber,
    },
    DeckFilled {
        phase: PhaseKind,
        numbers: Vec<MixedNumber>,
    },
    AnswerRejected {
        phase: PhaseKind,
    },
    AnswerAccepted {
        phase: PhaseKind,
        answer: MixedNumber,
    },
    TimerExpired {
        phase: PhaseKind,
        ignored: bool,
    },
    HitApplied {
        index: usize,
        amount: f64,
        defender_hp: f64,
    },
    DefenseResolved {
        remaining: MixedNumber,
        damage: f64,
        defender_hp: f64,
    },
    PhaseFinished {
        phase: PhaseKind,
        total: MixedNumber,
    },
    Revived {
        revives: u32,
    },
    BattleEnded {
        reason: BattleEndReason,
        rounds: u32,
    },
}

impl fmt::Display for CombatEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CombatEvent::RoundStarted { round } => write!(f, "=== Round {} ===", round),
            CombatEvent::PhaseStarted { phase, round } => {
                write!(f, "{} phase begins (round {})", phase, round)
            }
            CombatEvent::IncomingDamage { amount } => write!(f, "incoming damage: {}", amount),
            CombatEvent::DeckFilled { phase, numbers } => {
                write!(f, "{} deck:", phase)?;
                for n in numbers {
                    write!(f, " [{}]", n)?;
                }
                Ok(())
            }
            CombatEvent::AnswerRejected { phase } => write!(f, "{}: wrong answer", phase),
            CombatEvent::AnswerAccepted { phase, answer } => {
                write!(f, "{}: correct answer {}", phase, answer)
            }
            CombatEvent::TimerExpired { phase, ignored } => {
                if *ignored {
                    write!(f, "{}: time is up (opening round, keep going)", phase)
                } else {
                    write!(f, "{}: time is up", phase)
                }
            }
            CombatEvent::HitApplied {
                index,
                amount,
                defender_hp,
            } => write!(
                f,
                "hit #{} deals {:.2} (defender HP {:.2})",
                index + 1,
                amount,
                defender_hp
            ),
            CombatEvent::DefenseResolved {
                remaining,
                damage,
                defender_hp,
            } => write!(
                f,
                "defense leaves {} -> {:.2} damage (defender HP {:.2})",
                remaining, damage, defender_hp
            ),
            CombatEvent::PhaseFinished { phase, total } => {
                write!(f, "{} phase ends, total {}", phase, total)
            }
            CombatEvent::Revived { revives } => write!(f, "player revived ({} so far)", revives),
            CombatEvent::BattleEnded { reason, rounds } => {
                write!(f, "battle over after {} rounds: {}", rounds, reason)
            }
        }
    }
}
