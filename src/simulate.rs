//! Batch mode: run many seeded battles in parallel and summarize them
//!
//! Every battle gets its own seed derived from the batch seed and its
//! index, so a batch is reproducible no matter how rayon schedules it.

use rand::{RngCore, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::game::agent::{AnswerController, ZeroController};
use crate::game::arena::{Arena, BattleResult, DEFAULT_TIME_LIMIT};
use crate::game::events::BattleEndReason;
use crate::game::logger::{CombatLogger, VerbosityLevel};
use crate::game::random_controller::RandomController;
use crate::loader::BattleConfig;
use crate::Result;

/// Controller playing every battle of a batch
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AgentKind {
    Zero,
    Random {
        error_rate: f64,
        think_min: f64,
        think_max: f64,
    },
}

impl AgentKind {
    pub fn build(&self, seed: u64) -> Box<dyn AnswerController> {
        match *self {
            AgentKind::Zero => Box::new(ZeroController::new()),
            AgentKind::Random {
                error_rate,
                think_min,
                think_max,
            } => Box::new(
                RandomController::with_seed(seed)
                    .with_think_time(think_min, think_max)
                    .with_error_rate(error_rate),
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatchOptions {
    pub battles: usize,
    pub seed: u64,
    pub agent: AgentKind,
    /// Virtual seconds per battle
    pub time_limit: f64,
}

impl Default for BatchOptions {
    fn default() -> Self {
        BatchOptions {
            battles: 100,
            seed: 0,
            agent: AgentKind::Zero,
            time_limit: DEFAULT_TIME_LIMIT,
        }
    }
}

/// Seed of battle `index` in a batch seeded with `seed`
pub fn battle_seed(seed: u64, index: usize) -> u64 {
    Xoshiro256PlusPlus::seed_from_u64(seed.wrapping_add(index as u64)).next_u64()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchSummary {
    pub battles: usize,
    pub victories: usize,
    pub round_limits: usize,
    pub stopped: usize,
    pub mean_rounds: f64,
    pub mean_revives: f64,
    /// Over victories only
    pub mean_score: Option<f64>,
    pub best_score: Option<i64>,
    pub results: Vec<BattleResult>,
}

impl BatchSummary {
    pub fn from_results(results: Vec<BattleResult>) -> Self {
        let count = |reason: BattleEndReason| results.iter().filter(|r| r.reason == reason).count();
        let mean = |total: f64, n: usize| if n == 0 { 0.0 } else { total / n as f64 };

        let scores: Vec<i64> = results
            .iter()
            .filter_map(|r| r.score.map(|s| s.total))
            .collect();

        BatchSummary {
            battles: results.len(),
            victories: count(BattleEndReason::EnemyDefeated),
            round_limits: count(BattleEndReason::RoundLimit),
            stopped: count(BattleEndReason::Stopped),
            mean_rounds: mean(
                results.iter().map(|r| r.rounds as f64).sum(),
                results.len(),
            ),
            mean_revives: mean(
                results.iter().map(|r| r.revives as f64).sum(),
                results.len(),
            ),
            mean_score: (!scores.is_empty())
                .then(|| mean(scores.iter().map(|&s| s as f64).sum(), scores.len())),
            best_score: scores.iter().copied().max(),
            results,
        }
    }

    pub fn win_rate(&self) -> f64 {
        if self.battles == 0 {
            0.0
        } else {
            self.victories as f64 / self.battles as f64
        }
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Battles:      {}", self.battles)?;
        writeln!(
            f,
            "Victories:    {} ({:.1}%)",
            self.victories,
            self.win_rate() * 100.0
        )?;
        writeln!(f, "Round limits: {}", self.round_limits)?;
        writeln!(f, "Stopped:      {}", self.stopped)?;
        writeln!(f, "Mean rounds:  {:.2}", self.mean_rounds)?;
        writeln!(f, "Mean revives: {:.2}", self.mean_revives)?;
        match (self.mean_score, self.best_score) {
            (Some(mean), Some(best)) => write!(f, "Score:        mean {:.1}, best {}", mean, best),
            _ => write!(f, "Score:        no victories"),
        }
    }
}

/// Run `options.battles` battles of `config` in parallel
pub fn run_batch(config: &BattleConfig, options: &BatchOptions) -> Result<BatchSummary> {
    config.validate()?;

    let results = (0..options.battles)
        .into_par_iter()
        .map(|index| {
            let seed = battle_seed(options.seed, index);
            let logger = CombatLogger::with_verbosity(VerbosityLevel::Silent);
            let mut arena = Arena::new(config, seed, logger)?.with_time_limit(options.time_limit);
            let mut agent = options.agent.build(seed.wrapping_add(0x1234_5678_9ABC_DEF0));
            Ok(arena.run(agent.as_mut()))
        })
        .collect::<Result<Vec<BattleResult>>>()?;

    Ok(BatchSummary::from_results(results))
}
