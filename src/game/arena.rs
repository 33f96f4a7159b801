//! Headless battle runner
//!
//! Wires a battle to headless widgets built from a `BattleConfig`, then
//! drives it at a fixed tick, asking an answer controller whenever a phase
//! waits for an answer.

use serde::Serialize;
use std::cell::RefCell;
use std::rc::Rc;

use crate::core::{Combatant, MixedNumber};
use crate::game::agent::{AnswerController, AnswerView};
use crate::game::attack::AttackPhase;
use crate::game::battle::{Battle, BattleStatus};
use crate::game::collaborators::OperationDisplay;
use crate::game::defense::DefensePhase;
use crate::game::events::{BattleEndReason, PhaseKind};
use crate::game::headless::{HeadlessPhase, RecordingReporter};
use crate::game::logger::CombatLogger;
use crate::game::scoring::{ScoreBreakdown, ScoreTable, VictoryInfo};
use crate::loader::BattleConfig;
use crate::Result;

/// Default simulation step, in seconds
pub const DEFAULT_TICK: f64 = 1.0 / 30.0;

/// Smallest accepted step; anything lower, zero or NaN is raised to it
pub const MIN_TICK: f64 = 1.0 / 1000.0;

/// Default virtual time before a battle is stopped, in seconds
pub const DEFAULT_TIME_LIMIT: f64 = 3600.0;

/// Outcome of one battle
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BattleResult {
    pub seed: u64,
    pub reason: BattleEndReason,
    pub rounds: u32,
    pub revives: u32,
    pub attack_total: MixedNumber,
    pub defense_total: MixedNumber,
    pub player_hp: f64,
    pub enemy_hp: f64,
    /// Virtual seconds played
    pub elapsed: f64,
    pub victory: Option<VictoryInfo>,
    pub score: Option<ScoreBreakdown>,
}

impl BattleResult {
    pub fn is_victory(&self) -> bool {
        self.reason == BattleEndReason::EnemyDefeated
    }
}

pub struct Arena {
    battle: Battle,
    attack_ui: Option<HeadlessPhase>,
    defense_ui: Option<HeadlessPhase>,
    /// Shared with the battle; sees the victory summary
    reporter: Rc<RefCell<RecordingReporter>>,
    score: ScoreTable,
    seed: u64,
    tick: f64,
    /// Virtual seconds before the battle is stopped
    time_limit: f64,
    elapsed: f64,
}

impl Arena {
    /// Build the battle described by `config`
    pub fn new(config: &BattleConfig, seed: u64, logger: CombatLogger) -> Result<Self> {
        config.validate()?;

        let player = Combatant::new(config.player.name.clone(), config.player.hp)
            .with_timings(config.player.timings);
        let enemy = Combatant::new(config.enemy.name.clone(), config.enemy.hp)
            .with_timings(config.enemy.timings);
        let reporter = Rc::new(RefCell::new(RecordingReporter::new()));

        let mut battle = Battle::new(player, enemy)
            .with_reporter(Box::new(Rc::clone(&reporter)))
            .with_flags(config.stats)
            .with_max_rounds(config.max_rounds)
            .with_seed(seed)
            .with_logger(logger);

        let mut attack_ui = None;
        if let Some(settings) = &config.attack {
            let ui = HeadlessPhase::new(&config.ui);
            battle = battle.with_attack(AttackPhase::new(settings.clone(), ui.widgets()));
            attack_ui = Some(ui);
        }
        let mut defense_ui = None;
        if let Some(settings) = &config.defense {
            let ui = HeadlessPhase::new(&config.ui);
            battle = battle.with_defense(DefensePhase::new(settings.clone(), ui.widgets()));
            defense_ui = Some(ui);
        }

        Ok(Arena {
            battle,
            attack_ui,
            defense_ui,
            reporter,
            score: config.score,
            seed,
            tick: DEFAULT_TICK,
            time_limit: DEFAULT_TIME_LIMIT,
            elapsed: 0.0,
        })
    }

    pub fn with_tick(mut self, tick: f64) -> Self {
        self.tick = tick.max(MIN_TICK);
        self
    }

    pub fn with_time_limit(mut self, seconds: f64) -> Self {
        self.time_limit = seconds;
        self
    }

    pub fn battle(&self) -> &Battle {
        &self.battle
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Victory summaries the reporter has seen
    pub fn reports(&self) -> Vec<VictoryInfo> {
        self.reporter.borrow().reports.clone()
    }

    fn ui(&self, phase: PhaseKind) -> Option<&HeadlessPhase> {
        match phase {
            PhaseKind::Attack => self.attack_ui.as_ref(),
            PhaseKind::Defense => self.defense_ui.as_ref(),
        }
    }

    /// Let the controller answer if a phase is waiting, then advance one tick
    pub fn step(&mut self, agent: &mut dyn AnswerController) -> BattleStatus {
        if let Some(phase) = self.battle.awaiting_answer() {
            self.poll_agent(phase, agent);
        }
        self.elapsed += self.tick;
        self.battle.tick(self.tick)
    }

    fn poll_agent(&self, phase: PhaseKind, agent: &mut dyn AnswerController) {
        let Some(ui) = self.ui(phase) else {
            return;
        };
        let Some(operation) = ui.display.borrow().operation() else {
            return;
        };
        let deck = ui.deck_cards();
        let view = AnswerView {
            phase,
            operation: &operation,
            deck: &deck,
            timer: ui.timer_value(),
        };

        if let Some(submission) = agent.poll(&view, self.tick) {
            if ui.play(&submission.fills, submission.answer).is_none() {
                self.battle
                    .logger()
                    .verbose(&format!("{}: submission refused", agent.name()));
            }
        }
    }

    /// Play until the battle ends or the time limit is hit
    pub fn run(&mut self, agent: &mut dyn AnswerController) -> BattleResult {
        loop {
            if let BattleStatus::Over(_) = self.step(agent) {
                break;
            }
            if self.elapsed >= self.time_limit {
                self.battle
                    .logger()
                    .warn(&format!("time limit of {}s reached", self.time_limit));
                self.battle.stop();
                break;
            }
        }

        let result = self.result();
        agent.on_battle_end(&result);
        result
    }

    /// Current outcome; a running battle counts as stopped
    pub fn result(&self) -> BattleResult {
        let reason = match self.battle.status() {
            BattleStatus::Over(reason) => reason,
            BattleStatus::Running => BattleEndReason::Stopped,
        };
        let victory = self.battle.victory().cloned();
        let score = victory.as_ref().map(|info| self.score.score(info));

        BattleResult {
            seed: self.seed,
            reason,
            rounds: self.battle.rounds(),
            revives: self.battle.revives(),
            attack_total: self.battle.attack_total(),
            defense_total: self.battle.defense_total(),
            player_hp: self.battle.player().hp(),
            enemy_hp: self.battle.enemy().hp(),
            elapsed: self.elapsed,
            victory,
            score,
        }
    }
}

impl std::fmt::Debug for Arena {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Arena")
            .field("battle", &self.battle)
            .field("seed", &self.seed)
            .field("elapsed", &self.elapsed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::agent::{Submission, ZeroController};
    use crate::game::scripted_controller::ScriptedController;
    use crate::loader::ConfigLoader;

    fn quiet() -> CombatLogger {
        CombatLogger::capturing()
    }

    #[test]
    fn test_zero_controller_wins_default_battle() {
        let config = ConfigLoader::default_battle().unwrap();
        let mut arena = Arena::new(&config, 7, quiet()).unwrap();
        let result = arena.run(&mut ZeroController::new());

        assert!(result.is_victory());
        assert_eq!(result.seed, 7);
        assert_eq!(result.enemy_hp, 0.0);
        assert!(result.rounds >= 1);
        assert!(result.score.is_some());
        assert_eq!(arena.reports().len(), 1);
        assert_eq!(result.victory.as_ref(), arena.reports().first());
    }

    #[test]
    fn test_same_seed_same_battle() {
        let config = ConfigLoader::default_battle().unwrap();
        let run = |seed| {
            let mut arena = Arena::new(&config, seed, quiet()).unwrap();
            arena.run(&mut ZeroController::new())
        };
        assert_eq!(run(42), run(42));
    }

    struct Silent {
        ended: bool,
    }

    impl AnswerController for Silent {
        fn name(&self) -> &str {
            "silent"
        }

        fn poll(&mut self, _view: &AnswerView, _dt: f64) -> Option<Submission> {
            None
        }

        fn on_battle_end(&mut self, _result: &BattleResult) {
            self.ended = true;
        }
    }

    #[test]
    fn test_time_limit_stops_battle() {
        // the first attack never times out, so silence stalls the battle
        let config = ConfigLoader::default_battle().unwrap();
        let mut arena = Arena::new(&config, 1, quiet()).unwrap().with_time_limit(60.0);
        let mut agent = Silent { ended: false };
        let result = arena.run(&mut agent);

        assert_eq!(result.reason, BattleEndReason::Stopped);
        assert!(result.elapsed >= 60.0);
        assert!(result.score.is_none());
        assert!(agent.ended);
    }

    #[test]
    fn test_degenerate_tick_still_advances() {
        let config = ConfigLoader::default_battle().unwrap();
        for tick in [0.0, -0.5, f64::NAN] {
            let mut arena = Arena::new(&config, 1, quiet())
                .unwrap()
                .with_tick(tick)
                .with_time_limit(0.5);
            let result = arena.run(&mut Silent { ended: false });
            assert_eq!(result.reason, BattleEndReason::Stopped);
            assert!(arena.elapsed() >= 0.5);
        }
    }

    #[test]
    fn test_wrong_answers_never_hit() {
        let config = ConfigLoader::default_battle().unwrap();
        let mut arena = Arena::new(&config, 3, quiet()).unwrap().with_time_limit(30.0);
        let mut agent = ScriptedController::parse("wrong, wrong, wrong").unwrap();
        let result = arena.run(&mut agent);

        assert_eq!(result.enemy_hp, config.enemy.hp);
        assert!(agent.is_exhausted());
    }

    #[test]
    fn test_rejects_invalid_config() {
        let mut config = ConfigLoader::default_battle().unwrap();
        config.attack = None;
        config.defense = None;
        assert!(Arena::new(&config, 0, quiet()).is_err());
    }
}
