//! Battle orchestration
//!
//! A battle alternates an attack phase (player hits enemy) and a defense
//! phase (enemy hits player) every round. The enemy dropping to 0 HP wins
//! the battle; the player dropping to 0 HP costs a revive and the fight
//! goes on at full HP.

use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;

use crate::core::{Action, Combatant, MixedNumber};
use crate::game::attack::AttackPhase;
use crate::game::collaborators::VictoryReporter;
use crate::game::defense::DefensePhase;
use crate::game::events::{BattleEndReason, CombatEvent, PhaseKind};
use crate::game::logger::CombatLogger;
use crate::game::phase::{PhaseContext, PhaseStatus};
use crate::game::scoring::{VictoryInfo, VictoryStatFlags};
use crate::game::wait::{Busy, Wait};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BattleStatus {
    Running,
    Over(BattleEndReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Enter,
    RoundStart,
    Attacking,
    DefenseStart,
    Defending,
    Revive,
    Revived,
    RoundEnd,
    Victory,
    Over(BattleEndReason),
}

pub struct Battle {
    player: Combatant,
    enemy: Combatant,
    attack: Option<AttackPhase>,
    defense: Option<DefensePhase>,
    reporter: Option<Box<dyn VictoryReporter>>,
    flags: VictoryStatFlags,
    /// 0 plays until someone wins
    max_rounds: u32,
    rng: ChaCha12Rng,
    logger: CombatLogger,
    events: Vec<CombatEvent>,

    step: Step,
    wait: Wait,
    rounds: u32,
    revives: u32,
    attack_total: MixedNumber,
    defense_total: MixedNumber,
    victory: Option<VictoryInfo>,
}

impl Battle {
    pub fn new(player: Combatant, enemy: Combatant) -> Self {
        Battle {
            player,
            enemy,
            attack: None,
            defense: None,
            reporter: None,
            flags: VictoryStatFlags::default(),
            max_rounds: 0,
            rng: ChaCha12Rng::seed_from_u64(0),
            logger: CombatLogger::new(),
            events: Vec::new(),
            step: Step::Enter,
            wait: Wait::None,
            rounds: 0,
            revives: 0,
            attack_total: MixedNumber::ZERO,
            defense_total: MixedNumber::ZERO,
            victory: None,
        }
    }

    pub fn with_attack(mut self, attack: AttackPhase) -> Self {
        self.attack = Some(attack);
        self
    }

    pub fn with_defense(mut self, defense: DefensePhase) -> Self {
        self.defense = Some(defense);
        self
    }

    pub fn with_reporter(mut self, reporter: Box<dyn VictoryReporter>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    pub fn with_flags(mut self, flags: VictoryStatFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_max_rounds(mut self, max_rounds: u32) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    /// Seed the session RNG (deck shuffles, candidate draws, incoming damage)
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = ChaCha12Rng::seed_from_u64(seed);
        self
    }

    pub fn with_logger(mut self, logger: CombatLogger) -> Self {
        self.logger = logger;
        self
    }

    pub fn player(&self) -> &Combatant {
        &self.player
    }

    pub fn enemy(&self) -> &Combatant {
        &self.enemy
    }

    pub fn attack(&self) -> Option<&AttackPhase> {
        self.attack.as_ref()
    }

    pub fn defense(&self) -> Option<&DefensePhase> {
        self.defense.as_ref()
    }

    pub fn rounds(&self) -> u32 {
        self.rounds
    }

    pub fn revives(&self) -> u32 {
        self.revives
    }

    pub fn attack_total(&self) -> MixedNumber {
        self.attack_total
    }

    pub fn defense_total(&self) -> MixedNumber {
        self.defense_total
    }

    /// Summary sent to the reporter, once the enemy is beaten
    pub fn victory(&self) -> Option<&VictoryInfo> {
        self.victory.as_ref()
    }

    pub fn events(&self) -> &[CombatEvent] {
        &self.events
    }

    pub fn logger(&self) -> &CombatLogger {
        &self.logger
    }

    pub fn status(&self) -> BattleStatus {
        match self.step {
            Step::Over(reason) => BattleStatus::Over(reason),
            _ => BattleStatus::Running,
        }
    }

    /// Phase currently waiting for the player's answer
    pub fn awaiting_answer(&self) -> Option<PhaseKind> {
        match self.step {
            Step::Attacking if self.attack.as_ref().is_some_and(|a| a.is_awaiting_answer()) => {
                Some(PhaseKind::Attack)
            }
            Step::Defending
                if self.defense.as_ref().is_some_and(|d| d.is_awaiting_answer()) =>
            {
                Some(PhaseKind::Defense)
            }
            _ => None,
        }
    }

    /// End the battle now; running phases release their subscriptions
    pub fn stop(&mut self) {
        if matches!(self.step, Step::Over(_)) {
            return;
        }
        if let Some(attack) = self.attack.as_mut() {
            attack.stop();
        }
        if let Some(defense) = self.defense.as_mut() {
            defense.stop();
        }
        self.wait = Wait::None;
        self.finish(BattleEndReason::Stopped);
    }

    fn finish(&mut self, reason: BattleEndReason) {
        let event = CombatEvent::BattleEnded {
            reason,
            rounds: self.rounds,
        };
        self.logger.event(&event);
        self.events.push(event);
        self.step = Step::Over(reason);
    }

    fn emit(&mut self, event: CombatEvent) {
        self.logger.event(&event);
        self.events.push(event);
    }

    fn characters_busy(&self) -> bool {
        self.player.is_busy() || self.enemy.is_busy()
    }

    /// Advance the battle by `dt` seconds
    pub fn tick(&mut self, dt: f64) -> BattleStatus {
        self.player.update(dt);
        self.enemy.update(dt);
        self.wait.elapse(dt);

        // a phase sees this tick's dt once, even if it starts mid-tick
        let mut phase_dt = dt;

        loop {
            if !self.wait.is_ready(self.characters_busy()) {
                return BattleStatus::Running;
            }
            self.wait = Wait::None;

            match self.step {
                Step::Enter => {
                    self.player.set_action(Action::Enter);
                    self.enemy.set_action(Action::Enter);
                    self.wait = Wait::UntilIdle(Busy::Characters);
                    self.step = Step::RoundStart;
                }
                Step::RoundStart => {
                    if self.max_rounds > 0 && self.rounds >= self.max_rounds {
                        self.finish(BattleEndReason::RoundLimit);
                        continue;
                    }
                    self.player.set_action(Action::Idle);
                    self.enemy.set_action(Action::Idle);
                    self.rounds += 1;
                    self.emit(CombatEvent::RoundStarted { round: self.rounds });

                    match self.attack.as_mut() {
                        Some(attack) => {
                            attack.init(self.rounds - 1, &mut self.rng);
                            self.emit(CombatEvent::PhaseStarted {
                                phase: PhaseKind::Attack,
                                round: self.rounds,
                            });
                            self.step = Step::Attacking;
                        }
                        None => self.step = Step::DefenseStart,
                    }
                }
                Step::Attacking => {
                    let Some(attack) = self.attack.as_mut() else {
                        self.step = Step::DefenseStart;
                        continue;
                    };
                    let mut ctx = PhaseContext {
                        attacker: &mut self.player,
                        defender: &mut self.enemy,
                        rng: &mut self.rng,
                        logger: &self.logger,
                        events: &mut self.events,
                    };
                    let status = attack.tick(phase_dt, &mut ctx);
                    phase_dt = 0.0;
                    match status {
                        PhaseStatus::Running => return BattleStatus::Running,
                        PhaseStatus::Stopped => return self.status(),
                        PhaseStatus::Finished => {
                            self.attack_total += attack.attack_total();
                            self.step = if self.enemy.is_alive() {
                                Step::DefenseStart
                            } else {
                                Step::Victory
                            };
                        }
                    }
                }
                Step::DefenseStart => match self.defense.as_mut() {
                    Some(defense) => {
                        defense.init(&mut self.rng);
                        self.emit(CombatEvent::PhaseStarted {
                            phase: PhaseKind::Defense,
                            round: self.rounds,
                        });
                        self.step = Step::Defending;
                    }
                    None => self.step = Step::RoundEnd,
                },
                Step::Defending => {
                    let Some(defense) = self.defense.as_mut() else {
                        self.step = Step::RoundEnd;
                        continue;
                    };
                    let mut ctx = PhaseContext {
                        attacker: &mut self.enemy,
                        defender: &mut self.player,
                        rng: &mut self.rng,
                        logger: &self.logger,
                        events: &mut self.events,
                    };
                    let status = defense.tick(phase_dt, &mut ctx);
                    phase_dt = 0.0;
                    match status {
                        PhaseStatus::Running => return BattleStatus::Running,
                        PhaseStatus::Stopped => return self.status(),
                        PhaseStatus::Finished => {
                            self.defense_total += defense.defense_total();
                            self.step = if self.player.is_alive() {
                                Step::RoundEnd
                            } else {
                                Step::Revive
                            };
                        }
                    }
                }
                Step::Revive => {
                    self.revives += 1;
                    self.player.restore();
                    self.player.set_action(Action::Revive);
                    self.emit(CombatEvent::Revived {
                        revives: self.revives,
                    });
                    self.wait = Wait::UntilIdle(Busy::Characters);
                    self.step = Step::Revived;
                }
                Step::Revived => {
                    self.player.set_action(Action::Idle);
                    self.step = Step::RoundEnd;
                }
                Step::RoundEnd => {
                    self.wait = Wait::tick();
                    self.step = Step::RoundStart;
                }
                Step::Victory => {
                    self.player.set_action(Action::Victory);
                    let info = VictoryInfo {
                        attack_value: self.attack_total,
                        defense_value: self.defense_total,
                        rounds: self.rounds,
                        revives: self.revives,
                        flags: self.flags,
                    };
                    if let Some(reporter) = self.reporter.as_mut() {
                        reporter.report(&info);
                    }
                    self.victory = Some(info);
                    self.finish(BattleEndReason::EnemyDefeated);
                }
                Step::Over(reason) => return BattleStatus::Over(reason),
            }
        }
    }
}

impl std::fmt::Debug for Battle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Battle")
            .field("step", &self.step)
            .field("rounds", &self.rounds)
            .field("revives", &self.revives)
            .field("player_hp", &self.player.hp())
            .field("enemy_hp", &self.enemy.hp())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ActionTimings, NumberGroup};
    use crate::game::agent::solve;
    use crate::game::collaborators::OperationDisplay;
    use crate::game::attack::AttackSettings;
    use crate::game::defense::DefenseSettings;
    use crate::game::headless::{HeadlessPhase, RecordingReporter};
    use std::cell::RefCell;
    use std::rc::Rc;

    const DT: f64 = 0.1;

    fn whole(n: u32) -> MixedNumber {
        MixedNumber::from_whole(n)
    }

    struct Rig {
        battle: Battle,
        attack_ui: HeadlessPhase,
        defense_ui: HeadlessPhase,
        reporter: Rc<RefCell<RecordingReporter>>,
    }

    impl Rig {
        fn new(enemy_hp: f64, incoming: u32, block: u32, defense_time: f64) -> Self {
            let attack_ui = HeadlessPhase::instant();
            let defense_ui = HeadlessPhase::instant();
            let reporter = Rc::new(RefCell::new(RecordingReporter::new()));

            let attack = AttackSettings {
                attack_count: 1,
                duration: 2.0,
                groups: vec![NumberGroup::new("ones", vec![whole(1), whole(1)])],
                shuffle: false,
                ..AttackSettings::default()
            };
            let defense = DefenseSettings {
                duration: defense_time,
                attack_groups: vec![NumberGroup::new("hit", vec![whole(incoming)])],
                groups: vec![NumberGroup::new("blocks", vec![whole(block)])],
                shuffle: false,
                ..DefenseSettings::default()
            };

            let battle = Battle::new(
                Combatant::new("Hero", 5.0).with_timings(ActionTimings::instant()),
                Combatant::new("Slime", enemy_hp).with_timings(ActionTimings::instant()),
            )
            .with_attack(AttackPhase::new(attack, attack_ui.widgets()))
            .with_defense(DefensePhase::new(defense, defense_ui.widgets()))
            .with_reporter(Box::new(Rc::clone(&reporter)))
            .with_logger(CombatLogger::capturing())
            .with_max_rounds(10);

            Rig {
                battle,
                attack_ui,
                defense_ui,
                reporter,
            }
        }

        /// Answer everything correctly at once
        fn run(&mut self) -> BattleEndReason {
            for _ in 0..10_000 {
                let ui = match self.battle.awaiting_answer() {
                    Some(PhaseKind::Attack) => Some(&self.attack_ui),
                    Some(PhaseKind::Defense) => Some(&self.defense_ui),
                    None => None,
                };
                if let Some(ui) = ui {
                    let operation = ui.display.borrow().operation().unwrap();
                    if let Some(submission) = solve(&operation, &ui.deck_cards()) {
                        ui.play(&submission.fills, submission.answer);
                    }
                }
                if let BattleStatus::Over(reason) = self.battle.tick(DT) {
                    return reason;
                }
            }
            panic!("battle never ended");
        }
    }

    #[test]
    fn test_player_wins() {
        let mut rig = Rig::new(4.0, 1, 9, 2.0);
        assert_eq!(rig.run(), BattleEndReason::EnemyDefeated);

        // two damage per round against 4 HP
        assert_eq!(rig.battle.rounds(), 2);
        assert_eq!(rig.battle.attack_total().value(), 4.0);
        assert_eq!(rig.battle.player().action(), Action::Victory);

        let reports = &rig.reporter.borrow().reports;
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].rounds, 2);
        assert_eq!(reports[0].revives, 0);
        assert_eq!(Some(&reports[0]), rig.battle.victory());
    }

    #[test]
    fn test_player_is_revived() {
        // 9 incoming, 1 blocked per answer, two answers before the clock
        // runs out: 7 damage against 5 HP every round
        let mut rig = Rig::new(6.0, 9, 1, 0.15);
        assert_eq!(rig.run(), BattleEndReason::EnemyDefeated);

        assert_eq!(rig.battle.rounds(), 3);
        assert_eq!(rig.battle.revives(), 2);
        assert_eq!(rig.battle.player().hp(), 5.0);
        assert!(rig
            .battle
            .events()
            .iter()
            .any(|e| matches!(e, CombatEvent::Revived { revives: 2 })));
    }

    #[test]
    fn test_round_limit() {
        let mut rig = Rig::new(100.0, 1, 9, 2.0);
        assert_eq!(rig.run(), BattleEndReason::RoundLimit);
        assert_eq!(rig.battle.rounds(), 10);
        assert!(rig.reporter.borrow().reports.is_empty());
        assert!(rig.battle.victory().is_none());
    }

    #[test]
    fn test_stop_mid_battle() {
        let mut rig = Rig::new(4.0, 1, 9, 2.0);
        for _ in 0..100 {
            rig.battle.tick(DT);
            if rig.battle.awaiting_answer().is_some() {
                break;
            }
        }
        assert_eq!(rig.attack_ui.answer.subscriber_count(), 1);

        rig.battle.stop();
        assert_eq!(rig.attack_ui.answer.subscriber_count(), 0);
        assert_eq!(rig.battle.status(), BattleStatus::Over(BattleEndReason::Stopped));
        assert_eq!(rig.battle.tick(DT), BattleStatus::Over(BattleEndReason::Stopped));
        assert!(matches!(
            rig.battle.events().last(),
            Some(CombatEvent::BattleEnded {
                reason: BattleEndReason::Stopped,
                ..
            })
        ));
    }

    #[test]
    fn test_event_order_of_first_round() {
        let mut rig = Rig::new(2.0, 1, 9, 2.0);
        rig.run();

        let kinds: Vec<&str> = rig
            .battle
            .events()
            .iter()
            .filter_map(|e| match e {
                CombatEvent::RoundStarted { .. } => Some("round"),
                CombatEvent::PhaseStarted { .. } => Some("phase"),
                CombatEvent::AnswerAccepted { .. } => Some("answer"),
                CombatEvent::HitApplied { .. } => Some("hit"),
                CombatEvent::BattleEnded { .. } => Some("end"),
                _ => None,
            })
            .collect();
        assert_eq!(kinds, vec!["round", "phase", "answer", "hit", "end"]);
    }
}
