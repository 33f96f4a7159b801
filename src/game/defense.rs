//! Defense phase
//!
//! The enemy swings for an amount drawn from the attack groups. The player
//! whittles it down with subtractions: operand 0 holds the remaining
//! amount, the other operands are filled from the deck. Each correct
//! answer becomes the new remaining amount. The loop runs until the timer
//! expires or the remaining amount is no longer positive; whatever is left
//! hits the defender.

use rand_chacha::ChaCha12Rng;
use serde::{Deserialize, Serialize};

use crate::core::{
    Action, CandidateFilter, GroupRotation, MixedNumber, MixedNumberOps, NumberGroup, Operator,
};
use crate::game::collaborators::PhaseWidgets;
use crate::game::events::{CombatEvent, PhaseKind};
use crate::game::phase::{PhaseContext, PhaseStatus};
use crate::game::signal::Subscription;
use crate::game::wait::{Busy, Wait};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefenseSettings {
    /// Operand count, including the remaining amount in operand 0
    pub op_count: usize,
    pub duration: f64,
    /// Incoming damage: one random member of the next group per phase
    pub attack_groups: Vec<NumberGroup>,
    /// Deck contents, handed out round robin
    pub groups: Vec<NumberGroup>,
    pub shuffle: bool,
    pub filter: CandidateFilter,
    pub ready_delay: f64,
    pub brief_delay: f64,
    pub post_delay: f64,
}

impl Default for DefenseSettings {
    fn default() -> Self {
        DefenseSettings {
            op_count: 2,
            duration: 30.0,
            attack_groups: Vec::new(),
            groups: Vec::new(),
            shuffle: true,
            filter: CandidateFilter::default(),
            ready_delay: 0.0,
            brief_delay: 0.3,
            post_delay: 2.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Start,
    Ready,
    ShowInterface,
    InterfaceShown,
    LoopCheck,
    FillDeck,
    DeckShown,
    ArmAnswer,
    AwaitAnswer,
    Disarm,
    DeckHidden,
    Resolve,
    HideInterface,
    Damage,
    Finish,
    Settle,
    Complete,
    Done,
    Stopped,
}

pub struct DefensePhase {
    settings: DefenseSettings,
    widgets: PhaseWidgets,
    attack_rotation: GroupRotation,
    rotation: GroupRotation,
    step: Step,
    wait: Wait,
    incoming: MixedNumber,
    remaining: MixedNumber,
    total: MixedNumber,
    accepted: Option<MixedNumber>,
    subscription: Option<Subscription<bool>>,
}

impl DefensePhase {
    pub fn new(settings: DefenseSettings, widgets: PhaseWidgets) -> Self {
        DefensePhase {
            settings,
            widgets,
            attack_rotation: GroupRotation::new(),
            rotation: GroupRotation::new(),
            step: Step::Done,
            wait: Wait::None,
            incoming: MixedNumber::ZERO,
            remaining: MixedNumber::ZERO,
            total: MixedNumber::ZERO,
            accepted: None,
            subscription: None,
        }
    }

    /// Draw the incoming damage and arm the phase
    pub fn init(&mut self, rng: &mut ChaCha12Rng) {
        let incoming = self
            .attack_rotation
            .next(&self.settings.attack_groups)
            .map(|group| group.pick(rng))
            .unwrap_or_default();
        self.init_with_damage(incoming);
    }

    /// Arm the phase against a known incoming amount
    pub fn init_with_damage(&mut self, incoming: MixedNumber) {
        self.subscription = None;
        self.incoming = incoming;
        self.remaining = incoming;
        self.total = MixedNumber::ZERO;
        self.accepted = None;

        let mut operation =
            MixedNumberOps::uniform(self.settings.op_count.max(2), Operator::Subtract);
        operation.apply_number(0, incoming);
        self.widgets.display.set_operation(&operation);
        self.widgets.prepare_timer(self.settings.duration);
        self.widgets.clear_deck();

        self.step = Step::Start;
        self.wait = Wait::None;
    }

    pub fn stop(&mut self) {
        self.subscription = None;
        self.widgets.set_timer_active(false);
        self.wait = Wait::None;
        if self.step != Step::Done {
            self.step = Step::Stopped;
        }
    }

    pub fn is_running(&self) -> bool {
        !matches!(self.step, Step::Done | Step::Stopped)
    }

    pub fn is_awaiting_answer(&self) -> bool {
        self.step == Step::AwaitAnswer
    }

    pub fn settings(&self) -> &DefenseSettings {
        &self.settings
    }

    pub fn widgets(&self) -> &PhaseWidgets {
        &self.widgets
    }

    pub fn widgets_mut(&mut self) -> &mut PhaseWidgets {
        &mut self.widgets
    }

    pub fn incoming(&self) -> MixedNumber {
        self.incoming
    }

    /// Damage still to be blocked
    pub fn remaining(&self) -> MixedNumber {
        self.remaining
    }

    /// Sum of everything subtracted by correct answers
    pub fn defense_total(&self) -> MixedNumber {
        self.total
    }

    pub fn tick(&mut self, dt: f64, ctx: &mut PhaseContext) -> PhaseStatus {
        self.widgets.update(dt);
        self.wait.elapse(dt);

        loop {
            if !ctx.wait_ready(&self.wait, &self.widgets) {
                return PhaseStatus::Running;
            }
            self.wait = Wait::None;

            match self.step {
                Step::Start => {
                    ctx.emit(CombatEvent::IncomingDamage {
                        amount: self.incoming,
                    });
                    ctx.attacker.set_action(Action::Attack);
                    ctx.defender.set_action(Action::Defend);
                    self.wait = Wait::UntilIdle(Busy::Attacker);
                    self.step = Step::Ready;
                }
                Step::Ready => {
                    self.wait = Wait::seconds(self.settings.ready_delay);
                    self.step = Step::ShowInterface;
                }
                Step::ShowInterface => {
                    self.widgets.display.show();
                    self.wait = Wait::UntilIdle(Busy::Display);
                    self.step = Step::InterfaceShown;
                }
                Step::InterfaceShown => {
                    if let Some(timer) = self.widgets.timer.as_mut() {
                        timer.show();
                    }
                    self.step = Step::LoopCheck;
                }
                Step::LoopCheck => {
                    self.step = if self.widgets.timer_expired() {
                        Step::HideInterface
                    } else {
                        Step::FillDeck
                    };
                }
                Step::FillDeck => {
                    if self.widgets.show_deck() {
                        self.wait = Wait::UntilIdle(Busy::Deck);
                    }
                    self.step = Step::DeckShown;
                }
                Step::DeckShown => {
                    let numbers = match self.rotation.next(&self.settings.groups) {
                        Some(group) => {
                            self.settings
                                .filter
                                .draw(group, self.settings.shuffle, &mut *ctx.rng)
                        }
                        None => Vec::new(),
                    };
                    self.widgets.fill_deck(&numbers);
                    ctx.emit(CombatEvent::DeckFilled {
                        phase: PhaseKind::Defense,
                        numbers,
                    });
                    self.wait = Wait::seconds(self.settings.brief_delay);
                    self.step = Step::ArmAnswer;
                }
                Step::ArmAnswer => {
                    self.widgets.set_timer_active(true);
                    self.subscription = Some(self.widgets.answer.subscribe());
                    self.step = Step::AwaitAnswer;
                }
                Step::AwaitAnswer => {
                    if self.poll_answer(ctx) {
                        self.step = Step::Disarm;
                        continue;
                    }
                    self.wait = Wait::tick();
                    return PhaseStatus::Running;
                }
                Step::Disarm => {
                    self.widgets.set_timer_active(false);
                    self.subscription = None;
                    if self.widgets.hide_deck() {
                        self.wait = Wait::UntilIdle(Busy::Deck);
                    }
                    self.step = Step::DeckHidden;
                }
                Step::DeckHidden => {
                    self.widgets.clear_deck();
                    self.step = Step::Resolve;
                }
                Step::Resolve => self.resolve(ctx),
                Step::HideInterface => {
                    if let Some(timer) = self.widgets.timer.as_mut() {
                        timer.hide();
                    }
                    self.widgets.display.hide();
                    self.wait = Wait::UntilIdle(Busy::Display);
                    self.step = Step::Damage;
                }
                Step::Damage => {
                    let damage = self.remaining.value().max(0.0);
                    if damage > 0.0 {
                        ctx.defender.take_damage(damage);
                        ctx.defender.set_action(Action::Hurt);
                    }
                    ctx.emit(CombatEvent::DefenseResolved {
                        remaining: self.remaining,
                        damage,
                        defender_hp: ctx.defender.hp(),
                    });
                    self.wait = Wait::seconds(self.settings.brief_delay);
                    self.step = Step::Finish;
                }
                Step::Finish => {
                    ctx.attacker.set_action(Action::Idle);
                    self.wait = Wait::UntilIdle(Busy::Attacker);
                    self.step = Step::Settle;
                }
                Step::Settle => {
                    if ctx.defender.is_alive() {
                        ctx.defender.set_action(Action::Idle);
                    } else {
                        ctx.defender.set_action(Action::Death);
                    }
                    self.wait = Wait::seconds(self.settings.post_delay);
                    self.step = Step::Complete;
                }
                Step::Complete => {
                    ctx.emit(CombatEvent::PhaseFinished {
                        phase: PhaseKind::Defense,
                        total: self.total,
                    });
                    self.step = Step::Done;
                    return PhaseStatus::Finished;
                }
                Step::Done => return PhaseStatus::Finished,
                Step::Stopped => return PhaseStatus::Stopped,
            }
        }
    }

    /// True once the answer wait is over; no opening-round grace here
    fn poll_answer(&mut self, ctx: &mut PhaseContext) -> bool {
        if let Some(subscription) = self.subscription.as_ref() {
            while let Some(correct) = subscription.try_recv() {
                if correct {
                    self.accepted = Some(self.widgets.accepted_answer().unwrap_or(self.remaining));
                    return true;
                }
                ctx.emit(CombatEvent::AnswerRejected {
                    phase: PhaseKind::Defense,
                });
            }
        }

        if self.widgets.timer_expired() {
            ctx.emit(CombatEvent::TimerExpired {
                phase: PhaseKind::Defense,
                ignored: false,
            });
            return true;
        }
        false
    }

    fn resolve(&mut self, ctx: &mut PhaseContext) {
        let Some(answer) = self.accepted.take() else {
            self.wait = Wait::seconds(self.settings.brief_delay);
            self.step = Step::LoopCheck;
            return;
        };

        if let Some(operation) = self.widgets.display.operation() {
            let blocked: MixedNumber = operation
                .operands()
                .iter()
                .skip(1)
                .filter_map(|operand| operand.value())
                .sum();
            self.total += blocked;
        }
        self.remaining = answer;
        ctx.emit(CombatEvent::AnswerAccepted {
            phase: PhaseKind::Defense,
            answer,
        });

        if self.remaining.value() <= 0.0 {
            self.step = Step::HideInterface;
            return;
        }

        if !self.widgets.display.move_answer_to_operand(0) {
            ctx.logger
                .warn("defense display could not move the answer into operand 0");
        }
        self.wait = Wait::seconds(self.settings.brief_delay);
        self.step = Step::LoopCheck;
    }
}

impl Drop for DefensePhase {
    fn drop(&mut self) {
        self.subscription = None;
        self.widgets.set_timer_active(false);
    }
}

impl std::fmt::Debug for DefensePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefensePhase")
            .field("step", &self.step)
            .field("wait", &self.wait)
            .field("incoming", &self.incoming)
            .field("remaining", &self.remaining)
            .field("total", &self.total)
            .finish()
    }
}
