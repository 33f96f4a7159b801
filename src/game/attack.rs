//! Attack phase
//!
//! One attack per battle round. The player answers up to `attack_count`
//! operations against the clock; every correct answer becomes one hit on
//! the defender, dealt in submission order after the interface closes.
//!
//! Flow of one phase:
//!
//! ```text
//! init -> ready delay -> show interface
//!      -> [fill deck -> wait for answer -> hide deck -> resolve] x attack_count
//!      -> hide interface -> one hit per correct answer -> settle
//! ```
//!
//! On the first round of a battle an expired timer is ignored, so the
//! opening exchange can never be lost to the clock.

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
pub struct AttackSettings {
    /// Answers asked for per phase
    pub attack_count: u32,
    /// Operand count when no template is given
    pub op_count: usize,
    /// Timer length in seconds, shared by all answers of a phase
    pub duration: f64,
    /// Deck contents, handed out round robin
    pub groups: Vec<NumberGroup>,
    /// Operation template, instanced for every answer
    pub operation: Option<MixedNumberOps>,
    pub shuffle: bool,
    pub filter: CandidateFilter,
    pub ready_delay: f64,
    pub brief_delay: f64,
    pub hit_delay: f64,
    pub post_delay: f64,
}

impl Default for AttackSettings {
    fn default() -> Self {
        AttackSettings {
            attack_count: 1,
            op_count: 2,
            duration: 30.0,
            groups: Vec::new(),
            operation: None,
            shuffle: true,
            filter: CandidateFilter::default(),
            ready_delay: 0.0,
            brief_delay: 0.3,
            hit_delay: 0.5,
            post_delay: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Start,
    InterfaceShown,
    FillDeck,
    DeckShown,
    ArmAnswer,
    AwaitAnswer,
    Disarm,
    DeckHidden,
    Resolve,
    HideInterface,
    Strike,
    Finish,
    Settle,
    Complete,
    Done,
    Stopped,
}

pub struct AttackPhase {
    settings: AttackSettings,
    widgets: PhaseWidgets,
    rotation: GroupRotation,
    step: Step,
    wait: Wait,
    round_index: u32,
    iteration: u32,
    operation: MixedNumberOps,
    numbers: Vec<MixedNumber>,
    total: MixedNumber,
    hit_index: usize,
    accepted: Option<MixedNumber>,
    timed_out: bool,
    expiry_noted: bool,
    subscription: Option<Subscription<bool>>,
}

impl AttackPhase {
    pub fn new(settings: AttackSettings, widgets: PhaseWidgets) -> Self {
        let operation = MixedNumberOps::uniform(settings.op_count, Operator::Add);
        AttackPhase {
            settings,
            widgets,
            rotation: GroupRotation::new(),
            step: Step::Done,
            wait: Wait::None,
            round_index: 0,
            iteration: 0,
            operation,
            numbers: Vec::new(),
            total: MixedNumber::ZERO,
            hit_index: 0,
            accepted: None,
            timed_out: false,
            expiry_noted: false,
            subscription: None,
        }
    }

    /// Arm the phase for battle round `round_index` (0 = opening round)
    pub fn init(&mut self, round_index: u32, rng: &mut ChaCha12Rng) {
        self.subscription = None;
        self.round_index = round_index;
        self.iteration = 0;
        self.numbers.clear();
        self.total = MixedNumber::ZERO;
        self.hit_index = 0;
        self.accepted = None;
        self.timed_out = false;
        self.expiry_noted = false;

        self.operation = self.build_operation(rng);
        self.widgets.display.set_operation(&self.operation);
        self.widgets.prepare_timer(self.settings.duration);
        if let Some(counter) = self.widgets.counter.as_mut() {
            counter.init(self.settings.attack_count);
        }
        self.widgets.clear_deck();

        self.step = Step::Start;
        self.wait = Wait::seconds(self.settings.ready_delay);
    }

    fn build_operation(&self, rng: &mut ChaCha12Rng) -> MixedNumberOps {
        match &self.settings.operation {
            Some(template) => template.instantiate(rng),
            None => MixedNumberOps::uniform(self.settings.op_count, Operator::Add),
        }
    }

    /// Abort pending waits and release the answer subscription
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

    pub fn settings(&self) -> &AttackSettings {
        &self.settings
    }

    pub fn widgets(&self) -> &PhaseWidgets {
        &self.widgets
    }

    pub fn widgets_mut(&mut self) -> &mut PhaseWidgets {
        &mut self.widgets
    }

    /// Operation of the current answer
    pub fn operation(&self) -> &MixedNumberOps {
        &self.operation
    }

    /// Correct answers of this phase, in submission order
    pub fn attack_numbers(&self) -> &[MixedNumber] {
        &self.numbers
    }

    pub fn attack_total(&self) -> MixedNumber {
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
                    self.widgets.display.show();
                    self.wait = Wait::UntilIdle(Busy::Display);
                    self.step = Step::InterfaceShown;
                }
                Step::InterfaceShown => {
                    if let Some(timer) = self.widgets.timer.as_mut() {
                        timer.show();
                    }
                    if let Some(counter) = self.widgets.counter.as_mut() {
                        counter.show();
                    }
                    self.step = Step::FillDeck;
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
                        phase: PhaseKind::Attack,
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
                    if let Some(counter) = self.widgets.counter.as_mut() {
                        counter.hide();
                    }
                    self.widgets.display.hide();
                    self.wait = Wait::UntilIdle(Busy::Display);
                    self.step = Step::Strike;
                }
                Step::Strike => match self.numbers.get(self.hit_index).copied() {
                    Some(number) => {
                        let amount = number.value();
                        ctx.attacker.set_action(Action::Attack);
                        ctx.defender.take_damage(amount);
                        ctx.defender.set_action(Action::Hurt);
                        ctx.emit(CombatEvent::HitApplied {
                            index: self.hit_index,
                            amount,
                            defender_hp: ctx.defender.hp(),
                        });
                        self.hit_index += 1;
                        self.wait = Wait::seconds(self.settings.hit_delay);
                    }
                    None => self.step = Step::Finish,
                },
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
                        phase: PhaseKind::Attack,
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

    /// True once the answer wait is over
    fn poll_answer(&mut self, ctx: &mut PhaseContext) -> bool {
        if let Some(subscription) = self.subscription.as_ref() {
            while let Some(correct) = subscription.try_recv() {
                if correct {
                    self.accepted = Some(self.widgets.accepted_answer().unwrap_or_default());
                    return true;
                }
                ctx.emit(CombatEvent::AnswerRejected {
                    phase: PhaseKind::Attack,
                });
            }
        }

        if !self.widgets.timer_expired() {
            return false;
        }
        if self.round_index == 0 {
            if !self.expiry_noted {
                self.expiry_noted = true;
                ctx.emit(CombatEvent::TimerExpired {
                    phase: PhaseKind::Attack,
                    ignored: true,
                });
            }
            return false;
        }
        self.timed_out = true;
        ctx.emit(CombatEvent::TimerExpired {
            phase: PhaseKind::Attack,
            ignored: false,
        });
        true
    }

    fn resolve(&mut self, ctx: &mut PhaseContext) {
        if let Some(answer) = self.accepted.take() {
            self.numbers.push(answer);
            self.total += answer;
            if let Some(counter) = self.widgets.counter.as_mut() {
                counter.fill_increment();
            }
            ctx.emit(CombatEvent::AnswerAccepted {
                phase: PhaseKind::Attack,
                answer,
            });
        }
        self.iteration += 1;

        if self.timed_out || self.iteration >= self.settings.attack_count {
            self.step = Step::HideInterface;
            return;
        }

        if self.settings.operation.is_some() {
            self.operation = self.build_operation(&mut *ctx.rng);
            self.widgets.display.set_operation(&self.operation);
        } else {
            self.widgets.display.clear_operands();
        }
        self.wait = Wait::seconds(self.settings.brief_delay);
        self.step = Step::FillDeck;
    }
}

impl Drop for AttackPhase {
    fn drop(&mut self) {
        self.subscription = None;
        self.widgets.set_timer_active(false);
    }
}

impl std::fmt::Debug for AttackPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttackPhase")
            .field("step", &self.step)
            .field("wait", &self.wait)
            .field("round_index", &self.round_index)
            .field("iteration", &self.iteration)
            .field("total", &self.total)
            .finish()
    }
}
