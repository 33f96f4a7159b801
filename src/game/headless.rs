//! Headless collaborators running on the virtual clock
//!
//! These stand in for the widgets of the real game so battles can run in
//! tests, benchmarks and the CLI. Show/hide transitions take a fixed time,
//! the countdown only runs while active, and the display fires the answer
//! signal when something submits an answer.

use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;

use crate::core::{MixedNumber, MixedNumberOps};
use crate::game::collaborators::{
    Counter, NumberDeck, OperationDisplay, PhaseWidgets, Timer, VictoryReporter,
};
use crate::game::scoring::VictoryInfo;
use crate::game::signal::Signal;

/// Which widgets exist and how long their transitions take
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub display_transition: f64,
    pub deck_transition: f64,
    pub deck: bool,
    pub timer: bool,
    pub counter: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        UiConfig {
            display_transition: 0.25,
            deck_transition: 0.2,
            deck: true,
            timer: true,
            counter: true,
        }
    }
}

/// Remaining time of a show/hide animation
#[derive(Debug, Clone, Copy, Default)]
struct Transition {
    length: f64,
    remaining: f64,
}

impl Transition {
    fn new(length: f64) -> Self {
        Transition {
            length: length.max(0.0),
            remaining: 0.0,
        }
    }

    fn start(&mut self) {
        self.remaining = self.length;
    }

    fn update(&mut self, dt: f64) {
        self.remaining = (self.remaining - dt).max(0.0);
    }

    fn is_running(&self) -> bool {
        self.remaining > 0.0
    }
}

#[derive(Debug, Clone, Default)]
pub struct CountdownTimer {
    delay: f64,
    remaining: f64,
    active: bool,
    visible: bool,
}

impl CountdownTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Seconds left on the clock
    pub fn remaining(&self) -> f64 {
        self.remaining
    }

    /// Run the clock out immediately
    pub fn expire(&mut self) {
        self.remaining = 0.0;
    }
}

impl Timer for CountdownTimer {
    fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    fn reset_value(&mut self) {
        self.remaining = self.delay;
    }

    fn value(&self) -> f64 {
        if self.delay > 0.0 {
            (self.remaining / self.delay).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    fn set_delay(&mut self, seconds: f64) {
        self.delay = seconds.max(0.0);
    }

    fn show(&mut self) {
        self.visible = true;
    }

    fn hide(&mut self) {
        self.visible = false;
    }

    fn update(&mut self, dt: f64) {
        if self.active {
            self.remaining = (self.remaining - dt).max(0.0);
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TallyCounter {
    total: u32,
    filled: u32,
    visible: bool,
}

impl TallyCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn filled(&self) -> u32 {
        self.filled
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }
}

impl Counter for TallyCounter {
    fn init(&mut self, total: u32) {
        self.total = total;
        self.filled = 0;
    }

    fn fill_increment(&mut self) {
        self.filled = (self.filled + 1).min(self.total);
    }

    fn show(&mut self) {
        self.visible = true;
    }

    fn hide(&mut self) {
        self.visible = false;
    }
}

/// Deck of number cards; a card taken onto an operand leaves an empty spot
#[derive(Debug, Clone, Default)]
pub struct HeadlessDeck {
    cards: Vec<Option<MixedNumber>>,
    visible: bool,
    transition: Transition,
}

impl HeadlessDeck {
    pub fn new(transition: f64) -> Self {
        HeadlessDeck {
            cards: Vec::new(),
            visible: false,
            transition: Transition::new(transition),
        }
    }

    pub fn cards(&self) -> &[Option<MixedNumber>] {
        &self.cards
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Remove card `index` from the deck
    pub fn take(&mut self, index: usize) -> Option<MixedNumber> {
        self.cards.get_mut(index).and_then(Option::take)
    }
}

impl NumberDeck for HeadlessDeck {
    fn fill(&mut self, numbers: &[MixedNumber]) {
        self.cards = numbers.iter().copied().map(Some).collect();
    }

    fn clear(&mut self) {
        self.cards.clear();
    }

    fn show(&mut self) {
        self.visible = true;
        self.transition.start();
    }

    fn hide(&mut self) {
        self.visible = false;
        self.transition.start();
    }

    fn is_busy(&self) -> bool {
        self.transition.is_running()
    }

    fn update(&mut self, dt: f64) {
        self.transition.update(dt);
    }
}

/// Operation widget with an optional slot limit
#[derive(Debug)]
pub struct HeadlessDisplay {
    operation: Option<MixedNumberOps>,
    slot_count: Option<usize>,
    answer: Option<MixedNumber>,
    /// A correct answer is held; submissions are refused until it is used
    locked: bool,
    visible: bool,
    transition: Transition,
    signal: Signal<bool>,
}

impl HeadlessDisplay {
    pub fn new(transition: f64, signal: Signal<bool>) -> Self {
        HeadlessDisplay {
            operation: None,
            slot_count: None,
            answer: None,
            locked: false,
            visible: false,
            transition: Transition::new(transition),
            signal,
        }
    }

    /// Only the first `count` operands fit on this widget
    pub fn with_slot_count(mut self, count: usize) -> Self {
        self.slot_count = Some(count);
        self
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn current(&self) -> Option<&MixedNumberOps> {
        self.operation.as_ref()
    }

    /// Drop a number onto operand `index`
    pub fn place(&mut self, index: usize, number: MixedNumber) -> bool {
        match self.operation.as_mut() {
            Some(operation) => operation.apply_number(index, number),
            None => false,
        }
    }

    /// Submit an answer and fire the signal with its correctness
    ///
    /// Returns `None` when submission is not possible: hidden, mid
    /// transition, no operation, an operand still empty, or a correct answer
    /// not yet taken by the phase.
    pub fn submit(&mut self, answer: MixedNumber) -> Option<bool> {
        if !self.visible || self.transition.is_running() || self.locked {
            return None;
        }
        let operation = self.operation.as_ref()?;
        if operation.is_any_operand_empty() {
            return None;
        }
        let correct = operation.is_answer_correct(answer);
        self.answer = Some(answer);
        self.locked = correct;
        self.signal.invoke(correct);
        Some(correct)
    }
}

impl OperationDisplay for HeadlessDisplay {
    fn set_operation(&mut self, operation: &MixedNumberOps) {
        let copy = match self.slot_count {
            Some(count) => operation.truncated(count),
            None => operation.clone(),
        };
        self.operation = Some(copy);
        self.answer = None;
        self.locked = false;
    }

    fn operation(&self) -> Option<MixedNumberOps> {
        self.operation.clone()
    }

    fn show(&mut self) {
        self.visible = true;
        self.transition.start();
    }

    fn hide(&mut self) {
        self.visible = false;
        self.transition.start();
    }

    fn is_busy(&self) -> bool {
        self.transition.is_running()
    }

    fn clear_operands(&mut self) {
        if let Some(operation) = self.operation.as_mut() {
            operation.clear_slots();
        }
        self.answer = None;
        self.locked = false;
    }

    fn move_answer_to_operand(&mut self, index: usize) -> bool {
        let (Some(operation), Some(answer)) = (self.operation.as_mut(), self.answer) else {
            return false;
        };
        if index >= operation.len() {
            return false;
        }
        operation.clear_slots();
        operation.apply_number(index, answer);
        self.answer = None;
        self.locked = false;
        true
    }

    fn answer(&self) -> Option<MixedNumber> {
        self.answer
    }

    fn update(&mut self, dt: f64) {
        self.transition.update(dt);
    }
}

/// Keeps every victory summary it receives
#[derive(Debug, Clone, Default)]
pub struct RecordingReporter {
    pub reports: Vec<VictoryInfo>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl VictoryReporter for RecordingReporter {
    fn report(&mut self, info: &VictoryInfo) {
        self.reports.push(info.clone());
    }
}

/// Shared handles to one phase's headless widgets
///
/// The phase gets boxed clones of the handles through `widgets()`; the
/// owner keeps the handles to look at the deck and submit answers.
#[derive(Debug, Clone)]
pub struct HeadlessPhase {
    pub display: Rc<RefCell<HeadlessDisplay>>,
    pub deck: Option<Rc<RefCell<HeadlessDeck>>>,
    pub timer: Option<Rc<RefCell<CountdownTimer>>>,
    pub counter: Option<Rc<RefCell<TallyCounter>>>,
    pub answer: Signal<bool>,
}

impl HeadlessPhase {
    pub fn new(ui: &UiConfig) -> Self {
        let answer = Signal::new();
        HeadlessPhase {
            display: Rc::new(RefCell::new(HeadlessDisplay::new(
                ui.display_transition,
                answer.clone(),
            ))),
            deck: ui
                .deck
                .then(|| Rc::new(RefCell::new(HeadlessDeck::new(ui.deck_transition)))),
            timer: ui.timer.then(|| Rc::new(RefCell::new(CountdownTimer::new()))),
            counter: ui.counter.then(|| Rc::new(RefCell::new(TallyCounter::new()))),
            answer,
        }
    }

    /// Widgets with no transition time
    pub fn instant() -> Self {
        HeadlessPhase::new(&UiConfig {
            display_transition: 0.0,
            deck_transition: 0.0,
            ..UiConfig::default()
        })
    }

    pub fn widgets(&self) -> PhaseWidgets {
        let mut widgets = PhaseWidgets::new(Box::new(Rc::clone(&self.display)), self.answer.clone());
        if let Some(deck) = &self.deck {
            widgets = widgets.with_deck(Box::new(Rc::clone(deck)));
        }
        if let Some(timer) = &self.timer {
            widgets = widgets.with_timer(Box::new(Rc::clone(timer)));
        }
        if let Some(counter) = &self.counter {
            widgets = widgets.with_counter(Box::new(Rc::clone(counter)));
        }
        widgets
    }

    pub fn deck_cards(&self) -> Vec<Option<MixedNumber>> {
        self.deck
            .as_ref()
            .map(|deck| deck.borrow().cards().to_vec())
            .unwrap_or_default()
    }

    pub fn timer_value(&self) -> Option<f64> {
        self.timer.as_ref().map(|timer| timer.borrow().value())
    }

    pub fn expire_timer(&self) {
        if let Some(timer) = &self.timer {
            timer.borrow_mut().expire();
        }
    }

    /// Move deck cards onto operands, then submit `answer`
    ///
    /// Cards that are already taken are skipped. Returns the display's
    /// verdict, `None` if the submission was refused.
    pub fn play(&self, fills: &[(usize, usize)], answer: MixedNumber) -> Option<bool> {
        for &(slot, card) in fills {
            let number = self
                .deck
                .as_ref()
                .and_then(|deck| deck.borrow_mut().take(card));
            if let Some(number) = number {
                self.display.borrow_mut().place(slot, number);
            }
        }
        self.display.borrow_mut().submit(answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Operator;

    fn frac(n: u32, d: u32) -> MixedNumber {
        MixedNumber::from_fraction(n, d)
    }

    #[test]
    fn test_countdown_only_runs_when_active() {
        let mut timer = CountdownTimer::new();
        timer.set_delay(2.0);
        timer.reset_value();
        assert_eq!(timer.value(), 1.0);

        timer.update(1.0);
        assert_eq!(timer.value(), 1.0);

        timer.set_active(true);
        timer.update(1.0);
        assert_eq!(timer.value(), 0.5);
        timer.update(5.0);
        assert!(timer.is_expired());

        timer.reset_value();
        assert!(!timer.is_expired());
    }

    #[test]
    fn test_counter_saturates() {
        let mut counter = TallyCounter::new();
        counter.init(2);
        for _ in 0..3 {
            counter.fill_increment();
        }
        assert_eq!(counter.filled(), 2);
    }

    #[test]
    fn test_deck_transition() {
        let mut deck = HeadlessDeck::new(0.2);
        deck.show();
        assert!(deck.is_busy());
        deck.update(0.1);
        assert!(deck.is_busy());
        deck.update(0.1);
        assert!(!deck.is_busy());

        deck.fill(&[frac(1, 2), frac(1, 3)]);
        assert_eq!(deck.take(1), Some(frac(1, 3)));
        assert_eq!(deck.take(1), None);
        assert_eq!(deck.take(9), None);
    }

    #[test]
    fn test_submit_requires_full_operation() {
        let signal = Signal::new();
        let sub = signal.subscribe();
        let mut display = HeadlessDisplay::new(0.0, signal);
        display.set_operation(&MixedNumberOps::uniform(2, Operator::Add));
        assert_eq!(display.submit(frac(1, 2)), None);

        display.show();
        assert_eq!(display.submit(frac(1, 2)), None);

        display.place(0, frac(1, 4));
        display.place(1, frac(1, 4));
        assert_eq!(display.submit(frac(1, 4)), Some(false));
        assert_eq!(display.submit(frac(1, 2)), Some(true));
        assert_eq!(sub.try_recv(), Some(false));
        assert_eq!(sub.try_recv(), Some(true));
        assert_eq!(display.answer(), Some(frac(1, 2)));
    }

    #[test]
    fn test_correct_answer_locks_submissions() {
        let mut display = HeadlessDisplay::new(0.0, Signal::new());
        display.set_operation(&MixedNumberOps::uniform(2, Operator::Add));
        display.show();
        display.place(0, frac(1, 4));
        display.place(1, frac(1, 2));
        assert_eq!(display.submit(frac(3, 4)), Some(true));

        assert_eq!(display.submit(MixedNumber::from_whole(9)), None);
        assert_eq!(display.answer(), Some(frac(3, 4)));

        display.clear_operands();
        display.place(0, frac(1, 4));
        display.place(1, frac(1, 4));
        assert_eq!(display.submit(frac(1, 2)), Some(true));
    }

    #[test]
    fn test_display_keeps_private_copy() {
        let mut display = HeadlessDisplay::new(0.0, Signal::new()).with_slot_count(2);
        let template = MixedNumberOps::uniform(3, Operator::Add);
        display.set_operation(&template);
        display.place(0, frac(1, 2));

        assert_eq!(display.current().map(|o| o.len()), Some(2));
        assert!(template.operands().iter().all(|o| o.is_empty()));
    }

    #[test]
    fn test_move_answer_to_operand() {
        let mut display = HeadlessDisplay::new(0.0, Signal::new());
        display.set_operation(&MixedNumberOps::uniform(2, Operator::Subtract));
        display.show();
        display.place(0, MixedNumber::from_whole(2));
        display.place(1, frac(1, 2));
        assert_eq!(display.submit(MixedNumber::new(false, 1, 1, 2)), Some(true));

        assert!(!display.move_answer_to_operand(5));
        assert!(display.move_answer_to_operand(0));
        let operation = display.operation().unwrap();
        assert_eq!(operation.operands()[0].value(), Some(MixedNumber::new(false, 1, 1, 2)));
        assert!(operation.operands()[1].is_empty());
        // the answer is consumed
        assert!(!display.move_answer_to_operand(0));
    }

    #[test]
    fn test_headless_phase_play() {
        let phase = HeadlessPhase::instant();
        let mut widgets = phase.widgets();
        widgets.display.set_operation(&MixedNumberOps::uniform(2, Operator::Add));
        widgets.display.show();
        widgets.fill_deck(&[frac(1, 4), frac(1, 2)]);

        let sub = phase.answer.subscribe();
        assert_eq!(phase.play(&[(0, 0), (1, 1)], frac(3, 4)), Some(true));
        assert_eq!(sub.try_recv(), Some(true));
        assert_eq!(phase.deck_cards(), vec![None, None]);
    }
}
