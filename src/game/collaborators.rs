//! Interfaces to the presentation layer
//!
//! The turn engine never renders anything itself. It drives these traits,
//! and polls `is_busy` where it has to wait for a transition to finish.
//! Deck, timer and counter are optional: a phase without a timer never
//! times out, and one without a deck or counter just skips those steps.

use std::cell::RefCell;
use std::rc::Rc;

use crate::core::{MixedNumber, MixedNumberOps};
use crate::game::scoring::VictoryInfo;
use crate::game::signal::Signal;

/// Operation widget: shows the operation, collects the player's answer
pub trait OperationDisplay {
    /// Take a private copy of `operation`
    fn set_operation(&mut self, operation: &MixedNumberOps);

    /// Current operation including player fills
    fn operation(&self) -> Option<MixedNumberOps>;

    fn show(&mut self);
    fn hide(&mut self);
    fn is_busy(&self) -> bool;

    /// Empty every player-filled operand
    fn clear_operands(&mut self);

    /// Move the submitted answer into operand `index`; false if out of range
    fn move_answer_to_operand(&mut self, index: usize) -> bool;

    /// Last submitted answer
    fn answer(&self) -> Option<MixedNumber>;

    fn update(&mut self, _dt: f64) {}
}

/// Source of draggable numbers
pub trait NumberDeck {
    fn fill(&mut self, numbers: &[MixedNumber]);
    fn clear(&mut self);
    fn show(&mut self);
    fn hide(&mut self);
    fn is_busy(&self) -> bool;

    fn update(&mut self, _dt: f64) {}
}

/// Countdown with a normalized value: 1 when reset, 0 when expired
pub trait Timer {
    fn set_active(&mut self, active: bool);
    fn reset_value(&mut self);
    fn value(&self) -> f64;
    fn set_delay(&mut self, seconds: f64);

    fn show(&mut self) {}
    fn hide(&mut self) {}
    fn update(&mut self, _dt: f64) {}

    fn is_expired(&self) -> bool {
        self.value() <= 0.0
    }
}

/// Progress pips, one per correct answer
pub trait Counter {
    fn init(&mut self, total: u32);
    fn fill_increment(&mut self);

    fn show(&mut self) {}
    fn hide(&mut self) {}
}

/// Receives the summary of a won battle
pub trait VictoryReporter {
    fn report(&mut self, info: &VictoryInfo);
}

impl<T: OperationDisplay + ?Sized> OperationDisplay for Rc<RefCell<T>> {
    fn set_operation(&mut self, operation: &MixedNumberOps) {
        self.borrow_mut().set_operation(operation)
    }
    fn operation(&self) -> Option<MixedNumberOps> {
        self.borrow().operation()
    }
    fn show(&mut self) {
        self.borrow_mut().show()
    }
    fn hide(&mut self) {
        self.borrow_mut().hide()
    }
    fn is_busy(&self) -> bool {
        self.borrow().is_busy()
    }
    fn clear_operands(&mut self) {
        self.borrow_mut().clear_operands()
    }
    fn move_answer_to_operand(&mut self, index: usize) -> bool {
        self.borrow_mut().move_answer_to_operand(index)
    }
    fn answer(&self) -> Option<MixedNumber> {
        self.borrow().answer()
    }
    fn update(&mut self, dt: f64) {
        self.borrow_mut().update(dt)
    }
}

impl<T: NumberDeck + ?Sized> NumberDeck for Rc<RefCell<T>> {
    fn fill(&mut self, numbers: &[MixedNumber]) {
        self.borrow_mut().fill(numbers)
    }
    fn clear(&mut self) {
        self.borrow_mut().clear()
    }
    fn show(&mut self) {
        self.borrow_mut().show()
    }
    fn hide(&mut self) {
        self.borrow_mut().hide()
    }
    fn is_busy(&self) -> bool {
        self.borrow().is_busy()
    }
    fn update(&mut self, dt: f64) {
        self.borrow_mut().update(dt)
    }
}

impl<T: Timer + ?Sized> Timer for Rc<RefCell<T>> {
    fn set_active(&mut self, active: bool) {
        self.borrow_mut().set_active(active)
    }
    fn reset_value(&mut self) {
        self.borrow_mut().reset_value()
    }
    fn value(&self) -> f64 {
        self.borrow().value()
    }
    fn set_delay(&mut self, seconds: f64) {
        self.borrow_mut().set_delay(seconds)
    }
    fn show(&mut self) {
        self.borrow_mut().show()
    }
    fn hide(&mut self) {
        self.borrow_mut().hide()
    }
    fn update(&mut self, dt: f64) {
        self.borrow_mut().update(dt)
    }
    fn is_expired(&self) -> bool {
        self.borrow().is_expired()
    }
}

impl<T: Counter + ?Sized> Counter for Rc<RefCell<T>> {
    fn init(&mut self, total: u32) {
        self.borrow_mut().init(total)
    }
    fn fill_increment(&mut self) {
        self.borrow_mut().fill_increment()
    }
    fn show(&mut self) {
        self.borrow_mut().show()
    }
    fn hide(&mut self) {
        self.borrow_mut().hide()
    }
}

impl<T: VictoryReporter + ?Sized> VictoryReporter for Rc<RefCell<T>> {
    fn report(&mut self, info: &VictoryInfo) {
        self.borrow_mut().report(info)
    }
}

/// Everything one phase drives, plus the answer signal its display fires
pub struct PhaseWidgets {
    pub display: Box<dyn OperationDisplay>,
    pub deck: Option<Box<dyn NumberDeck>>,
    pub timer: Option<Box<dyn Timer>>,
    pub counter: Option<Box<dyn Counter>>,
    /// Fired with `true` for a correct submission, `false` otherwise
    pub answer: Signal<bool>,
}

impl PhaseWidgets {
    pub fn new(display: Box<dyn OperationDisplay>, answer: Signal<bool>) -> Self {
        PhaseWidgets {
            display,
            deck: None,
            timer: None,
            counter: None,
            answer,
        }
    }

    pub fn with_deck(mut self, deck: Box<dyn NumberDeck>) -> Self {
        self.deck = Some(deck);
        self
    }

    pub fn with_timer(mut self, timer: Box<dyn Timer>) -> Self {
        self.timer = Some(timer);
        self
    }

    pub fn with_counter(mut self, counter: Box<dyn Counter>) -> Self {
        self.counter = Some(counter);
        self
    }

    /// Advance transitions and the countdown
    pub fn update(&mut self, dt: f64) {
        self.display.update(dt);
        if let Some(deck) = self.deck.as_mut() {
            deck.update(dt);
        }
        if let Some(timer) = self.timer.as_mut() {
            timer.update(dt);
        }
    }

    /// A missing timer never expires
    pub fn timer_expired(&self) -> bool {
        self.timer.as_ref().map(|t| t.is_expired()).unwrap_or(false)
    }

    /// The answer just signalled correct, or the operation's own value when
    /// the display holds no usable number
    pub fn accepted_answer(&self) -> Option<MixedNumber> {
        self.display
            .answer()
            .filter(MixedNumber::is_valid)
            .or_else(|| self.display.operation().and_then(|o| o.evaluate_strict()))
    }

    pub fn deck_busy(&self) -> bool {
        self.deck.as_ref().map(|d| d.is_busy()).unwrap_or(false)
    }

    pub fn set_timer_active(&mut self, active: bool) {
        if let Some(timer) = self.timer.as_mut() {
            timer.set_active(active);
        }
    }

    /// Stop, configure and rewind the timer for a new phase
    pub fn prepare_timer(&mut self, seconds: f64) {
        if let Some(timer) = self.timer.as_mut() {
            timer.set_active(false);
            timer.set_delay(seconds);
            timer.reset_value();
        }
    }

    pub fn show_deck(&mut self) -> bool {
        match self.deck.as_mut() {
            Some(deck) => {
                deck.show();
                true
            }
            None => false,
        }
    }

    pub fn hide_deck(&mut self) -> bool {
        match self.deck.as_mut() {
            Some(deck) => {
                deck.hide();
                true
            }
            None => false,
        }
    }

    pub fn fill_deck(&mut self, numbers: &[MixedNumber]) {
        if let Some(deck) = self.deck.as_mut() {
            deck.fill(numbers);
        }
    }

    pub fn clear_deck(&mut self) {
        if let Some(deck) = self.deck.as_mut() {
            deck.clear();
        }
    }
}

impl std::fmt::Debug for PhaseWidgets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhaseWidgets")
            .field("deck", &self.deck.is_some())
            .field("timer", &self.timer.is_some())
            .field("counter", &self.counter.is_some())
            .field("answer", &self.answer)
            .finish()
    }
}
