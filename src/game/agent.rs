//! Answer controller trait and the view it decides from
//!
//! The arena asks the controller for a submission on every tick the battle
//! waits for an answer. A controller looks at a read-only view of the
//! pending operation and the deck, and either returns the cards it drops
//! onto the empty operands plus its answer, or `None` to keep thinking.

use crate::core::{MixedNumber, MixedNumberOps};
use crate::game::arena::BattleResult;
use crate::game::events::PhaseKind;

/// Read-only view of a pending question
#[derive(Debug, Clone, Copy)]
pub struct AnswerView<'a> {
    pub phase: PhaseKind,
    /// Operation as currently shown, including filled operands
    pub operation: &'a MixedNumberOps,
    /// Deck cards; `None` marks a card already taken
    pub deck: &'a [Option<MixedNumber>],
    /// Normalized remaining time, if the phase has a timer
    pub timer: Option<f64>,
}

/// Cards to place and the answer to submit
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    /// (operand index, deck card index) pairs
    pub fills: Vec<(usize, usize)>,
    pub answer: MixedNumber,
}

pub trait AnswerController {
    fn name(&self) -> &str;

    /// Decide on the pending question; `dt` is the time since the last call
    fn poll(&mut self, view: &AnswerView, dt: f64) -> Option<Submission>;

    fn on_battle_end(&mut self, _result: &BattleResult) {}
}

/// Deck cards still available, with their index
pub fn available_cards(deck: &[Option<MixedNumber>]) -> Vec<(usize, MixedNumber)> {
    deck.iter()
        .enumerate()
        .filter_map(|(index, card)| card.map(|number| (index, number)))
        .collect()
}

/// Fill the empty operands with `cards` in order and compute the answer
///
/// Returns `None` if there are not enough cards for the empty operands.
pub fn solve_with<I>(operation: &MixedNumberOps, cards: I) -> Option<Submission>
where
    I: IntoIterator<Item = (usize, MixedNumber)>,
{
    let mut filled = operation.clone();
    let mut cards = cards.into_iter();
    let mut fills = Vec::new();

    for (slot, operand) in operation.operands().iter().enumerate() {
        if operand.is_empty() {
            let (card, number) = cards.next()?;
            filled.apply_number(slot, number);
            fills.push((slot, card));
        }
    }

    let answer = filled.evaluate_strict()?;
    Some(Submission { fills, answer })
}

/// Fill the empty operands from the front of the deck
pub fn solve(operation: &MixedNumberOps, deck: &[Option<MixedNumber>]) -> Option<Submission> {
    solve_with(operation, available_cards(deck))
}

/// Always answers at once, correctly, using the first cards in the deck
#[derive(Debug, Default)]
pub struct ZeroController;

impl ZeroController {
    pub fn new() -> Self {
        ZeroController
    }
}

impl AnswerController for ZeroController {
    fn name(&self) -> &str {
        "zero"
    }

    fn poll(&mut self, view: &AnswerView, _dt: f64) -> Option<Submission> {
        solve(view.operation, view.deck)
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
    fn test_solve_fills_in_order() {
        let operation = MixedNumberOps::uniform(2, Operator::Add);
        let deck = vec![None, Some(frac(1, 3)), Some(frac(1, 6)), Some(frac(1, 2))];
        let submission = solve(&operation, &deck).unwrap();
        assert_eq!(submission.fills, vec![(0, 1), (1, 2)]);
        assert_eq!(submission.answer, frac(1, 2));
    }

    #[test]
    fn test_solve_skips_filled_operands() {
        let mut operation = MixedNumberOps::uniform(3, Operator::Subtract);
        operation.apply_number(0, MixedNumber::from_whole(3));
        let deck = vec![Some(frac(1, 2)), Some(MixedNumber::from_whole(1))];
        let submission = solve(&operation, &deck).unwrap();
        assert_eq!(submission.fills, vec![(1, 0), (2, 1)]);
        assert_eq!(submission.answer.value(), 1.5);
    }

    #[test]
    fn test_solve_needs_enough_cards() {
        let operation = MixedNumberOps::uniform(3, Operator::Add);
        assert!(solve(&operation, &[Some(frac(1, 2))]).is_none());
    }

    #[test]
    fn test_zero_controller() {
        let operation: MixedNumberOps = "1/4 + _".parse().unwrap();
        let deck = [Some(frac(1, 2))];
        let view = AnswerView {
            phase: PhaseKind::Attack,
            operation: &operation,
            deck: &deck,
            timer: Some(1.0),
        };
        let mut controller = ZeroController::new();
        let submission = controller.poll(&view, 0.0).unwrap();
        assert_eq!(submission.fills, vec![(1, 0)]);
        assert_eq!(submission.answer, frac(3, 4));
    }
}
