//! Interactive controller for human players
//!
//! Shows the pending operation and deck, then reads one line per question:
//!
//! - `0 2 = 1 1/4` drops deck cards 0 and 2 onto the empty operands, in
//!   order, and answers `1 1/4`
//! - `= 3/4` answers without placing cards (operands already full)
//! - `hint` prints the answer the deck's first cards would give
//! - empty line waits (the clock keeps running)

use std::io::{self, BufRead, Write};

use crate::core::{parse_mixed_number, MixedNumber};
use crate::game::agent::{available_cards, solve, AnswerController, AnswerView, Submission};
use crate::{CombatError, Result};

pub struct InteractiveController<R, W> {
    input: R,
    output: W,
    closed: bool,
}

impl InteractiveController<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio() -> Self {
        InteractiveController::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> InteractiveController<R, W> {
    pub fn new(input: R, output: W) -> Self {
        InteractiveController {
            input,
            output,
            closed: false,
        }
    }

    /// True once the input has reached end of file
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn into_output(self) -> W {
        self.output
    }

    fn show(&mut self, view: &AnswerView) -> io::Result<()> {
        writeln!(self.output, "[{}] {} = ?", view.phase, view.operation)?;
        let cards = available_cards(view.deck);
        if !cards.is_empty() {
            write!(self.output, "  deck:")?;
            for (index, number) in cards {
                write!(self.output, "  {}) {}", index, number)?;
            }
            writeln!(self.output)?;
        }
        if let Some(timer) = view.timer {
            writeln!(self.output, "  time left: {:.0}%", timer * 100.0)?;
        }
        write!(self.output, "> ")?;
        self.output.flush()
    }

    fn read_line(&mut self) -> Option<String> {
        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) | Err(_) => {
                self.closed = true;
                None
            }
            Ok(_) => Some(line.trim().to_string()),
        }
    }
}

/// Parse `cards = answer` against the empty operands of the view
pub fn parse_submission(line: &str, view: &AnswerView) -> Result<Submission> {
    let (cards, answer) = line.split_once('=').ok_or_else(|| {
        CombatError::InvalidNotation(format!("expected 'cards = answer', got '{}'", line))
    })?;

    let answer: MixedNumber = parse_mixed_number(answer)?;
    let cards = cards
        .split_whitespace()
        .map(|card| {
            card.parse::<usize>()
                .map_err(|_| CombatError::InvalidNotation(format!("bad card index '{}'", card)))
        })
        .collect::<Result<Vec<usize>>>()?;

    let empty_slots = view
        .operation
        .operands()
        .iter()
        .enumerate()
        .filter(|(_, operand)| operand.is_empty())
        .map(|(slot, _)| slot);
    let fills: Vec<(usize, usize)> = empty_slots.zip(cards.iter().copied()).collect();
    if fills.len() != cards.len() {
        return Err(CombatError::InvalidNotation(format!(
            "{} cards for {} empty operands",
            cards.len(),
            fills.len()
        )));
    }
    if let Some(&(_, card)) = fills
        .iter()
        .find(|(_, card)| view.deck.get(*card).copied().flatten().is_none())
    {
        return Err(CombatError::InvalidNotation(format!(
            "card {} is not in the deck",
            card
        )));
    }

    Ok(Submission { fills, answer })
}

impl<R: BufRead, W: Write> AnswerController for InteractiveController<R, W> {
    fn name(&self) -> &str {
        "interactive"
    }

    fn poll(&mut self, view: &AnswerView, _dt: f64) -> Option<Submission> {
        if self.closed {
            return None;
        }
        if self.show(view).is_err() {
            self.closed = true;
            return None;
        }

        let line = self.read_line()?;
        match line.as_str() {
            "" => None,
            "hint" => {
                let hint = solve(view.operation, view.deck)
                    .map(|s| s.answer.to_string())
                    .unwrap_or_else(|| "not enough cards".to_string());
                let _ = writeln!(self.output, "  hint: {}", hint);
                None
            }
            line => match parse_submission(line, view) {
                Ok(submission) => Some(submission),
                Err(e) => {
                    let _ = writeln!(self.output, "  {}", e);
                    None
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{MixedNumberOps, Operator};
    use crate::game::events::PhaseKind;
    use std::io::Cursor;

    fn frac(n: u32, d: u32) -> MixedNumber {
        MixedNumber::from_fraction(n, d)
    }

    #[test]
    fn test_reads_submission() {
        let operation = MixedNumberOps::uniform(2, Operator::Add);
        let deck = [Some(frac(1, 2)), Some(frac(1, 3)), Some(frac(1, 4))];
        let view = AnswerView {
            phase: PhaseKind::Attack,
            operation: &operation,
            deck: &deck,
            timer: Some(0.5),
        };
        let input = Cursor::new("\nhint\n2 0 = 3/4\n");
        let mut controller = InteractiveController::new(input, Vec::new());

        assert!(controller.poll(&view, 0.1).is_none());
        assert!(controller.poll(&view, 0.1).is_none());
        let submission = controller.poll(&view, 0.1).unwrap();
        assert_eq!(submission.fills, vec![(0, 2), (1, 0)]);
        assert_eq!(submission.answer, frac(3, 4));

        assert!(controller.poll(&view, 0.1).is_none());
        assert!(controller.is_closed());

        let output = String::from_utf8(controller.into_output()).unwrap();
        assert!(output.contains("[attack] _ + _ = ?"));
        assert!(output.contains("hint: 5/6"));
        assert!(output.contains("time left: 50%"));
    }

    #[test]
    fn test_rejects_bad_lines() {
        let operation = MixedNumberOps::uniform(2, Operator::Add);
        let deck = [Some(frac(1, 2)), None];
        let view = AnswerView {
            phase: PhaseKind::Defense,
            operation: &operation,
            deck: &deck,
            timer: None,
        };
        assert!(parse_submission("0 1", &view).is_err());
        assert!(parse_submission("0 = x", &view).is_err());
        assert!(parse_submission("0 0 0 = 1", &view).is_err());
        assert!(parse_submission("0 1 = 1", &view).is_err());
        assert!(parse_submission("0 = 1/2", &view).is_ok());
    }
}
