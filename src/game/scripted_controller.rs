//! Scripted answer controller for tests and reproducible runs
//!
//! Follows a fixed list of steps, one per question asked. A step waits
//! its delay, then answers correctly, wrongly, or with a given value:
//!
//! ```text
//! correct, wrong@1.5, 3/4@0.2, correct
//! ```
//!
//! Once the script runs out the controller stops answering.

use std::collections::VecDeque;
use std::str::FromStr;

use crate::core::{parse_mixed_number, MixedNumber};
use crate::game::agent::{solve, AnswerController, AnswerView, Submission};
use crate::{CombatError, Result};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScriptedAnswer {
    Correct,
    /// Correct answer plus one
    Wrong,
    Value(MixedNumber),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScriptStep {
    pub answer: ScriptedAnswer,
    /// Seconds to wait before answering
    pub delay: f64,
}

impl FromStr for ScriptStep {
    type Err = CombatError;

    fn from_str(s: &str) -> Result<Self> {
        let (answer, delay) = match s.split_once('@') {
            Some((answer, delay)) => {
                let delay: f64 = delay.trim().parse().map_err(|_| {
                    CombatError::InvalidNotation(format!("bad delay in script step '{}'", s))
                })?;
                (answer.trim(), delay)
            }
            None => (s.trim(), 0.0),
        };
        let answer = match answer {
            "correct" => ScriptedAnswer::Correct,
            "wrong" => ScriptedAnswer::Wrong,
            value => ScriptedAnswer::Value(parse_mixed_number(value)?),
        };
        Ok(ScriptStep { answer, delay })
    }
}

pub struct ScriptedController {
    steps: VecDeque<ScriptStep>,
    waited: f64,
}

impl ScriptedController {
    pub fn new(steps: Vec<ScriptStep>) -> Self {
        ScriptedController {
            steps: steps.into(),
            waited: 0.0,
        }
    }

    /// Comma separated steps
    pub fn parse(script: &str) -> Result<Self> {
        let steps = script
            .split(',')
            .map(str::trim)
            .filter(|step| !step.is_empty())
            .map(str::parse)
            .collect::<Result<Vec<ScriptStep>>>()?;
        Ok(ScriptedController::new(steps))
    }

    pub fn remaining(&self) -> usize {
        self.steps.len()
    }

    pub fn is_exhausted(&self) -> bool {
        self.steps.is_empty()
    }
}

impl AnswerController for ScriptedController {
    fn name(&self) -> &str {
        "scripted"
    }

    fn poll(&mut self, view: &AnswerView, dt: f64) -> Option<Submission> {
        let step = *self.steps.front()?;
        self.waited += dt;
        if self.waited + 1e-9 < step.delay {
            return None;
        }

        let mut submission = solve(view.operation, view.deck)?;
        match step.answer {
            ScriptedAnswer::Correct => {}
            ScriptedAnswer::Wrong => submission.answer += MixedNumber::from_whole(1),
            ScriptedAnswer::Value(value) => submission.answer = value,
        }
        self.steps.pop_front();
        self.waited = 0.0;
        Some(submission)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{MixedNumberOps, Operator};
    use crate::game::events::PhaseKind;

    #[test]
    fn test_parse_script() {
        let controller = ScriptedController::parse("correct, wrong@1.5, 1 1/2@0.2,").unwrap();
        assert_eq!(controller.remaining(), 3);
        assert_eq!(
            controller.steps[1],
            ScriptStep {
                answer: ScriptedAnswer::Wrong,
                delay: 1.5
            }
        );
        assert_eq!(
            controller.steps[2].answer,
            ScriptedAnswer::Value(MixedNumber::new(false, 1, 1, 2))
        );

        assert!(ScriptedController::parse("correct@soon").is_err());
        assert!(ScriptedController::parse("maybe").is_err());
    }

    #[test]
    fn test_follows_script() {
        let operation = MixedNumberOps::uniform(2, Operator::Add);
        let deck = [
            Some(MixedNumber::from_fraction(1, 2)),
            Some(MixedNumber::from_fraction(1, 2)),
        ];
        let view = AnswerView {
            phase: PhaseKind::Attack,
            operation: &operation,
            deck: &deck,
            timer: None,
        };
        let mut controller = ScriptedController::parse("wrong@0.2, correct").unwrap();

        assert!(controller.poll(&view, 0.1).is_none());
        let wrong = controller.poll(&view, 0.1).unwrap();
        assert_eq!(wrong.answer.value(), 2.0);

        let right = controller.poll(&view, 0.1).unwrap();
        assert_eq!(right.answer.value(), 1.0);

        assert!(controller.is_exhausted());
        assert!(controller.poll(&view, 0.1).is_none());
    }
}
