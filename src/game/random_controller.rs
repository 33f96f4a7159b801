//! Random answer controller for simulations
//!
//! Thinks for a random time, drops random deck cards onto the empty
//! operands and, with probability `error_rate`, submits a wrong answer.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::core::MixedNumber;
use crate::game::agent::{available_cards, solve_with, AnswerController, AnswerView, Submission};

pub struct RandomController {
    rng: StdRng,
    think_time: (f64, f64),
    error_rate: f64,
    thinking: Option<f64>,
}

impl RandomController {
    /// Seeded controller; thinks 0.5 to 3 seconds and errs 20% of the time
    pub fn with_seed(seed: u64) -> Self {
        RandomController {
            rng: StdRng::seed_from_u64(seed),
            think_time: (0.5, 3.0),
            error_rate: 0.2,
            thinking: None,
        }
    }

    pub fn with_think_time(mut self, min: f64, max: f64) -> Self {
        let min = min.max(0.0);
        self.think_time = (min, max.max(min));
        self
    }

    pub fn with_error_rate(mut self, error_rate: f64) -> Self {
        self.error_rate = error_rate.clamp(0.0, 1.0);
        self
    }

    pub fn error_rate(&self) -> f64 {
        self.error_rate
    }
}

impl AnswerController for RandomController {
    fn name(&self) -> &str {
        "random"
    }

    fn poll(&mut self, view: &AnswerView, dt: f64) -> Option<Submission> {
        let (min, max) = self.think_time;
        let rng = &mut self.rng;
        let remaining = self
            .thinking
            .get_or_insert_with(|| rng.gen_range(min..=max));
        *remaining -= dt;
        if *remaining > 0.0 {
            return None;
        }
        self.thinking = None;

        let mut cards = available_cards(view.deck);
        cards.shuffle(&mut self.rng);
        let mut submission = solve_with(view.operation, cards)?;
        if self.rng.gen_bool(self.error_rate) {
            submission.answer += MixedNumber::from_whole(1);
        }
        Some(submission)
    }
}
