//! Plumbing shared by the attack and defense phases

use rand_chacha::ChaCha12Rng;

use crate::core::Combatant;
use crate::game::collaborators::PhaseWidgets;
use crate::game::events::CombatEvent;
use crate::game::logger::CombatLogger;
use crate::game::wait::{Busy, Wait};

/// Result of ticking a phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseStatus {
    /// Suspended, tick again
    Running,
    /// Ran to completion
    Finished,
    /// Aborted by `stop()`
    Stopped,
}

/// Session state a phase borrows for one tick
pub struct PhaseContext<'a> {
    pub attacker: &'a mut Combatant,
    pub defender: &'a mut Combatant,
    pub rng: &'a mut ChaCha12Rng,
    pub logger: &'a CombatLogger,
    pub events: &'a mut Vec<CombatEvent>,
}

impl<'a> PhaseContext<'a> {
    pub fn emit(&mut self, event: CombatEvent) {
        self.logger.event(&event);
        self.events.push(event);
    }

    /// Whether the target of an `UntilIdle` wait is still busy
    pub fn is_busy(&self, target: Busy, widgets: &PhaseWidgets) -> bool {
        match target {
            Busy::Display => widgets.display.is_busy(),
            Busy::Deck => widgets.deck_busy(),
            Busy::Attacker => self.attacker.is_busy(),
            Busy::Defender => self.defender.is_busy(),
            Busy::Characters => self.attacker.is_busy() || self.defender.is_busy(),
        }
    }

    pub fn wait_ready(&self, wait: &Wait, widgets: &PhaseWidgets) -> bool {
        let busy = wait
            .target()
            .map(|target| self.is_busy(target, widgets))
            .unwrap_or(false);
        wait.is_ready(busy)
    }
}
