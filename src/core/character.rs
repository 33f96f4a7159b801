//! Combat characters
//!
//! A combatant owns its HP and a cosmetic action state. Changing the action
//! starts that action's animation, and the combatant reports busy until the
//! animation time has run out on the virtual clock.

use serde::{Deserialize, Serialize};

/// Cosmetic action state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Action {
    #[default]
    Idle,
    Enter,
    Attack,
    Defend,
    Hurt,
    Death,
    Revive,
    Victory,
}

/// Animation length of each action, in seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionTimings {
    pub enter: f64,
    pub attack: f64,
    pub defend: f64,
    pub hurt: f64,
    pub death: f64,
    pub revive: f64,
    pub victory: f64,
}

impl Default for ActionTimings {
    fn default() -> Self {
        ActionTimings {
            enter: 0.5,
            attack: 0.4,
            defend: 0.0,
            hurt: 0.3,
            death: 1.0,
            revive: 1.0,
            victory: 1.0,
        }
    }
}

impl ActionTimings {
    /// No animation time at all
    pub fn instant() -> Self {
        ActionTimings {
            enter: 0.0,
            attack: 0.0,
            defend: 0.0,
            hurt: 0.0,
            death: 0.0,
            revive: 0.0,
            victory: 0.0,
        }
    }

    pub fn duration(&self, action: Action) -> f64 {
        match action {
            Action::Idle => 0.0,
            Action::Enter => self.enter,
            Action::Attack => self.attack,
            Action::Defend => self.defend,
            Action::Hurt => self.hurt,
            Action::Death => self.death,
            Action::Revive => self.revive,
            Action::Victory => self.victory,
        }
    }
}

/// A fighter with HP clamped to `0..=hp_max`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Combatant {
    pub name: String,
    hp_max: f64,
    hp_current: f64,
    action: Action,
    busy_remaining: f64,
    timings: ActionTimings,
}

impl Combatant {
    pub fn new(name: impl Into<String>, hp_max: f64) -> Self {
        let hp_max = hp_max.max(0.0);
        Combatant {
            name: name.into(),
            hp_max,
            hp_current: hp_max,
            action: Action::Idle,
            busy_remaining: 0.0,
            timings: ActionTimings::default(),
        }
    }

    pub fn with_timings(mut self, timings: ActionTimings) -> Self {
        self.timings = timings;
        self
    }

    pub fn hp(&self) -> f64 {
        self.hp_current
    }

    pub fn hp_max(&self) -> f64 {
        self.hp_max
    }

    pub fn set_hp(&mut self, hp: f64) {
        self.hp_current = hp.clamp(0.0, self.hp_max);
    }

    /// Subtract HP; negative amounts are ignored
    pub fn take_damage(&mut self, amount: f64) {
        if amount > 0.0 {
            self.set_hp(self.hp_current - amount);
        }
    }

    /// Back to full HP
    pub fn restore(&mut self) {
        self.hp_current = self.hp_max;
    }

    pub fn is_alive(&self) -> bool {
        self.hp_current > 0.0
    }

    pub fn action(&self) -> Action {
        self.action
    }

    /// Switch action and start its animation
    pub fn set_action(&mut self, action: Action) {
        self.action = action;
        self.busy_remaining = self.timings.duration(action);
    }

    pub fn is_busy(&self) -> bool {
        self.busy_remaining > 0.0
    }

    /// Advance the action animation
    pub fn update(&mut self, dt: f64) {
        if self.busy_remaining > 0.0 {
            self.busy_remaining = (self.busy_remaining - dt).max(0.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combatant_creation() {
        let c = Combatant::new("Hero", 10.0);
        assert_eq!(c.hp(), 10.0);
        assert_eq!(c.hp_max(), 10.0);
        assert_eq!(c.action(), Action::Idle);
        assert!(c.is_alive());
        assert!(!c.is_busy());
    }

    #[test]
    fn test_hp_is_clamped() {
        let mut c = Combatant::new("Slime", 5.0);
        c.take_damage(2.5);
        assert_eq!(c.hp(), 2.5);

        c.take_damage(-4.0);
        assert_eq!(c.hp(), 2.5);

        c.take_damage(10.0);
        assert_eq!(c.hp(), 0.0);
        assert!(!c.is_alive());

        c.set_hp(99.0);
        assert_eq!(c.hp(), 5.0);

        c.set_hp(0.0);
        c.restore();
        assert_eq!(c.hp(), 5.0);
    }

    #[test]
    fn test_action_busy_time() {
        let mut c = Combatant::new("Hero", 10.0);
        c.set_action(Action::Attack);
        assert!(c.is_busy());

        c.update(0.25);
        assert!(c.is_busy());
        c.update(0.25);
        assert!(!c.is_busy());

        c.set_action(Action::Idle);
        assert!(!c.is_busy());
    }

    #[test]
    fn test_instant_timings() {
        let mut c = Combatant::new("Hero", 10.0).with_timings(ActionTimings::instant());
        c.set_action(Action::Death);
        assert!(!c.is_busy());
    }
}
