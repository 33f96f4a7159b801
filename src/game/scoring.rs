//! Victory summary and score table

use serde::{Deserialize, Serialize};

use crate::core::MixedNumber;

/// Which stats the victory screen shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VictoryStatFlags {
    pub attack: bool,
    pub defense: bool,
    pub rounds: bool,
    pub revive: bool,
}

impl Default for VictoryStatFlags {
    fn default() -> Self {
        VictoryStatFlags {
            attack: true,
            defense: true,
            rounds: true,
            revive: true,
        }
    }
}

/// Summary handed to the victory reporter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VictoryInfo {
    pub attack_value: MixedNumber,
    pub defense_value: MixedNumber,
    pub rounds: u32,
    pub revives: u32,
    pub flags: VictoryStatFlags,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreTable {
    pub victory: i64,
    pub attack_multiplier: f64,
    pub defense_multiplier: f64,
    pub revive_penalty: f64,
    /// Rounds at or above par earn no round bonus
    pub round_par: u32,
    pub round_bonus: f64,
}

impl Default for ScoreTable {
    fn default() -> Self {
        ScoreTable {
            victory: 1000,
            attack_multiplier: 100.0,
            defense_multiplier: 100.0,
            revive_penalty: 100.0,
            round_par: 5,
            round_bonus: 100.0,
        }
    }
}

/// Per-stat points; the flags only decide which rows a summary shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub attack: i64,
    pub defense: i64,
    pub rounds: i64,
    pub victory: i64,
    pub revive_penalty: i64,
    pub total: i64,
}

impl ScoreTable {
    /// Halves round to even, as the victory screen always has
    pub fn score(&self, info: &VictoryInfo) -> ScoreBreakdown {
        let attack = (info.attack_value.value() * self.attack_multiplier).ceil() as i64;
        let defense = (info.defense_value.value() * self.defense_multiplier).ceil() as i64;
        let under_par = self.round_par as f64 - info.rounds as f64;
        let rounds = ((under_par * self.round_bonus).round_ties_even() as i64).max(0);
        let revive_penalty = (info.revives as f64 * self.revive_penalty).round_ties_even() as i64;

        ScoreBreakdown {
            attack,
            defense,
            rounds,
            victory: self.victory,
            revive_penalty,
            total: attack + defense + rounds + self.victory - revive_penalty,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(attack: MixedNumber, defense: MixedNumber, rounds: u32, revives: u32) -> VictoryInfo {
        VictoryInfo {
            attack_value: attack,
            defense_value: defense,
            rounds,
            revives,
            flags: VictoryStatFlags::default(),
        }
    }

    #[test]
    fn test_default_table() {
        let table = ScoreTable::default();
        let score = table.score(&info(
            MixedNumber::new(false, 3, 1, 3),
            MixedNumber::from_fraction(1, 2),
            2,
            1,
        ));
        // ceil(333.33) + ceil(50) + 300 + 1000 - 100
        assert_eq!(score.attack, 334);
        assert_eq!(score.defense, 50);
        assert_eq!(score.rounds, 300);
        assert_eq!(score.revive_penalty, 100);
        assert_eq!(score.total, 1584);
    }

    #[test]
    fn test_round_bonus_never_negative() {
        let table = ScoreTable::default();
        let score = table.score(&info(MixedNumber::ZERO, MixedNumber::ZERO, 9, 0));
        assert_eq!(score.rounds, 0);
        assert_eq!(score.total, 1000);
    }

    #[test]
    fn test_hidden_stats_still_count() {
        let table = ScoreTable::default();
        let mut summary = info(MixedNumber::from_whole(2), MixedNumber::from_whole(1), 1, 3);
        let shown = table.score(&summary);
        summary.flags = VictoryStatFlags {
            attack: true,
            defense: false,
            rounds: false,
            revive: false,
        };
        let hidden = table.score(&summary);

        // 200 + 100 + 400 + 1000 - 300
        assert_eq!(shown.total, 1400);
        assert_eq!(hidden, shown);
    }

    #[test]
    fn test_halves_round_to_even() {
        let table = ScoreTable {
            revive_penalty: 2.5,
            round_bonus: 0.5,
            ..ScoreTable::default()
        };
        // (5 - 0) * 0.5 = 2.5 -> 2, 1 * 2.5 -> 2, 3 * 2.5 = 7.5 -> 8
        let score = table.score(&info(MixedNumber::ZERO, MixedNumber::ZERO, 0, 1));
        assert_eq!(score.rounds, 2);
        assert_eq!(score.revive_penalty, 2);
        let score = table.score(&info(MixedNumber::ZERO, MixedNumber::ZERO, 0, 3));
        assert_eq!(score.revive_penalty, 8);
    }
}
