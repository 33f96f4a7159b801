//! Battle configuration loader (.json)
//!
//! A battle file names the two fighters, configures the attack and defense
//! phases and the score table. Numbers are written in mixed-number
//! notation (`"1 3/4"`, `"-1/2"`), operation templates as flat expressions
//! (`"{1/2, 3/4} + _"`). Everything except the fighters has a default.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::ActionTimings;
use crate::game::attack::AttackSettings;
use crate::game::defense::DefenseSettings;
use crate::game::headless::UiConfig;
use crate::game::scoring::{ScoreTable, VictoryStatFlags};
use crate::{CombatError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterConfig {
    pub name: String,
    pub hp: f64,
    #[serde(default)]
    pub timings: ActionTimings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleConfig {
    #[serde(default)]
    pub name: String,
    pub player: CharacterConfig,
    pub enemy: CharacterConfig,
    #[serde(default)]
    pub attack: Option<AttackSettings>,
    #[serde(default)]
    pub defense: Option<DefenseSettings>,
    #[serde(default)]
    pub score: ScoreTable,
    #[serde(default)]
    pub stats: VictoryStatFlags,
    /// Rounds before the battle is called off; 0 never calls it off
    #[serde(default = "default_max_rounds")]
    pub max_rounds: u32,
    #[serde(default)]
    pub ui: UiConfig,
}

fn default_max_rounds() -> u32 {
    20
}

impl BattleConfig {
    /// Check what serde cannot
    pub fn validate(&self) -> Result<()> {
        for character in [&self.player, &self.enemy] {
            if !(character.hp > 0.0) {
                return Err(CombatError::InvalidConfig(format!(
                    "{} needs positive HP, got {}",
                    character.name, character.hp
                )));
            }
        }

        if self.attack.is_none() && self.defense.is_none() {
            return Err(CombatError::InvalidConfig(
                "battle needs an attack or a defense phase".to_string(),
            ));
        }

        if let Some(attack) = &self.attack {
            if attack.attack_count == 0 {
                return Err(CombatError::InvalidConfig(
                    "attack_count must be at least 1".to_string(),
                ));
            }
            if attack.operation.is_none() && attack.op_count == 0 {
                return Err(CombatError::InvalidConfig(
                    "attack op_count must be at least 1".to_string(),
                ));
            }
            if self.ui.deck && attack.groups.is_empty() {
                return Err(CombatError::InvalidConfig(
                    "attack has no number groups for the deck".to_string(),
                ));
            }
            check_duration("attack", attack.duration)?;
        }

        if let Some(defense) = &self.defense {
            if defense.op_count < 2 {
                return Err(CombatError::InvalidConfig(
                    "defense op_count must be at least 2".to_string(),
                ));
            }
            if defense.attack_groups.iter().all(|g| g.numbers.is_empty()) {
                return Err(CombatError::InvalidConfig(
                    "defense has no incoming damage numbers".to_string(),
                ));
            }
            if self.ui.deck && defense.groups.is_empty() {
                return Err(CombatError::InvalidConfig(
                    "defense has no number groups for the deck".to_string(),
                ));
            }
            check_duration("defense", defense.duration)?;
        }

        Ok(())
    }
}

fn check_duration(phase: &str, duration: f64) -> Result<()> {
    if duration > 0.0 {
        Ok(())
    } else {
        Err(CombatError::InvalidConfig(format!(
            "{} duration must be positive, got {}",
            phase, duration
        )))
    }
}

/// Built-in battle used when no file is given
pub const DEFAULT_BATTLE: &str = r#"{
    "name": "Slime Meadow",
    "player": { "name": "Hero", "hp": 5 },
    "enemy": { "name": "Slime", "hp": 4 },
    "attack": {
        "attack_count": 2,
        "duration": 20,
        "groups": [
            { "name": "quarters", "numbers": ["1/4", "1/2", "3/4", "1 1/4"] },
            { "name": "thirds", "numbers": ["1/3", "2/3", "1 1/3", "1"] }
        ]
    },
    "defense": {
        "duration": 15,
        "attack_groups": [
            { "name": "slime", "numbers": ["2", "2 1/2", "3"] }
        ],
        "groups": [
            { "name": "blocks", "numbers": ["1/2", "3/4", "1", "1 1/4"] }
        ]
    }
}"#;

/// Battle configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    pub fn load_from_file(path: &Path) -> Result<BattleConfig> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub async fn load_async(path: &Path) -> Result<BattleConfig> {
        let content = tokio::fs::read_to_string(path).await?;
        Self::parse(&content)
    }

    /// Parse and validate a battle from JSON text
    pub fn parse(content: &str) -> Result<BattleConfig> {
        let config: BattleConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn default_battle() -> Result<BattleConfig> {
        Self::parse(DEFAULT_BATTLE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::MixedNumber;

    #[test]
    fn test_default_battle_parses() {
        let config = ConfigLoader::default_battle().unwrap();
        assert_eq!(config.enemy.name, "Slime");
        assert_eq!(config.max_rounds, 20);

        let attack = config.attack.as_ref().unwrap();
        assert_eq!(attack.attack_count, 2);
        assert_eq!(attack.groups[0].numbers[3], MixedNumber::new(false, 1, 1, 4));
        assert_eq!(attack.hit_delay, 0.5);
        assert_eq!(config.defense.as_ref().unwrap().post_delay, 2.0);
        assert_eq!(config.score.victory, 1000);
        assert!(config.ui.timer);
    }

    #[test]
    fn test_operation_template() {
        let config = ConfigLoader::parse(
            r#"{
                "player": { "name": "Hero", "hp": 3 },
                "enemy": { "name": "Bat", "hp": 2 },
                "attack": {
                    "operation": "{1/2, 1/4} + _",
                    "groups": [{ "numbers": ["1/4", 1] }]
                }
            }"#,
        )
        .unwrap();
        let attack = config.attack.unwrap();
        assert_eq!(attack.operation.unwrap().to_string(), "{1/2, 1/4} + _");
        assert_eq!(attack.groups[0].numbers[1], MixedNumber::from_whole(1));
        assert!(config.defense.is_none());
    }

    #[test]
    fn test_rejects_invalid_battles() {
        let no_phase = r#"{
            "player": { "name": "Hero", "hp": 3 },
            "enemy": { "name": "Bat", "hp": 2 }
        }"#;
        assert!(matches!(
            ConfigLoader::parse(no_phase),
            Err(CombatError::InvalidConfig(_))
        ));

        let dead_enemy = DEFAULT_BATTLE.replace(r#""hp": 4"#, r#""hp": 0"#);
        assert!(ConfigLoader::parse(&dead_enemy).is_err());

        let bad_number = DEFAULT_BATTLE.replace("1 1/4", "1 1/");
        assert!(matches!(
            ConfigLoader::parse(&bad_number),
            Err(CombatError::SerializationError(_))
        ));

        let zero_attacks = DEFAULT_BATTLE.replace(r#""attack_count": 2"#, r#""attack_count": 0"#);
        assert!(ConfigLoader::parse(&zero_attacks).is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let result = ConfigLoader::load_from_file(Path::new("no/such/battle.json"));
        assert!(matches!(result, Err(CombatError::IoError(_))));
    }

    #[tokio::test]
    async fn test_load_async() {
        let path = std::env::temp_dir().join(format!("battle-{}.json", std::process::id()));
        tokio::fs::write(&path, DEFAULT_BATTLE).await.unwrap();
        let config = ConfigLoader::load_async(&path).await.unwrap();
        tokio::fs::remove_file(&path).await.unwrap();
        assert_eq!(config.name, "Slime Meadow");
    }
}
