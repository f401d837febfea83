//! Beast identity and damage computation.

use arena_common::{Address, BeastId};
use serde::{Deserialize, Serialize};

use crate::attack::{is_favored_attack, AttackType};
use crate::element::{calculate_effectiveness, BeastType, NORMAL_EFFECTIVENESS, SUPER_EFFECTIVE};

/// Flat bonus added to every hit before level.
pub const BASE_LEVEL_BONUS: u16 = 10;
/// Damage percentage for a favored attack.
pub const FAVORED_MULTIPLIER: u16 = 120;
/// Damage percentage for any other attack.
pub const NORMAL_MULTIPLIER: u16 = 100;
/// Experience cost of one level, multiplied by the current level.
pub const EXPERIENCE_PER_LEVEL: u16 = 100;
/// Level cap.
pub const MAX_LEVEL: u8 = 100;

/// A combatant owned by a player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Beast {
    /// Owning player.
    pub player: Address,
    /// Beast id.
    pub beast_id: BeastId,
    /// Current level (starts at 1).
    pub level: u8,
    /// Experience toward the next level.
    pub experience: u16,
    /// Elemental type.
    pub beast_type: BeastType,
}

/// Outcome of a damage computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackResult {
    /// Damage to apply to the defender.
    pub damage: u16,
    /// Whether the attack was in the attacker's favored set.
    pub is_favored: bool,
    /// Whether the matchup was super effective.
    pub is_super_effective: bool,
}

impl Beast {
    /// Creates a level-1 beast with no experience.
    #[must_use]
    pub fn new(player: Address, beast_id: BeastId, beast_type: BeastType) -> Self {
        Self {
            player,
            beast_id,
            level: 1,
            experience: 0,
            beast_type,
        }
    }

    /// Set the level.
    #[must_use]
    pub fn with_level(mut self, level: u8) -> Self {
        self.level = level.clamp(1, MAX_LEVEL);
        self
    }

    /// Computes damage against a defender of `target_type`.
    ///
    /// `attack_factor` is a percentage applied to the attack's base power.
    /// The result must be applied by the caller; nothing is mutated here.
    #[must_use]
    pub fn attack(
        &self,
        target_type: BeastType,
        attack_type: AttackType,
        attack_factor: u16,
    ) -> AttackResult {
        let is_favored = is_favored_attack(self.beast_type, attack_type);
        let effectiveness = calculate_effectiveness(self.beast_type, target_type);
        let favored_multiplier = if is_favored {
            FAVORED_MULTIPLIER
        } else {
            NORMAL_MULTIPLIER
        };

        let damage = compute_damage(
            attack_type.base_power(),
            attack_factor,
            self.level,
            favored_multiplier,
            effectiveness,
        );

        AttackResult {
            damage,
            is_favored,
            is_super_effective: effectiveness == SUPER_EFFECTIVE,
        }
    }

    /// Adds experience and returns the number of levels gained.
    pub fn gain_experience(&mut self, amount: u16) -> u8 {
        self.experience = self.experience.saturating_add(amount);
        let mut gained = 0;
        while self.level < MAX_LEVEL {
            let cost = EXPERIENCE_PER_LEVEL.saturating_mul(u16::from(self.level));
            if self.experience < cost {
                break;
            }
            self.experience -= cost;
            self.level += 1;
            gained += 1;
        }
        gained
    }
}

/// The damage formula, step by step with truncating division.
///
/// `((base_power * attack_factor / 100) + BASE_LEVEL_BONUS + level)`,
/// then `* favored / 100`, then `* effectiveness / 100`.
#[must_use]
pub fn compute_damage(
    base_power: u16,
    attack_factor: u16,
    level: u8,
    favored_multiplier: u16,
    effectiveness: u16,
) -> u16 {
    let level_bonus = BASE_LEVEL_BONUS.saturating_add(u16::from(level));
    let scaled = base_power.saturating_mul(attack_factor) / 100;
    let raw = scaled.saturating_add(level_bonus);
    let favored = raw.saturating_mul(favored_multiplier) / 100;
    favored.saturating_mul(effectiveness) / 100
}

/// Damage of the same attack with no favored bonus at neutral effectiveness.
#[must_use]
pub fn baseline_damage(base_power: u16, attack_factor: u16, level: u8) -> u16 {
    compute_damage(
        base_power,
        attack_factor,
        level,
        NORMAL_MULTIPLIER,
        NORMAL_EFFECTIVENESS,
    )
}
