//! Beast combat stats.
//!
//! This module provides:
//! - Stat rolls at spawn time, adjusted by element
//! - Damage and healing with saturating bounds
//! - Status application and the paralysis move check
//! - Level-up growth

use arena_common::{BeastId, ExecutionContext};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::element::{scale_percent, BeastType};
use crate::random::{
    generate_random_u8, roll_percent, RandomResult, ATTACK_SALT, DEFENSE_SALT, HP_SALT,
    PARALYSIS_SALT, SPEED_SALT,
};
use crate::status::{StatusCondition, PARALYSIS_SKIP_PERCENT};

/// Inclusive roll range for max hit points.
pub const HP_RANGE: (u8, u8) = (50, 100);
/// Inclusive roll range for attack.
pub const ATTACK_RANGE: (u8, u8) = (50, 100);
/// Inclusive roll range for defense.
pub const DEFENSE_RANGE: (u8, u8) = (50, 100);
/// Inclusive roll range for speed.
pub const SPEED_RANGE: (u8, u8) = (10, 50);

/// Mutable combat attributes of one beast.
///
/// `current_hp <= max_hp` holds after every operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeastStats {
    /// Beast these stats belong to.
    pub beast_id: BeastId,
    /// Maximum hit points.
    pub max_hp: u16,
    /// Current hit points.
    pub current_hp: u16,
    /// Attack power.
    pub attack: u16,
    /// Defense value.
    pub defense: u16,
    /// Speed value.
    pub speed: u16,
    /// Current status condition.
    pub status_condition: StatusCondition,
    /// Time of the last mutation.
    pub last_timestamp: u64,
}

impl BeastStats {
    /// Rolls fresh stats for a newly spawned beast.
    ///
    /// Each attribute uses its own salt. The element's multipliers apply
    /// first, then one level-up delta per level above 1.
    pub fn new(
        ctx: &ExecutionContext,
        beast_id: BeastId,
        beast_type: BeastType,
        level: u8,
    ) -> RandomResult<Self> {
        let seed = u64::from(beast_id.raw());
        let roll = |salt, (min, max): (u8, u8)| -> RandomResult<u16> {
            generate_random_u8(ctx, seed, salt, min, max).map(u16::from)
        };

        let multipliers = beast_type.stat_multipliers();
        let max_hp = scale_percent(roll(HP_SALT, HP_RANGE)?, multipliers.hp);
        let mut stats = Self {
            beast_id,
            max_hp,
            current_hp: max_hp,
            attack: scale_percent(roll(ATTACK_SALT, ATTACK_RANGE)?, multipliers.attack),
            defense: scale_percent(roll(DEFENSE_SALT, DEFENSE_RANGE)?, multipliers.defense),
            speed: scale_percent(roll(SPEED_SALT, SPEED_RANGE)?, multipliers.speed),
            status_condition: StatusCondition::None,
            last_timestamp: ctx.timestamp,
        };

        for _ in 1..level {
            stats.level_up(beast_type, ctx.timestamp);
        }

        debug!(
            beast = %beast_id,
            %beast_type,
            level,
            max_hp = stats.max_hp,
            attack = stats.attack,
            defense = stats.defense,
            speed = stats.speed,
            "rolled beast stats"
        );
        Ok(stats)
    }

    /// Create stats with fixed values (no roll).
    #[must_use]
    pub fn with_values(
        beast_id: BeastId,
        max_hp: u16,
        attack: u16,
        defense: u16,
        speed: u16,
    ) -> Self {
        Self {
            beast_id,
            max_hp,
            current_hp: max_hp,
            attack,
            defense,
            speed,
            status_condition: StatusCondition::None,
            last_timestamp: 0,
        }
    }

    /// Take damage, stopping at zero. Returns the damage actually taken.
    pub fn take_damage(&mut self, amount: u16, now: u64) -> u16 {
        let actual = amount.min(self.current_hp);
        self.current_hp -= actual;
        self.last_timestamp = now;
        actual
    }

    /// Heal, stopping at `max_hp`. Returns the hit points actually restored.
    pub fn heal(&mut self, amount: u16, now: u64) -> u16 {
        let healed = self.current_hp.saturating_add(amount).min(self.max_hp);
        let restored = healed.saturating_sub(self.current_hp);
        self.current_hp = healed;
        self.last_timestamp = now;
        restored
    }

    /// Check if defeated.
    #[must_use]
    pub fn is_defeated(&self) -> bool {
        self.current_hp == 0
    }

    /// Overwrite the status condition.
    pub fn apply_status(&mut self, status: StatusCondition, now: u64) {
        self.status_condition = status;
        self.last_timestamp = now;
    }

    /// Reset the status condition to `None`.
    pub fn clear_status(&mut self, now: u64) {
        self.apply_status(StatusCondition::None, now);
    }

    /// Whether this beast may act this turn.
    ///
    /// Paralysis skips the move 25% of the time. The roll is a pure
    /// function of the context, so asking twice in one block answers the
    /// same and nothing is recorded.
    #[must_use]
    pub fn can_attack(&self, ctx: &ExecutionContext) -> bool {
        match self.status_condition {
            StatusCondition::Paralyzed => {
                roll_percent(ctx, u64::from(self.beast_id.raw()), PARALYSIS_SALT)
                    .map_or(true, |roll| roll > PARALYSIS_SKIP_PERCENT)
            },
            _ => true,
        }
    }

    /// Apply one level of growth and restore hit points to full.
    pub fn level_up(&mut self, beast_type: BeastType, now: u64) {
        let delta = beast_type.level_up_delta();
        self.max_hp = self.max_hp.saturating_add(delta.hp);
        self.attack = self.attack.saturating_add(delta.attack);
        self.defense = self.defense.saturating_add(delta.defense);
        self.speed = self.speed.saturating_add(delta.speed);
        self.current_hp = self.max_hp;
        self.last_timestamp = now;
    }

    /// Get HP percentage (0-100).
    #[must_use]
    pub fn hp_percent(&self) -> u16 {
        if self.max_hp == 0 {
            0
        } else {
            (u32::from(self.current_hp) * 100 / u32::from(self.max_hp)) as u16
        }
    }
}
