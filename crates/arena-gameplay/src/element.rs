//! Elemental beast types and matchup rules.
//!
//! This module provides:
//! - The closed set of beast elements and its integer codec
//! - The effectiveness triangle (Light > Shadow > Magic > Light)
//! - Per-element spawn stat multipliers and level-up deltas

use serde::{Deserialize, Serialize};

/// Damage percentage for a favorable matchup.
pub const SUPER_EFFECTIVE: u16 = 150;
/// Damage percentage for a neutral matchup.
pub const NORMAL_EFFECTIVENESS: u16 = 100;
/// Damage percentage for an unfavorable matchup.
pub const NOT_VERY_EFFECTIVE: u16 = 50;

/// Elemental type of a beast.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum BeastType {
    /// Unknown or unset element.
    #[default]
    Undefined,
    /// Light element.
    Light,
    /// Magic element.
    Magic,
    /// Shadow element.
    Shadow,
}

impl BeastType {
    /// Every defined element, in code order.
    pub const ALL: [Self; 4] = [Self::Undefined, Self::Light, Self::Magic, Self::Shadow];

    /// Encodes to the stored integer code.
    #[must_use]
    pub const fn to_code(self) -> u8 {
        match self {
            Self::Undefined => 0,
            Self::Light => 1,
            Self::Magic => 2,
            Self::Shadow => 3,
        }
    }

    /// Decodes a stored integer code. Unknown codes decode to `Undefined`.
    #[must_use]
    pub const fn from_code(code: u8) -> Self {
        match code {
            1 => Self::Light,
            2 => Self::Magic,
            3 => Self::Shadow,
            _ => Self::Undefined,
        }
    }

    /// The element this one deals super-effective damage to.
    #[must_use]
    pub const fn beats(self) -> Option<Self> {
        match self {
            Self::Light => Some(Self::Shadow),
            Self::Magic => Some(Self::Light),
            Self::Shadow => Some(Self::Magic),
            Self::Undefined => None,
        }
    }

    /// Spawn-time stat multipliers for this element.
    #[must_use]
    pub const fn stat_multipliers(self) -> StatMultipliers {
        match self {
            Self::Light => StatMultipliers::new(100, 120, 90, 110),
            Self::Magic => StatMultipliers::new(90, 130, 80, 120),
            Self::Shadow => StatMultipliers::new(120, 100, 120, 80),
            Self::Undefined => StatMultipliers::IDENTITY,
        }
    }

    /// Stat growth applied on each level-up.
    #[must_use]
    pub const fn level_up_delta(self) -> StatDelta {
        match self {
            Self::Light => StatDelta::new(3, 2, 1, 2),
            Self::Magic => StatDelta::new(2, 3, 1, 2),
            Self::Shadow => StatDelta::new(4, 1, 3, 1),
            Self::Undefined => StatDelta::new(1, 1, 1, 1),
        }
    }

    /// Display name.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Undefined => "Undefined",
            Self::Light => "Light",
            Self::Magic => "Magic",
            Self::Shadow => "Shadow",
        }
    }
}

impl From<u8> for BeastType {
    fn from(code: u8) -> Self {
        Self::from_code(code)
    }
}

impl From<BeastType> for u8 {
    fn from(beast_type: BeastType) -> Self {
        beast_type.to_code()
    }
}

impl std::fmt::Display for BeastType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Percentage multipliers applied to rolled stats (100 = unchanged).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatMultipliers {
    /// Hit point percentage.
    pub hp: u16,
    /// Attack percentage.
    pub attack: u16,
    /// Defense percentage.
    pub defense: u16,
    /// Speed percentage.
    pub speed: u16,
}

impl StatMultipliers {
    /// Leaves every stat unchanged.
    pub const IDENTITY: Self = Self::new(100, 100, 100, 100);

    /// Creates a multiplier set.
    #[must_use]
    pub const fn new(hp: u16, attack: u16, defense: u16, speed: u16) -> Self {
        Self {
            hp,
            attack,
            defense,
            speed,
        }
    }
}

/// Applies a percentage to a stat, truncating toward zero.
#[must_use]
pub fn scale_percent(value: u16, percent: u16) -> u16 {
    let scaled = u32::from(value) * u32::from(percent) / 100;
    u16::try_from(scaled).unwrap_or(u16::MAX)
}

/// Flat stat growth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatDelta {
    /// Hit point growth.
    pub hp: u16,
    /// Attack growth.
    pub attack: u16,
    /// Defense growth.
    pub defense: u16,
    /// Speed growth.
    pub speed: u16,
}

impl StatDelta {
    /// Creates a delta.
    #[must_use]
    pub const fn new(hp: u16, attack: u16, defense: u16, speed: u16) -> Self {
        Self {
            hp,
            attack,
            defense,
            speed,
        }
    }
}

/// Damage percentage for `attacker` hitting `defender`.
///
/// Same-type and `Undefined` matchups are neutral.
#[must_use]
pub fn calculate_effectiveness(attacker: BeastType, defender: BeastType) -> u16 {
    if attacker.beats() == Some(defender) {
        SUPER_EFFECTIVE
    } else if defender.beats() == Some(attacker) {
        NOT_VERY_EFFECTIVE
    } else {
        NORMAL_EFFECTIVENESS
    }
}
