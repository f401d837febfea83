//! Attack categories, base power, and favored-attack rules.

use serde::{Deserialize, Serialize};

use crate::element::BeastType;
use crate::status::StatusCondition;

/// Base power used by `Default` and any unrecognized attack.
pub const BASELINE_POWER: u16 = 10;

/// Category of move a beast can use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum AttackType {
    /// Plain strike, also the fallback for unknown codes.
    #[default]
    Default,
    /// Focused light beam.
    Beam,
    /// Cutting strike.
    Slash,
    /// Piercing thrust.
    Pierce,
    /// Radiant wave.
    Wave,
    /// Arcane blast.
    Blast,
    /// Freezing spell.
    Freeze,
    /// Burning spell.
    Burn,
    /// Enchanted punch.
    Punch,
    /// Heavy smash.
    Smash,
    /// Crushing grip.
    Crush,
    /// Dark shock.
    Shock,
    /// Shadow kick.
    Kick,
}

impl AttackType {
    /// Every defined attack, in code order.
    pub const ALL: [Self; 13] = [
        Self::Default,
        Self::Beam,
        Self::Slash,
        Self::Pierce,
        Self::Wave,
        Self::Blast,
        Self::Freeze,
        Self::Burn,
        Self::Punch,
        Self::Smash,
        Self::Crush,
        Self::Shock,
        Self::Kick,
    ];

    /// Encodes to the stored integer code.
    #[must_use]
    pub const fn to_code(self) -> u8 {
        self as u8
    }

    /// Decodes a stored integer code. Unknown codes decode to `Default`.
    #[must_use]
    pub const fn from_code(code: u8) -> Self {
        match code {
            1 => Self::Beam,
            2 => Self::Slash,
            3 => Self::Pierce,
            4 => Self::Wave,
            5 => Self::Blast,
            6 => Self::Freeze,
            7 => Self::Burn,
            8 => Self::Punch,
            9 => Self::Smash,
            10 => Self::Crush,
            11 => Self::Shock,
            12 => Self::Kick,
            _ => Self::Default,
        }
    }

    /// Fixed base power of this attack.
    #[must_use]
    pub const fn base_power(self) -> u16 {
        match self {
            Self::Beam => 18,
            Self::Slash => 12,
            Self::Pierce => 16,
            Self::Wave => 14,
            Self::Blast => 20,
            Self::Freeze => 17,
            Self::Burn => 16,
            Self::Punch => 11,
            Self::Smash => 19,
            Self::Crush => 21,
            Self::Shock => 15,
            Self::Kick => 13,
            Self::Default => BASELINE_POWER,
        }
    }

    /// The element that gets the favored bonus with this attack.
    #[must_use]
    pub const fn favored_type(self) -> BeastType {
        match self {
            Self::Beam | Self::Slash | Self::Pierce | Self::Wave => BeastType::Light,
            Self::Blast | Self::Freeze | Self::Burn | Self::Punch => BeastType::Magic,
            Self::Smash | Self::Crush | Self::Shock | Self::Kick => BeastType::Shadow,
            Self::Default => BeastType::Undefined,
        }
    }

    /// Status left on the defender by a super-effective hit.
    #[must_use]
    pub const fn inflicted_status(self) -> Option<StatusCondition> {
        match self {
            Self::Burn => Some(StatusCondition::Burned),
            Self::Freeze => Some(StatusCondition::Frozen),
            Self::Shock => Some(StatusCondition::Paralyzed),
            _ => None,
        }
    }
}

impl From<u8> for AttackType {
    fn from(code: u8) -> Self {
        Self::from_code(code)
    }
}

impl From<AttackType> for u8 {
    fn from(attack: AttackType) -> Self {
        attack.to_code()
    }
}

/// Whether `attack_type` belongs to `beast_type`'s favored set.
#[must_use]
pub fn is_favored_attack(beast_type: BeastType, attack_type: AttackType) -> bool {
    beast_type != BeastType::Undefined && attack_type.favored_type() == beast_type
}
