//! Status conditions carried by a beast between turns.

use serde::{Deserialize, Serialize};

/// Outgoing damage percentage while burned.
pub const BURNED_DAMAGE_PERCENT: u16 = 75;

/// Chance (in percent) that a paralyzed beast loses its move.
pub const PARALYSIS_SKIP_PERCENT: u8 = 25;

/// Lasting condition applied to a beast.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum StatusCondition {
    /// No condition.
    #[default]
    None,
    /// Poisoned.
    Poisoned,
    /// Paralyzed (may lose its move).
    Paralyzed,
    /// Asleep.
    Asleep,
    /// Confused.
    Confused,
    /// Burned (reduced outgoing damage).
    Burned,
    /// Frozen.
    Frozen,
    /// Cursed.
    Cursed,
}

impl StatusCondition {
    /// Every defined condition, in code order.
    pub const ALL: [Self; 8] = [
        Self::None,
        Self::Poisoned,
        Self::Paralyzed,
        Self::Asleep,
        Self::Confused,
        Self::Burned,
        Self::Frozen,
        Self::Cursed,
    ];

    /// Encodes to the stored integer code.
    #[must_use]
    pub const fn to_code(self) -> u8 {
        self as u8
    }

    /// Decodes a stored integer code. Unknown codes decode to `None`.
    #[must_use]
    pub const fn from_code(code: u8) -> Self {
        match code {
            1 => Self::Poisoned,
            2 => Self::Paralyzed,
            3 => Self::Asleep,
            4 => Self::Confused,
            5 => Self::Burned,
            6 => Self::Frozen,
            7 => Self::Cursed,
            _ => Self::None,
        }
    }
}

impl From<u8> for StatusCondition {
    fn from(code: u8) -> Self {
        Self::from_code(code)
    }
}

impl From<StatusCondition> for u8 {
    fn from(status: StatusCondition) -> Self {
        status.to_code()
    }
}

/// Adjusts an attacker's outgoing damage for its own status.
///
/// Only `Burned` changes the value; the remaining conditions carry no
/// damage modifier yet.
#[must_use]
pub fn adjust_damage_for_status(damage: u16, status: StatusCondition) -> u16 {
    match status {
        StatusCondition::Burned => crate::element::scale_percent(damage, BURNED_DAMAGE_PERCENT),
        _ => damage,
    }
}
